//! The simulation lifecycle as a typestate machine.
//!
//! `Simulation<Unconfigured>` → `assemble` → `Simulation<Assembled>` →
//! `compile` → `Simulation<Compiled>` → `start` → `Simulation<Running>`.
//! Every transition consumes the previous state, so the derivation runs
//! exactly once and a running simulation cannot go back.

use lg_core::CompId;
use lg_core::timing::{AccumulatingTimer, PerfStats, Timer};
use lg_solver::{
    Accelerations, CompiledSystem, Equations, Lagrangian, assemble, compile_system, derive,
    solve_accelerations,
};
use lg_symbolic::ExprGraph;
use lg_tree::{Mechanism, Setup, initial_state, scatter, setup};
use nalgebra::DVector;
use tracing::{debug, info, warn};

use crate::error::{SimError, SimResult};
use crate::integrator::{Bdf, Integrator, IntegratorType, Rk4, Stepper};
use crate::model::MechanismModel;
use crate::options::SimOptions;
use crate::record::{ComponentPosition, Diagnostic, DiagnosticLog, Frame, SimRecord};

/// A mechanism that has not been set up yet.
pub struct Unconfigured {
    mech: Mechanism,
    sequence: Option<Vec<CompId>>,
}

/// Coordinates assigned and the Lagrangian built.
pub struct Assembled {
    mech: Mechanism,
    graph: ExprGraph,
    setup: Setup,
    lagrangian: Lagrangian,
}

/// Equations derived, solved and compiled.
pub struct Compiled {
    mech: Mechanism,
    graph: ExprGraph,
    setup: Setup,
    lagrangian: Lagrangian,
    equations: Equations,
    accelerations: Accelerations,
    system: CompiledSystem,
}

/// The frame loop.
pub struct Running {
    mech: Mechanism,
    setup: Setup,
    system: CompiledSystem,
    stepper: Stepper,
    t: f64,
    x: DVector<f64>,
    frame: usize,
    diagnostics: DiagnosticLog,
    frame_timer: AccumulatingTimer,
}

/// A simulation in lifecycle state `S`.
pub struct Simulation<S> {
    options: SimOptions,
    stats: PerfStats,
    state: S,
}

impl<S> Simulation<S> {
    pub fn options(&self) -> &SimOptions {
        &self.options
    }

    /// Phase timings collected so far.
    pub fn stats(&self) -> &PerfStats {
        &self.stats
    }
}

impl Simulation<Unconfigured> {
    pub fn new(mech: Mechanism, options: SimOptions) -> SimResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            stats: PerfStats::default(),
            state: Unconfigured {
                mech,
                sequence: None,
            },
        })
    }

    /// Present components in this order instead of declaration order.
    pub fn with_sequence(mut self, sequence: Vec<CompId>) -> Self {
        self.state.sequence = Some(sequence);
        self
    }

    pub fn mechanism(&self) -> &Mechanism {
        &self.state.mech
    }

    /// Run the setup pass and build `L` and `H`.
    pub fn assemble(mut self) -> SimResult<Simulation<Assembled>> {
        let Unconfigured { mech, sequence } = self.state;
        let sequence = sequence.unwrap_or_else(|| mech.declaration_order());
        let mut graph = ExprGraph::with_node_limit(self.options.max_graph_nodes);

        let timer = Timer::start();
        let setup = setup(&mech, &sequence, &mut graph)?;
        self.stats.setup_time_s = timer.elapsed_s();

        let timer = Timer::start();
        let lagrangian = assemble(
            &mech,
            &setup,
            &mut graph,
            self.options.gravity.value,
            self.options.simplify_node_budget,
        )?;
        self.stats.assemble_time_s = timer.elapsed_s();
        debug!(
            setup_s = self.stats.setup_time_s,
            assemble_s = self.stats.assemble_time_s,
            nodes = graph.len(),
            "lagrangian assembled"
        );

        let state = Assembled {
            mech,
            graph,
            setup,
            lagrangian,
        };
        Ok(Simulation {
            options: self.options,
            stats: self.stats,
            state,
        })
    }
}

impl Simulation<Assembled> {
    pub fn mechanism(&self) -> &Mechanism {
        &self.state.mech
    }

    pub fn setup(&self) -> &Setup {
        &self.state.setup
    }

    pub fn graph(&self) -> &ExprGraph {
        &self.state.graph
    }

    pub fn lagrangian(&self) -> &Lagrangian {
        &self.state.lagrangian
    }

    /// Derive the equations of motion, solve for the accelerations and
    /// compile the numeric evaluators.
    pub fn compile(self) -> SimResult<Simulation<Compiled>> {
        let Simulation {
            options,
            mut stats,
            state,
        } = self;
        let Assembled {
            mech,
            mut graph,
            setup,
            lagrangian,
        } = state;
        let budget = options.simplify_node_budget;

        let timer = Timer::start();
        let equations = derive(&mech, &setup, &lagrangian, &mut graph, budget)?;
        stats.derive_time_s = timer.elapsed_s();

        let timer = Timer::start();
        let accelerations = solve_accelerations(&mech, &setup, &equations, &mut graph, budget)?;
        stats.solve_time_s = timer.elapsed_s();

        let timer = Timer::start();
        let system = compile_system(
            &mech,
            &setup,
            &mut graph,
            &lagrangian,
            &equations,
            &accelerations,
        )?;
        stats.compile_time_s = timer.elapsed_s();

        info!(
            coordinates = setup.coordinate_count(),
            nodes = graph.len(),
            tape = system.tape_len(),
            symbolic_s = stats.symbolic_total_s(),
            "equations of motion ready"
        );

        Ok(Simulation {
            options,
            stats,
            state: Compiled {
                mech,
                graph,
                setup,
                lagrangian,
                equations,
                accelerations,
                system,
            },
        })
    }
}

impl Simulation<Compiled> {
    pub fn mechanism(&self) -> &Mechanism {
        &self.state.mech
    }

    pub fn setup(&self) -> &Setup {
        &self.state.setup
    }

    pub fn graph(&self) -> &ExprGraph {
        &self.state.graph
    }

    pub fn lagrangian(&self) -> &Lagrangian {
        &self.state.lagrangian
    }

    pub fn equations(&self) -> &Equations {
        &self.state.equations
    }

    pub fn accelerations(&self) -> &Accelerations {
        &self.state.accelerations
    }

    pub fn system(&self) -> &CompiledSystem {
        &self.state.system
    }

    /// `(coordinate label, acceleration)` pairs in readable form.
    pub fn acceleration_table(&self) -> Vec<(String, String)> {
        let Compiled {
            mech,
            graph,
            setup,
            accelerations,
            ..
        } = &self.state;
        accelerations
            .exprs
            .iter()
            .enumerate()
            .map(|(i, &a)| (setup.label(mech, i), graph.display(a).to_string()))
            .collect()
    }

    /// Start the frame loop from the components' initial conditions.
    pub fn start(self) -> SimResult<Simulation<Running>> {
        let x0 = initial_state(&self.state.mech, &self.state.setup);
        self.start_from(x0)
    }

    /// Start the frame loop from an explicit interleaved state.
    pub fn start_from(self, x0: Vec<f64>) -> SimResult<Simulation<Running>> {
        if x0.len() != self.state.setup.state_len() {
            return Err(SimError::InvalidArg {
                what: "initial state length does not match the coordinate count",
            });
        }
        if x0.iter().any(|v| !v.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "initial state must be finite",
            });
        }

        let Simulation {
            options,
            stats,
            state,
        } = self;
        let Compiled {
            mut mech,
            setup,
            accelerations,
            system,
            ..
        } = state;

        scatter(&mut mech, &setup, &x0)?;
        let diagnostics = accelerations
            .unsolvable
            .iter()
            .map(|&i| Diagnostic::UnsolvableCoordinate {
                coordinate: i,
                label: setup.label(&mech, i),
            })
            .collect();
        let diagnostics = DiagnosticLog::new(diagnostics);
        let stepper = match options.integrator {
            IntegratorType::Bdf => Stepper::Bdf(Bdf::new(options.bdf_config())),
            IntegratorType::Rk4 => Stepper::Rk4(Rk4),
        };
        info!(
            integrator = ?options.integrator,
            dt = options.dt,
            subintegrations = options.subintegrations,
            "frame loop started"
        );

        Ok(Simulation {
            options,
            stats,
            state: Running {
                mech,
                setup,
                system,
                stepper,
                t: 0.0,
                x: DVector::from_vec(x0),
                frame: 0,
                diagnostics,
                frame_timer: AccumulatingTimer::new(),
            },
        })
    }
}

impl Simulation<Running> {
    pub fn mechanism(&self) -> &Mechanism {
        &self.state.mech
    }

    pub fn setup(&self) -> &Setup {
        &self.state.setup
    }

    pub fn system(&self) -> &CompiledSystem {
        &self.state.system
    }

    pub fn time(&self) -> f64 {
        self.state.t
    }

    /// Current interleaved state.
    pub fn state(&self) -> &[f64] {
        self.state.x.as_slice()
    }

    /// Frames completed so far.
    pub fn frame_index(&self) -> usize {
        self.state.frame
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.state.diagnostics.entries()
    }

    /// Sub-steps skipped since the start, including those folded together.
    pub fn step_failures(&self) -> u64 {
        self.state.diagnostics.step_failures()
    }

    /// Total energy `H` at the current time and state.
    ///
    /// Only conserved for undamped, undriven mechanisms; see
    /// [`Simulation::energy_is_conserved`].
    pub fn energy(&self) -> SimResult<f64> {
        Ok(self
            .state
            .system
            .energy(self.state.t, self.state.x.as_slice())?)
    }

    /// Whether `H` is expected to stay constant: nothing damps or drives.
    pub fn energy_is_conserved(&self) -> bool {
        !(self.state.mech.is_damped() || self.state.mech.is_driven())
    }

    /// Snapshot of the current frame.
    pub fn frame(&self) -> SimResult<Frame> {
        let run = &self.state;
        let points = run.system.positions(run.t, run.x.as_slice())?;
        let positions = run
            .system
            .position_owners()
            .iter()
            .zip(points)
            .map(|(&comp, [x, y])| ComponentPosition {
                comp,
                name: run.mech.name(comp).to_string(),
                x,
                y,
            })
            .collect();
        Ok(Frame {
            index: run.frame,
            t: run.t,
            state: run.x.as_slice().to_vec(),
            positions,
        })
    }

    /// Advance one frame of `dt` in `subintegrations` sub-steps.
    ///
    /// A sub-step that fails is skipped: the clock moves on, the state stays,
    /// and the failure is counted in an [`Diagnostic::IntegrationStepFailure`].
    pub fn step_frame(&mut self) -> SimResult<Frame> {
        let timer = Timer::start();
        let h = self.options.substep();
        let run = &mut self.state;
        let model = MechanismModel::new(&run.system);

        for _ in 0..self.options.subintegrations {
            match run.stepper.step(&model, run.t, &run.x, h) {
                Ok(y) if y.iter().all(|v| v.is_finite()) => {
                    run.x = y;
                    run.diagnostics.step_succeeded();
                }
                outcome => {
                    let message = match outcome {
                        Err(e) => e.to_string(),
                        Ok(_) => "non-finite state".to_string(),
                    };
                    warn!(
                        frame = run.frame,
                        t = run.t,
                        error = %message,
                        "integration sub-step failed; advancing clock"
                    );
                    run.diagnostics.step_failed(run.frame, run.t, message);
                    run.stepper.reset();
                }
            }
            run.t += h;
        }

        run.frame += 1;
        scatter(&mut run.mech, &run.setup, run.x.as_slice())?;

        self.stats.rhs_evaluations += model.evaluations();
        run.frame_timer.record(timer.elapsed_s());
        self.stats.frames = run.frame_timer.count() as usize;
        self.stats.frame_time_s = run.frame_timer.total_seconds();

        self.frame()
    }

    /// Run `frames` frames headless, recording time, state and energy
    /// (initial state included).
    pub fn run_frames(&mut self, frames: usize) -> SimResult<SimRecord> {
        let mut record = SimRecord::default();
        record.push(self.time(), self.state(), self.energy()?);
        for _ in 0..frames {
            self.step_frame()?;
            record.push(self.time(), self.state(), self.energy()?);
        }
        Ok(record)
    }
}
