//! Frame loop behavior on small mechanisms.

use lg_components::{Anchor, Drive, ElasticLink, MassPoint, RotatingLink, Trajectory};
use lg_core::units::{kg, m, mps2};
use lg_sim::{Diagnostic, IntegratorType, MAX_DIAGNOSTICS, SimError, SimOptions, Simulation};
use lg_tree::{Mechanism, MechanismBuilder};

fn double_pendulum() -> Mechanism {
    let mut b = MechanismBuilder::new();
    let base = b.add_root("base", Anchor::fixed(0.0, 0.0));
    let r1 = b.add(
        "r1",
        base,
        RotatingLink::new(m(1.0)).with_initial(std::f64::consts::FRAC_PI_4, 0.0),
    );
    let p1 = b.add("p1", r1, MassPoint::new(kg(1.0)));
    let r2 = b.add("r2", p1, RotatingLink::new(m(0.5)));
    b.add("p2", r2, MassPoint::new(kg(1.0)));
    b.build().unwrap()
}

#[test]
fn energy_is_conserved_without_damping_or_driving() {
    let sim = Simulation::new(double_pendulum(), SimOptions::default()).unwrap();
    let mut running = sim.assemble().unwrap().compile().unwrap().start().unwrap();
    assert!(running.energy_is_conserved());

    let record = running.run_frames(60).unwrap();
    assert_eq!(record.len(), 61);
    assert!((running.time() - 2.0).abs() < 1e-9);
    let h0 = record.energy[0];
    assert!(
        record.max_energy_drift() < 1e-3 * h0.abs(),
        "energy drift {} from {}",
        record.max_energy_drift(),
        h0
    );
    assert!(running.diagnostics().is_empty());
    // The pendulum actually moved
    assert!((record.x[60][0] - record.x[0][0]).abs() > 1e-2);
}

#[test]
fn rk4_integrator_is_selectable() {
    let opts = SimOptions {
        integrator: IntegratorType::Rk4,
        ..SimOptions::default()
    };
    let sim = Simulation::new(double_pendulum(), opts).unwrap();
    let mut running = sim.assemble().unwrap().compile().unwrap().start().unwrap();
    let record = running.run_frames(30).unwrap();
    assert!(record.max_energy_drift() < 1e-4 * record.energy[0].abs());
}

#[test]
fn counts_agree_through_the_pipeline() {
    let sim = Simulation::new(double_pendulum(), SimOptions::default()).unwrap();
    let assembled = sim.assemble().unwrap();
    let n = assembled.setup().coordinate_count();
    let compiled = assembled.compile().unwrap();
    assert_eq!(n, 2);
    assert_eq!(compiled.accelerations().len(), n);
    assert_eq!(compiled.acceleration_table().len(), n);
    assert_eq!(compiled.acceleration_table()[1].0, "r2.phi");

    let running = compiled.start().unwrap();
    assert_eq!(running.state().len(), 2 * n);
}

#[test]
fn frame_scatters_state_to_components() {
    let sim = Simulation::new(double_pendulum(), SimOptions::default()).unwrap();
    let mut running = sim.assemble().unwrap().compile().unwrap().start().unwrap();
    let frame = running.step_frame().unwrap();

    let r1 = running.mechanism().find("r1").unwrap();
    let stored = running
        .mechanism()
        .body(r1)
        .and_then(|b| b.dynamic())
        .unwrap()
        .state();
    assert_eq!(stored, frame.state[0..2].to_vec());

    let p1 = running.mechanism().find("p1").unwrap();
    let pos = frame.position(p1).unwrap();
    assert!((pos.x - frame.state[0].sin()).abs() < 1e-12);
    assert!((pos.y + frame.state[0].cos()).abs() < 1e-12);
}

#[test]
fn uncoupled_coordinate_is_held_at_zero_acceleration() {
    let mut b = MechanismBuilder::new();
    let base = b.add_root("base", Anchor::default());
    let r1 = b.add("r1", base, RotatingLink::new(m(1.0)).with_initial(0.3, 0.0));
    b.add("p1", r1, MassPoint::default());
    b.add("r2", base, RotatingLink::new(m(1.0)).with_initial(1.0, 0.5));
    let mech = b.build().unwrap();

    let sim = Simulation::new(mech, SimOptions::default()).unwrap();
    let compiled = sim.assemble().unwrap().compile().unwrap();
    assert_eq!(compiled.accelerations().unsolvable, vec![1]);

    let mut running = compiled.start().unwrap();
    assert_eq!(
        running.diagnostics(),
        &[Diagnostic::UnsolvableCoordinate {
            coordinate: 1,
            label: "r2.phi".to_string()
        }]
    );
    running.run_frames(3).unwrap();
    // Constant velocity: phi = 1 + 0.5 t
    let x = running.state();
    assert!((x[3] - 0.5).abs() < 1e-9);
    assert!((x[2] - (1.0 + 0.5 * running.time())).abs() < 1e-6);
}

/// Spring collapsed to zero length: the angle equation divides by zero.
fn collapsed_spring() -> Mechanism {
    let mut b = MechanismBuilder::new();
    let base = b.add_root("base", Anchor::default());
    let spring = b.add(
        "spring",
        base,
        ElasticLink::anchored(10.0, m(1.0)).with_initial(-1.0, 0.0, 0.3, 0.0),
    );
    b.add("bob", spring, MassPoint::default());
    b.build().unwrap()
}

#[test]
fn singular_configuration_degrades_instead_of_failing() {
    let mech = collapsed_spring();

    let opts = SimOptions {
        subintegrations: 4,
        max_cutbacks: 1,
        ..SimOptions::default()
    };
    let sim = Simulation::new(mech, opts).unwrap();
    let mut running = sim.assemble().unwrap().compile().unwrap().start().unwrap();
    let x0 = running.state().to_vec();

    let frame = running.step_frame().unwrap();
    assert_eq!(frame.state, x0);
    assert!((frame.t - 1.0 / 30.0).abs() < 1e-12);
    assert_eq!(running.step_failures(), 4);
    match running.diagnostics() {
        [
            Diagnostic::IntegrationStepFailure {
                frame,
                t_first,
                t_last,
                count,
                ..
            },
        ] => {
            assert_eq!((*frame, *count), (0, 4));
            assert_eq!(*t_first, 0.0);
            assert!((t_last - 3.0 / 120.0).abs() < 1e-12);
        }
        other => panic!("unexpected diagnostics: {other:?}"),
    }
}

#[test]
fn persistent_failure_keeps_diagnostics_bounded() {
    let opts = SimOptions {
        max_cutbacks: 1,
        ..SimOptions::default()
    };
    let sim = Simulation::new(collapsed_spring(), opts).unwrap();
    let mut running = sim.assemble().unwrap().compile().unwrap().start().unwrap();

    for _ in 0..300 {
        running.step_frame().unwrap();
    }
    assert_eq!(running.frame_index(), 300);
    assert_eq!(running.step_failures(), 3000);
    assert_eq!(running.diagnostics().len(), 1);
    assert!(running.diagnostics().len() <= MAX_DIAGNOSTICS);
    assert!(matches!(
        running.diagnostics()[0],
        Diagnostic::IntegrationStepFailure { count: 3000, .. }
    ));
}

#[test]
fn damping_and_driving_are_flagged_as_non_conservative() {
    let mut b = MechanismBuilder::new();
    let base = b.add_root(
        "base",
        Anchor::driven(Trajectory::new(Drive::Fixed(0.0), Drive::harmonic(0.1, 20.0))),
    );
    let rod = b.add(
        "rod",
        base,
        RotatingLink::new(m(1.0))
            .with_initial(std::f64::consts::PI * 15.0 / 16.0, 0.0)
            .with_damping(0.2),
    );
    b.add("bob", rod, MassPoint::default());
    let opts = SimOptions {
        gravity: mps2(1.0),
        subintegrations: 20,
        ..SimOptions::default()
    };
    let sim = Simulation::new(b.build().unwrap(), opts).unwrap();
    let mut running = sim.assemble().unwrap().compile().unwrap().start().unwrap();
    assert!(!running.energy_is_conserved());
    running.run_frames(10).unwrap();
    assert!(running.energy().unwrap().is_finite());
}

#[test]
fn child_before_parent_is_a_configuration_error() {
    let mech = double_pendulum();
    let ids = mech.declaration_order();
    let sequence = vec![ids[0], ids[2], ids[1], ids[3], ids[4]];
    let sim = Simulation::new(mech, SimOptions::default())
        .unwrap()
        .with_sequence(sequence);
    assert!(matches!(sim.assemble(), Err(SimError::Configuration(_))));
}

#[test]
fn invalid_options_are_rejected() {
    let opts = SimOptions {
        dt: -1.0,
        ..SimOptions::default()
    };
    assert!(matches!(
        Simulation::new(double_pendulum(), opts),
        Err(SimError::InvalidArg { .. })
    ));
}

#[test]
fn wrong_initial_state_length_is_rejected() {
    let sim = Simulation::new(double_pendulum(), SimOptions::default()).unwrap();
    let compiled = sim.assemble().unwrap().compile().unwrap();
    assert!(matches!(
        compiled.start_from(vec![0.0; 3]),
        Err(SimError::InvalidArg { .. })
    ));
}
