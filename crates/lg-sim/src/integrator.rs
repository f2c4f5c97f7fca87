//! Time steppers: variable-order BDF and classical RK4.

use std::collections::VecDeque;

use lg_solver::{NewtonConfig, finite_difference_jacobian, newton_solve};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::model::TransientModel;

/// Trait for time integrators.
pub trait Integrator {
    /// Advance state by one step of length `dt` starting at time `t`.
    fn step<M: TransientModel>(
        &mut self,
        model: &M,
        t: f64,
        x: &DVector<f64>,
        dt: f64,
    ) -> SimResult<DVector<f64>>;

    /// Forget any step history.
    fn reset(&mut self) {}
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Debug, Default)]
pub struct Rk4;

impl Integrator for Rk4 {
    fn step<M: TransientModel>(
        &mut self,
        model: &M,
        t: f64,
        x: &DVector<f64>,
        dt: f64,
    ) -> SimResult<DVector<f64>> {
        let k1 = model.rhs(t, x)?;
        let k2 = model.rhs(t + 0.5 * dt, &(x + 0.5 * dt * &k1))?;
        let k3 = model.rhs(t + 0.5 * dt, &(x + 0.5 * dt * &k2))?;
        let k4 = model.rhs(t + dt, &(x + dt * &k3))?;

        // x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        Ok(x + (dt / 6.0) * (k1 + 2.0 * k2 + 2.0 * k3 + k4))
    }
}

/// Fixed-leading-coefficient BDF weights: `(alpha, beta)` for
/// `y_{n+1} = sum_j alpha_j y_{n-j} + beta h f(t_{n+1}, y_{n+1})`.
fn bdf_coefficients(order: usize) -> (&'static [f64], f64) {
    match order {
        1 => (&[1.0], 1.0),
        2 => (&[4.0 / 3.0, -1.0 / 3.0], 2.0 / 3.0),
        3 => (&[18.0 / 11.0, -9.0 / 11.0, 2.0 / 11.0], 6.0 / 11.0),
        4 => (
            &[48.0 / 25.0, -36.0 / 25.0, 16.0 / 25.0, -3.0 / 25.0],
            12.0 / 25.0,
        ),
        _ => (
            &[
                300.0 / 137.0,
                -300.0 / 137.0,
                200.0 / 137.0,
                -75.0 / 137.0,
                12.0 / 137.0,
            ],
            60.0 / 137.0,
        ),
    }
}

/// Settings of the BDF stepper.
#[derive(Clone, Debug)]
pub struct BdfConfig {
    /// Highest order used once enough history exists (1..=5).
    pub max_order: usize,
    /// Newton iteration settings for the corrector.
    pub newton: NewtonConfig,
    /// Relative perturbation of the finite difference Jacobian.
    pub jacobian_epsilon: f64,
    /// Maximum number of times a failed step is retried with a shorter step.
    pub max_cutbacks: usize,
    /// Step shrink factor per cutback.
    pub cutback_factor: f64,
}

impl Default for BdfConfig {
    fn default() -> Self {
        Self {
            max_order: 5,
            newton: NewtonConfig {
                max_iterations: 25,
                ..NewtonConfig::default()
            },
            jacobian_epsilon: 1e-7,
            max_cutbacks: 4,
            cutback_factor: 0.5,
        }
    }
}

/// Variable-order (1 to 5) backward differentiation formula stepper.
///
/// The order grows by one per accepted step while the step length stays
/// constant. Each step solves `y - h beta f(t + h, y) - psi = 0` with Newton
/// on the matrix `I - h beta J`, where `J` is a finite difference Jacobian
/// of `f` taken once at the predictor. A failed corrector is retried over
/// the same interval with shorter steps; every retry starts again at order 1.
#[derive(Clone, Debug)]
pub struct Bdf {
    config: BdfConfig,
    /// Accepted states, newest first, spaced `h` apart.
    history: VecDeque<DVector<f64>>,
    h: f64,
    t_last: f64,
    cutbacks: usize,
}

impl Bdf {
    pub fn new(config: BdfConfig) -> Self {
        Self {
            config,
            history: VecDeque::new(),
            h: 0.0,
            t_last: f64::NAN,
            cutbacks: 0,
        }
    }

    pub fn config(&self) -> &BdfConfig {
        &self.config
    }

    /// Order the next step of the current length would use.
    pub fn order(&self) -> usize {
        self.history.len().clamp(1, self.config.max_order.clamp(1, 5))
    }

    /// Total number of cutbacks taken so far.
    pub fn cutbacks(&self) -> usize {
        self.cutbacks
    }

    /// Keep the history only if it ends at `(t, x)` with spacing `h`.
    fn sync_history(&mut self, t: f64, x: &DVector<f64>, h: f64) {
        let continues = self.h == h
            && self.t_last == t
            && self.history.front().is_some_and(|last| last == x);
        if !continues {
            self.history.clear();
            self.history.push_front(x.clone());
            self.h = h;
            self.t_last = t;
        }
    }

    /// One corrector solve of length `h` from `(t, x)`.
    fn try_step<M: TransientModel>(
        &mut self,
        model: &M,
        t: f64,
        x: &DVector<f64>,
        h: f64,
    ) -> SimResult<DVector<f64>> {
        self.sync_history(t, x, h);
        let order = self.order();
        let (alpha, beta) = bdf_coefficients(order);

        let mut psi = DVector::zeros(x.len());
        for (a, past) in alpha.iter().zip(&self.history) {
            psi += *a * past;
        }

        // Linear extrapolation when two points are known
        let predictor = match self.history.get(1) {
            Some(prev) => 2.0 * x - prev,
            None => x.clone(),
        };

        let t_new = t + h;
        let hb = h * beta;
        let residual = |y: &DVector<f64>| -> lg_solver::SolverResult<DVector<f64>> {
            let f = model.rhs(t_new, y).map_err(to_solver)?;
            Ok(y - hb * f - &psi)
        };

        let f = |y: &DVector<f64>| model.rhs(t_new, y).map_err(to_solver);
        let jf = finite_difference_jacobian(&predictor, None, f, self.config.jacobian_epsilon)
            .map_err(SimError::from)?;
        let n = x.len();
        let newton_matrix = DMatrix::identity(n, n) - hb * jf;
        let jacobian = |_y: &DVector<f64>, _r: &DVector<f64>| Ok(newton_matrix.clone());

        let solved = newton_solve(predictor, residual, jacobian, &self.config.newton)?;

        self.history.push_front(solved.x.clone());
        self.history.truncate(self.config.max_order.clamp(1, 5));
        self.t_last = t_new;
        Ok(solved.x)
    }

    /// Cover `[t, t + dt]` with `pieces` equal steps.
    fn advance<M: TransientModel>(
        &mut self,
        model: &M,
        t: f64,
        x: &DVector<f64>,
        dt: f64,
        pieces: usize,
    ) -> SimResult<DVector<f64>> {
        let h = dt / pieces as f64;
        let mut y = x.clone();
        let mut tk = t;
        for _ in 0..pieces {
            y = self.try_step(model, tk, &y, h)?;
            tk += h;
        }
        Ok(y)
    }
}

fn to_solver(e: SimError) -> lg_solver::SolverError {
    lg_solver::SolverError::Numeric {
        what: e.to_string(),
    }
}

impl Integrator for Bdf {
    fn step<M: TransientModel>(
        &mut self,
        model: &M,
        t: f64,
        x: &DVector<f64>,
        dt: f64,
    ) -> SimResult<DVector<f64>> {
        let first = match self.try_step(model, t, x, dt) {
            Ok(y) => return Ok(y),
            Err(e) => e,
        };

        let mut last = first;
        let mut pieces = 1.0;
        for attempt in 1..=self.config.max_cutbacks {
            pieces /= self.config.cutback_factor;
            self.cutbacks += 1;
            self.reset();
            debug!(t, dt, attempt, error = %last, "BDF cutback");
            match self.advance(model, t, x, dt, pieces.round().max(1.0) as usize) {
                Ok(y) => return Ok(y),
                Err(e) => last = e,
            }
        }

        self.reset();
        Err(SimError::StepFailed {
            message: format!(
                "no convergence over [{}, {}] after {} cutbacks: {}",
                t,
                t + dt,
                self.config.max_cutbacks,
                last
            ),
        })
    }

    fn reset(&mut self) {
        self.history.clear();
        self.t_last = f64::NAN;
    }
}

/// Integrator selection for simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegratorType {
    /// Variable-order BDF with Newton corrector (default, stiff-stable).
    #[default]
    Bdf,
    /// 4th-order Runge-Kutta, fixed step, 4 rhs calls per step.
    Rk4,
}

/// A concrete stepper chosen at run time.
#[derive(Clone, Debug)]
pub enum Stepper {
    Bdf(Bdf),
    Rk4(Rk4),
}

impl Integrator for Stepper {
    fn step<M: TransientModel>(
        &mut self,
        model: &M,
        t: f64,
        x: &DVector<f64>,
        dt: f64,
    ) -> SimResult<DVector<f64>> {
        match self {
            Stepper::Bdf(s) => s.step(model, t, x, dt),
            Stepper::Rk4(s) => s.step(model, t, x, dt),
        }
    }

    fn reset(&mut self) {
        match self {
            Stepper::Bdf(s) => s.reset(),
            Stepper::Rk4(s) => s.reset(),
        }
    }
}
