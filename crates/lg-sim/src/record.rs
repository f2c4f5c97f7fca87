//! Frame snapshots, run records and recoverable diagnostics.

use std::fmt;

use lg_core::CompId;

/// A recoverable condition noticed while deriving or integrating.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// No pivot existed for this coordinate's acceleration; it is held at zero.
    UnsolvableCoordinate { coordinate: usize, label: String },
    /// Sub-steps that did not converge; the clock moved on without changing
    /// the state. Consecutive failures share one entry.
    IntegrationStepFailure {
        /// Frame of the first failure
        frame: usize,
        t_first: f64,
        t_last: f64,
        count: usize,
        /// Error of the most recent failure
        message: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnsolvableCoordinate { coordinate, label } => {
                write!(f, "coordinate {} ({}) has no acceleration pivot", coordinate, label)
            }
            Diagnostic::IntegrationStepFailure {
                frame,
                t_first,
                t_last,
                count,
                message,
            } => write!(
                f,
                "frame {}: {} sub-step(s) skipped between t = {} and t = {}: {}",
                frame, count, t_first, t_last, message
            ),
        }
    }
}

/// Entries kept before further step failures fold into the last one.
pub const MAX_DIAGNOSTICS: usize = 64;

/// Diagnostics of a running simulation, bounded in size.
///
/// A run of failing sub-steps becomes a single entry. Once
/// [`MAX_DIAGNOSTICS`] entries exist, every further failure is folded into the
/// newest failure entry, so a simulation stuck in a singular configuration
/// holds constant memory.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
    /// The previous sub-step failed.
    failing: bool,
    step_failures: u64,
}

impl DiagnosticLog {
    pub fn new(entries: Vec<Diagnostic>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Failed sub-steps since the start, merged or not.
    pub fn step_failures(&self) -> u64 {
        self.step_failures
    }

    pub fn step_succeeded(&mut self) {
        self.failing = false;
    }

    pub fn step_failed(&mut self, frame: usize, t: f64, error: String) {
        self.step_failures += 1;
        let fold = self.failing || self.entries.len() >= MAX_DIAGNOSTICS;
        self.failing = true;

        if fold {
            let last = self
                .entries
                .iter_mut()
                .rev()
                .find(|d| matches!(d, Diagnostic::IntegrationStepFailure { .. }));
            if let Some(Diagnostic::IntegrationStepFailure {
                t_last,
                count,
                message,
                ..
            }) = last
            {
                *t_last = t;
                *count += 1;
                *message = error;
                return;
            }
        }
        self.entries.push(Diagnostic::IntegrationStepFailure {
            frame,
            t_first: t,
            t_last: t,
            count: 1,
            message: error,
        });
    }
}

/// Global position of one component.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentPosition {
    pub comp: CompId,
    pub name: String,
    pub x: f64,
    pub y: f64,
}

/// Observable state after a frame: what a renderer draws.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Frames completed so far; 0 is the initial state.
    pub index: usize,
    pub t: f64,
    /// Interleaved `(position, velocity)` state.
    pub state: Vec<f64>,
    /// Every presented component, in presentation order.
    pub positions: Vec<ComponentPosition>,
}

impl Frame {
    pub fn position(&self, comp: CompId) -> Option<&ComponentPosition> {
        self.positions.iter().find(|p| p.comp == comp)
    }
}

/// Record of a headless run.
#[derive(Clone, Debug, Default)]
pub struct SimRecord {
    /// Time points (seconds)
    pub t: Vec<f64>,
    /// State snapshots
    pub x: Vec<Vec<f64>>,
    /// Total energy at each snapshot
    pub energy: Vec<f64>,
}

impl SimRecord {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub(crate) fn push(&mut self, t: f64, x: &[f64], energy: f64) {
        self.t.push(t);
        self.x.push(x.to_vec());
        self.energy.push(energy);
    }

    /// Largest deviation of the recorded energy from its first value.
    pub fn max_energy_drift(&self) -> f64 {
        match self.energy.first() {
            Some(&h0) => self
                .energy
                .iter()
                .map(|h| (h - h0).abs())
                .fold(0.0, f64::max),
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_drift_of_record() {
        let mut rec = SimRecord::default();
        assert_eq!(rec.max_energy_drift(), 0.0);
        rec.push(0.0, &[1.0], -2.0);
        rec.push(0.1, &[1.1], -2.5);
        rec.push(0.2, &[1.2], -1.9);
        assert_eq!(rec.len(), 3);
        assert!((rec.max_energy_drift() - 0.5).abs() < 1e-15);
    }

    fn failure_count(d: &Diagnostic) -> usize {
        match d {
            Diagnostic::IntegrationStepFailure { count, .. } => *count,
            _ => 0,
        }
    }

    #[test]
    fn consecutive_failures_share_an_entry() {
        let mut log = DiagnosticLog::default();
        log.step_failed(0, 0.0, "a".into());
        log.step_failed(0, 0.1, "b".into());
        log.step_failed(1, 0.2, "c".into());
        log.step_succeeded();
        log.step_failed(2, 0.4, "d".into());

        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.step_failures(), 4);
        assert_eq!(
            log.entries()[0],
            Diagnostic::IntegrationStepFailure {
                frame: 0,
                t_first: 0.0,
                t_last: 0.2,
                count: 3,
                message: "c".into(),
            }
        );
        assert_eq!(failure_count(&log.entries()[1]), 1);
    }

    #[test]
    fn log_stops_growing_at_the_cap() {
        let unsolvable = Diagnostic::UnsolvableCoordinate {
            coordinate: 0,
            label: "rod.phi".into(),
        };
        let mut log = DiagnosticLog::new(vec![unsolvable.clone()]);
        for k in 0..10 * MAX_DIAGNOSTICS {
            log.step_failed(k, k as f64, "singular".into());
            log.step_succeeded();
        }

        assert_eq!(log.entries().len(), MAX_DIAGNOSTICS);
        assert_eq!(log.entries()[0], unsolvable);
        assert_eq!(log.step_failures(), 10 * MAX_DIAGNOSTICS as u64);
        let counted: usize = log.entries().iter().map(failure_count).sum();
        assert_eq!(counted as u64, log.step_failures());
    }

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::UnsolvableCoordinate {
            coordinate: 2,
            label: "rod.phi".into(),
        };
        assert!(d.to_string().contains("rod.phi"));
    }
}
