//! Lightweight performance timing utilities.
//!
//! Measures where the one-shot derivation pipeline and the frame loop spend
//! their time. Enabled via the `LG_TIMING` environment variable or
//! programmatically.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable performance timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("LG_TIMING").is_ok()
}

/// A simple timer that measures elapsed time.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed wall time in seconds, regardless of the global switch.
    pub fn elapsed_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Accumulating timer for tracking total time across multiple calls.
pub struct AccumulatingTimer {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl Default for AccumulatingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulatingTimer {
    /// Create a new accumulating timer.
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record a timing measurement.
    pub fn record(&self, duration_s: f64) {
        let nanos = (duration_s * 1e9) as u64;
        self.total_ns.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total time spent (in seconds).
    pub fn total_seconds(&self) -> f64 {
        self.total_ns.load(Ordering::Relaxed) as f64 / 1e9
    }

    /// Get number of calls.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Phase timings of one pipeline run plus frame loop totals.
#[derive(Debug, Default, Clone)]
pub struct PerfStats {
    pub setup_time_s: f64,
    pub assemble_time_s: f64,
    pub derive_time_s: f64,
    pub solve_time_s: f64,
    pub compile_time_s: f64,
    pub frame_time_s: f64,
    pub frames: usize,
    pub rhs_evaluations: u64,
}

impl PerfStats {
    /// Total time spent in the one-shot symbolic phase.
    pub fn symbolic_total_s(&self) -> f64 {
        self.setup_time_s
            + self.assemble_time_s
            + self.derive_time_s
            + self.solve_time_s
            + self.compile_time_s
    }

    /// Print a formatted summary of the statistics.
    pub fn print_summary(&self) {
        if !is_enabled() {
            return;
        }

        println!("\n=== Performance Summary ===");
        println!("Setup:               {:.3}s", self.setup_time_s);
        println!("Assemble:            {:.3}s", self.assemble_time_s);
        println!("Derive:              {:.3}s", self.derive_time_s);
        println!("Solve:               {:.3}s", self.solve_time_s);
        println!("Compile:             {:.3}s", self.compile_time_s);

        if self.frames > 0 {
            println!("Frames:              {}", self.frames);
            println!(
                "  Avg frame time:    {:.4}ms",
                self.frame_time_s / self.frames as f64 * 1000.0
            );
            println!("  RHS evaluations:   {}", self.rhs_evaluations);
        }

        println!("==========================\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulating_timer_totals() {
        let timer = AccumulatingTimer::new();
        timer.record(0.5);
        timer.record(1.5);
        assert_eq!(timer.count(), 2);
        assert!((timer.total_seconds() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn timer_measures_regardless_of_switch() {
        let timer = Timer::start();
        assert!(timer.elapsed_s() >= 0.0);
    }

    #[test]
    fn symbolic_total_sums_phases() {
        let stats = PerfStats {
            setup_time_s: 1.0,
            assemble_time_s: 2.0,
            derive_time_s: 3.0,
            solve_time_s: 4.0,
            compile_time_s: 5.0,
            ..Default::default()
        };
        assert_eq!(stats.symbolic_total_s(), 15.0);
    }
}
