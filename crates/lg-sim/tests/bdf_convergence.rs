//! BDF behavior on linear decay over sampled rates and step sizes.

use lg_sim::{Bdf, BdfConfig, Integrator, SimResult, TransientModel};
use nalgebra::DVector;
use proptest::prelude::*;

/// x' = -λ x
struct Decay {
    lambda: f64,
}

impl TransientModel for Decay {
    fn dim(&self) -> usize {
        1
    }

    fn rhs(&self, _t: f64, x: &DVector<f64>) -> SimResult<DVector<f64>> {
        Ok(x * -self.lambda)
    }
}

fn integrate(lambda: f64, h: f64, steps: usize) -> f64 {
    let model = Decay { lambda };
    let mut bdf = Bdf::new(BdfConfig::default());
    let mut x = DVector::from_element(1, 1.0);
    let mut t = 0.0;
    for _ in 0..steps {
        x = bdf.step(&model, t, &x, h).unwrap();
        t += h;
    }
    assert_eq!(bdf.cutbacks(), 0);
    x[0]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn resolved_decay_matches_exponential(lambda in 0.5f64..5.0, h in 1e-3f64..1e-2) {
        let steps = 50;
        let x = integrate(lambda, h, steps);
        let exact = (-lambda * h * steps as f64).exp();
        prop_assert!(x > 0.0 && x <= 1.0, "x = {}", x);
        prop_assert!((x - exact).abs() < 5e-3, "x = {}, exact = {}", x, exact);
    }

    #[test]
    fn stiff_decay_stays_bounded(lambda in 100.0f64..1e4) {
        let x = integrate(lambda, 0.01, 50);
        prop_assert!(x.is_finite());
        prop_assert!(x.abs() < 0.1, "x = {}", x);
    }
}
