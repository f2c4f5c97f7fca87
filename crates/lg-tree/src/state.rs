//! Interleaved `(position, velocity)` state layout.
//!
//! Coordinate `i` occupies `x[2i]` (position) and `x[2i + 1]` (velocity).

use crate::error::{TreeError, TreeResult};
use crate::mechanism::Mechanism;
use crate::setup::Setup;

/// Initial state built from every presented component's initial conditions.
pub fn initial_state(mech: &Mechanism, setup: &Setup) -> Vec<f64> {
    let mut x0 = Vec::with_capacity(setup.state_len());
    for &id in setup.sequence() {
        if let Some(body) = mech.body(id) {
            x0.extend(body.initial_state());
        }
    }
    x0
}

/// The state slice owned by one component.
pub fn slice_of<'x>(setup: &Setup, x: &'x [f64], id: lg_core::CompId) -> &'x [f64] {
    let r = setup.range(id);
    &x[2 * r.start..2 * r.end]
}

/// Hand the latest state to every coordinate-owning component.
pub fn scatter(mech: &mut Mechanism, setup: &Setup, x: &[f64]) -> TreeResult<()> {
    if x.len() != setup.state_len() {
        return Err(TreeError::StateLength {
            expected: setup.state_len(),
            actual: x.len(),
        });
    }
    for &id in setup.sequence() {
        let part = slice_of(setup, x, id);
        if let Some(body) = mech.body_mut(id) {
            body.update(part)
                .map_err(|source| TreeError::InvalidComponent { comp: id, source })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MechanismBuilder;
    use crate::setup::setup;
    use lg_components::{Anchor, ElasticLink, MassPoint, RotatingLink};
    use lg_core::units::m;
    use lg_symbolic::ExprGraph;

    #[test]
    fn initial_state_and_scatter() {
        let mut b = MechanismBuilder::new();
        let base = b.add_root("base", Anchor::default());
        let r1 = b.add("r1", base, RotatingLink::new(m(1.0)).with_initial(0.7, 0.1));
        let p1 = b.add("p1", r1, MassPoint::default());
        let s1 = b.add(
            "s1",
            p1,
            ElasticLink::anchored(5.0, m(1.0)).with_initial(0.2, 0.0, 0.3, -0.1),
        );
        let mut mech = b.build().unwrap();

        let mut g = ExprGraph::new();
        let st = setup(&mech, &mech.declaration_order(), &mut g).unwrap();
        let x0 = initial_state(&mech, &st);
        assert_eq!(x0, vec![0.7, 0.1, 0.2, 0.0, 0.3, -0.1]);
        assert_eq!(x0.len(), st.state_len());

        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        scatter(&mut mech, &st, &x).unwrap();
        let spring_state = mech.body(s1).and_then(|b| b.dynamic()).unwrap().state();
        assert_eq!(spring_state, vec![3.0, 4.0, 5.0, 6.0]);

        assert!(matches!(
            scatter(&mut mech, &st, &x[..4]),
            Err(TreeError::StateLength { .. })
        ));
    }
}
