//! The one-shot setup pass: coordinate assignment in presentation order.

use std::ops::Range;

use lg_core::CompId;
use lg_symbolic::{ExprGraph, ExprId};
use tracing::{debug, info};

use crate::error::{TreeError, TreeResult};
use crate::mechanism::Mechanism;

/// Hand out `dof` consecutive coordinate indices starting at `next`.
///
/// Returns the assigned range and the next free index.
pub fn assign(next: usize, dof: usize) -> (Range<usize>, usize) {
    (next..next + dof, next + dof)
}

/// Result of the setup pass.
///
/// Maps every presented component to the contiguous range of generalized
/// coordinates it owns, and holds the time-function atom `q_i(t)` created for
/// each coordinate.
#[derive(Debug, Clone)]
pub struct Setup {
    time: ExprId,
    sequence: Vec<CompId>,
    /// Coordinate range per component slot; `None` when not presented.
    ranges: Vec<Option<Range<usize>>>,
    /// Owner and local coordinate number, per coordinate.
    owners: Vec<(CompId, usize)>,
    atoms: Vec<ExprId>,
}

impl Setup {
    pub fn coordinate_count(&self) -> usize {
        self.atoms.len()
    }

    /// Length of the interleaved `(position, velocity)` state vector.
    pub fn state_len(&self) -> usize {
        2 * self.atoms.len()
    }

    /// The time atom `t` all time functions depend on.
    pub fn time(&self) -> ExprId {
        self.time
    }

    /// Presented components, in presentation order.
    pub fn sequence(&self) -> &[CompId] {
        &self.sequence
    }

    pub fn is_presented(&self, id: CompId) -> bool {
        matches!(self.ranges.get(id.slot()), Some(Some(_)))
    }

    /// Coordinate indices owned by `id` (empty for non-coordinate components).
    pub fn range(&self, id: CompId) -> Range<usize> {
        match self.ranges.get(id.slot()) {
            Some(Some(r)) => r.clone(),
            _ => 0..0,
        }
    }

    /// Time-function atoms `q_i(t)` owned by `id`.
    pub fn coords(&self, id: CompId) -> &[ExprId] {
        &self.atoms[self.range(id)]
    }

    /// All coordinate atoms `q_i(t)`, by coordinate index.
    pub fn atoms(&self) -> &[ExprId] {
        &self.atoms
    }

    /// Owning component and its local coordinate number.
    pub fn owner(&self, coordinate: usize) -> Option<(CompId, usize)> {
        self.owners.get(coordinate).copied()
    }

    /// Human readable name such as `rod1.phi`.
    pub fn label(&self, mech: &Mechanism, coordinate: usize) -> String {
        match self.owner(coordinate) {
            Some((id, local)) => {
                let names = mech
                    .body(id)
                    .and_then(|b| b.dynamic())
                    .map_or(&[][..], |d| d.coordinate_names());
                let coord = names.get(local).copied().unwrap_or("q");
                format!("{}.{}", mech.name(id), coord)
            }
            None => format!("q{}", coordinate),
        }
    }
}

/// Run the setup pass over `sequence`.
///
/// Every coordinate-owning component receives the next coordinate indices and
/// a time function `q_i(t)` is created in `g` for each. A component may only
/// be presented after its parent and, for connecting links, after its second
/// endpoint.
pub fn setup(mech: &Mechanism, sequence: &[CompId], g: &mut ExprGraph) -> TreeResult<Setup> {
    let mut ranges: Vec<Option<Range<usize>>> = vec![None; mech.len()];
    let mut owners = Vec::new();
    let mut atoms = Vec::new();
    let mut next = 0;

    for &id in sequence {
        let node = mech.node(id).ok_or(TreeError::UnknownComponent { comp: id })?;
        if ranges[id.slot()].is_some() {
            return Err(TreeError::DuplicateInSequence { comp: id });
        }
        for ancestor in node.parent.into_iter().chain(node.body.endpoint()) {
            if ranges[ancestor.slot()].is_none() {
                return Err(TreeError::AncestorNotSetUp { comp: id, ancestor });
            }
        }

        let dof = node.body.dof();
        let (range, after) = assign(next, dof);
        next = after;
        for (local, index) in range.clone().enumerate() {
            owners.push((id, local));
            atoms.push(g.coord(index, 0));
            debug!(
                component = %node.name,
                kind = node.body.kind(),
                coordinate = index,
                "assigned coordinate"
            );
        }
        ranges[id.slot()] = Some(range);
    }

    info!(
        components = sequence.len(),
        coordinates = atoms.len(),
        "setup complete"
    );

    Ok(Setup {
        time: g.time(),
        sequence: sequence.to_vec(),
        ranges,
        owners,
        atoms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MechanismBuilder;
    use lg_components::{Anchor, ElasticLink, MassPoint, RotatingLink};
    use lg_core::units::m;

    #[test]
    fn accumulator_hands_out_consecutive_indices() {
        let (r1, n1) = assign(0, 1);
        let (r2, n2) = assign(n1, 0);
        let (r3, n3) = assign(n2, 2);
        assert_eq!((r1, r2, r3, n3), (0..1, 1..1, 1..3, 3));
    }

    #[test]
    fn coordinates_follow_presentation_order() {
        let mut b = MechanismBuilder::new();
        let base = b.add_root("base", Anchor::default());
        let r1 = b.add("r1", base, RotatingLink::new(m(1.0)));
        let p1 = b.add("p1", r1, MassPoint::default());
        let s1 = b.add("s1", p1, ElasticLink::anchored(10.0, m(1.0)));
        let mech = b.build().unwrap();

        let mut g = ExprGraph::new();
        let st = setup(&mech, &mech.declaration_order(), &mut g).unwrap();
        assert_eq!(st.coordinate_count(), 3);
        assert_eq!(st.state_len(), 6);
        assert_eq!(st.range(r1), 0..1);
        assert_eq!(st.range(p1), 1..1);
        assert_eq!(st.range(s1), 1..3);
        assert_eq!(st.owner(2), Some((s1, 1)));
        assert_eq!(st.label(&mech, 2), "s1.phi");
        assert_eq!(g.coord_of(st.coords(s1)[0]), Some((1, 0)));
    }

    #[test]
    fn child_before_parent_is_rejected() {
        let mut b = MechanismBuilder::new();
        let base = b.add_root("base", Anchor::default());
        let r1 = b.add("r1", base, RotatingLink::default());
        let mech = b.build().unwrap();

        let mut g = ExprGraph::new();
        let err = setup(&mech, &[r1, base], &mut g).unwrap_err();
        assert_eq!(
            err,
            TreeError::AncestorNotSetUp {
                comp: r1,
                ancestor: base
            }
        );
    }

    #[test]
    fn connecting_link_waits_for_endpoint() {
        let mut b = MechanismBuilder::new();
        let a = b.add_root("a", Anchor::fixed(0.0, 1.0));
        let c = b.add_root("c", Anchor::default());
        let s = b.add("s", a, ElasticLink::connecting(1.0, c));
        let mech = b.build().unwrap();

        let mut g = ExprGraph::new();
        assert!(matches!(
            setup(&mech, &[a, s, c], &mut g),
            Err(TreeError::AncestorNotSetUp { ancestor, .. }) if ancestor == c
        ));
        assert!(setup(&mech, &[a, c, s], &mut g).is_ok());
    }

    #[test]
    fn duplicate_and_unknown_ids() {
        let mut b = MechanismBuilder::new();
        let base = b.add_root("base", Anchor::default());
        let mech = b.build().unwrap();

        let mut g = ExprGraph::new();
        assert!(matches!(
            setup(&mech, &[base, base], &mut g),
            Err(TreeError::DuplicateInSequence { .. })
        ));
        assert!(matches!(
            setup(&mech, &[CompId::from_index(5)], &mut g),
            Err(TreeError::UnknownComponent { .. })
        ));
    }
}
