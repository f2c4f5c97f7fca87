//! Position and energy expressions built recursively along the parent chain.

use std::collections::HashMap;

use lg_components::{Attachment, Placement, SymPoint};
use lg_core::CompId;
use lg_symbolic::{ExprGraph, ExprId};

use crate::mechanism::Mechanism;
use crate::setup::Setup;

/// Expression builder for one derivation pass.
///
/// Positions and attachment points are memoized per component, so a parent
/// shared by many children is expanded once.
pub struct Kinematics<'a> {
    mech: &'a Mechanism,
    setup: &'a Setup,
    positions: HashMap<CompId, SymPoint>,
    attachments: HashMap<CompId, SymPoint>,
}

impl<'a> Kinematics<'a> {
    pub fn new(mech: &'a Mechanism, setup: &'a Setup) -> Self {
        Self {
            mech,
            setup,
            positions: HashMap::new(),
            attachments: HashMap::new(),
        }
    }

    /// Where `id` is attached, resolved from its [`Attachment`].
    fn attach_point(&mut self, g: &mut ExprGraph, id: CompId) -> SymPoint {
        if let Some(&p) = self.attachments.get(&id) {
            return p;
        }
        let mech = self.mech;
        let p = match (mech.parent(id), mech.body(id)) {
            (Some(parent), Some(body)) => match body.attachment() {
                Attachment::Position => self.position(g, parent),
                Attachment::Along(s) => {
                    let local = g.constant(s);
                    self.local_to_global(g, parent, local)
                }
                Attachment::AlongCoordinate(k) => {
                    let local = self.setup.coords(id)[k];
                    self.local_to_global(g, parent, local)
                }
            },
            _ => SymPoint::origin(g),
        };
        self.attachments.insert(id, p);
        p
    }

    fn placement(&mut self, g: &mut ExprGraph, id: CompId) -> Placement<'a> {
        let (mech, setup) = (self.mech, self.setup);
        let attach = self.attach_point(g, id);
        let endpoint = match mech.body(id).and_then(|b| b.endpoint()) {
            Some(other) => Some(self.position(g, other)),
            None => None,
        };
        Placement {
            attach,
            endpoint,
            time: setup.time(),
            coords: setup.coords(id),
        }
    }

    /// Global position of component `id`.
    pub fn position(&mut self, g: &mut ExprGraph, id: CompId) -> SymPoint {
        if let Some(&p) = self.positions.get(&id) {
            return p;
        }
        let mech = self.mech;
        let place = self.placement(g, id);
        let p = match mech.body(id) {
            Some(body) => body.position(g, &place),
            None => SymPoint::origin(g),
        };
        self.positions.insert(id, p);
        p
    }

    /// Global position of the point at parameter `local` along `id`.
    pub fn local_to_global(&mut self, g: &mut ExprGraph, id: CompId, local: ExprId) -> SymPoint {
        let mech = self.mech;
        let place = self.placement(g, id);
        match mech.body(id) {
            Some(body) => body.local_to_global(g, &place, local),
            None => SymPoint::origin(g),
        }
    }

    /// Kinetic energy of `id`: ½ m |d/dt position|² for massive components.
    pub fn kinetic(&mut self, g: &mut ExprGraph, id: CompId) -> ExprId {
        let mech = self.mech;
        let Some(body) = mech.body(id) else {
            return g.zero();
        };
        if !body.has_mass() {
            return g.zero();
        }
        let velocity = self.position(g, id).velocity(g);
        body.kinetic(g, velocity)
    }

    /// Potential energy of `id` under downward gravity `gravity`.
    pub fn potential(&mut self, g: &mut ExprGraph, id: CompId, gravity: ExprId) -> ExprId {
        let mech = self.mech;
        let Some(body) = mech.body(id) else {
            return g.zero();
        };
        let place = self.placement(g, id);
        let position = self.position(g, id);
        body.potential(g, &place, position, gravity)
    }
}
