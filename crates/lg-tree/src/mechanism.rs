//! The component registry.

use lg_components::Body;
use lg_core::CompId;

use crate::error::{TreeError, TreeResult};

/// A registered component: its body plus its place in the tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: CompId,
    pub name: String,
    pub parent: Option<CompId>,
    pub body: Body,
}

/// A validated, index-addressed collection of components.
///
/// Components are stored in declaration order; a parent is always declared
/// before its children, so `parent.slot() < child.slot()`.
#[derive(Debug, Clone)]
pub struct Mechanism {
    pub(crate) nodes: Vec<Node>,
    /// Children of each component, by slot, in declaration order.
    pub(crate) children: Vec<Vec<CompId>>,
}

impl Mechanism {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a component by ID (returns None if ID out of bounds).
    pub fn node(&self, id: CompId) -> Option<&Node> {
        self.nodes.get(id.slot())
    }

    pub fn body(&self, id: CompId) -> Option<&Body> {
        self.node(id).map(|n| &n.body)
    }

    pub fn body_mut(&mut self, id: CompId) -> Option<&mut Body> {
        self.nodes.get_mut(id.slot()).map(|n| &mut n.body)
    }

    pub fn parent(&self, id: CompId) -> Option<CompId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: CompId) -> &[CompId] {
        self.children.get(id.slot()).map_or(&[], |c| c.as_slice())
    }

    /// Parent chain from the direct parent up to the root.
    pub fn ancestors(&self, id: CompId) -> Ancestors<'_> {
        Ancestors {
            mech: self,
            next: self.parent(id),
        }
    }

    pub fn name(&self, id: CompId) -> &str {
        self.node(id).map_or("?", |n| n.name.as_str())
    }

    pub fn find(&self, name: &str) -> TreeResult<CompId> {
        self.nodes
            .iter()
            .find(|n| n.name == name)
            .map(|n| n.id)
            .ok_or_else(|| TreeError::NameNotFound {
                name: name.to_string(),
            })
    }

    /// Declaration order; the default presentation sequence.
    pub fn declaration_order(&self) -> Vec<CompId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// Any anchor with a time-dependent trajectory.
    pub fn is_driven(&self) -> bool {
        self.nodes.iter().any(|n| n.body.is_driven())
    }

    /// Any coordinate with positive damping.
    pub fn is_damped(&self) -> bool {
        self.nodes.iter().any(|n| n.body.is_damped())
    }
}

pub struct Ancestors<'a> {
    mech: &'a Mechanism,
    next: Option<CompId>,
}

impl Iterator for Ancestors<'_> {
    type Item = CompId;

    fn next(&mut self) -> Option<CompId> {
        let current = self.next?;
        self.next = self.mech.parent(current);
        Some(current)
    }
}
