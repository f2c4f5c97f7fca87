//! Incremental mechanism builder.

use lg_components::Body;
use lg_core::CompId;

use crate::error::TreeResult;
use crate::mechanism::{Mechanism, Node};
use crate::validate;

/// Builder for constructing a mechanism incrementally.
///
/// Use `add_root` and `add` to declare components (a parent must be declared
/// before its children), then call `build()` to validate and freeze the tree
/// into an immutable `Mechanism`.
#[derive(Debug, Default)]
pub struct MechanismBuilder {
    nodes: Vec<Node>,
    next_comp_id: u32,
}

impl MechanismBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component without a parent (anchors, free tracks).
    pub fn add_root(&mut self, name: impl Into<String>, body: impl Into<Body>) -> CompId {
        self.push(name.into(), None, body.into())
    }

    /// Add a component hanging off `parent`.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        parent: CompId,
        body: impl Into<Body>,
    ) -> CompId {
        self.push(name.into(), Some(parent), body.into())
    }

    fn push(&mut self, name: String, parent: Option<CompId>, body: Body) -> CompId {
        let id = CompId::from_index(self.next_comp_id);
        self.next_comp_id += 1;
        self.nodes.push(Node {
            id,
            name,
            parent,
            body,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Validate the structure and every component's parameters.
    pub fn build(self) -> TreeResult<Mechanism> {
        validate::validate_structure(&self.nodes)?;
        validate::validate_bodies(&self.nodes)?;

        let mut children = vec![Vec::new(); self.nodes.len()];
        for node in &self.nodes {
            if let Some(parent) = node.parent {
                children[parent.slot()].push(node.id);
            }
        }

        Ok(Mechanism {
            nodes: self.nodes,
            children,
        })
    }
}
