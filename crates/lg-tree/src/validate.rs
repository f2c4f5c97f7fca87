//! Mechanism validation logic.

use std::collections::HashSet;

use crate::error::{TreeError, TreeResult};
use crate::mechanism::Node;

/// Validate the tree structure: ids are contiguous, parents are declared
/// before their children, connecting links point at another component and
/// names are unique.
pub(crate) fn validate_structure(nodes: &[Node]) -> TreeResult<()> {
    let mut names: HashSet<&str> = HashSet::new();

    for (i, node) in nodes.iter().enumerate() {
        debug_assert_eq!(node.id.slot(), i);

        if let Some(parent) = node.parent {
            if parent.slot() >= i {
                return Err(TreeError::InvalidParent {
                    comp: node.id,
                    parent,
                });
            }
        }

        if let Some(endpoint) = node.body.endpoint() {
            if endpoint.slot() >= nodes.len() || endpoint == node.id {
                return Err(TreeError::InvalidEndpoint {
                    comp: node.id,
                    endpoint,
                });
            }
        }

        if !names.insert(node.name.as_str()) {
            return Err(TreeError::DuplicateName {
                name: node.name.clone(),
            });
        }
    }

    Ok(())
}

/// Validate every component's own parameters.
pub(crate) fn validate_bodies(nodes: &[Node]) -> TreeResult<()> {
    for node in nodes {
        node.body
            .validate(node.parent)
            .map_err(|source| TreeError::InvalidComponent {
                comp: node.id,
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_components::{Anchor, Body, ElasticLink, MassPoint};
    use lg_core::units::kg;
    use lg_core::{CompId, Id};

    fn node(i: u32, parent: Option<u32>, body: Body) -> Node {
        Node {
            id: Id::from_index(i),
            name: format!("n{i}"),
            parent: parent.map(Id::from_index),
            body,
        }
    }

    #[test]
    fn validate_empty() {
        assert!(validate_structure(&[]).is_ok());
    }

    #[test]
    fn parent_must_precede_child() {
        let nodes = vec![
            node(0, Some(1), MassPoint::default().into()),
            node(1, None, Anchor::default().into()),
        ];
        assert!(matches!(
            validate_structure(&nodes),
            Err(TreeError::InvalidParent { .. })
        ));
    }

    #[test]
    fn endpoint_must_exist() {
        let nodes = vec![
            node(0, None, Anchor::default().into()),
            node(1, Some(0), ElasticLink::connecting(1.0, CompId::from_index(9)).into()),
        ];
        assert!(matches!(
            validate_structure(&nodes),
            Err(TreeError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn names_are_unique() {
        let mut nodes = vec![
            node(0, None, Anchor::default().into()),
            node(1, None, Anchor::default().into()),
        ];
        nodes[1].name = "n0".into();
        assert!(matches!(
            validate_structure(&nodes),
            Err(TreeError::DuplicateName { .. })
        ));
    }

    #[test]
    fn bad_parameters_are_reported() {
        let nodes = vec![
            node(0, None, Anchor::default().into()),
            node(1, Some(0), MassPoint::new(kg(-1.0)).into()),
        ];
        assert!(matches!(
            validate_bodies(&nodes),
            Err(TreeError::InvalidComponent { .. })
        ));
    }
}
