//! Tree-specific error types.

use lg_components::ComponentError;
use lg_core::{CompId, LgError};

/// Errors raised while building a mechanism or running the setup pass.
///
/// Every variant is a configuration error: it is detected before any
/// derivation work starts.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeError {
    /// A component names a parent that was not declared before it.
    InvalidParent { comp: CompId, parent: CompId },

    /// A connecting link names an endpoint that doesn't exist or is itself.
    InvalidEndpoint { comp: CompId, endpoint: CompId },

    /// Two components share a name.
    DuplicateName { name: String },

    /// A component's parameters are invalid.
    InvalidComponent { comp: CompId, source: ComponentError },

    /// The presentation sequence names a component that doesn't exist.
    UnknownComponent { comp: CompId },

    /// The presentation sequence lists a component twice.
    DuplicateInSequence { comp: CompId },

    /// A component was presented before its parent or second endpoint.
    AncestorNotSetUp { comp: CompId, ancestor: CompId },

    /// A state vector of the wrong length was scattered to the components.
    StateLength { expected: usize, actual: usize },

    /// Lookup by name failed.
    NameNotFound { name: String },
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeError::InvalidParent { comp, parent } => {
                write!(
                    f,
                    "Component {} refers to parent {} which is not declared before it",
                    comp, parent
                )
            }
            TreeError::InvalidEndpoint { comp, endpoint } => {
                write!(f, "Component {} has invalid second endpoint {}", comp, endpoint)
            }
            TreeError::DuplicateName { name } => {
                write!(f, "Component name '{}' is used more than once", name)
            }
            TreeError::InvalidComponent { comp, source } => {
                write!(f, "Component {} is invalid: {}", comp, source)
            }
            TreeError::UnknownComponent { comp } => {
                write!(f, "Sequence names unknown component {}", comp)
            }
            TreeError::DuplicateInSequence { comp } => {
                write!(f, "Component {} appears more than once in the sequence", comp)
            }
            TreeError::AncestorNotSetUp { comp, ancestor } => {
                write!(
                    f,
                    "Component {} was presented before {} it depends on",
                    comp, ancestor
                )
            }
            TreeError::StateLength { expected, actual } => {
                write!(f, "State vector has length {} (expected {})", actual, expected)
            }
            TreeError::NameNotFound { name } => {
                write!(f, "No component named '{}'", name)
            }
        }
    }
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TreeError::InvalidComponent { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type TreeResult<T> = Result<T, TreeError>;

impl From<TreeError> for LgError {
    fn from(err: TreeError) -> Self {
        LgError::Invariant {
            what: Box::leak(err.to_string().into_boxed_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_both_components() {
        let err = TreeError::AncestorNotSetUp {
            comp: CompId::from_index(2),
            ancestor: CompId::from_index(1),
        };
        let text = err.to_string();
        assert!(text.contains('2') && text.contains('1'));
    }

    #[test]
    fn converts_to_core_error() {
        let err = TreeError::UnknownComponent {
            comp: CompId::from_index(7),
        };
        let core: LgError = err.into();
        assert!(matches!(core, LgError::Invariant { .. }));
    }
}
