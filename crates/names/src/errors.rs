//! Error types for name parsing and validation

use std::fmt;

/// Errors that can occur while parsing or validating a resource name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The string does not match the grammar of the requested kind
    InvalidName {
        kind: &'static str,
        name: String,
    },

    /// A segment of the name is not a legal identifier
    InvalidIdentifier { id: String, reason: String },

    /// A revision tag is malformed
    InvalidRevisionTag { tag: String, reason: String },

    /// No resource kind recognizes the string
    Unrecognized(String),
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameError::InvalidName { kind, name } => {
                write!(f, "invalid {kind} name {name:?}")
            }
            NameError::InvalidIdentifier { id, reason } => {
                write!(f, "invalid identifier {id:?}: {reason}")
            }
            NameError::InvalidRevisionTag { tag, reason } => {
                write!(f, "invalid revision tag {tag:?}: {reason}")
            }
            NameError::Unrecognized(name) => {
                write!(f, "{name:?} is not a recognized resource name")
            }
        }
    }
}

impl std::error::Error for NameError {}
