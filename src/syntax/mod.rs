//! Just enough JavaScript to read and edit a HyperTerm config module.
//!
//! The lexer produces spanned tokens; the tree pass finds the exported object
//! literal and the array literals under its keys. Nothing is ever re-printed
//! from the tree: edits are byte splices into the original text, so everything
//! outside the edited range survives untouched.

pub mod lexer;
pub mod literal;
pub mod tree;

use thiserror::Error;

pub use lexer::{Span, SyntaxError};
pub use tree::{ElementKind, ExportedObject, MemberValue, parse_exported_object};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// The module parses but does not export an object literal.
    #[error("{0}")]
    Shape(String),

    /// A recognized field exists but holds the wrong kind of value.
    #[error("`{field}` {reason}")]
    Field { field: String, reason: String },
}

impl ParseError {
    pub fn field(field: &str, reason: impl Into<String>) -> Self {
        Self::Field {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
