//! Runtime failures raised while running a chain.
//!
//! These are the checks the host VM performs when it executes an adapter:
//! a failed cast, unboxing `null`, spreading an array of the wrong length.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    #[error("{value} cannot be cast to {class}")]
    ClassCast { value: String, class: String },

    #[error("null passed where {expected} is required")]
    NullPointer { expected: String },

    #[error("expected {expected} arguments, got {actual}")]
    WrongArity { expected: usize, actual: usize },

    #[error("array of length {actual} spread into {expected} arguments")]
    ArrayLength { expected: usize, actual: usize },

    #[error("{value} is not an array")]
    NotAnArray { value: String },

    /// Raised by a host function body.
    #[error("{0}")]
    Host(String),
}
