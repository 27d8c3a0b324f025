//! Error types for shape-containment

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, ContainmentError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainmentError {
    /// A shape declares the same predicate as both required and forbidden.
    #[error("the predicate {predicate} is defined in the positive and the negative property of shape {shape}")]
    InconsistentPredicate { shape: String, predicate: String },
}
