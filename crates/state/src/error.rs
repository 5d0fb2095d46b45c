//! Errors raised while building transactions and applying them.

use quire_model::ModelError;
use quire_transform::TransformError;
use thiserror::Error;

/// Errors from state and transaction operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
	/// A transform operation failed.
	#[error(transparent)]
	Transform(#[from] TransformError),

	/// A document model contract was violated.
	#[error(transparent)]
	Model(#[from] ModelError),

	/// The transaction was not started from the state it is applied to.
	#[error("Applying a mismatched transaction")]
	Mismatch,

	/// A selection that does not fit the document.
	#[error("{0}")]
	Selection(String),
}

/// Result type for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
