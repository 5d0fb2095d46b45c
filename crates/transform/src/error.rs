//! Error types for steps and transforms.

use quire_model::ModelError;
use thiserror::Error;

/// A step that could not be applied.
///
/// This is the expected, recoverable failure channel: callers that replay
/// steps (rebasing, undo) drop the step instead of aborting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StepError {
	/// Human readable reason.
	pub message: String,
}

impl StepError {
	/// Creates a failure with the given message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

impl From<ModelError> for StepError {
	fn from(err: ModelError) -> Self {
		Self::new(err.to_string())
	}
}

/// Errors raised by [`Transform`](crate::Transform) methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
	/// A step failed to apply to the current document.
	#[error("{0}")]
	Step(#[from] StepError),

	/// A structural contract of the document model was violated.
	#[error(transparent)]
	Model(#[from] ModelError),

	/// Arguments that cannot describe a valid edit, such as a position
	/// without a node or a wrapper chain that does not nest.
	#[error("{0}")]
	Range(String),

	/// Malformed step JSON.
	#[error("{0}")]
	Json(String),
}

impl TransformError {
	pub(crate) fn range(msg: impl Into<String>) -> Self {
		Self::Range(msg.into())
	}
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;

/// Outcome of applying a step: the new document or the failure.
pub type StepResult = std::result::Result<quire_model::Node, StepError>;
