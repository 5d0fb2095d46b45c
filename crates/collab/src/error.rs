//! Errors raised while rebasing and receiving steps.

use quire_model::ModelError;
use quire_state::StateError;
use quire_transform::TransformError;
use thiserror::Error;

/// Errors from collaboration operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollabError {
	/// Undoing local steps or applying remote steps failed.
	#[error(transparent)]
	Transform(#[from] TransformError),

	/// A step could not be inverted against its document.
	#[error(transparent)]
	Model(#[from] ModelError),

	/// Mapping the selection into the new document failed.
	#[error(transparent)]
	State(#[from] StateError),
}

/// Result type for collaboration operations.
pub type Result<T> = std::result::Result<T, CollabError>;
