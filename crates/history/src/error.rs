//! Errors raised while recording or replaying history.

use quire_model::ModelError;
use quire_state::StateError;
use thiserror::Error;

/// Errors from history operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
	/// A step could not be inverted against its document.
	#[error(transparent)]
	Model(#[from] ModelError),

	/// Building the undo or redo transaction failed.
	#[error(transparent)]
	State(#[from] StateError),
}

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;
