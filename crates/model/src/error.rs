//! Error types for the document model.

use thiserror::Error;

/// Errors raised by the document model.
///
/// [`ModelError::Replace`] is the distinguished error produced by the
/// structural replace algorithm when a slice cannot be placed. Everything
/// else signals a caller violating a structural contract of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
	/// A slice could not be placed by [`Node::replace`](crate::Node::replace).
	#[error("{0}")]
	Replace(String),

	/// Content does not satisfy a node type's content expression.
	#[error("Invalid content for node {node}: {content}")]
	InvalidContent {
		/// Name of the node type.
		node: String,
		/// Debug rendering of the rejected content.
		content: String,
	},

	/// A position lies outside the document.
	#[error("Position {0} out of range")]
	PositionOutOfRange(usize),

	/// Schema construction failed.
	#[error("{0}")]
	Schema(String),

	/// An attribute map did not match the declared attributes.
	#[error("{0}")]
	Attrs(String),

	/// A node type name is not part of the schema.
	#[error("Unknown node type: {0}")]
	UnknownNodeType(String),

	/// A mark type name is not part of the schema.
	#[error("There is no mark type {0} in this schema")]
	UnknownMarkType(String),

	/// Malformed JSON input.
	#[error("{0}")]
	Json(String),

	/// A structurally impossible request, such as asking for the position
	/// before the top-level node.
	#[error("{0}")]
	Range(String),
}

impl ModelError {
	pub(crate) fn replace(msg: impl Into<String>) -> Self {
		Self::Replace(msg.into())
	}

	/// Returns true for errors produced by the replace algorithm.
	pub fn is_replace(&self) -> bool {
		matches!(self, Self::Replace(_))
	}
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
