//! Editor state for quire.
//!
//! An [`EditorState`] pairs a document with a [`Selection`]. Changes are
//! described by a [`Transaction`], a [`Transform`](quire_transform::Transform)
//! that also tracks the selection, a timestamp and free-form metadata, and
//! applying it produces the next state.

/// Error types.
pub mod error;
/// Metadata keys shared between crates.
pub mod meta;
/// Selections and selection bookmarks.
pub mod selection;
/// The editor state and the safe-mode boundary.
pub mod state;
/// Transactions.
pub mod transaction;

pub use error::{Result, StateError};
pub use selection::{Selection, SelectionBookmark, find_selection_in};
pub use state::{EditorState, safe_mode, set_safe_mode};
pub use transaction::Transaction;
