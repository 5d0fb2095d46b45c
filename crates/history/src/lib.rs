//! Undo history for quire.
//!
//! The history is a pair of [`Branch`]es: `done` holds inverted steps that
//! undo recent changes, `undone` holds the steps that redo undone ones.
//! Hosts keep a [`HistoryState`] next to their
//! [`EditorState`](quire_state::EditorState), update it with
//! [`HistoryState::apply`] for every transaction they apply, and use
//! [`undo`] and [`redo`] to build the transactions that walk it.
//!
//! Changes that should not be undoable (remote edits in particular) are
//! recorded only as position maps, so that local steps recorded before
//! them still apply to the current document.

/// Branches and items.
pub mod branch;
/// Undo and redo commands.
pub mod commands;
/// History configuration.
pub mod config;
/// Error types.
pub mod error;
/// A persistent sequence with cheap append and slice.
pub mod rope;
/// The history state.
pub mod state;

pub use branch::{Branch, Item, PoppedEvent};
pub use commands::{
	close_history, is_history_transaction, redo, redo_depth, redo_no_scroll, undo, undo_depth, undo_no_scroll,
};
pub use config::HistoryConfig;
pub use error::{HistoryError, Result};
pub use rope::RopeSequence;
pub use state::{CLOSE_HISTORY, HISTORY_META, HistoryMeta, HistoryState};
