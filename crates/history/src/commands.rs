//! Undo and redo commands.
//!
//! Commands build the transaction to dispatch and leave dispatching to the
//! caller. They return `Ok(None)` when there is nothing to undo or redo.

use quire_state::{EditorState, Transaction};
use tracing::debug;

use crate::branch::Branch;
use crate::config::HistoryConfig;
use crate::error::Result;
use crate::state::{CLOSE_HISTORY, HISTORY_META, HistoryMeta, HistoryState};

/// Undoes the last event and scrolls the selection into view.
pub fn undo(state: &EditorState, history: &HistoryState, config: &HistoryConfig) -> Result<Option<Transaction>> {
	Ok(hist_transaction(history, state, config, false)?.map(scrolled))
}

/// Redoes the last undone event and scrolls the selection into view.
pub fn redo(state: &EditorState, history: &HistoryState, config: &HistoryConfig) -> Result<Option<Transaction>> {
	Ok(hist_transaction(history, state, config, true)?.map(scrolled))
}

/// [`undo`] without scrolling.
pub fn undo_no_scroll(
	state: &EditorState,
	history: &HistoryState,
	config: &HistoryConfig,
) -> Result<Option<Transaction>> {
	hist_transaction(history, state, config, false)
}

/// [`redo`] without scrolling.
pub fn redo_no_scroll(
	state: &EditorState,
	history: &HistoryState,
	config: &HistoryConfig,
) -> Result<Option<Transaction>> {
	hist_transaction(history, state, config, true)
}

/// Number of undoable events.
pub fn undo_depth(history: &HistoryState) -> usize {
	history.done().event_count()
}

/// Number of redoable events.
pub fn redo_depth(history: &HistoryState) -> usize {
	history.undone().event_count()
}

/// Makes sure the next change starts a new event.
pub fn close_history(tr: &mut Transaction) -> &mut Transaction {
	tr.set_meta(CLOSE_HISTORY, true)
}

/// Whether `tr` was created by [`undo`] or [`redo`].
pub fn is_history_transaction(tr: &Transaction) -> bool {
	tr.has_meta(HISTORY_META)
}

fn scrolled(mut tr: Transaction) -> Transaction {
	tr.scroll_into_view();
	tr
}

fn hist_transaction(
	history: &HistoryState,
	state: &EditorState,
	config: &HistoryConfig,
	redo: bool,
) -> Result<Option<Transaction>> {
	let preserve_items = history.preserve_items();
	let (source, target) = if redo { (history.undone(), history.done()) } else { (history.done(), history.undone()) };
	let Some(pop) = source.pop_event(state, preserve_items)? else {
		return Ok(None);
	};

	let selection = pop.selection.resolve(pop.transaction.doc())?;
	let added = target.add_transform(&pop.transaction, Some(state.selection().bookmark()), config, preserve_items)?;
	let (done, undone): (Branch, Branch) = if redo { (added, pop.remaining) } else { (pop.remaining, added) };
	debug!(redo, steps = pop.transaction.steps().len(), undo_depth = done.event_count(), "history transaction");

	let new_history = HistoryState::from_branches(done, undone, preserve_items);
	let mut tr = pop.transaction;
	tr.set_selection(selection)?;
	tr.set_meta(HISTORY_META, HistoryMeta { redo, state: new_history });
	Ok(Some(tr))
}
