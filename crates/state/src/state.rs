//! The editor state and the safe-mode boundary.

use std::sync::atomic::{AtomicBool, Ordering};

use quire_model::{Mark, Node, ResolvedPos};
use tracing::warn;

use crate::error::{Result, StateError};
use crate::selection::Selection;
use crate::transaction::Transaction;

static SAFE_MODE: AtomicBool = AtomicBool::new(true);

/// Turns safe mode on or off for the whole process.
///
/// With safe mode on, [`EditorState::apply`] and [`EditorState::resolve`]
/// log structural errors and degrade to a no-op instead of returning them.
pub fn set_safe_mode(on: bool) {
	SAFE_MODE.store(on, Ordering::Relaxed);
}

pub fn safe_mode() -> bool {
	SAFE_MODE.load(Ordering::Relaxed)
}

/// A document with a selection and the marks to apply to the next typed
/// text. States are immutable; [`EditorState::apply`] returns a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
	doc: Node,
	selection: Selection,
	stored_marks: Option<Vec<Mark>>,
}

impl EditorState {
	/// A state for `doc`, with the cursor at the start unless a selection
	/// is given.
	pub fn create(doc: Node, selection: Option<Selection>) -> Self {
		let selection = selection.unwrap_or_else(|| Selection::at_start(&doc));
		Self { doc, selection, stored_marks: None }
	}

	pub fn doc(&self) -> &Node {
		&self.doc
	}

	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	pub fn stored_marks(&self) -> Option<&[Mark]> {
		self.stored_marks.as_deref()
	}

	/// Starts a transaction on this state.
	pub fn tr(&self) -> Transaction {
		Transaction::new(self)
	}

	/// Applies a transaction, producing the next state.
	///
	/// A transaction that was not started from this state's document is
	/// rejected. In safe mode, failures are logged and the state is
	/// returned unchanged.
	pub fn apply(&self, tr: &Transaction) -> Result<EditorState> {
		match self.apply_inner(tr) {
			Ok(state) => Ok(state),
			Err(err) if safe_mode() => {
				warn!(error = %err, steps = tr.steps().len(), "dropping transaction that failed to apply");
				Ok(self.clone())
			}
			Err(err) => Err(err),
		}
	}

	fn apply_inner(&self, tr: &Transaction) -> Result<EditorState> {
		if tr.before() != &self.doc {
			return Err(StateError::Mismatch);
		}
		Ok(EditorState {
			doc: tr.doc().clone(),
			selection: tr.selection()?,
			stored_marks: tr.stored_marks().map(<[Mark]>::to_vec),
		})
	}

	/// Resolves a position in the document. In safe mode an invalid
	/// position is logged and yields `None`.
	pub fn resolve(&self, pos: usize) -> Result<Option<ResolvedPos>> {
		match self.doc.resolve(pos) {
			Ok(rpos) => Ok(Some(rpos)),
			Err(err) if safe_mode() => {
				warn!(error = %err, pos, "failed to resolve position");
				Ok(None)
			}
			Err(err) => Err(err.into()),
		}
	}
}
