//! Collaboration state, sending and receiving.

use std::sync::Arc;

use quire_state::meta::{ADD_TO_HISTORY, REBASED};
use quire_state::{EditorState, Selection, Transaction};
use quire_transform::{Bias, Mappable, Step, Transform};
use tracing::debug;

use crate::config::{ClientId, CollabConfig};
use crate::error::Result;
use crate::rebase::{Rebaseable, rebase_steps};

#[cfg(test)]
mod tests;

/// Meta key holding a [`CollabState`] that replaces the current one.
pub const COLLAB_META: &str = "collab$";

/// What a client knows about the shared document.
#[derive(Debug, Clone, Default)]
pub struct CollabState {
	/// Number of steps received from the authority.
	pub version: u64,
	/// Local steps not yet confirmed by the authority.
	pub unconfirmed: Vec<Rebaseable>,
}

impl CollabState {
	pub fn new(config: &CollabConfig) -> Self {
		Self { version: config.version, unconfirmed: Vec::new() }
	}

	/// The state after `tr`. Steps of a document-changing transaction
	/// become unconfirmed, unless the transaction carries a replacement
	/// state under [`COLLAB_META`].
	pub fn apply(&self, tr: &Transaction) -> Result<CollabState> {
		if let Some(next) = tr.get_meta::<CollabState>(COLLAB_META) {
			return Ok(next.clone());
		}
		if !tr.doc_changed() {
			return Ok(self.clone());
		}
		let mut unconfirmed = self.unconfirmed.clone();
		unconfirmed.extend(unconfirmed_from(tr.transform())?);
		Ok(CollabState { version: self.version, unconfirmed })
	}
}

fn unconfirmed_from(transform: &Transform) -> Result<Vec<Rebaseable>> {
	let origin = Arc::new(transform.clone());
	transform
		.steps()
		.iter()
		.zip(transform.docs())
		.map(|(step, doc)| Ok(Rebaseable::new(step.clone(), step.invert(doc)?, origin.clone())))
		.collect()
}

/// Steps ready to be sent to the authority.
#[derive(Debug, Clone)]
pub struct Sendable {
	/// The version the steps apply to.
	pub version: u64,
	pub steps: Vec<Step>,
	pub client_id: ClientId,
	/// The transform each step came from.
	pub origins: Vec<Arc<Transform>>,
}

/// The unconfirmed local steps, or `None` when there are none.
pub fn sendable_steps(collab: &CollabState, config: &CollabConfig) -> Option<Sendable> {
	if collab.unconfirmed.is_empty() {
		return None;
	}
	Some(Sendable {
		version: collab.version,
		steps: collab.unconfirmed.iter().map(|r| r.step.clone()).collect(),
		client_id: config.client_id,
		origins: collab.unconfirmed.iter().map(|r| r.origin.clone()).collect(),
	})
}

/// The version of the shared document the client has seen.
pub fn get_version(collab: &CollabState) -> u64 {
	collab.version
}

/// Builds the transaction that applies `steps`, accepted by the authority
/// from the clients in `client_ids`, to `state`.
///
/// A leading run of steps from this client confirms that many unconfirmed
/// steps and is not applied again. The remaining unconfirmed steps are
/// rebased over the others. The transaction is kept out of the undo
/// history and tells it how many local steps were rebased.
///
/// With `map_selection_backward`, a text selection is mapped with a left
/// bias, so remote insertions at the cursor end up after it.
pub fn receive_transaction(
	state: &EditorState,
	collab: &CollabState,
	config: &CollabConfig,
	steps: &[Step],
	client_ids: &[ClientId],
	map_selection_backward: bool,
) -> Result<Transaction> {
	let version = collab.version + steps.len() as u64;
	let ours = client_ids.iter().take_while(|&&id| id == config.client_id).count();
	let mut unconfirmed = collab.unconfirmed.get(ours..).unwrap_or_default().to_vec();
	let steps = steps.get(ours..).unwrap_or_default();

	let mut tr = state.tr();
	if steps.is_empty() {
		debug!(version, confirmed = ours, "steps confirmed");
		tr.set_meta(COLLAB_META, CollabState { version, unconfirmed });
		return Ok(tr);
	}

	let rebased = unconfirmed.len();
	if rebased > 0 {
		unconfirmed = rebase_steps(&unconfirmed, steps, &mut tr)?;
	} else {
		for step in steps {
			tr.step(step.clone())?;
		}
	}
	debug!(version, confirmed = ours, received = steps.len(), rebased, kept = unconfirmed.len(), "received steps");

	if map_selection_backward && let Selection::Text { anchor, head } = *state.selection() {
		let anchor = tr.doc().resolve(tr.mapping().map(anchor, Bias::Left))?;
		let head = tr.doc().resolve(tr.mapping().map(head, Bias::Left))?;
		tr.set_selection(Selection::between(&anchor, &head, Some(Bias::Left))?)?;
	}

	tr.set_meta(REBASED, rebased);
	tr.set_meta(ADD_TO_HISTORY, false);
	tr.set_meta(COLLAB_META, CollabState { version, unconfirmed });
	Ok(tr)
}
