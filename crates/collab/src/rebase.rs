//! Rebasing local steps over remote ones.

use std::sync::Arc;

use quire_transform::{Step, Transform};
use tracing::trace;

use crate::error::Result;

#[cfg(test)]
mod tests;

/// A local step together with what is needed to move it: its inverse, to
/// take it back out of the document, and the transform it came from.
#[derive(Debug, Clone)]
pub struct Rebaseable {
	pub step: Step,
	pub inverted: Step,
	pub origin: Arc<Transform>,
}

impl Rebaseable {
	pub fn new(step: Step, inverted: Step, origin: Arc<Transform>) -> Self {
		Self { step, inverted, origin }
	}
}

/// Undoes `steps`, applies `over`, then redoes each of `steps` mapped
/// through everything that happened since it was first applied. All of
/// it is recorded in `transform`, with each redone step mirroring the
/// step that undid it.
///
/// Returns the local steps that survived, in their rebased form. Steps
/// that map to nothing or no longer apply are dropped.
pub fn rebase_steps(steps: &[Rebaseable], over: &[Step], transform: &mut Transform) -> Result<Vec<Rebaseable>> {
	for rebaseable in steps.iter().rev() {
		transform.step(rebaseable.inverted.clone())?;
	}
	for step in over {
		transform.step(step.clone())?;
	}

	let mut result = Vec::with_capacity(steps.len());
	let mut map_from = steps.len();
	for rebaseable in steps {
		let mapped = rebaseable.step.map(&transform.mapping().slice_from(map_from));
		map_from -= 1;
		let Some(mapped) = mapped else {
			trace!(index = map_from, "local step deleted by remote changes");
			continue;
		};
		if let Err(err) = transform.maybe_step(mapped.clone()) {
			trace!(index = map_from, error = %err, "local step no longer applies");
			continue;
		}
		let last = transform.steps().len() - 1;
		transform.set_mirror(map_from, last);
		let inverted = mapped.invert(&transform.docs()[last])?;
		result.push(Rebaseable::new(mapped, inverted, rebaseable.origin.clone()));
	}
	Ok(result)
}
