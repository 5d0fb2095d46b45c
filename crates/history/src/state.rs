//! The history state and how transactions update it.

use std::sync::Arc;

use quire_state::meta::{ADD_TO_HISTORY, APPENDED_TRANSACTION, COMPOSITION, REBASED};
use quire_state::{EditorState, Transaction};
use quire_transform::{Bias, Mappable, Mapping, StepMap, Transform};
use tracing::trace;

use crate::branch::Branch;
use crate::config::HistoryConfig;
use crate::error::Result;


/// Meta key set on undo and redo transactions; holds a [`HistoryMeta`].
pub const HISTORY_META: &str = "history$";

/// Meta key (`bool`) that keeps the next change out of the current event.
pub const CLOSE_HISTORY: &str = "closeHistory$";

/// Attached to undo and redo transactions: the history state they lead to.
#[derive(Debug, Clone)]
pub struct HistoryMeta {
	/// Whether the transaction is a redo.
	pub redo: bool,
	/// The history after the transaction.
	pub state: HistoryState,
}

/// The undo and redo branches plus what is needed to decide whether the
/// next change joins the current event.
#[derive(Debug, Clone, Default)]
pub struct HistoryState {
	done: Branch,
	undone: Branch,
	prev_ranges: Option<Vec<(usize, usize)>>,
	prev_time: u64,
	prev_composition: Option<u64>,
	preserve_items: bool,
}

impl HistoryState {
	/// An empty history.
	pub fn new() -> Self {
		Self::default()
	}

	/// Keeps one history item per step instead of merging them. Required
	/// while collaborative editing rebases local steps, and must be
	/// updated whenever that changes.
	pub fn with_preserve_items(mut self, preserve_items: bool) -> Self {
		self.preserve_items = preserve_items;
		self
	}

	pub fn preserve_items(&self) -> bool {
		self.preserve_items
	}

	/// The undo branch.
	pub fn done(&self) -> &Branch {
		&self.done
	}

	/// The redo branch.
	pub fn undone(&self) -> &Branch {
		&self.undone
	}

	/// A history with the given branches and no pending event.
	pub(crate) fn from_branches(done: Branch, undone: Branch, preserve_items: bool) -> Self {
		Self { done, undone, preserve_items, ..Self::default() }
	}

	fn with_branches(&self, done: Branch, undone: Branch, prev_ranges: Option<Vec<(usize, usize)>>) -> Self {
		Self { done, undone, prev_ranges, ..self.clone() }
	}

	/// The history after `tr` was applied to `state`.
	pub fn apply(&self, tr: &Transaction, state: &EditorState, config: &HistoryConfig) -> Result<HistoryState> {
		if let Some(meta) = tr.get_meta::<HistoryMeta>(HISTORY_META) {
			return Ok(meta.state.clone());
		}

		let mut history = self.clone();
		if tr.get_meta::<bool>(CLOSE_HISTORY).copied().unwrap_or(false) {
			history.prev_ranges = None;
			history.prev_time = 0;
			history.prev_composition = None;
		}

		if tr.steps().is_empty() {
			return Ok(history);
		}

		let maps = tr.mapping().maps();
		let appended = tr.get_meta::<Arc<Transaction>>(APPENDED_TRANSACTION);
		let preserve = history.preserve_items;

		if let Some(root) = appended.and_then(|a| a.get_meta::<HistoryMeta>(HISTORY_META)) {
			return Ok(if root.redo {
				let done = history.done.add_transform(tr, None, config, preserve)?;
				history.with_branches(done, history.undone.clone(), Some(ranges_for(maps)))
			} else {
				let undone = history.undone.add_transform(tr, None, config, preserve)?;
				history.with_branches(history.done.clone(), undone, None)
			});
		}

		let untracked = tr.get_meta::<bool>(ADD_TO_HISTORY) == Some(&false)
			|| appended.is_some_and(|a| a.get_meta::<bool>(ADD_TO_HISTORY) == Some(&false));

		if !untracked {
			let composition = tr.get_meta::<u64>(COMPOSITION).copied();
			let same_composition = composition.is_some() && composition == history.prev_composition;
			let new_group = history.prev_time == 0
				|| (appended.is_none()
					&& !same_composition
					&& (history.prev_time + config.new_group_delay < tr.time()
						|| !is_adjacent_to(tr, history.prev_ranges.as_deref())));
			let prev_ranges =
				if appended.is_some() { map_ranges(history.prev_ranges.as_deref(), tr.mapping()) } else { Some(ranges_for(maps)) };
			if new_group {
				trace!(time = tr.time(), "starting history event");
			}
			let selection = new_group.then(|| state.selection().bookmark());
			let done = history.done.add_transform(tr, selection, config, preserve)?;
			return Ok(HistoryState {
				done,
				undone: Branch::empty(),
				prev_ranges,
				prev_time: tr.time(),
				prev_composition: composition.or(history.prev_composition),
				preserve_items: preserve,
			});
		}

		let prev_ranges = map_ranges(history.prev_ranges.as_deref(), tr.mapping());
		if let Some(&rebased) = tr.get_meta::<usize>(REBASED)
			&& rebased > 0
		{
			trace!(rebased, "rebasing history branches");
			let done = history.done.rebased(tr, rebased)?;
			let undone = history.undone.rebased(tr, rebased)?;
			return Ok(history.with_branches(done, undone, prev_ranges));
		}

		let done = history.done.add_maps(maps);
		let undone = history.undone.add_maps(maps);
		Ok(history.with_branches(done, undone, prev_ranges))
	}
}

/// Whether the first step of `transform` touches one of the ranges
/// changed by the previous tracked transaction.
fn is_adjacent_to(transform: &Transform, prev_ranges: Option<&[(usize, usize)]>) -> bool {
	let Some(prev_ranges) = prev_ranges else {
		return false;
	};
	let Some(first) = transform.mapping().maps().first() else {
		return true;
	};
	let mut adjacent = false;
	first.for_each(|start, end, _, _| {
		adjacent |= prev_ranges.iter().any(|&(from, to)| start <= to && end >= from);
	});
	adjacent
}

/// The ranges changed by the last map that changed anything, in the
/// coordinates after it.
fn ranges_for(maps: &[StepMap]) -> Vec<(usize, usize)> {
	let mut result = Vec::new();
	for map in maps.iter().rev() {
		map.for_each(|_, _, from, to| result.push((from, to)));
		if !result.is_empty() {
			break;
		}
	}
	result
}

fn map_ranges(ranges: Option<&[(usize, usize)]>, mapping: &Mapping) -> Option<Vec<(usize, usize)>> {
	let ranges = ranges?;
	Some(
		ranges
			.iter()
			.filter_map(|&(from, to)| {
				let from = mapping.map(from, Bias::Right);
				let to = mapping.map(to, Bias::Left);
				(from <= to).then_some((from, to))
			})
			.collect(),
	)
}
