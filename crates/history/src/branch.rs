//! One side of the undo history.
//!
//! A branch is a sequence of [`Item`]s. Items that carry a step undo one
//! change; items without a step only record how positions moved because of
//! changes that are not tracked (remote edits, `addToHistory = false`
//! transactions), so that the tracked steps before them can be mapped
//! forward when they are replayed.
//!
//! An event is a run of items that ends, counting from the oldest, at an
//! item carrying a selection bookmark. Undoing pops exactly one event.

use std::ops::ControlFlow;

use quire_state::{EditorState, SelectionBookmark, Transaction};
use quire_transform::{Mapping, Step, StepMap, Transform};
use tracing::{debug, trace};

use crate::config::HistoryConfig;
use crate::error::Result;
use crate::rope::RopeSequence;


/// Extra events allowed beyond the configured depth before the oldest are
/// cut off, so trimming happens in batches.
pub const DEPTH_OVERFLOW: usize = 20;

/// Step-less items tolerated before a rebase compresses the branch.
pub const MAX_EMPTY_ITEMS: usize = 500;

/// One recorded change.
#[derive(Debug, Clone)]
pub struct Item {
	/// The forward map of the change.
	pub map: StepMap,
	/// The inverted step, absent for changes that cannot be undone here.
	pub step: Option<Step>,
	/// The selection before the event this item starts.
	pub selection: Option<SelectionBookmark>,
	/// Distance back to the item whose map this one mirrors.
	pub mirror_offset: Option<usize>,
}

impl Item {
	pub fn new(map: StepMap, step: Option<Step>, selection: Option<SelectionBookmark>) -> Self {
		Self { map, step, selection, mirror_offset: None }
	}

	/// An item that only records a position map.
	pub fn map_only(map: StepMap) -> Self {
		Self::new(map, None, None)
	}

	/// Combines this item with the newer `other` when their steps merge
	/// and `other` does not start an event.
	pub fn merge(&self, other: &Item) -> Option<Item> {
		let (Some(step), Some(other_step)) = (&self.step, &other.step) else {
			return None;
		};
		if other.selection.is_some() {
			return None;
		}
		let merged = other_step.merge(step)?;
		Some(Item::new(merged.get_map().invert(), Some(merged), self.selection))
	}
}

/// The result of popping an event off a branch.
#[derive(Debug)]
pub struct PoppedEvent {
	/// The branch without the event.
	pub remaining: Branch,
	/// A transaction replaying the event's inverted steps.
	pub transaction: Transaction,
	/// The selection to restore, in the transaction's final document.
	pub selection: SelectionBookmark,
}

/// A persistent stack of history items.
#[derive(Debug, Clone, Default)]
pub struct Branch {
	items: RopeSequence<Item>,
	event_count: usize,
}

impl Branch {
	/// The empty branch.
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn items(&self) -> &RopeSequence<Item> {
		&self.items
	}

	/// Number of complete events on the branch.
	pub fn event_count(&self) -> usize {
		self.event_count
	}

	/// Pops the most recent event and builds a transaction on `state` that
	/// undoes it. With `preserve_items`, the steps are mapped through the
	/// untracked changes since they were recorded and the popped items are
	/// replaced by map-only items, so that later rebases still line up.
	pub fn pop_event(&self, state: &EditorState, preserve_items: bool) -> Result<Option<PoppedEvent>> {
		if self.event_count == 0 {
			return Ok(None);
		}
		let len = self.items.len();
		let mut end = len;
		loop {
			let Some(item) = end.checked_sub(1).and_then(|i| self.items.get(i)) else {
				return Ok(None);
			};
			end -= 1;
			if item.selection.is_some() {
				break;
			}
		}

		let (mut remap, mut map_from) = if preserve_items {
			let remap = self.remapping(end, len);
			let map_from = remap.maps().len();
			(Some(remap), map_from)
		} else {
			(None, 0)
		};

		let mut transaction = state.tr();
		let mut add_before: Vec<Item> = Vec::new();
		let mut add_after: Vec<Item> = Vec::new();

		let flow = self.items.for_each_reverse(end, len, |item, i| {
			let Some(step) = &item.step else {
				if remap.is_none() {
					let fresh = self.remapping(end, i + 1);
					map_from = fresh.maps().len();
					remap = Some(fresh);
				}
				map_from -= 1;
				add_before.push(item.clone());
				return ControlFlow::Continue(());
			};

			match remap.as_mut() {
				Some(remap) => {
					add_before.push(Item::map_only(item.map.clone()));
					let mut applied = None;
					if let Some(mapped) = step.map(&remap.slice_from(map_from))
						&& transaction.maybe_step(mapped).is_ok()
					{
						let map = transaction.mapping().maps().last().cloned().unwrap_or_default();
						let mut after = Item::map_only(map.clone());
						after.mirror_offset = Some(add_after.len() + add_before.len());
						add_after.push(after);
						applied = Some(map);
					}
					map_from -= 1;
					if let Some(map) = applied {
						remap.append_map(map, Some(map_from));
					}
				}
				None => {
					if let Err(err) = transaction.maybe_step(step.clone()) {
						trace!(error = %err, "skipping history step that no longer applies");
					}
				}
			}

			match item.selection {
				Some(selection) => {
					let selection = match &remap {
						Some(remap) => selection.map(&remap.slice_from(map_from)),
						None => selection,
					};
					ControlFlow::Break(selection)
				}
				None => ControlFlow::Continue(()),
			}
		});

		let ControlFlow::Break(selection) = flow else {
			return Ok(None);
		};
		add_before.reverse();
		add_before.append(&mut add_after);
		let remaining =
			Branch { items: self.items.slice(0, end).append_vec(add_before), event_count: self.event_count - 1 };
		Ok(Some(PoppedEvent { remaining, transaction, selection }))
	}

	/// Records the steps of `transform` as inverted items. A `selection`
	/// starts a new event; without one the steps join the current event.
	pub fn add_transform(
		&self,
		transform: &Transform,
		selection: Option<SelectionBookmark>,
		config: &HistoryConfig,
		preserve_items: bool,
	) -> Result<Branch> {
		let mut new_items: Vec<Item> = Vec::with_capacity(transform.steps().len());
		let mut event_count = self.event_count;
		let mut old_items = self.items.clone();
		let mut last_item =
			if preserve_items { None } else { old_items.len().checked_sub(1).and_then(|i| old_items.get(i)).cloned() };
		let mut selection = selection;

		for (i, (step, doc)) in transform.steps().iter().zip(transform.docs()).enumerate() {
			let inverted = step.invert(doc)?;
			let mut item = Item::new(transform.mapping().maps()[i].clone(), Some(inverted), selection);
			if let Some(merged) = last_item.as_ref().and_then(|last| last.merge(&item)) {
				item = merged;
				if new_items.pop().is_none() {
					old_items = old_items.slice(0, old_items.len() - 1);
				}
			}
			new_items.push(item);
			if selection.take().is_some() {
				event_count += 1;
			}
			if !preserve_items {
				last_item = new_items.last().cloned();
			}
		}

		let overflow = event_count.saturating_sub(config.depth);
		if overflow > DEPTH_OVERFLOW {
			debug!(overflow, depth = config.depth, "cutting off old history events");
			old_items = cut_off_events(&old_items, overflow);
			event_count -= overflow;
		}
		Ok(Branch { items: old_items.append_vec(new_items), event_count })
	}

	/// A mapping through the maps of items `from..to`, with mirror pairs
	/// restored from the items' mirror offsets.
	pub fn remapping(&self, from: usize, to: usize) -> Mapping {
		let mut maps = Mapping::new();
		self.items.visit(from, to, |item, i| {
			let mirror = item
				.mirror_offset
				.filter(|&offset| i >= from + offset)
				.map(|offset| maps.maps().len() - offset);
			maps.append_map(item.map.clone(), mirror);
		});
		maps
	}

	/// Records untracked changes as map-only items.
	pub fn add_maps(&self, maps: &[StepMap]) -> Branch {
		if self.event_count == 0 {
			return self.clone();
		}
		let items = maps.iter().cloned().map(Item::map_only).collect();
		Branch { items: self.items.append_vec(items), event_count: self.event_count }
	}

	/// Rewrites the last `rebased_count` items after those changes were
	/// undone, had remote steps applied under them, and were redone, all in
	/// `rebased`. Items whose step could not be redone are dropped.
	pub fn rebased(&self, rebased: &Transform, rebased_count: usize) -> Result<Branch> {
		if self.event_count == 0 {
			return Ok(self.clone());
		}
		let start = self.items.len().saturating_sub(rebased_count);
		let mapping = rebased.mapping();
		let mut new_until = rebased.steps().len();
		let mut event_count = self.event_count;
		self.items.visit(start, self.items.len(), |item, _| {
			if item.selection.is_some() {
				event_count -= 1;
			}
		});

		let mut rebased_items = Vec::new();
		let mut i_rebased = rebased_count;
		for i in start..self.items.len() {
			let Some(item) = self.items.get(i) else { break };
			i_rebased = i_rebased.saturating_sub(1);
			let Some(pos) = mapping.get_mirror(i_rebased) else {
				trace!(index = i, "dropping history item whose step did not survive the rebase");
				continue;
			};
			new_until = new_until.min(pos);
			let map = mapping.maps()[pos].clone();
			if item.step.is_some() {
				let step = rebased.steps()[pos].invert(&rebased.docs()[pos])?;
				let selection = item.selection.map(|s| s.map(&mapping.slice(i_rebased + 1, pos)));
				if selection.is_some() {
					event_count += 1;
				}
				rebased_items.push(Item::new(map, Some(step), selection));
			} else {
				rebased_items.push(Item::map_only(map));
			}
		}

		let new_maps = (rebased_count..new_until).map(|i| Item::map_only(mapping.maps()[i].clone())).collect();
		let rebased_len = rebased_items.len();
		let items = self.items.slice(0, start).append_vec(new_maps).append_vec(rebased_items);
		let branch = Branch { items, event_count };
		if branch.empty_item_count() > MAX_EMPTY_ITEMS {
			return branch.compress(self.items.len() - rebased_len);
		}
		Ok(branch)
	}

	/// Number of map-only items.
	pub fn empty_item_count(&self) -> usize {
		let mut count = 0;
		self.items.visit(0, self.items.len(), |item, _| {
			if item.step.is_none() {
				count += 1;
			}
		});
		count
	}

	/// Folds the map-only items below `upto` into the steps around them,
	/// mapping every step forward and merging neighbours where possible.
	/// Items from `upto` on are kept as they are.
	pub fn compress(&self, upto: usize) -> Result<Branch> {
		let mut remap = self.remapping(0, upto);
		let mut map_from = remap.maps().len();
		let mut items: Vec<Item> = Vec::new();
		let mut events = 0;
		let before = self.items.len();

		self.items.visit_reverse(0, self.items.len(), |item, i| {
			if i >= upto {
				items.push(item.clone());
				if item.selection.is_some() {
					events += 1;
				}
				return;
			}
			let Some(step) = &item.step else {
				map_from -= 1;
				return;
			};
			let mapped = step.map(&remap.slice_from(map_from));
			let map = mapped.as_ref().map(Step::get_map);
			map_from -= 1;
			if let Some(map) = &map {
				remap.append_map(map.clone(), Some(map_from));
			}
			if let (Some(step), Some(map)) = (mapped, map) {
				let selection = item.selection.map(|s| s.map(&remap.slice_from(map_from)));
				if selection.is_some() {
					events += 1;
				}
				let new_item = Item::new(map.invert(), Some(step), selection);
				match items.last().and_then(|last| last.merge(&new_item)) {
					Some(merged) => {
						if let Some(last) = items.last_mut() {
							*last = merged;
						}
					}
					None => items.push(new_item),
				}
			}
		});

		items.reverse();
		debug!(before, after = items.len(), events, "compressed history branch");
		Ok(Branch { items: RopeSequence::from_vec(items), event_count: events })
	}
}

/// Drops the `n` oldest events.
fn cut_off_events(items: &RopeSequence<Item>, n: usize) -> RopeSequence<Item> {
	let mut remaining = n;
	let cut_point = items.for_each(0, items.len(), |item, i| {
		if item.selection.is_some() {
			if remaining == 0 {
				return ControlFlow::Break(i);
			}
			remaining -= 1;
		}
		ControlFlow::Continue(())
	});
	match cut_point {
		ControlFlow::Break(i) => items.slice_from(i),
		ControlFlow::Continue(()) => items.clone(),
	}
}
