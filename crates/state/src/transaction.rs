//! Transactions: a transform that also tracks the selection, stored marks,
//! a timestamp and metadata.

use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use bitflags::bitflags;
use quire_model::{Mark, Node, Slice};
use quire_transform::{Bias, Step, Transform};
use rustc_hash::FxHashMap;
use web_time::{SystemTime, UNIX_EPOCH};

use crate::error::{Result, StateError};
use crate::selection::Selection;
use crate::state::EditorState;

#[cfg(test)]
mod tests;

bitflags! {
	/// Properties of a transaction that were set explicitly.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	struct Updated: u8 {
		const SELECTION = 1 << 0;
		const MARKS = 1 << 1;
		const SCROLL = 1 << 2;
	}
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis() as u64)
}

/// An update to an [`EditorState`].
///
/// Derefs to the underlying [`Transform`], so every document-changing
/// method is available directly. The selection is mapped lazily through
/// the steps added after it was last set, and stored marks are dropped as
/// soon as a step is added.
#[derive(Clone)]
pub struct Transaction {
	transform: Transform,
	time: u64,
	selection: Selection,
	selection_for: usize,
	stored_marks: Option<Vec<Mark>>,
	marks_for: usize,
	updated: Updated,
	meta: FxHashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Transaction {
	/// Starts a transaction on `state`, timestamped now.
	pub fn new(state: &EditorState) -> Self {
		Self {
			transform: Transform::new(state.doc().clone()),
			time: now_millis(),
			selection: *state.selection(),
			selection_for: 0,
			stored_marks: state.stored_marks().map(<[Mark]>::to_vec),
			marks_for: 0,
			updated: Updated::empty(),
			meta: FxHashMap::default(),
		}
	}

	/// The underlying transform.
	pub fn transform(&self) -> &Transform {
		&self.transform
	}

	/// Timestamp in milliseconds.
	pub fn time(&self) -> u64 {
		self.time
	}

	pub fn set_time(&mut self, time: u64) -> &mut Self {
		self.time = time;
		self
	}

	/// The selection, mapped through any steps added since it was set.
	pub fn selection(&self) -> Result<Selection> {
		if self.selection_for < self.steps().len() {
			return self.selection.map(self.doc(), &self.mapping().slice_from(self.selection_for));
		}
		Ok(self.selection)
	}

	/// Replaces the selection. Clears the stored marks.
	pub fn set_selection(&mut self, selection: Selection) -> Result<&mut Self> {
		if selection.to() > self.doc().content().size() {
			return Err(StateError::Selection(
				"Selection passed to setSelection must point at the current document".into(),
			));
		}
		self.selection = selection;
		self.selection_for = self.steps().len();
		self.updated = (self.updated | Updated::SELECTION) - Updated::MARKS;
		self.stored_marks = None;
		Ok(self)
	}

	/// Whether the selection was set explicitly.
	pub fn selection_set(&self) -> bool {
		self.updated.contains(Updated::SELECTION)
	}

	/// Marks to apply to the next typed text. Any step added after they
	/// were set invalidates them.
	pub fn stored_marks(&self) -> Option<&[Mark]> {
		if self.marks_for == self.steps().len() { self.stored_marks.as_deref() } else { None }
	}

	pub fn set_stored_marks(&mut self, marks: Option<Vec<Mark>>) -> &mut Self {
		self.stored_marks = marks;
		self.marks_for = self.steps().len();
		self.updated |= Updated::MARKS;
		self
	}

	/// Whether the stored marks were set explicitly since the last step.
	pub fn stored_marks_set(&self) -> bool {
		self.updated.contains(Updated::MARKS) && self.marks_for == self.steps().len()
	}

	/// Sets the stored marks unless they already match `marks`.
	pub fn ensure_marks(&mut self, marks: Vec<Mark>) -> Result<&mut Self> {
		let current = self.current_marks()?;
		if !Mark::same_set(&current, &marks) {
			self.set_stored_marks(Some(marks));
		}
		Ok(self)
	}

	/// Adds a mark to the stored marks.
	pub fn add_stored_mark(&mut self, mark: &Mark) -> Result<&mut Self> {
		let marks = mark.add_to_set(&self.current_marks()?);
		self.ensure_marks(marks)
	}

	/// Removes a mark from the stored marks.
	pub fn remove_stored_mark(&mut self, mark: &Mark) -> Result<&mut Self> {
		let marks = mark.remove_from_set(&self.current_marks()?);
		self.ensure_marks(marks)
	}

	/// Stored marks, or the marks at the selection head.
	fn current_marks(&self) -> Result<Vec<Mark>> {
		if let Some(marks) = self.stored_marks() {
			return Ok(marks.to_vec());
		}
		Ok(self.doc().resolve(self.selection()?.head())?.marks())
	}

	/// Replaces the selection with a slice and moves the cursor after it.
	pub fn replace_selection(&mut self, slice: Slice) -> Result<&mut Self> {
		let selection = self.selection()?;
		if let Selection::All { size } = selection
			&& slice.size() == 0
		{
			self.delete(0, size)?;
			let start = Selection::at_start(self.doc());
			if start != self.selection()? {
				self.set_selection(start)?;
			}
			return Ok(self);
		}

		let mut last_node = slice.content.last_child().cloned();
		let mut last_parent = None;
		for _ in 0..slice.open_end {
			let child = last_node.as_ref().and_then(|n| n.last_child().cloned());
			last_parent = last_node;
			last_node = child;
		}
		let ends_inline = match (&last_node, &last_parent) {
			(Some(node), _) => node.is_inline(),
			(None, Some(parent)) => parent.is_textblock(),
			(None, None) => false,
		};

		let start = self.steps().len();
		self.replace_range(selection.from(), selection.to(), slice)?;
		self.selection_to_insertion_end(start, if ends_inline { Bias::Left } else { Bias::Right })?;
		Ok(self)
	}

	/// Replaces the selection with a node. With `inherit_marks`, the node
	/// takes the stored marks or the marks at the selection.
	pub fn replace_selection_with(&mut self, node: Node, inherit_marks: bool) -> Result<&mut Self> {
		let selection = self.selection()?;
		let node = if inherit_marks {
			let marks = match self.stored_marks() {
				Some(marks) => marks.to_vec(),
				None => self.marks_of(&selection)?,
			};
			node.mark(marks)
		} else {
			node
		};
		let bias = if node.is_inline() { Bias::Left } else { Bias::Right };
		let start = self.steps().len();
		self.replace_range_with(selection.from(), selection.to(), node)?;
		self.selection_to_insertion_end(start, bias)?;
		Ok(self)
	}

	pub fn delete_selection(&mut self) -> Result<&mut Self> {
		self.replace_selection(Slice::empty())
	}

	/// Inserts text. Without `from`, the text replaces the selection and
	/// inherits its marks. With a range, it replaces that range using the
	/// stored marks or the marks around the range.
	pub fn insert_text(&mut self, text: &str, from: Option<usize>, to: Option<usize>) -> Result<&mut Self> {
		let schema = self.doc().node_type().schema().clone();
		let Some(from) = from else {
			if text.is_empty() {
				return self.delete_selection();
			}
			return self.replace_selection_with(schema.text(text, Vec::new()), true);
		};
		let to = to.unwrap_or(from);
		if text.is_empty() {
			self.delete_range(from, to)?;
			return Ok(self);
		}
		let marks = match self.stored_marks() {
			Some(marks) => marks.to_vec(),
			None => {
				let rfrom = self.doc().resolve(from)?;
				if from == to { rfrom.marks() } else { rfrom.marks_across(&self.doc().resolve(to)?).unwrap_or_default() }
			}
		};
		self.replace_range_with(from, to, schema.text(text, marks))?;
		let selection = self.selection()?;
		if !selection.empty() {
			let near = Selection::near(&self.doc().resolve(selection.to())?, Bias::Right)?;
			self.set_selection(near)?;
		}
		Ok(self)
	}

	fn marks_of(&self, selection: &Selection) -> Result<Vec<Mark>> {
		let rfrom = self.doc().resolve(selection.from())?;
		if selection.empty() {
			return Ok(rfrom.marks());
		}
		Ok(rfrom.marks_across(&self.doc().resolve(selection.to())?).unwrap_or_default())
	}

	/// Puts the selection near the end of what the last step inserted, if
	/// that step was added after `start` and is a replace step.
	fn selection_to_insertion_end(&mut self, start: usize, bias: Bias) -> Result<()> {
		let Some(last) = self.steps().len().checked_sub(1) else {
			return Ok(());
		};
		if last < start || !matches!(self.steps()[last], Step::Replace(_) | Step::ReplaceAround(_)) {
			return Ok(());
		}
		let mut end = None;
		self.mapping().maps()[last].for_each(|_, _, _, new_to| {
			end.get_or_insert(new_to);
		});
		if let Some(end) = end {
			let near = Selection::near(&self.doc().resolve(end)?, bias)?;
			self.set_selection(near)?;
		}
		Ok(())
	}

	/// Attaches a value under `key`.
	pub fn set_meta<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) -> &mut Self {
		self.meta.insert(key.into(), Arc::new(value));
		self
	}

	/// The value under `key`, if present and of type `T`.
	pub fn get_meta<T: Any>(&self, key: &str) -> Option<&T> {
		self.meta.get(key).and_then(|value| (**value).downcast_ref::<T>())
	}

	pub fn has_meta(&self, key: &str) -> bool {
		self.meta.contains_key(key)
	}

	/// True when no metadata is attached.
	pub fn is_generic(&self) -> bool {
		self.meta.is_empty()
	}

	/// Asks the view to scroll the selection into view.
	pub fn scroll_into_view(&mut self) -> &mut Self {
		self.updated |= Updated::SCROLL;
		self
	}

	pub fn scrolled_into_view(&self) -> bool {
		self.updated.contains(Updated::SCROLL)
	}
}

impl Deref for Transaction {
	type Target = Transform;

	fn deref(&self) -> &Transform {
		&self.transform
	}
}

impl DerefMut for Transaction {
	fn deref_mut(&mut self) -> &mut Transform {
		&mut self.transform
	}
}

impl fmt::Debug for Transaction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut keys: Vec<&str> = self.meta.keys().map(String::as_str).collect();
		keys.sort_unstable();
		f.debug_struct("Transaction")
			.field("time", &self.time)
			.field("steps", &self.steps().len())
			.field("selection", &self.selection)
			.field("meta", &keys)
			.finish()
	}
}
