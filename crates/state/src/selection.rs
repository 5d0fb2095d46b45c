//! Selections over a document.
//!
//! A selection is stored as plain positions so it can be compared, mapped
//! and serialized without holding on to a document. The functions that
//! need a document take it as an argument and resolve positions on demand.

use quire_model::{Node, ResolvedPos, Slice};
use quire_transform::{Bias, Mappable};

use crate::error::{Result, StateError};

#[cfg(test)]
mod tests;

/// The selected part of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selection {
	/// A cursor (`anchor == head`) or a range whose ends sit in inline
	/// content.
	Text {
		/// The fixed end.
		anchor: usize,
		/// The end that moves when the selection is extended.
		head: usize,
	},
	/// A single selected node spanning `from..to`.
	Node {
		/// Position before the node.
		from: usize,
		/// Position after the node.
		to: usize,
	},
	/// The whole document, whose content has the given size.
	All {
		/// Content size of the document.
		size: usize,
	},
}

impl Selection {
	/// A text selection between two positions of `doc`.
	pub fn text(doc: &Node, anchor: usize, head: usize) -> Result<Self> {
		doc.resolve(anchor)?;
		doc.resolve(head)?;
		Ok(Self::Text { anchor, head })
	}

	/// A cursor at `pos`.
	pub fn cursor(doc: &Node, pos: usize) -> Result<Self> {
		Self::text(doc, pos, pos)
	}

	/// Selects the node directly after `pos`.
	pub fn node(doc: &Node, pos: usize) -> Result<Self> {
		let node = doc
			.node_at(pos)
			.ok_or_else(|| StateError::Selection(format!("No node after position {pos}")))?;
		Ok(Self::Node { from: pos, to: pos + node.node_size() })
	}

	/// Selects the whole document.
	pub fn all(doc: &Node) -> Self {
		Self::All { size: doc.content().size() }
	}

	pub fn anchor(&self) -> usize {
		match *self {
			Self::Text { anchor, .. } => anchor,
			Self::Node { from, .. } => from,
			Self::All { .. } => 0,
		}
	}

	pub fn head(&self) -> usize {
		match *self {
			Self::Text { head, .. } => head,
			Self::Node { to, .. } => to,
			Self::All { size } => size,
		}
	}

	/// The lower bound.
	pub fn from(&self) -> usize {
		self.anchor().min(self.head())
	}

	/// The upper bound.
	pub fn to(&self) -> usize {
		self.anchor().max(self.head())
	}

	pub fn empty(&self) -> bool {
		self.from() == self.to()
	}

	/// The position of a cursor selection.
	pub fn cursor_pos(&self) -> Option<usize> {
		match *self {
			Self::Text { anchor, head } if anchor == head => Some(head),
			_ => None,
		}
	}

	/// The selected content.
	pub fn content(&self, doc: &Node) -> Result<Slice> {
		Ok(doc.slice(self.from(), self.to(), true)?)
	}

	/// Maps the selection through a change that produced `doc`.
	pub fn map(&self, doc: &Node, mapping: &dyn Mappable) -> Result<Self> {
		match *self {
			Self::Text { anchor, head } => {
				let rhead = doc.resolve(mapping.map(head, Bias::Right))?;
				if !rhead.parent().inline_content() {
					return Self::near(&rhead, Bias::Right);
				}
				let ranchor = doc.resolve(mapping.map(anchor, Bias::Right))?;
				let anchor = if ranchor.parent().inline_content() { ranchor.pos() } else { rhead.pos() };
				Ok(Self::Text { anchor, head: rhead.pos() })
			}
			Self::Node { from, .. } => {
				let result = mapping.map_result(from, Bias::Right);
				let rpos = doc.resolve(result.pos)?;
				match rpos.node_after() {
					Some(node) if !result.deleted() => Ok(Self::Node { from: result.pos, to: result.pos + node.node_size() }),
					_ => Self::near(&rpos, Bias::Right),
				}
			}
			Self::All { .. } => Ok(Self::all(doc)),
		}
	}

	/// A position-only form of this selection that can be mapped without a
	/// document and resolved again later.
	pub fn bookmark(&self) -> SelectionBookmark {
		match *self {
			Self::Text { anchor, head } => SelectionBookmark::Text { anchor, head },
			Self::Node { from, .. } => SelectionBookmark::Node { pos: from },
			Self::All { .. } => SelectionBookmark::All,
		}
	}

	/// A text selection between two resolved positions, moving ends that
	/// are not in inline content to the nearest place that is.
	pub fn between(anchor: &ResolvedPos, head: &ResolvedPos, bias: Option<Bias>) -> Result<Self> {
		let d_pos = anchor.pos() as isize - head.pos() as isize;
		let bias = match bias {
			Some(bias) if d_pos == 0 => bias,
			_ if d_pos >= 0 => Bias::Right,
			_ => Bias::Left,
		};
		let mut head_pos = head.pos();
		if !head.parent().inline_content() {
			let found = match Self::find_from(head, bias, true)? {
				Some(found) => Some(found),
				None => Self::find_from(head, bias.flip(), true)?,
			};
			match found {
				Some(found) => head_pos = found.head(),
				None => return Self::near(head, bias),
			}
		}
		let mut anchor_pos = anchor.pos();
		if !anchor.parent().inline_content() {
			if d_pos == 0 {
				anchor_pos = head_pos;
			} else {
				let found = match Self::find_from(anchor, bias.flip(), true)? {
					Some(found) => Some(found),
					None => Self::find_from(anchor, bias, true)?,
				};
				anchor_pos = found.map_or(head_pos, |f| f.anchor());
				if (anchor_pos < head_pos) != (d_pos < 0) {
					anchor_pos = head_pos;
				}
			}
		}
		Ok(Self::Text { anchor: anchor_pos, head: head_pos })
	}

	/// The closest valid selection to `rpos`, searching in `bias`
	/// direction first. Falls back to selecting the whole document.
	pub fn near(rpos: &ResolvedPos, bias: Bias) -> Result<Self> {
		if let Some(found) = Self::find_from(rpos, bias, false)? {
			return Ok(found);
		}
		if let Some(found) = Self::find_from(rpos, bias.flip(), false)? {
			return Ok(found);
		}
		Ok(Self::all(rpos.doc()))
	}

	/// The first valid selection starting at `rpos` and moving in `dir`,
	/// only considering cursors when `text_only` is set.
	pub fn find_from(rpos: &ResolvedPos, dir: Bias, text_only: bool) -> Result<Option<Self>> {
		if rpos.parent().inline_content() {
			return Ok(Some(Self::Text { anchor: rpos.pos(), head: rpos.pos() }));
		}
		let depth = rpos.depth();
		if let Some(found) = find_selection_in(rpos.parent(), rpos.pos(), rpos.index(depth), dir, text_only) {
			return Ok(Some(found));
		}
		for d in (0..depth).rev() {
			let found = match dir {
				Bias::Left => find_selection_in(rpos.node(d), rpos.before(d + 1)?, rpos.index(d), dir, text_only),
				Bias::Right => find_selection_in(rpos.node(d), rpos.after(d + 1)?, rpos.index(d) + 1, dir, text_only),
			};
			if found.is_some() {
				return Ok(found);
			}
		}
		Ok(None)
	}

	/// The first valid selection in the document.
	pub fn at_start(doc: &Node) -> Self {
		find_selection_in(doc, 0, 0, Bias::Right, false).unwrap_or_else(|| Self::all(doc))
	}

	/// The last valid selection in the document.
	pub fn at_end(doc: &Node) -> Self {
		find_selection_in(doc, doc.content().size(), doc.child_count(), Bias::Left, false)
			.unwrap_or_else(|| Self::all(doc))
	}
}

fn is_selectable(node: &Node) -> bool {
	!node.is_text() && node.node_type().is_selectable()
}

/// Searches the children of `node` from the child at `index` (which sits
/// at document position `pos`) for a cursor position or a selectable node,
/// moving in `dir`. Descends into non-atom children.
pub fn find_selection_in(node: &Node, pos: usize, index: usize, dir: Bias, text_only: bool) -> Option<Selection> {
	if node.inline_content() {
		return Some(Selection::Text { anchor: pos, head: pos });
	}
	let mut pos = pos;
	match dir {
		Bias::Right => {
			for i in index..node.child_count() {
				let child = node.child(i);
				if !child.is_atom() {
					if let Some(inner) = find_selection_in(child, pos + 1, 0, dir, text_only) {
						return Some(inner);
					}
				} else if !text_only && is_selectable(child) {
					return Some(Selection::Node { from: pos, to: pos + child.node_size() });
				}
				pos += child.node_size();
			}
		}
		Bias::Left => {
			for i in (0..index).rev() {
				let child = node.child(i);
				if !child.is_atom() {
					if let Some(inner) = find_selection_in(child, pos - 1, child.child_count(), dir, text_only) {
						return Some(inner);
					}
				} else if !text_only && is_selectable(child) {
					return Some(Selection::Node { from: pos - child.node_size(), to: pos });
				}
				pos -= child.node_size();
			}
		}
	}
	None
}

/// A selection reduced to positions, kept in the undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionBookmark {
	/// A text selection.
	Text { anchor: usize, head: usize },
	/// A node selection starting at `pos`.
	Node { pos: usize },
	/// The whole document.
	All,
}

impl SelectionBookmark {
	/// Maps the bookmark through a change. A node bookmark whose node was
	/// deleted becomes a cursor.
	pub fn map(&self, mapping: &dyn Mappable) -> Self {
		match *self {
			Self::Text { anchor, head } => {
				Self::Text { anchor: mapping.map(anchor, Bias::Right), head: mapping.map(head, Bias::Right) }
			}
			Self::Node { pos } => {
				let result = mapping.map_result(pos, Bias::Right);
				if result.deleted() {
					Self::Text { anchor: result.pos, head: result.pos }
				} else {
					Self::Node { pos: result.pos }
				}
			}
			Self::All => Self::All,
		}
	}

	/// Turns the bookmark back into a selection in `doc`.
	pub fn resolve(&self, doc: &Node) -> Result<Selection> {
		match *self {
			Self::Text { anchor, head } => Selection::between(&doc.resolve(anchor)?, &doc.resolve(head)?, None),
			Self::Node { pos } => {
				let rpos = doc.resolve(pos)?;
				match rpos.node_after() {
					Some(node) if is_selectable(&node) => Ok(Selection::Node { from: pos, to: pos + node.node_size() }),
					_ => Selection::near(&rpos, Bias::Right),
				}
			}
			Self::All => Ok(Selection::all(doc)),
		}
	}
}
