//! Mark-level transforms over ranges and single nodes.

use quire_model::{ContentMatch, Fragment, Mark, MarkType, NodeType, Slice, Whitespace};

use crate::error::{Result, TransformError};
use crate::mark_step::{AddMarkStep, AddNodeMarkStep, RemoveMarkStep, RemoveNodeMarkStep};
use crate::replace_step::ReplaceStep;
use crate::step::Step;
use crate::transform::Transform;


/// Which marks a removal applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkFilter {
	/// Every mark.
	All,
	/// Every mark of this type, whatever its attributes.
	Type(MarkType),
	/// This exact mark.
	Mark(Mark),
}

impl MarkFilter {
	fn select(&self, marks: &[Mark]) -> Vec<Mark> {
		match self {
			Self::All => marks.to_vec(),
			Self::Type(mark_type) => marks.iter().filter(|m| m.mark_type() == mark_type).cloned().collect(),
			Self::Mark(mark) if mark.is_in_set(marks) => vec![mark.clone()],
			Self::Mark(_) => Vec::new(),
		}
	}
}

impl From<Mark> for MarkFilter {
	fn from(mark: Mark) -> Self {
		Self::Mark(mark)
	}
}

impl From<MarkType> for MarkFilter {
	fn from(mark_type: MarkType) -> Self {
		Self::Type(mark_type)
	}
}

/// A pending removal spanning consecutive inline nodes.
struct Matched {
	mark: Mark,
	from: usize,
	to: usize,
	step: usize,
}

impl Transform {
	/// Adds `mark` to the inline content between `from` and `to`, removing
	/// marks it excludes.
	pub fn add_mark(&mut self, from: usize, to: usize, mark: &Mark) -> Result<&mut Self> {
		let mut removed: Vec<RemoveMarkStep> = Vec::new();
		let mut added: Vec<AddMarkStep> = Vec::new();
		self.doc().nodes_between(from, to, &mut |node, pos, parent, _| {
			if !node.is_inline() {
				return true;
			}
			let marks = node.marks();
			let allowed = parent.is_some_and(|p| p.node_type().allows_mark_type(mark.mark_type()));
			if !mark.is_in_set(marks) && allowed {
				let start = pos.max(from);
				let end = (pos + node.node_size()).min(to);
				let new_set = mark.add_to_set(marks);
				for old in marks.iter().filter(|m| !m.is_in_set(&new_set)) {
					match removed.last_mut() {
						Some(last) if last.to == start && last.mark == *old => last.to = end,
						_ => removed.push(RemoveMarkStep::new(start, end, old.clone())),
					}
				}
				match added.last_mut() {
					Some(last) if last.to == start => last.to = end,
					_ => added.push(AddMarkStep::new(start, end, mark.clone())),
				}
			}
			true
		});
		for step in removed {
			self.step(step)?;
		}
		for step in added {
			self.step(step)?;
		}
		Ok(self)
	}

	/// Removes matching marks from the inline content between `from` and
	/// `to`.
	pub fn remove_mark(&mut self, from: usize, to: usize, filter: impl Into<MarkFilter>) -> Result<&mut Self> {
		let filter = filter.into();
		let mut matched: Vec<Matched> = Vec::new();
		let mut step = 0;
		self.doc().nodes_between(from, to, &mut |node, pos, _, _| {
			if !node.is_inline() {
				return true;
			}
			step += 1;
			let end = (pos + node.node_size()).min(to);
			for mark in filter.select(node.marks()) {
				match matched.iter_mut().rfind(|m| m.step + 1 == step && m.mark == mark) {
					Some(found) => {
						found.to = end;
						found.step = step;
					}
					None => matched.push(Matched { mark, from: pos.max(from), to: end, step }),
				}
			}
			true
		});
		for m in matched {
			self.step(RemoveMarkStep::new(m.from, m.to, m.mark))?;
		}
		Ok(self)
	}

	/// Removes the children and marks of the node at `pos` that a node of
	/// `parent_type` would not allow, starting from `content_match` (or the
	/// type's initial match), and fills any missing required content.
	/// With `clear_newlines`, newlines in text become spaces unless the
	/// type preserves whitespace.
	pub fn clear_incompatible(
		&mut self,
		pos: usize,
		parent_type: &NodeType,
		content_match: Option<ContentMatch>,
		clear_newlines: bool,
	) -> Result<&mut Self> {
		let Some(node) = self.doc().node_at(pos) else {
			return Err(TransformError::Range(format!("No node at position {pos}")));
		};
		let mut content_match = content_match.unwrap_or_else(|| parent_type.content_match());
		let mut repl_steps: Vec<ReplaceStep> = Vec::new();
		let mut cur = pos + 1;
		for child in node.content().iter() {
			let end = cur + child.node_size();
			match content_match.match_type(child.node_type()) {
				None => repl_steps.push(ReplaceStep::new(cur, end, Slice::empty(), false)),
				Some(allowed) => {
					content_match = allowed;
					for mark in child.marks() {
						if !parent_type.allows_mark_type(mark.mark_type()) {
							self.step(RemoveMarkStep::new(cur, end, mark.clone()))?;
						}
					}
					if clear_newlines && parent_type.whitespace() != Whitespace::Pre {
						if let Some(text) = child.text() {
							let space = parent_type.schema().text(" ", parent_type.allowed_marks(child.marks()));
							let slice = Slice::closed(Fragment::from_node(space));
							for (at, len) in newlines(text) {
								repl_steps.push(ReplaceStep::new(cur + at, cur + at + len, slice.clone(), false));
							}
						}
					}
				}
			}
			cur = end;
		}
		if !content_match.valid_end() {
			let fill = content_match.fill_before(&Fragment::empty(), true, 0).unwrap_or_default();
			self.replace(cur, cur, Slice::closed(fill))?;
		}
		for step in repl_steps.into_iter().rev() {
			self.step(step)?;
		}
		Ok(self)
	}

	/// Adds a mark to the node at `pos`.
	pub fn add_node_mark(&mut self, pos: usize, mark: Mark) -> Result<&mut Self> {
		self.step(AddNodeMarkStep::new(pos, mark))
	}

	/// Removes matching marks from the node at `pos`.
	pub fn remove_node_mark(&mut self, pos: usize, filter: impl Into<MarkFilter>) -> Result<&mut Self> {
		let Some(node) = self.doc().node_at(pos) else {
			return Err(TransformError::Range(format!("No node at position {pos}")));
		};
		let steps: Vec<Step> = filter
			.into()
			.select(node.marks())
			.into_iter()
			.map(|mark| RemoveNodeMarkStep::new(pos, mark).into())
			.collect();
		for step in steps.into_iter().rev() {
			self.step(step)?;
		}
		Ok(self)
	}
}

/// Character offsets and lengths of the line breaks (`\n`, `\r\n`, `\r`)
/// in `text`.
fn newlines(text: &str) -> Vec<(usize, usize)> {
	let mut found = Vec::new();
	let mut chars = text.chars().enumerate().peekable();
	while let Some((i, c)) = chars.next() {
		match c {
			'\r' if chars.peek().is_some_and(|(_, next)| *next == '\n') => {
				chars.next();
				found.push((i, 2));
			}
			'\r' | '\n' => found.push((i, 1)),
			_ => {}
		}
	}
	found
}
