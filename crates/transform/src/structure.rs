//! Structural edits: lifting, wrapping, splitting, joining and retyping
//! blocks, with the predicates that tell whether they are possible.

use quire_model::{Attrs, Fragment, Mark, Node, NodeRange, NodeType, Slice};

use crate::error::{Result, TransformError};
use crate::map::{Bias, Mappable};
use crate::replace_step::{ReplaceAroundStep, ReplaceStep};
use crate::transform::Transform;

#[cfg(test)]
mod tests;

/// A node type plus the attributes to create it with.
#[derive(Debug, Clone, PartialEq)]
pub struct Wrapper {
	pub node_type: NodeType,
	pub attrs: Option<Attrs>,
}

impl Wrapper {
	pub fn new(node_type: NodeType, attrs: Option<Attrs>) -> Self {
		Self { node_type, attrs }
	}
}

impl From<NodeType> for Wrapper {
	fn from(node_type: NodeType) -> Self {
		Self::new(node_type, None)
	}
}

fn can_cut(node: &Node, start: usize, end: usize) -> bool {
	let empty = Fragment::empty();
	(start == 0 || node.can_replace(start, node.child_count(), &empty, 0, 0))
		&& (end == node.child_count() || node.can_replace(0, end, &empty, 0, 0))
}

/// The depth the content of `range` can be lifted to, if any.
pub fn lift_target(range: &NodeRange) -> Option<usize> {
	let content = range.parent().content().cut_by_index(range.start_index(), range.end_index());
	let mut depth = range.depth();
	loop {
		let node = range.from().node(depth);
		let index = range.from().index(depth);
		let end_index = range.to().index_after(depth);
		if depth < range.depth() && node.can_replace_fragment(index, end_index, &content) {
			return Some(depth);
		}
		if depth == 0 || node.node_type().is_isolating() || !can_cut(node, index, end_index) {
			return None;
		}
		depth -= 1;
	}
}

/// The wrappers needed to wrap `range` in a node of `node_type`: any
/// wrappers required around it, the node itself, then any required inside
/// it.
pub fn find_wrapping(
	range: &NodeRange,
	node_type: &NodeType,
	attrs: Option<Attrs>,
	inner_range: Option<&NodeRange>,
) -> Option<Vec<Wrapper>> {
	let around = find_wrapping_outside(range, node_type)?;
	let inner = find_wrapping_inside(inner_range.unwrap_or(range), node_type)?;
	let mut result: Vec<Wrapper> = around.into_iter().map(Wrapper::from).collect();
	result.push(Wrapper::new(node_type.clone(), attrs));
	result.extend(inner.into_iter().map(Wrapper::from));
	Some(result)
}

fn find_wrapping_outside(range: &NodeRange, node_type: &NodeType) -> Option<Vec<NodeType>> {
	let parent = range.parent();
	let around = parent.content_match_at(range.start_index()).ok()?.find_wrapping(node_type)?;
	let outer = around.first().unwrap_or(node_type);
	parent
		.can_replace_with(range.start_index(), range.end_index(), outer, None)
		.then_some(around)
}

fn find_wrapping_inside(range: &NodeRange, node_type: &NodeType) -> Option<Vec<NodeType>> {
	let parent = range.parent();
	let inner = parent.maybe_child(range.start_index())?;
	let inside = node_type.content_match().find_wrapping(inner.node_type())?;
	let last = inside.last().unwrap_or(node_type);
	let mut inner_match = Some(last.content_match());
	for i in range.start_index()..range.end_index() {
		inner_match = inner_match.and_then(|m| m.match_type(parent.child(i).node_type()));
	}
	inner_match.filter(|m| m.valid_end()).map(|_| inside)
}

fn can_change_type(doc: &Node, pos: usize, node_type: &NodeType) -> bool {
	let Ok(rpos) = doc.resolve(pos) else {
		return false;
	};
	let index = rpos.index(rpos.depth());
	rpos.parent().can_replace_with(index, index + 1, node_type, None)
}

/// Whether splitting at `pos` to the given depth is allowed. `types_after`
/// optionally overrides the type of the nodes created after the split,
/// outermost first.
pub fn can_split(doc: &Node, pos: usize, depth: usize, types_after: &[Option<Wrapper>]) -> bool {
	let Ok(rpos) = doc.resolve(pos) else {
		return false;
	};
	if depth > rpos.depth() {
		return false;
	}
	let base = rpos.depth() - depth;
	let parent = rpos.parent();
	let inner_type = types_after.last().and_then(Option::as_ref).map_or(parent.node_type(), |w| &w.node_type);
	let index = rpos.index(rpos.depth());
	if parent.node_type().is_isolating()
		|| !parent.can_replace(index, parent.child_count(), &Fragment::empty(), 0, 0)
		|| !inner_type.valid_content(&parent.content().cut_by_index(index, parent.child_count()))
	{
		return false;
	}
	let override_at = |i: isize| usize::try_from(i).ok().and_then(|i| types_after.get(i)).and_then(Option::as_ref);
	let mut i = depth as isize - 2;
	for d in (base + 1..rpos.depth()).rev() {
		let node = rpos.node(d);
		let index = rpos.index(d);
		if node.node_type().is_isolating() {
			return false;
		}
		let mut rest = node.content().cut_by_index(index, node.child_count());
		if let Some(child) = override_at(i + 1) {
			let Ok(created) = child.node_type.create(child.attrs.as_ref(), Fragment::empty(), Vec::new()) else {
				return false;
			};
			rest = rest.replace_child(0, created);
		}
		let after = override_at(i).map_or(node.node_type(), |w| &w.node_type);
		if !node.can_replace(index + 1, node.child_count(), &Fragment::empty(), 0, 0) || !after.valid_content(&rest) {
			return false;
		}
		i -= 1;
	}
	let index = rpos.index_after(base);
	let base_type = types_after.first().and_then(Option::as_ref).map_or(rpos.node(base + 1).node_type(), |w| &w.node_type);
	rpos.node(base).can_replace_with(index, index, base_type, None)
}

/// Whether `after` can be appended to `before`, joining the two nodes.
pub fn joinable(before: Option<&Node>, after: Option<&Node>) -> bool {
	match (before, after) {
		(Some(a), Some(b)) => !a.is_leaf() && a.can_append(b),
		_ => false,
	}
}

/// Whether the blocks directly before and after `pos` can be joined.
pub fn can_join(doc: &Node, pos: usize) -> bool {
	let Ok(rpos) = doc.resolve(pos) else {
		return false;
	};
	let index = rpos.index(rpos.depth());
	joinable(rpos.node_before().as_ref(), rpos.node_after().as_ref())
		&& rpos.parent().can_replace(index, index + 1, &Fragment::empty(), 0, 0)
}

/// Searches outward from `pos` for a position where two blocks can be
/// joined, looking backward for [`Bias::Left`] and forward otherwise.
pub fn join_point(doc: &Node, pos: usize, dir: Bias) -> Option<usize> {
	let rpos = doc.resolve(pos).ok()?;
	let mut pos = pos;
	let mut d = rpos.depth();
	loop {
		let mut index = rpos.index(d);
		let (before, after) = if d == rpos.depth() {
			(rpos.node_before(), rpos.node_after())
		} else if dir == Bias::Right {
			index += 1;
			(Some(rpos.node(d + 1).clone()), rpos.node(d).maybe_child(index).cloned())
		} else {
			let before = index.checked_sub(1).and_then(|i| rpos.node(d).maybe_child(i)).cloned();
			(before, Some(rpos.node(d + 1).clone()))
		};
		if before.as_ref().is_some_and(|b| !b.is_textblock())
			&& joinable(before.as_ref(), after.as_ref())
			&& rpos.node(d).can_replace(index, index + 1, &Fragment::empty(), 0, 0)
		{
			return Some(pos);
		}
		if d == 0 {
			return None;
		}
		pos = if dir == Bias::Left { rpos.before(d).ok()? } else { rpos.after(d).ok()? };
		d -= 1;
	}
}

/// The closest position to `pos` where a node of `node_type` can be
/// inserted, looking only at the edges of the enclosing blocks.
pub fn insert_point(doc: &Node, pos: usize, node_type: &NodeType) -> quire_model::Result<Option<usize>> {
	let rpos = doc.resolve(pos)?;
	let index = rpos.index(rpos.depth());
	if rpos.parent().can_replace_with(index, index, node_type, None) {
		return Ok(Some(pos));
	}
	if rpos.parent_offset() == 0 {
		for d in (0..rpos.depth()).rev() {
			let index = rpos.index(d);
			if rpos.node(d).can_replace_with(index, index, node_type, None) {
				return rpos.before(d + 1).map(Some);
			}
			if index > 0 {
				return Ok(None);
			}
		}
	}
	if rpos.parent_offset() == rpos.parent().content().size() {
		for d in (0..rpos.depth()).rev() {
			let index = rpos.index_after(d);
			if rpos.node(d).can_replace_with(index, index, node_type, None) {
				return rpos.after(d + 1).map(Some);
			}
			if index < rpos.node(d).child_count() {
				return Ok(None);
			}
		}
	}
	Ok(None)
}

/// Where a slice dropped at `pos` can be inserted, moving out of blocks
/// toward the nearer edge when it does not fit directly.
pub fn drop_point(doc: &Node, pos: usize, slice: &Slice) -> quire_model::Result<Option<usize>> {
	let rpos = doc.resolve(pos)?;
	if slice.content.size() == 0 {
		return Ok(Some(pos));
	}
	let mut content = slice.content.clone();
	for _ in 0..slice.open_start {
		let Some(first) = content.first_child().cloned() else {
			break;
		};
		content = first.content().clone();
	}
	let passes = if slice.open_start == 0 && slice.size() > 0 { 2 } else { 1 };
	for pass in 1..=passes {
		for d in (0..=rpos.depth()).rev() {
			let side = if d == rpos.depth() {
				None
			} else if rpos.pos() * 2 <= rpos.start(d + 1) + rpos.end(d + 1) {
				Some(Bias::Left)
			} else {
				Some(Bias::Right)
			};
			let insert_pos = rpos.index(d) + usize::from(side == Some(Bias::Right));
			let parent = rpos.node(d);
			let fits = if pass == 1 {
				parent.can_replace_fragment(insert_pos, insert_pos, &content)
			} else {
				let wrapping = content.first_child().and_then(|first| {
					parent.content_match_at(insert_pos).ok()?.find_wrapping(first.node_type())
				});
				wrapping
					.and_then(|w| w.first().cloned())
					.is_some_and(|outer| parent.can_replace_with(insert_pos, insert_pos, &outer, None))
			};
			if fits {
				return match side {
					None => Ok(Some(rpos.pos())),
					Some(Bias::Left) => rpos.before(d + 1).map(Some),
					Some(Bias::Right) => rpos.after(d + 1).map(Some),
				};
			}
		}
	}
	Ok(None)
}

impl Transform {
	/// Moves the content of `range` out of its ancestors down to `target`,
	/// splitting ancestors that still hold content before or after it.
	pub fn lift(&mut self, range: &NodeRange, target: usize) -> Result<&mut Self> {
		let (from, to, depth) = (range.from(), range.to(), range.depth());
		let gap_start = from.before(depth + 1)?;
		let gap_end = to.after(depth + 1)?;
		let (mut start, mut end) = (gap_start, gap_end);

		let mut before = Fragment::empty();
		let mut open_start = 0;
		let mut splitting = false;
		for d in (target + 1..=depth).rev() {
			if splitting || from.index(d) > 0 {
				splitting = true;
				before = Fragment::from_node(from.node(d).copy(before));
				open_start += 1;
			} else {
				start -= 1;
			}
		}
		let mut after = Fragment::empty();
		let mut open_end = 0;
		let mut splitting = false;
		for d in (target + 1..=depth).rev() {
			if splitting || to.after(d + 1)? < to.end(d) {
				splitting = true;
				after = Fragment::from_node(to.node(d).copy(after));
				open_end += 1;
			} else {
				end += 1;
			}
		}

		let insert = before.size() - open_start;
		self.step(ReplaceAroundStep::new(
			start,
			end,
			gap_start,
			gap_end,
			Slice::new(before.append(&after), open_start, open_end),
			insert,
			true,
		))
	}

	/// Wraps the content of `range` in the given chain of wrappers,
	/// outermost first.
	pub fn wrap(&mut self, range: &NodeRange, wrappers: &[Wrapper]) -> Result<&mut Self> {
		let mut content = Fragment::empty();
		for wrapper in wrappers.iter().rev() {
			if content.size() > 0 {
				let matched = wrapper.node_type.content_match().match_fragment(&content, 0, content.child_count());
				if !matched.is_some_and(|m| m.valid_end()) {
					return Err(TransformError::range(
						"Wrapper type given to Transform.wrap does not form valid content of its parent wrapper",
					));
				}
			}
			content = Fragment::from_node(wrapper.node_type.create(wrapper.attrs.as_ref(), content, Vec::new())?);
		}
		let (start, end) = (range.start(), range.end());
		self.step(ReplaceAroundStep::new(start, end, start, end, Slice::closed(content), wrappers.len(), true))
	}

	/// Turns every textblock between `from` and `to` into a node of
	/// `node_type`, dropping content and marks the new type does not allow.
	pub fn set_block_type(
		&mut self,
		from: usize,
		to: usize,
		node_type: &NodeType,
		attrs: Option<&Attrs>,
	) -> Result<&mut Self> {
		if !node_type.is_textblock() {
			return Err(TransformError::range("Type given to setBlockType should be a textblock"));
		}
		let map_from = self.steps().len();
		let mut blocks = Vec::new();
		self.doc().nodes_between(from, to, &mut |node, pos, _, _| {
			if node.is_textblock() && !node.has_markup(node_type, attrs, &[]) {
				blocks.push((node.clone(), pos));
				return false;
			}
			true
		});
		for (node, pos) in blocks {
			if !can_change_type(self.doc(), self.mapping().slice_from(map_from).map(pos, Bias::Right), node_type) {
				continue;
			}
			let start = self.mapping().slice_from(map_from).map(pos, Bias::Right);
			self.clear_incompatible(start, node_type, None, true)?;
			let mapping = self.mapping().slice_from(map_from);
			let start = mapping.map(pos, Bias::Right);
			let end = mapping.map(pos + node.node_size(), Bias::Right);
			let replacement = node_type.create(attrs, Fragment::empty(), node.marks().to_vec())?;
			self.step(ReplaceAroundStep::new(
				start,
				end,
				start + 1,
				end - 1,
				Slice::closed(Fragment::from_node(replacement)),
				1,
				true,
			))?;
		}
		Ok(self)
	}

	/// Changes the type, attributes and/or marks of the node at `pos`.
	pub fn set_node_markup(
		&mut self,
		pos: usize,
		node_type: Option<&NodeType>,
		attrs: Option<&Attrs>,
		marks: Option<Vec<Mark>>,
	) -> Result<&mut Self> {
		let Some(node) = self.doc().node_at(pos) else {
			return Err(TransformError::range("No node at given position"));
		};
		let node_type = node_type.unwrap_or(node.node_type()).clone();
		let marks = marks.unwrap_or_else(|| node.marks().to_vec());
		let new_node = node_type.create(attrs, Fragment::empty(), marks)?;
		if node.is_leaf() {
			return self.replace_with(pos, pos + node.node_size(), new_node);
		}
		if !node_type.valid_content(node.content()) {
			return Err(TransformError::Range(format!("Invalid content for node type {}", node_type.name())));
		}
		let end = pos + node.node_size();
		self.step(ReplaceAroundStep::new(
			pos,
			end,
			pos + 1,
			end - 1,
			Slice::closed(Fragment::from_node(new_node)),
			1,
			true,
		))
	}

	/// Splits the node at `pos`, and `depth - 1` of its ancestors.
	/// `types_after` optionally gives the types of the nodes after the
	/// split, outermost first.
	pub fn split(&mut self, pos: usize, depth: usize, types_after: &[Option<Wrapper>]) -> Result<&mut Self> {
		let rpos = self.doc().resolve(pos)?;
		if depth > rpos.depth() {
			return Err(TransformError::Range(format!("Cannot split {depth} levels at position {pos}")));
		}
		let mut before = Fragment::empty();
		let mut after = Fragment::empty();
		for (i, d) in (rpos.depth() - depth + 1..=rpos.depth()).rev().enumerate() {
			let node = rpos.node(d);
			before = Fragment::from_node(node.copy(before));
			let type_after = types_after.get(depth - 1 - i).and_then(Option::as_ref);
			after = Fragment::from_node(match type_after {
				Some(w) => w.node_type.create(w.attrs.as_ref(), after, Vec::new())?,
				None => node.copy(after),
			});
		}
		self.step(ReplaceStep::new(pos, pos, Slice::new(before.append(&after), depth, depth), true))
	}

	/// Joins the blocks around `pos`, removing `depth` levels of node
	/// boundaries.
	pub fn join(&mut self, pos: usize, depth: usize) -> Result<&mut Self> {
		let (Some(from), Some(to)) = (pos.checked_sub(depth), pos.checked_add(depth)) else {
			return Err(TransformError::Range(format!("Cannot join {depth} levels at position {pos}")));
		};
		self.step(ReplaceStep::new(from, to, Slice::empty(), true))
	}
}
