use smallvec::SmallVec;

use crate::error::{ModelError, Result};
use crate::{Mark, Node};

#[derive(Clone)]
struct PathEntry {
	node: Node,
	index: usize,
	offset: usize,
}

/// A position resolved against a document: the chain of ancestors that
/// contain it, the child index at every level and the offsets involved.
///
/// Depth `0` is the document itself; [`ResolvedPos::depth`] is the depth
/// of the innermost ancestor (the parent).
#[derive(Clone)]
pub struct ResolvedPos {
	pos: usize,
	path: SmallVec<[PathEntry; 8]>,
	parent_offset: usize,
}

impl ResolvedPos {
	pub(crate) fn resolve(doc: &Node, pos: usize) -> Result<ResolvedPos> {
		if pos > doc.content().size() {
			return Err(ModelError::PositionOutOfRange(pos));
		}
		let mut path = SmallVec::new();
		let mut start = 0;
		let mut parent_offset = pos;
		let mut node = doc.clone();
		loop {
			let info = node.content().find_index(parent_offset, -1)?;
			let rem = parent_offset - info.offset;
			path.push(PathEntry { node: node.clone(), index: info.index, offset: start + info.offset });
			if rem == 0 {
				break;
			}
			let child = node.child(info.index).clone();
			if child.is_text() {
				break;
			}
			parent_offset = rem - 1;
			start += info.offset + 1;
			node = child;
		}
		Ok(ResolvedPos { pos, path, parent_offset })
	}

	/// The position itself.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Depth of the parent node.
	pub fn depth(&self) -> usize {
		self.path.len() - 1
	}

	/// Offset into the parent node's content.
	pub fn parent_offset(&self) -> usize {
		self.parent_offset
	}

	/// The innermost ancestor.
	pub fn parent(&self) -> &Node {
		self.node(self.depth())
	}

	/// The root document.
	pub fn doc(&self) -> &Node {
		self.node(0)
	}

	/// The ancestor at `depth`.
	pub fn node(&self, depth: usize) -> &Node {
		&self.path[depth].node
	}

	/// Index of the child at this position in the ancestor at `depth`.
	pub fn index(&self, depth: usize) -> usize {
		self.path[depth].index
	}

	/// Index pointing after this position in the ancestor at `depth`.
	pub fn index_after(&self, depth: usize) -> usize {
		self.index(depth) + if depth == self.depth() && self.text_offset() == 0 { 0 } else { 1 }
	}

	/// Start of the content of the ancestor at `depth`.
	pub fn start(&self, depth: usize) -> usize {
		if depth == 0 { 0 } else { self.path[depth - 1].offset + 1 }
	}

	/// End of the content of the ancestor at `depth`.
	pub fn end(&self, depth: usize) -> usize {
		self.start(depth) + self.node(depth).content().size()
	}

	/// Position directly before the ancestor at `depth`. Depth `depth() + 1`
	/// refers to the position itself.
	pub fn before(&self, depth: usize) -> Result<usize> {
		if depth == 0 {
			return Err(ModelError::Range("There is no position before the top-level node".to_string()));
		}
		Ok(if depth == self.depth() + 1 { self.pos } else { self.path[depth - 1].offset })
	}

	/// Position directly after the ancestor at `depth`.
	pub fn after(&self, depth: usize) -> Result<usize> {
		if depth == 0 {
			return Err(ModelError::Range("There is no position after the top-level node".to_string()));
		}
		Ok(if depth == self.depth() + 1 {
			self.pos
		} else {
			self.path[depth - 1].offset + self.path[depth].node.node_size()
		})
	}

	/// Offset into the text node at this position, or zero between nodes.
	pub fn text_offset(&self) -> usize {
		self.pos - self.path[self.path.len() - 1].offset
	}

	/// The node directly after the position, cut when inside text.
	pub fn node_after(&self) -> Option<Node> {
		let parent = self.parent();
		let index = self.index(self.depth());
		if index == parent.child_count() {
			return None;
		}
		let d_off = self.text_offset();
		let child = parent.child(index);
		Some(if d_off > 0 { child.cut(d_off, child.node_size()) } else { child.clone() })
	}

	/// The node directly before the position, cut when inside text.
	pub fn node_before(&self) -> Option<Node> {
		let index = self.index(self.depth());
		let d_off = self.text_offset();
		if d_off > 0 {
			return Some(self.parent().child(index).cut(0, d_off));
		}
		if index == 0 { None } else { Some(self.parent().child(index - 1).clone()) }
	}

	/// Position of the child at `index` in the ancestor at `depth`.
	pub fn pos_at_index(&self, index: usize, depth: usize) -> usize {
		let node = &self.path[depth].node;
		let mut pos = self.start(depth);
		for i in 0..index {
			pos += node.child(i).node_size();
		}
		pos
	}

	/// Marks that apply to content inserted at this position.
	pub fn marks(&self) -> Vec<Mark> {
		let parent = self.parent();
		let index = self.index(self.depth());
		if parent.content().size() == 0 {
			return Vec::new();
		}
		if self.text_offset() > 0 {
			return parent.child(index).marks().to_vec();
		}
		let mut main = if index > 0 { parent.maybe_child(index - 1) } else { None };
		let mut other = parent.maybe_child(index);
		if main.is_none() {
			std::mem::swap(&mut main, &mut other);
		}
		let Some(main) = main else {
			return Vec::new();
		};
		main.marks()
			.iter()
			.filter(|mark| mark.mark_type().is_inclusive() || other.is_some_and(|o| mark.is_in_set(o.marks())))
			.cloned()
			.collect()
	}

	/// Marks that should continue across a deletion ending at `end`.
	pub fn marks_across(&self, end: &ResolvedPos) -> Option<Vec<Mark>> {
		let after = self.parent().maybe_child(self.index(self.depth()))?;
		if !after.is_inline() {
			return None;
		}
		let next = end.parent().maybe_child(end.index(end.depth()));
		Some(
			after
				.marks()
				.iter()
				.filter(|mark| mark.mark_type().is_inclusive() || next.is_some_and(|n| mark.is_in_set(n.marks())))
				.cloned()
				.collect(),
		)
	}

	/// Deepest depth whose node contains both this position and `pos`.
	pub fn shared_depth(&self, pos: usize) -> usize {
		for depth in (1..=self.depth()).rev() {
			if self.start(depth) <= pos && self.end(depth) >= pos {
				return depth;
			}
		}
		0
	}

	/// The block range around this position and `other`, optionally
	/// constrained by a predicate on the parent node.
	pub fn block_range(&self, other: &ResolvedPos, pred: Option<&dyn Fn(&Node) -> bool>) -> Option<NodeRange> {
		if other.pos < self.pos {
			return other.block_range(self, pred);
		}
		let skip = if self.parent().inline_content() || self.pos == other.pos { 1 } else { 0 };
		let top = self.depth() as isize - skip;
		let mut d = top;
		while d >= 0 {
			let depth = d as usize;
			if other.pos <= self.end(depth) && pred.is_none_or(|p| p(self.node(depth))) {
				return Some(NodeRange::new(self.clone(), other.clone(), depth));
			}
			d -= 1;
		}
		None
	}

	/// Whether both positions share a parent node.
	pub fn same_parent(&self, other: &ResolvedPos) -> bool {
		self.pos - self.parent_offset == other.pos - other.parent_offset
	}
}

impl std::fmt::Debug for ResolvedPos {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut s = String::new();
		for i in 1..=self.depth() {
			if !s.is_empty() {
				s.push('/');
			}
			s.push_str(&format!("{}_{}", self.node(i).node_type().name(), self.index(i - 1)));
		}
		write!(f, "{s}:{}", self.parent_offset)
	}
}

/// A flat range of siblings inside a common parent at `depth`.
#[derive(Clone, Debug)]
pub struct NodeRange {
	from: ResolvedPos,
	to: ResolvedPos,
	depth: usize,
}

impl NodeRange {
	/// Creates a range. Both positions must share the ancestor at `depth`.
	pub fn new(from: ResolvedPos, to: ResolvedPos, depth: usize) -> Self {
		Self { from, to, depth }
	}

	/// Resolved start of the range.
	pub fn from(&self) -> &ResolvedPos {
		&self.from
	}

	/// Resolved end of the range.
	pub fn to(&self) -> &ResolvedPos {
		&self.to
	}

	/// Depth of the shared parent.
	pub fn depth(&self) -> usize {
		self.depth
	}

	/// Position at the start of the first covered child.
	pub fn start(&self) -> usize {
		self.from.before(self.depth + 1).unwrap_or(self.from.pos())
	}

	/// Position at the end of the last covered child.
	pub fn end(&self) -> usize {
		self.to.after(self.depth + 1).unwrap_or(self.to.pos())
	}

	/// The shared parent.
	pub fn parent(&self) -> &Node {
		self.from.node(self.depth)
	}

	/// Index of the first covered child.
	pub fn start_index(&self) -> usize {
		self.from.index(self.depth)
	}

	/// Index after the last covered child.
	pub fn end_index(&self) -> usize {
		self.to.index_after(self.depth)
	}
}
