use std::fmt;

use serde_json::Value;

use crate::error::{ModelError, Result};
use crate::{Node, Schema};

/// An ordered run of sibling nodes, with its token size cached.
#[derive(Clone, Default)]
pub struct Fragment {
	content: Vec<Node>,
	size: usize,
}

/// Result of [`Fragment::find_index`]: the child index at a position and
/// the offset at which that child starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexInfo {
	/// Child index.
	pub index: usize,
	/// Start offset of that child.
	pub offset: usize,
}

impl Fragment {
	/// The empty fragment.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Builds a fragment from nodes, joining adjacent text nodes with the
	/// same marks.
	pub fn from_vec(nodes: Vec<Node>) -> Self {
		if nodes.is_empty() {
			return Self::empty();
		}
		let mut joined: Vec<Node> = Vec::with_capacity(nodes.len());
		let mut size = 0;
		for node in nodes {
			size += node.node_size();
			match joined.last_mut() {
				Some(last) if node.is_text() && last.is_text() && last.same_markup(&node) => {
					*last = last.with_text(&format!("{}{}", last.text().unwrap_or_default(), node.text().unwrap_or_default()));
				}
				_ => joined.push(node),
			}
		}
		Self { content: joined, size }
	}

	/// A fragment holding a single node.
	pub fn from_node(node: Node) -> Self {
		let size = node.node_size();
		Self { content: vec![node], size }
	}

	pub(crate) fn from_parts(content: Vec<Node>, size: usize) -> Self {
		Self { content, size }
	}

	/// Total token size.
	pub fn size(&self) -> usize {
		self.size
	}

	/// Number of child nodes.
	pub fn child_count(&self) -> usize {
		self.content.len()
	}

	/// The child at `index`. Panics when out of range.
	pub fn child(&self, index: usize) -> &Node {
		&self.content[index]
	}

	/// The child at `index`, if any.
	pub fn maybe_child(&self, index: usize) -> Option<&Node> {
		self.content.get(index)
	}

	/// First child, if any.
	pub fn first_child(&self) -> Option<&Node> {
		self.content.first()
	}

	/// Last child, if any.
	pub fn last_child(&self) -> Option<&Node> {
		self.content.last()
	}

	/// Iterates over the children.
	pub fn iter(&self) -> std::slice::Iter<'_, Node> {
		self.content.iter()
	}

	/// The children as a slice.
	pub fn nodes(&self) -> &[Node] {
		&self.content
	}

	/// Calls `f` for every node overlapping `from..to`, descending into
	/// children while `f` returns true. `f` receives the node, its absolute
	/// position, its parent, and its index in the parent.
	pub fn nodes_between<F>(&self, from: usize, to: usize, f: &mut F, node_start: usize, parent: Option<&Node>)
	where
		F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
	{
		let mut pos = 0;
		for (i, child) in self.content.iter().enumerate() {
			if pos >= to {
				break;
			}
			let end = pos + child.node_size();
			if end > from && f(child, node_start + pos, parent, i) && child.content().size() > 0 {
				let start = pos + 1;
				child.content().nodes_between(
					from.saturating_sub(start),
					child.content().size().min(to.saturating_sub(start)),
					f,
					node_start + start,
					Some(child),
				);
			}
			pos = end;
		}
	}

	/// Calls `f` for every descendant.
	pub fn descendants<F>(&self, f: &mut F)
	where
		F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
	{
		self.nodes_between(0, self.size, f, 0, None);
	}

	/// Text between two positions, with `block_separator` between blocks
	/// and `leaf_text` standing in for non-text leaves.
	pub fn text_between(&self, from: usize, to: usize, block_separator: &str, leaf_text: &str) -> String {
		let mut text = String::new();
		let mut first = true;
		self.nodes_between(
			from,
			to,
			&mut |node, pos, _, _| {
				let piece = if let Some(t) = node.text() {
					let start = from.saturating_sub(pos);
					let end = (to - pos).min(node.node_size());
					char_slice(t, start, end).to_string()
				} else if !node.is_leaf() {
					String::new()
				} else {
					leaf_text.to_string()
				};
				if node.is_block() && (node.is_leaf() && !piece.is_empty() || node.is_textblock()) && !block_separator.is_empty() {
					if first {
						first = false;
					} else {
						text.push_str(block_separator);
					}
				}
				text.push_str(&piece);
				true
			},
			0,
			None,
		);
		text
	}

	/// Concatenates two fragments, joining adjacent text with equal marks.
	pub fn append(&self, other: &Fragment) -> Fragment {
		if other.size == 0 {
			return self.clone();
		}
		if self.size == 0 {
			return other.clone();
		}
		let mut content = self.content.clone();
		let mut rest = other.content.iter();
		if let (Some(last), Some(first)) = (content.last_mut(), other.content.first()) {
			if last.is_text() && last.same_markup(first) {
				*last = last.with_text(&format!("{}{}", last.text().unwrap_or_default(), first.text().unwrap_or_default()));
				rest.next();
			}
		}
		content.extend(rest.cloned());
		Fragment { content, size: self.size + other.size }
	}

	/// The part of the fragment between two offsets.
	pub fn cut(&self, from: usize, to: usize) -> Fragment {
		if from == 0 && to == self.size {
			return self.clone();
		}
		let mut result = Vec::new();
		let mut size = 0;
		if to > from {
			let mut pos = 0;
			for child in &self.content {
				if pos >= to {
					break;
				}
				let end = pos + child.node_size();
				if end > from {
					let child = if pos < from || end > to {
						if child.is_text() {
							child.cut(from.saturating_sub(pos), (to - pos).min(child.node_size()))
						} else {
							child.cut(from.saturating_sub(pos + 1), (to - pos - 1).min(child.content().size()))
						}
					} else {
						child.clone()
					};
					size += child.node_size();
					result.push(child);
				}
				pos = end;
			}
		}
		Fragment { content: result, size }
	}

	/// Fragment to the end of the content, starting at `from`.
	pub fn cut_from(&self, from: usize) -> Fragment {
		self.cut(from, self.size)
	}

	/// Children between two indices.
	pub fn cut_by_index(&self, from: usize, to: usize) -> Fragment {
		if from == to {
			return Fragment::empty();
		}
		if from == 0 && to == self.content.len() {
			return self.clone();
		}
		let content: Vec<Node> = self.content[from..to].to_vec();
		let size = content.iter().map(Node::node_size).sum();
		Fragment { content, size }
	}

	/// Replaces the child at `index`.
	pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
		let current = &self.content[index];
		if current.ptr_eq(&node) {
			return self.clone();
		}
		let size = self.size + node.node_size() - current.node_size();
		let mut content = self.content.clone();
		content[index] = node;
		Fragment { content, size }
	}

	/// Prepends a node.
	pub fn add_to_start(&self, node: Node) -> Fragment {
		let size = self.size + node.node_size();
		let mut content = Vec::with_capacity(self.content.len() + 1);
		content.push(node);
		content.extend(self.content.iter().cloned());
		Fragment { content, size }
	}

	/// Appends a node.
	pub fn add_to_end(&self, node: Node) -> Fragment {
		let size = self.size + node.node_size();
		let mut content = self.content.clone();
		content.push(node);
		Fragment { content, size }
	}

	/// Finds the child index at a position. With `round > 0`, positions
	/// inside a child round up to the index after it.
	pub fn find_index(&self, pos: usize, round: i32) -> Result<IndexInfo> {
		if pos == 0 {
			return Ok(IndexInfo { index: 0, offset: 0 });
		}
		if pos == self.size {
			return Ok(IndexInfo { index: self.content.len(), offset: pos });
		}
		if pos > self.size {
			return Err(ModelError::Range(format!("Position {pos} outside of fragment ({self})")));
		}
		let mut cur_pos = 0;
		for (i, cur) in self.content.iter().enumerate() {
			let end = cur_pos + cur.node_size();
			if end >= pos {
				if end == pos || round > 0 {
					return Ok(IndexInfo { index: i + 1, offset: end });
				}
				return Ok(IndexInfo { index: i, offset: cur_pos });
			}
			cur_pos = end;
		}
		Err(ModelError::Range(format!("Position {pos} outside of fragment ({self})")))
	}

	/// Serializes the children, or `null` for an empty fragment.
	pub fn to_json(&self) -> Value {
		if self.content.is_empty() {
			return Value::Null;
		}
		Value::Array(self.content.iter().map(Node::to_json).collect())
	}

	/// Deserializes a fragment from an array of nodes (or `null`).
	pub fn from_json(schema: &Schema, json: Option<&Value>) -> Result<Fragment> {
		match json {
			None | Some(Value::Null) => Ok(Fragment::empty()),
			Some(Value::Array(items)) => {
				let nodes = items.iter().map(|item| Node::from_json(schema, item)).collect::<Result<Vec<_>>>()?;
				Ok(Fragment::from_vec(nodes))
			}
			Some(_) => Err(ModelError::Json("Invalid input for Fragment.fromJSON".to_string())),
		}
	}

	pub(crate) fn fmt_inner(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, node) in self.content.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			fmt::Display::fmt(node, f)?;
		}
		Ok(())
	}
}

impl PartialEq for Fragment {
	fn eq(&self, other: &Self) -> bool {
		self.content.len() == other.content.len() && self.content.iter().zip(&other.content).all(|(a, b)| a == b)
	}
}

impl Eq for Fragment {}

impl From<Node> for Fragment {
	fn from(node: Node) -> Self {
		Fragment::from_node(node)
	}
}

impl From<Vec<Node>> for Fragment {
	fn from(nodes: Vec<Node>) -> Self {
		Fragment::from_vec(nodes)
	}
}

impl<'a> IntoIterator for &'a Fragment {
	type Item = &'a Node;
	type IntoIter = std::slice::Iter<'a, Node>;

	fn into_iter(self) -> Self::IntoIter {
		self.content.iter()
	}
}

impl fmt::Display for Fragment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("<")?;
		self.fmt_inner(f)?;
		f.write_str(">")
	}
}

impl fmt::Debug for Fragment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

/// Slices a string by character offsets.
pub(crate) fn char_slice(text: &str, from: usize, to: usize) -> &str {
	let mut indices = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
	let start = indices.nth(from).unwrap_or(text.len());
	let end = if to > from { indices.nth(to - from - 1).unwrap_or(text.len()) } else { start };
	&text[start..end]
}
