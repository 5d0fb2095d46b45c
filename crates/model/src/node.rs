use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{ModelError, Result};
use crate::fragment::char_slice;
use crate::mark::attrs_from_json;
use crate::replace::replace;
use crate::schema::{Attrs, MarkType, NodeType, Schema};
use crate::{ContentMatch, Fragment, Mark, ResolvedPos, Slice};

#[cfg(test)]
mod tests;

struct NodeInner {
	node_type: NodeType,
	attrs: Attrs,
	content: Fragment,
	marks: Vec<Mark>,
	text: Option<TextData>,
}

struct TextData {
	value: String,
	len: usize,
}

/// An immutable document node. Cloning is cheap.
///
/// Positions inside a node count one token for each character of text and
/// an opening and closing token for every non-leaf node.
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

/// A child found by [`Node::child_after`] or [`Node::child_before`].
#[derive(Debug, Clone)]
pub struct ChildInfo {
	/// The child, if any.
	pub node: Option<Node>,
	/// Its index in the parent.
	pub index: usize,
	/// Its start offset in the parent.
	pub offset: usize,
}

impl Node {
	pub(crate) fn new(node_type: NodeType, attrs: Attrs, content: Fragment, marks: Vec<Mark>) -> Node {
		Node(Arc::new(NodeInner { node_type, attrs, content, marks, text: None }))
	}

	pub(crate) fn new_text(node_type: NodeType, text: &str, marks: Vec<Mark>) -> Node {
		let data = TextData { value: text.to_string(), len: text.chars().count() };
		Node(Arc::new(NodeInner {
			node_type,
			attrs: Attrs::new(),
			content: Fragment::empty(),
			marks,
			text: Some(data),
		}))
	}

	/// The node's type.
	pub fn node_type(&self) -> &NodeType {
		&self.0.node_type
	}

	/// The node's attributes.
	pub fn attrs(&self) -> &Attrs {
		&self.0.attrs
	}

	/// One attribute value.
	pub fn attr(&self, name: &str) -> Option<&Value> {
		self.0.attrs.get(name)
	}

	/// The node's children.
	pub fn content(&self) -> &Fragment {
		&self.0.content
	}

	/// Marks applied to this node.
	pub fn marks(&self) -> &[Mark] {
		&self.0.marks
	}

	/// Text of a text node.
	pub fn text(&self) -> Option<&str> {
		self.0.text.as_ref().map(|t| t.value.as_str())
	}

	/// Whether both handles point at the same allocation.
	pub fn ptr_eq(&self, other: &Node) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}

	/// Size of the node in tokens.
	pub fn node_size(&self) -> usize {
		match &self.0.text {
			Some(t) => t.len,
			None if self.is_leaf() => 1,
			None => 2 + self.0.content.size(),
		}
	}

	/// Number of children.
	pub fn child_count(&self) -> usize {
		self.0.content.child_count()
	}

	/// The child at `index`. Panics when out of range.
	pub fn child(&self, index: usize) -> &Node {
		self.0.content.child(index)
	}

	/// The child at `index`, if any.
	pub fn maybe_child(&self, index: usize) -> Option<&Node> {
		self.0.content.maybe_child(index)
	}

	/// First child, if any.
	pub fn first_child(&self) -> Option<&Node> {
		self.0.content.first_child()
	}

	/// Last child, if any.
	pub fn last_child(&self) -> Option<&Node> {
		self.0.content.last_child()
	}

	/// True for block nodes.
	pub fn is_block(&self) -> bool {
		self.0.node_type.is_block()
	}

	/// True for textblocks.
	pub fn is_textblock(&self) -> bool {
		self.0.node_type.is_textblock()
	}

	/// True when the node's content is inline.
	pub fn inline_content(&self) -> bool {
		self.0.node_type.inline_content()
	}

	/// True for inline nodes.
	pub fn is_inline(&self) -> bool {
		self.0.node_type.is_inline()
	}

	/// True for text nodes.
	pub fn is_text(&self) -> bool {
		self.0.text.is_some()
	}

	/// True for leaf nodes.
	pub fn is_leaf(&self) -> bool {
		self.0.node_type.is_leaf()
	}

	/// True for atoms.
	pub fn is_atom(&self) -> bool {
		self.0.node_type.is_atom()
	}

	/// Concatenated text of all descendants.
	pub fn text_content(&self) -> String {
		match self.text() {
			Some(t) => t.to_string(),
			None => self.text_between(0, self.0.content.size(), "", ""),
		}
	}

	/// Text between two positions.
	pub fn text_between(&self, from: usize, to: usize, block_separator: &str, leaf_text: &str) -> String {
		match self.text() {
			Some(t) => char_slice(t, from, to).to_string(),
			None => self.0.content.text_between(from, to, block_separator, leaf_text),
		}
	}

	/// Calls `f` for every descendant overlapping `from..to`.
	pub fn nodes_between<F>(&self, from: usize, to: usize, f: &mut F)
	where
		F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
	{
		self.0.content.nodes_between(from, to, f, 0, Some(self));
	}

	/// Calls `f` for every descendant.
	pub fn descendants<F>(&self, f: &mut F)
	where
		F: FnMut(&Node, usize, Option<&Node>, usize) -> bool,
	{
		self.nodes_between(0, self.0.content.size(), f);
	}

	/// Whether the node has the given type, attributes and marks.
	pub fn has_markup(&self, node_type: &NodeType, attrs: Option<&Attrs>, marks: &[Mark]) -> bool {
		let empty = Attrs::new();
		let attrs = attrs.or(node_type.default_attrs()).unwrap_or(&empty);
		self.0.node_type == *node_type && self.0.attrs == *attrs && Mark::same_set(&self.0.marks, marks)
	}

	/// Whether two nodes have the same type, attributes and marks.
	pub fn same_markup(&self, other: &Node) -> bool {
		self.has_markup(other.node_type(), Some(other.attrs()), other.marks())
	}

	/// A copy of this node with different content.
	pub fn copy(&self, content: Fragment) -> Node {
		let unchanged = content.child_count() == self.0.content.child_count()
			&& content.iter().zip(self.0.content.iter()).all(|(a, b)| a.ptr_eq(b));
		if unchanged && self.0.text.is_none() {
			return self.clone();
		}
		Node::new(self.0.node_type.clone(), self.0.attrs.clone(), content, self.0.marks.clone())
	}

	/// A copy of this node with different marks.
	pub fn mark(&self, marks: Vec<Mark>) -> Node {
		if Mark::same_set(&marks, &self.0.marks) {
			return self.clone();
		}
		Node(Arc::new(NodeInner {
			node_type: self.0.node_type.clone(),
			attrs: self.0.attrs.clone(),
			content: self.0.content.clone(),
			marks,
			text: self.0.text.as_ref().map(|t| TextData { value: t.value.clone(), len: t.len }),
		}))
	}

	/// A text node with the same marks and different text.
	pub fn with_text(&self, text: &str) -> Node {
		if self.text() == Some(text) {
			return self.clone();
		}
		Node::new_text(self.0.node_type.clone(), text, self.0.marks.clone())
	}

	/// A copy holding only the content between two positions.
	pub fn cut(&self, from: usize, to: usize) -> Node {
		if let Some(t) = &self.0.text {
			if from == 0 && to == t.len {
				return self.clone();
			}
			return self.with_text(char_slice(&t.value, from, to));
		}
		if from == 0 && to == self.0.content.size() {
			return self.clone();
		}
		self.copy(self.0.content.cut(from, to))
	}

	/// The slice of the document between two positions.
	pub fn slice(&self, from: usize, to: usize, include_parents: bool) -> Result<Slice> {
		if from == to {
			return Ok(Slice::empty());
		}
		let rfrom = self.resolve(from)?;
		let rto = self.resolve(to)?;
		let depth = if include_parents { 0 } else { rfrom.shared_depth(to) };
		let start = rfrom.start(depth);
		let node = rfrom.node(depth);
		let content = node.content().cut(rfrom.pos() - start, rto.pos() - start);
		Ok(Slice::new(content, rfrom.depth() - depth, rto.depth() - depth))
	}

	/// Replaces the range `from..to` with a slice, checking the result
	/// against the schema.
	pub fn replace(&self, from: usize, to: usize, slice: &Slice) -> Result<Node> {
		replace(&self.resolve(from)?, &self.resolve(to)?, slice)
	}

	/// The node directly after `pos`, descending as far as possible.
	pub fn node_at(&self, pos: usize) -> Option<Node> {
		let mut node = self.clone();
		let mut pos = pos;
		loop {
			let info = node.content().find_index(pos, -1).ok()?;
			let child = node.maybe_child(info.index)?.clone();
			if info.offset == pos || child.is_text() {
				return Some(child);
			}
			pos -= info.offset + 1;
			node = child;
		}
	}

	/// The direct child starting at or containing `pos`.
	pub fn child_after(&self, pos: usize) -> ChildInfo {
		match self.content().find_index(pos, -1) {
			Ok(info) => ChildInfo { node: self.maybe_child(info.index).cloned(), index: info.index, offset: info.offset },
			Err(_) => ChildInfo { node: None, index: self.child_count(), offset: self.content().size() },
		}
	}

	/// The direct child ending at or containing `pos`.
	pub fn child_before(&self, pos: usize) -> ChildInfo {
		if pos == 0 {
			return ChildInfo { node: None, index: 0, offset: 0 };
		}
		let Ok(info) = self.content().find_index(pos, -1) else {
			return ChildInfo { node: None, index: 0, offset: 0 };
		};
		if info.offset < pos {
			return ChildInfo { node: Some(self.child(info.index).clone()), index: info.index, offset: info.offset };
		}
		let node = self.child(info.index - 1).clone();
		let offset = info.offset - node.node_size();
		ChildInfo { node: Some(node), index: info.index - 1, offset }
	}

	/// Resolves a position to its full ancestor path.
	pub fn resolve(&self, pos: usize) -> Result<ResolvedPos> {
		ResolvedPos::resolve(self, pos)
	}

	/// Whether any node in `from..to` carries a mark of the given type.
	pub fn range_has_mark(&self, from: usize, to: usize, mark_type: &MarkType) -> bool {
		let mut found = false;
		if to > from {
			self.nodes_between(from, to, &mut |node, _, _, _| {
				if mark_type.is_in_set(node.marks()).is_some() {
					found = true;
				}
				!found
			});
		}
		found
	}

	/// The content-match state after the first `index` children.
	pub fn content_match_at(&self, index: usize) -> Result<ContentMatch> {
		self.0
			.node_type
			.content_match()
			.match_fragment(&self.0.content, 0, index)
			.ok_or_else(|| ModelError::Range("Called contentMatchAt on a node with invalid content".to_string()))
	}

	/// Whether replacing the children `from..to` with
	/// `replacement[start..end]` leaves valid content.
	pub fn can_replace(&self, from: usize, to: usize, replacement: &Fragment, start: usize, end: usize) -> bool {
		let Ok(matched) = self.content_match_at(from) else {
			return false;
		};
		let one = matched.match_fragment(replacement, start, end);
		let two = one.and_then(|one| one.match_fragment(&self.0.content, to, self.child_count()));
		if !two.is_some_and(|m| m.valid_end()) {
			return false;
		}
		(start..end).all(|i| self.0.node_type.allows_marks(replacement.child(i).marks()))
	}

	/// [`Node::can_replace`] with a whole fragment.
	pub fn can_replace_fragment(&self, from: usize, to: usize, replacement: &Fragment) -> bool {
		self.can_replace(from, to, replacement, 0, replacement.child_count())
	}

	/// Whether replacing the children `from..to` with one node of
	/// `node_type` leaves valid content.
	pub fn can_replace_with(&self, from: usize, to: usize, node_type: &NodeType, marks: Option<&[Mark]>) -> bool {
		if marks.is_some_and(|marks| !self.0.node_type.allows_marks(marks)) {
			return false;
		}
		let Ok(matched) = self.content_match_at(from) else {
			return false;
		};
		let end = matched
			.match_type(node_type)
			.and_then(|start| start.match_fragment(&self.0.content, to, self.child_count()));
		end.is_some_and(|m| m.valid_end())
	}

	/// Whether `other`'s content may be appended to this node's content.
	pub fn can_append(&self, other: &Node) -> bool {
		if other.content().size() > 0 {
			self.can_replace_fragment(self.child_count(), self.child_count(), other.content())
		} else {
			self.0.node_type.compatible_content(other.node_type())
		}
	}

	/// Checks the node and its descendants against the schema.
	pub fn check(&self) -> Result<()> {
		self.0.node_type.check_content(&self.0.content)?;
		self.0.node_type.check_attrs(&self.0.attrs)?;
		let mut copy: Vec<Mark> = Vec::new();
		for mark in &self.0.marks {
			mark.mark_type().check_attrs(mark.attrs())?;
			copy = mark.add_to_set(&copy);
		}
		if !Mark::same_set(&copy, &self.0.marks) {
			let names: Vec<_> = self.0.marks.iter().map(|m| m.mark_type().name()).collect();
			return Err(ModelError::Range(format!(
				"Invalid collection of marks for node {}: {}",
				self.0.node_type.name(),
				names.join(",")
			)));
		}
		self.0.content.iter().try_for_each(Node::check)
	}

	/// Serializes the node as `{type, attrs?, content?, marks?, text?}`.
	pub fn to_json(&self) -> Value {
		let mut obj = Map::new();
		obj.insert("type".into(), Value::String(self.0.node_type.name().to_string()));
		if !self.0.attrs.is_empty() {
			obj.insert("attrs".into(), Value::Object(self.0.attrs.clone().into_iter().collect()));
		}
		if self.0.content.size() > 0 {
			obj.insert("content".into(), self.0.content.to_json());
		}
		if !self.0.marks.is_empty() {
			obj.insert("marks".into(), Value::Array(self.0.marks.iter().map(Mark::to_json).collect()));
		}
		if let Some(text) = self.text() {
			obj.insert("text".into(), Value::String(text.to_string()));
		}
		Value::Object(obj)
	}

	/// Deserializes a node.
	pub fn from_json(schema: &Schema, json: &Value) -> Result<Node> {
		let Some(obj) = json.as_object() else {
			return Err(ModelError::Json("Invalid input for Node.fromJSON".to_string()));
		};
		let marks = match obj.get("marks") {
			None | Some(Value::Null) => Vec::new(),
			Some(Value::Array(items)) => items.iter().map(|m| Mark::from_json(schema, m)).collect::<Result<_>>()?,
			Some(_) => return Err(ModelError::Json("Invalid mark data for Node.fromJSON".to_string())),
		};
		let name = obj
			.get("type")
			.and_then(Value::as_str)
			.ok_or_else(|| ModelError::Json("Invalid input for Node.fromJSON".to_string()))?;
		if name == "text" {
			return match obj.get("text").and_then(Value::as_str) {
				Some(text) if !text.is_empty() => Ok(schema.text(text, marks)),
				_ => Err(ModelError::Json("Invalid text node in JSON".to_string())),
			};
		}
		let content = Fragment::from_json(schema, obj.get("content"))?;
		let attrs = attrs_from_json(obj.get("attrs"))?;
		let node = schema.expect_node_type(name)?.create(attrs.as_ref(), content, marks)?;
		node.node_type().check_attrs(node.attrs())?;
		Ok(node)
	}
}

impl PartialEq for Node {
	fn eq(&self, other: &Self) -> bool {
		if self.ptr_eq(other) {
			return true;
		}
		if !self.same_markup(other) {
			return false;
		}
		match (self.text(), other.text()) {
			(Some(a), Some(b)) => a == b,
			(None, None) => self.0.content == other.0.content,
			_ => false,
		}
	}
}

impl Eq for Node {}

fn wrap_marks(marks: &[Mark], inner: String) -> String {
	marks.iter().rev().fold(inner, |acc, mark| format!("{}({acc})", mark.mark_type().name()))
}

impl fmt::Display for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = match self.text() {
			Some(text) => format!("{text:?}"),
			None if self.0.content.size() > 0 => {
				let mut s = self.0.node_type.name().to_string();
				s.push('(');
				s.push_str(&ContentDisplay(&self.0.content).to_string());
				s.push(')');
				s
			}
			None => self.0.node_type.name().to_string(),
		};
		f.write_str(&wrap_marks(&self.0.marks, inner))
	}
}

struct ContentDisplay<'a>(&'a Fragment);

impl fmt::Display for ContentDisplay<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt_inner(f)
	}
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}
