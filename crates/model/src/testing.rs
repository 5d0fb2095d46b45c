//! A basic schema with lists, and macros for building documents in tests.
//!
//! String children may contain `<name>` markers; the builders strip them
//! and record the position they stood at, relative to the start of the
//! built node's content:
//!
//! ```ignore
//! let d = doc!(p!("he<a>llo"));
//! assert_eq!(d.tag("a"), 3);
//! ```

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::OnceLock;

use serde_json::{Value, json};

use crate::{Attrs, Fragment, Mark, Node, Schema, SchemaSpec};

/// The test schema: the basic node set plus ordered/bullet lists.
pub fn schema() -> Schema {
	static SCHEMA: OnceLock<Schema> = OnceLock::new();
	SCHEMA
		.get_or_init(|| {
			let spec = json!({
				"nodes": {
					"doc": {"content": "block+"},
					"paragraph": {"content": "inline*", "group": "block"},
					"blockquote": {"content": "block+", "group": "block", "defining": true},
					"horizontal_rule": {"group": "block"},
					"heading": {
						"attrs": {"level": {"default": 1}},
						"content": "inline*",
						"group": "block",
						"defining": true
					},
					"code_block": {"content": "text*", "marks": "", "group": "block", "code": true, "defining": true},
					"text": {"group": "inline"},
					"image": {
						"inline": true,
						"attrs": {"src": {}, "alt": {"default": null}, "title": {"default": null}},
						"group": "inline"
					},
					"hard_break": {"inline": true, "group": "inline", "selectable": false},
					"ordered_list": {"attrs": {"order": {"default": 1}}, "content": "list_item+", "group": "block"},
					"bullet_list": {"content": "list_item+", "group": "block"},
					"list_item": {"content": "paragraph block*", "defining": true}
				},
				"marks": {
					"link": {"attrs": {"href": {}, "title": {"default": null}}, "inclusive": false},
					"em": {},
					"strong": {},
					"code": {}
				}
			});
			let spec = SchemaSpec::from_json(&spec).unwrap_or_else(|e| panic!("test schema spec: {e}"));
			Schema::new(spec).unwrap_or_else(|e| panic!("test schema: {e}"))
		})
		.clone()
}

/// A built node plus the tag positions found inside it.
#[derive(Clone, Debug)]
pub struct TaggedNode {
	/// The node.
	pub node: Node,
	/// Tag positions relative to the start of the node's content.
	pub tags: BTreeMap<String, usize>,
}

impl TaggedNode {
	/// Position of a tag. Panics when the tag does not exist.
	pub fn tag(&self, name: &str) -> usize {
		*self.tags.get(name).unwrap_or_else(|| panic!("no tag <{name}> in {}", self.node))
	}

	/// Position of a tag, if present.
	pub fn try_tag(&self, name: &str) -> Option<usize> {
		self.tags.get(name).copied()
	}
}

impl Deref for TaggedNode {
	type Target = Node;

	fn deref(&self) -> &Node {
		&self.node
	}
}

impl PartialEq<Node> for TaggedNode {
	fn eq(&self, other: &Node) -> bool {
		self.node == *other
	}
}

impl PartialEq<TaggedNode> for Node {
	fn eq(&self, other: &TaggedNode) -> bool {
		*self == other.node
	}
}

/// Inline nodes produced by a mark builder.
#[derive(Clone, Debug)]
pub struct Flat {
	/// The marked nodes.
	pub nodes: Vec<Node>,
	/// Tag positions relative to the first node.
	pub tags: BTreeMap<String, usize>,
}

/// Anything a builder accepts as a child.
#[derive(Clone, Debug)]
pub enum Child {
	/// Text, possibly with `<tag>` markers.
	Text(String),
	/// A block or inline node with tags.
	Node(TaggedNode),
	/// Marked inline content.
	Flat(Flat),
}

impl From<&str> for Child {
	fn from(text: &str) -> Self {
		Child::Text(text.to_string())
	}
}

impl From<String> for Child {
	fn from(text: String) -> Self {
		Child::Text(text)
	}
}

impl From<TaggedNode> for Child {
	fn from(node: TaggedNode) -> Self {
		Child::Node(node)
	}
}

impl From<Node> for Child {
	fn from(node: Node) -> Self {
		Child::Node(TaggedNode { node, tags: BTreeMap::new() })
	}
}

impl From<Flat> for Child {
	fn from(flat: Flat) -> Self {
		Child::Flat(flat)
	}
}

fn flatten(children: Vec<Child>, f: &dyn Fn(Node) -> Node) -> (Vec<Node>, BTreeMap<String, usize>) {
	let schema = schema();
	let mut result = Vec::new();
	let mut tags = BTreeMap::new();
	let mut pos = 0;
	for child in children {
		match child {
			Child::Text(text) => {
				let mut out = String::new();
				let mut rest = text.as_str();
				while let Some(open) = rest.find('<') {
					let Some(close) = rest[open..].find('>').map(|c| c + open) else {
						break;
					};
					let name = &rest[open + 1..close];
					if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
						out.push_str(&rest[..=open]);
						pos += rest[..=open].chars().count();
						rest = &rest[open + 1..];
						continue;
					}
					out.push_str(&rest[..open]);
					pos += rest[..open].chars().count();
					tags.insert(name.to_string(), pos);
					rest = &rest[close + 1..];
				}
				out.push_str(rest);
				pos += rest.chars().count();
				if !out.is_empty() {
					result.push(f(schema.text(&out, Vec::new())));
				}
			}
			Child::Node(tagged) => {
				let offset = if tagged.node.is_text() { 0 } else { 1 };
				for (name, at) in tagged.tags {
					tags.insert(name, at + offset + pos);
				}
				let node = f(tagged.node);
				pos += node.node_size();
				result.push(node);
			}
			Child::Flat(flat) => {
				for (name, at) in flat.tags {
					tags.insert(name, at + pos);
				}
				for node in flat.nodes {
					let node = f(node);
					pos += node.node_size();
					result.push(node);
				}
			}
		}
	}
	(result, tags)
}

/// Builds a node of the named type.
pub fn block(name: &str, attrs: Option<Value>, children: Vec<Child>) -> TaggedNode {
	let schema = schema();
	let (nodes, tags) = flatten(children, &|n| n);
	let attrs: Option<Attrs> = attrs.and_then(|a| a.as_object().map(|m| m.clone().into_iter().collect()));
	let node = schema
		.node(name, attrs.as_ref(), Fragment::from_vec(nodes), Vec::new())
		.unwrap_or_else(|e| panic!("building {name}: {e}"));
	TaggedNode { node, tags }
}

/// Applies the named mark to the children.
pub fn mark(name: &str, attrs: Option<Value>, children: Vec<Child>) -> Flat {
	let schema = schema();
	let attrs: Option<Attrs> = attrs.and_then(|a| a.as_object().map(|m| m.clone().into_iter().collect()));
	let mark: Mark = schema.mark(name, attrs.as_ref()).unwrap_or_else(|e| panic!("building mark {name}: {e}"));
	let (nodes, tags) = flatten(children, &|n: Node| {
		if mark.mark_type().is_in_set(n.marks()).is_some() {
			n
		} else {
			let marks = mark.add_to_set(n.marks());
			n.mark(marks)
		}
	});
	Flat { nodes, tags }
}

/// A heading of the given level.
pub fn heading(level: u64, children: Vec<Child>) -> TaggedNode {
	block("heading", Some(json!({"level": level})), children)
}

/// An inline image.
pub fn image(src: &str) -> TaggedNode {
	block("image", Some(json!({"src": src})), Vec::new())
}

/// Children wrapped in a link mark.
pub fn link(href: &str, children: Vec<Child>) -> Flat {
	mark("link", Some(json!({"href": href})), children)
}

/// `doc(...)`
#[macro_export]
macro_rules! doc {
	($($c:expr),* $(,)?) => { $crate::testing::block("doc", None, vec![$($crate::testing::Child::from($c)),*]) };
}

/// `paragraph(...)`
#[macro_export]
macro_rules! p {
	($($c:expr),* $(,)?) => { $crate::testing::block("paragraph", None, vec![$($crate::testing::Child::from($c)),*]) };
}

/// `blockquote(...)`
#[macro_export]
macro_rules! blockquote {
	($($c:expr),* $(,)?) => { $crate::testing::block("blockquote", None, vec![$($crate::testing::Child::from($c)),*]) };
}

/// `heading(level = 1)`
#[macro_export]
macro_rules! h1 {
	($($c:expr),* $(,)?) => {
		$crate::testing::heading(1, vec![$($crate::testing::Child::from($c)),*])
	};
}

/// `heading(level = 2)`
#[macro_export]
macro_rules! h2 {
	($($c:expr),* $(,)?) => {
		$crate::testing::heading(2, vec![$($crate::testing::Child::from($c)),*])
	};
}

/// `code_block(...)`
#[macro_export]
macro_rules! pre {
	($($c:expr),* $(,)?) => { $crate::testing::block("code_block", None, vec![$($crate::testing::Child::from($c)),*]) };
}

/// `bullet_list(...)`
#[macro_export]
macro_rules! ul {
	($($c:expr),* $(,)?) => { $crate::testing::block("bullet_list", None, vec![$($crate::testing::Child::from($c)),*]) };
}

/// `ordered_list(...)`
#[macro_export]
macro_rules! ol {
	($($c:expr),* $(,)?) => { $crate::testing::block("ordered_list", None, vec![$($crate::testing::Child::from($c)),*]) };
}

/// `list_item(...)`
#[macro_export]
macro_rules! li {
	($($c:expr),* $(,)?) => { $crate::testing::block("list_item", None, vec![$($crate::testing::Child::from($c)),*]) };
}

/// `image(src = "img.png")`
#[macro_export]
macro_rules! img {
	() => { $crate::testing::image("img.png") };
}

/// `hard_break`
#[macro_export]
macro_rules! br {
	() => { $crate::testing::block("hard_break", None, Vec::new()) };
}

/// `horizontal_rule`
#[macro_export]
macro_rules! hr {
	() => { $crate::testing::block("horizontal_rule", None, Vec::new()) };
}

/// `em(...)`
#[macro_export]
macro_rules! em {
	($($c:expr),* $(,)?) => { $crate::testing::mark("em", None, vec![$($crate::testing::Child::from($c)),*]) };
}

/// `strong(...)`
#[macro_export]
macro_rules! strong {
	($($c:expr),* $(,)?) => { $crate::testing::mark("strong", None, vec![$($crate::testing::Child::from($c)),*]) };
}

/// `code(...)`
#[macro_export]
macro_rules! code {
	($($c:expr),* $(,)?) => { $crate::testing::mark("code", None, vec![$($crate::testing::Child::from($c)),*]) };
}

/// `link(href = "foo")`
#[macro_export]
macro_rules! a {
	($($c:expr),* $(,)?) => {
		$crate::testing::link("foo", vec![$($crate::testing::Child::from($c)),*])
	};
}
