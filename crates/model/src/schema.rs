//! Schemas, node types and mark types.
//!
//! A [`Schema`] is compiled once from a [`SchemaSpec`] and then shared by
//! every node created from it. Node and mark types are lightweight handles
//! (schema pointer plus index), so comparing two types is an index check.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::content::{self, ContentMatch, MatchState};
use crate::error::{ModelError, Result};
use crate::{Fragment, Mark, Node};

#[cfg(test)]
mod tests;

/// Attribute values of a node or mark, keyed by attribute name.
pub type Attrs = BTreeMap<String, Value>;

/// Declaration of a single attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSpec {
	/// Default value. An attribute without a default is required.
	#[serde(default, deserialize_with = "present_value", skip_serializing_if = "Option::is_none")]
	pub default: Option<Value>,
}

impl AttributeSpec {
	/// An attribute with the given default.
	pub fn with_default(value: impl Into<Value>) -> Self {
		Self { default: Some(value.into()) }
	}

	/// An attribute that must always be supplied.
	pub fn required() -> Self {
		Self { default: None }
	}
}

/// Keeps an explicit `null` default distinct from a missing one.
fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
	D: Deserializer<'de>,
{
	Value::deserialize(deserializer).map(Some)
}

/// Whitespace handling of a node's text content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Whitespace {
	/// Whitespace may be collapsed.
	Normal,
	/// Whitespace is significant.
	Pre,
}

/// Declaration of a node type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeSpec {
	/// Content expression; absent or empty makes the node a leaf.
	pub content: Option<String>,
	/// Allowed marks: `"_"` for all, `""` for none, or names and groups.
	pub marks: Option<String>,
	/// Space separated groups this type belongs to.
	pub group: Option<String>,
	/// Whether this is an inline node.
	pub inline: bool,
	/// Whether the node is a single unit for the purpose of editing.
	pub atom: bool,
	/// Declared attributes.
	pub attrs: IndexMap<String, AttributeSpec>,
	/// Whether node selections may target this node. Defaults to true.
	pub selectable: Option<bool>,
	/// Marks the node as holding code.
	pub code: bool,
	/// Whitespace handling, defaults to `pre` for code nodes.
	pub whitespace: Option<Whitespace>,
	/// Shorthand for both `defining_as_context` and `defining_for_content`.
	pub defining: bool,
	/// Preserved as context when its content is replaced wholesale.
	pub defining_as_context: Option<bool>,
	/// Kept as a wrapper when content from it is pasted elsewhere.
	pub defining_for_content: Option<bool>,
	/// Edits on the outside never cut through this node's boundaries.
	pub isolating: bool,
}

/// Declaration of a mark type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkSpec {
	/// Declared attributes.
	pub attrs: IndexMap<String, AttributeSpec>,
	/// Whether the mark extends to text typed at its end. Defaults to true.
	pub inclusive: Option<bool>,
	/// Marks that cannot coexist with this one: `"_"` for all, `""` for
	/// none, absent for only other instances of itself.
	pub excludes: Option<String>,
	/// Space separated groups this mark belongs to.
	pub group: Option<String>,
	/// Whether the mark may span multiple adjacent nodes. Defaults to true.
	pub spanning: Option<bool>,
}

/// Full schema declaration. Order matters: the first node type in a group
/// is the default when content has to be synthesized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaSpec {
	/// Node types by name.
	pub nodes: IndexMap<String, NodeSpec>,
	/// Mark types by name.
	pub marks: IndexMap<String, MarkSpec>,
	/// Name of the document node type, `doc` when absent.
	pub top_node: Option<String>,
}

impl SchemaSpec {
	/// Parses a spec from a JSON value.
	pub fn from_json(value: &Value) -> Result<Self> {
		serde_json::from_value(value.clone()).map_err(|e| ModelError::Json(format!("Invalid schema spec: {e}")))
	}
}

pub(crate) struct NodeTypeData {
	pub(crate) name: String,
	pub(crate) spec: NodeSpec,
	pub(crate) groups: Vec<String>,
	pub(crate) attrs: Vec<(String, Option<Value>)>,
	pub(crate) default_attrs: Option<Attrs>,
	pub(crate) is_block: bool,
	pub(crate) is_text: bool,
	pub(crate) is_leaf: bool,
	pub(crate) inline_content: bool,
	pub(crate) content_match: usize,
	pub(crate) mark_set: Option<Vec<usize>>,
}

impl NodeTypeData {
	pub(crate) fn has_required_attrs(&self) -> bool {
		self.attrs.iter().any(|(_, default)| default.is_none())
	}

	pub(crate) fn is_inline(&self) -> bool {
		!self.is_block
	}
}

pub(crate) struct MarkTypeData {
	pub(crate) name: String,
	pub(crate) spec: MarkSpec,
	pub(crate) attrs: Vec<(String, Option<Value>)>,
	pub(crate) default_attrs: Option<Attrs>,
	pub(crate) excluded: Vec<usize>,
}

pub(crate) struct SchemaInner {
	pub(crate) spec: SchemaSpec,
	pub(crate) nodes: Vec<NodeTypeData>,
	pub(crate) marks: Vec<MarkTypeData>,
	pub(crate) node_index: FxHashMap<String, usize>,
	pub(crate) mark_index: FxHashMap<String, usize>,
	pub(crate) states: Vec<MatchState>,
	pub(crate) top: usize,
	pub(crate) text: usize,
}

/// A compiled document schema.
#[derive(Clone)]
pub struct Schema(pub(crate) Arc<SchemaInner>);

fn attr_table(spec: &IndexMap<String, AttributeSpec>) -> (Vec<(String, Option<Value>)>, Option<Attrs>) {
	let attrs: Vec<_> = spec.iter().map(|(name, attr)| (name.clone(), attr.default.clone())).collect();
	let defaults = attrs
		.iter()
		.map(|(name, default)| default.clone().map(|value| (name.clone(), value)))
		.collect::<Option<Attrs>>();
	(attrs, defaults)
}

fn split_words(list: &str) -> impl Iterator<Item = &str> {
	list.split(' ').filter(|word| !word.is_empty())
}

fn gather_marks(marks: &[MarkTypeData], index: &FxHashMap<String, usize>, names: &str) -> Result<Vec<usize>> {
	let mut found = Vec::new();
	for name in split_words(names) {
		if let Some(&id) = index.get(name) {
			found.push(id);
			continue;
		}
		let mut ok = false;
		for (id, mark) in marks.iter().enumerate() {
			let in_group = mark.spec.group.as_deref().is_some_and(|groups| split_words(groups).any(|g| g == name));
			if name == "_" || in_group {
				found.push(id);
				ok = true;
			}
		}
		if !ok {
			return Err(ModelError::Schema(format!("Unknown mark type: '{name}'")));
		}
	}
	Ok(found)
}

impl Schema {
	/// Compiles a schema from its declaration.
	pub fn new(spec: SchemaSpec) -> Result<Schema> {
		let mut nodes = Vec::with_capacity(spec.nodes.len());
		let mut node_index = FxHashMap::default();
		for (id, (name, node_spec)) in spec.nodes.iter().enumerate() {
			let (attrs, default_attrs) = attr_table(&node_spec.attrs);
			let is_text = name == "text";
			nodes.push(NodeTypeData {
				name: name.clone(),
				spec: node_spec.clone(),
				groups: node_spec.group.as_deref().map(|g| split_words(g).map(String::from).collect()).unwrap_or_default(),
				attrs,
				default_attrs,
				is_block: !(node_spec.inline || is_text),
				is_text,
				is_leaf: true,
				inline_content: false,
				content_match: content::EMPTY,
				mark_set: None,
			});
			node_index.insert(name.clone(), id);
		}

		let top_name = spec.top_node.clone().unwrap_or_else(|| "doc".to_string());
		let top = *node_index
			.get(&top_name)
			.ok_or_else(|| ModelError::Schema(format!("Schema is missing its top node type ('{top_name}')")))?;
		let text = *node_index
			.get("text")
			.ok_or_else(|| ModelError::Schema("Every schema needs a 'text' type".to_string()))?;
		if !nodes[text].attrs.is_empty() {
			return Err(ModelError::Schema("The text node type should not have attributes".to_string()));
		}

		let mut marks = Vec::with_capacity(spec.marks.len());
		let mut mark_index = FxHashMap::default();
		for (id, (name, mark_spec)) in spec.marks.iter().enumerate() {
			let (attrs, default_attrs) = attr_table(&mark_spec.attrs);
			marks.push(MarkTypeData {
				name: name.clone(),
				spec: mark_spec.clone(),
				attrs,
				default_attrs,
				excluded: Vec::new(),
			});
			mark_index.insert(name.clone(), id);
		}

		let mut states = vec![MatchState::empty()];
		let mut expr_cache: FxHashMap<String, usize> = FxHashMap::default();
		for id in 0..nodes.len() {
			let expr = nodes[id].spec.content.clone().unwrap_or_default();
			let start = match expr_cache.get(&expr) {
				Some(&start) => start,
				None => {
					let start = content::compile(&expr, &nodes, &mut states)?;
					expr_cache.insert(expr, start);
					start
				}
			};
			nodes[id].content_match = start;
			nodes[id].is_leaf = start == content::EMPTY;
		}

		for id in 0..nodes.len() {
			let start = &states[nodes[id].content_match];
			let inline_content = start.next.first().is_some_and(|edge| nodes[edge.node_type].is_inline());
			nodes[id].inline_content = inline_content;
			let mark_set = match nodes[id].spec.marks.as_deref() {
				Some("_") => None,
				Some("") => Some(Vec::new()),
				Some(expr) => Some(gather_marks(&marks, &mark_index, expr)?),
				None if !inline_content => Some(Vec::new()),
				None => None,
			};
			nodes[id].mark_set = mark_set;
		}

		for id in 0..marks.len() {
			let excluded = match marks[id].spec.excludes.as_deref() {
				None => vec![id],
				Some("") => Vec::new(),
				Some(expr) => gather_marks(&marks, &mark_index, expr)?,
			};
			marks[id].excluded = excluded;
		}

		Ok(Schema(Arc::new(SchemaInner {
			spec,
			nodes,
			marks,
			node_index,
			mark_index,
			states,
			top,
			text,
		})))
	}

	/// Compiles a schema from a JSON declaration.
	pub fn from_json(value: &Value) -> Result<Schema> {
		Schema::new(SchemaSpec::from_json(value)?)
	}

	/// The declaration this schema was compiled from.
	pub fn spec(&self) -> &SchemaSpec {
		&self.0.spec
	}

	/// Looks up a node type by name.
	pub fn node_type(&self, name: &str) -> Option<NodeType> {
		self.0.node_index.get(name).map(|&id| NodeType { schema: self.clone(), id })
	}

	/// Looks up a node type by name, failing for unknown names.
	pub fn expect_node_type(&self, name: &str) -> Result<NodeType> {
		self.node_type(name).ok_or_else(|| ModelError::UnknownNodeType(name.to_string()))
	}

	/// Looks up a mark type by name.
	pub fn mark_type(&self, name: &str) -> Option<MarkType> {
		self.0.mark_index.get(name).map(|&id| MarkType { schema: self.clone(), id })
	}

	/// Looks up a mark type by name, failing for unknown names.
	pub fn expect_mark_type(&self, name: &str) -> Result<MarkType> {
		self.mark_type(name).ok_or_else(|| ModelError::UnknownMarkType(name.to_string()))
	}

	/// All node types in declaration order.
	pub fn node_types(&self) -> impl Iterator<Item = NodeType> + '_ {
		(0..self.0.nodes.len()).map(|id| NodeType { schema: self.clone(), id })
	}

	/// All mark types in declaration order.
	pub fn mark_types(&self) -> impl Iterator<Item = MarkType> + '_ {
		(0..self.0.marks.len()).map(|id| MarkType { schema: self.clone(), id })
	}

	/// The type of document nodes.
	pub fn top_node_type(&self) -> NodeType {
		NodeType { schema: self.clone(), id: self.0.top }
	}

	/// The text node type.
	pub fn text_type(&self) -> NodeType {
		NodeType { schema: self.clone(), id: self.0.text }
	}

	/// Creates a node of the named type.
	pub fn node(&self, name: &str, attrs: Option<&Attrs>, content: Fragment, marks: Vec<Mark>) -> Result<Node> {
		self.expect_node_type(name)?.create(attrs, content, marks)
	}

	/// Creates a text node. Panics on empty text, which no document may hold.
	pub fn text(&self, text: &str, marks: Vec<Mark>) -> Node {
		assert!(!text.is_empty(), "Empty text nodes are not allowed");
		Node::new_text(self.text_type(), text, Mark::set_from(marks))
	}

	/// Creates a mark of the named type.
	pub fn mark(&self, name: &str, attrs: Option<&Attrs>) -> Result<Mark> {
		self.expect_mark_type(name)?.create(attrs)
	}

	/// Deserializes a node.
	pub fn node_from_json(&self, json: &Value) -> Result<Node> {
		Node::from_json(self, json)
	}

	/// Deserializes a mark.
	pub fn mark_from_json(&self, json: &Value) -> Result<Mark> {
		Mark::from_json(self, json)
	}

	pub(crate) fn same(&self, other: &Schema) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for Schema {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Schema")
			.field("nodes", &self.0.nodes.iter().map(|n| n.name.as_str()).collect::<Vec<_>>())
			.field("marks", &self.0.marks.iter().map(|m| m.name.as_str()).collect::<Vec<_>>())
			.finish()
	}
}

fn compute_attrs(owner: &str, decl: &[(String, Option<Value>)], defaults: &Option<Attrs>, given: Option<&Attrs>) -> Result<Attrs> {
	let Some(given) = given else {
		if let Some(defaults) = defaults {
			return Ok(defaults.clone());
		}
		let missing = decl.iter().find(|(_, d)| d.is_none()).map(|(n, _)| n.as_str()).unwrap_or_default();
		return Err(ModelError::Attrs(format!("No value supplied for attribute {missing} on {owner}")));
	};
	let mut built = Attrs::new();
	for (name, default) in decl {
		let value = match (given.get(name), default) {
			(Some(value), _) => value.clone(),
			(None, Some(default)) => default.clone(),
			(None, None) => return Err(ModelError::Attrs(format!("No value supplied for attribute {name} on {owner}"))),
		};
		built.insert(name.clone(), value);
	}
	Ok(built)
}

fn check_attrs(kind: &str, owner: &str, decl: &[(String, Option<Value>)], attrs: &Attrs) -> Result<()> {
	for name in attrs.keys() {
		if !decl.iter().any(|(n, _)| n == name) {
			return Err(ModelError::Attrs(format!("Unsupported attribute {name} for {kind} of type {owner}")));
		}
	}
	Ok(())
}

/// A node type within a schema.
#[derive(Clone)]
pub struct NodeType {
	pub(crate) schema: Schema,
	pub(crate) id: usize,
}

impl NodeType {
	pub(crate) fn data(&self) -> &NodeTypeData {
		&self.schema.0.nodes[self.id]
	}

	/// The type's name.
	pub fn name(&self) -> &str {
		&self.data().name
	}

	/// The schema this type belongs to.
	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	/// The declaration of this type.
	pub fn spec(&self) -> &NodeSpec {
		&self.data().spec
	}

	/// Groups this type belongs to.
	pub fn groups(&self) -> &[String] {
		&self.data().groups
	}

	/// True for block-level types.
	pub fn is_block(&self) -> bool {
		self.data().is_block
	}

	/// True for inline types, including text.
	pub fn is_inline(&self) -> bool {
		self.data().is_inline()
	}

	/// True for the text type.
	pub fn is_text(&self) -> bool {
		self.data().is_text
	}

	/// True for blocks whose content is inline.
	pub fn is_textblock(&self) -> bool {
		self.is_block() && self.inline_content()
	}

	/// True when the type allows no content.
	pub fn is_leaf(&self) -> bool {
		self.data().is_leaf
	}

	/// True for leaves and types declared `atom`.
	pub fn is_atom(&self) -> bool {
		self.is_leaf() || self.spec().atom
	}

	/// True when the content expression starts with inline content.
	pub fn inline_content(&self) -> bool {
		self.data().inline_content
	}

	/// Whether this type is selectable by node selections.
	pub fn is_selectable(&self) -> bool {
		self.spec().selectable.unwrap_or(true)
	}

	/// Whitespace handling for the node's content.
	pub fn whitespace(&self) -> Whitespace {
		self.spec()
			.whitespace
			.unwrap_or(if self.spec().code { Whitespace::Pre } else { Whitespace::Normal })
	}

	/// True for isolating nodes.
	pub fn is_isolating(&self) -> bool {
		self.spec().isolating
	}

	/// Whether the node is preserved as context when its content is replaced.
	pub fn is_defining_as_context(&self) -> bool {
		self.spec().defining_as_context.unwrap_or(self.spec().defining)
	}

	/// Whether the node is kept when its content is pasted elsewhere.
	pub fn is_defining_for_content(&self) -> bool {
		self.spec().defining_for_content.unwrap_or(self.spec().defining)
	}

	/// Either flavour of defining.
	pub fn is_defining(&self) -> bool {
		self.is_defining_as_context() || self.is_defining_for_content()
	}

	/// True when some attribute has no default.
	pub fn has_required_attrs(&self) -> bool {
		self.data().has_required_attrs()
	}

	/// The attributes used when none are given, if every attribute has a default.
	pub fn default_attrs(&self) -> Option<&Attrs> {
		self.data().default_attrs.as_ref()
	}

	/// The automaton state at the start of this type's content.
	pub fn content_match(&self) -> ContentMatch {
		ContentMatch { schema: self.schema.clone(), state: self.data().content_match }
	}

	/// Fills in defaults for missing attributes.
	pub fn compute_attrs(&self, attrs: Option<&Attrs>) -> Result<Attrs> {
		let data = self.data();
		compute_attrs(&data.name, &data.attrs, &data.default_attrs, attrs)
	}

	/// Rejects attributes this type does not declare.
	pub fn check_attrs(&self, attrs: &Attrs) -> Result<()> {
		check_attrs("node", self.name(), &self.data().attrs, attrs)
	}

	/// Creates a node of this type without validating its content.
	pub fn create(&self, attrs: Option<&Attrs>, content: Fragment, marks: Vec<Mark>) -> Result<Node> {
		if self.is_text() {
			return Err(ModelError::Range("NodeType.create can't construct text nodes".to_string()));
		}
		Ok(Node::new(self.clone(), self.compute_attrs(attrs)?, content, Mark::set_from(marks)))
	}

	/// Creates a node of this type, failing when the content is invalid.
	pub fn create_checked(&self, attrs: Option<&Attrs>, content: Fragment, marks: Vec<Mark>) -> Result<Node> {
		self.check_content(&content)?;
		self.create(attrs, content, marks)
	}

	/// Creates a node, adding whatever content is needed before and after
	/// `content` to make it valid. Returns `None` when that is impossible.
	pub fn create_and_fill(&self, attrs: Option<&Attrs>, content: Fragment, marks: Vec<Mark>) -> Result<Option<Node>> {
		let attrs = self.compute_attrs(attrs)?;
		let mut content = content;
		if content.size() > 0 {
			let Some(before) = self.content_match().fill_before(&content, false, 0) else {
				return Ok(None);
			};
			content = before.append(&content);
		}
		let Some(matched) = self.content_match().match_fragment(&content, 0, content.child_count()) else {
			return Ok(None);
		};
		let Some(after) = matched.fill_before(&Fragment::empty(), true, 0) else {
			return Ok(None);
		};
		Ok(Some(Node::new(self.clone(), attrs, content.append(&after), Mark::set_from(marks))))
	}

	/// True when `content` is valid content for this type.
	pub fn valid_content(&self, content: &Fragment) -> bool {
		let end = self.content_match().match_fragment(content, 0, content.child_count());
		if !end.is_some_and(|m| m.valid_end()) {
			return false;
		}
		content.iter().all(|child| self.allows_marks(child.marks()))
	}

	/// Fails with [`ModelError::InvalidContent`] when the content is invalid.
	pub fn check_content(&self, content: &Fragment) -> Result<()> {
		if self.valid_content(content) {
			return Ok(());
		}
		let mut rendered = content.to_string();
		if rendered.chars().count() > 50 {
			rendered = rendered.chars().take(50).collect();
		}
		Err(ModelError::InvalidContent { node: self.name().to_string(), content: rendered })
	}

	/// Whether marks of the given type may appear in this node's content.
	pub fn allows_mark_type(&self, mark_type: &MarkType) -> bool {
		match &self.data().mark_set {
			None => true,
			Some(set) => set.contains(&mark_type.id),
		}
	}

	/// Whether all of the given marks may appear in this node's content.
	pub fn allows_marks(&self, marks: &[Mark]) -> bool {
		marks.iter().all(|mark| self.allows_mark_type(mark.mark_type()))
	}

	/// Filters out the marks this node's content may not carry.
	pub fn allowed_marks(&self, marks: &[Mark]) -> Vec<Mark> {
		marks.iter().filter(|mark| self.allows_mark_type(mark.mark_type())).cloned().collect()
	}

	/// Whether nodes of `other` may be joined onto nodes of this type.
	pub fn compatible_content(&self, other: &NodeType) -> bool {
		self == other || self.content_match().compatible(&other.content_match())
	}
}

impl PartialEq for NodeType {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id && self.schema.same(&other.schema)
	}
}

impl Eq for NodeType {}

impl fmt::Debug for NodeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "NodeType({})", self.name())
	}
}

/// A mark type within a schema.
#[derive(Clone)]
pub struct MarkType {
	pub(crate) schema: Schema,
	pub(crate) id: usize,
}

impl MarkType {
	fn data(&self) -> &MarkTypeData {
		&self.schema.0.marks[self.id]
	}

	/// The type's name.
	pub fn name(&self) -> &str {
		&self.data().name
	}

	/// The declaration of this type.
	pub fn spec(&self) -> &MarkSpec {
		&self.data().spec
	}

	/// Ordering of marks within a mark set.
	pub fn rank(&self) -> usize {
		self.id
	}

	/// Whether the mark extends to content inserted at its end.
	pub fn is_inclusive(&self) -> bool {
		self.spec().inclusive.unwrap_or(true)
	}

	/// Creates a mark of this type.
	pub fn create(&self, attrs: Option<&Attrs>) -> Result<Mark> {
		let data = self.data();
		let attrs = compute_attrs(&data.name, &data.attrs, &data.default_attrs, attrs)?;
		Ok(Mark::new(self.clone(), attrs))
	}

	/// Rejects attributes this type does not declare.
	pub fn check_attrs(&self, attrs: &Attrs) -> Result<()> {
		check_attrs("mark", self.name(), &self.data().attrs, attrs)
	}

	/// Whether this mark type excludes `other`.
	pub fn excludes(&self, other: &MarkType) -> bool {
		self.data().excluded.contains(&other.id)
	}

	/// Finds a mark of this type in a set.
	pub fn is_in_set<'a>(&self, set: &'a [Mark]) -> Option<&'a Mark> {
		set.iter().find(|mark| mark.mark_type() == self)
	}

	/// Removes every mark of this type from a set.
	pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
		set.iter().filter(|mark| mark.mark_type() != self).cloned().collect()
	}
}

impl PartialEq for MarkType {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id && self.schema.same(&other.schema)
	}
}

impl Eq for MarkType {}

impl fmt::Debug for MarkType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "MarkType({})", self.name())
	}
}
