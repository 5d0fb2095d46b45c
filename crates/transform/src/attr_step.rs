//! Steps that change a single attribute.

use quire_model::{Fragment, ModelError, Node, Slice};
use serde_json::{Map, Value};

use crate::error::{Result, StepError, StepResult};
use crate::map::{Bias, Mappable};
use crate::step::{apply_replace, invalid, json_pos};

/// Sets an attribute on the node starting at `pos`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrStep {
	pub pos: usize,
	pub attr: String,
	pub value: Value,
}

impl AttrStep {
	pub fn new(pos: usize, attr: impl Into<String>, value: Value) -> Self {
		Self { pos, attr: attr.into(), value }
	}

	pub fn apply(&self, doc: &Node) -> StepResult {
		let Some(node) = doc.node_at(self.pos) else {
			return Err(StepError::new("No node at attribute step's position"));
		};
		let mut attrs = node.attrs().clone();
		attrs.insert(self.attr.clone(), self.value.clone());
		let updated = node.node_type().create(Some(&attrs), Fragment::empty(), node.marks().to_vec())?;
		let open_end = if node.is_leaf() { 0 } else { 1 };
		apply_replace(doc, self.pos, self.pos + 1, &Slice::new(Fragment::from_node(updated), 0, open_end))
	}

	pub fn invert(&self, doc: &Node) -> quire_model::Result<AttrStep> {
		let node = doc
			.node_at(self.pos)
			.ok_or_else(|| ModelError::Range("No node at attribute step's position".to_string()))?;
		let old = node.attr(&self.attr).cloned().unwrap_or(Value::Null);
		Ok(AttrStep::new(self.pos, self.attr.clone(), old))
	}

	pub fn map(&self, mapping: &dyn Mappable) -> Option<AttrStep> {
		let pos = mapping.map_result(self.pos, Bias::Right);
		(!pos.deleted_after()).then(|| AttrStep::new(pos.pos, self.attr.clone(), self.value.clone()))
	}

	pub(crate) fn write_json(&self, obj: &mut Map<String, Value>) {
		obj.insert("pos".into(), self.pos.into());
		obj.insert("attr".into(), self.attr.clone().into());
		obj.insert("value".into(), self.value.clone());
	}

	pub fn from_json(json: &Value) -> Result<AttrStep> {
		let (Some(pos), Some(attr)) = (json_pos(json, "pos"), json.get("attr").and_then(Value::as_str)) else {
			return Err(invalid("AttrStep"));
		};
		Ok(AttrStep::new(pos, attr, json.get("value").cloned().unwrap_or(Value::Null)))
	}
}

/// Sets an attribute on the document node itself.
#[derive(Debug, Clone, PartialEq)]
pub struct DocAttrStep {
	pub attr: String,
	pub value: Value,
}

impl DocAttrStep {
	pub fn new(attr: impl Into<String>, value: Value) -> Self {
		Self { attr: attr.into(), value }
	}

	pub fn apply(&self, doc: &Node) -> StepResult {
		let mut attrs = doc.attrs().clone();
		attrs.insert(self.attr.clone(), self.value.clone());
		Ok(doc.node_type().create(Some(&attrs), doc.content().clone(), doc.marks().to_vec())?)
	}

	pub fn invert(&self, doc: &Node) -> DocAttrStep {
		DocAttrStep::new(self.attr.clone(), doc.attr(&self.attr).cloned().unwrap_or(Value::Null))
	}

	pub(crate) fn write_json(&self, obj: &mut Map<String, Value>) {
		obj.insert("attr".into(), self.attr.clone().into());
		obj.insert("value".into(), self.value.clone());
	}

	pub fn from_json(json: &Value) -> Result<DocAttrStep> {
		let Some(attr) = json.get("attr").and_then(Value::as_str) else {
			return Err(invalid("DocAttrStep"));
		};
		Ok(DocAttrStep::new(attr, json.get("value").cloned().unwrap_or(Value::Null)))
	}
}
