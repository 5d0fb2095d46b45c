//! The closed set of document steps.

use quire_model::{Node, Schema, Slice};
use serde_json::{Map, Value};

use crate::attr_step::{AttrStep, DocAttrStep};
use crate::error::{Result, StepError, StepResult, TransformError};
use crate::map::{Mappable, StepMap};
use crate::mark_step::{AddMarkStep, AddNodeMarkStep, RemoveMarkStep, RemoveNodeMarkStep};
use crate::replace_step::{ReplaceAroundStep, ReplaceStep};


/// An atomic, invertible document edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
	/// Replace a range with a slice.
	Replace(ReplaceStep),
	/// Replace a range while keeping an inner gap.
	ReplaceAround(ReplaceAroundStep),
	/// Add a mark to the inline content of a range.
	AddMark(AddMarkStep),
	/// Remove a mark from the inline content of a range.
	RemoveMark(RemoveMarkStep),
	/// Add a mark to a single node.
	AddNodeMark(AddNodeMarkStep),
	/// Remove a mark from a single node.
	RemoveNodeMark(RemoveNodeMarkStep),
	/// Set one attribute of a node.
	Attr(AttrStep),
	/// Set one attribute of the document node.
	DocAttr(DocAttrStep),
}

impl Step {
	/// The `stepType` tag used in JSON.
	pub fn step_type(&self) -> &'static str {
		match self {
			Self::Replace(_) => "replace",
			Self::ReplaceAround(_) => "replaceAround",
			Self::AddMark(_) => "addMark",
			Self::RemoveMark(_) => "removeMark",
			Self::AddNodeMark(_) => "addNodeMark",
			Self::RemoveNodeMark(_) => "removeNodeMark",
			Self::Attr(_) => "attr",
			Self::DocAttr(_) => "docAttr",
		}
	}

	/// Applies the step to a document.
	pub fn apply(&self, doc: &Node) -> StepResult {
		match self {
			Self::Replace(s) => s.apply(doc),
			Self::ReplaceAround(s) => s.apply(doc),
			Self::AddMark(s) => s.apply(doc),
			Self::RemoveMark(s) => s.apply(doc),
			Self::AddNodeMark(s) => s.apply(doc),
			Self::RemoveNodeMark(s) => s.apply(doc),
			Self::Attr(s) => s.apply(doc),
			Self::DocAttr(s) => s.apply(doc),
		}
	}

	/// The position map this step induces.
	pub fn get_map(&self) -> StepMap {
		match self {
			Self::Replace(s) => s.get_map(),
			Self::ReplaceAround(s) => s.get_map(),
			_ => StepMap::empty(),
		}
	}

	/// The step that undoes this one. `doc` is the document this step was
	/// applied to.
	pub fn invert(&self, doc: &Node) -> quire_model::Result<Step> {
		Ok(match self {
			Self::Replace(s) => Self::Replace(s.invert(doc)?),
			Self::ReplaceAround(s) => Self::ReplaceAround(s.invert(doc)?),
			Self::AddMark(s) => Self::RemoveMark(s.invert()),
			Self::RemoveMark(s) => Self::AddMark(s.invert()),
			Self::AddNodeMark(s) => s.invert(doc),
			Self::RemoveNodeMark(s) => s.invert(doc),
			Self::Attr(s) => Self::Attr(s.invert(doc)?),
			Self::DocAttr(s) => Self::DocAttr(s.invert(doc)),
		})
	}

	/// Maps the step through a mapping. `None` means the content the step
	/// targeted was deleted and the step no longer applies.
	pub fn map(&self, mapping: &dyn Mappable) -> Option<Step> {
		match self {
			Self::Replace(s) => s.map(mapping).map(Self::Replace),
			Self::ReplaceAround(s) => s.map(mapping).map(Self::ReplaceAround),
			Self::AddMark(s) => s.map(mapping).map(Self::AddMark),
			Self::RemoveMark(s) => s.map(mapping).map(Self::RemoveMark),
			Self::AddNodeMark(s) => s.map(mapping).map(Self::AddNodeMark),
			Self::RemoveNodeMark(s) => s.map(mapping).map(Self::RemoveNodeMark),
			Self::Attr(s) => s.map(mapping).map(Self::Attr),
			Self::DocAttr(s) => Some(Self::DocAttr(s.clone())),
		}
	}

	/// Combines this step with one applied directly after it, when both can
	/// be expressed as a single step.
	pub fn merge(&self, other: &Step) -> Option<Step> {
		match (self, other) {
			(Self::Replace(a), Self::Replace(b)) => a.merge(b).map(Self::Replace),
			(Self::AddMark(a), Self::AddMark(b)) => a.merge(b).map(Self::AddMark),
			(Self::RemoveMark(a), Self::RemoveMark(b)) => a.merge(b).map(Self::RemoveMark),
			_ => None,
		}
	}

	/// Serializes the step with its `stepType` tag.
	pub fn to_json(&self) -> Value {
		let mut obj = Map::new();
		obj.insert("stepType".into(), Value::String(self.step_type().to_string()));
		match self {
			Self::Replace(s) => s.write_json(&mut obj),
			Self::ReplaceAround(s) => s.write_json(&mut obj),
			Self::AddMark(s) => s.write_json(&mut obj),
			Self::RemoveMark(s) => s.write_json(&mut obj),
			Self::AddNodeMark(s) => s.write_json(&mut obj),
			Self::RemoveNodeMark(s) => s.write_json(&mut obj),
			Self::Attr(s) => s.write_json(&mut obj),
			Self::DocAttr(s) => s.write_json(&mut obj),
		}
		Value::Object(obj)
	}

	/// Deserializes a step, dispatching on its `stepType`.
	pub fn from_json(schema: &Schema, json: &Value) -> Result<Step> {
		let Some(tag) = json.get("stepType").and_then(Value::as_str) else {
			return Err(TransformError::Json("Invalid input for Step.fromJSON".to_string()));
		};
		Ok(match tag {
			"replace" => Self::Replace(ReplaceStep::from_json(schema, json)?),
			"replaceAround" => Self::ReplaceAround(ReplaceAroundStep::from_json(schema, json)?),
			"addMark" => Self::AddMark(AddMarkStep::from_json(schema, json)?),
			"removeMark" => Self::RemoveMark(RemoveMarkStep::from_json(schema, json)?),
			"addNodeMark" => Self::AddNodeMark(AddNodeMarkStep::from_json(schema, json)?),
			"removeNodeMark" => Self::RemoveNodeMark(RemoveNodeMarkStep::from_json(schema, json)?),
			"attr" => Self::Attr(AttrStep::from_json(json)?),
			"docAttr" => Self::DocAttr(DocAttrStep::from_json(json)?),
			other => return Err(TransformError::Json(format!("No step type {other} defined"))),
		})
	}
}

/// Replaces `from..to` in `doc`, turning model errors into step failures.
pub(crate) fn apply_replace(doc: &Node, from: usize, to: usize, slice: &Slice) -> StepResult {
	doc.replace(from, to, slice).map_err(StepError::from)
}

pub(crate) fn json_pos(json: &Value, key: &str) -> Option<usize> {
	json.get(key).and_then(Value::as_u64).map(|n| n as usize)
}

pub(crate) fn invalid(name: &str) -> TransformError {
	TransformError::Json(format!("Invalid input for {name}.fromJSON"))
}

macro_rules! impl_from_step {
	($($variant:ident($ty:ty)),* $(,)?) => {
		$(impl From<$ty> for Step {
			fn from(step: $ty) -> Self {
				Step::$variant(step)
			}
		})*
	};
}

impl_from_step!(
	Replace(ReplaceStep),
	ReplaceAround(ReplaceAroundStep),
	AddMark(AddMarkStep),
	RemoveMark(RemoveMarkStep),
	AddNodeMark(AddNodeMarkStep),
	RemoveNodeMark(RemoveNodeMarkStep),
	Attr(AttrStep),
	DocAttr(DocAttrStep),
);
