//! Replace steps: the only steps that change document structure.

use quire_model::{Node, Schema, Slice};
use serde_json::{Map, Value};

use crate::error::{Result, StepError, StepResult};
use crate::map::{Bias, Mappable, StepMap};
use crate::step::{apply_replace, invalid, json_pos};

/// Replaces `from..to` with a slice.
///
/// When `structure` is set the step only succeeds if the replaced range
/// holds nothing but node boundaries, so it never drops content when
/// mapped over concurrent edits.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceStep {
	pub from: usize,
	pub to: usize,
	pub slice: Slice,
	pub structure: bool,
}

impl ReplaceStep {
	pub fn new(from: usize, to: usize, slice: Slice, structure: bool) -> Self {
		Self { from, to, slice, structure }
	}

	pub fn apply(&self, doc: &Node) -> StepResult {
		if self.structure && content_between(doc, self.from, self.to)? {
			return Err(StepError::new("Structure replace would overwrite content"));
		}
		apply_replace(doc, self.from, self.to, &self.slice)
	}

	pub fn get_map(&self) -> StepMap {
		StepMap::new(&[self.from, self.to - self.from, self.slice.size()])
	}

	pub fn invert(&self, doc: &Node) -> quire_model::Result<ReplaceStep> {
		Ok(ReplaceStep::new(
			self.from,
			self.from + self.slice.size(),
			doc.slice(self.from, self.to, false)?,
			false,
		))
	}

	pub fn map(&self, mapping: &dyn Mappable) -> Option<ReplaceStep> {
		let from = mapping.map_result(self.from, Bias::Right);
		let to = mapping.map_result(self.to, Bias::Left);
		if from.deleted_across() && to.deleted_across() {
			return None;
		}
		Some(ReplaceStep::new(from.pos, from.pos.max(to.pos), self.slice.clone(), self.structure))
	}

	/// Merges two adjacent unstructured replacements.
	pub fn merge(&self, other: &ReplaceStep) -> Option<ReplaceStep> {
		if other.structure || self.structure {
			return None;
		}
		if self.from + self.slice.size() == other.from && self.slice.open_end == 0 && other.slice.open_start == 0 {
			let slice = if self.slice.size() + other.slice.size() == 0 {
				Slice::empty()
			} else {
				Slice::new(
					self.slice.content.append(&other.slice.content),
					self.slice.open_start,
					other.slice.open_end,
				)
			};
			Some(ReplaceStep::new(self.from, self.to + (other.to - other.from), slice, false))
		} else if other.to == self.from && self.slice.open_start == 0 && other.slice.open_end == 0 {
			let slice = if self.slice.size() + other.slice.size() == 0 {
				Slice::empty()
			} else {
				Slice::new(
					other.slice.content.append(&self.slice.content),
					other.slice.open_start,
					self.slice.open_end,
				)
			};
			Some(ReplaceStep::new(other.from, self.to, slice, false))
		} else {
			None
		}
	}

	pub(crate) fn write_json(&self, obj: &mut Map<String, Value>) {
		obj.insert("from".into(), self.from.into());
		obj.insert("to".into(), self.to.into());
		if self.slice.size() > 0 {
			obj.insert("slice".into(), self.slice.to_json());
		}
		if self.structure {
			obj.insert("structure".into(), true.into());
		}
	}

	pub fn from_json(schema: &Schema, json: &Value) -> Result<ReplaceStep> {
		let (Some(from), Some(to)) = (json_pos(json, "from"), json_pos(json, "to")) else {
			return Err(invalid("ReplaceStep"));
		};
		if from > to {
			return Err(invalid("ReplaceStep"));
		}
		let slice = Slice::from_json(schema, json.get("slice"))?;
		Ok(ReplaceStep::new(from, to, slice, structure_flag(json)))
	}
}

/// Replaces `from..to` with a slice, keeping the content of
/// `gap_from..gap_to` and reinserting it at `insert` inside the slice.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceAroundStep {
	pub from: usize,
	pub to: usize,
	pub gap_from: usize,
	pub gap_to: usize,
	pub slice: Slice,
	pub insert: usize,
	pub structure: bool,
}

impl ReplaceAroundStep {
	pub fn new(
		from: usize,
		to: usize,
		gap_from: usize,
		gap_to: usize,
		slice: Slice,
		insert: usize,
		structure: bool,
	) -> Self {
		Self { from, to, gap_from, gap_to, slice, insert, structure }
	}

	pub fn apply(&self, doc: &Node) -> StepResult {
		if self.structure
			&& (content_between(doc, self.from, self.gap_from)? || content_between(doc, self.gap_to, self.to)?)
		{
			return Err(StepError::new("Structure gap-replace would overwrite content"));
		}
		let gap = doc.slice(self.gap_from, self.gap_to, false)?;
		if gap.open_start > 0 || gap.open_end > 0 {
			return Err(StepError::new("Gap is not a flat range"));
		}
		let Some(inserted) = self.slice.insert_at(self.insert, &gap.content) else {
			return Err(StepError::new("Content does not fit in gap"));
		};
		apply_replace(doc, self.from, self.to, &inserted)
	}

	pub fn get_map(&self) -> StepMap {
		StepMap::new(&[
			self.from,
			self.gap_from - self.from,
			self.insert,
			self.gap_to,
			self.to - self.gap_to,
			self.slice.size() - self.insert,
		])
	}

	pub fn invert(&self, doc: &Node) -> quire_model::Result<ReplaceAroundStep> {
		let gap = self.gap_to - self.gap_from;
		let slice = doc
			.slice(self.from, self.to, false)?
			.remove_between(self.gap_from - self.from, self.gap_to - self.from)?;
		Ok(ReplaceAroundStep::new(
			self.from,
			self.from + self.slice.size() + gap,
			self.from + self.insert,
			self.from + self.insert + gap,
			slice,
			self.gap_from - self.from,
			self.structure,
		))
	}

	pub fn map(&self, mapping: &dyn Mappable) -> Option<ReplaceAroundStep> {
		let from = mapping.map_result(self.from, Bias::Right);
		let to = mapping.map_result(self.to, Bias::Left);
		let gap_from = if self.from == self.gap_from { from.pos } else { mapping.map(self.gap_from, Bias::Left) };
		let gap_to = if self.to == self.gap_to { to.pos } else { mapping.map(self.gap_to, Bias::Right) };
		if (from.deleted_across() && to.deleted_across()) || gap_from < from.pos || gap_to > to.pos {
			return None;
		}
		Some(ReplaceAroundStep::new(
			from.pos,
			to.pos,
			gap_from,
			gap_to,
			self.slice.clone(),
			self.insert,
			self.structure,
		))
	}

	pub(crate) fn write_json(&self, obj: &mut Map<String, Value>) {
		obj.insert("from".into(), self.from.into());
		obj.insert("to".into(), self.to.into());
		obj.insert("gapFrom".into(), self.gap_from.into());
		obj.insert("gapTo".into(), self.gap_to.into());
		obj.insert("insert".into(), self.insert.into());
		if self.slice.size() > 0 {
			obj.insert("slice".into(), self.slice.to_json());
		}
		if self.structure {
			obj.insert("structure".into(), true.into());
		}
	}

	pub fn from_json(schema: &Schema, json: &Value) -> Result<ReplaceAroundStep> {
		let fields = ["from", "to", "gapFrom", "gapTo", "insert"].map(|key| json_pos(json, key));
		let [Some(from), Some(to), Some(gap_from), Some(gap_to), Some(insert)] = fields else {
			return Err(invalid("ReplaceAroundStep"));
		};
		if !(from <= gap_from && gap_from <= gap_to && gap_to <= to) {
			return Err(invalid("ReplaceAroundStep"));
		}
		let slice = Slice::from_json(schema, json.get("slice"))?;
		if insert > slice.size() {
			return Err(invalid("ReplaceAroundStep"));
		}
		Ok(ReplaceAroundStep::new(from, to, gap_from, gap_to, slice, insert, structure_flag(json)))
	}
}

fn structure_flag(json: &Value) -> bool {
	json.get("structure").and_then(Value::as_bool).unwrap_or(false)
}

/// Whether `from..to` covers anything besides the closing and opening
/// tokens of nodes.
fn content_between(doc: &Node, from: usize, to: usize) -> std::result::Result<bool, StepError> {
	let rfrom = doc.resolve(from)?;
	let mut dist = to - from;
	let mut depth = rfrom.depth();
	while dist > 0 && depth > 0 && rfrom.index_after(depth) == rfrom.node(depth).child_count() {
		depth -= 1;
		dist -= 1;
	}
	if dist > 0 {
		let mut next = rfrom.node(depth).maybe_child(rfrom.index_after(depth)).cloned();
		while dist > 0 {
			match next {
				Some(node) if !node.is_leaf() => next = node.first_child().cloned(),
				_ => return Ok(true),
			}
			dist -= 1;
		}
	}
	Ok(false)
}
