//! Steps that add or remove marks on inline content or single nodes.

use quire_model::{Fragment, Mark, Node, Schema, Slice};
use serde_json::{Map, Value};

use crate::error::{Result, StepError, StepResult};
use crate::map::{Bias, Mappable};
use crate::step::{Step, apply_replace, invalid, json_pos};

/// Rebuilds a fragment, passing every inline node (with its parent) through
/// `f`.
fn map_fragment(fragment: &Fragment, f: &mut dyn FnMut(&Node, &Node) -> Node, parent: &Node) -> Fragment {
	let mut mapped = Vec::with_capacity(fragment.child_count());
	for child in fragment.iter() {
		let mut child = child.clone();
		if child.content().size() > 0 {
			let content = map_fragment(child.content(), f, &child);
			child = child.copy(content);
		}
		if child.is_inline() {
			child = f(&child, parent);
		}
		mapped.push(child);
	}
	Fragment::from_vec(mapped)
}

fn write_range(obj: &mut Map<String, Value>, mark: &Mark, from: usize, to: usize) {
	obj.insert("mark".into(), mark.to_json());
	obj.insert("from".into(), from.into());
	obj.insert("to".into(), to.into());
}

fn read_range(schema: &Schema, json: &Value, name: &str) -> Result<(usize, usize, Mark)> {
	let (Some(from), Some(to)) = (json_pos(json, "from"), json_pos(json, "to")) else {
		return Err(invalid(name));
	};
	let mark = schema.mark_from_json(json.get("mark").ok_or_else(|| invalid(name))?)?;
	Ok((from, to, mark))
}

/// Adds a mark to all inline content between two positions.
#[derive(Debug, Clone, PartialEq)]
pub struct AddMarkStep {
	pub from: usize,
	pub to: usize,
	pub mark: Mark,
}

impl AddMarkStep {
	pub fn new(from: usize, to: usize, mark: Mark) -> Self {
		Self { from, to, mark }
	}

	pub fn apply(&self, doc: &Node) -> StepResult {
		let old = doc.slice(self.from, self.to, false)?;
		let rfrom = doc.resolve(self.from)?;
		let parent = rfrom.node(rfrom.shared_depth(self.to)).clone();
		let content = map_fragment(
			&old.content,
			&mut |node, parent| {
				if !node.is_atom() || !parent.node_type().allows_mark_type(self.mark.mark_type()) {
					return node.clone();
				}
				node.mark(self.mark.add_to_set(node.marks()))
			},
			&parent,
		);
		apply_replace(doc, self.from, self.to, &Slice::new(content, old.open_start, old.open_end))
	}

	pub fn invert(&self) -> RemoveMarkStep {
		RemoveMarkStep::new(self.from, self.to, self.mark.clone())
	}

	pub fn map(&self, mapping: &dyn Mappable) -> Option<AddMarkStep> {
		let from = mapping.map_result(self.from, Bias::Right);
		let to = mapping.map_result(self.to, Bias::Left);
		if (from.deleted() && to.deleted()) || from.pos >= to.pos {
			return None;
		}
		Some(AddMarkStep::new(from.pos, to.pos, self.mark.clone()))
	}

	/// Merges with an overlapping or adjacent step adding the same mark.
	pub fn merge(&self, other: &AddMarkStep) -> Option<AddMarkStep> {
		(other.mark == self.mark && self.from <= other.to && self.to >= other.from).then(|| {
			AddMarkStep::new(self.from.min(other.from), self.to.max(other.to), self.mark.clone())
		})
	}

	pub(crate) fn write_json(&self, obj: &mut Map<String, Value>) {
		write_range(obj, &self.mark, self.from, self.to);
	}

	pub fn from_json(schema: &Schema, json: &Value) -> Result<AddMarkStep> {
		let (from, to, mark) = read_range(schema, json, "AddMarkStep")?;
		Ok(AddMarkStep::new(from, to, mark))
	}
}

/// Removes a mark from all inline content between two positions.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveMarkStep {
	pub from: usize,
	pub to: usize,
	pub mark: Mark,
}

impl RemoveMarkStep {
	pub fn new(from: usize, to: usize, mark: Mark) -> Self {
		Self { from, to, mark }
	}

	pub fn apply(&self, doc: &Node) -> StepResult {
		let old = doc.slice(self.from, self.to, false)?;
		let content = map_fragment(
			&old.content,
			&mut |node, _| node.mark(self.mark.remove_from_set(node.marks())),
			doc,
		);
		apply_replace(doc, self.from, self.to, &Slice::new(content, old.open_start, old.open_end))
	}

	pub fn invert(&self) -> AddMarkStep {
		AddMarkStep::new(self.from, self.to, self.mark.clone())
	}

	pub fn map(&self, mapping: &dyn Mappable) -> Option<RemoveMarkStep> {
		let from = mapping.map_result(self.from, Bias::Right);
		let to = mapping.map_result(self.to, Bias::Left);
		if (from.deleted() && to.deleted()) || from.pos >= to.pos {
			return None;
		}
		Some(RemoveMarkStep::new(from.pos, to.pos, self.mark.clone()))
	}

	pub fn merge(&self, other: &RemoveMarkStep) -> Option<RemoveMarkStep> {
		(other.mark == self.mark && self.from <= other.to && self.to >= other.from).then(|| {
			RemoveMarkStep::new(self.from.min(other.from), self.to.max(other.to), self.mark.clone())
		})
	}

	pub(crate) fn write_json(&self, obj: &mut Map<String, Value>) {
		write_range(obj, &self.mark, self.from, self.to);
	}

	pub fn from_json(schema: &Schema, json: &Value) -> Result<RemoveMarkStep> {
		let (from, to, mark) = read_range(schema, json, "RemoveMarkStep")?;
		Ok(RemoveMarkStep::new(from, to, mark))
	}
}

/// Rebuilds the node at `pos` with a new mark set, replacing only its
/// opening token so the content stays untouched.
fn remark_node(doc: &Node, pos: usize, marks: impl FnOnce(&[Mark]) -> Vec<Mark>) -> StepResult {
	let Some(node) = doc.node_at(pos) else {
		return Err(StepError::new("No node at mark step's position"));
	};
	let updated = node.node_type().create(Some(node.attrs()), Fragment::empty(), marks(node.marks()))?;
	let open_end = if node.is_leaf() { 0 } else { 1 };
	apply_replace(doc, pos, pos + 1, &Slice::new(Fragment::from_node(updated), 0, open_end))
}

fn read_node_mark(schema: &Schema, json: &Value, name: &str) -> Result<(usize, Mark)> {
	let Some(pos) = json_pos(json, "pos") else {
		return Err(invalid(name));
	};
	let mark = schema.mark_from_json(json.get("mark").ok_or_else(|| invalid(name))?)?;
	Ok((pos, mark))
}

/// Adds a mark to the node at a position.
#[derive(Debug, Clone, PartialEq)]
pub struct AddNodeMarkStep {
	pub pos: usize,
	pub mark: Mark,
}

impl AddNodeMarkStep {
	pub fn new(pos: usize, mark: Mark) -> Self {
		Self { pos, mark }
	}

	pub fn apply(&self, doc: &Node) -> StepResult {
		remark_node(doc, self.pos, |marks| self.mark.add_to_set(marks))
	}

	/// When adding the mark displaced another mark of an exclusive type,
	/// the inverse puts that mark back instead of removing this one.
	pub fn invert(&self, doc: &Node) -> Step {
		if let Some(node) = doc.node_at(self.pos) {
			let new_set = self.mark.add_to_set(node.marks());
			if new_set.len() == node.marks().len() {
				let displaced = node.marks().iter().find(|m| !m.is_in_set(&new_set));
				let mark = displaced.unwrap_or(&self.mark).clone();
				return Step::AddNodeMark(AddNodeMarkStep::new(self.pos, mark));
			}
		}
		Step::RemoveNodeMark(RemoveNodeMarkStep::new(self.pos, self.mark.clone()))
	}

	pub fn map(&self, mapping: &dyn Mappable) -> Option<AddNodeMarkStep> {
		let pos = mapping.map_result(self.pos, Bias::Right);
		(!pos.deleted_after()).then(|| AddNodeMarkStep::new(pos.pos, self.mark.clone()))
	}

	pub(crate) fn write_json(&self, obj: &mut Map<String, Value>) {
		obj.insert("pos".into(), self.pos.into());
		obj.insert("mark".into(), self.mark.to_json());
	}

	pub fn from_json(schema: &Schema, json: &Value) -> Result<AddNodeMarkStep> {
		let (pos, mark) = read_node_mark(schema, json, "AddNodeMarkStep")?;
		Ok(AddNodeMarkStep::new(pos, mark))
	}
}

/// Removes a mark from the node at a position.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveNodeMarkStep {
	pub pos: usize,
	pub mark: Mark,
}

impl RemoveNodeMarkStep {
	pub fn new(pos: usize, mark: Mark) -> Self {
		Self { pos, mark }
	}

	pub fn apply(&self, doc: &Node) -> StepResult {
		remark_node(doc, self.pos, |marks| self.mark.remove_from_set(marks))
	}

	pub fn invert(&self, doc: &Node) -> Step {
		match doc.node_at(self.pos) {
			Some(node) if self.mark.is_in_set(node.marks()) => {
				Step::AddNodeMark(AddNodeMarkStep::new(self.pos, self.mark.clone()))
			}
			_ => Step::RemoveNodeMark(self.clone()),
		}
	}

	pub fn map(&self, mapping: &dyn Mappable) -> Option<RemoveNodeMarkStep> {
		let pos = mapping.map_result(self.pos, Bias::Right);
		(!pos.deleted_after()).then(|| RemoveNodeMarkStep::new(pos.pos, self.mark.clone()))
	}

	pub(crate) fn write_json(&self, obj: &mut Map<String, Value>) {
		obj.insert("pos".into(), self.pos.into());
		obj.insert("mark".into(), self.mark.to_json());
	}

	pub fn from_json(schema: &Schema, json: &Value) -> Result<RemoveNodeMarkStep> {
		let (pos, mark) = read_node_mark(schema, json, "RemoveNodeMarkStep")?;
		Ok(RemoveNodeMarkStep::new(pos, mark))
	}
}
