//! Accumulating builder of steps.

use std::mem;

use quire_model::{Fragment, Node, Slice};
use serde_json::Value;

use crate::attr_step::{AttrStep, DocAttrStep};
use crate::error::{Result, StepResult};
use crate::map::Mapping;
use crate::replace::replace_step;
use crate::step::Step;

/// Applies a sequence of steps to a document, keeping the intermediate
/// documents and the combined position mapping.
///
/// Every builder method either appends steps and returns `self` for
/// chaining, or returns an error and leaves the already-recorded steps in
/// place.
#[derive(Debug, Clone)]
pub struct Transform {
	doc: Node,
	steps: Vec<Step>,
	docs: Vec<Node>,
	mapping: Mapping,
}

impl Transform {
	pub fn new(doc: Node) -> Self {
		Self { doc, steps: Vec::new(), docs: Vec::new(), mapping: Mapping::new() }
	}

	/// The current document.
	pub fn doc(&self) -> &Node {
		&self.doc
	}

	pub fn steps(&self) -> &[Step] {
		&self.steps
	}

	/// The document before each step.
	pub fn docs(&self) -> &[Node] {
		&self.docs
	}

	/// Maps positions in the starting document to the current one.
	pub fn mapping(&self) -> &Mapping {
		&self.mapping
	}

	/// The document the transform started from.
	pub fn before(&self) -> &Node {
		self.docs.first().unwrap_or(&self.doc)
	}

	/// Whether any step was applied.
	pub fn doc_changed(&self) -> bool {
		!self.steps.is_empty()
	}

	/// Applies a step, failing when it does not apply.
	pub fn step(&mut self, step: impl Into<Step>) -> Result<&mut Self> {
		self.maybe_step(step.into())?;
		Ok(self)
	}

	/// Applies a step and reports the outcome. Failed steps are not
	/// recorded.
	pub fn maybe_step(&mut self, step: Step) -> StepResult {
		let doc = step.apply(&self.doc)?;
		self.add_step(step, doc.clone());
		Ok(doc)
	}

	/// Records a step whose result is already known.
	pub fn add_step(&mut self, step: Step, doc: Node) {
		self.docs.push(mem::replace(&mut self.doc, doc));
		self.mapping.append_map(step.get_map(), None);
		self.steps.push(step);
	}

	/// Records that step `m` exactly undoes step `n`, so positions mapped
	/// through both come back unchanged.
	pub fn set_mirror(&mut self, n: usize, m: usize) {
		self.mapping.set_mirror(n, m);
	}

	/// Replaces `from..to` with a slice, fitting it into the surrounding
	/// structure. Adds nothing when the slice cannot be placed.
	pub fn replace(&mut self, from: usize, to: usize, slice: Slice) -> Result<&mut Self> {
		if let Some(step) = replace_step(&self.doc, from, to, &slice)? {
			self.step(step)?;
		}
		Ok(self)
	}

	/// Replaces `from..to` with the given content.
	pub fn replace_with(&mut self, from: usize, to: usize, content: impl Into<Fragment>) -> Result<&mut Self> {
		self.replace(from, to, Slice::closed(content.into()))
	}

	pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self> {
		self.replace(from, to, Slice::empty())
	}

	pub fn insert(&mut self, pos: usize, content: impl Into<Fragment>) -> Result<&mut Self> {
		self.replace_with(pos, pos, content)
	}

	/// Sets one attribute of the node at `pos`.
	pub fn set_node_attribute(&mut self, pos: usize, attr: &str, value: Value) -> Result<&mut Self> {
		self.step(AttrStep::new(pos, attr, value))
	}

	/// Sets one attribute of the document node.
	pub fn set_doc_attribute(&mut self, attr: &str, value: Value) -> Result<&mut Self> {
		self.step(DocAttrStep::new(attr, value))
	}
}
