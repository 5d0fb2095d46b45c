use std::fmt;

use serde_json::{Map, Value};

use crate::error::{ModelError, Result};
use crate::schema::{Attrs, MarkType, Schema};

/// A piece of inline styling (emphasis, a link, ...) attached to a node.
///
/// Mark sets are plain vectors kept sorted by [`MarkType::rank`].
#[derive(Clone)]
pub struct Mark {
	mark_type: MarkType,
	attrs: Attrs,
}

impl Mark {
	pub(crate) fn new(mark_type: MarkType, attrs: Attrs) -> Self {
		Self { mark_type, attrs }
	}

	/// The mark's type.
	pub fn mark_type(&self) -> &MarkType {
		&self.mark_type
	}

	/// The mark's attributes.
	pub fn attrs(&self) -> &Attrs {
		&self.attrs
	}

	/// Adds this mark to a set, honouring exclusions and rank order.
	pub fn add_to_set(&self, set: &[Mark]) -> Vec<Mark> {
		let mut copy: Option<Vec<Mark>> = None;
		let mut placed = false;
		for (i, other) in set.iter().enumerate() {
			if self == other {
				return set.to_vec();
			}
			if self.mark_type.excludes(&other.mark_type) {
				if copy.is_none() {
					copy = Some(set[..i].to_vec());
				}
			} else if other.mark_type.excludes(&self.mark_type) {
				return set.to_vec();
			} else {
				if !placed && other.mark_type.rank() > self.mark_type.rank() {
					let c = copy.get_or_insert_with(|| set[..i].to_vec());
					c.push(self.clone());
					placed = true;
				}
				if let Some(c) = copy.as_mut() {
					c.push(other.clone());
				}
			}
		}
		let mut copy = copy.unwrap_or_else(|| set.to_vec());
		if !placed {
			copy.push(self.clone());
		}
		copy
	}

	/// Removes this mark from a set.
	pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
		match set.iter().position(|m| m == self) {
			Some(i) => set[..i].iter().chain(&set[i + 1..]).cloned().collect(),
			None => set.to_vec(),
		}
	}

	/// Whether this mark is part of the set.
	pub fn is_in_set(&self, set: &[Mark]) -> bool {
		set.iter().any(|m| m == self)
	}

	/// Compares two mark sets.
	pub fn same_set(a: &[Mark], b: &[Mark]) -> bool {
		a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
	}

	/// Builds a sorted mark set from arbitrary marks.
	pub fn set_from(marks: Vec<Mark>) -> Vec<Mark> {
		if marks.len() < 2 {
			return marks;
		}
		let mut marks = marks;
		marks.sort_by_key(|m| m.mark_type.rank());
		marks
	}

	/// Serializes the mark as `{type, attrs?}`.
	pub fn to_json(&self) -> Value {
		let mut obj = Map::new();
		obj.insert("type".into(), Value::String(self.mark_type.name().to_string()));
		if !self.attrs.is_empty() {
			obj.insert("attrs".into(), Value::Object(self.attrs.clone().into_iter().collect()));
		}
		Value::Object(obj)
	}

	/// Deserializes a mark.
	pub fn from_json(schema: &Schema, json: &Value) -> Result<Mark> {
		let name = json
			.get("type")
			.and_then(Value::as_str)
			.ok_or_else(|| ModelError::Json("Invalid input for Mark.fromJSON".to_string()))?;
		let mark_type = schema.expect_mark_type(name)?;
		let attrs = attrs_from_json(json.get("attrs"))?;
		let mark = mark_type.create(attrs.as_ref())?;
		mark_type.check_attrs(mark.attrs())?;
		Ok(mark)
	}
}

pub(crate) fn attrs_from_json(value: Option<&Value>) -> Result<Option<Attrs>> {
	match value {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Object(map)) => Ok(Some(map.clone().into_iter().collect())),
		Some(_) => Err(ModelError::Json("Attributes must be an object".to_string())),
	}
}

impl PartialEq for Mark {
	fn eq(&self, other: &Self) -> bool {
		self.mark_type == other.mark_type && self.attrs == other.attrs
	}
}

impl Eq for Mark {}

impl fmt::Debug for Mark {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.attrs.is_empty() {
			write!(f, "{}", self.mark_type.name())
		} else {
			write!(f, "{}{}", self.mark_type.name(), Value::Object(self.attrs.clone().into_iter().collect()))
		}
	}
}
