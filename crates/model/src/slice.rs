use std::fmt;

use serde_json::{Map, Value};

use crate::error::{ModelError, Result};
use crate::{Fragment, Node, Schema};

/// A piece of a document: a fragment plus the number of ancestor levels
/// left open at each side.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Slice {
	/// The slice's content.
	pub content: Fragment,
	/// Open depth at the start.
	pub open_start: usize,
	/// Open depth at the end.
	pub open_end: usize,
}

impl Slice {
	/// Creates a slice.
	pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Self {
		Self { content, open_start, open_end }
	}

	/// The empty slice.
	pub fn empty() -> Self {
		Self::default()
	}

	/// A closed slice around a fragment.
	pub fn closed(content: Fragment) -> Self {
		Self::new(content, 0, 0)
	}

	/// Tokens this slice adds when inserted.
	pub fn size(&self) -> usize {
		self.content.size() - self.open_start - self.open_end
	}

	/// Inserts a fragment at a position inside the slice, or `None` when
	/// the surrounding node cannot hold it.
	pub fn insert_at(&self, pos: usize, fragment: &Fragment) -> Option<Slice> {
		let content = insert_into(&self.content, pos + self.open_start, fragment, None)?;
		Some(Slice::new(content, self.open_start, self.open_end))
	}

	/// Removes a flat range from the slice.
	pub fn remove_between(&self, from: usize, to: usize) -> Result<Slice> {
		let content = remove_range(&self.content, from + self.open_start, to + self.open_start)?;
		Ok(Slice::new(content, self.open_start, self.open_end))
	}

	/// The slice of a fragment opened as deeply as its edges allow.
	pub fn max_open(fragment: Fragment, open_isolating: bool) -> Slice {
		let mut open_start = 0;
		let mut cur = fragment.first_child().cloned();
		while let Some(n) = cur.filter(|n| !n.is_leaf() && (open_isolating || !n.node_type().is_isolating())) {
			open_start += 1;
			cur = n.first_child().cloned();
		}
		let mut open_end = 0;
		let mut cur = fragment.last_child().cloned();
		while let Some(n) = cur.filter(|n| !n.is_leaf() && (open_isolating || !n.node_type().is_isolating())) {
			open_end += 1;
			cur = n.last_child().cloned();
		}
		Slice::new(fragment, open_start, open_end)
	}

	/// Serializes the slice, `null` when empty.
	pub fn to_json(&self) -> Value {
		if self.content.size() == 0 {
			return Value::Null;
		}
		let mut obj = Map::new();
		obj.insert("content".into(), self.content.to_json());
		if self.open_start > 0 {
			obj.insert("openStart".into(), Value::from(self.open_start));
		}
		if self.open_end > 0 {
			obj.insert("openEnd".into(), Value::from(self.open_end));
		}
		Value::Object(obj)
	}

	/// Deserializes a slice; `null` or absent input gives the empty slice.
	pub fn from_json(schema: &Schema, json: Option<&Value>) -> Result<Slice> {
		let Some(json) = json.filter(|j| !j.is_null()) else {
			return Ok(Slice::empty());
		};
		let open = |key: &str| -> Result<usize> {
			match json.get(key) {
				None | Some(Value::Null) => Ok(0),
				Some(v) => v
					.as_u64()
					.map(|n| n as usize)
					.ok_or_else(|| ModelError::Json("Invalid input for Slice.fromJSON".to_string())),
			}
		};
		Ok(Slice::new(Fragment::from_json(schema, json.get("content"))?, open("openStart")?, open("openEnd")?))
	}
}

fn remove_range(content: &Fragment, from: usize, to: usize) -> Result<Fragment> {
	let start = content.find_index(from, -1)?;
	let child = content.maybe_child(start.index);
	let end = content.find_index(to, -1)?;
	if start.offset == from || child.is_some_and(Node::is_text) {
		if end.offset != to && !content.child(end.index).is_text() {
			return Err(ModelError::Range("Removing non-flat range".to_string()));
		}
		return Ok(content.cut(0, from).append(&content.cut_from(to)));
	}
	let Some(child) = child else {
		return Err(ModelError::Range("Removing non-flat range".to_string()));
	};
	if start.index != end.index {
		return Err(ModelError::Range("Removing non-flat range".to_string()));
	}
	let inner = remove_range(child.content(), from - start.offset - 1, to - start.offset - 1)?;
	Ok(content.replace_child(start.index, child.copy(inner)))
}

fn insert_into(content: &Fragment, dist: usize, insert: &Fragment, parent: Option<&Node>) -> Option<Fragment> {
	let info = content.find_index(dist, -1).ok()?;
	let child = content.maybe_child(info.index);
	if info.offset == dist || child.is_some_and(Node::is_text) {
		if parent.is_some_and(|p| !p.can_replace_fragment(info.index, info.index, insert)) {
			return None;
		}
		return Some(content.cut(0, dist).append(insert).append(&content.cut_from(dist)));
	}
	let child = child?;
	let inner = insert_into(child.content(), dist - info.offset - 1, insert, Some(child))?;
	Some(content.replace_child(info.index, child.copy(inner)))
}

impl fmt::Display for Slice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}({},{})", self.content, self.open_start, self.open_end)
	}
}

impl fmt::Debug for Slice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}
