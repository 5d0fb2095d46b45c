//! A persistent sequence with cheap append and slice.
//!
//! Short sequences are stored flat. Longer ones become a tree of
//! concatenations whose leaves are flat chunks, shared between every
//! sequence that was sliced or appended from them.

use std::fmt;
use std::convert::Infallible;
use std::ops::ControlFlow;
use std::sync::Arc;


/// Sequences shorter than this are merged into flat leaves on append.
pub const GOOD_LEAF_SIZE: usize = 200;

enum Repr<T> {
	Leaf(Vec<T>),
	Append { left: RopeSequence<T>, right: RopeSequence<T>, len: usize, depth: usize },
}

/// An immutable sequence with structural sharing.
pub struct RopeSequence<T> {
	repr: Arc<Repr<T>>,
}

impl<T> Clone for RopeSequence<T> {
	fn clone(&self) -> Self {
		Self { repr: Arc::clone(&self.repr) }
	}
}

impl<T: Clone> Default for RopeSequence<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Clone> RopeSequence<T> {
	/// The empty sequence.
	pub fn new() -> Self {
		Self::from_vec(Vec::new())
	}

	/// A flat sequence holding `values`.
	pub fn from_vec(values: Vec<T>) -> Self {
		Self { repr: Arc::new(Repr::Leaf(values)) }
	}

	fn concat(left: Self, right: Self) -> Self {
		let len = left.len() + right.len();
		let depth = left.depth().max(right.depth()) + 1;
		Self { repr: Arc::new(Repr::Append { left, right, len, depth }) }
	}

	pub fn len(&self) -> usize {
		match &*self.repr {
			Repr::Leaf(values) => values.len(),
			Repr::Append { len, .. } => *len,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn depth(&self) -> usize {
		match &*self.repr {
			Repr::Leaf(_) => 0,
			Repr::Append { depth, .. } => *depth,
		}
	}

	/// The element at `index`.
	pub fn get(&self, index: usize) -> Option<&T> {
		if index >= self.len() {
			return None;
		}
		let mut node = self;
		let mut index = index;
		loop {
			match &*node.repr {
				Repr::Leaf(values) => return values.get(index),
				Repr::Append { left, right, .. } => {
					if index < left.len() {
						node = left;
					} else {
						index -= left.len();
						node = right;
					}
				}
			}
		}
	}

	/// This sequence followed by `other`.
	pub fn append(&self, other: &Self) -> Self {
		if other.is_empty() {
			return self.clone();
		}
		if self.is_empty() {
			return other.clone();
		}
		if other.len() < GOOD_LEAF_SIZE
			&& let Some(joined) = self.leaf_append(other)
		{
			return joined;
		}
		if self.len() < GOOD_LEAF_SIZE
			&& let Some(joined) = other.leaf_prepend(self)
		{
			return joined;
		}
		self.append_inner(other)
	}

	/// Appends plain values.
	pub fn append_vec(&self, values: Vec<T>) -> Self {
		self.append(&Self::from_vec(values))
	}

	/// `other` followed by this sequence.
	pub fn prepend(&self, other: &Self) -> Self {
		other.append(self)
	}

	fn leaf_append(&self, other: &Self) -> Option<Self> {
		match &*self.repr {
			Repr::Leaf(values) => (values.len() + other.len() <= GOOD_LEAF_SIZE).then(|| {
				let mut joined = values.clone();
				joined.extend(other.to_vec());
				Self::from_vec(joined)
			}),
			Repr::Append { left, right, .. } => {
				let inner = right.leaf_append(other)?;
				Some(Self::concat(left.clone(), inner))
			}
		}
	}

	fn leaf_prepend(&self, other: &Self) -> Option<Self> {
		match &*self.repr {
			Repr::Leaf(values) => (values.len() + other.len() <= GOOD_LEAF_SIZE).then(|| {
				let mut joined = other.to_vec();
				joined.extend(values.iter().cloned());
				Self::from_vec(joined)
			}),
			Repr::Append { left, right, .. } => {
				let inner = left.leaf_prepend(other)?;
				Some(Self::concat(inner, right.clone()))
			}
		}
	}

	fn append_inner(&self, other: &Self) -> Self {
		if let Repr::Append { left, right, .. } = &*self.repr
			&& left.depth() >= right.depth().max(other.depth()) + 1
		{
			return Self::concat(left.clone(), Self::concat(right.clone(), other.clone()));
		}
		Self::concat(self.clone(), other.clone())
	}

	/// The elements `from..to`, clamped to the sequence.
	pub fn slice(&self, from: usize, to: usize) -> Self {
		let to = to.min(self.len());
		if from >= to {
			return Self::new();
		}
		if from == 0 && to == self.len() {
			return self.clone();
		}
		match &*self.repr {
			Repr::Leaf(values) => Self::from_vec(values[from..to].to_vec()),
			Repr::Append { left, right, .. } => {
				let left_len = left.len();
				if to <= left_len {
					left.slice(from, to)
				} else if from >= left_len {
					right.slice(from - left_len, to - left_len)
				} else {
					left.slice(from, left_len).append(&right.slice(0, to - left_len))
				}
			}
		}
	}

	/// The elements from `from` to the end.
	pub fn slice_from(&self, from: usize) -> Self {
		self.slice(from, self.len())
	}

	/// Calls `f` with each element in `from..to` and its index, in order,
	/// until it breaks.
	pub fn for_each<B>(&self, from: usize, to: usize, mut f: impl FnMut(&T, usize) -> ControlFlow<B>) -> ControlFlow<B> {
		let to = to.min(self.len());
		if from >= to {
			return ControlFlow::Continue(());
		}
		self.for_each_inner(&mut f, from, to, 0)
	}

	fn for_each_inner<B>(
		&self,
		f: &mut impl FnMut(&T, usize) -> ControlFlow<B>,
		from: usize,
		to: usize,
		start: usize,
	) -> ControlFlow<B> {
		match &*self.repr {
			Repr::Leaf(values) => {
				for (i, value) in values[from..to].iter().enumerate() {
					f(value, start + from + i)?;
				}
			}
			Repr::Append { left, right, .. } => {
				let left_len = left.len();
				if from < left_len {
					left.for_each_inner(f, from, to.min(left_len), start)?;
				}
				if to > left_len {
					right.for_each_inner(f, from.max(left_len) - left_len, to - left_len, start + left_len)?;
				}
			}
		}
		ControlFlow::Continue(())
	}

	/// Calls `f` with each element in `from..to` and its index, last
	/// element first, until it breaks.
	pub fn for_each_reverse<B>(
		&self,
		from: usize,
		to: usize,
		mut f: impl FnMut(&T, usize) -> ControlFlow<B>,
	) -> ControlFlow<B> {
		let to = to.min(self.len());
		if from >= to {
			return ControlFlow::Continue(());
		}
		self.for_each_reverse_inner(&mut f, from, to, 0)
	}

	fn for_each_reverse_inner<B>(
		&self,
		f: &mut impl FnMut(&T, usize) -> ControlFlow<B>,
		from: usize,
		to: usize,
		start: usize,
	) -> ControlFlow<B> {
		match &*self.repr {
			Repr::Leaf(values) => {
				for (i, value) in values[from..to].iter().enumerate().rev() {
					f(value, start + from + i)?;
				}
			}
			Repr::Append { left, right, .. } => {
				let left_len = left.len();
				if to > left_len {
					right.for_each_reverse_inner(f, from.max(left_len) - left_len, to - left_len, start + left_len)?;
				}
				if from < left_len {
					left.for_each_reverse_inner(f, from, to.min(left_len), start)?;
				}
			}
		}
		ControlFlow::Continue(())
	}

	/// Calls `f` with every element in `from..to` and its index, in order.
	pub fn visit(&self, from: usize, to: usize, mut f: impl FnMut(&T, usize)) {
		let ControlFlow::Continue(()) = self.for_each(from, to, |value, i| {
			f(value, i);
			ControlFlow::<Infallible>::Continue(())
		});
	}

	/// Like [`visit`](Self::visit), last element first.
	pub fn visit_reverse(&self, from: usize, to: usize, mut f: impl FnMut(&T, usize)) {
		let ControlFlow::Continue(()) = self.for_each_reverse(from, to, |value, i| {
			f(value, i);
			ControlFlow::<Infallible>::Continue(())
		});
	}

	/// Maps the elements in `from..to` into a vector.
	pub fn map<U>(&self, from: usize, to: usize, mut f: impl FnMut(&T, usize) -> U) -> Vec<U> {
		let mut result = Vec::with_capacity(to.min(self.len()).saturating_sub(from));
		self.visit(from, to, |value, i| result.push(f(value, i)));
		result
	}

	/// All elements as a flat vector.
	pub fn to_vec(&self) -> Vec<T> {
		self.map(0, self.len(), |value, _| value.clone())
	}
}

impl<T: Clone> From<Vec<T>> for RopeSequence<T> {
	fn from(values: Vec<T>) -> Self {
		Self::from_vec(values)
	}
}

impl<T: Clone + fmt::Debug> fmt::Debug for RopeSequence<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.to_vec()).finish()
	}
}
