//! Position mapping through document changes.
//!
//! A [`StepMap`] describes the ranges replaced by a single step. A
//! [`Mapping`] chains step maps and records which of them mirror each
//! other, so positions can travel through an undo/redo pair without
//! losing their exact location.

use std::fmt;

use bitflags::bitflags;
use smallvec::SmallVec;


/// Which side of a replaced range a position prefers.
///
/// At the edge of an insertion, [`Bias::Left`] keeps the position before
/// the inserted content and [`Bias::Right`] moves it after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bias {
	/// Stick to the content before the position.
	Left,
	/// Stick to the content after the position.
	#[default]
	Right,
}

impl Bias {
	/// The opposite bias.
	pub fn flip(self) -> Self {
		match self {
			Self::Left => Self::Right,
			Self::Right => Self::Left,
		}
	}

	/// `-1` or `1`, for code that combines biases numerically.
	pub fn sign(self) -> i32 {
		match self {
			Self::Left => -1,
			Self::Right => 1,
		}
	}
}

bitflags! {
	/// Which parts of the surroundings of a mapped position were deleted.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct DelFlags: u8 {
		/// Content directly before the position was deleted.
		const BEFORE = 1 << 0;
		/// Content directly after the position was deleted.
		const AFTER = 1 << 1;
		/// The position sat strictly inside a replaced range.
		const ACROSS = 1 << 2;
		/// The side the position is biased towards was deleted.
		const SIDE = 1 << 3;
	}
}

/// Locates a position inside a replaced range so that a mirroring map can
/// restore it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Recover {
	/// Index of the range within its step map.
	pub index: usize,
	/// Offset of the position from the start of the range.
	pub offset: usize,
}

/// The result of mapping one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
	/// The mapped position.
	pub pos: usize,
	/// Deletion information.
	pub del: DelFlags,
	/// Recovery token, set when the position was inside a replaced range.
	pub recover: Option<Recover>,
}

impl MapResult {
	fn new(pos: usize, del: DelFlags, recover: Option<Recover>) -> Self {
		Self { pos, del, recover }
	}

	/// Whether the content on the biased side of the position was deleted.
	pub fn deleted(&self) -> bool {
		self.del.contains(DelFlags::SIDE)
	}

	/// Whether the token before the position was deleted.
	pub fn deleted_before(&self) -> bool {
		self.del.intersects(DelFlags::BEFORE | DelFlags::ACROSS)
	}

	/// Whether the token after the position was deleted.
	pub fn deleted_after(&self) -> bool {
		self.del.intersects(DelFlags::AFTER | DelFlags::ACROSS)
	}

	/// Whether the position was inside a deleted range.
	pub fn deleted_across(&self) -> bool {
		self.del.contains(DelFlags::ACROSS)
	}
}

/// Anything positions can be mapped through.
pub trait Mappable {
	/// Maps a position.
	fn map(&self, pos: usize, bias: Bias) -> usize;

	/// Maps a position and reports what was deleted around it.
	fn map_result(&self, pos: usize, bias: Bias) -> MapResult;
}

/// Ranges replaced by one step, as `(start, old_size, new_size)` triples
/// in ascending order.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StepMap {
	ranges: SmallVec<[usize; 6]>,
	inverted: bool,
}

impl StepMap {
	/// Creates a map from flat `start, old_size, new_size` triples.
	pub fn new(ranges: &[usize]) -> Self {
		debug_assert!(ranges.len() % 3 == 0, "step map ranges come in triples");
		Self { ranges: SmallVec::from_slice(ranges), inverted: false }
	}

	/// The identity map.
	pub fn empty() -> Self {
		Self::default()
	}

	/// A map that shifts every position by `n`.
	pub fn offset(n: isize) -> Self {
		match n {
			0 => Self::empty(),
			n if n < 0 => Self::new(&[0, n.unsigned_abs(), 0]),
			n => Self::new(&[0, 0, n.unsigned_abs()]),
		}
	}

	/// Whether this map leaves every position in place.
	pub fn is_empty(&self) -> bool {
		self.ranges.is_empty()
	}

	fn sizes(&self) -> (usize, usize) {
		if self.inverted { (2, 1) } else { (1, 2) }
	}

	/// Restores a position from a recovery token produced by the map this
	/// one mirrors.
	pub fn recover(&self, value: Recover) -> usize {
		let mut diff: isize = 0;
		if !self.inverted {
			for i in 0..value.index {
				diff += self.ranges[i * 3 + 2] as isize - self.ranges[i * 3 + 1] as isize;
			}
		}
		(self.ranges[value.index * 3] as isize + diff) as usize + value.offset
	}

	fn map_inner(&self, pos: usize, bias: Bias, simple: bool) -> MapResult {
		let mut diff: isize = 0;
		let (old_index, new_index) = self.sizes();
		for (i, range) in self.ranges.chunks_exact(3).enumerate() {
			let start = (range[0] as isize - if self.inverted { diff } else { 0 }) as usize;
			if start > pos {
				break;
			}
			let old_size = range[old_index];
			let new_size = range[new_index];
			let end = start + old_size;
			if pos <= end {
				let side = if old_size == 0 {
					bias
				} else if pos == start {
					Bias::Left
				} else if pos == end {
					Bias::Right
				} else {
					bias
				};
				let base = (start as isize + diff) as usize;
				let result = base + if side == Bias::Left { 0 } else { new_size };
				if simple {
					return MapResult::new(result, DelFlags::empty(), None);
				}
				let biased_edge = if bias == Bias::Left { start } else { end };
				let recover = (pos != biased_edge).then_some(Recover { index: i, offset: pos - start });
				let mut del = if pos == start {
					DelFlags::AFTER
				} else if pos == end {
					DelFlags::BEFORE
				} else {
					DelFlags::ACROSS
				};
				if pos != biased_edge {
					del |= DelFlags::SIDE;
				}
				return MapResult::new(result, del, recover);
			}
			diff += new_size as isize - old_size as isize;
		}
		MapResult::new((pos as isize + diff) as usize, DelFlags::empty(), None)
	}

	/// Whether `pos` falls inside the range identified by `recover`.
	pub fn touches(&self, pos: usize, recover: Recover) -> bool {
		let mut diff: isize = 0;
		let (old_index, new_index) = self.sizes();
		for (i, range) in self.ranges.chunks_exact(3).enumerate() {
			let start = (range[0] as isize - if self.inverted { diff } else { 0 }) as usize;
			if start > pos {
				break;
			}
			let old_size = range[old_index];
			if pos <= start + old_size && i == recover.index {
				return true;
			}
			diff += range[new_index] as isize - old_size as isize;
		}
		false
	}

	/// Calls `f(old_start, old_end, new_start, new_end)` for each replaced
	/// range.
	pub fn for_each(&self, mut f: impl FnMut(usize, usize, usize, usize)) {
		let (old_index, new_index) = self.sizes();
		let mut diff: isize = 0;
		for range in self.ranges.chunks_exact(3) {
			let start = range[0];
			let old_start = (start as isize - if self.inverted { diff } else { 0 }) as usize;
			let new_start = (start as isize + if self.inverted { 0 } else { diff }) as usize;
			let old_size = range[old_index];
			let new_size = range[new_index];
			f(old_start, old_start + old_size, new_start, new_start + new_size);
			diff += new_size as isize - old_size as isize;
		}
	}

	/// The inverse map. Shares the ranges with this one.
	pub fn invert(&self) -> StepMap {
		StepMap { ranges: self.ranges.clone(), inverted: !self.inverted }
	}
}

impl Mappable for StepMap {
	fn map(&self, pos: usize, bias: Bias) -> usize {
		self.map_inner(pos, bias, true).pos
	}

	fn map_result(&self, pos: usize, bias: Bias) -> MapResult {
		self.map_inner(pos, bias, false)
	}
}

impl fmt::Debug for StepMap {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.inverted {
			f.write_str("-")?;
		}
		f.debug_list().entries(self.ranges.iter()).finish()
	}
}

/// A sequence of step maps, optionally with mirror pairs: `(i, j)` says
/// map `j` is the exact inverse of map `i`.
#[derive(Clone, Default, Debug)]
pub struct Mapping {
	maps: Vec<StepMap>,
	mirror: Vec<(usize, usize)>,
	from: usize,
	to: usize,
}

impl Mapping {
	/// An empty mapping.
	pub fn new() -> Self {
		Self::default()
	}

	/// A mapping over the given maps.
	pub fn from_maps(maps: Vec<StepMap>) -> Self {
		let to = maps.len();
		Self { maps, mirror: Vec::new(), from: 0, to }
	}

	/// The maps in this mapping, restricted to its active range.
	pub fn maps(&self) -> &[StepMap] {
		&self.maps[self.from..self.to]
	}

	/// Start of the active range.
	pub fn from(&self) -> usize {
		self.from
	}

	/// End of the active range.
	pub fn to(&self) -> usize {
		self.to
	}

	/// A mapping over the maps `from..to` of this one. Mirror information
	/// is kept.
	pub fn slice(&self, from: usize, to: usize) -> Mapping {
		Mapping { maps: self.maps.clone(), mirror: self.mirror.clone(), from, to }
	}

	/// [`Mapping::slice`] from `from` to the end.
	pub fn slice_from(&self, from: usize) -> Mapping {
		self.slice(from, self.maps.len())
	}

	/// Appends a map, optionally marking it as the mirror of map `mirrors`.
	pub fn append_map(&mut self, map: StepMap, mirrors: Option<usize>) {
		self.maps.push(map);
		self.to = self.maps.len();
		if let Some(m) = mirrors {
			self.set_mirror(self.maps.len() - 1, m);
		}
	}

	/// Appends all maps of another mapping, preserving its mirrors.
	pub fn append_mapping(&mut self, mapping: &Mapping) {
		let start_size = self.maps.len();
		for (i, map) in mapping.maps.iter().enumerate() {
			let mirr = mapping.get_mirror(i).filter(|&m| m < i).map(|m| start_size + m);
			self.append_map(map.clone(), mirr);
		}
	}

	/// Appends the inverse of a mapping, last map first.
	pub fn append_mapping_inverted(&mut self, mapping: &Mapping) {
		let total_size = self.maps.len() + mapping.maps.len();
		for i in (0..mapping.maps.len()).rev() {
			let mirr = mapping.get_mirror(i).filter(|&m| m > i).map(|m| total_size - m - 1);
			self.append_map(mapping.maps[i].invert(), mirr);
		}
	}

	/// The mirror partner of map `n`, if any.
	pub fn get_mirror(&self, n: usize) -> Option<usize> {
		self.mirror.iter().find_map(|&(a, b)| {
			if a == n {
				Some(b)
			} else if b == n {
				Some(a)
			} else {
				None
			}
		})
	}

	/// Records that maps `n` and `m` are inverses of each other.
	pub fn set_mirror(&mut self, n: usize, m: usize) {
		self.mirror.push((n, m));
	}

	/// The inverse of this mapping.
	pub fn invert(&self) -> Mapping {
		let mut inverse = Mapping::new();
		inverse.append_mapping_inverted(self);
		inverse
	}

	fn map_inner(&self, mut pos: usize, bias: Bias, simple: bool) -> MapResult {
		let mut del = DelFlags::empty();
		let mut i = self.from;
		while i < self.to {
			let result = self.maps[i].map_result(pos, bias);
			if let Some(recover) = result.recover
				&& let Some(corr) = self.get_mirror(i).filter(|&c| c > i && c < self.to)
			{
				i = corr + 1;
				pos = self.maps[corr].recover(recover);
				continue;
			}
			del |= result.del;
			pos = result.pos;
			i += 1;
		}
		MapResult::new(pos, if simple { DelFlags::empty() } else { del }, None)
	}
}

impl Mappable for Mapping {
	fn map(&self, pos: usize, bias: Bias) -> usize {
		if !self.mirror.is_empty() {
			return self.map_inner(pos, bias, true).pos;
		}
		self.maps[self.from..self.to].iter().fold(pos, |pos, map| map.map(pos, bias))
	}

	fn map_result(&self, pos: usize, bias: Bias) -> MapResult {
		self.map_inner(pos, bias, false)
	}
}
