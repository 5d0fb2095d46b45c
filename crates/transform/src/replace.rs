//! Fitting slices into documents.
//!
//! [`replace_step`] turns an arbitrary "replace `from..to` with this slice"
//! request into a step that produces a schema-valid document, opening,
//! wrapping and closing nodes as needed. When the inline content after the
//! range cannot join the placed content, it is moved along with a
//! [`ReplaceAroundStep`].

use quire_model::{ContentMatch, Fragment, Node, NodeType, ResolvedPos, Slice};
use tracing::trace;

use crate::error::Result;
use crate::replace_step::{ReplaceAroundStep, ReplaceStep};
use crate::step::Step;
use crate::transform::Transform;

#[cfg(test)]
mod tests;

/// Builds a step replacing `from..to` with `slice`, or `None` when the
/// request is a no-op or the slice cannot be fitted.
pub fn replace_step(doc: &Node, from: usize, to: usize, slice: &Slice) -> quire_model::Result<Option<Step>> {
	if from == to && slice.size() == 0 {
		return Ok(None);
	}
	let rfrom = doc.resolve(from)?;
	let rto = doc.resolve(to)?;
	if fits_trivially(&rfrom, &rto, slice) {
		return Ok(Some(ReplaceStep::new(from, to, slice.clone(), false).into()));
	}
	Ok(Fitter::new(rfrom, rto, slice.clone())?.fit())
}

fn fits_trivially(from: &ResolvedPos, to: &ResolvedPos, slice: &Slice) -> bool {
	slice.open_start == 0
		&& slice.open_end == 0
		&& from.start(from.depth()) == to.start(to.depth())
		&& from.parent().can_replace_fragment(from.index(from.depth()), to.index(to.depth()), &slice.content)
}

/// An open node on the right edge of the placed content.
#[derive(Debug, Clone)]
struct FrontierEntry {
	node_type: NodeType,
	content_match: ContentMatch,
}

/// Where a piece of the unplaced slice can go.
struct Fittable {
	slice_depth: usize,
	frontier_depth: usize,
	parent: Option<Node>,
	inject: Option<Fragment>,
	wrap: Option<Vec<NodeType>>,
}

struct CloseLevel {
	depth: usize,
	fit: Fragment,
	move_to: ResolvedPos,
}

/// Moves content from an unplaced slice onto a frontier of open nodes that
/// starts at the replaced range's start, one node at a time.
struct Fitter {
	from: ResolvedPos,
	to: ResolvedPos,
	unplaced: Slice,
	frontier: Vec<FrontierEntry>,
	placed: Fragment,
}

impl Fitter {
	fn new(from: ResolvedPos, to: ResolvedPos, unplaced: Slice) -> quire_model::Result<Self> {
		let mut frontier = Vec::with_capacity(from.depth() + 1);
		for d in 0..=from.depth() {
			let node = from.node(d);
			frontier.push(FrontierEntry {
				node_type: node.node_type().clone(),
				content_match: node.content_match_at(from.index_after(d))?,
			});
		}
		let mut placed = Fragment::empty();
		for d in (1..=from.depth()).rev() {
			placed = Fragment::from_node(from.node(d).copy(placed));
		}
		Ok(Self { from, to, unplaced, frontier, placed })
	}

	fn depth(&self) -> usize {
		self.frontier.len() - 1
	}

	fn fit(mut self) -> Option<Step> {
		while self.unplaced.size() > 0 {
			if let Some(fit) = self.find_fittable() {
				self.place_nodes(fit)?;
			} else if !self.open_more() {
				self.drop_node();
			}
		}
		let move_inline = self.must_move_inline();
		let placed_size = self.placed.size().saturating_sub(self.depth() + self.from.depth());
		let close_at = match move_inline {
			Some(pos) => self.from.doc().resolve(pos).ok()?,
			None => self.to.clone(),
		};
		let Some(rto) = self.close(close_at) else {
			trace!(from = self.from.pos(), to = self.to.pos(), "replace: no closing level fits");
			return None;
		};

		let mut content = self.placed.clone();
		let mut open_start = self.from.depth();
		let mut open_end = rto.depth();
		while open_start > 0 && open_end > 0 && content.child_count() == 1 {
			content = content.child(0).content().clone();
			open_start -= 1;
			open_end -= 1;
		}
		let slice = Slice::new(content, open_start, open_end);
		if let Some(after) = move_inline {
			let step = ReplaceAroundStep::new(
				self.from.pos(),
				after,
				self.to.pos(),
				self.to.end(self.to.depth()),
				slice,
				placed_size,
				false,
			);
			return Some(step.into());
		}
		if slice.size() > 0 || self.from.pos() != self.to.pos() {
			return Some(ReplaceStep::new(self.from.pos(), rto.pos(), slice, false).into());
		}
		None
	}

	/// Finds a position where a piece of the unplaced slice fits, first
	/// directly, then by wrapping it.
	fn find_fittable(&self) -> Option<Fittable> {
		let mut start_depth = self.unplaced.open_start;
		let mut cur = self.unplaced.content.clone();
		let mut open_end = self.unplaced.open_end;
		for d in 0..start_depth {
			let node = cur.first_child()?.clone();
			if cur.child_count() > 1 {
				open_end = 0;
			}
			if node.node_type().is_isolating() && open_end <= d {
				start_depth = d;
				break;
			}
			cur = node.content().clone();
		}

		for pass in 1..=2 {
			let top = if pass == 1 { start_depth } else { self.unplaced.open_start };
			for slice_depth in (0..=top).rev() {
				let (fragment, parent) = if slice_depth > 0 {
					let parent = content_at(&self.unplaced.content, slice_depth - 1).first_child()?.clone();
					(parent.content().clone(), Some(parent))
				} else {
					(self.unplaced.content.clone(), None)
				};
				let first = fragment.first_child();
				for frontier_depth in (0..=self.depth()).rev() {
					let FrontierEntry { node_type, content_match } = &self.frontier[frontier_depth];
					if pass == 1 {
						let mut inject = None;
						let fits = match first {
							Some(first) => {
								content_match.match_type(first.node_type()).is_some() || {
									inject = content_match.fill_before(&Fragment::from_node(first.clone()), false, 0);
									inject.is_some()
								}
							}
							None => parent.as_ref().is_some_and(|p| node_type.compatible_content(p.node_type())),
						};
						if fits {
							return Some(Fittable { slice_depth, frontier_depth, parent, inject, wrap: None });
						}
					} else if let Some(first) = first
						&& let Some(wrap) = content_match.find_wrapping(first.node_type())
					{
						return Some(Fittable { slice_depth, frontier_depth, parent, inject: None, wrap: Some(wrap) });
					}
					if parent.as_ref().is_some_and(|p| content_match.match_type(p.node_type()).is_some()) {
						break;
					}
				}
			}
		}
		None
	}

	fn open_more(&mut self) -> bool {
		let Slice { content, open_start, open_end } = &self.unplaced;
		let inner = content_at(content, *open_start);
		if inner.child_count() == 0 || inner.child(0).is_leaf() {
			return false;
		}
		let new_end = if inner.size() + open_start >= content.size() - open_end { open_start + 1 } else { 0 };
		trace!(open_start = open_start + 1, "replace: opening unplaced slice deeper");
		self.unplaced = Slice::new(content.clone(), open_start + 1, (*open_end).max(new_end));
		true
	}

	fn drop_node(&mut self) {
		let Slice { content, open_start, open_end } = &self.unplaced;
		let (open_start, open_end) = (*open_start, *open_end);
		let inner = content_at(content, open_start);
		trace!(
			open_start,
			dropped = inner.maybe_child(0).map(|node| node.node_type().name()),
			"replace: dropping node that fits nowhere"
		);
		self.unplaced = if inner.child_count() <= 1 && open_start > 0 {
			let open_at_end = content.size() - open_start <= open_start + inner.size();
			Slice::new(
				drop_from_fragment(content, open_start - 1, 1),
				open_start - 1,
				if open_at_end { open_start - 1 } else { open_end },
			)
		} else {
			Slice::new(drop_from_fragment(content, open_start, 1), open_start, open_end)
		};
	}

	/// Moves content from the unplaced slice at `slice_depth` onto the
	/// frontier node at `frontier_depth`.
	fn place_nodes(&mut self, fit: Fittable) -> Option<()> {
		let Fittable { slice_depth, frontier_depth, parent, inject, wrap } = fit;
		while self.depth() > frontier_depth {
			self.close_frontier_node();
		}
		for wrapper in wrap.iter().flatten() {
			self.open_frontier_node(wrapper, None, Fragment::empty())?;
		}

		let slice = self.unplaced.clone();
		let fragment = parent.as_ref().map_or(&slice.content, |p| p.content()).clone();
		let open_start = slice.open_start - slice_depth;
		let mut taken = 0;
		let mut add = Vec::new();
		let FrontierEntry { node_type, mut content_match } = self.frontier[frontier_depth].clone();
		if let Some(inject) = &inject {
			add.extend(inject.iter().cloned());
			content_match = content_match.match_fragment(inject, 0, inject.child_count())?;
		}
		// Open nodes at the end of the fragment. Zero means only the parent
		// is open, negative means nothing is.
		let mut open_end_count = (fragment.size() + slice_depth) as isize - (slice.content.size() - slice.open_end) as isize;
		while taken < fragment.child_count() {
			let next = fragment.child(taken);
			let Some(matches) = content_match.match_type(next.node_type()) else {
				break;
			};
			taken += 1;
			if taken > 1 || open_start == 0 || next.content().size() > 0 {
				content_match = matches;
				let marked = next.mark(node_type.allowed_marks(next.marks()));
				let start = if taken == 1 { open_start } else { 0 };
				let end = if taken == fragment.child_count() { open_end_count } else { -1 };
				add.push(close_node_start(&marked, start, end));
			}
		}
		let to_end = taken == fragment.child_count();
		if !to_end {
			open_end_count = -1;
		}

		self.placed = add_to_fragment(&self.placed, frontier_depth, &Fragment::from_vec(add));
		self.frontier[frontier_depth].content_match = content_match;

		if to_end
			&& open_end_count < 0
			&& parent.as_ref().is_some_and(|p| *p.node_type() == self.frontier[self.depth()].node_type)
			&& self.frontier.len() > 1
		{
			self.close_frontier_node();
		}

		let mut cur = fragment.clone();
		for _ in 0..open_end_count.max(0) {
			let node = cur.last_child()?.clone();
			self.frontier.push(FrontierEntry {
				node_type: node.node_type().clone(),
				content_match: node.content_match_at(node.child_count()).ok()?,
			});
			cur = node.content().clone();
		}

		self.unplaced = if !to_end {
			Slice::new(drop_from_fragment(&slice.content, slice_depth, taken), slice.open_start, slice.open_end)
		} else if slice_depth == 0 {
			Slice::empty()
		} else {
			Slice::new(
				drop_from_fragment(&slice.content, slice_depth - 1, 1),
				slice_depth - 1,
				if open_end_count < 0 { slice.open_end } else { slice_depth - 1 },
			)
		};
		Some(())
	}

	/// The position up to which inline content after the range must be
	/// moved into the placed textblock, if any.
	fn must_move_inline(&self) -> Option<usize> {
		if !self.to.parent().is_textblock() {
			return None;
		}
		let top = &self.frontier[self.depth()];
		if !top.node_type.is_textblock()
			|| content_after_fits(&self.to, self.to.depth(), &top.node_type, &top.content_match, false).is_none()
		{
			return None;
		}
		if self.to.depth() == self.depth()
			&& self.find_close_level(&self.to).is_some_and(|level| level.depth == self.depth())
		{
			return None;
		}
		let mut depth = self.to.depth();
		let mut after = self.to.after(depth).ok()?;
		while depth > 1 {
			depth -= 1;
			if after != self.to.end(depth) {
				break;
			}
			after += 1;
		}
		Some(after)
	}

	fn find_close_level(&self, to: &ResolvedPos) -> Option<CloseLevel> {
		'scan: for i in (0..=self.depth().min(to.depth())).rev() {
			let FrontierEntry { node_type, content_match } = &self.frontier[i];
			let drop_inner = i < to.depth() && to.end(i + 1) == to.pos() + (to.depth() - (i + 1));
			let Some(fit) = content_after_fits(to, i, node_type, content_match, drop_inner) else {
				continue;
			};
			for d in (0..i).rev() {
				let FrontierEntry { node_type, content_match } = &self.frontier[d];
				match content_after_fits(to, d, node_type, content_match, true) {
					Some(rest) if rest.child_count() == 0 => {}
					_ => continue 'scan,
				}
			}
			let move_to = if drop_inner { to.doc().resolve(to.after(i + 1).ok()?).ok()? } else { to.clone() };
			return Some(CloseLevel { depth: i, fit, move_to });
		}
		None
	}

	fn close(&mut self, to: ResolvedPos) -> Option<ResolvedPos> {
		let close = self.find_close_level(&to)?;
		while self.depth() > close.depth {
			self.close_frontier_node();
		}
		if close.fit.child_count() > 0 {
			self.placed = add_to_fragment(&self.placed, close.depth, &close.fit);
		}
		let to = close.move_to;
		for d in close.depth + 1..=to.depth() {
			let node = to.node(d);
			let add = node.node_type().content_match().fill_before(node.content(), true, to.index(d))?;
			self.open_frontier_node(node.node_type(), Some(node.attrs()), add)?;
		}
		Some(to)
	}

	fn open_frontier_node(
		&mut self,
		node_type: &NodeType,
		attrs: Option<&quire_model::Attrs>,
		content: Fragment,
	) -> Option<()> {
		let depth = self.depth();
		let top = &mut self.frontier[depth];
		top.content_match = top.content_match.match_type(node_type)?;
		let node = node_type.create(attrs, content, Vec::new()).ok()?;
		self.placed = add_to_fragment(&self.placed, depth, &Fragment::from_node(node));
		self.frontier.push(FrontierEntry { node_type: node_type.clone(), content_match: node_type.content_match() });
		Some(())
	}

	fn close_frontier_node(&mut self) {
		let Some(open) = self.frontier.pop() else {
			return;
		};
		if let Some(add) = open.content_match.fill_before(&Fragment::empty(), true, 0)
			&& add.child_count() > 0
		{
			self.placed = add_to_fragment(&self.placed, self.frontier.len(), &add);
		}
	}
}

fn drop_from_fragment(fragment: &Fragment, depth: usize, count: usize) -> Fragment {
	if depth == 0 {
		return fragment.cut_by_index(count, fragment.child_count());
	}
	let Some(first) = fragment.first_child() else {
		return fragment.clone();
	};
	fragment.replace_child(0, first.copy(drop_from_fragment(first.content(), depth - 1, count)))
}

fn add_to_fragment(fragment: &Fragment, depth: usize, content: &Fragment) -> Fragment {
	if depth == 0 {
		return fragment.append(content);
	}
	let Some(last) = fragment.last_child() else {
		return fragment.clone();
	};
	fragment.replace_child(
		fragment.child_count() - 1,
		last.copy(add_to_fragment(last.content(), depth - 1, content)),
	)
}

fn content_at(fragment: &Fragment, depth: usize) -> Fragment {
	let mut fragment = fragment.clone();
	for _ in 0..depth {
		let Some(first) = fragment.first_child().cloned() else {
			break;
		};
		fragment = first.content().clone();
	}
	fragment
}

/// Fills the start (and, when closed, the end) of a node that was open in
/// the slice so it becomes valid on its own.
fn close_node_start(node: &Node, open_start: usize, open_end: isize) -> Node {
	if open_start == 0 {
		return node.clone();
	}
	let mut frag = node.content().clone();
	if open_start > 1
		&& let Some(first) = frag.first_child()
	{
		let inner_end = if frag.child_count() == 1 { open_end - 1 } else { 0 };
		frag = frag.replace_child(0, close_node_start(first, open_start - 1, inner_end));
	}
	let start_match = node.node_type().content_match();
	frag = start_match.fill_before(&frag, false, 0).unwrap_or_default().append(&frag);
	if open_end <= 0
		&& let Some(end) = start_match
			.match_fragment(&frag, 0, frag.child_count())
			.and_then(|m| m.fill_before(&Fragment::empty(), true, 0))
	{
		frag = frag.append(&end);
	}
	node.copy(frag)
}

/// The content needed to close a node of `node_type` at `depth` before the
/// content after `to`, if that content can follow.
fn content_after_fits(
	to: &ResolvedPos,
	depth: usize,
	node_type: &NodeType,
	content_match: &ContentMatch,
	open: bool,
) -> Option<Fragment> {
	let node = to.node(depth);
	let index = if open { to.index_after(depth) } else { to.index(depth) };
	if index == node.child_count() && !node_type.compatible_content(node.node_type()) {
		return None;
	}
	let fit = content_match.fill_before(node.content(), true, index)?;
	(!invalid_marks(node_type, node.content(), index)).then_some(fit)
}

fn invalid_marks(node_type: &NodeType, fragment: &Fragment, start: usize) -> bool {
	fragment.iter().skip(start).any(|child| !node_type.allows_marks(child.marks()))
}

fn defines_content(node_type: &NodeType) -> bool {
	node_type.is_defining() || node_type.is_defining_for_content()
}

/// Depths at which `from..to` spans the whole content of the node.
pub(crate) fn covered_depths(from: &ResolvedPos, to: &ResolvedPos) -> Vec<usize> {
	let mut result = Vec::new();
	let min_depth = from.depth().min(to.depth());
	for d in (0..=min_depth).rev() {
		let start = from.start(d);
		if start + (from.depth() - d) < from.pos()
			|| to.end(d) > to.pos() + (to.depth() - d)
			|| from.node(d).node_type().is_isolating()
			|| to.node(d).node_type().is_isolating()
		{
			break;
		}
		if start == to.start(d)
			|| (d == from.depth()
				&& d == to.depth()
				&& from.parent().inline_content()
				&& to.parent().inline_content()
				&& d > 0 && to.start(d - 1) + 1 == start)
		{
			result.push(d);
		}
	}
	result
}

/// Closes the nodes of `fragment` that were open past `new_open` on the
/// left side, filling in required content.
fn close_fragment(fragment: &Fragment, depth: usize, old_open: usize, new_open: usize, parent: Option<&Node>) -> Fragment {
	let mut fragment = fragment.clone();
	if depth < old_open
		&& let Some(first) = fragment.first_child().cloned()
	{
		let inner = close_fragment(first.content(), depth + 1, old_open, new_open, Some(&first));
		fragment = fragment.replace_child(0, first.copy(inner));
	}
	if depth > new_open
		&& let Some(parent) = parent
		&& let Ok(start_match) = parent.content_match_at(0)
	{
		let start = start_match.fill_before(&fragment, false, 0).unwrap_or_default().append(&fragment);
		let end = start_match
			.match_fragment(&start, 0, start.child_count())
			.and_then(|m| m.fill_before(&Fragment::empty(), true, 0))
			.unwrap_or_default();
		fragment = start.append(&end);
	}
	fragment
}

/// A target depth for [`Transform::replace_range`]: either replacing the
/// whole node at that depth, or only from its start up to the range end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
	Expand(usize),
	FromStart(usize),
}

impl Target {
	fn depth(self) -> usize {
		match self {
			Self::Expand(d) | Self::FromStart(d) => d,
		}
	}
}

impl Transform {
	/// Replaces a range with a slice, preferring to widen the range to
	/// whole nodes so the slice's open nodes replace them instead of being
	/// squeezed into the existing structure.
	pub fn replace_range(&mut self, from: usize, to: usize, slice: Slice) -> Result<&mut Self> {
		if slice.size() == 0 {
			return self.delete_range(from, to);
		}
		let rfrom = self.doc().resolve(from)?;
		let rto = self.doc().resolve(to)?;
		if fits_trivially(&rfrom, &rto, &slice) {
			return self.step(ReplaceStep::new(from, to, slice, false));
		}

		let mut covered = covered_depths(&rfrom, &rto);
		if covered.last() == Some(&0) {
			covered.pop();
		}
		let mut targets: Vec<Target> = covered.iter().map(|&d| Target::Expand(d)).collect();
		let mut preferred = Target::FromStart(rfrom.depth() + 1);
		targets.insert(0, preferred);
		let mut pos = rfrom.pos();
		for d in (1..=rfrom.depth()).rev() {
			pos -= 1;
			let node_type = rfrom.node(d).node_type();
			if node_type.is_defining() || node_type.is_defining_as_context() || node_type.is_isolating() {
				break;
			}
			if covered.contains(&d) {
				preferred = Target::Expand(d);
			} else if rfrom.before(d).ok() == Some(pos) {
				targets.insert(1, Target::FromStart(d));
			}
		}
		let preferred_index = targets.iter().position(|t| *t == preferred).unwrap_or(0);

		let mut left_nodes = Vec::with_capacity(slice.open_start + 1);
		let mut content = slice.content.clone();
		for i in 0.. {
			let Some(node) = content.first_child().cloned() else {
				break;
			};
			content = node.content().clone();
			left_nodes.push(node);
			if i == slice.open_start {
				break;
			}
		}

		let mut preferred_depth = slice.open_start;
		for d in (0..preferred_depth).rev() {
			let Some(left) = left_nodes.get(d) else {
				continue;
			};
			let def = defines_content(left.node_type());
			if def && !left.same_markup(rfrom.node(preferred.depth() - 1)) {
				preferred_depth = d;
			} else if def || !left.node_type().is_textblock() {
				break;
			}
		}

		for j in (0..=slice.open_start).rev() {
			let open_depth = (j + preferred_depth + 1) % (slice.open_start + 1);
			let Some(insert) = left_nodes.get(open_depth) else {
				continue;
			};
			for i in 0..targets.len() {
				let target = targets[(i + preferred_index) % targets.len()];
				let depth = target.depth();
				let parent = rfrom.node(depth - 1);
				let index = rfrom.index(depth - 1);
				if parent.can_replace_with(index, index, insert.node_type(), Some(insert.marks())) {
					let start = rfrom.before(depth)?;
					let end = match target {
						Target::Expand(_) => rto.after(depth)?,
						Target::FromStart(_) => to,
					};
					let closed = close_fragment(&slice.content, 0, slice.open_start, open_depth, None);
					return self.replace(start, end, Slice::new(closed, open_depth, slice.open_end));
				}
			}
		}

		let start_steps = self.steps().len();
		let (mut from, mut to) = (from, to);
		for target in targets.iter().rev() {
			self.replace(from, to, slice.clone())?;
			if self.steps().len() > start_steps {
				break;
			}
			if let Target::Expand(depth) = *target {
				from = rfrom.before(depth)?;
				to = rto.after(depth)?;
			}
		}
		Ok(self)
	}

	/// Replaces a range with a single node. An empty range inside a block
	/// that cannot hold the node is moved to the nearest position that can.
	pub fn replace_range_with(&mut self, from: usize, to: usize, node: Node) -> Result<&mut Self> {
		let (mut from, mut to) = (from, to);
		if !node.is_inline() && from == to && self.doc().resolve(from)?.parent().content().size() > 0 {
			if let Some(point) = crate::structure::insert_point(self.doc(), from, node.node_type())? {
				from = point;
				to = point;
			}
		}
		self.replace_range(from, to, Slice::closed(Fragment::from_node(node)))
	}

	/// Deletes a range, widening it to whole nodes when the range covers
	/// their entire content.
	pub fn delete_range(&mut self, from: usize, to: usize) -> Result<&mut Self> {
		let rfrom = self.doc().resolve(from)?;
		let rto = self.doc().resolve(to)?;
		let covered = covered_depths(&rfrom, &rto);
		for (i, &depth) in covered.iter().enumerate() {
			let last = i == covered.len() - 1;
			if (last && depth == 0) || rfrom.node(depth).node_type().content_match().valid_end() {
				return self.delete(rfrom.start(depth), rto.end(depth));
			}
			if depth > 0
				&& (last
					|| rfrom.node(depth - 1).can_replace(
						rfrom.index(depth - 1),
						rto.index_after(depth - 1),
						&Fragment::empty(),
						0,
						0,
					)) {
				return self.delete(rfrom.before(depth)?, rto.after(depth)?);
			}
		}
		for d in 1..=rfrom.depth().min(rto.depth()) {
			if from - rfrom.start(d) == rfrom.depth() - d
				&& to > rfrom.end(d)
				&& rto.end(d) - to != rto.depth() - d
				&& rfrom.start(d - 1) == rto.start(d - 1)
				&& rfrom.node(d - 1).can_replace(rfrom.index(d - 1), rto.index(d - 1), &Fragment::empty(), 0, 0)
			{
				return self.delete(rfrom.before(d)?, to);
			}
		}
		self.delete(from, to)
	}
}
