//! Content expressions and the automaton that checks them.
//!
//! Expressions such as `"paragraph block*"` are parsed into a small AST,
//! compiled into an NFA and then into a DFA whose states live in the
//! schema. A [`ContentMatch`] is a handle on one of those states.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::error::{ModelError, Result};
use crate::schema::{NodeTypeData, Schema};
use crate::{Fragment, NodeType};

/// Index of the state that matches nothing but the empty sequence.
pub(crate) const EMPTY: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MatchEdge {
	pub(crate) node_type: usize,
	pub(crate) next: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct MatchState {
	pub(crate) valid_end: bool,
	pub(crate) next: Vec<MatchEdge>,
}

impl MatchState {
	pub(crate) fn empty() -> Self {
		Self { valid_end: true, next: Vec::new() }
	}
}

#[derive(Debug, Clone)]
enum Expr {
	Choice(Vec<Expr>),
	Seq(Vec<Expr>),
	Plus(Box<Expr>),
	Star(Box<Expr>),
	Opt(Box<Expr>),
	Range { min: usize, max: Option<usize>, expr: Box<Expr> },
	Name(usize),
}

struct TokenStream<'a> {
	source: &'a str,
	tokens: Vec<&'a str>,
	pos: usize,
	inline: Option<bool>,
	nodes: &'a [NodeTypeData],
}

fn tokenize(source: &str) -> Vec<&str> {
	let mut tokens = Vec::new();
	let mut chars = source.char_indices().peekable();
	while let Some((start, ch)) = chars.next() {
		if ch.is_whitespace() {
			continue;
		}
		if ch.is_alphanumeric() || ch == '_' {
			let mut end = start + ch.len_utf8();
			while let Some(&(i, c)) = chars.peek() {
				if !(c.is_alphanumeric() || c == '_') {
					break;
				}
				end = i + c.len_utf8();
				chars.next();
			}
			tokens.push(&source[start..end]);
		} else {
			tokens.push(&source[start..start + ch.len_utf8()]);
		}
	}
	tokens
}

impl<'a> TokenStream<'a> {
	fn next(&self) -> Option<&'a str> {
		self.tokens.get(self.pos).copied()
	}

	fn eat(&mut self, tok: &str) -> bool {
		if self.next() == Some(tok) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	fn err<T>(&self, msg: &str) -> Result<T> {
		Err(ModelError::Schema(format!("{msg} (in content expression '{}')", self.source)))
	}

	fn parse_expr(&mut self) -> Result<Expr> {
		let mut exprs = Vec::new();
		loop {
			exprs.push(self.parse_seq()?);
			if !self.eat("|") {
				break;
			}
		}
		Ok(if exprs.len() == 1 { exprs.pop().unwrap_or(Expr::Seq(Vec::new())) } else { Expr::Choice(exprs) })
	}

	fn parse_seq(&mut self) -> Result<Expr> {
		let mut exprs = Vec::new();
		while let Some(tok) = self.next() {
			if tok == ")" || tok == "|" {
				break;
			}
			exprs.push(self.parse_subscript()?);
		}
		Ok(if exprs.len() == 1 { exprs.pop().unwrap_or(Expr::Seq(Vec::new())) } else { Expr::Seq(exprs) })
	}

	fn parse_subscript(&mut self) -> Result<Expr> {
		let mut expr = self.parse_atom()?;
		loop {
			if self.eat("+") {
				expr = Expr::Plus(Box::new(expr));
			} else if self.eat("*") {
				expr = Expr::Star(Box::new(expr));
			} else if self.eat("?") {
				expr = Expr::Opt(Box::new(expr));
			} else if self.eat("{") {
				expr = self.parse_range(expr)?;
			} else {
				break;
			}
		}
		Ok(expr)
	}

	fn parse_num(&mut self) -> Result<usize> {
		match self.next().and_then(|tok| tok.parse::<usize>().ok()) {
			Some(n) => {
				self.pos += 1;
				Ok(n)
			}
			None => self.err(&format!("Expected number, got '{}'", self.next().unwrap_or(""))),
		}
	}

	fn parse_range(&mut self, expr: Expr) -> Result<Expr> {
		let min = self.parse_num()?;
		let max = if self.eat(",") {
			if self.next() != Some("}") { Some(self.parse_num()?) } else { None }
		} else {
			Some(min)
		};
		if !self.eat("}") {
			return self.err("Unclosed braced range");
		}
		Ok(Expr::Range { min, max, expr: Box::new(expr) })
	}

	fn resolve_name(&self, name: &str) -> Result<Vec<usize>> {
		if let Some(id) = self.nodes.iter().position(|n| n.name == name) {
			return Ok(vec![id]);
		}
		let found: Vec<usize> = self
			.nodes
			.iter()
			.enumerate()
			.filter(|(_, n)| n.groups.iter().any(|g| g == name))
			.map(|(id, _)| id)
			.collect();
		if found.is_empty() {
			return self.err(&format!("No node type or group '{name}' found"));
		}
		Ok(found)
	}

	fn parse_atom(&mut self) -> Result<Expr> {
		if self.eat("(") {
			let expr = self.parse_expr()?;
			if !self.eat(")") {
				return self.err("Missing closing paren");
			}
			return Ok(expr);
		}
		let Some(tok) = self.next().filter(|tok| tok.chars().all(|c| c.is_alphanumeric() || c == '_')) else {
			return self.err(&format!("Unexpected token '{}'", self.next().unwrap_or("")));
		};
		let types = self.resolve_name(tok)?;
		for &id in &types {
			let inline = self.nodes[id].is_inline();
			match self.inline {
				None => self.inline = Some(inline),
				Some(prev) if prev != inline => return self.err("Mixing inline and block content"),
				Some(_) => {}
			}
		}
		self.pos += 1;
		let mut exprs: Vec<Expr> = types.into_iter().map(Expr::Name).collect();
		Ok(if exprs.len() == 1 { exprs.pop().unwrap_or(Expr::Seq(Vec::new())) } else { Expr::Choice(exprs) })
	}
}

#[derive(Debug, Clone, Copy)]
struct NfaEdge {
	term: Option<usize>,
	to: Option<usize>,
}

#[derive(Default)]
struct Nfa {
	nodes: Vec<Vec<usize>>,
	edges: Vec<NfaEdge>,
}

impl Nfa {
	fn node(&mut self) -> usize {
		self.nodes.push(Vec::new());
		self.nodes.len() - 1
	}

	fn edge(&mut self, from: usize, to: Option<usize>, term: Option<usize>) -> usize {
		self.edges.push(NfaEdge { term, to });
		let id = self.edges.len() - 1;
		self.nodes[from].push(id);
		id
	}

	fn connect(&mut self, edges: &[usize], to: usize) {
		for &edge in edges {
			self.edges[edge].to = Some(to);
		}
	}

	fn compile(&mut self, expr: &Expr, from: usize) -> Vec<usize> {
		match expr {
			Expr::Choice(exprs) => exprs.iter().flat_map(|e| self.compile(e, from)).collect(),
			Expr::Seq(exprs) => {
				if exprs.is_empty() {
					return vec![self.edge(from, None, None)];
				}
				let mut from = from;
				for (i, e) in exprs.iter().enumerate() {
					let next = self.compile(e, from);
					if i == exprs.len() - 1 {
						return next;
					}
					from = self.node();
					self.connect(&next, from);
				}
				unreachable!("sequence loop always returns on its last element")
			}
			Expr::Star(inner) => {
				let lp = self.node();
				self.edge(from, Some(lp), None);
				let out = self.compile(inner, lp);
				self.connect(&out, lp);
				vec![self.edge(lp, None, None)]
			}
			Expr::Plus(inner) => {
				let lp = self.node();
				let first = self.compile(inner, from);
				self.connect(&first, lp);
				let again = self.compile(inner, lp);
				self.connect(&again, lp);
				vec![self.edge(lp, None, None)]
			}
			Expr::Opt(inner) => {
				let mut out = vec![self.edge(from, None, None)];
				out.extend(self.compile(inner, from));
				out
			}
			Expr::Range { min, max, expr } => {
				let mut cur = from;
				for _ in 0..*min {
					let next = self.node();
					let out = self.compile(expr, cur);
					self.connect(&out, next);
					cur = next;
				}
				match max {
					None => {
						let out = self.compile(expr, cur);
						self.connect(&out, cur);
					}
					Some(max) => {
						for _ in *min..*max {
							let next = self.node();
							self.edge(cur, Some(next), None);
							let out = self.compile(expr, cur);
							self.connect(&out, next);
							cur = next;
						}
					}
				}
				vec![self.edge(cur, None, None)]
			}
			Expr::Name(id) => vec![self.edge(from, None, Some(*id))],
		}
	}

	fn null_from(&self, node: usize) -> Vec<usize> {
		let mut result = Vec::new();
		self.scan(node, &mut result);
		result.sort_unstable();
		result
	}

	fn scan(&self, node: usize, result: &mut Vec<usize>) {
		let edges = &self.nodes[node];
		if let [single] = edges.as_slice() {
			let edge = self.edges[*single];
			if edge.term.is_none() {
				if let Some(to) = edge.to {
					return self.scan(to, result);
				}
			}
		}
		result.push(node);
		for &edge in edges {
			let NfaEdge { term, to } = self.edges[edge];
			if let (None, Some(to)) = (term, to) {
				if !result.contains(&to) {
					self.scan(to, result);
				}
			}
		}
	}
}

struct DfaBuilder<'a> {
	nfa: &'a Nfa,
	states: &'a mut Vec<MatchState>,
	labeled: FxHashMap<Vec<usize>, usize>,
}

impl DfaBuilder<'_> {
	fn explore(&mut self, set: Vec<usize>) -> usize {
		let mut out: Vec<(usize, Vec<usize>)> = Vec::new();
		for &node in &set {
			for &edge in &self.nfa.nodes[node] {
				let NfaEdge { term, to } = self.nfa.edges[edge];
				let (Some(term), Some(to)) = (term, to) else { continue };
				let idx = match out.iter().position(|(t, _)| *t == term) {
					Some(idx) => idx,
					None => {
						out.push((term, Vec::new()));
						out.len() - 1
					}
				};
				for reached in self.nfa.null_from(to) {
					if !out[idx].1.contains(&reached) {
						out[idx].1.push(reached);
					}
				}
			}
		}
		let accept = self.nfa.nodes.len() - 1;
		let id = self.states.len();
		self.states.push(MatchState { valid_end: set.contains(&accept), next: Vec::new() });
		self.labeled.insert(set, id);
		for (term, mut targets) in out {
			targets.sort_unstable();
			let next = match self.labeled.get(&targets) {
				Some(&next) => next,
				None => self.explore(targets),
			};
			self.states[id].next.push(MatchEdge { node_type: term, next });
		}
		id
	}
}

/// Compiles a content expression, appending its DFA states and returning
/// the start state.
pub(crate) fn compile(source: &str, nodes: &[NodeTypeData], states: &mut Vec<MatchState>) -> Result<usize> {
	let mut stream = TokenStream { source, tokens: tokenize(source), pos: 0, inline: None, nodes };
	if stream.next().is_none() {
		return Ok(EMPTY);
	}
	let expr = stream.parse_expr()?;
	if let Some(tok) = stream.next() {
		return stream.err(&format!("Unexpected trailing text '{tok}'"));
	}
	let mut nfa = Nfa::default();
	nfa.node();
	let out = nfa.compile(&expr, 0);
	let accept = nfa.node();
	nfa.connect(&out, accept);

	let first = states.len();
	let start = DfaBuilder { nfa: &nfa, states, labeled: FxHashMap::default() }.explore(nfa.null_from(0));
	check_for_dead_ends(&stream, nodes, states, first)?;
	Ok(start)
}

fn check_for_dead_ends(stream: &TokenStream<'_>, nodes: &[NodeTypeData], states: &[MatchState], first: usize) -> Result<()> {
	for state in &states[first..] {
		let mut dead = !state.valid_end;
		let mut names = Vec::new();
		for edge in &state.next {
			let node = &nodes[edge.node_type];
			names.push(node.name.as_str());
			if dead && !(node.is_text || node.has_required_attrs()) {
				dead = false;
			}
		}
		if dead {
			return stream.err(&format!("Only non-generatable nodes ({}) in a required position", names.join(", ")));
		}
	}
	Ok(())
}

/// A state in a node type's content automaton: how much of the content
/// has been matched and what may follow.
#[derive(Clone)]
pub struct ContentMatch {
	pub(crate) schema: Schema,
	pub(crate) state: usize,
}

impl ContentMatch {
	fn data(&self) -> &MatchState {
		&self.schema.0.states[self.state]
	}

	fn at(&self, state: usize) -> ContentMatch {
		ContentMatch { schema: self.schema.clone(), state }
	}

	fn node_type(&self, id: usize) -> NodeType {
		NodeType { schema: self.schema.clone(), id }
	}

	/// Whether the content may end in this state.
	pub fn valid_end(&self) -> bool {
		self.data().valid_end
	}

	/// The state after matching a node of `node_type`, if allowed.
	pub fn match_type(&self, node_type: &NodeType) -> Option<ContentMatch> {
		self.data().next.iter().find(|edge| edge.node_type == node_type.id).map(|edge| self.at(edge.next))
	}

	/// Matches the children `start..end` of a fragment.
	pub fn match_fragment(&self, frag: &Fragment, start: usize, end: usize) -> Option<ContentMatch> {
		let mut cur = self.clone();
		for i in start..end {
			cur = cur.match_type(frag.child(i).node_type())?;
		}
		Some(cur)
	}

	/// Whether the next content is inline.
	pub fn inline_content(&self) -> bool {
		let nodes = &self.schema.0.nodes;
		self.data().next.first().is_some_and(|edge| nodes[edge.node_type].is_inline())
	}

	/// The first type that could be created here without extra attributes.
	pub fn default_type(&self) -> Option<NodeType> {
		let nodes = &self.schema.0.nodes;
		self.data()
			.next
			.iter()
			.find(|edge| {
				let node = &nodes[edge.node_type];
				!(node.is_text || node.has_required_attrs())
			})
			.map(|edge| self.node_type(edge.node_type))
	}

	/// Whether this state shares an outgoing type with `other`.
	pub fn compatible(&self, other: &ContentMatch) -> bool {
		self.data().next.iter().any(|a| other.data().next.iter().any(|b| a.node_type == b.node_type))
	}

	/// Number of outgoing edges.
	pub fn edge_count(&self) -> usize {
		self.data().next.len()
	}

	/// The `n`th outgoing edge as (type, next state).
	pub fn edge(&self, n: usize) -> Option<(NodeType, ContentMatch)> {
		self.data().next.get(n).map(|edge| (self.node_type(edge.node_type), self.at(edge.next)))
	}

	/// Finds a fragment of generatable nodes that, inserted here, makes
	/// `after` (from `start_index`) match. With `to_end`, the result must
	/// also leave the automaton in an accepting state.
	pub fn fill_before(&self, after: &Fragment, to_end: bool, start_index: usize) -> Option<Fragment> {
		let mut seen = vec![self.state];
		self.search_fill(after, to_end, start_index, &mut seen, &mut Vec::new())
	}

	fn search_fill(
		&self,
		after: &Fragment,
		to_end: bool,
		start_index: usize,
		seen: &mut Vec<usize>,
		types: &mut Vec<NodeType>,
	) -> Option<Fragment> {
		let finished = self.match_fragment(after, start_index, after.child_count());
		if finished.is_some_and(|m| !to_end || m.valid_end()) {
			let nodes: Option<Vec<_>> = types
				.iter()
				.map(|t| t.create_and_fill(None, Fragment::empty(), Vec::new()).ok().flatten())
				.collect();
			return nodes.map(Fragment::from_vec);
		}
		for edge in self.data().next.clone() {
			let node = &self.schema.0.nodes[edge.node_type];
			if !(node.is_text || node.has_required_attrs()) && !seen.contains(&edge.next) {
				seen.push(edge.next);
				types.push(self.node_type(edge.node_type));
				let found = self.at(edge.next).search_fill(after, to_end, start_index, seen, types);
				types.pop();
				if found.is_some() {
					return found;
				}
			}
		}
		None
	}

	/// Finds the shortest chain of wrapper types that lets a node of
	/// `target` be placed here.
	pub fn find_wrapping(&self, target: &NodeType) -> Option<Vec<NodeType>> {
		struct Active {
			state: ContentMatch,
			node_type: Option<usize>,
			via: Option<usize>,
		}
		let nodes = &self.schema.0.nodes;
		let mut seen = vec![false; nodes.len()];
		let mut active = vec![Active { state: self.clone(), node_type: None, via: None }];
		let mut cursor = 0;
		while cursor < active.len() {
			let current = cursor;
			cursor += 1;
			if active[current].state.match_type(target).is_some() {
				let mut result = Vec::new();
				let mut obj = current;
				while let Some(id) = active[obj].node_type {
					result.push(self.node_type(id));
					obj = active[obj].via.unwrap_or(0);
				}
				result.reverse();
				return Some(result);
			}
			for edge in active[current].state.data().next.clone() {
				let node = &nodes[edge.node_type];
				let next_valid = self.schema.0.states[edge.next].valid_end;
				if !node.is_leaf
					&& !node.has_required_attrs()
					&& !seen[edge.node_type]
					&& (active[current].node_type.is_none() || next_valid)
				{
					active.push(Active {
						state: self.at(node.content_match),
						node_type: Some(edge.node_type),
						via: Some(current),
					});
					seen[edge.node_type] = true;
				}
			}
		}
		None
	}
}

impl PartialEq for ContentMatch {
	fn eq(&self, other: &Self) -> bool {
		self.state == other.state && self.schema.same(&other.schema)
	}
}

impl fmt::Debug for ContentMatch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let nodes = &self.schema.0.nodes;
		let next: Vec<_> = self.data().next.iter().map(|e| format!("{}->{}", nodes[e.node_type].name, e.next)).collect();
		write!(f, "ContentMatch({}{}, [{}])", self.state, if self.valid_end() { "*" } else { "" }, next.join(", "))
	}
}
