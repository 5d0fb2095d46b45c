use pretty_assertions::assert_eq;
use quire_model::testing::TaggedNode;
use quire_model::{Slice, blockquote, doc, h1, hr, img, li, ol, p, ul};

use super::*;

/// Every step of `tr`, inverted and replayed backwards, must restore the
/// starting document.
fn assert_invertible(tr: &Transform) {
	let mut restored = tr.doc().clone();
	for (step, before) in tr.steps().iter().zip(tr.docs()).rev() {
		let inverted = step.invert(before).unwrap();
		restored = inverted.apply(&restored).unwrap();
	}
	assert_eq!(&restored, tr.before());
}

fn source_slice(source: Option<&TaggedNode>) -> Slice {
	match source {
		Some(s) => s.slice(s.tag("a"), s.tag("b"), false).unwrap(),
		None => Slice::empty(),
	}
}

fn repl(doc: TaggedNode, source: Option<TaggedNode>, expect: TaggedNode) {
	let a = doc.tag("a");
	let b = doc.try_tag("b").unwrap_or(a);
	let mut tr = Transform::new(doc.node.clone());
	tr.replace(a, b, source_slice(source.as_ref())).unwrap();
	assert_eq!(tr.doc(), &expect.node);
	assert_invertible(&tr);
}

fn range_repl(doc: TaggedNode, source: Option<TaggedNode>, expect: TaggedNode) {
	let a = doc.tag("a");
	let b = doc.try_tag("b").unwrap_or(a);
	let mut tr = Transform::new(doc.node.clone());
	tr.replace_range(a, b, source_slice(source.as_ref())).unwrap();
	assert_eq!(tr.doc(), &expect.node);
	assert_invertible(&tr);
}

#[test]
fn test_delete_text() {
	repl(doc!(p!("hell<a>o y<b>ou")), None, doc!(p!("hellou")));
}

#[test]
fn test_join_blocks() {
	repl(doc!(p!("hell<a>o"), p!("y<b>ou")), None, doc!(p!("hellou")));
}

#[test]
fn test_merge_blocks_across_deleted_content() {
	repl(doc!(p!("a<a>"), p!("b"), p!("<b>c")), None, doc!(p!("ac")));
}

#[test]
fn test_delete_right_leaning_lift() {
	repl(doc!(blockquote!(p!("ab<a>c")), p!("d<b>ef")), None, doc!(blockquote!(p!("abef"))));
}

#[test]
fn test_delete_left_leaning_lift() {
	repl(doc!(p!("ab<a>c"), blockquote!(p!("d<b>ef"))), None, doc!(p!("abef")));
}

#[test]
fn test_overwrite_text() {
	repl(doc!(p!("hell<a>o y<b>ou")), Some(doc!(p!("<a>i k<b>"))), doc!(p!("helli kou")));
}

#[test]
fn test_insert_text() {
	repl(doc!(p!("hell<a><b>o")), Some(doc!(p!("<a>i k<b>"))), doc!(p!("helli ko")));
}

#[test]
fn test_split_paragraph_with_open_slice() {
	repl(doc!(p!("hell<a>o")), Some(doc!(p!("hi<a>"), p!("<b>there"))), doc!(p!("hell"), p!("o")));
}

#[test]
fn test_insert_while_joining_textblocks() {
	repl(doc!(h1!("he<a>llo"), p!("arg<b>!")), Some(doc!(p!("1<a>2<b>3"))), doc!(h1!("he2!")));
}

#[test]
fn test_match_open_list_items() {
	repl(
		doc!(ol!(li!(p!("one<a>")), li!(p!("three")))),
		Some(doc!(ol!(li!(p!("<a>half")), li!(p!("two")), "<b>"))),
		doc!(ol!(li!(p!("onehalf")), li!(p!("two")), li!(p!("three")))),
	);
}

#[test]
fn test_insert_paragraph_at_end_of_blockquote() {
	let doc = doc!(blockquote!(p!("hey"), "<a>"));
	let mut tr = Transform::new(doc.node.clone());
	tr.insert(doc.tag("a"), p!().node).unwrap();
	assert_eq!(tr.doc(), &doc!(blockquote!(p!("hey"), p!())).node);
}

#[test]
fn test_empty_replace_adds_no_step() {
	let doc = doc!(p!("a<a>b"));
	let mut tr = Transform::new(doc.node.clone());
	tr.replace(doc.tag("a"), doc.tag("a"), Slice::empty()).unwrap();
	assert!(!tr.doc_changed());
	assert_eq!(replace_step(&doc, 2, 2, &Slice::empty()).unwrap(), None);
}

#[test]
fn test_trivial_fit_is_a_single_replace_step() {
	let doc = doc!(p!("one"), "<a>", p!("two"));
	let slice = Slice::closed(Fragment::from_node(hr!().node));
	let step = replace_step(&doc, doc.tag("a"), doc.tag("a"), &slice).unwrap();
	assert_eq!(step, Some(ReplaceStep::new(5, 5, slice, false).into()));
}

#[test]
fn test_replace_range_replaces_inline_content() {
	range_repl(doc!(p!("foo<a>b<b>ar")), Some(doc!(p!("<a>xx<b>"))), doc!(p!("fooxxar")));
}

#[test]
fn test_replace_range_turns_empty_paragraph_into_heading() {
	range_repl(doc!(p!("<a>")), Some(doc!(h1!("<a>text<b>"))), doc!(h1!("text")));
}

#[test]
fn test_replace_range_turns_selected_paragraph_into_heading() {
	range_repl(doc!(p!("<a>abc<b>")), Some(doc!(h1!("<a>text<b>"))), doc!(h1!("text")));
}

#[test]
fn test_replace_range_recreates_list() {
	range_repl(doc!(p!("<a>")), Some(doc!(ul!(li!(p!("<a>foobar<b>"))))), doc!(ul!(li!(p!("foobar")))));
}

#[test]
fn test_replace_range_with_empty_slice_deletes() {
	range_repl(doc!(p!("a"), blockquote!(p!("<a>one<b>")), p!("c")), None, doc!(p!("a"), blockquote!(p!()), p!("c")));
}

#[test]
fn test_delete_range_empties_covered_textblock() {
	let doc = doc!(p!("a"), blockquote!(p!("<a>one<b>")), p!("c"));
	let mut tr = Transform::new(doc.node.clone());
	tr.delete_range(doc.tag("a"), doc.tag("b")).unwrap();
	assert_eq!(tr.doc(), &doc!(p!("a"), blockquote!(p!()), p!("c")).node);
}

#[test]
fn test_delete_range_joins_sibling_textblocks() {
	let doc = doc!(blockquote!(p!("<a>a"), p!("b<b>")), p!("c"));
	let mut tr = Transform::new(doc.node.clone());
	tr.delete_range(doc.tag("a"), doc.tag("b")).unwrap();
	assert_eq!(tr.doc(), &doc!(blockquote!(p!()), p!("c")).node);
	assert_invertible(&tr);
}

#[test]
fn test_replace_range_with_inline_node() {
	let doc = doc!(p!("fo<a>o"));
	let mut tr = Transform::new(doc.node.clone());
	tr.replace_range_with(doc.tag("a"), doc.tag("a"), img!().node).unwrap();
	assert_eq!(tr.doc(), &doc!(p!("fo", img!(), "o")).node);
}

#[test]
fn test_replace_range_with_replaces_selected_text() {
	let doc = doc!(p!("<a>fo<b>o"));
	let mut tr = Transform::new(doc.node.clone());
	tr.replace_range_with(doc.tag("a"), doc.tag("b"), img!().node).unwrap();
	assert_eq!(tr.doc(), &doc!(p!(img!(), "o")).node);
}

#[test]
fn test_replace_range_with_splits_text_for_block() {
	let doc = doc!(p!("foo<a>bar"));
	let mut tr = Transform::new(doc.node.clone());
	tr.replace_range_with(doc.tag("a"), doc.tag("a"), blockquote!(p!("hi")).node).unwrap();
	assert_eq!(tr.doc(), &doc!(p!("foo"), blockquote!(p!("hi")), p!("bar")).node);
	assert_invertible(&tr);
}

#[test]
fn test_replace_range_with_moves_block_to_paragraph_end() {
	let doc = doc!(p!("foo<a>"), p!("bar"));
	let mut tr = Transform::new(doc.node.clone());
	tr.replace_range_with(doc.tag("a"), doc.tag("a"), hr!().node).unwrap();
	assert_eq!(tr.doc(), &doc!(p!("foo"), hr!(), p!("bar")).node);
}

#[test]
fn test_opens_node_that_fits_nowhere() {
	let doc = doc!(p!("ab"));
	let slice = Slice::closed(Fragment::from_node(doc!(p!("x")).node));
	let mut tr = Transform::new(doc.node.clone());
	tr.replace(0, 0, slice).unwrap();
	assert_eq!(tr.doc(), &doc!(p!("x"), p!("ab")).node);
	assert_invertible(&tr);
}
