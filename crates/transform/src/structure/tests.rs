use pretty_assertions::assert_eq;
use quire_model::testing::{TaggedNode, block, schema};
use quire_model::{Attrs, Fragment, NodeRange, NodeType, Schema, SchemaSpec, blockquote, doc, em, h1, h2, hr, img, li, ol, p, pre, ul};
use rstest::rstest;
use serde_json::json;

use super::*;

fn node_type(name: &str) -> NodeType {
	schema().node_type(name).unwrap()
}

fn attrs(value: serde_json::Value) -> Attrs {
	value.as_object().unwrap().clone().into_iter().collect()
}

fn range(doc: &TaggedNode) -> NodeRange {
	let from = doc.resolve(doc.tag("a")).unwrap();
	let to = doc.resolve(doc.try_tag("b").unwrap_or(doc.tag("a"))).unwrap();
	from.block_range(&to, None).unwrap()
}

fn lift(doc: TaggedNode, expect: TaggedNode) {
	let range = range(&doc);
	let target = lift_target(&range).expect("range should be liftable");
	let mut tr = Transform::new(doc.node.clone());
	tr.lift(&range, target).unwrap();
	assert_eq!(tr.doc(), &expect.node);
}

#[test]
fn test_lift_out_of_blockquote() {
	lift(doc!(blockquote!(p!("<a>hello"))), doc!(p!("hello")));
}

#[test]
fn test_lift_from_start_of_blockquote() {
	lift(doc!(blockquote!(p!("<a>one"), p!("two"))), doc!(p!("one"), blockquote!(p!("two"))));
}

#[test]
fn test_lift_from_end_of_blockquote() {
	lift(doc!(blockquote!(p!("one"), p!("<a>two"))), doc!(blockquote!(p!("one")), p!("two")));
}

#[test]
fn test_lift_splits_blockquote() {
	lift(
		doc!(blockquote!(p!("one"), p!("<a>two"), p!("three"))),
		doc!(blockquote!(p!("one")), p!("two"), blockquote!(p!("three"))),
	);
}

#[test]
fn test_lift_target_at_top_level_is_none() {
	let doc = doc!(p!("<a>hello"));
	assert_eq!(lift_target(&range(&doc)), None);
}

fn wrap(doc: TaggedNode, expect: TaggedNode, type_name: &str) {
	let range = range(&doc);
	let wrappers = find_wrapping(&range, &node_type(type_name), None, None).expect("range should be wrappable");
	let mut tr = Transform::new(doc.node.clone());
	tr.wrap(&range, &wrappers).unwrap();
	assert_eq!(tr.doc(), &expect.node);
}

#[test]
fn test_wrap_in_blockquote() {
	wrap(doc!(p!("one"), p!("<a>two"), p!("three")), doc!(p!("one"), blockquote!(p!("two")), p!("three")), "blockquote");
}

#[test]
fn test_wrap_two_paragraphs() {
	wrap(doc!(p!("one<a>"), p!("two<b>"), p!("three")), doc!(blockquote!(p!("one"), p!("two")), p!("three")), "blockquote");
}

#[test]
fn test_wrap_in_list_adds_list_item() {
	let doc = doc!(p!("<a>one"), p!("<b>two"));
	let wrappers = find_wrapping(&range(&doc), &node_type("ordered_list"), None, None).unwrap();
	let names: Vec<&str> = wrappers.iter().map(|w| w.node_type.name()).collect();
	assert_eq!(names, ["ordered_list", "list_item"]);
	wrap(doc, doc!(ol!(li!(p!("one"), p!("two")))), "ordered_list");
}

#[test]
fn test_find_wrapping_rejects_impossible_wrapper() {
	let doc = doc!(p!("<a>one"));
	assert_eq!(find_wrapping(&range(&doc), &node_type("heading"), None, None), None);
}

#[test]
fn test_wrap_rejects_mismatched_chain() {
	let doc = doc!(p!("<a>one"));
	let mut tr = Transform::new(doc.node.clone());
	let wrappers = [Wrapper::from(node_type("paragraph")), Wrapper::from(node_type("blockquote"))];
	let err = tr.wrap(&range(&doc), &wrappers).unwrap_err();
	assert_eq!(err.to_string(), "Wrapper type given to Transform.wrap does not form valid content of its parent wrapper");
	assert!(!tr.doc_changed());
}

fn split(doc: TaggedNode, expect: TaggedNode, depth: usize, types_after: &[Option<Wrapper>]) {
	let pos = doc.tag("a");
	assert!(can_split(&doc, pos, depth, types_after));
	let mut tr = Transform::new(doc.node.clone());
	tr.split(pos, depth, types_after).unwrap();
	assert_eq!(tr.doc(), &expect.node);
}

#[test]
fn test_split_textblock() {
	split(doc!(p!("foo<a>bar")), doc!(p!("foo"), p!("bar")), 1, &[]);
}

#[test]
fn test_split_two_deep() {
	split(
		doc!(blockquote!(blockquote!(p!("foo<a>bar"))), p!("after")),
		doc!(blockquote!(blockquote!(p!("foo")), blockquote!(p!("bar"))), p!("after")),
		2,
		&[],
	);
}

#[test]
fn test_split_at_edges() {
	split(doc!(blockquote!(p!("hello<a>"))), doc!(blockquote!(p!("hello"), p!())), 1, &[]);
	split(doc!(blockquote!(p!("<a>hello"))), doc!(blockquote!(p!(), p!("hello"))), 1, &[]);
}

#[test]
fn test_split_list_item() {
	split(doc!(ol!(li!(p!("one<a>")), li!(p!("two")))), doc!(ol!(li!(p!("one")), li!(p!()), li!(p!("two")))), 2, &[]);
}

#[test]
fn test_split_into_other_type() {
	split(doc!(h1!("hell<a>o!")), doc!(h1!("hell"), p!("o!")), 1, &[Some(Wrapper::from(node_type("paragraph")))]);
}

#[rstest]
#[case::outside_document(doc!(p!("foo")), 0, 1)]
#[case::too_deep(doc!(p!("fo<a>o")), 2, 2)]
fn test_can_split_rejects(#[case] doc: TaggedNode, #[case] pos: usize, #[case] depth: usize) {
	assert!(!can_split(&doc, pos, depth, &[]));
}

#[test]
fn test_can_split_checks_content_of_new_type() {
	let doc = doc!(p!("foo<a>bar"));
	let list = Some(Wrapper::from(node_type("bullet_list")));
	assert!(!can_split(&doc, doc.tag("a"), 1, &[list]));
}

#[test]
fn test_join_blocks() {
	let doc = doc!(blockquote!(p!("a")), "<a>", blockquote!(p!("b")), p!("after"));
	assert!(can_join(&doc, doc.tag("a")));
	let mut tr = Transform::new(doc.node.clone());
	tr.join(doc.tag("a"), 1).unwrap();
	assert_eq!(tr.doc(), &doc!(blockquote!(p!("a"), p!("b")), p!("after")).node);
}

#[test]
fn test_join_compatible_textblocks() {
	let doc = doc!(h1!("foo"), "<a>", p!("bar"));
	let mut tr = Transform::new(doc.node.clone());
	tr.join(doc.tag("a"), 1).unwrap();
	assert_eq!(tr.doc(), &doc!(h1!("foobar")).node);
}

#[test]
fn test_can_join_rejects_leaf() {
	let doc = doc!(p!("foo"), "<a>", hr!());
	assert!(!can_join(&doc, doc.tag("a")));
}

#[test]
fn test_join_point_searches_outward() {
	let doc = doc!(blockquote!(p!("a")), blockquote!(p!("<a>b")));
	assert_eq!(join_point(&doc, doc.tag("a"), Bias::Left), Some(5));
	assert_eq!(join_point(&doc, doc.tag("a"), Bias::Right), None);
}

#[rstest]
#[case::at_paragraph_end(doc!(p!("foo<a>"), p!("bar")), Some(5))]
#[case::at_paragraph_start(doc!(p!("foo"), p!("<a>bar")), Some(5))]
#[case::inside_text(doc!(p!("fo<a>o")), None)]
fn test_insert_point(#[case] doc: TaggedNode, #[case] expect: Option<usize>) {
	assert_eq!(insert_point(&doc, doc.tag("a"), &node_type("horizontal_rule")).unwrap(), expect);
}

#[test]
fn test_drop_point_moves_block_out_of_textblock() {
	let doc = doc!(p!("f<a>oobar"));
	let slice = Slice::closed(Fragment::from_node(hr!().node));
	assert_eq!(drop_point(&doc, doc.tag("a"), &slice).unwrap(), Some(0));
	let inline = Slice::closed(Fragment::from_node(img!().node));
	assert_eq!(drop_point(&doc, doc.tag("a"), &inline).unwrap(), Some(doc.tag("a")));
}

fn set_type(doc: TaggedNode, expect: TaggedNode, type_name: &str, type_attrs: Option<Attrs>) {
	let to = doc.try_tag("b").unwrap_or(doc.tag("a"));
	let mut tr = Transform::new(doc.node.clone());
	tr.set_block_type(doc.tag("a"), to, &node_type(type_name), type_attrs.as_ref()).unwrap();
	assert_eq!(tr.doc(), &expect.node);
}

#[test]
fn test_set_block_type_single_textblock() {
	set_type(doc!(p!("am<a> i")), doc!(h2!("am i")), "heading", Some(attrs(json!({"level": 2}))));
}

#[test]
fn test_set_block_type_multiple_blocks() {
	set_type(
		doc!(h1!("<a>hello"), p!("there"), p!("<b>you"), p!("end")),
		doc!(pre!("hello"), pre!("there"), pre!("you"), p!("end")),
		"code_block",
		None,
	);
}

#[test]
fn test_set_block_type_in_wrapper() {
	set_type(
		doc!(blockquote!(p!("one<a>"), p!("two<b>"))),
		doc!(blockquote!(h1!("one"), h1!("two"))),
		"heading",
		Some(attrs(json!({"level": 1}))),
	);
}

#[test]
fn test_set_block_type_clears_marks() {
	set_type(doc!(p!("hello<a> ", em!("world"))), doc!(pre!("hello world")), "code_block", None);
}

#[test]
fn test_set_block_type_drops_disallowed_nodes() {
	set_type(doc!(p!("<a>one", img!(), "two", img!(), "three")), doc!(pre!("onetwothree")), "code_block", None);
}

#[test]
fn test_set_block_type_replaces_newlines() {
	set_type(doc!(pre!("<a>one\ntwo\nthree")), doc!(p!("one two three")), "paragraph", None);
}

#[test]
fn test_set_block_type_rewrites_marked_textblock_of_same_type() {
	let spec = json!({
		"nodes": {
			"doc": {"content": "block+", "marks": "_"},
			"paragraph": {"content": "text*", "group": "block"},
			"text": {}
		},
		"marks": {"em": {}}
	});
	let schema = Schema::new(SchemaSpec::from_json(&spec).unwrap()).unwrap();
	let em = schema.mark("em", None).unwrap();
	let para = schema.node("paragraph", None, Fragment::from_node(schema.text("ab", Vec::new())), vec![em]).unwrap();
	let doc = schema.node("doc", None, Fragment::from_node(para), Vec::new()).unwrap();
	let paragraph = schema.node_type("paragraph").unwrap();

	let mut tr = Transform::new(doc.clone());
	tr.set_block_type(1, 1, &paragraph, None).unwrap();
	assert_eq!(tr.steps().len(), 1);
	assert_eq!(tr.doc(), &doc);
}

#[test]
fn test_set_block_type_requires_textblock() {
	let doc = doc!(p!("<a>x"));
	let mut tr = Transform::new(doc.node.clone());
	let err = tr.set_block_type(1, 1, &node_type("blockquote"), None).unwrap_err();
	assert_eq!(err.to_string(), "Type given to setBlockType should be a textblock");
}

#[test]
fn test_set_node_markup_textblock() {
	let doc = doc!(p!("foo"));
	let mut tr = Transform::new(doc.node.clone());
	tr.set_node_markup(0, Some(&node_type("heading")), Some(&attrs(json!({"level": 1}))), None).unwrap();
	assert_eq!(tr.doc(), &doc!(h1!("foo")).node);
}

#[test]
fn test_set_node_markup_inline_leaf() {
	let doc = doc!(p!("foo<a>", img!(), "bar"));
	let mut tr = Transform::new(doc.node.clone());
	let image_attrs = attrs(json!({"src": "bar", "alt": "y"}));
	tr.set_node_markup(doc.tag("a"), None, Some(&image_attrs), None).unwrap();
	let image = block("image", Some(json!({"src": "bar", "alt": "y"})), Vec::new());
	assert_eq!(tr.doc(), &doc!(p!("foo", image, "bar")).node);
}

#[rstest]
#[case::no_node(5, "bullet_list", "No node at given position")]
#[case::invalid_content(0, "bullet_list", "Invalid content for node type bullet_list")]
fn test_set_node_markup_errors(#[case] pos: usize, #[case] type_name: &str, #[case] message: &str) {
	let doc = doc!(p!("foo"));
	let mut tr = Transform::new(doc.node.clone());
	let err = tr.set_node_markup(pos, Some(&node_type(type_name)), None, None).unwrap_err();
	assert_eq!(err.to_string(), message);
}

#[test]
fn test_lift_list_item_out_of_list() {
	let doc = doc!(ul!(li!(p!("<a>one"))), p!("after"));
	let range = range(&doc);
	assert_eq!(range.depth(), 2);
	let target = lift_target(&range).unwrap();
	assert_eq!(target, 0);
	let mut tr = Transform::new(doc.node.clone());
	tr.lift(&range, target).unwrap();
	assert_eq!(tr.doc(), &doc!(p!("one"), p!("after")).node);
}
