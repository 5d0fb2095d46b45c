use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use crate::testing::{TaggedNode, schema};
use crate::{Fragment, Node, Slice, blockquote, br, doc, em, h1, img, li, p, strong, ul};

fn replace_between(source: &TaggedNode, insert: Option<&TaggedNode>) -> crate::Result<Node> {
	let slice = match insert {
		Some(ins) => ins.slice(ins.tag("a"), ins.tag("b"), false)?,
		None => Slice::empty(),
	};
	source.replace(source.tag("a"), source.tag("b"), &slice)
}

#[test]
fn test_builder_tags() {
	let d = doc!(p!("he<a>llo"), blockquote!(p!("<b>x")));
	assert_eq!(d.tag("a"), 3);
	assert_eq!(d.tag("b"), 9);
	assert_eq!(d.content().size(), 12);
}

#[test]
fn test_display() {
	let d = doc!(p!("ab", em!("cd")), p!());
	assert_eq!(d.to_string(), r#"doc(paragraph("ab", em("cd")), paragraph)"#);
}

#[test]
fn test_text_is_joined_by_builder() {
	let d = p!("foo", "bar");
	assert_eq!(d.child_count(), 1);
	assert_eq!(d.text_content(), "foobar");
}

#[test]
fn test_node_size_counts_chars() {
	let d = p!("héllo");
	assert_eq!(d.node_size(), 7);
	assert_eq!(d.child(0).node_size(), 5);
}

#[test]
fn test_text_between() {
	let d = doc!(p!("ab"), blockquote!(p!("cd")), p!(img!()));
	assert_eq!(d.text_between(0, d.content().size(), "\n", "*"), "ab\ncd\n*");
	assert_eq!(d.text_between(2, 8, "", ""), "bcd");
}

#[test]
fn test_nodes_between_visits_in_order() {
	let d = doc!(p!("ab"), blockquote!(p!("cd")));
	let mut seen = Vec::new();
	d.nodes_between(0, d.content().size(), &mut |node, pos, _, _| {
		seen.push((node.node_type().name().to_string(), pos));
		true
	});
	assert_eq!(
		seen,
		vec![
			("paragraph".to_string(), 0),
			("text".to_string(), 1),
			("blockquote".to_string(), 4),
			("paragraph".to_string(), 5),
			("text".to_string(), 6),
		]
	);
}

#[test]
fn test_resolve_paths() {
	let d = doc!(p!("ab"), blockquote!(p!("cd")));
	let r = d.resolve(5).unwrap();
	assert_eq!(r.depth(), 1);
	assert_eq!(r.parent().node_type().name(), "blockquote");
	assert_eq!(r.parent_offset(), 0);
	assert_eq!(r.start(1), 5);
	assert_eq!(r.end(1), 9);
	assert_eq!(r.before(1).unwrap(), 4);
	assert_eq!(r.after(1).unwrap(), 10);
	assert_eq!(r.index(0), 1);

	let r = d.resolve(7).unwrap();
	assert_eq!(r.depth(), 2);
	assert_eq!(r.text_offset(), 1);
	assert_eq!(r.node_before().unwrap().text(), Some("c"));
	assert_eq!(r.node_after().unwrap().text(), Some("d"));
	assert!(r.before(0).is_err());
}

#[test]
fn test_resolve_out_of_range() {
	let d = doc!(p!("ab"));
	assert!(d.resolve(5).is_err());
}

#[test]
fn test_marks_at_position() {
	let d = doc!(p!("a", em!("bc"), "d"));
	let r = d.resolve(3).unwrap();
	assert_eq!(r.marks().len(), 1);
	let r = d.resolve(2).unwrap();
	assert!(r.marks().is_empty());
	let r = d.resolve(4).unwrap();
	assert_eq!(r.marks().len(), 1);
}

#[test]
fn test_block_range() {
	let d = doc!(p!("<a>ab"), p!("c<b>d"));
	let from = d.resolve(d.tag("a")).unwrap();
	let to = d.resolve(d.tag("b")).unwrap();
	let range = from.block_range(&to, None).unwrap();
	assert_eq!(range.depth(), 0);
	assert_eq!(range.start(), 0);
	assert_eq!(range.end(), 8);
	assert_eq!((range.start_index(), range.end_index()), (0, 2));
}

#[test]
fn test_slice_open_depths() {
	let d = doc!(p!("ab"), p!("cd"));
	let slice = d.slice(2, 6, false).unwrap();
	assert_eq!(slice.open_start, 1);
	assert_eq!(slice.open_end, 1);
	assert_eq!(slice.to_string(), r#"<paragraph("b"), paragraph("c")>(1,1)"#);
	assert_eq!(slice.size(), 2);
}

#[test]
fn test_slice_inside_textblock_is_flat() {
	let d = doc!(p!("abcd"));
	let slice = d.slice(2, 4, false).unwrap();
	assert_eq!((slice.open_start, slice.open_end), (0, 0));
	assert_eq!(slice.content.to_string(), r#"<"bc">"#);
}

#[rstest]
#[case::joins_on_delete(doc!(p!("on<a>e"), p!("t<b>wo")), None, doc!(p!("onwo")))]
#[case::merges_matching_blocks(
	doc!(p!("on<a>e"), p!("t<b>wo")),
	Some(doc!(p!("xx<a>xx"), p!("yy<b>yy"))),
	doc!(p!("onxx"), p!("yywo"))
)]
#[case::inserts_inline(doc!(p!("a<a><b>b")), Some(doc!(p!("x<a>yz<b>"))), doc!(p!("ayzb")))]
#[case::keeps_marks(doc!(p!("a<a>b<b>c")), Some(doc!(p!(strong!("<a>x<b>")))), doc!(p!("a", strong!("x"), "c")))]
fn test_replace(
	#[case] source: TaggedNode,
	#[case] insert: Option<TaggedNode>,
	#[case] expected: TaggedNode,
) {
	let result = replace_between(&source, insert.as_ref()).unwrap();
	result.check().unwrap();
	assert_eq!(result, expected.node);
}

#[test]
fn test_replace_rejects_bad_join() {
	let d = doc!(p!("a<a>b"));
	let slice = Slice::new(Fragment::from(blockquote!(p!("x")).node), 1, 1);
	let err = d.replace(d.tag("a"), d.tag("a"), &slice).unwrap_err();
	assert!(err.is_replace());
	assert_eq!(err.to_string(), "Cannot join blockquote onto paragraph");
}

#[test]
fn test_replace_rejects_invalid_content() {
	let d = doc!(p!("a<a>b"));
	let slice = Slice::closed(Fragment::from(blockquote!(p!("x")).node));
	assert!(d.replace(d.tag("a"), d.tag("a"), &slice).is_err());
}

#[test]
fn test_replace_rejects_deep_slice() {
	let d = doc!(p!("<a>"));
	let slice = Slice::new(Fragment::from(ul!(li!(p!("x"))).node), 3, 3);
	let err = d.replace(d.tag("a"), d.tag("a"), &slice).unwrap_err();
	assert_eq!(err.to_string(), "Inserted content deeper than insertion position");
}

#[test]
fn test_node_at_and_children() {
	let d = doc!(p!("ab", br!()), p!("cd"));
	assert_eq!(d.node_at(0).unwrap().node_type().name(), "paragraph");
	assert_eq!(d.node_at(1).unwrap().text(), Some("ab"));
	assert_eq!(d.node_at(3).unwrap().node_type().name(), "hard_break");
	let after = d.child_after(5);
	assert_eq!((after.index, after.offset), (1, 5));
	let before = d.child_before(5);
	assert_eq!((before.index, before.offset), (0, 0));
}

#[test]
fn test_can_replace_with() {
	let d = doc!(p!("a"));
	let para = schema().node_type("paragraph").unwrap();
	let item = schema().node_type("list_item").unwrap();
	assert!(d.can_replace_with(0, 1, &para, None));
	assert!(!d.can_replace_with(0, 1, &item, None));
}

#[test]
fn test_range_has_mark() {
	let d = doc!(p!("a", em!("b"), "c"));
	let em_type = schema().mark_type("em").unwrap();
	assert!(d.range_has_mark(1, 4, &em_type));
	assert!(!d.range_has_mark(1, 2, &em_type));
}

#[test]
fn test_json_shape() {
	let d = doc!(h1!("x"), p!(em!("y")));
	let json = d.to_json();
	assert_eq!(
		json,
		json!({
			"type": "doc",
			"content": [
				{"type": "heading", "attrs": {"level": 1}, "content": [{"type": "text", "text": "x"}]},
				{"type": "paragraph", "content": [{"type": "text", "marks": [{"type": "em"}], "text": "y"}]}
			]
		})
	);
	let back = Node::from_json(&schema(), &json).unwrap();
	assert_eq!(back, d.node);
}

#[test]
fn test_from_json_rejects_empty_text() {
	let json = json!({"type": "paragraph", "content": [{"type": "text", "text": ""}]});
	assert!(Node::from_json(&schema(), &json).is_err());
}

#[test]
fn test_check_rejects_invalid_content() {
	let para = schema().node_type("paragraph").unwrap();
	let bad = para.create(None, Fragment::from(p!("x").node), Vec::new()).unwrap();
	assert!(bad.check().is_err());
	assert!(para.create_checked(None, Fragment::from(p!("x").node), Vec::new()).is_err());
}

#[test]
fn test_slice_json() {
	let d = doc!(p!("ab"), p!("cd"));
	let slice = d.slice(2, 6, false).unwrap();
	let json = slice.to_json();
	assert_eq!(json["openStart"], json!(1));
	let back = Slice::from_json(&schema(), Some(&json)).unwrap();
	assert_eq!(back, slice);
	assert_eq!(Slice::from_json(&schema(), None).unwrap(), Slice::empty());
}
