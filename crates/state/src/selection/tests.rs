use pretty_assertions::assert_eq;
use quire_model::testing::{TaggedNode, schema};
use quire_model::{blockquote, br, doc, hr, img, p};
use quire_transform::Transform;
use rstest::rstest;

use super::*;

/// `p("ab")` at 0..4, `hr` at 4..5, `blockquote(p("cd"))` at 5..11.
fn mixed() -> TaggedNode {
	doc!(p!("ab"), hr!(), blockquote!(p!("cd")))
}

#[test]
fn test_start_and_end_find_cursor_positions() {
	let doc = mixed();
	assert_eq!(Selection::at_start(&doc), Selection::Text { anchor: 1, head: 1 });
	assert_eq!(Selection::at_end(&doc), Selection::Text { anchor: 9, head: 9 });
}

#[test]
fn test_start_selects_leading_node() {
	let doc = doc!(hr!(), p!("x"));
	assert_eq!(Selection::at_start(&doc), Selection::Node { from: 0, to: 1 });
}

#[test]
fn test_accessors() {
	let sel = Selection::Text { anchor: 7, head: 3 };
	assert_eq!((sel.from(), sel.to(), sel.empty()), (3, 7, false));
	assert_eq!(sel.cursor_pos(), None);

	let all = Selection::all(&mixed());
	assert_eq!((all.anchor(), all.head()), (0, 11));
	assert_eq!(Selection::Text { anchor: 2, head: 2 }.cursor_pos(), Some(2));
}

#[test]
fn test_node_selection() {
	let doc = mixed();
	assert_eq!(Selection::node(&doc, 4).unwrap(), Selection::Node { from: 4, to: 5 });
	let err = Selection::node(&doc!(p!("a")), 3).unwrap_err();
	assert_eq!(err.to_string(), "No node after position 3");
}

#[test]
fn test_selection_content() {
	let doc = doc!(p!("abc"));
	let sel = Selection::text(&doc, 1, 3).unwrap();
	assert_eq!(sel.content(&doc).unwrap().content.text_between(0, 2, "", ""), "ab");
}

#[rstest]
#[case::node_ahead(4, Bias::Right, Selection::Node { from: 4, to: 5 })]
#[case::cursor_behind(4, Bias::Left, Selection::Text { anchor: 3, head: 3 })]
#[case::inside_text(2, Bias::Left, Selection::Text { anchor: 2, head: 2 })]
#[case::into_blockquote(5, Bias::Right, Selection::Text { anchor: 7, head: 7 })]
fn test_near(#[case] pos: usize, #[case] bias: Bias, #[case] expect: Selection) {
	let doc = mixed();
	assert_eq!(Selection::near(&doc.resolve(pos).unwrap(), bias).unwrap(), expect);
}

#[test]
fn test_near_selects_lone_leaf() {
	let doc = doc!(hr!());
	assert_eq!(Selection::near(&doc.resolve(0).unwrap(), Bias::Right).unwrap(), Selection::Node { from: 0, to: 1 });
}

#[test]
fn test_between_moves_block_positions_into_text() {
	let doc = mixed();
	let at = doc.resolve(4).unwrap();
	assert_eq!(Selection::between(&at, &at, None).unwrap(), Selection::Text { anchor: 7, head: 7 });

	let anchor = doc.resolve(1).unwrap();
	let head = doc.resolve(5).unwrap();
	assert_eq!(Selection::between(&anchor, &head, None).unwrap(), Selection::Text { anchor: 1, head: 3 });
}

#[test]
fn test_map_text_selection_through_insertion() {
	let doc = doc!(p!("a<a>b"));
	let sel = Selection::cursor(&doc, doc.tag("a")).unwrap();
	let mut tr = Transform::new(doc.node.clone());
	tr.insert(1, schema().text("xyz", Vec::new())).unwrap();
	assert_eq!(sel.map(tr.doc(), tr.mapping()).unwrap(), Selection::Text { anchor: 5, head: 5 });
}

#[test]
fn test_map_node_selection_of_deleted_node() {
	let doc = mixed();
	let sel = Selection::node(&doc, 4).unwrap();
	let mut tr = Transform::new(doc.node.clone());
	tr.delete(4, 5).unwrap();
	assert_eq!(sel.map(tr.doc(), tr.mapping()).unwrap(), Selection::Text { anchor: 6, head: 6 });
}

#[test]
fn test_map_node_selection_survives_unrelated_edit() {
	let doc = mixed();
	let sel = Selection::node(&doc, 4).unwrap();
	let mut tr = Transform::new(doc.node.clone());
	tr.delete(1, 2).unwrap();
	assert_eq!(sel.map(tr.doc(), tr.mapping()).unwrap(), Selection::Node { from: 3, to: 4 });
}

#[test]
fn test_map_all_selection_tracks_size() {
	let doc = mixed();
	let mut tr = Transform::new(doc.node.clone());
	tr.delete(4, 5).unwrap();
	assert_eq!(Selection::all(&doc).map(tr.doc(), tr.mapping()).unwrap(), Selection::All { size: 10 });
}

#[test]
fn test_bookmark_round_trip() {
	let doc = doc!(p!("a", img!()));
	let sel = Selection::node(&doc, 2).unwrap();
	assert_eq!(sel.bookmark(), SelectionBookmark::Node { pos: 2 });
	assert_eq!(sel.bookmark().resolve(&doc).unwrap(), sel);
}

#[test]
fn test_bookmark_of_unselectable_node_resolves_to_cursor() {
	let doc = doc!(p!("a", br!()));
	let bookmark = SelectionBookmark::Node { pos: 2 };
	assert_eq!(bookmark.resolve(&doc).unwrap(), Selection::Text { anchor: 2, head: 2 });
}

#[test]
fn test_deleted_node_bookmark_becomes_cursor() {
	let doc = mixed();
	let mut tr = Transform::new(doc.node.clone());
	tr.delete(4, 5).unwrap();
	let mapped = SelectionBookmark::Node { pos: 4 }.map(tr.mapping());
	assert_eq!(mapped, SelectionBookmark::Text { anchor: 4, head: 4 });
	assert_eq!(mapped.resolve(tr.doc()).unwrap(), Selection::Text { anchor: 6, head: 6 });
}
