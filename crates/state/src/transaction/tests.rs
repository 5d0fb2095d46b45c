use pretty_assertions::assert_eq;
use quire_model::testing::{TaggedNode, schema};
use quire_model::{doc, em, p, strong};

use super::*;
use crate::meta::ADD_TO_HISTORY;

fn mark(name: &str) -> Mark {
	schema().mark(name, None).unwrap()
}

fn state(doc: &TaggedNode) -> EditorState {
	let selection = match (doc.try_tag("a"), doc.try_tag("b")) {
		(Some(a), Some(b)) => Selection::text(doc, a, b).unwrap(),
		(Some(a), None) => Selection::cursor(doc, a).unwrap(),
		_ => Selection::at_start(doc),
	};
	EditorState::create(doc.node.clone(), Some(selection))
}

#[test]
fn test_selection_maps_through_steps() {
	let doc = doc!(p!("ab<a>c"));
	let mut tr = state(&doc).tr();
	tr.insert_text("xy", Some(1), None).unwrap();
	assert_eq!(tr.doc(), &doc!(p!("xyabc")).node);
	assert_eq!(tr.selection().unwrap(), Selection::Text { anchor: 5, head: 5 });
	assert!(!tr.selection_set());
}

#[test]
fn test_insert_text_inherits_marks_at_cursor() {
	let doc = doc!(p!(em!("a<a>b")));
	let mut tr = state(&doc).tr();
	tr.insert_text("x", None, None).unwrap();
	assert_eq!(tr.doc(), &doc!(p!(em!("axb"))).node);
	assert_eq!(tr.selection().unwrap(), Selection::Text { anchor: 3, head: 3 });
	assert!(tr.selection_set());
}

#[test]
fn test_insert_text_uses_stored_marks() {
	let doc = doc!(p!("<a>ab"));
	let mut tr = state(&doc).tr();
	tr.set_stored_marks(Some(vec![mark("strong")]));
	tr.insert_text("x", Some(1), None).unwrap();
	assert_eq!(tr.doc(), &doc!(p!(strong!("x"), "ab")).node);
}

#[test]
fn test_insert_empty_text_deletes_range() {
	let doc = doc!(p!("abcd"));
	let mut tr = state(&doc).tr();
	tr.insert_text("", Some(2), Some(4)).unwrap();
	assert_eq!(tr.doc(), &doc!(p!("ad")).node);
}

#[test]
fn test_steps_invalidate_stored_marks() {
	let doc = doc!(p!("a<a>b"));
	let mut tr = state(&doc).tr();
	tr.set_stored_marks(Some(vec![mark("em")]));
	assert!(tr.stored_marks_set());
	assert_eq!(tr.stored_marks(), Some(&[mark("em")][..]));

	tr.insert(1, schema().text("x", Vec::new())).unwrap();
	assert_eq!(tr.stored_marks(), None);
	assert!(!tr.stored_marks_set());
}

#[test]
fn test_add_and_remove_stored_marks() {
	let doc = doc!(p!("a<a>b"));
	let mut tr = state(&doc).tr();
	tr.add_stored_mark(&mark("em")).unwrap();
	assert_eq!(tr.stored_marks(), Some(&[mark("em")][..]));
	tr.remove_stored_mark(&mark("em")).unwrap();
	assert_eq!(tr.stored_marks(), Some(&[][..]));
}

#[test]
fn test_ensure_marks_keeps_matching_set() {
	let doc = doc!(p!(em!("a<a>b")));
	let mut tr = state(&doc).tr();
	tr.ensure_marks(vec![mark("em")]).unwrap();
	assert!(!tr.stored_marks_set());
}

#[test]
fn test_set_selection() {
	let doc = doc!(p!("a<a>bc"));
	let mut tr = state(&doc).tr();
	tr.set_stored_marks(Some(vec![mark("em")]));
	tr.set_selection(Selection::Text { anchor: 1, head: 3 }).unwrap();
	assert_eq!(tr.stored_marks(), None);
	assert!(tr.selection_set());

	let err = tr.set_selection(Selection::Text { anchor: 1, head: 9 }).unwrap_err();
	assert_eq!(err.to_string(), "Selection passed to setSelection must point at the current document");
}

#[test]
fn test_delete_selection() {
	let doc = doc!(p!("a<a>bc<b>d"));
	let mut tr = state(&doc).tr();
	tr.delete_selection().unwrap();
	assert_eq!(tr.doc(), &doc!(p!("ad")).node);
	assert_eq!(tr.selection().unwrap(), Selection::Text { anchor: 2, head: 2 });
}

#[test]
fn test_delete_all_selection() {
	let doc = doc!(p!("a"), p!("b"));
	let state = EditorState::create(doc.node.clone(), Some(Selection::all(&doc)));
	let mut tr = state.tr();
	tr.delete_selection().unwrap();
	assert_eq!(tr.doc(), &doc!(p!()).node);
	assert_eq!(tr.selection().unwrap(), Selection::Text { anchor: 1, head: 1 });
}

#[test]
fn test_replace_selection_puts_cursor_after_inline_content() {
	let doc = doc!(p!("a<a>b"));
	let source = doc!(p!("<a>xy<b>"));
	let slice = source.slice(source.tag("a"), source.tag("b"), false).unwrap();
	let mut tr = state(&doc).tr();
	tr.replace_selection(slice).unwrap();
	assert_eq!(tr.doc(), &doc!(p!("axyb")).node);
	assert_eq!(tr.selection().unwrap(), Selection::Text { anchor: 4, head: 4 });
}

#[test]
fn test_meta() {
	let doc = doc!(p!("a"));
	let mut tr = state(&doc).tr();
	assert!(tr.is_generic());
	tr.set_meta(ADD_TO_HISTORY, false);
	assert_eq!(tr.get_meta::<bool>(ADD_TO_HISTORY), Some(&false));
	assert_eq!(tr.get_meta::<u64>(ADD_TO_HISTORY), None);
	assert!(tr.has_meta(ADD_TO_HISTORY));
	assert!(!tr.is_generic());
}

#[test]
fn test_time_and_scroll() {
	let doc = doc!(p!("a"));
	let mut tr = state(&doc).tr();
	assert!(tr.time() > 0);
	tr.set_time(42).scroll_into_view();
	assert_eq!(tr.time(), 42);
	assert!(tr.scrolled_into_view());
}
