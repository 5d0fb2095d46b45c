use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use super::*;
use crate::testing;
use crate::{doc, em, p};

fn schema_with(nodes: Value) -> Result<Schema> {
	Schema::from_json(&json!({"nodes": nodes}))
}

#[test]
fn test_test_schema_types() {
	let schema = testing::schema();
	assert_eq!(schema.top_node_type().name(), "doc");
	let para = schema.node_type("paragraph").unwrap();
	assert!(para.is_textblock());
	assert!(para.is_block());
	assert!(!para.is_leaf());
	let image = schema.node_type("image").unwrap();
	assert!(image.is_inline());
	assert!(image.is_leaf());
	assert!(image.has_required_attrs());
	assert!(!schema.node_type("hard_break").unwrap().is_selectable());
	assert!(schema.node_type("blockquote").unwrap().is_defining());
	assert_eq!(schema.node_type("code_block").unwrap().whitespace(), Whitespace::Pre);
}

#[test]
fn test_default_attrs() {
	let schema = testing::schema();
	let heading = schema.node_type("heading").unwrap();
	let node = heading.create(None, Fragment::empty(), Vec::new()).unwrap();
	assert_eq!(node.attr("level"), Some(&json!(1)));
	let image = schema.node_type("image").unwrap();
	assert!(image.create(None, Fragment::empty(), Vec::new()).is_err());
}

#[test]
fn test_mark_sets() {
	let schema = testing::schema();
	let code_block = schema.node_type("code_block").unwrap();
	let em_type = schema.mark_type("em").unwrap();
	assert!(!code_block.allows_mark_type(&em_type));
	assert!(schema.node_type("paragraph").unwrap().allows_mark_type(&em_type));
	assert!(!schema.mark_type("link").unwrap().is_inclusive());
}

#[test]
fn test_mark_add_to_set_orders_by_rank() {
	let schema = testing::schema();
	let em_mark = schema.mark("em", None).unwrap();
	let strong_mark = schema.mark("strong", None).unwrap();
	let set = strong_mark.add_to_set(&[]);
	let set = em_mark.add_to_set(&set);
	let names: Vec<_> = set.iter().map(|m| m.mark_type().name().to_string()).collect();
	assert_eq!(names, vec!["em", "strong"]);
	assert_eq!(em_mark.add_to_set(&set), set);
	assert_eq!(em_mark.remove_from_set(&set).len(), 1);
}

#[test]
fn test_mark_replaces_same_type() {
	let schema = testing::schema();
	let link_type = schema.mark_type("link").unwrap();
	let a: Attrs = [("href".to_string(), json!("a"))].into_iter().collect();
	let b: Attrs = [("href".to_string(), json!("b"))].into_iter().collect();
	let set = link_type.create(Some(&a)).unwrap().add_to_set(&[]);
	let set = link_type.create(Some(&b)).unwrap().add_to_set(&set);
	assert_eq!(set.len(), 1);
	assert_eq!(set[0].attrs().get("href"), Some(&json!("b")));
}

#[test]
fn test_content_match_fill_before() {
	let schema = testing::schema();
	let list_item = schema.node_type("list_item").unwrap();
	let filled = list_item.content_match().fill_before(&Fragment::empty(), true, 0).unwrap();
	assert_eq!(filled.to_string(), "<paragraph>");
}

#[test]
fn test_create_and_fill() {
	let schema = testing::schema();
	let quote = schema.node_type("blockquote").unwrap();
	let node = quote.create_and_fill(None, Fragment::empty(), Vec::new()).unwrap().unwrap();
	assert_eq!(node.to_string(), "blockquote(paragraph)");
}

#[test]
fn test_find_wrapping() {
	let schema = testing::schema();
	let doc_match = schema.top_node_type().content_match();
	let item = schema.node_type("list_item").unwrap();
	let wrap = doc_match.find_wrapping(&item).unwrap();
	let names: Vec<_> = wrap.iter().map(|t| t.name().to_string()).collect();
	assert_eq!(names, vec!["ordered_list"]);
	let para = schema.node_type("paragraph").unwrap();
	assert!(doc_match.find_wrapping(&para).unwrap().is_empty());
}

#[rstest]
#[case::star("paragraph*", 0, true)]
#[case::plus("paragraph+", 0, false)]
#[case::plus_one("paragraph+", 1, true)]
#[case::range_low("paragraph{2,3}", 1, false)]
#[case::range_ok("paragraph{2,3}", 2, true)]
#[case::range_high("paragraph{2,3}", 4, false)]
#[case::open_range("paragraph{2,}", 5, true)]
#[case::optional("paragraph?", 1, true)]
fn test_content_expression_counts(#[case] expr: &str, #[case] count: usize, #[case] valid: bool) {
	let schema = schema_with(json!({
		"doc": {"content": expr},
		"paragraph": {"content": "text*"},
		"text": {}
	}))
	.unwrap();
	let para = schema.node_type("paragraph").unwrap().create(None, Fragment::empty(), Vec::new()).unwrap();
	let content = Fragment::from_vec(vec![para; count]);
	let matched = schema.top_node_type().content_match().match_fragment(&content, 0, count);
	assert_eq!(matched.is_some_and(|m| m.valid_end()), valid);
}

#[test]
fn test_sequence_and_choice() {
	let schema = schema_with(json!({
		"doc": {"content": "heading (paragraph | rule)*"},
		"heading": {"content": "text*"},
		"paragraph": {"content": "text*"},
		"rule": {},
		"text": {}
	}))
	.unwrap();
	let mk = |name: &str| schema.node_type(name).unwrap().create(None, Fragment::empty(), Vec::new()).unwrap();
	let top = schema.top_node_type();
	assert!(top.valid_content(&Fragment::from_vec(vec![mk("heading"), mk("rule"), mk("paragraph")])));
	assert!(!top.valid_content(&Fragment::from_vec(vec![mk("paragraph")])));
	assert!(!top.valid_content(&Fragment::from_vec(vec![mk("heading"), mk("heading")])));
}

#[rstest]
#[case::missing_top(json!({"paragraph": {}, "text": {}}), "Schema is missing its top node type ('doc')")]
#[case::missing_text(json!({"doc": {}}), "Every schema needs a 'text' type")]
#[case::text_attrs(json!({"doc": {}, "text": {"attrs": {"x": {"default": 1}}}}), "The text node type should not have attributes")]
fn test_schema_errors(#[case] nodes: Value, #[case] message: &str) {
	let err = schema_with(nodes).unwrap_err();
	assert_eq!(err.to_string(), message);
}

#[test]
fn test_mixed_content_rejected() {
	let err = schema_with(json!({
		"doc": {"content": "(paragraph | text)*"},
		"paragraph": {"content": "text*"},
		"text": {}
	}))
	.unwrap_err();
	assert!(err.to_string().starts_with("Mixing inline and block content"));
}

#[test]
fn test_unknown_type_in_expression() {
	let err = schema_with(json!({"doc": {"content": "nope+"}, "text": {}})).unwrap_err();
	assert!(err.to_string().contains("No node type or group 'nope'"));
}

#[test]
fn test_required_position_needs_generatable_node() {
	let err = schema_with(json!({
		"doc": {"content": "thing"},
		"thing": {"attrs": {"id": {}}},
		"text": {}
	}))
	.unwrap_err();
	assert!(err.to_string().starts_with("Only non-generatable nodes (thing) in a required position"));
}

#[test]
fn test_attribute_null_default_is_optional() {
	let spec = SchemaSpec::from_json(&json!({
		"nodes": {"doc": {"content": "img*"}, "img": {"attrs": {"alt": {"default": null}}}, "text": {}}
	}))
	.unwrap();
	assert_eq!(spec.nodes["img"].attrs["alt"], AttributeSpec::with_default(Value::Null));
	let schema = Schema::new(spec).unwrap();
	assert!(!schema.node_type("img").unwrap().has_required_attrs());
}

#[test]
fn test_builder_marks_text() {
	let d = doc!(p!("a", em!("b")));
	let para = d.child(0);
	assert_eq!(para.child_count(), 2);
	assert_eq!(para.child(1).marks()[0].mark_type().name(), "em");
}
