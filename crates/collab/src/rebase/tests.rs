use pretty_assertions::assert_eq;
use quire_model::testing::schema;
use quire_model::{Node, doc, p};

use super::*;

fn text(s: &str) -> Node {
	schema().text(s, Vec::new())
}

/// Local steps made on `base`, ready to be rebased.
fn local(base: &Node, edit: impl FnOnce(&mut Transform)) -> Vec<Rebaseable> {
	let mut tr = Transform::new(base.clone());
	edit(&mut tr);
	let origin = Arc::new(tr.clone());
	tr.steps()
		.iter()
		.zip(tr.docs())
		.map(|(step, doc)| Rebaseable::new(step.clone(), step.invert(doc).unwrap(), origin.clone()))
		.collect()
}

fn remote(base: &Node, edit: impl FnOnce(&mut Transform)) -> Vec<Step> {
	let mut tr = Transform::new(base.clone());
	edit(&mut tr);
	tr.steps().to_vec()
}

/// The document the local steps were made on, for the rebasing transform.
fn with_local(base: &Node, steps: &[Rebaseable]) -> Node {
	steps.iter().fold(base.clone(), |doc, r| r.step.apply(&doc).unwrap())
}

#[test]
fn test_local_step_moves_over_remote_insert() {
	let base = doc!(p!("hello")).node;
	let steps = local(&base, |tr| {
		tr.insert(6, text("L")).unwrap();
	});
	let over = remote(&base, |tr| {
		tr.insert(1, text("R")).unwrap();
	});

	let mut tr = Transform::new(with_local(&base, &steps));
	let rebased = rebase_steps(&steps, &over, &mut tr).unwrap();
	assert_eq!(tr.doc(), &doc!(p!("RhelloL")).node);
	assert_eq!(rebased.len(), 1);
	assert_eq!(tr.steps().len(), 3);
	assert_eq!(tr.mapping().get_mirror(0), Some(2));
	assert!(Arc::ptr_eq(&rebased[0].origin, &steps[0].origin));
	assert_eq!(rebased[0].inverted.apply(tr.doc()).unwrap(), doc!(p!("Rhello")).node);
}

#[test]
fn test_local_step_inside_remote_deletion_is_dropped() {
	let base = doc!(p!("hello")).node;
	let steps = local(&base, |tr| {
		tr.insert(3, text("x")).unwrap();
	});
	let over = remote(&base, |tr| {
		tr.delete(2, 5).unwrap();
	});

	let mut tr = Transform::new(with_local(&base, &steps));
	let rebased = rebase_steps(&steps, &over, &mut tr).unwrap();
	assert!(rebased.is_empty());
	assert_eq!(tr.doc(), &doc!(p!("ho")).node);
	assert_eq!(tr.steps().len(), 2);
}

#[test]
fn test_multiple_local_steps_keep_order() {
	let base = doc!(p!("abc")).node;
	let steps = local(&base, |tr| {
		tr.insert(4, text("1")).unwrap();
		tr.insert(5, text("2")).unwrap();
	});
	let over = remote(&base, |tr| {
		tr.delete(1, 2).unwrap();
	});

	let mut tr = Transform::new(with_local(&base, &steps));
	let rebased = rebase_steps(&steps, &over, &mut tr).unwrap();
	assert_eq!(rebased.len(), 2);
	assert_eq!(tr.doc(), &doc!(p!("bc12")).node);
	assert_eq!(tr.mapping().get_mirror(1), Some(3));
	assert_eq!(tr.mapping().get_mirror(0), Some(4));
}
