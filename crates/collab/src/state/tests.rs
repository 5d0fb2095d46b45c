use pretty_assertions::assert_eq;
use quire_model::testing::schema;
use quire_model::{Node, doc, p};

use super::*;

fn typed(state: &EditorState, text: &str) -> Transaction {
	let mut tr = state.tr();
	tr.insert_text(text, None, None).unwrap();
	tr
}

fn remote_insert(base: &Node, pos: usize, text: &str) -> Vec<Step> {
	let mut tr = Transform::new(base.clone());
	tr.insert(pos, schema().text(text, Vec::new())).unwrap();
	tr.steps().to_vec()
}

#[test]
fn test_local_steps_become_unconfirmed() {
	let config = CollabConfig::new(3);
	let state = EditorState::create(doc!(p!("hi")).node, None);
	let collab = CollabState::new(&config);
	assert!(sendable_steps(&collab, &config).is_none());

	let tr = typed(&state, "a");
	let collab = collab.apply(&tr).unwrap();
	assert_eq!(collab.unconfirmed.len(), 1);
	assert_eq!(get_version(&collab), 3);

	let sendable = sendable_steps(&collab, &config).unwrap();
	assert_eq!(sendable.version, 3);
	assert_eq!(sendable.client_id, config.client_id);
	assert_eq!(sendable.steps, tr.steps().to_vec());
	assert_eq!(sendable.origins.len(), 1);
	assert_eq!(sendable.origins[0].steps(), tr.steps());
}

#[test]
fn test_selection_only_transactions_are_ignored() {
	let state = EditorState::create(doc!(p!("hi")).node, None);
	let collab = CollabState::default();
	let mut tr = state.tr();
	tr.set_selection(Selection::Text { anchor: 2, head: 2 }).unwrap();
	assert!(collab.apply(&tr).unwrap().unconfirmed.is_empty());
}

#[test]
fn test_meta_replaces_state() {
	let state = EditorState::create(doc!(p!("hi")).node, None);
	let mut tr = typed(&state, "a");
	tr.set_meta(COLLAB_META, CollabState { version: 9, unconfirmed: Vec::new() });
	let collab = CollabState::default().apply(&tr).unwrap();
	assert_eq!(collab.version, 9);
	assert!(collab.unconfirmed.is_empty());
}

#[test]
fn test_own_steps_are_confirmed_not_reapplied() {
	let config = CollabConfig::default();
	let state = EditorState::create(doc!(p!("hi")).node, None);
	let tr = typed(&state, "a");
	let collab = CollabState::new(&config).apply(&tr).unwrap();
	let state = state.apply(&tr).unwrap();

	let sendable = sendable_steps(&collab, &config).unwrap();
	let ids = vec![config.client_id; sendable.steps.len()];
	let tr = receive_transaction(&state, &collab, &config, &sendable.steps, &ids, false).unwrap();
	assert!(!tr.doc_changed());

	let collab = collab.apply(&tr).unwrap();
	assert_eq!(collab.version, 1);
	assert!(collab.unconfirmed.is_empty());
	assert!(sendable_steps(&collab, &config).is_none());
}

#[test]
fn test_remote_steps_are_tagged() {
	let config = CollabConfig::default();
	let base = doc!(p!("hello")).node;
	let state = EditorState::create(base.clone(), None);
	let steps = remote_insert(&base, 1, "R");

	let tr = receive_transaction(&state, &CollabState::new(&config), &config, &steps, &[ClientId::random()], false)
		.unwrap();
	assert_eq!(tr.doc(), &doc!(p!("Rhello")).node);
	assert_eq!(tr.get_meta::<bool>(ADD_TO_HISTORY), Some(&false));
	assert_eq!(tr.get_meta::<usize>(REBASED), Some(&0));
	assert_eq!(tr.get_meta::<CollabState>(COLLAB_META).map(|c| c.version), Some(1));
}

#[test]
fn test_unconfirmed_steps_are_rebased() {
	let config = CollabConfig::default();
	let base = doc!(p!("hello")).node;
	let state = EditorState::create(base.clone(), Some(Selection::Text { anchor: 6, head: 6 }));
	let tr = typed(&state, "L");
	let collab = CollabState::new(&config).apply(&tr).unwrap();
	let state = state.apply(&tr).unwrap();

	let steps = remote_insert(&base, 1, "R");
	let tr = receive_transaction(&state, &collab, &config, &steps, &[ClientId::random()], false).unwrap();
	assert_eq!(tr.doc(), &doc!(p!("RhelloL")).node);
	assert_eq!(tr.get_meta::<usize>(REBASED), Some(&1));

	let collab = collab.apply(&tr).unwrap();
	assert_eq!(collab.version, 1);
	assert_eq!(collab.unconfirmed.len(), 1);
	assert_eq!(tr.selection().unwrap(), Selection::Text { anchor: 8, head: 8 });
}

#[test]
fn test_map_selection_backward() {
	let config = CollabConfig::default();
	let base = doc!(p!("hello")).node;
	let state = EditorState::create(base.clone(), Some(Selection::Text { anchor: 6, head: 6 }));
	let steps = remote_insert(&base, 6, "X");
	let collab = CollabState::new(&config);

	let forward = receive_transaction(&state, &collab, &config, &steps, &[ClientId::random()], false).unwrap();
	assert_eq!(forward.selection().unwrap(), Selection::Text { anchor: 7, head: 7 });

	let backward = receive_transaction(&state, &collab, &config, &steps, &[ClientId::random()], true).unwrap();
	assert_eq!(backward.selection().unwrap(), Selection::Text { anchor: 6, head: 6 });
}
