use pretty_assertions::assert_eq;
use quire_collab::{
	ClientId, CollabConfig, CollabState, Sendable, get_version, receive_transaction, sendable_steps,
};
use quire_history::{HistoryConfig, HistoryState, undo};
use quire_model::testing::schema;
use quire_model::{Node, doc, p};
use quire_state::{EditorState, Selection, Transaction};
use quire_transform::Step;
use rstest::rstest;

/// The central authority: accepts steps only from clients that are up to
/// date with its log.
struct Authority {
	doc: Node,
	steps: Vec<Step>,
	client_ids: Vec<ClientId>,
}

impl Authority {
	fn new(doc: Node) -> Self {
		Self { doc, steps: Vec::new(), client_ids: Vec::new() }
	}

	fn receive(&mut self, sendable: Sendable) -> bool {
		if sendable.version != self.steps.len() as u64 {
			return false;
		}
		for step in sendable.steps {
			self.doc = step.apply(&self.doc).unwrap();
			self.steps.push(step);
			self.client_ids.push(sendable.client_id);
		}
		true
	}

	fn since(&self, version: u64) -> (&[Step], &[ClientId]) {
		let version = version as usize;
		(&self.steps[version..], &self.client_ids[version..])
	}
}

struct Client {
	state: EditorState,
	collab: CollabState,
	config: CollabConfig,
	history: HistoryState,
}

impl Client {
	fn new(doc: Node) -> Self {
		let config = CollabConfig::default();
		Self {
			state: EditorState::create(doc, None),
			collab: CollabState::new(&config),
			config,
			history: HistoryState::new().with_preserve_items(true),
		}
	}

	fn dispatch(&mut self, tr: Transaction) {
		self.history = self.history.apply(&tr, &self.state, &HistoryConfig::default()).unwrap();
		self.collab = self.collab.apply(&tr).unwrap();
		self.state = self.state.apply(&tr).unwrap();
	}

	fn type_at(&mut self, pos: usize, text: &str) {
		let mut tr = self.state.tr();
		tr.insert_text(text, Some(pos), None).unwrap();
		self.dispatch(tr);
	}

	fn delete(&mut self, from: usize, to: usize) {
		let mut tr = self.state.tr();
		tr.delete(from, to).unwrap();
		self.dispatch(tr);
	}

	fn send(&self, authority: &mut Authority) -> bool {
		sendable_steps(&self.collab, &self.config).is_some_and(|sendable| authority.receive(sendable))
	}

	fn pull(&mut self, authority: &Authority) {
		let (steps, ids) = authority.since(get_version(&self.collab));
		if steps.is_empty() {
			return;
		}
		let tr = receive_transaction(&self.state, &self.collab, &self.config, steps, ids, false).unwrap();
		self.dispatch(tr);
	}

	fn doc(&self) -> &Node {
		self.state.doc()
	}
}

/// Lets clients send in `order` and pull until nothing is left to send.
fn sync(clients: &mut [Client], authority: &mut Authority, order: &[usize]) {
	for _ in 0..=clients.len() {
		for &i in order {
			clients[i].send(authority);
		}
		for client in clients.iter_mut() {
			client.pull(authority);
		}
		if clients.iter().all(|c| c.collab.unconfirmed.is_empty()) {
			return;
		}
	}
	panic!("clients did not converge");
}

fn start(doc: &Node, n: usize) -> (Vec<Client>, Authority) {
	((0..n).map(|_| Client::new(doc.clone())).collect(), Authority::new(doc.clone()))
}

#[test]
fn test_two_clients_converge() {
	let base = doc!(p!("hello")).node;
	let (mut clients, mut authority) = start(&base, 2);
	clients[0].type_at(1, "A");
	clients[1].type_at(6, "B");
	sync(&mut clients, &mut authority, &[0, 1]);

	let expected = doc!(p!("AhelloB")).node;
	assert_eq!(authority.doc, expected);
	for client in &clients {
		assert_eq!(client.doc(), &expected);
		assert_eq!(get_version(&client.collab), 2);
	}
}

#[rstest]
#[case(&[0, 1, 2])]
#[case(&[0, 2, 1])]
#[case(&[1, 0, 2])]
#[case(&[1, 2, 0])]
#[case(&[2, 0, 1])]
#[case(&[2, 1, 0])]
fn test_converges_in_any_order(#[case] order: &[usize]) {
	let base = doc!(p!("hello")).node;
	let (mut clients, mut authority) = start(&base, 3);
	clients[0].type_at(1, "x");
	clients[1].type_at(4, "y");
	clients[2].delete(5, 6);
	sync(&mut clients, &mut authority, order);

	let expected = doc!(p!("xhelyl")).node;
	assert_eq!(authority.doc, expected);
	for client in &clients {
		assert_eq!(client.doc(), &expected);
	}
}

#[test]
fn test_unrelated_block_edits_converge() {
	let base = doc!(p!("one"), p!("two")).node;
	let (mut clients, mut authority) = start(&base, 2);
	clients[0].type_at(4, "!");
	clients[1].type_at(6, "2: ");
	clients[1].type_at(4, "?");
	sync(&mut clients, &mut authority, &[1, 0]);

	let docs: Vec<&Node> = clients.iter().map(Client::doc).collect();
	assert_eq!(docs[0], docs[1]);
	assert_eq!(authority.doc, *docs[0]);
	assert_eq!(docs[0].child(1), doc!(p!("2: two")).node.child(0));
}

#[test]
fn test_echoed_steps_are_not_duplicated() {
	let base = doc!(p!("hi")).node;
	let (mut clients, mut authority) = start(&base, 1);
	clients[0].type_at(3, "!");
	assert!(clients[0].send(&mut authority));
	clients[0].pull(&authority);
	assert_eq!(clients[0].doc(), &doc!(p!("hi!")).node);
	assert!(clients[0].collab.unconfirmed.is_empty());
	assert!(!clients[0].send(&mut authority));
}

#[test]
fn test_undo_after_rebase_only_undoes_local_change() {
	let base = doc!(p!("hello")).node;
	let (mut clients, mut authority) = start(&base, 2);
	clients[1].type_at(6, "B");
	assert!(clients[1].send(&mut authority));

	clients[0].type_at(1, "A");
	assert!(!clients[0].send(&mut authority));
	clients[0].pull(&authority);
	assert_eq!(clients[0].doc(), &doc!(p!("AhelloB")).node);

	let undo_tr = undo(&clients[0].state, &clients[0].history, &HistoryConfig::default()).unwrap().unwrap();
	clients[0].dispatch(undo_tr);
	assert_eq!(clients[0].doc(), &doc!(p!("helloB")).node);
	assert_eq!(clients[0].state.selection(), &Selection::Text { anchor: 1, head: 1 });

	sync(&mut clients, &mut authority, &[0, 1]);
	assert_eq!(clients[1].doc(), &doc!(p!("helloB")).node);
	assert_eq!(authority.doc, doc!(p!("helloB")).node);
}

#[test]
fn test_text_from_many_clients() {
	let base = doc!(p!()).node;
	let (mut clients, mut authority) = start(&base, 3);
	for (i, client) in clients.iter_mut().enumerate() {
		let text = schema().text(&i.to_string(), Vec::new());
		let mut tr = client.state.tr();
		tr.insert(1, text).unwrap();
		client.dispatch(tr);
	}
	sync(&mut clients, &mut authority, &[2, 1, 0]);
	let doc = authority.doc.clone();
	assert_eq!(doc.content().size(), 5);
	for client in &clients {
		assert_eq!(client.doc(), &doc);
	}
}
