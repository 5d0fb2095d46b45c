//! Client identity and configuration.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies the client that produced a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub Uuid);

impl ClientId {
	/// A fresh random id.
	pub fn random() -> Self {
		Self(Uuid::new_v4())
	}
}

impl fmt::Display for ClientId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Collaboration settings for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollabConfig {
	/// The version of the document the client starts from.
	#[serde(default)]
	pub version: u64,

	/// This client's id. Random when not configured.
	#[serde(default = "ClientId::random")]
	pub client_id: ClientId,
}

impl CollabConfig {
	pub fn new(version: u64) -> Self {
		Self { version, client_id: ClientId::random() }
	}

	pub fn with_client_id(mut self, client_id: ClientId) -> Self {
		self.client_id = client_id;
		self
	}
}

impl Default for CollabConfig {
	fn default() -> Self {
		Self::new(0)
	}
}
