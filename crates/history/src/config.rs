//! History configuration.

use serde::Deserialize;

/// Limits and grouping for the undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
	/// Number of events kept on the undo stack. Older events are dropped
	/// in batches once the stack runs over by [`DEPTH_OVERFLOW`](crate::branch::DEPTH_OVERFLOW).
	#[serde(default = "default_depth")]
	pub depth: usize,

	/// Milliseconds after which adjacent changes stop being grouped into
	/// the same event.
	#[serde(default = "default_new_group_delay")]
	pub new_group_delay: u64,
}

fn default_depth() -> usize {
	100
}

fn default_new_group_delay() -> u64 {
	500
}

impl Default for HistoryConfig {
	fn default() -> Self {
		Self { depth: default_depth(), new_group_delay: default_new_group_delay() }
	}
}
