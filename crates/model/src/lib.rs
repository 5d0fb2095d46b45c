//! Document model for quire: schema-driven, immutable document trees.
//!
//! A [`Schema`] describes which node and mark types exist and how they may
//! nest. Documents are trees of [`Node`]s addressed by integer positions;
//! [`ResolvedPos`] gives structural context for a position and [`Slice`]
//! describes a cut through the tree that can be reinserted elsewhere.

/// Content expressions and the content-match automaton.
pub mod content;
/// Error types.
pub mod error;
/// Sibling node sequences.
pub mod fragment;
/// Inline styling.
pub mod mark;
/// Document nodes.
pub mod node;
/// Structural replace algorithm.
mod replace;
/// Resolved positions and node ranges.
pub mod resolved;
/// Schemas, node types and mark types.
pub mod schema;
/// Open-ended document pieces.
pub mod slice;
/// Test schema and document builders.
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use content::ContentMatch;
pub use error::{ModelError, Result};
pub use fragment::{Fragment, IndexInfo};
pub use mark::Mark;
pub use node::{ChildInfo, Node};
pub use resolved::{NodeRange, ResolvedPos};
pub use schema::{AttributeSpec, Attrs, MarkSpec, MarkType, NodeSpec, NodeType, Schema, SchemaSpec, Whitespace};
pub use slice::Slice;
