//! Collaborative editing for quire.
//!
//! A client keeps a [`CollabState`]: the version of the shared document it
//! has seen and the local steps the central authority has not confirmed
//! yet. [`sendable_steps`] hands those steps to the transport;
//! [`receive_transaction`] folds steps accepted by the authority back in,
//! rebasing the still-unconfirmed local steps over them with
//! [`rebase_steps`].
//!
//! The transport itself is left to the host.

/// Client identity and configuration.
pub mod config;
/// Error types.
pub mod error;
/// Rebasing local steps over remote ones.
pub mod rebase;
/// Collaboration state, sending and receiving.
pub mod state;

pub use config::{ClientId, CollabConfig};
pub use error::{CollabError, Result};
pub use rebase::{Rebaseable, rebase_steps};
pub use state::{COLLAB_META, CollabState, Sendable, get_version, receive_transaction, sendable_steps};
