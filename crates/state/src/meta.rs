//! Transaction metadata keys understood by more than one crate.

/// `bool`. `false` keeps the transaction out of the undo history.
pub const ADD_TO_HISTORY: &str = "addToHistory";

/// `Arc<Transaction>`. Set on transactions appended in response to
/// another one, pointing at the transaction that caused them.
pub const APPENDED_TRANSACTION: &str = "appendedTransaction";

/// `usize`. The number of local steps that were undone, then redone on
/// top of newly received remote steps.
pub const REBASED: &str = "rebased";

/// `u64`. Identifies an input-method composition; transactions of one
/// composition are grouped together in the history.
pub const COMPOSITION: &str = "composition";
