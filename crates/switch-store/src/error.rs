//! Store error types.

use thiserror::Error;

/// Errors surfaced by store operations.
///
/// Unknown mutation types never produce an error value: `commit` logs and
/// returns, per the log-and-continue contract. Unknown action types reject
/// the dispatch future with [`StoreError::UnknownAction`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
	/// `dispatch` was called with an action type nobody registered.
	#[error("unknown action type: {0}")]
	UnknownAction(String),

	/// An action body failed. Carries the action's own message.
	#[error("action failed: {0}")]
	Action(String),
}
