//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

use crate::node::Key;

/// Failures raised by freeze, update and clean.
///
/// Every variant is terminal for the call that produced it. Operations
/// validate their input before touching any parent link, so an `Err` leaves
/// the tree exactly as it was.
#[derive(Debug, Error)]
pub enum FrozenError {
    /// An operation name did not match any [`UpdateKind`](crate::UpdateKind).
    #[error("unknown update type: {0}")]
    UnknownUpdateKind(String),
    /// `clean` was called on a snapshot without a pending substitution.
    #[error("snapshot has no pending update to clean")]
    NoPendingUpdate,
    /// Linking would make a snapshot its own ancestor.
    #[error("parent link would create a cycle")]
    CyclicGraph,
    /// Only arrays and objects can be frozen into snapshots.
    #[error("value is not a container: {0}")]
    NotAContainer(String),
    /// `splice` was called on a mapping snapshot.
    #[error("splice requires a sequence snapshot")]
    NotASequence,
    /// A key cannot address an entry of this snapshot kind.
    #[error("key {key} does not address a sequence entry")]
    KeyMismatch { key: Key },
    #[error("index {index} out of bounds for sequence of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    /// Dynamic operation options had the wrong shape.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("path not found: {0}")]
    PathNotFound(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
