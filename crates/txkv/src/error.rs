//! Error types for store operations.

use crate::EngineError;

/// Result type alias for store operations.
pub type StoreResult<T, E = StoreError> = Result<T, E>;

/// Error type for store operations.
///
/// The type is `Clone` so that an errored iterator can hand the same error
/// to every later pull.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No value is stored under the key.
    #[error("NotFound")]
    NotFound,

    /// The store exists and `error_if_exists` was set.
    #[error("store already exists: {0}")]
    AlreadyExists(String),

    /// The store does not exist and `create_if_missing` was unset.
    ///
    /// This is the not-found error of [`Store::open`]. Point reads that miss
    /// fail with [`NotFound`](Self::NotFound) instead.
    ///
    /// [`Store::open`]: crate::Store::open
    #[error("store does not exist: {0}")]
    StoreMissing(String),

    /// A value cannot be coerced to bytes. Carries the value's type name.
    #[error("can't coerce `{0}` into a Buffer")]
    TypeCoercion(String),

    /// The engine aborted the transaction. The operation was not applied.
    #[error("transaction aborted: {0}")]
    TransactionAbort(String),

    /// The transaction backing an iterator expired before the next row
    /// could be requested.
    #[error("cursor transaction expired")]
    CursorTimeout,

    /// The caller broke the pull protocol of an iterator.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// A key argument was rejected before reaching the engine.
    #[error("{0}")]
    InvalidKey(&'static str),

    /// The store has been closed.
    #[error("store is not open")]
    NotOpen,

    /// The iterator task has stopped, usually because the store closed.
    #[error("iterator cancelled")]
    Cancelled,

    /// The operation is not supported by this store.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    /// Any other engine failure.
    #[error("engine error: {0}")]
    Engine(#[source] EngineError),
}

impl From<EngineError> for StoreError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::TransactionInactive => Self::CursorTimeout,
            EngineError::Aborted(reason) => Self::TransactionAbort(reason),
            other => Self::Engine(other),
        }
    }
}
