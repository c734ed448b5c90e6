/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by a transactional engine.
///
/// Engines report failures through this type so that the store layer can
/// distinguish transaction expiry from aborts and from caller mistakes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The transaction backing a request is no longer active. Engines
    /// expire transactions that have been idle for too long.
    #[error("transaction is not active")]
    TransactionInactive,

    /// The transaction aborted for engine-internal reasons.
    #[error("transaction aborted: {0}")]
    Aborted(String),

    /// A key or range is not representable by the engine.
    #[error("data error: {0}")]
    Data(String),

    /// The named collection does not exist in the connection.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// An upgrade requested a version that is not above the current one.
    #[error("requested version {requested} is not above current version {current}")]
    Version {
        /// The version that was requested.
        requested: u64,
        /// The version of the namespace at the time of the request.
        current: u64,
    },

    /// A request was issued in a state that does not allow it, e.g. a
    /// second advance before the first completed.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// The connection has been closed.
    #[error("connection is closed")]
    Closed,
}
