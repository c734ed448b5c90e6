use crate::{
    Key, Value,
    engine::{Direction, Durability, EngineResult, KeyRange, WriteOp},
};
use std::future::Future;

/// A transactional engine hosting versioned namespaces.
///
/// # Implementation Guide
///
/// Implementers must ensure:
///
/// - **Versioned schema**: collections are only created by
///   [`upgrade`](KvEngine::upgrade). An upgrade to a version that is not
///   above the current one fails with [`EngineError::Version`].
///
/// - **Idempotent deletion**: deleting a namespace that does not exist
///   succeeds.
///
/// - **Stable capabilities**: [`supports_binary_keys`] and
///   [`supports_durability`] must not change over the lifetime of the
///   engine. A store reads them once when it is opened.
///
/// [`EngineError::Version`]: crate::EngineError::Version
/// [`supports_binary_keys`]: KvEngine::supports_binary_keys
/// [`supports_durability`]: KvEngine::supports_durability
pub trait KvEngine: Clone + Send + Sync + 'static {
    /// Connection type returned by [`open`](KvEngine::open).
    type Connection: KvConnection;

    /// True if the engine can store and order byte-sequence keys.
    fn supports_binary_keys(&self) -> bool;

    /// True if the engine honours [`Durability::Strict`].
    fn supports_durability(&self) -> bool;

    /// Open a connection to the namespace `name` at its current version,
    /// creating an empty namespace if none exists.
    fn open(&self, name: &str) -> impl Future<Output = EngineResult<Self::Connection>> + Send;

    /// Upgrade the namespace `name` to `version`, creating `collection` as
    /// part of the upgrade, and return a connection at the new version.
    fn upgrade(
        &self,
        name: &str,
        version: u64,
        collection: &str,
    ) -> impl Future<Output = EngineResult<Self::Connection>> + Send;

    /// Delete the namespace `name` and every collection in it.
    fn delete_namespace(&self, name: &str) -> impl Future<Output = EngineResult<()>> + Send;
}

/// A connection to one namespace at one version.
pub trait KvConnection: Send + Sync + 'static {
    /// Cursor type returned by [`open_cursor`](KvConnection::open_cursor).
    type Cursor: EngineCursor;

    /// The namespace version this connection was opened at.
    fn version(&self) -> u64;

    /// True if the namespace contains `collection`.
    fn has_collection(&self, collection: &str) -> bool;

    /// Read `key` from `collection` in its own read-only transaction.
    fn get(
        &self,
        collection: &str,
        key: &Key,
    ) -> impl Future<Output = EngineResult<Option<Value>>> + Send;

    /// Apply `ops` to `collection` in one read-write transaction.
    ///
    /// Either every operation is applied or none is.
    fn write(
        &self,
        collection: &str,
        ops: Vec<WriteOp>,
        durability: Durability,
    ) -> impl Future<Output = EngineResult<()>> + Send;

    /// Open a cursor over `range` in a fresh read-only transaction.
    ///
    /// The cursor's first request is issued on open, so the first
    /// [`fetch`](EngineCursor::fetch) resolves to the first row.
    fn open_cursor(
        &self,
        collection: &str,
        range: KeyRange,
        direction: Direction,
    ) -> EngineResult<Self::Cursor>;

    /// Close the connection. Later requests fail with
    /// [`EngineError::Closed`](crate::EngineError::Closed).
    fn close(&self);
}

/// A cursor bound to one read-only transaction.
///
/// A cursor always has at most one outstanding request. Opening the cursor
/// issues the first, and each [`advance`](EngineCursor::advance) issues the
/// next.
pub trait EngineCursor: Send + 'static {
    /// Wait for the row the outstanding request lands on. `None` means the
    /// cursor has moved past the end of its range.
    ///
    /// This method must be cancel-safe: dropping the future before it
    /// completes must leave the row available to the next call.
    fn fetch(&mut self) -> impl Future<Output = EngineResult<Option<(Key, Value)>>> + Send;

    /// Issue the request for the next row.
    ///
    /// Fails with [`EngineError::TransactionInactive`] if the backing
    /// transaction has expired.
    ///
    /// [`EngineError::TransactionInactive`]: crate::EngineError::TransactionInactive
    fn advance(&mut self) -> EngineResult<()>;
}
