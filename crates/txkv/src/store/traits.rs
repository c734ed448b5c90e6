use crate::{
    BatchOp, IteratorOptions, Key, RangeCursor, ReadOptions, StoreError, StoreResult, Value,
    WriteOptions,
};
use std::future::Future;

/// Point reads, writes and range iteration over one collection.
///
/// All futures are `Send`. Operations are independent of each other: a
/// failed operation leaves the store usable.
pub trait KeyValueStore: Send + Sync {
    /// Iterator type returned by [`iterator`](KeyValueStore::iterator).
    type Iter: RangeCursor;

    /// Read the value stored under `key`.
    ///
    /// Fails with [`StoreError::NotFound`] if nothing is stored under the
    /// key.
    fn get(
        &self,
        key: impl Into<Key> + Send,
        options: ReadOptions,
    ) -> impl Future<Output = StoreResult<Value>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn put(
        &self,
        key: impl Into<Key> + Send,
        value: impl Into<Value> + Send,
        options: WriteOptions,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Remove `key`. Removing an absent key succeeds.
    fn del(
        &self,
        key: impl Into<Key> + Send,
        options: WriteOptions,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Apply `ops` atomically, in order.
    fn batch(
        &self,
        ops: Vec<BatchOp>,
        options: WriteOptions,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Start iterating over a range.
    ///
    /// The iterator starts fetching immediately. Fails with
    /// [`StoreError::ProtocolViolation`] if the limit is invalid.
    fn iterator(&self, options: IteratorOptions) -> StoreResult<Self::Iter>;

    /// Estimate the storage used by keys between `start` and `end`.
    fn approximate_size(
        &self,
        start: impl Into<Key> + Send,
        end: impl Into<Key> + Send,
    ) -> impl Future<Output = StoreResult<u64>> + Send {
        let _ = (start, end);
        async { Err(StoreError::Unsupported("approximate_size")) }
    }

    /// Close the store. Later operations fail with [`StoreError::NotOpen`].
    fn close(&self) -> impl Future<Output = StoreResult<()>> + Send;
}
