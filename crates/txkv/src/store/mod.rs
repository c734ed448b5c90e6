//! The store handle and its point operations.

mod options;
pub use options::{BatchOp, OpenOptions, ReadOptions, WriteOptions};

mod traits;
pub use traits::KeyValueStore;

pub mod validate;

use crate::{
    CursorTask, IteratorOptions, Key, KeyCodec, KvConnection, KvEngine, StoreError,
    StoreIterator, StoreResult, Value,
    codec::{decode_value, encode_value},
    cursor::{CURSOR_CHANNEL_SIZE, CursorSession},
    engine::{Durability, WriteOp},
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};
use validate::{check_batch, check_key};

/// An open store: one collection inside one engine namespace.
///
/// A store is either fully open or closed. After [`close`], every
/// operation fails with [`StoreError::NotOpen`] and every live iterator
/// fails with [`StoreError::Cancelled`].
///
/// [`close`]: KeyValueStore::close
pub struct Store<E: KvEngine> {
    pub(crate) engine: E,
    pub(crate) location: String,
    pub(crate) collection: String,
    pub(crate) conn: Arc<E::Connection>,
    pub(crate) codec: KeyCodec,
    pub(crate) strict_durability: bool,
    pub(crate) closed: AtomicBool,
    pub(crate) cancel_token: CancellationToken,
}

impl<E: KvEngine> std::fmt::Debug for Store<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("location", &self.location)
            .field("collection", &self.collection)
            .field("codec", &self.codec)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<E: KvEngine> Store<E> {
    /// The namespace the store lives in.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The collection the store reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The key codec, fixed when the store was opened.
    pub const fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    /// True once the store has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// The engine the store runs on.
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.is_closed() { Err(StoreError::NotOpen) } else { Ok(()) }
    }

    fn durability(&self, sync: bool) -> Durability {
        match (sync, self.strict_durability) {
            (true, true) => Durability::Strict,
            (true, false) => {
                trace!("strict durability unsupported by engine, using default");
                Durability::Default
            }
            (false, _) => Durability::Default,
        }
    }

    /// Run `ops` in one read-write transaction.
    async fn commit(&self, ops: Vec<WriteOp>, sync: bool) -> StoreResult<()> {
        let durability = self.durability(sync);
        self.conn.write(&self.collection, ops, durability).await.map_err(|err| {
            let err = StoreError::from(err);
            if let StoreError::TransactionAbort(reason) = &err {
                warn!(%reason, collection = %self.collection, "transaction aborted");
            }
            err
        })
    }
}

impl<E: KvEngine> KeyValueStore for Store<E> {
    type Iter = StoreIterator;

    async fn get(&self, key: impl Into<Key> + Send, options: ReadOptions) -> StoreResult<Value> {
        self.ensure_open()?;
        let key = key.into();
        check_key(&key)?;
        let key = self.codec.normalize(key);
        let value = self.conn.get(&self.collection, &key).await?.ok_or(StoreError::NotFound)?;
        decode_value(value, options.as_buffer, options.raw)
    }

    async fn put(
        &self,
        key: impl Into<Key> + Send,
        value: impl Into<Value> + Send,
        options: WriteOptions,
    ) -> StoreResult<()> {
        self.ensure_open()?;
        let key = key.into();
        check_key(&key)?;
        let op = WriteOp::Put {
            key: self.codec.normalize(key),
            value: encode_value(value.into(), options.value_encoding, options.raw),
        };
        self.commit(vec![op], options.sync).await
    }

    async fn del(&self, key: impl Into<Key> + Send, options: WriteOptions) -> StoreResult<()> {
        self.ensure_open()?;
        let key = key.into();
        check_key(&key)?;
        self.commit(vec![WriteOp::Del { key: self.codec.normalize(key) }], options.sync).await
    }

    async fn batch(&self, ops: Vec<BatchOp>, options: WriteOptions) -> StoreResult<()> {
        self.ensure_open()?;
        if ops.is_empty() {
            return Ok(());
        }
        check_batch(&ops)?;
        let ops = ops
            .into_iter()
            .map(|op| match op {
                BatchOp::Put { key, value } => WriteOp::Put {
                    key: self.codec.normalize(key),
                    value: encode_value(value, options.value_encoding, options.raw),
                },
                BatchOp::Del { key } => WriteOp::Del { key: self.codec.normalize(key) },
            })
            .collect();
        self.commit(ops, options.sync).await
    }

    /// Start iterating over a range.
    ///
    /// # Panics
    ///
    /// This function panics if called outside a tokio runtime, as it
    /// spawns the iterator task.
    fn iterator(&self, options: IteratorOptions) -> StoreResult<StoreIterator> {
        self.ensure_open()?;
        let opened = Arc::new(AtomicU64::new(0));
        let session = CursorSession::new(
            Arc::clone(&self.conn),
            self.collection.clone(),
            self.codec,
            &options,
            Arc::clone(&opened),
        )?;
        let (sender, requests) = mpsc::channel(CURSOR_CHANNEL_SIZE);
        let task = CursorTask::new(session, requests, self.cancel_token.child_token());
        tokio::spawn(task.run());
        Ok(StoreIterator::new(sender, opened))
    }

    async fn close(&self) -> StoreResult<()> {
        self.shutdown();
        Ok(())
    }
}
