//! Opening, closing and destroying stores.

use crate::{KeyCodec, KvConnection, KvEngine, OpenOptions, Store, StoreError, StoreResult};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

impl<E: KvEngine> Store<E> {
    /// Open the store at `location`.
    ///
    /// The namespace is opened at its current version and probed for the
    /// collection (named by [`OpenOptions::store_name`], or `location`):
    ///
    /// - present with `error_if_exists` fails with
    ///   [`StoreError::AlreadyExists`];
    /// - missing without `create_if_missing` fails with
    ///   [`StoreError::StoreMissing`];
    /// - missing with `create_if_missing` upgrades the namespace to the next
    ///   version, creating the collection.
    #[instrument(skip(engine, options), fields(store_name = ?options.store_name))]
    pub async fn open(engine: E, location: &str, options: OpenOptions) -> StoreResult<Self> {
        let collection = options.store_name.clone().unwrap_or_else(|| location.to_owned());

        let conn = engine.open(location).await?;
        let exists = conn.has_collection(&collection);

        if exists && options.error_if_exists {
            conn.close();
            return Err(StoreError::AlreadyExists(collection));
        }
        if !exists && !options.create_if_missing {
            conn.close();
            return Err(StoreError::StoreMissing(collection));
        }

        let conn = if exists {
            conn
        } else {
            let version = conn.version() + 1;
            conn.close();
            let conn = engine.upgrade(location, version, &collection).await?;
            debug!(version, %collection, "collection created");
            conn
        };

        let codec = KeyCodec::new(options.key_encoding, engine.supports_binary_keys());
        let strict_durability = engine.supports_durability();
        Ok(Self {
            engine,
            location: location.to_owned(),
            collection,
            conn: Arc::new(conn),
            codec,
            strict_durability,
            closed: AtomicBool::new(false),
            cancel_token: CancellationToken::new(),
        })
    }

    /// Close the connection and stop every iterator. Idempotent.
    pub(crate) fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cancel_token.cancel();
        self.conn.close();
        debug!(location = %self.location, "store closed");
    }

    /// Close the store and delete its whole namespace.
    pub async fn destroy(self) -> StoreResult<()> {
        self.shutdown();
        destroy(&self.engine, &self.location).await
    }
}

/// Delete the namespace at `location`, with every collection in it.
///
/// Deleting a namespace that does not exist succeeds. This cannot be
/// undone.
pub async fn destroy<E: KvEngine>(engine: &E, location: &str) -> StoreResult<()> {
    engine.delete_namespace(location).await?;
    debug!(location, "namespace destroyed");
    Ok(())
}
