//! In-memory engine implementation.
//!
//! This is not a good implementation for production use, but is useful for
//! testing. Cursors read from a snapshot of their collection taken when they
//! open, and their transactions can be expired on demand or after an idle
//! timeout, exercising the same failure paths as a real engine.

use crate::{
    Key, Value,
    engine::{
        Direction, Durability, EngineCursor, EngineError, EngineResult, KeyRange, KvConnection,
        KvEngine, WriteOp,
    },
};
use parking_lot::{Mutex, RwLock};
use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::time::Instant;

type Collection = BTreeMap<Key, Value>;

#[derive(Debug, Default)]
struct Namespace {
    version: u64,
    collections: BTreeMap<String, Arc<Collection>>,
}

#[derive(Debug, Default)]
struct MemInner {
    namespaces: RwLock<HashMap<String, Namespace>>,
    /// Bumped to expire every live cursor transaction.
    epoch: AtomicU64,
    fail_next_write: Mutex<Option<String>>,
    fail_next_fetch: Mutex<Option<String>>,
    strict_commits: AtomicU64,
}

/// A simple in-memory engine using [`BTreeMap`]s.
///
/// Writes are copy-on-write per collection, so open cursors keep reading
/// the data that was committed when they were opened.
///
/// Clones share the same data.
#[derive(Clone)]
pub struct MemEngine {
    inner: Arc<MemInner>,
    idle_timeout: Option<Duration>,
    binary_keys: bool,
    durability: bool,
}

impl core::fmt::Debug for MemEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemEngine")
            .field("idle_timeout", &self.idle_timeout)
            .field("binary_keys", &self.binary_keys)
            .field("durability", &self.durability)
            .finish_non_exhaustive()
    }
}

impl Default for MemEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemEngine {
    /// Create a new empty engine that supports binary keys and strict
    /// durability, and never expires transactions on its own.
    pub fn new() -> Self {
        Self { inner: Arc::default(), idle_timeout: None, binary_keys: true, durability: true }
    }

    /// Expire cursor transactions that have been idle for longer than
    /// `timeout`.
    pub const fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Reject byte-sequence keys, like engines that can only order text.
    pub const fn without_binary_keys(mut self) -> Self {
        self.binary_keys = false;
        self
    }

    /// Report no support for strict durability.
    pub const fn without_durability(mut self) -> Self {
        self.durability = false;
        self
    }

    /// Expire the transaction of every open cursor. Their next advance
    /// fails with [`EngineError::TransactionInactive`].
    pub fn expire_transactions(&self) {
        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// Make the next write abort with `reason` instead of committing.
    pub fn abort_next_write(&self, reason: impl Into<String>) {
        *self.inner.fail_next_write.lock() = Some(reason.into());
    }

    /// Make the next cursor fetch abort its transaction with `reason`
    /// instead of landing on a row.
    pub fn abort_next_fetch(&self, reason: impl Into<String>) {
        *self.inner.fail_next_fetch.lock() = Some(reason.into());
    }

    /// Number of writes committed with [`Durability::Strict`].
    pub fn strict_commits(&self) -> u64 {
        self.inner.strict_commits.load(Ordering::Acquire)
    }

    /// Current version of the namespace `name`, if it exists.
    pub fn version(&self, name: &str) -> Option<u64> {
        self.inner.namespaces.read().get(name).map(|ns| ns.version)
    }

    fn connect(&self, name: &str, version: u64) -> MemConnection {
        MemConnection {
            inner: self.inner.clone(),
            name: name.to_owned(),
            version,
            idle_timeout: self.idle_timeout,
            binary_keys: self.binary_keys,
            closed: AtomicBool::new(false),
        }
    }
}

impl KvEngine for MemEngine {
    type Connection = MemConnection;

    fn supports_binary_keys(&self) -> bool {
        self.binary_keys
    }

    fn supports_durability(&self) -> bool {
        self.durability
    }

    async fn open(&self, name: &str) -> EngineResult<MemConnection> {
        let version = {
            let mut namespaces = self.inner.namespaces.write();
            namespaces
                .entry(name.to_owned())
                .or_insert_with(|| Namespace { version: 1, ..Default::default() })
                .version
        };
        Ok(self.connect(name, version))
    }

    async fn upgrade(
        &self,
        name: &str,
        version: u64,
        collection: &str,
    ) -> EngineResult<MemConnection> {
        {
            let mut namespaces = self.inner.namespaces.write();
            let ns = namespaces.entry(name.to_owned()).or_default();
            if version <= ns.version {
                return Err(EngineError::Version { requested: version, current: ns.version });
            }
            ns.version = version;
            ns.collections.entry(collection.to_owned()).or_default();
        }
        Ok(self.connect(name, version))
    }

    async fn delete_namespace(&self, name: &str) -> EngineResult<()> {
        self.inner.namespaces.write().remove(name);
        Ok(())
    }
}

/// Connection to one namespace of a [`MemEngine`].
pub struct MemConnection {
    inner: Arc<MemInner>,
    name: String,
    version: u64,
    idle_timeout: Option<Duration>,
    binary_keys: bool,
    closed: AtomicBool,
}

impl core::fmt::Debug for MemConnection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemConnection")
            .field("name", &self.name)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl MemConnection {
    fn ensure_open(&self) -> EngineResult<()> {
        if self.closed.load(Ordering::Acquire) { Err(EngineError::Closed) } else { Ok(()) }
    }

    fn check_key(&self, key: &Key) -> EngineResult<()> {
        if !self.binary_keys && matches!(key, Key::Binary(_)) {
            return Err(EngineError::Data("binary keys are not supported".to_owned()));
        }
        Ok(())
    }

    fn snapshot(&self, collection: &str) -> EngineResult<Arc<Collection>> {
        self.inner
            .namespaces
            .read()
            .get(&self.name)
            .and_then(|ns| ns.collections.get(collection))
            .cloned()
            .ok_or_else(|| EngineError::UnknownCollection(collection.to_owned()))
    }
}

impl KvConnection for MemConnection {
    type Cursor = MemCursor;

    fn version(&self) -> u64 {
        self.version
    }

    fn has_collection(&self, collection: &str) -> bool {
        self.inner
            .namespaces
            .read()
            .get(&self.name)
            .is_some_and(|ns| ns.collections.contains_key(collection))
    }

    async fn get(&self, collection: &str, key: &Key) -> EngineResult<Option<Value>> {
        self.ensure_open()?;
        self.check_key(key)?;
        Ok(self.snapshot(collection)?.get(key).cloned())
    }

    async fn write(
        &self,
        collection: &str,
        ops: Vec<WriteOp>,
        durability: Durability,
    ) -> EngineResult<()> {
        self.ensure_open()?;
        ops.iter().try_for_each(|op| self.check_key(op.key()))?;
        if let Some(reason) = self.inner.fail_next_write.lock().take() {
            return Err(EngineError::Aborted(reason));
        }

        let mut namespaces = self.inner.namespaces.write();
        let table = namespaces
            .get_mut(&self.name)
            .and_then(|ns| ns.collections.get_mut(collection))
            .ok_or_else(|| EngineError::UnknownCollection(collection.to_owned()))?;
        let table = Arc::make_mut(table);
        for op in ops {
            match op {
                WriteOp::Put { key, value } => {
                    table.insert(key, value);
                }
                WriteOp::Del { key } => {
                    table.remove(&key);
                }
            }
        }
        if durability == Durability::Strict {
            self.inner.strict_commits.fetch_add(1, Ordering::AcqRel);
        }
        Ok(())
    }

    fn open_cursor(
        &self,
        collection: &str,
        range: KeyRange,
        direction: Direction,
    ) -> EngineResult<MemCursor> {
        self.ensure_open()?;
        for bound in [range.lower(), range.upper()] {
            if let Bound::Included(key) | Bound::Excluded(key) = bound {
                self.check_key(key)?;
            }
        }
        Ok(MemCursor {
            snapshot: self.snapshot(collection)?,
            range,
            direction,
            position: None,
            landed: None,
            inner: self.inner.clone(),
            epoch: self.inner.epoch.load(Ordering::Acquire),
            idle_timeout: self.idle_timeout,
            last_activity: Instant::now(),
        })
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Cursor over a snapshot of a [`MemEngine`] collection.
pub struct MemCursor {
    snapshot: Arc<Collection>,
    range: KeyRange,
    direction: Direction,
    /// Key of the last row a request landed on.
    position: Option<Key>,
    /// Result of the outstanding request, once it has landed.
    landed: Option<Option<(Key, Value)>>,
    inner: Arc<MemInner>,
    epoch: u64,
    idle_timeout: Option<Duration>,
    last_activity: Instant,
}

impl core::fmt::Debug for MemCursor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemCursor")
            .field("range", &self.range)
            .field("direction", &self.direction)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl MemCursor {
    fn expired(&self) -> bool {
        self.inner.epoch.load(Ordering::Acquire) != self.epoch
            || self.idle_timeout.is_some_and(|timeout| self.last_activity.elapsed() > timeout)
    }

    /// The row after `position` in the cursor's direction.
    fn step(&self) -> Option<(Key, Value)> {
        let row = match self.direction {
            Direction::Forward => {
                let from = self
                    .position
                    .clone()
                    .map_or_else(|| self.range.lower().clone(), Bound::Excluded);
                self.snapshot.range((from, Bound::Unbounded)).next()
            }
            Direction::Reverse => {
                let to = self
                    .position
                    .clone()
                    .map_or_else(|| self.range.upper().clone(), Bound::Excluded);
                self.snapshot.range((Bound::Unbounded, to)).next_back()
            }
        };
        row.filter(|(key, _)| self.range.contains(key)).map(|(k, v)| (k.clone(), v.clone()))
    }
}

impl EngineCursor for MemCursor {
    async fn fetch(&mut self) -> EngineResult<Option<(Key, Value)>> {
        if let Some(row) = &self.landed {
            return Ok(row.clone());
        }
        // requests land asynchronously
        tokio::task::yield_now().await;
        if let Some(reason) = self.inner.fail_next_fetch.lock().take() {
            return Err(EngineError::Aborted(reason));
        }

        let row = self.step();
        if let Some((key, _)) = &row {
            self.position = Some(key.clone());
        }
        self.last_activity = Instant::now();
        self.landed = Some(row.clone());
        Ok(row)
    }

    fn advance(&mut self) -> EngineResult<()> {
        if self.landed.is_none() {
            return Err(EngineError::InvalidState("advance called while a request is outstanding"));
        }
        if self.expired() {
            return Err(EngineError::TransactionInactive);
        }
        self.landed = None;
        Ok(())
    }
}
