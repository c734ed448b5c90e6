//! Key-value storage over short-lived transactional cursor engines.
//!
//! This crate exposes an engine whose transactions expire quickly (the
//! kind found in embedded and browser databases) through a uniform store
//! interface:
//!
//! - **Point operations**: get, put and delete, each in its own
//!   transaction
//! - **Atomic batches** of puts and deletes
//! - **Range iteration** with inclusive or exclusive bounds, either
//!   direction, and an optional limit
//!
//! # Architecture
//!
//! - [`KvEngine`], [`KvConnection`] and [`EngineCursor`] define the engine
//!   contract
//! - [`Store`] owns a connection to one collection and implements
//!   [`KeyValueStore`] through the key and value [`codec`]
//! - [`StoreIterator`] pulls entries from a [`CursorTask`], which survives
//!   cursor transactions expiring mid-scan
//!
//! # Example
//!
//! ```ignore
//! use txkv::{IteratorOptions, KeyValueStore, OpenOptions, ReadOptions, Store, WriteOptions};
//! use txkv::mem::MemEngine;
//!
//! let store = Store::open(MemEngine::new(), "db", OpenOptions::default()).await?;
//! store.put("a", "alpha", WriteOptions::default()).await?;
//! let value = store.get("a", ReadOptions::default()).await?;
//!
//! let iter = store.iterator(IteratorOptions::new().gte("a"))?;
//! while let Some((key, value)) = iter.next().await? {
//!     // ...
//! }
//! ```
//!
//! # Feature Flags
//!
//! - **`in-memory`**: Enables the [`mem`] module, an in-memory engine
//! - **`test-utils`**: Enables the [`conformance`] module, a test suite for
//!   engine implementations. Implies `in-memory`.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod codec;
pub use codec::{
    BINARY_KEY_PREFIX, Key, KeyCodec, KeyEncoding, TypedArrayKind, Value, ValueEncoding,
};

pub mod config;
pub use config::ConfigError;

mod cursor;
pub use cursor::{CursorTask, Entry, IteratorOptions, RangeCursor, StoreIterator};

pub mod engine;
pub use engine::{
    Direction, Durability, EngineCursor, EngineError, EngineResult, KeyRange, KvConnection,
    KvEngine, WriteOp,
};

mod error;
pub use error::{StoreError, StoreResult};

mod lifecycle;
pub use lifecycle::destroy;

mod range;
pub use range::{KeyBound, Limit, ScanRange};

mod store;
pub use store::{BatchOp, KeyValueStore, OpenOptions, ReadOptions, Store, WriteOptions, validate};

#[cfg(any(test, feature = "in-memory"))]
pub mod mem;

#[cfg(any(test, feature = "test-utils"))]
pub mod conformance;
