//! The transactional engine a [`Store`] runs on.
//!
//! An engine hosts named namespaces. Each namespace has a version and a set
//! of collections, and collections are only created by an upgrade to a
//! higher version. Every request runs in a short-lived transaction, and a
//! cursor's transaction may expire between two of its requests.
//!
//! The contract is split into three traits:
//!
//! - [`KvEngine`] opens, upgrades and deletes namespaces.
//! - [`KvConnection`] serves point reads, atomic writes and cursor opens
//!   against one namespace at one version.
//! - [`EngineCursor`] walks a [`KeyRange`] one row at a time.
//!
//! [`Store`]: crate::Store

mod error;
pub use error::{EngineError, EngineResult};

mod range;
pub use range::KeyRange;

mod traits;
pub use traits::{EngineCursor, KvConnection, KvEngine};

use crate::{Key, Value};

/// Iteration direction of a cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Ascending key order.
    #[default]
    Forward,
    /// Descending key order.
    Reverse,
}

impl Direction {
    /// True if the direction is [`Direction::Reverse`].
    pub const fn is_reverse(&self) -> bool {
        matches!(self, Self::Reverse)
    }
}

/// Durability hint for a read-write transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Durability {
    /// Engine default.
    #[default]
    Default,
    /// Commit only once the data is flushed.
    Strict,
}

/// A single mutation within a read-write transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert or overwrite `key`.
    Put {
        /// The key to write.
        key: Key,
        /// The value to store.
        value: Value,
    },
    /// Remove `key`. Removing an absent key is not an error.
    Del {
        /// The key to remove.
        key: Key,
    },
}

impl WriteOp {
    /// The key the operation targets.
    pub const fn key(&self) -> &Key {
        match self {
            Self::Put { key, .. } | Self::Del { key } => key,
        }
    }
}
