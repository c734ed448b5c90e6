use crate::{Key, KeyEncoding, Value, ValueEncoding};

/// Options for [`Store::open`](crate::Store::open).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    /// Create the store if it does not exist.
    pub create_if_missing: bool,
    /// Fail if the store already exists.
    pub error_if_exists: bool,
    /// Encoding of caller keys.
    pub key_encoding: KeyEncoding,
    /// Name of the collection inside the namespace. Defaults to the
    /// location.
    pub store_name: Option<String>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            key_encoding: KeyEncoding::Utf8,
            store_name: None,
        }
    }
}

impl OpenOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `create_if_missing`.
    pub const fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Set `error_if_exists`.
    pub const fn error_if_exists(mut self, error: bool) -> Self {
        self.error_if_exists = error;
        self
    }

    /// Set the key encoding.
    pub const fn key_encoding(mut self, encoding: KeyEncoding) -> Self {
        self.key_encoding = encoding;
        self
    }

    /// Set the collection name.
    pub fn store_name(mut self, name: impl Into<String>) -> Self {
        self.store_name = Some(name.into());
        self
    }
}

/// Options for [`KeyValueStore::get`](crate::KeyValueStore::get).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Return the value as bytes.
    pub as_buffer: bool,
    /// Return the stored value without any coercion.
    pub raw: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { as_buffer: true, raw: false }
    }
}

impl ReadOptions {
    /// Return values in their native form.
    pub const fn native() -> Self {
        Self { as_buffer: false, raw: false }
    }

    /// Return values exactly as stored.
    pub const fn raw() -> Self {
        Self { as_buffer: false, raw: true }
    }
}

/// Options for writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Request a strict-durability commit. Ignored by engines that cannot
    /// provide one.
    pub sync: bool,
    /// Store the value without any encoding.
    pub raw: bool,
    /// Encoding of put values.
    pub value_encoding: ValueEncoding,
}

impl WriteOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `sync`.
    pub const fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Set `raw`.
    pub const fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    /// Set the value encoding.
    pub const fn value_encoding(mut self, encoding: ValueEncoding) -> Self {
        self.value_encoding = encoding;
        self
    }
}

/// One operation of a [`KeyValueStore::batch`](crate::KeyValueStore::batch).
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    /// Insert or overwrite a key.
    Put {
        /// The key.
        key: Key,
        /// The value.
        value: Value,
    },
    /// Remove a key.
    Del {
        /// The key.
        key: Key,
    },
}

impl BatchOp {
    /// A put operation.
    pub fn put(key: impl Into<Key>, value: impl Into<Value>) -> Self {
        Self::Put { key: key.into(), value: value.into() }
    }

    /// A delete operation.
    pub fn del(key: impl Into<Key>) -> Self {
        Self::Del { key: key.into() }
    }

    /// The key the operation targets.
    pub const fn key(&self) -> &Key {
        match self {
            Self::Put { key, .. } | Self::Del { key } => key,
        }
    }
}
