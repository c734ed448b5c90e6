use crate::Key;

/// Options for [`KeyValueStore::iterator`](crate::KeyValueStore::iterator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IteratorOptions {
    /// Only keys strictly greater than this. Takes precedence over `gte`.
    pub gt: Option<Key>,
    /// Only keys greater than or equal to this.
    pub gte: Option<Key>,
    /// Only keys strictly less than this. Takes precedence over `lte`.
    pub lt: Option<Key>,
    /// Only keys less than or equal to this.
    pub lte: Option<Key>,
    /// Iterate in descending key order.
    pub reverse: bool,
    /// Maximum number of items. `None` or `-1` means unbounded.
    pub limit: Option<i64>,
    /// Deliver keys as bytes.
    pub key_as_buffer: bool,
    /// Deliver values as bytes.
    pub value_as_buffer: bool,
    /// Reopen the cursor after its transaction expires, instead of failing.
    pub reopen_on_timeout: bool,
}

impl Default for IteratorOptions {
    fn default() -> Self {
        Self {
            gt: None,
            gte: None,
            lt: None,
            lte: None,
            reverse: false,
            limit: None,
            key_as_buffer: true,
            value_as_buffer: true,
            reopen_on_timeout: false,
        }
    }
}

impl IteratorOptions {
    /// Options for an unbounded forward scan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the exclusive lower bound.
    pub fn gt(mut self, key: impl Into<Key>) -> Self {
        self.gt = Some(key.into());
        self
    }

    /// Set the inclusive lower bound.
    pub fn gte(mut self, key: impl Into<Key>) -> Self {
        self.gte = Some(key.into());
        self
    }

    /// Set the exclusive upper bound.
    pub fn lt(mut self, key: impl Into<Key>) -> Self {
        self.lt = Some(key.into());
        self
    }

    /// Set the inclusive upper bound.
    pub fn lte(mut self, key: impl Into<Key>) -> Self {
        self.lte = Some(key.into());
        self
    }

    /// Set the direction.
    pub const fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Set the item limit.
    pub const fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set whether keys are delivered as bytes.
    pub const fn key_as_buffer(mut self, as_buffer: bool) -> Self {
        self.key_as_buffer = as_buffer;
        self
    }

    /// Set whether values are delivered as bytes.
    pub const fn value_as_buffer(mut self, as_buffer: bool) -> Self {
        self.value_as_buffer = as_buffer;
        self
    }

    /// Set whether an expired cursor is reopened.
    pub const fn reopen_on_timeout(mut self, reopen: bool) -> Self {
        self.reopen_on_timeout = reopen;
        self
    }
}
