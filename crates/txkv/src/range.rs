//! Scan bounds, direction, and item limit of an iterator.

use crate::{
    Direction, IteratorOptions, Key, KeyCodec, KeyRange, StoreError, StoreResult,
};
use std::ops::Bound;

/// One side of a scan range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBound {
    /// The bound key, in engine form.
    pub key: Key,
    /// True if the key itself is excluded.
    pub exclusive: bool,
}

impl KeyBound {
    /// An inclusive bound.
    pub const fn inclusive(key: Key) -> Self {
        Self { key, exclusive: false }
    }

    /// An exclusive bound.
    pub const fn exclusive(key: Key) -> Self {
        Self { key, exclusive: true }
    }

    fn to_bound(&self) -> Bound<Key> {
        if self.exclusive {
            Bound::Excluded(self.key.clone())
        } else {
            Bound::Included(self.key.clone())
        }
    }
}

/// Maximum number of items an iterator delivers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Limit {
    /// No limit.
    #[default]
    Unbounded,
    /// At most this many items.
    Count(u64),
}

impl Limit {
    /// Parse a caller limit. `None` and `-1` mean unbounded.
    pub fn from_option(limit: Option<i64>) -> StoreResult<Self> {
        match limit {
            None | Some(-1) => Ok(Self::Unbounded),
            Some(n) => u64::try_from(n)
                .map(Self::Count)
                .map_err(|_| StoreError::ProtocolViolation("limit must be -1 or non-negative")),
        }
    }

    /// True if `delivered` items leave room for one more.
    pub const fn allows(&self, delivered: u64) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Count(n) => delivered < *n,
        }
    }

    /// True if the limit is exactly zero.
    pub const fn is_zero(&self) -> bool {
        matches!(self, Self::Count(0))
    }
}

/// Immutable description of a range scan.
///
/// Bound keys are held in engine form. A descriptor whose bounds
/// contradict each other is valid and yields no items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRange {
    lower: Option<KeyBound>,
    upper: Option<KeyBound>,
    direction: Direction,
    limit: Limit,
}

impl ScanRange {
    /// Build a scan range from iterator options.
    ///
    /// `gt` wins over `gte` and `lt` wins over `lte`. Empty bound keys are
    /// ignored. Bound keys go through `codec` so that they compare against
    /// stored keys.
    pub fn new(options: &IteratorOptions, codec: &KeyCodec) -> StoreResult<Self> {
        let limit = Limit::from_option(options.limit)?;
        let side = |strict: &Option<Key>, loose: &Option<Key>| {
            let strict = strict.clone().filter(|k| !k.is_empty());
            let loose = loose.clone().filter(|k| !k.is_empty());
            match (strict, loose) {
                (Some(key), _) => Some(KeyBound::exclusive(codec.normalize(key))),
                (None, Some(key)) => Some(KeyBound::inclusive(codec.normalize(key))),
                (None, None) => None,
            }
        };
        Ok(Self {
            lower: side(&options.gt, &options.gte),
            upper: side(&options.lt, &options.lte),
            direction: if options.reverse { Direction::Reverse } else { Direction::Forward },
            limit,
        })
    }

    /// The lower bound, if any.
    pub const fn lower(&self) -> Option<&KeyBound> {
        self.lower.as_ref()
    }

    /// The upper bound, if any.
    pub const fn upper(&self) -> Option<&KeyBound> {
        self.upper.as_ref()
    }

    /// The scan direction.
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// The item limit.
    pub const fn limit(&self) -> Limit {
        self.limit
    }

    /// The range a cursor should be opened over, given the last key that was
    /// received.
    ///
    /// Once a key has been received, the side the scan moves away from is
    /// replaced by that key, exclusive. Returns `None` if the resulting range
    /// is empty by construction.
    pub fn effective(&self, last_key: Option<&Key>) -> Option<KeyRange> {
        let mut lower = self.lower.as_ref().map_or(Bound::Unbounded, KeyBound::to_bound);
        let mut upper = self.upper.as_ref().map_or(Bound::Unbounded, KeyBound::to_bound);
        if let Some(last) = last_key {
            match self.direction {
                Direction::Forward => lower = Bound::Excluded(last.clone()),
                Direction::Reverse => upper = Bound::Excluded(last.clone()),
            }
        }
        KeyRange::bounded(lower, upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyEncoding;

    fn k(s: &str) -> Key {
        Key::from(s)
    }

    #[test]
    fn parse_limits() {
        assert_eq!(Limit::from_option(None).unwrap(), Limit::Unbounded);
        assert_eq!(Limit::from_option(Some(-1)).unwrap(), Limit::Unbounded);
        assert_eq!(Limit::from_option(Some(0)).unwrap(), Limit::Count(0));
        assert_eq!(Limit::from_option(Some(7)).unwrap(), Limit::Count(7));
        assert!(matches!(Limit::from_option(Some(-2)), Err(StoreError::ProtocolViolation(_))));

        assert!(Limit::Count(2).allows(1));
        assert!(!Limit::Count(2).allows(2));
        assert!(Limit::Unbounded.allows(u64::MAX));
    }

    #[test]
    fn strict_bounds_win() {
        let options = IteratorOptions::new().gt("b").gte("a").lt("y").lte("z");
        let range = ScanRange::new(&options, &KeyCodec::default()).unwrap();
        assert_eq!(range.lower(), Some(&KeyBound::exclusive(k("b"))));
        assert_eq!(range.upper(), Some(&KeyBound::exclusive(k("y"))));
    }

    #[test]
    fn empty_bounds_are_ignored() {
        let options = IteratorOptions::new().gte("").lt("m");
        let range = ScanRange::new(&options, &KeyCodec::default()).unwrap();
        assert_eq!(range.lower(), None);
        assert_eq!(range.upper(), Some(&KeyBound::exclusive(k("m"))));
    }

    #[test]
    fn inverted_range_is_empty() {
        let options = IteratorOptions::new().gte("x").lt("b");
        let range = ScanRange::new(&options, &KeyCodec::default()).unwrap();
        assert_eq!(range.effective(None), None);
    }

    #[test]
    fn resume_excludes_last_key() {
        let options = IteratorOptions::new().gte("a").lte("z");
        let range = ScanRange::new(&options, &KeyCodec::default()).unwrap();
        let resumed = range.effective(Some(&k("c"))).unwrap();
        assert_eq!(resumed.lower(), &Bound::Excluded(k("c")));
        assert_eq!(resumed.upper(), &Bound::Included(k("z")));

        let reverse = ScanRange::new(&options.clone().reverse(true), &KeyCodec::default()).unwrap();
        let resumed = reverse.effective(Some(&k("c"))).unwrap();
        assert_eq!(resumed.lower(), &Bound::Included(k("a")));
        assert_eq!(resumed.upper(), &Bound::Excluded(k("c")));

        // resuming at the upper bound of a forward scan leaves nothing
        assert_eq!(range.effective(Some(&k("z"))), None);
    }

    #[test]
    fn bounds_are_normalized() {
        let codec = KeyCodec::new(KeyEncoding::Binary, false);
        let options = IteratorOptions::new().gte(&b"\x01"[..]);
        let range = ScanRange::new(&options, &codec).unwrap();
        let lower = range.lower().unwrap();
        assert_eq!(lower.key, codec.normalize(Key::from(b"\x01")));
        assert!(lower.key.as_text().is_some());
    }
}
