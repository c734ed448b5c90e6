use crate::Key;
use std::ops::Bound;

/// A key range understood by an engine cursor.
///
/// A `KeyRange` is never empty by construction in the sense that its lower
/// bound never sorts after its upper bound. It may still be empty if no
/// stored key falls between the bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    lower: Bound<Key>,
    upper: Bound<Key>,
}

impl KeyRange {
    /// The range over every key.
    pub const fn all() -> Self {
        Self { lower: Bound::Unbounded, upper: Bound::Unbounded }
    }

    /// Build a range from two bounds.
    ///
    /// Returns `None` if the range is self-contradictory: the lower key sorts
    /// after the upper key, or the two keys are equal and either side is
    /// exclusive.
    pub fn bounded(lower: Bound<Key>, upper: Bound<Key>) -> Option<Self> {
        let valid = match (&lower, &upper) {
            (Bound::Included(lo), Bound::Included(hi)) => lo <= hi,
            (Bound::Included(lo), Bound::Excluded(hi))
            | (Bound::Excluded(lo), Bound::Included(hi))
            | (Bound::Excluded(lo), Bound::Excluded(hi)) => lo < hi,
            _ => true,
        };
        valid.then_some(Self { lower, upper })
    }

    /// The lower bound.
    pub const fn lower(&self) -> &Bound<Key> {
        &self.lower
    }

    /// The upper bound.
    pub const fn upper(&self) -> &Bound<Key> {
        &self.upper
    }

    /// True if `key` lies inside the range.
    pub fn contains(&self, key: &Key) -> bool {
        let above = match &self.lower {
            Bound::Included(lo) => key >= lo,
            Bound::Excluded(lo) => key > lo,
            Bound::Unbounded => true,
        };
        let below = match &self.upper {
            Bound::Included(hi) => key <= hi,
            Bound::Excluded(hi) => key < hi,
            Bound::Unbounded => true,
        };
        above && below
    }
}

impl Default for KeyRange {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(s: &str) -> Key {
        Key::from(s)
    }

    #[test]
    fn contradictory_ranges_are_rejected() {
        assert!(KeyRange::bounded(Bound::Included(k("x")), Bound::Excluded(k("b"))).is_none());
        assert!(KeyRange::bounded(Bound::Included(k("a")), Bound::Excluded(k("a"))).is_none());
        assert!(KeyRange::bounded(Bound::Excluded(k("a")), Bound::Included(k("a"))).is_none());
        assert!(KeyRange::bounded(Bound::Included(k("a")), Bound::Included(k("a"))).is_some());
        assert!(KeyRange::bounded(Bound::Excluded(k("z")), Bound::Unbounded).is_some());
    }

    #[test]
    fn contains_honours_exclusivity() {
        let range = KeyRange::bounded(Bound::Excluded(k("b")), Bound::Included(k("d"))).unwrap();
        assert!(!range.contains(&k("a")));
        assert!(!range.contains(&k("b")));
        assert!(range.contains(&k("c")));
        assert!(range.contains(&k("d")));
        assert!(!range.contains(&k("e")));
        assert!(KeyRange::all().contains(&Key::from(b"\xff")));
    }
}
