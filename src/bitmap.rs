//! Selection bitmaps and membership probes built on roaring bitmaps.

use roaring::{RoaringBitmap, RoaringTreemap};

/// Fixed-length selection bitmap over the rows of one block.
///
/// Bit `i` set means row `i` is selected. All operations stay within
/// `0..len`; the backing bitmap never holds positions past the row count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    len: u32,
    bits: RoaringBitmap,
}

impl Selection {
    /// Creates an empty (all zero) selection over `len` rows.
    #[must_use]
    pub fn new(len: u32) -> Self {
        Self {
            len,
            bits: RoaringBitmap::new(),
        }
    }

    /// Creates a full (all one) selection over `len` rows.
    #[must_use]
    pub fn full(len: u32) -> Self {
        let mut s = Self::new(len);
        s.one();
        s
    }

    /// Number of rows covered by this selection.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// True when the selection covers zero rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sets every bit.
    pub fn one(&mut self) {
        if self.len > 0 {
            self.bits.insert_range(0..self.len);
        }
    }

    /// Clears every bit.
    pub fn zero(&mut self) {
        self.bits.clear();
    }

    /// Sets bit `row`.
    pub fn set(&mut self, row: u32) {
        debug_assert!(row < self.len);
        self.bits.insert(row);
    }

    /// Clears bit `row`.
    pub fn unset(&mut self, row: u32) {
        self.bits.remove(row);
    }

    /// True when bit `row` is set.
    #[must_use]
    pub fn contains(&self, row: u32) -> bool {
        self.bits.contains(row)
    }

    /// Number of set bits.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.bits.len()
    }

    /// True when at least one bit is set.
    #[must_use]
    pub fn any(&self) -> bool {
        !self.bits.is_empty()
    }

    /// True when every bit is set.
    #[must_use]
    pub fn all(&self) -> bool {
        self.count() == u64::from(self.len)
    }

    /// Intersects with `other` in place.
    pub fn and(&mut self, other: &Self) {
        debug_assert_eq!(self.len, other.len);
        self.bits &= &other.bits;
    }

    /// Unions with `other` in place.
    pub fn or(&mut self, other: &Self) {
        debug_assert_eq!(self.len, other.len);
        self.bits |= &other.bits;
    }

    /// Flips every bit within `0..len`.
    pub fn neg(&mut self) {
        let mut full = RoaringBitmap::new();
        if self.len > 0 {
            full.insert_range(0..self.len);
        }
        self.bits = full - &self.bits;
    }

    /// Returns the complement without mutating `self`.
    #[must_use]
    pub fn complement(&self) -> Self {
        let mut out = self.clone();
        out.neg();
        out
    }

    /// Overwrites this selection with the bits of `other`.
    pub fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!(self.len, other.len);
        self.bits = other.bits.clone();
    }

    /// Iterates the set row positions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.bits.iter()
    }
}

/// Read-only membership structure over `u64` keys (exact bitmap, bloom
/// filter, ...). Implementations may over-approximate but must never report
/// a false negative; see [`Value::filter_key`](crate::value::Value::filter_key)
/// for how literals map to keys.
pub trait Membership {
    /// True when `key` may be present.
    fn contains(&self, key: u64) -> bool;

    /// True when any of `keys` may be present.
    fn contains_any(&self, keys: &[u64]) -> bool {
        keys.iter().any(|&k| self.contains(k))
    }
}

impl Membership for RoaringTreemap {
    fn contains(&self, key: u64) -> bool {
        RoaringTreemap::contains(self, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_algebra() {
        let mut a = Selection::new(8);
        a.set(1);
        a.set(3);
        let mut b = Selection::new(8);
        b.set(3);
        b.set(5);

        let mut and = a.clone();
        and.and(&b);
        assert_eq!(and.iter().collect::<Vec<_>>(), vec![3]);

        let mut or = a.clone();
        or.or(&b);
        assert_eq!(or.iter().collect::<Vec<_>>(), vec![1, 3, 5]);

        a.neg();
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![0, 2, 4, 5, 6, 7]);
    }

    #[test]
    fn full_and_empty_flags() {
        let mut s = Selection::new(4);
        assert!(!s.any());
        assert!(!s.all());
        s.one();
        assert!(s.all());
        assert_eq!(s.count(), 4);
        s.neg();
        assert!(!s.any());
    }

    #[test]
    fn zero_length_selection() {
        let mut s = Selection::new(0);
        s.one();
        s.neg();
        assert!(s.all());
        assert!(!s.any());
    }

    #[test]
    fn treemap_membership() {
        let mut set = RoaringTreemap::new();
        set.insert(7);
        set.insert(u64::MAX);
        assert!(Membership::contains(&set, 7));
        assert!(set.contains_any(&[1, 2, u64::MAX]));
        assert!(!set.contains_any(&[1, 2, 3]));
    }
}
