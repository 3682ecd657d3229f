//! Dense bit set over small integer keys.
//!
//! Used as the visited bitmap of the CFG flood fills, keyed by block index.
//!
//! # Example
//!
//! ```rust
//! use meir::utils::BitSet;
//!
//! let mut set = BitSet::new(100);
//! set.insert(3);
//! set.insert(64);
//! assert!(set.contains(64));
//! assert_eq!(set.iter().collect::<Vec<_>>(), vec![3, 64]);
//! ```

use std::fmt;

/// A fixed-capacity set of `usize` keys stored one bit per key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    words: Vec<u64>,
    len: usize,
}

impl BitSet {
    /// Creates an empty set able to hold keys `0..capacity`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
            len: capacity,
        }
    }

    /// Capacity of the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Adds `index`, returning `true` if it was not present.
    ///
    /// # Panics
    ///
    /// Aborts if `index` is outside the capacity.
    pub fn insert(&mut self, index: usize) -> bool {
        check_fatal!(index < self.len, "bit {} outside set of {}", index, self.len);
        let mask = 1u64 << (index % 64);
        let word = &mut self.words[index / 64];
        let added = *word & mask == 0;
        *word |= mask;
        added
    }

    /// Removes `index`.
    pub fn remove(&mut self, index: usize) {
        check_fatal!(index < self.len, "bit {} outside set of {}", index, self.len);
        self.words[index / 64] &= !(1u64 << (index % 64));
    }

    /// Returns `true` if `index` is present.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        check_fatal!(index < self.len, "bit {} outside set of {}", index, self.len);
        self.words[index / 64] & (1u64 << (index % 64)) != 0
    }

    /// Number of keys present.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }

    /// Adds every key of `other`, returning `true` if the set changed.
    pub fn union_with(&mut self, other: &Self) -> bool {
        check_fatal!(self.len == other.len, "bit sets of different capacity");
        let mut changed = false;
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            let old = *a;
            *a |= *b;
            changed |= old != *a;
        }
        changed
    }

    /// Iterates over the present keys in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(w * 64 + bit)
            })
        })
    }
}

impl fmt::Debug for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_novelty() {
        let mut set = BitSet::new(10);
        assert!(set.insert(4));
        assert!(!set.insert(4));
        assert_eq!(set.count(), 1);
        set.remove(4);
        assert!(set.is_empty());
    }

    #[test]
    fn test_iter_crosses_words() {
        let mut set = BitSet::new(200);
        for i in [0, 63, 64, 130, 199] {
            set.insert(i);
        }
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 63, 64, 130, 199]);
    }

    #[test]
    fn test_union() {
        let mut a = BitSet::new(8);
        let mut b = BitSet::new(8);
        a.insert(1);
        b.insert(2);
        assert!(a.union_with(&b));
        assert!(!a.union_with(&b));
        assert_eq!(format!("{a:?}"), "{1, 2}");
    }

    #[test]
    #[should_panic(expected = "outside set")]
    fn test_out_of_range_is_fatal() {
        let set = BitSet::new(4);
        let _ = set.contains(4);
    }
}
