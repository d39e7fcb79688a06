//! Fixed-capacity packed bit sets.
//!
//! Every deletion set, vertex subset and scratch mask in the search is a
//! [`PackedSet`]: a bit vector over a universe whose size is fixed at
//! construction. Binary operations require equal capacities and panic on a
//! mismatch, since mixing universes is always a logic error. Padding bits in
//! the last word (positions at or above the capacity) are kept zero by every
//! operation, so popcounts and comparisons can run word-wise.

use rand::Rng;
use std::fmt;

const WORD_BITS: usize = 64;

/// Result of comparing two sets of equal capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOrder {
    /// The sets hold exactly the same members.
    Equal,
    /// The left set is a proper subset of the right one.
    ProperSubset,
    /// Neither equal nor a proper subset of the right set.
    Incomparable,
}

/// A set over `0..capacity`, packed 64 members per word.
#[derive(Clone, PartialEq, Eq)]
pub struct PackedSet {
    capacity: usize,
    words: Vec<u64>,
}

impl PackedSet {
    /// Creates an empty set over the universe `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            words: vec![0; capacity.div_ceil(WORD_BITS)],
        }
    }

    /// Size of the universe.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Removes all members.
    pub fn zero(&mut self) {
        self.words.fill(0);
    }

    /// Returns whether `i` is a member.
    #[inline(always)]
    pub fn contains(&self, i: usize) -> bool {
        debug_assert!(i < self.capacity, "index {i} out of capacity {}", self.capacity);
        self.words[i / WORD_BITS] >> (i % WORD_BITS) & 1 == 1
    }

    /// Adds `i`.
    #[inline(always)]
    pub fn insert(&mut self, i: usize) {
        debug_assert!(i < self.capacity, "index {i} out of capacity {}", self.capacity);
        self.words[i / WORD_BITS] |= 1 << (i % WORD_BITS);
    }

    /// Removes `i`.
    #[inline(always)]
    pub fn remove(&mut self, i: usize) {
        debug_assert!(i < self.capacity, "index {i} out of capacity {}", self.capacity);
        self.words[i / WORD_BITS] &= !(1 << (i % WORD_BITS));
    }

    /// Flips membership of `i`.
    #[inline(always)]
    pub fn toggle(&mut self, i: usize) {
        debug_assert!(i < self.capacity, "index {i} out of capacity {}", self.capacity);
        self.words[i / WORD_BITS] ^= 1 << (i % WORD_BITS);
    }

    /// Copies membership of `i` from `src` into `self`.
    #[inline(always)]
    pub fn copy_bit_from(&mut self, src: &PackedSet, i: usize) {
        self.check_capacity(src);
        if src.contains(i) {
            self.insert(i);
        } else {
            self.remove(i);
        }
    }

    /// Makes `self` an exact copy of `src`.
    pub fn copy_from(&mut self, src: &PackedSet) {
        self.check_capacity(src);
        self.words.copy_from_slice(&src.words);
    }

    /// `self ← self ∪ other`.
    pub fn union_with(&mut self, other: &PackedSet) {
        self.check_capacity(other);
        for (w, &o) in self.words.iter_mut().zip(&other.words) {
            *w |= o;
        }
    }

    /// `self ← self ∩ other`.
    pub fn intersect_with(&mut self, other: &PackedSet) {
        self.check_capacity(other);
        for (w, &o) in self.words.iter_mut().zip(&other.words) {
            *w &= o;
        }
    }

    /// `self ← self \ other`.
    pub fn subtract(&mut self, other: &PackedSet) {
        self.check_capacity(other);
        for (w, &o) in self.words.iter_mut().zip(&other.words) {
            *w &= !o;
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// `|self ∩ other|` without materializing the intersection.
    pub fn intersection_len(&self, other: &PackedSet) -> usize {
        self.check_capacity(other);
        self.words
            .iter()
            .zip(&other.words)
            .map(|(&a, &b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Compares `self` against `other` as sets.
    pub fn compare(&self, other: &PackedSet) -> SetOrder {
        self.check_capacity(other);
        let mut equal = true;
        for (&a, &b) in self.words.iter().zip(&other.words) {
            if a & !b != 0 {
                return SetOrder::Incomparable;
            }
            if a != b {
                equal = false;
            }
        }
        if equal {
            SetOrder::Equal
        } else {
            SetOrder::ProperSubset
        }
    }

    /// Collects the members in increasing order into `out` (cleared first).
    pub fn members(&self, out: &mut Vec<usize>) {
        out.clear();
        out.extend(self.iter());
    }

    /// Iterates over the members in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            let base = wi * WORD_BITS;
            std::iter::successors(
                if w == 0 { None } else { Some(w) },
                |&t| {
                    let t = t & (t - 1);
                    if t == 0 {
                        None
                    } else {
                        Some(t)
                    }
                },
            )
            .map(move |t| base + t.trailing_zeros() as usize)
        })
    }

    /// Replaces the contents with uniformly random membership, keeping
    /// padding bits zero.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        for w in &mut self.words {
            *w = rng.next_u64();
        }
        let rem = self.capacity % WORD_BITS;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }

    #[inline(always)]
    fn check_capacity(&self, other: &PackedSet) {
        assert_eq!(
            self.capacity, other.capacity,
            "packed sets over different universes"
        );
    }
}

impl fmt::Debug for PackedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
