//! # Station Index Permutations
//!
//! A permutation is a priority ordering over station indices. Each
//! permutation induces a strict total order over [`StationBitSet`]s that is
//! consistent with the subset partial order: a subset never ranks above its
//! superset. The containment index keeps its entries sorted under several
//! such permutations and picks, per query, the one with the tightest search
//! window.

use std::cmp::Ordering;

use thiserror::Error;

use crate::types::StationBitSet;

/// Errors from constructing permutations or permutation lists
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum PermutationError {
    /// The permutation has no elements
    #[error("a permutation must order at least one station index")]
    Empty,
    /// An index exceeds the permutation's width
    #[error("station index {0} is out of range for a permutation of width {1}")]
    OutOfRange(u32, usize),
    /// An index occurs more than once
    #[error("station index {0} appears more than once")]
    Duplicate(u32),
    /// A permutation list must contain at least one permutation
    #[error("at least one permutation is required")]
    NoPermutations,
    /// Permutations in one list must all have the same width
    #[error("permutation widths differ: expected {expected}, found {found}")]
    WidthMismatch {
        /// Width of the first permutation in the list
        expected: usize,
        /// Width of the offending permutation
        found: usize,
    },
}

/// A bijection over the station indices `0..width`, from least significant
/// position to most significant. Immutable after construction; validated to
/// actually be a bijection, since a malformed permutation would silently
/// break the binary searches built on top of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    order: Box<[u32]>,
}

impl Permutation {
    /// Creates a permutation from its priority order (least significant
    /// station index first). Fails if the sequence is empty or not a
    /// bijection over `0..len`.
    pub fn new(order: Vec<u32>) -> Result<Self, PermutationError> {
        if order.is_empty() {
            return Err(PermutationError::Empty);
        }
        let width = order.len();
        let mut seen = vec![false; width];
        for &idx in &order {
            if idx as usize >= width {
                return Err(PermutationError::OutOfRange(idx, width));
            }
            if seen[idx as usize] {
                return Err(PermutationError::Duplicate(idx));
            }
            seen[idx as usize] = true;
        }
        Ok(Permutation {
            order: order.into_boxed_slice(),
        })
    }

    /// The identity permutation: station indices in ascending significance
    pub fn identity(width: usize) -> Self {
        Permutation {
            order: (0..width as u32).collect(),
        }
    }

    /// The number of station indices the permutation orders, which is also
    /// the width of the bit sets it can compare
    #[inline]
    pub fn width(&self) -> usize {
        self.order.len()
    }

    /// Compares two bit sets under this permutation's priority order.
    ///
    /// The scan runs from the most significant position to the least; the
    /// first position where exactly one bit set has the bit decides. Since
    /// at every scanned position a superset is bitwise greater-or-equal,
    /// `a.is_subset_of(b)` implies `compare(a, b) <= Ordering::Equal` for
    /// every permutation, and equal bit sets compare equal under every
    /// permutation.
    pub fn compare(&self, a: &StationBitSet, b: &StationBitSet) -> Ordering {
        for &idx in self.order.iter().rev() {
            match (a.bit(idx as usize), b.bit(idx as usize)) {
                (true, false) => return Ordering::Greater,
                (false, true) => return Ordering::Less,
                _ => continue,
            }
        }
        Ordering::Equal
    }
}
