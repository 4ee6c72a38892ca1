//! # The Containment Index
//!
//! An approximate search structure over set-containment relations. For each
//! of several precomputed station-index permutations, the index keeps all
//! cached entries sorted by that permutation's bit set order. Because every
//! permutation order is consistent with the subset partial order, a binary
//! search per permutation bounds where true supersets (or subsets) of a
//! query can live, and the permutation with the tightest bound yields a
//! small candidate window.
//!
//! The index is a pruning heuristic, not an oracle: candidate windows may
//! contain false positives, so callers must re-check true bitwise
//! containment (and their entry-specific conditions) on every candidate.
//! Given the permutation monotonicity invariant, a window never excludes an
//! entry that a full linear scan restricted to exact containment would have
//! found.

use std::{cmp::Ordering, iter::Rev, slice, sync::Arc};

use itertools::{Either, Itertools};
use log::trace;

use crate::{permutation::Permutation, types::StationBitSet};

/// An entry the containment index can hold: anything that exposes a station
/// bit set to order by and a key to identify it.
pub trait CacheEntry {
    /// The stations of the cached instance, as a bit set over the cache's
    /// universe
    fn bitset(&self) -> &StationBitSet;

    /// The opaque key identifying the entry in the backing store
    fn key(&self) -> &str;
}

/// A containment index over entries of one kind. Holds the same entry set
/// once per permutation, each copy sorted by that permutation's order;
/// entries are shared between the lists via [`Arc`].
#[derive(Debug)]
pub struct ContainmentIndex<E> {
    permutations: Arc<[Permutation]>,
    lists: Vec<Vec<Arc<E>>>,
}

impl<E: CacheEntry> ContainmentIndex<E> {
    /// Creates an empty index over the given permutations. The permutation
    /// list must be non-empty and width-uniform; the facade validates this
    /// at cache construction.
    pub fn new(permutations: Arc<[Permutation]>) -> Self {
        debug_assert!(!permutations.is_empty());
        let lists = vec![Vec::new(); permutations.len()];
        ContainmentIndex {
            permutations,
            lists,
        }
    }

    /// Gets the number of entries in the index
    pub fn len(&self) -> usize {
        self.lists[0].len()
    }

    /// Checks if the index holds no entries
    pub fn is_empty(&self) -> bool {
        self.lists[0].is_empty()
    }

    /// Iterates over all entries in canonical (first) permutation order
    pub fn entries(&self) -> impl Iterator<Item = &Arc<E>> {
        self.lists[0].iter()
    }

    /// Inserts a batch of entries, re-establishing every permutation's sort
    /// order once per batch rather than once per entry
    pub fn extend(&mut self, batch: Vec<Arc<E>>) {
        for (perm, list) in self.permutations.iter().zip(self.lists.iter_mut()) {
            list.extend(batch.iter().cloned());
            list.sort_by(|a, b| perm.compare(a.bitset(), b.bitset()));
        }
    }

    /// Removes every entry whose key the predicate accepts
    pub fn remove_where<F>(&mut self, mut doomed: F)
    where
        F: FnMut(&E) -> bool,
    {
        for list in &mut self.lists {
            list.retain(|entry| !doomed(entry));
        }
    }

    /// Returns candidate entries whose bit sets may be supersets of the
    /// query, most-specific (largest under the chosen permutation) first.
    ///
    /// If some permutation finds the query's bit set exactly, that entry is
    /// the only candidate (equal bit sets are found by every permutation, so
    /// checking further cannot widen the result). Otherwise the suffix
    /// behind the right-most insertion point across all permutations is
    /// scanned in reverse, so the largest bit sets are examined first.
    pub fn supersets(&self, query: &StationBitSet) -> SupersetCandidates<'_, E> {
        let mut insertion_points = Vec::with_capacity(self.permutations.len());
        for (perm_idx, (perm, list)) in
            self.permutations.iter().zip(self.lists.iter()).enumerate()
        {
            match list.binary_search_by(|entry| perm.compare(entry.bitset(), query)) {
                Ok(idx) => {
                    trace!("exact match in permutation {perm_idx} at {idx}");
                    return Either::Left(list[idx..=idx].iter());
                }
                Err(idx) => insertion_points.push(idx),
            }
        }
        trace!("superset insertion points {insertion_points:?}");
        let best = insertion_points
            .iter()
            .position_max()
            .expect("index has at least one permutation");
        Either::Right(self.lists[best][insertion_points[best]..].iter().rev())
    }

    /// Returns candidate entries whose bit sets may be subsets of the query,
    /// smallest first. Exact matches short-circuit as in
    /// [`ContainmentIndex::supersets`]; otherwise the prefix before the
    /// left-most insertion point across all permutations is scanned.
    pub fn subsets(&self, query: &StationBitSet) -> slice::Iter<'_, Arc<E>> {
        let mut insertion_points = Vec::with_capacity(self.permutations.len());
        for (perm_idx, (perm, list)) in
            self.permutations.iter().zip(self.lists.iter()).enumerate()
        {
            match list.binary_search_by(|entry| perm.compare(entry.bitset(), query)) {
                Ok(idx) => {
                    trace!("exact match in permutation {perm_idx} at {idx}");
                    return list[idx..=idx].iter();
                }
                Err(idx) => insertion_points.push(idx),
            }
        }
        trace!("subset insertion points {insertion_points:?}");
        let best = insertion_points
            .iter()
            .position_min()
            .expect("index has at least one permutation");
        self.lists[best][..insertion_points[best]].iter()
    }

    /// Like [`ContainmentIndex::supersets`] but without the exact-match
    /// short circuit, and with entries of equal bit set included in the
    /// window. Pruning needs this: when probing with an entry's own bit set,
    /// the short circuit would return the probe itself and hide its true
    /// supersets and equal-set rivals.
    pub fn supersets_including_equal(
        &self,
        query: &StationBitSet,
    ) -> Rev<slice::Iter<'_, Arc<E>>> {
        let lower_bounds: Vec<usize> = self
            .permutations
            .iter()
            .zip(self.lists.iter())
            .map(|(perm, list)| {
                list.partition_point(|entry| perm.compare(entry.bitset(), query) == Ordering::Less)
            })
            .collect();
        let best = lower_bounds
            .iter()
            .position_max()
            .expect("index has at least one permutation");
        self.lists[best][lower_bounds[best]..].iter().rev()
    }

    /// Like [`ContainmentIndex::subsets`] but without the exact-match short
    /// circuit, and with entries of equal bit set included in the window
    pub fn subsets_including_equal(&self, query: &StationBitSet) -> slice::Iter<'_, Arc<E>> {
        let upper_bounds: Vec<usize> = self
            .permutations
            .iter()
            .zip(self.lists.iter())
            .map(|(perm, list)| {
                list.partition_point(|entry| {
                    perm.compare(entry.bitset(), query) != Ordering::Greater
                })
            })
            .collect();
        let best = upper_bounds
            .iter()
            .position_min()
            .expect("index has at least one permutation");
        self.lists[best][..upper_bounds[best]].iter()
    }
}

/// Candidate iterator of [`ContainmentIndex::supersets`]: either the exact
/// match singleton or a reversed suffix window
pub type SupersetCandidates<'idx, E> =
    Either<slice::Iter<'idx, Arc<E>>, Rev<slice::Iter<'idx, Arc<E>>>>;
