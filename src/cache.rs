//! # The Satisfiability Cache
//!
//! The public surface of the containment cache: query by superset (reuse a
//! cached assignment) or by subset (reuse a cached infeasibility proof),
//! insert conclusive solver results, and prune entries subsumed by more
//! general ones.
//!
//! Each entry kind has its own containment index behind its own
//! reader-writer lock. Queries hold the shared lock for candidate search
//! *and* validation, so many solver threads can query concurrently; inserts
//! flush and pruning passes take the exclusive lock. Inserts can be
//! buffered through a write-back queue ([`SatisfiabilityCache::with_flush_threshold`]);
//! a buffered entry is not query-visible until flushed, which is safe
//! because a miss only sends the caller back to its solver.

use std::sync::{Arc, RwLock};

use log::{debug, info, trace};
use thiserror::Error;

use crate::{
    index::{CacheEntry, ContainmentIndex},
    permutation::{Permutation, PermutationError},
    types::{Instance, RsHashSet, SolverResult, StationBitSet, TypeError},
};

mod buffer;
pub mod entries;

use buffer::InsertBuffer;
pub use entries::{SatCacheHit, SatEntry, UnsatCacheHit, UnsatEntry};

/// Errors from feeding the cache
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum CacheError {
    /// Only conclusive results can be cached; passing anything else is a
    /// caller bug
    #[error("tried to cache a result that is neither SAT nor UNSAT")]
    InconclusiveResult,
    /// The result or instance references a station outside the cache's
    /// universe
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// The containment/satisfiability cache. One instance is shared by all
/// solver worker threads of the embedding service for the lifetime of the
/// process.
#[derive(Debug)]
pub struct SatisfiabilityCache {
    width: usize,
    sat: RwLock<ContainmentIndex<SatEntry>>,
    unsat: RwLock<ContainmentIndex<UnsatEntry>>,
    sat_buffer: InsertBuffer<SatEntry>,
    unsat_buffer: InsertBuffer<UnsatEntry>,
}

impl SatisfiabilityCache {
    /// Creates an empty cache over the given permutations. The first
    /// permutation is the canonical one; their common width defines the
    /// station universe. Fails if the list is empty or the widths differ,
    /// so a cache never exists in a half-initialized state.
    pub fn new(permutations: Vec<Permutation>) -> Result<Self, PermutationError> {
        let width = permutations
            .first()
            .ok_or(PermutationError::NoPermutations)?
            .width();
        if let Some(odd) = permutations.iter().find(|p| p.width() != width) {
            return Err(PermutationError::WidthMismatch {
                expected: width,
                found: odd.width(),
            });
        }
        let permutations: Arc<[Permutation]> = permutations.into();
        Ok(SatisfiabilityCache {
            width,
            sat: RwLock::new(ContainmentIndex::new(permutations.clone())),
            unsat: RwLock::new(ContainmentIndex::new(permutations)),
            sat_buffer: InsertBuffer::new(1),
            unsat_buffer: InsertBuffer::new(1),
        })
    }

    /// Enables write-back insert buffering: entries are merged into the
    /// sorted index lists only once `threshold` inserts have accumulated
    /// (or [`SatisfiabilityCache::flush`] is called). Intended to be set
    /// before the first insert; switching thresholds later discards pending
    /// entries. The default threshold of one writes every insert through.
    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.sat_buffer = InsertBuffer::new(threshold);
        self.unsat_buffer = InsertBuffer::new(threshold);
        self
    }

    /// The number of stations in the cache's universe
    pub fn width(&self) -> usize {
        self.width
    }

    /// The number of query-visible SAT entries
    pub fn len_sat(&self) -> usize {
        self.sat.read().expect("SAT index lock poisoned").len()
    }

    /// The number of query-visible UNSAT entries
    pub fn len_unsat(&self) -> usize {
        self.unsat.read().expect("UNSAT index lock poisoned").len()
    }

    /// Tries to answer a feasibility query from a cached satisfiable
    /// instance whose station set contains the query's. On a hit the
    /// returned assignment is the cached one restricted to the query's
    /// stations, and it respects every domain of the query. A miss means
    /// nothing beyond "ask the solver".
    pub fn prove_sat_by_superset(&self, instance: &Instance) -> Option<SatCacheHit> {
        let query = self.encode(instance)?;
        let index = self.sat.read().expect("SAT index lock poisoned");
        let hit = index.supersets(&query).find_map(|entry| {
            // candidates are heuristic; re-check true containment before
            // trusting the entry
            if entry.bitset().is_superset_of(&query) && entry.is_solution_to(instance) {
                Some(SatCacheHit {
                    assignment: entry.project_onto(instance),
                    key: entry.key().to_owned(),
                })
            } else {
                None
            }
        });
        match &hit {
            Some(hit) => debug!("superset query answered by entry {}", hit.key),
            None => trace!("superset query missed"),
        }
        hit
    }

    /// Tries to prove a query infeasible from a cached infeasible instance
    /// whose station set is contained in the query's and whose recorded
    /// domains are equal-or-looser per shared station. A miss means nothing
    /// beyond "ask the solver".
    pub fn prove_unsat_by_subset(&self, instance: &Instance) -> Option<UnsatCacheHit> {
        let query = self.encode(instance)?;
        let index = self.unsat.read().expect("UNSAT index lock poisoned");
        let hit = index.subsets(&query).find_map(|entry| {
            if entry.bitset().is_subset_of(&query) && entry.implies_unsat_of(instance) {
                Some(UnsatCacheHit {
                    key: entry.key().to_owned(),
                })
            } else {
                None
            }
        });
        match &hit {
            Some(hit) => debug!("subset query answered by entry {}", hit.key),
            None => trace!("subset query missed"),
        }
        hit
    }

    /// Caches a conclusive solver result for an instance under an opaque
    /// key. SAT results are stored with their witness assignment, UNSAT
    /// results with the instance's domain snapshot. Passing an inconclusive
    /// result is a caller bug and fails with
    /// [`CacheError::InconclusiveResult`].
    pub fn add(&self, instance: &Instance, result: &SolverResult, key: &str) -> Result<(), CacheError> {
        match result {
            SolverResult::Sat(assignment) => {
                let entry = Arc::new(SatEntry::new(assignment, key.to_owned(), self.width)?);
                if self.sat_buffer.push(entry) {
                    self.flush_sat();
                }
            }
            SolverResult::Unsat => {
                let entry = Arc::new(UnsatEntry::new(instance, key.to_owned(), self.width)?);
                if self.unsat_buffer.push(entry) {
                    self.flush_unsat();
                }
            }
            _ => return Err(CacheError::InconclusiveResult),
        }
        Ok(())
    }

    /// Merges all buffered inserts into the indices, making them
    /// query-visible
    pub fn flush(&self) {
        self.flush_sat();
        self.flush_unsat();
    }

    /// Removes SAT entries subsumed by another entry (a station superset
    /// agreeing on every shared channel; among content-identical entries
    /// the lexicographically smallest key survives). Returns the removed
    /// keys so the caller can delete them from any backing persistent
    /// store. One pass never removes an entry that is not subsumed by a
    /// surviving entry; the pass is idempotent.
    pub fn filter_sat(&self) -> Vec<String> {
        self.flush_sat();
        let mut index = self.sat.write().expect("SAT index lock poisoned");
        let removed: Vec<String> = index
            .entries()
            .filter(|&entry| {
                index
                    .supersets_including_equal(entry.bitset())
                    .any(|other| other.subsumes(entry))
            })
            .map(|entry| entry.key().to_owned())
            .collect();
        Self::remove_keys(&mut index, &removed);
        info!("pruned {} subsumed SAT entries", removed.len());
        removed
    }

    /// Removes UNSAT entries subsumed by a more general infeasibility proof
    /// (a station subset with equal-or-looser domains; among
    /// content-identical entries the lexicographically smallest key
    /// survives). Returns the removed keys for the caller's persistent
    /// store.
    pub fn filter_unsat(&self) -> Vec<String> {
        self.flush_unsat();
        let mut index = self.unsat.write().expect("UNSAT index lock poisoned");
        let removed: Vec<String> = index
            .entries()
            .filter(|&entry| {
                index
                    .subsets_including_equal(entry.bitset())
                    .any(|other| other.subsumes(entry))
            })
            .map(|entry| entry.key().to_owned())
            .collect();
        Self::remove_keys(&mut index, &removed);
        info!("pruned {} subsumed UNSAT entries", removed.len());
        removed
    }

    fn flush_sat(&self) {
        let batch = self.sat_buffer.drain();
        if batch.is_empty() {
            return;
        }
        trace!("flushing {} SAT entries", batch.len());
        self.sat
            .write()
            .expect("SAT index lock poisoned")
            .extend(batch);
    }

    fn flush_unsat(&self) {
        let batch = self.unsat_buffer.drain();
        if batch.is_empty() {
            return;
        }
        trace!("flushing {} UNSAT entries", batch.len());
        self.unsat
            .write()
            .expect("UNSAT index lock poisoned")
            .extend(batch);
    }

    fn remove_keys<E: CacheEntry>(index: &mut ContainmentIndex<E>, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        let doomed: RsHashSet<&str> = keys.iter().map(String::as_str).collect();
        index.remove_where(|entry| doomed.contains(entry.key()));
    }

    /// Encodes a query's station set over the universe. A station outside
    /// the universe cannot be covered by any cached entry, so such queries
    /// are ordinary misses rather than errors.
    fn encode(&self, instance: &Instance) -> Option<StationBitSet> {
        match StationBitSet::from_stations(instance.stations(), self.width) {
            Ok(bitset) => Some(bitset),
            Err(e) => {
                debug!("{e}; treating the query as a miss");
                None
            }
        }
    }
}
