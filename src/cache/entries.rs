//! # Cache Entry Model
//!
//! The two kinds of cached records: a [`SatEntry`] remembers a satisfiable
//! instance together with its witness assignment, an [`UnsatEntry`]
//! remembers an infeasible instance together with the channel domains it
//! was infeasible under. Entries are immutable after construction and
//! shared between the per-permutation index lists.

use crate::{
    index::CacheEntry,
    types::{Assignment, Channel, Instance, RsHashMap, RsHashSet, Station, StationBitSet, TypeError},
};

/// A cached satisfiable instance: the stations that were on air and the
/// channel each was assigned.
///
/// The channels are packed in ascending set-bit order: position `j` of the
/// encoding belongs to the `j`-th member station of the bit set, so the
/// encoding's length always equals the bit set's cardinality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatEntry {
    bitset: StationBitSet,
    key: String,
    channels: Vec<Channel>,
}

impl SatEntry {
    /// Builds an entry from a witness assignment over a universe of `width`
    /// stations
    pub fn new(assignment: &Assignment, key: String, width: usize) -> Result<Self, TypeError> {
        let station_channels = assignment.station_channels();
        let bitset = StationBitSet::from_stations(station_channels.keys().copied(), width)?;
        let channels = bitset
            .ones()
            .map(|station| station_channels[&station])
            .collect();
        Ok(SatEntry {
            bitset,
            key,
            channels,
        })
    }

    /// Looks up the channel this entry assigns to a station
    pub fn channel_of(&self, station: Station) -> Option<Channel> {
        if !self.bitset.contains(station) {
            return None;
        }
        Some(self.channels[self.bitset.rank(station)])
    }

    /// Checks whether this entry's assignment solves the given instance:
    /// every station of the instance must be covered and its assigned
    /// channel must lie in the instance's domain for that station. A station
    /// this entry does not cover makes the entry non-matching, never an
    /// error.
    pub fn is_solution_to(&self, instance: &Instance) -> bool {
        instance
            .domains()
            .iter()
            .all(|(&station, domain)| match self.channel_of(station) {
                Some(channel) => domain.contains(&channel),
                None => false,
            })
    }

    /// Projects the assignment onto the stations of an instance. Only
    /// meaningful after [`SatEntry::is_solution_to`] accepted the instance.
    pub fn project_onto(&self, instance: &Instance) -> Assignment {
        Assignment::from_station_channels(
            instance
                .stations()
                .filter_map(|station| self.channel_of(station).map(|ch| (station, ch))),
        )
    }

    /// Checks whether this entry subsumes `other`: every query `other` can
    /// answer, this entry answers with the same projected assignment. That
    /// requires covering at least `other`'s stations and agreeing with its
    /// channels on all of them. Content-identical entries are tie-broken by
    /// key so that exactly one of a duplicate pair subsumes the other.
    pub fn subsumes(&self, other: &SatEntry) -> bool {
        if !other.bitset.is_subset_of(&self.bitset) {
            return false;
        }
        let agrees = other
            .bitset
            .ones()
            .all(|station| self.channel_of(station) == other.channel_of(station));
        if !agrees {
            return false;
        }
        if self.bitset != other.bitset {
            return true;
        }
        // identical station sets with agreeing channels: keep the
        // lexicographically smaller key
        self.key < other.key
    }
}

impl CacheEntry for SatEntry {
    fn bitset(&self) -> &StationBitSet {
        &self.bitset
    }

    fn key(&self) -> &str {
        &self.key
    }
}

/// A cached infeasible instance: the stations that could not be packed and
/// the channel domain each had. The domain map's key set always equals the
/// bit set's members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsatEntry {
    bitset: StationBitSet,
    key: String,
    domains: RsHashMap<Station, RsHashSet<Channel>>,
}

impl UnsatEntry {
    /// Builds an entry from the domains of an infeasible instance over a
    /// universe of `width` stations
    pub fn new(instance: &Instance, key: String, width: usize) -> Result<Self, TypeError> {
        let bitset = StationBitSet::from_stations(instance.stations(), width)?;
        Ok(UnsatEntry {
            bitset,
            key,
            domains: instance.domains().clone(),
        })
    }

    /// Gets the recorded domain of a station
    pub fn domain(&self, station: Station) -> Option<&RsHashSet<Channel>> {
        self.domains.get(&station)
    }

    /// Checks whether this entry proves the given instance infeasible: the
    /// entry's stations must all occur in the instance, each with a domain
    /// no larger than the one the entry recorded. Infeasibility is monotonic
    /// under station-set growth and domain shrinkage, so a match is a valid
    /// proof. An entry station missing from the instance's domain map makes
    /// the entry non-matching, never an error.
    pub fn implies_unsat_of(&self, instance: &Instance) -> bool {
        self.domains
            .iter()
            .all(|(&station, entry_domain)| match instance.domain(station) {
                Some(query_domain) => query_domain.is_subset(entry_domain),
                None => false,
            })
    }

    /// Checks whether this entry subsumes `other`: this entry must be the
    /// more general infeasibility proof, with a station subset of `other`
    /// and an equal-or-larger domain per shared station. Content-identical
    /// entries are tie-broken by key.
    pub fn subsumes(&self, other: &UnsatEntry) -> bool {
        if !self.bitset.is_subset_of(&other.bitset) {
            return false;
        }
        let looser = self
            .domains
            .iter()
            .all(|(&station, my_domain)| match other.domain(station) {
                Some(their_domain) => their_domain.is_subset(my_domain),
                None => false,
            });
        if !looser {
            return false;
        }
        if self.bitset != other.bitset || self.domains != other.domains {
            return true;
        }
        self.key < other.key
    }
}

impl CacheEntry for UnsatEntry {
    fn bitset(&self) -> &StationBitSet {
        &self.bitset
    }

    fn key(&self) -> &str {
        &self.key
    }
}

/// A successful superset query: a cached assignment projected onto the
/// query's stations, and the key of the entry that provided it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatCacheHit {
    /// The reusable assignment, restricted to the query's stations
    pub assignment: Assignment,
    /// The key of the cached entry the assignment came from
    pub key: String,
}

/// A successful subset query: the key of the cached infeasibility proof
/// that implies the query is infeasible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsatCacheHit {
    /// The key of the cached entry that proves infeasibility
    pub key: String,
}
