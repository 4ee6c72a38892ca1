//! # Common Types for the Satisfiability Cache
//!
//! Common types used throughout the library to guarantee type safety.

use std::fmt;

use thiserror::Error;

pub mod bitset;
pub use bitset::StationBitSet;

/// The hash map to use throughout the library
#[cfg(feature = "fxhash")]
pub type RsHashMap<K, V> = rustc_hash::FxHashMap<K, V>;
#[cfg(not(feature = "fxhash"))]
pub type RsHashMap<K, V> = std::collections::HashMap<K, V>;

/// The hash set to use throughout the library
#[cfg(feature = "fxhash")]
pub type RsHashSet<V> = rustc_hash::FxHashSet<V>;
#[cfg(not(feature = "fxhash"))]
pub type RsHashSet<V> = std::collections::HashSet<V>;

/// Type representing a broadcast station. Stations are identified by a
/// non-negative integer and totally ordered by it. The memory representation
/// is `u32`.
#[derive(Hash, Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug)]
#[repr(transparent)]
pub struct Station {
    idx: u32,
}

impl Station {
    /// Creates a new station with a given identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use satcache::types::Station;
    ///
    /// let station = Station::new(5);
    ///
    /// assert_eq!(5, station.idx());
    /// ```
    #[inline]
    pub fn new(idx: u32) -> Station {
        Station { idx }
    }

    /// Returns the station identifier as a `usize` to enable easier indexing
    /// of data structures like vectors, even though the internal
    /// representation is `u32`. For the 32 bit identifier use
    /// [`Station::idx32`].
    #[inline]
    pub fn idx(&self) -> usize {
        self.idx as usize
    }

    /// Returns the 32 bit station identifier.
    #[inline]
    pub fn idx32(&self) -> u32 {
        self.idx
    }
}

/// Stations can be printed with the [`Display`](std::fmt::Display) trait
impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.idx)
    }
}

/// Type representing a broadcast channel. Channels in practice are small
/// (UHF channels fit in a byte); `u16` keeps headroom without widening cache
/// entries materially.
#[derive(Hash, Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug)]
#[repr(transparent)]
pub struct Channel {
    ch: u16,
}

impl Channel {
    /// Creates a new channel with a given number.
    #[inline]
    pub fn new(ch: u16) -> Channel {
        Channel { ch }
    }

    /// Returns the channel number.
    #[inline]
    pub fn number(&self) -> u16 {
        self.ch
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.ch)
    }
}

/// Errors from value constructions in this module
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum TypeError {
    /// A station identifier does not fit the universe the cache was
    /// constructed over
    #[error("station {0} is outside the universe of {1} known stations")]
    StationOutOfRange(Station, usize),
}

/// A channel assignment, stored in channel-to-stations form (the shape the
/// surrounding service serializes). Station-to-channel views are derived on
/// demand.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    channel_to_stations: RsHashMap<Channel, RsHashSet<Station>>,
}

impl Assignment {
    /// Creates a new empty assignment
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a station to a channel. A station assigned twice keeps both
    /// entries; callers are expected to assign each station once.
    pub fn assign(&mut self, station: Station, channel: Channel) {
        self.channel_to_stations
            .entry(channel)
            .or_default()
            .insert(station);
    }

    /// Builds an assignment from station-to-channel form
    pub fn from_station_channels<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (Station, Channel)>,
    {
        let mut assignment = Self::new();
        for (station, channel) in iter {
            assignment.assign(station, channel);
        }
        assignment
    }

    /// Derives the station-to-channel view of the assignment
    pub fn station_channels(&self) -> RsHashMap<Station, Channel> {
        let mut map = RsHashMap::default();
        for (&channel, stations) in &self.channel_to_stations {
            for &station in stations {
                map.insert(station, channel);
            }
        }
        map
    }

    /// Looks up the channel a station is assigned to
    pub fn channel_of(&self, station: Station) -> Option<Channel> {
        self.channel_to_stations
            .iter()
            .find(|(_, stations)| stations.contains(&station))
            .map(|(&channel, _)| channel)
    }

    /// Gets the stations packed onto a channel
    pub fn stations_on(&self, channel: Channel) -> Option<&RsHashSet<Station>> {
        self.channel_to_stations.get(&channel)
    }

    /// Iterates over the used channels and the stations packed onto them
    pub fn iter(&self) -> impl Iterator<Item = (&Channel, &RsHashSet<Station>)> {
        self.channel_to_stations.iter()
    }

    /// Gets the number of assigned stations
    pub fn n_stations(&self) -> usize {
        self.channel_to_stations.values().map(RsHashSet::len).sum()
    }

    /// Checks if no station is assigned
    pub fn is_empty(&self) -> bool {
        self.channel_to_stations.is_empty()
    }
}

/// A station packing instance: the stations to pack, each with its domain of
/// permissible channels, and optionally the assignment of a previous,
/// related instance. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    domains: RsHashMap<Station, RsHashSet<Channel>>,
    previous_assignment: Option<RsHashMap<Station, Channel>>,
}

impl Instance {
    /// Creates a new instance from per-station channel domains
    pub fn new(domains: RsHashMap<Station, RsHashSet<Channel>>) -> Self {
        Instance {
            domains,
            previous_assignment: None,
        }
    }

    /// Attaches the assignment of a previously solved, related instance.
    /// The cache itself never reads it; it is carried for the solver
    /// backends that seed their search with it.
    pub fn with_previous_assignment(
        mut self,
        previous_assignment: RsHashMap<Station, Channel>,
    ) -> Self {
        self.previous_assignment = Some(previous_assignment);
        self
    }

    /// Gets the per-station channel domains
    pub fn domains(&self) -> &RsHashMap<Station, RsHashSet<Channel>> {
        &self.domains
    }

    /// Gets the domain of a single station
    pub fn domain(&self, station: Station) -> Option<&RsHashSet<Channel>> {
        self.domains.get(&station)
    }

    /// Iterates over the stations of the instance (in no particular order)
    pub fn stations(&self) -> impl Iterator<Item = Station> + '_ {
        self.domains.keys().copied()
    }

    /// Checks whether a station is part of the instance
    pub fn contains(&self, station: Station) -> bool {
        self.domains.contains_key(&station)
    }

    /// Gets the previous assignment, if one was attached
    pub fn previous_assignment(&self) -> Option<&RsHashMap<Station, Channel>> {
        self.previous_assignment.as_ref()
    }

    /// Gets the number of stations in the instance
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Checks if the instance has no stations
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// The outcome of a solver run on an instance. Only the conclusive variants
/// ([`SolverResult::Sat`], [`SolverResult::Unsat`]) may be cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverResult {
    /// The instance is satisfiable, with a witness assignment
    Sat(Assignment),
    /// The instance is infeasible
    Unsat,
    /// The solver ran out of time
    Timeout,
    /// The solver run was interrupted from the outside
    Interrupted,
    /// The solver terminated without a verdict
    Unknown,
}

impl SolverResult {
    /// Whether the result carries a verdict that can be cached
    pub fn is_conclusive(&self) -> bool {
        matches!(self, SolverResult::Sat(_) | SolverResult::Unsat)
    }
}

impl fmt::Display for SolverResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverResult::Sat(_) => write!(f, "SAT"),
            SolverResult::Unsat => write!(f, "UNSAT"),
            SolverResult::Timeout => write!(f, "TIMEOUT"),
            SolverResult::Interrupted => write!(f, "INTERRUPTED"),
            SolverResult::Unknown => write!(f, "UNKNOWN"),
        }
    }
}
