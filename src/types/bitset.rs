//! # Fixed-Width Station Bit Sets
//!
//! A station set encoded as a bit vector over the full universe of known
//! stations: bit `i` is set iff station `i` is a member. All bit sets
//! managed by one cache share the same width, fixed at cache construction.

use std::fmt;

use super::{Station, TypeError};

const WORD_BITS: usize = u64::BITS as usize;

/// A fixed-width bit vector over the station universe.
///
/// Encoding a station set is total and deterministic: equal sets always
/// produce equal bit sets, which is what makes binary search over
/// permutation-ordered entry lists possible.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StationBitSet {
    width: usize,
    words: Box<[u64]>,
}

impl StationBitSet {
    /// Creates an empty bit set over a universe of `width` stations
    pub fn new(width: usize) -> Self {
        let n_words = (width + WORD_BITS - 1) / WORD_BITS;
        StationBitSet {
            width,
            words: vec![0; n_words].into_boxed_slice(),
        }
    }

    /// Encodes a station set over a universe of `width` stations.
    ///
    /// # Examples
    ///
    /// ```
    /// use satcache::types::{Station, StationBitSet};
    ///
    /// let bitset =
    ///     StationBitSet::from_stations([Station::new(1), Station::new(4)], 8).unwrap();
    ///
    /// assert!(bitset.contains(Station::new(4)));
    /// assert!(!bitset.contains(Station::new(2)));
    /// assert_eq!(bitset.cardinality(), 2);
    /// ```
    pub fn from_stations<I>(stations: I, width: usize) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = Station>,
    {
        let mut bitset = Self::new(width);
        for station in stations {
            bitset.insert(station)?;
        }
        Ok(bitset)
    }

    /// The width of the universe this bit set ranges over
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Marks a station as a member
    pub fn insert(&mut self, station: Station) -> Result<(), TypeError> {
        let idx = station.idx();
        if idx >= self.width {
            return Err(TypeError::StationOutOfRange(station, self.width));
        }
        self.words[idx / WORD_BITS] |= 1 << (idx % WORD_BITS);
        Ok(())
    }

    /// Checks whether a station is a member. Stations outside the universe
    /// are never members.
    #[inline]
    pub fn contains(&self, station: Station) -> bool {
        self.bit(station.idx())
    }

    /// Gets the raw bit at a station index. Out-of-range indices read as
    /// unset.
    #[inline]
    pub fn bit(&self, idx: usize) -> bool {
        if idx >= self.width {
            return false;
        }
        self.words[idx / WORD_BITS] & (1 << (idx % WORD_BITS)) != 0
    }

    /// Gets the number of member stations
    pub fn cardinality(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Checks if no station is a member
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Checks whether every member of `self` is also a member of `other`
    pub fn is_subset_of(&self, other: &StationBitSet) -> bool {
        debug_assert_eq!(self.width, other.width);
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(&a, &b)| a & !b == 0)
    }

    /// Checks whether every member of `other` is also a member of `self`
    #[inline]
    pub fn is_superset_of(&self, other: &StationBitSet) -> bool {
        other.is_subset_of(self)
    }

    /// Iterates over the member stations in ascending identifier order
    pub fn ones(&self) -> impl Iterator<Item = Station> + '_ {
        (0..self.width)
            .filter(|&idx| self.bit(idx))
            .map(|idx| Station::new(idx as u32))
    }

    /// Gets the number of members with an identifier strictly below the
    /// given station's. This is the position of the station's channel in the
    /// packed per-entry channel encoding.
    pub fn rank(&self, station: Station) -> usize {
        let idx = station.idx().min(self.width);
        let full_words = idx / WORD_BITS;
        let mut rank: usize = self.words[..full_words]
            .iter()
            .map(|w| w.count_ones() as usize)
            .sum();
        if full_words < self.words.len() {
            let mask = (1u64 << (idx % WORD_BITS)) - 1;
            rank += (self.words[full_words] & mask).count_ones() as usize;
        }
        rank
    }
}

impl fmt::Debug for StationBitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ones()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::StationBitSet;
    use crate::types::{Station, TypeError};

    fn bitset(stations: &[u32], width: usize) -> StationBitSet {
        StationBitSet::from_stations(stations.iter().map(|&s| Station::new(s)), width).unwrap()
    }

    #[test]
    fn membership_and_cardinality() {
        let bs = bitset(&[0, 63, 64, 100], 128);
        assert!(bs.contains(Station::new(0)));
        assert!(bs.contains(Station::new(63)));
        assert!(bs.contains(Station::new(64)));
        assert!(!bs.contains(Station::new(65)));
        assert!(!bs.contains(Station::new(127)));
        assert_eq!(bs.cardinality(), 4);
        assert!(!bs.is_empty());
        assert!(StationBitSet::new(128).is_empty());
    }

    #[test]
    fn out_of_range_station() {
        let res = StationBitSet::from_stations([Station::new(8)], 8);
        assert_eq!(res, Err(TypeError::StationOutOfRange(Station::new(8), 8)));
    }

    #[test]
    fn subset_superset() {
        let small = bitset(&[1, 70], 128);
        let large = bitset(&[1, 3, 70], 128);
        assert!(small.is_subset_of(&large));
        assert!(large.is_superset_of(&small));
        assert!(!large.is_subset_of(&small));
        assert!(small.is_subset_of(&small));
        assert!(StationBitSet::new(128).is_subset_of(&small));
    }

    #[test]
    fn ones_ascending() {
        let bs = bitset(&[100, 2, 64, 7], 128);
        let ones: Vec<_> = bs.ones().map(|s| s.idx32()).collect();
        assert_eq!(ones, vec![2, 7, 64, 100]);
    }

    #[test]
    fn rank_counts_strictly_below() {
        let bs = bitset(&[2, 7, 64, 100], 128);
        assert_eq!(bs.rank(Station::new(0)), 0);
        assert_eq!(bs.rank(Station::new(2)), 0);
        assert_eq!(bs.rank(Station::new(3)), 1);
        assert_eq!(bs.rank(Station::new(64)), 2);
        assert_eq!(bs.rank(Station::new(100)), 3);
        assert_eq!(bs.rank(Station::new(127)), 4);
    }
}
