//! A transposition table keyed by position fingerprint.
//!
//! Single-threaded: the search owns this table exclusively for the
//! duration of a `choose_move` call (and may reuse it across calls),
//! so it is a plain `HashMap` behind no synchronisation at all.

use std::collections::HashMap;

use crate::{movegen::Move, position::Fingerprint};

/// The rough size, in bytes, of one stored entry — used only to turn
/// a caller-supplied mebibyte budget into an initial `HashMap`
/// capacity hint.
const APPROX_ENTRY_BYTES: usize = 48;

/// Which side of the true value a stored score bounds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Bound {
    /// The true value is at least `value` (search failed high).
    Lower,
    /// `value` is the true value.
    Exact,
    /// The true value is at most `value` (search failed low).
    Upper,
}

/// A cached search result for one position.
#[derive(Clone, Copy, Debug)]
pub struct TranspositionEntry {
    /// The depth this entry's score was searched to.
    pub depth: u8,
    /// The score, from the side-to-move's perspective at that node.
    pub value: i32,
    /// Whether `value` is exact or a cutoff bound.
    pub flag: Bound,
    /// The best move found at this node, if the search produced one.
    pub best_move: Option<Move>,
}

/// A transposition table mapping position fingerprints to cached
/// search results.
pub struct TranspositionTable {
    /// The backing map.
    entries: HashMap<Fingerprint, TranspositionEntry>,
}

impl TranspositionTable {
    /// Creates an empty table sized to hold roughly `mib` mebibytes
    /// worth of entries before the backing map needs to reallocate.
    #[must_use]
    pub fn with_capacity(mib: usize) -> Self {
        let capacity = (mib * 1024 * 1024) / APPROX_ENTRY_BYTES;
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Looks up the entry for `fingerprint`, if any.
    #[must_use]
    pub fn probe(&self, fingerprint: Fingerprint) -> Option<&TranspositionEntry> {
        self.entries.get(&fingerprint)
    }

    /// Stores `entry` for `fingerprint`, under a "deeper wins, equal
    /// depth overwrites" replacement policy: a shallower existing
    /// entry is never allowed to evict a deeper one.
    pub fn store(&mut self, fingerprint: Fingerprint, entry: TranspositionEntry) {
        if let Some(existing) = self.entries.get(&fingerprint) {
            if existing.depth > entry.depth {
                return;
            }
        }
        self.entries.insert(fingerprint, entry);
    }

    /// Removes every entry, without shrinking the backing allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of entries currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn sample_entry(depth: u8, value: i32) -> TranspositionEntry {
        TranspositionEntry {
            depth,
            value,
            flag: Bound::Exact,
            best_move: None,
        }
    }

    #[test]
    fn shallower_store_does_not_evict_a_deeper_entry() {
        let mut table = TranspositionTable::with_capacity(1);
        let key = Position::new_position().fingerprint();
        table.store(key, sample_entry(5, 100));
        table.store(key, sample_entry(2, -50));
        assert_eq!(table.probe(key).expect("entry present").value, 100);
    }

    #[test]
    fn equal_depth_store_overwrites() {
        let mut table = TranspositionTable::with_capacity(1);
        let key = Position::new_position().fingerprint();
        table.store(key, sample_entry(4, 10));
        table.store(key, sample_entry(4, 20));
        assert_eq!(table.probe(key).expect("entry present").value, 20);
    }
}
