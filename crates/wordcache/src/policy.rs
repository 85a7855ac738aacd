//! Replacement policies
//!
//! A policy keeps per-line metadata indexed by the line's global index
//! (`set_index * associativity + slot`) and answers which slot of a full
//! set should be evicted.

use std::fmt;
use std::str::FromStr;

use wordmem::{Error, Result};

/// Victim selection and recency tracking for a set-associative cache
pub trait ReplacementPolicy: Send {
    /// Human-readable policy name
    fn name(&self) -> &str;

    /// `(sets, ways)` the per-line metadata was sized for
    fn geometry(&self) -> (usize, usize);

    /// Pick the slot (0-based, within the set) to evict from `set_index`
    fn select_victim(&self, set_index: u32) -> usize;

    /// Record an access to the line at `global_index`
    fn on_access(&mut self, global_index: usize);
}

/// Age-counter LRU
///
/// Each line carries an age. Touching a line zeroes its age and ages every
/// other line in the same set by one; the oldest line is the victim.
pub struct Lru {
    sets: usize,
    ways: usize,
    ages: Vec<u64>,
}

impl Lru {
    /// Create LRU state for `sets` sets of `ways` lines, all ages 0
    ///
    /// A cache refuses a policy whose geometry does not match its own, so a
    /// zero-way instance is never driven.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            sets,
            ways,
            ages: vec![0; sets * ways],
        }
    }

    /// Current age of the line at `global_index`
    pub fn age(&self, global_index: usize) -> u64 {
        self.ages[global_index]
    }
}

impl ReplacementPolicy for Lru {
    fn name(&self) -> &str {
        "Least Recently Used (LRU)"
    }

    fn geometry(&self) -> (usize, usize) {
        (self.sets, self.ways)
    }

    fn select_victim(&self, set_index: u32) -> usize {
        let base = set_index as usize * self.ways;
        let set = &self.ages[base..base + self.ways];

        // Strict `>` keeps the lowest slot among equal maxima
        let mut victim = 0;
        for (slot, &age) in set.iter().enumerate().skip(1) {
            if age > set[victim] {
                victim = slot;
            }
        }
        victim
    }

    fn on_access(&mut self, global_index: usize) {
        let base = global_index - global_index % self.ways;
        for idx in base..base + self.ways {
            if idx == global_index {
                self.ages[idx] = 0;
            } else {
                self.ages[idx] = self.ages[idx].saturating_add(1);
            }
        }
    }
}

/// Selectable replacement policy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    /// Age-counter least recently used
    #[default]
    Lru,
}

impl PolicyKind {
    /// Build a fresh policy instance for the given geometry
    pub fn build(self, sets: usize, ways: usize) -> Box<dyn ReplacementPolicy> {
        match self {
            PolicyKind::Lru => Box::new(Lru::new(sets, ways)),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lru" => Ok(PolicyKind::Lru),
            other => Err(Error::config(format!(
                "unknown replacement policy '{}', expected \"lru\"",
                other
            ))),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Lru => write!(f, "lru"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_initial_victim_is_slot_zero() {
        let lru = Lru::new(2, 4);
        assert_eq!(lru.select_victim(0), 0);
        assert_eq!(lru.select_victim(1), 0);
    }

    #[test]
    fn test_lru_ages() {
        let mut lru = Lru::new(2, 4);

        lru.on_access(4); // set 1, slot 0
        lru.on_access(5); // set 1, slot 1

        assert_eq!(lru.age(4), 1);
        assert_eq!(lru.age(5), 0);
        assert_eq!(lru.age(6), 2);
        assert_eq!(lru.age(7), 2);

        // Set 0 untouched
        for idx in 0..4 {
            assert_eq!(lru.age(idx), 0);
        }
    }

    #[test]
    fn test_lru_victim_is_oldest() {
        let mut lru = Lru::new(1, 4);

        for idx in [0, 1, 2, 3] {
            lru.on_access(idx);
        }
        assert_eq!(lru.select_victim(0), 0);

        lru.on_access(0);
        assert_eq!(lru.select_victim(0), 1);

        lru.on_access(1);
        lru.on_access(2);
        assert_eq!(lru.select_victim(0), 3);
    }

    #[test]
    fn test_lru_tie_break_lowest_slot() {
        let mut lru = Lru::new(1, 4);

        // Slots 2 and 3 never touched: both have age 2
        lru.on_access(0);
        lru.on_access(1);
        assert_eq!(lru.age(2), lru.age(3));
        assert_eq!(lru.select_victim(0), 2);
    }

    #[test]
    fn test_lru_select_does_not_mutate() {
        let mut lru = Lru::new(1, 2);
        lru.on_access(1);

        let before = (lru.age(0), lru.age(1));
        lru.select_victim(0);
        lru.select_victim(0);
        assert_eq!((lru.age(0), lru.age(1)), before);
    }

    #[test]
    fn test_policy_kind_parse() {
        assert_eq!("lru".parse::<PolicyKind>().unwrap(), PolicyKind::Lru);
        assert_eq!("LRU".parse::<PolicyKind>().unwrap(), PolicyKind::Lru);
        assert!(matches!("fifo".parse::<PolicyKind>(), Err(Error::Config(_))));
        assert_eq!(PolicyKind::Lru.to_string(), "lru");
    }

    #[test]
    fn test_policy_kind_build() {
        let policy = PolicyKind::Lru.build(8, 2);
        assert_eq!(policy.name(), "Least Recently Used (LRU)");
        assert_eq!(policy.select_victim(7), 0);
        assert_eq!(policy.geometry(), (8, 2));
    }

    #[test]
    fn test_lru_zero_ways_constructs() {
        let lru = Lru::new(4, 0);
        assert_eq!(lru.geometry(), (4, 0));
    }
}
