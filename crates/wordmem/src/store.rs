//! Flat, word-addressed backing store
//!
//! Words live in a sparse map so that an unbounded (`depth == 0`) store
//! costs nothing until it is touched. Every access goes through the same
//! bounds check, which keeps the depth invariant structural.

use std::collections::HashMap;
use ahash::RandomState;

use crate::error::{Error, Result};

/// Value returned for words that were never written
pub const DEFAULT_FILL: u32 = 0;

/// Backing memory behind a cache
#[derive(Debug, Clone)]
pub struct BackingStore {
    /// Memory name, used in dumps and errors
    name: String,

    /// Depth in words; 0 means unbounded
    depth: u32,

    /// Value of never-written words
    fill: u32,

    /// Written words, keyed by word address
    data: HashMap<u32, u32, RandomState>,

    /// Counted reads
    reads: u64,

    /// Counted writes
    writes: u64,
}

impl BackingStore {
    /// Create a zero-filled store
    ///
    /// # Arguments
    /// * `name` - Memory name
    /// * `depth` - Number of words, 0 for no bound
    pub fn new(name: impl Into<String>, depth: u32) -> Self {
        Self::with_fill(name, depth, DEFAULT_FILL)
    }

    /// Create a store whose unwritten words read back as `fill`
    pub fn with_fill(name: impl Into<String>, depth: u32, fill: u32) -> Self {
        Self {
            name: name.into(),
            depth,
            fill,
            data: HashMap::with_hasher(RandomState::new()),
            reads: 0,
            writes: 0,
        }
    }

    /// Read the word at `addr`
    ///
    /// # Returns
    /// * `Result<u32>` - Stored word, or the fill value if never written
    pub fn read(&mut self, addr: u32) -> Result<u32> {
        self.check(addr)?;
        self.reads += 1;
        Ok(self.data.get(&addr).copied().unwrap_or(self.fill))
    }

    /// Write `data` to the word at `addr`
    pub fn write(&mut self, addr: u32, data: u32) -> Result<()> {
        self.check(addr)?;
        self.writes += 1;
        self.data.insert(addr, data);
        Ok(())
    }

    /// Check that `addr` is addressable without touching any counter
    pub fn check(&self, addr: u32) -> Result<()> {
        if self.depth > 0 && addr >= self.depth {
            return Err(Error::OutOfRange {
                memory: self.name.clone(),
                addr,
                depth: self.depth,
            });
        }
        Ok(())
    }

    /// Inspect a written word without counting a read
    pub fn peek(&self, addr: u32) -> Option<u32> {
        self.data.get(&addr).copied()
    }

    /// All written words, sorted by address
    pub fn contents(&self) -> Vec<(u32, u32)> {
        let mut words: Vec<_> = self.data.iter().map(|(&a, &d)| (a, d)).collect();
        words.sort_unstable_by_key(|&(addr, _)| addr);
        words
    }

    /// Memory name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Depth in words (0 = unbounded)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Fill value for unwritten words
    pub fn fill(&self) -> u32 {
        self.fill
    }

    /// Number of counted reads
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Number of counted writes
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Number of distinct words written so far
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if nothing has been written yet
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
