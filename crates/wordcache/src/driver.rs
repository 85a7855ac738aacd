//! Trace replay against a single cache

use tracing::debug;
use wordmem::{parse_trace, Access, Result};

use crate::cache::Cache;

/// Counts for one completed replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Operations applied
    pub operations: usize,
    /// Read operations applied
    pub reads: usize,
    /// Write operations applied
    pub writes: usize,
}

/// Replays ordered read/write operations through a cache
pub struct Simulation {
    cache: Cache,
}

impl Simulation {
    /// Wrap a cache for replay
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// Apply a single operation
    ///
    /// # Returns
    /// * `Result<u32>` - Word read, or the word written
    pub fn apply(&mut self, access: Access) -> Result<u32> {
        match access {
            Access::Read { addr } => self.cache.read(addr),
            Access::Write { addr, data } => self.cache.write(addr, data).map(|()| data),
        }
    }

    /// Apply `ops` strictly in order, stopping at the first error
    pub fn run(&mut self, ops: &[Access]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for &access in ops {
            self.apply(access)?;
            summary.operations += 1;
            if access.is_write() {
                summary.writes += 1;
            } else {
                summary.reads += 1;
            }
        }

        debug!(
            "Cache {}: replayed {} operations ({} reads, {} writes)",
            self.cache.name(),
            summary.operations,
            summary.reads,
            summary.writes
        );
        Ok(summary)
    }

    /// Parse a textual trace and replay it
    ///
    /// The whole trace is parsed first, so a malformed line aborts the run
    /// before any operation reaches the cache.
    pub fn replay_str(&mut self, input: &str) -> Result<RunSummary> {
        let ops = parse_trace(input)?;
        self.run(&ops)
    }

    /// The simulated cache
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// The simulated cache, mutably
    pub fn cache_mut(&mut self) -> &mut Cache {
        &mut self.cache
    }

    /// Take the cache back
    pub fn into_cache(self) -> Cache {
        self.cache
    }
}
