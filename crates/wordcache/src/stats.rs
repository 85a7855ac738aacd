//! Cache statistics tracking

/// Access counters for one cache instance
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    reads: u64,
    writes: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    writebacks: u64,
}

impl CacheStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a read request
    pub fn record_read(&mut self) {
        self.reads += 1;
    }

    /// Record a write request
    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    /// Record a read hit
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Record a read miss
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Record a valid line being displaced by another tag
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Record a dirty line written back to the backing store
    pub fn record_writeback(&mut self) {
        self.writebacks += 1;
    }

    /// Get total reads
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Get total writes
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Get total hits
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Get total misses
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Get total evictions
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Get total dirty write-backs
    pub fn writebacks(&self) -> u64 {
        self.writebacks
    }

    /// Calculate read hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_basic() {
        let mut stats = CacheStats::new();

        stats.record_read();
        stats.record_read();
        stats.record_read();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();

        assert_eq!(stats.reads(), 3);
        assert_eq!(stats.hits(), 2);
        assert_eq!(stats.misses(), 1);
        assert_eq!(stats.hit_ratio(), 2.0 / 3.0);
    }

    #[test]
    fn test_stats_reset() {
        let mut stats = CacheStats::new();

        stats.record_write();
        stats.record_hit();
        stats.record_miss();
        stats.record_eviction();
        stats.record_writeback();
        stats.reset();

        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.hit_ratio(), 0.0);
    }
}
