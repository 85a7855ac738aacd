//! WordCache: set-associative, word-granular cache over a BackingStore

use std::sync::Arc;
use parking_lot::RwLock;
use tracing::{debug, trace};
use wordmem::{BackingStore, Error, Result};

use crate::config::{CacheConfig, WritePolicy};
use crate::decode::{decode, encode};
use crate::policy::{PolicyKind, ReplacementPolicy};
use crate::stats::CacheStats;

/// One word-sized slot of a set
#[derive(Debug, Clone, Copy, Default)]
struct Line {
    valid: bool,
    dirty: bool,
    tag: u32,
    data: u32,
}

/// Read-only snapshot of a cache line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineView {
    /// Line holds live data
    pub valid: bool,
    /// Line differs from the backing store (write-back only)
    pub dirty: bool,
    /// Tag of the resident word
    pub tag: u32,
    /// Cached word
    pub data: u32,
}

impl From<Line> for LineView {
    fn from(line: Line) -> Self {
        Self {
            valid: line.valid,
            dirty: line.dirty,
            tag: line.tag,
            data: line.data,
        }
    }
}

/// Where a line install came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fill {
    /// A `write` request
    Write,
    /// Data fetched from the backing store on a read miss; never dirty
    ReadMiss,
}

/// Set-associative cache in front of a shared backing store
pub struct Cache {
    /// Immutable configuration for the run
    config: CacheConfig,

    /// Address bits selecting the set
    set_bits: u32,

    /// Address bits forming the tag
    tag_bits: u32,

    /// Lines per set
    ways: usize,

    /// Line table, `sets * ways` lines; set `s` occupies `s*ways..(s+1)*ways`
    lines: Vec<Line>,

    /// Victim selection and recency tracking
    policy: Box<dyn ReplacementPolicy>,

    /// Backing memory, shared with the caller
    backing: Arc<RwLock<BackingStore>>,

    /// Access counters
    stats: CacheStats,
}

impl Cache {
    /// Create a cache using the replacement policy named in `config`
    ///
    /// # Arguments
    /// * `config` - Cache geometry and policies
    /// * `backing` - Backing store handle; the caller keeps its own clone
    ///
    /// # Returns
    /// * `Result<Cache>` - `Error::Config` if the geometry is invalid
    pub fn new(config: CacheConfig, backing: Arc<RwLock<BackingStore>>) -> Result<Self> {
        config.validate()?;
        let policy = config
            .policy
            .build(config.sets() as usize, config.associativity as usize);
        Self::with_policy(config, backing, policy)
    }

    /// Create a cache with a caller-supplied replacement policy
    ///
    /// # Returns
    /// * `Result<Cache>` - `Error::Config` if the geometry is invalid or the
    ///   policy is not sized for `config.sets()` sets of `config.associativity` lines
    pub fn with_policy(
        config: CacheConfig,
        backing: Arc<RwLock<BackingStore>>,
        policy: Box<dyn ReplacementPolicy>,
    ) -> Result<Self> {
        config.validate()?;

        let expected = (config.sets() as usize, config.associativity as usize);
        if policy.geometry() != expected {
            return Err(Error::config(format!(
                "{} policy is sized for {:?} (sets, ways), cache needs {:?}",
                policy.name(),
                policy.geometry(),
                expected
            )));
        }

        debug!(
            "Cache {}: {} bytes, {}-way, {} sets, {} tag bits, {} set bits, {}, {}",
            config.name,
            config.size_bytes,
            config.associativity,
            config.sets(),
            config.tag_bits(),
            config.set_bits(),
            config.write_policy,
            policy.name()
        );

        Ok(Self {
            set_bits: config.set_bits(),
            tag_bits: config.tag_bits(),
            ways: config.associativity as usize,
            lines: vec![Line::default(); config.entries() as usize],
            config,
            policy,
            backing,
            stats: CacheStats::new(),
        })
    }

    /// Read the word at `address`
    ///
    /// A hit is served from the line table. A miss fetches the word from the
    /// backing store and installs it through the write path as a clean line,
    /// so it counts as a cache write and, under write-through, stores the
    /// word back to the backing store.
    ///
    /// # Returns
    /// * `Result<u32>` - The word, or `Error::OutOfRange` from the backing store
    pub fn read(&mut self, address: u32) -> Result<u32> {
        // Reject before touching any line or counter
        self.backing.read().check(address)?;
        self.stats.record_read();

        let (tag, set) = decode(address, self.tag_bits, self.set_bits);

        if let Some(idx) = self.find(set, tag) {
            self.stats.record_hit();
            self.policy.on_access(idx);
            trace!("Cache {}: read hit addr={:#x} set={}", self.config.name, address, set);
            return Ok(self.lines[idx].data);
        }

        self.stats.record_miss();
        let data = self.backing.write().read(address)?;
        trace!("Cache {}: read miss addr={:#x} set={}", self.config.name, address, set);

        self.install(address, data, Fill::ReadMiss)?;
        Ok(data)
    }

    /// Write `data` to the word at `address`
    ///
    /// Write-back marks the line dirty; write-through also stores `data` in
    /// the backing store before updating the line.
    pub fn write(&mut self, address: u32, data: u32) -> Result<()> {
        self.backing.read().check(address)?;
        self.install(address, data, Fill::Write)
    }

    /// Write every dirty line back to the backing store
    ///
    /// Lines stay valid and become clean.
    ///
    /// # Returns
    /// * `Result<usize>` - Number of lines written back
    pub fn flush(&mut self) -> Result<usize> {
        let mut backing = self.backing.write();
        let mut flushed = 0;

        for idx in 0..self.lines.len() {
            let line = self.lines[idx];
            if !(line.valid && line.dirty) {
                continue;
            }

            let set = (idx / self.ways) as u32;
            backing.write(encode(line.tag, set, self.set_bits), line.data)?;
            self.lines[idx].dirty = false;
            self.stats.record_writeback();
            flushed += 1;
        }

        debug!("Cache {}: flushed {} dirty lines", self.config.name, flushed);
        Ok(flushed)
    }

    /// Check whether `address` is resident, without side effects
    pub fn contains(&self, address: u32) -> bool {
        let (tag, set) = decode(address, self.tag_bits, self.set_bits);
        self.find(set, tag).is_some()
    }

    /// Snapshot of the line at `(set_index, slot)`
    pub fn line(&self, set_index: u32, slot: usize) -> Option<LineView> {
        if set_index >= self.sets() || slot >= self.ways {
            return None;
        }
        Some(self.lines[set_index as usize * self.ways + slot].into())
    }

    /// All lines in `(set_index, slot)` order
    pub fn lines(&self) -> impl Iterator<Item = (u32, usize, LineView)> + '_ {
        let ways = self.ways;
        self.lines
            .iter()
            .enumerate()
            .map(move |(idx, &line)| ((idx / ways) as u32, idx % ways, LineView::from(line)))
    }

    /// Number of valid lines
    pub fn occupancy(&self) -> usize {
        self.lines.iter().filter(|line| line.valid).count()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Reset statistics (line table is unchanged)
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Backing store handle
    pub fn backing(&self) -> &Arc<RwLock<BackingStore>> {
        &self.backing
    }

    /// Cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Cache name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Capacity in bytes
    pub fn size_bytes(&self) -> u32 {
        self.config.size_bytes
    }

    /// Lines per set
    pub fn associativity(&self) -> u32 {
        self.config.associativity
    }

    /// Number of sets
    pub fn sets(&self) -> u32 {
        self.config.sets()
    }

    /// Address bits selecting the set
    pub fn set_bits(&self) -> u32 {
        self.set_bits
    }

    /// Address bits forming the tag
    pub fn tag_bits(&self) -> u32 {
        self.tag_bits
    }

    /// Write policy
    pub fn write_policy(&self) -> WritePolicy {
        self.config.write_policy
    }

    /// Configured replacement policy variant
    pub fn policy_kind(&self) -> PolicyKind {
        self.config.policy
    }

    /// Replacement policy name
    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    fn set_base(&self, set: u32) -> usize {
        set as usize * self.ways
    }

    fn find(&self, set: u32, tag: u32) -> Option<usize> {
        let base = self.set_base(set);
        self.lines[base..base + self.ways]
            .iter()
            .position(|line| line.valid && line.tag == tag)
            .map(|slot| base + slot)
    }

    /// Choose the line for `(tag, set)`: matching line, else first invalid
    /// line, else the policy's victim (flushed first if dirty)
    fn target(&mut self, set: u32, tag: u32) -> Result<usize> {
        if let Some(idx) = self.find(set, tag) {
            return Ok(idx);
        }

        let base = self.set_base(set);
        if let Some(slot) = self.lines[base..base + self.ways]
            .iter()
            .position(|line| !line.valid)
        {
            return Ok(base + slot);
        }

        let slot = self.policy.select_victim(set);
        self.evict(set, slot)?;
        Ok(base + slot)
    }

    fn evict(&mut self, set: u32, slot: usize) -> Result<()> {
        let idx = self.set_base(set) + slot;
        let victim = self.lines[idx];
        self.stats.record_eviction();

        debug!(
            "Cache {}: evicting set {} slot {} (tag {:#x}, dirty {})",
            self.config.name, set, slot, victim.tag, victim.dirty
        );

        if self.config.write_policy == WritePolicy::WriteBack && victim.dirty {
            let addr = encode(victim.tag, set, self.set_bits);
            self.backing.write().write(addr, victim.data)?;
            self.lines[idx].dirty = false;
            self.stats.record_writeback();
        }

        Ok(())
    }

    /// Write path shared by `write` and read-miss fills; only the dirty bit
    /// depends on `fill`
    fn install(&mut self, address: u32, data: u32, fill: Fill) -> Result<()> {
        let (tag, set) = decode(address, self.tag_bits, self.set_bits);
        self.stats.record_write();

        let idx = self.target(set, tag)?;

        if self.config.write_policy == WritePolicy::WriteThrough {
            self.backing.write().write(address, data)?;
        }

        let dirty = fill == Fill::Write && self.config.write_policy == WritePolicy::WriteBack;

        self.lines[idx] = Line {
            valid: true,
            dirty,
            tag,
            data,
        };
        self.policy.on_access(idx);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Lru;

    /// 64-byte cache: 16 entries, 8 sets of 2 ways; backing store of 128 words
    fn setup(write_policy: WritePolicy) -> (Cache, Arc<RwLock<BackingStore>>) {
        let mem = Arc::new(RwLock::new(BackingStore::new("M0", 128)));
        let config = CacheConfig::new("C0", 64, 2, write_policy);
        let cache = Cache::new(config, Arc::clone(&mem)).unwrap();
        (cache, mem)
    }

    #[test]
    fn test_geometry() {
        let (cache, _mem) = setup(WritePolicy::WriteBack);

        assert_eq!(cache.sets(), 8);
        assert_eq!(cache.set_bits(), 3);
        assert_eq!(cache.tag_bits(), 29);
        assert_eq!(cache.lines().count(), 16);
        assert_eq!(cache.occupancy(), 0);
        assert_eq!(cache.policy_name(), "Least Recently Used (LRU)");
    }

    #[test]
    fn test_invalid_config() {
        let mem = Arc::new(RwLock::new(BackingStore::new("M0", 128)));

        let bad_size = CacheConfig::new("C0", 100, 2, WritePolicy::WriteBack);
        let result = Cache::new(bad_size, Arc::clone(&mem));
        assert!(matches!(result, Err(Error::Config(_))));

        let result = Cache::new(CacheConfig::new("C0", 64, 3, WritePolicy::WriteBack), mem);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_read_miss_then_hit() {
        let (mut cache, mem) = setup(WritePolicy::WriteBack);
        mem.write().write(5, 42).unwrap();

        assert_eq!(cache.read(5).unwrap(), 42);
        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().hits(), 0);

        assert_eq!(cache.read(5).unwrap(), 42);
        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().reads(), 2);

        // Only the miss reached memory
        assert_eq!(mem.read().reads(), 1);
    }

    #[test]
    fn test_read_miss_installs_clean_line() {
        let (mut cache, mem) = setup(WritePolicy::WriteBack);
        mem.write().write(11, 7).unwrap();

        cache.read(11).unwrap();

        // 11 = tag 1, set 3
        let line = cache.line(3, 0).unwrap();
        assert_eq!(
            line,
            LineView {
                valid: true,
                dirty: false,
                tag: 1,
                data: 7
            }
        );
        assert!(!cache.line(3, 1).unwrap().valid);
    }

    #[test]
    fn test_read_miss_counts_as_write_back_write() {
        let (mut cache, mem) = setup(WritePolicy::WriteBack);

        cache.read(5).unwrap();

        assert_eq!(cache.stats().reads(), 1);
        assert_eq!(cache.stats().writes(), 1);
        assert_eq!(mem.read().reads(), 1);
        assert_eq!(mem.read().writes(), 0);
        assert!(!cache.line(5, 0).unwrap().dirty);
    }

    #[test]
    fn test_read_miss_writes_through() {
        let (mut cache, mem) = setup(WritePolicy::WriteThrough);
        mem.write().write(5, 33).unwrap();

        assert_eq!(cache.read(5).unwrap(), 33);

        assert_eq!(cache.stats().writes(), 1);
        assert_eq!(mem.read().reads(), 1);
        // One store from the setup, one from the read-miss fill
        assert_eq!(mem.read().writes(), 2);
        assert_eq!(mem.read().peek(5), Some(33));

        // A hit does not go through the write path
        cache.read(5).unwrap();
        assert_eq!(cache.stats().writes(), 1);
        assert_eq!(mem.read().writes(), 2);
    }

    #[test]
    fn test_read_miss_evicts_dirty_line() {
        let (mut cache, mem) = setup(WritePolicy::WriteBack);
        mem.write().write(17, 55).unwrap();

        // 1, 9 and 17 all map to set 1; 1 is the oldest when 17 misses
        cache.write(1, 100).unwrap();
        cache.write(9, 200).unwrap();
        assert_eq!(cache.read(17).unwrap(), 55);

        assert_eq!(mem.read().peek(1), Some(100));
        assert_eq!(cache.stats().evictions(), 1);
        assert_eq!(cache.stats().writebacks(), 1);

        let line = cache.line(1, 0).unwrap();
        assert_eq!(
            line,
            LineView {
                valid: true,
                dirty: false,
                tag: 2,
                data: 55
            }
        );
        assert!(cache.line(1, 1).unwrap().dirty);
    }

    #[test]
    fn test_with_policy_rejects_mismatched_geometry() {
        let mem = Arc::new(RwLock::new(BackingStore::new("M0", 128)));
        let config = CacheConfig::new("C0", 64, 2, WritePolicy::WriteBack);

        // 8 sets of 2 lines, same line count but wrong shape
        let result = Cache::with_policy(config.clone(), Arc::clone(&mem), Box::new(Lru::new(4, 4)));
        assert!(matches!(result, Err(Error::Config(_))));

        let result = Cache::with_policy(config, mem, Box::new(Lru::new(8, 2)));
        assert!(result.is_ok());
    }

    #[test]
    fn test_write_back_defers() {
        let (mut cache, mem) = setup(WritePolicy::WriteBack);

        cache.write(2, 99).unwrap();
        assert_eq!(cache.read(2).unwrap(), 99);

        let line = cache.line(2, 0).unwrap();
        assert!(line.valid && line.dirty);
        assert_eq!(mem.read().writes(), 0);
        assert_eq!(mem.read().peek(2), None);
    }

    #[test]
    fn test_write_hit_updates_in_place() {
        let (mut cache, _mem) = setup(WritePolicy::WriteBack);

        cache.write(4, 1).unwrap();
        cache.write(4, 2).unwrap();

        assert_eq!(cache.line(4, 0).unwrap().data, 2);
        assert!(!cache.line(4, 1).unwrap().valid);
        assert_eq!(cache.occupancy(), 1);
        assert_eq!(cache.stats().writes(), 2);
    }

    #[test]
    fn test_write_through_immediate() {
        let (mut cache, mem) = setup(WritePolicy::WriteThrough);

        cache.write(7, 9).unwrap();
        assert_eq!(mem.read().peek(7), Some(9));

        cache.write(7, 10).unwrap();
        assert_eq!(mem.read().peek(7), Some(10));
        assert_eq!(mem.read().writes(), 2);

        let line = cache.line(7, 0).unwrap();
        assert!(line.valid);
        assert!(!line.dirty);
    }

    #[test]
    fn test_dirty_eviction_writes_back() {
        let (mut cache, mem) = setup(WritePolicy::WriteBack);

        // 1, 9 and 17 all map to set 1
        cache.write(1, 100).unwrap();
        cache.write(9, 200).unwrap();
        cache.write(17, 300).unwrap();

        assert_eq!(mem.read().peek(1), Some(100));
        assert_eq!(mem.read().writes(), 1);
        assert!(!cache.contains(1));
        assert!(cache.contains(9));
        assert!(cache.contains(17));
        assert_eq!(cache.stats().evictions(), 1);
        assert_eq!(cache.stats().writebacks(), 1);
    }

    #[test]
    fn test_clean_eviction_skips_backing_store() {
        let (mut cache, mem) = setup(WritePolicy::WriteBack);

        cache.read(1).unwrap();
        cache.read(9).unwrap();
        cache.read(17).unwrap();

        assert_eq!(mem.read().writes(), 0);
        assert_eq!(cache.stats().evictions(), 1);
        assert_eq!(cache.stats().writebacks(), 0);
    }

    #[test]
    fn test_write_through_eviction_never_flushes() {
        let (mut cache, mem) = setup(WritePolicy::WriteThrough);

        cache.write(1, 100).unwrap();
        cache.write(9, 200).unwrap();
        cache.write(17, 300).unwrap();

        // One write per request, nothing extra on eviction
        assert_eq!(mem.read().writes(), 3);
        assert_eq!(cache.stats().writebacks(), 0);
    }

    #[test]
    fn test_out_of_range() {
        let (mut cache, mem) = setup(WritePolicy::WriteBack);

        assert!(matches!(cache.read(128), Err(Error::OutOfRange { addr: 128, .. })));
        assert!(matches!(cache.write(500, 1), Err(Error::OutOfRange { addr: 500, .. })));

        assert_eq!(cache.occupancy(), 0);
        assert_eq!(cache.stats(), &CacheStats::default());
        assert_eq!(mem.read().reads(), 0);
    }

    #[test]
    fn test_flush() {
        let (mut cache, mem) = setup(WritePolicy::WriteBack);

        cache.write(0, 10).unwrap();
        cache.write(3, 30).unwrap();
        cache.read(5).unwrap();

        assert_eq!(cache.flush().unwrap(), 2);
        assert_eq!(mem.read().contents(), vec![(0, 10), (3, 30)]);
        assert!(cache.lines().all(|(_, _, line)| !line.dirty));
        assert_eq!(cache.occupancy(), 3);

        // Nothing left to flush
        assert_eq!(cache.flush().unwrap(), 0);
        assert_eq!(cache.stats().writebacks(), 2);
    }

    #[test]
    fn test_line_out_of_bounds() {
        let (cache, _mem) = setup(WritePolicy::WriteBack);

        assert!(cache.line(8, 0).is_none());
        assert!(cache.line(0, 2).is_none());
        assert!(cache.line(7, 1).is_some());
    }
}
