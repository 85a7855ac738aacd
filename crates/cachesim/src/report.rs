//! End-of-run statistics and dumps, as text or JSON

use std::fmt;

use anyhow::{Context, Result};
use serde::Serialize;
use wordcache::{Cache, RunSummary};

/// One cache line in the dump
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LineReport {
    pub set: u32,
    pub slot: usize,
    pub valid: bool,
    pub dirty: bool,
    pub tag: u32,
    pub data: u32,
}

/// One written backing-store word in the dump
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WordReport {
    pub addr: u32,
    pub data: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub name: String,
    pub size_bytes: u32,
    pub associativity: u32,
    pub sets: u32,
    pub write_policy: String,
    pub replacement_policy: String,
    pub reads: u64,
    pub writes: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub writebacks: u64,
    pub hit_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<LineReport>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryReport {
    pub name: String,
    pub depth_words: u32,
    pub reads: u64,
    pub writes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<WordReport>>,
}

/// Everything observable after a run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub operations: usize,
    pub cache: CacheReport,
    pub memory: MemoryReport,
}

impl Report {
    /// Snapshot the cache, its backing store and the run summary
    ///
    /// With `dump` false the line table and memory contents are left out.
    pub fn collect(cache: &Cache, summary: &RunSummary, dump: bool) -> Self {
        let stats = cache.stats();
        let lines = dump.then(|| {
            cache
                .lines()
                .map(|(set, slot, line)| LineReport {
                    set,
                    slot,
                    valid: line.valid,
                    dirty: line.dirty,
                    tag: line.tag,
                    data: line.data,
                })
                .collect()
        });

        let mem = cache.backing().read();
        let contents = dump.then(|| {
            mem.contents()
                .into_iter()
                .map(|(addr, data)| WordReport { addr, data })
                .collect()
        });

        Self {
            operations: summary.operations,
            cache: CacheReport {
                name: cache.name().to_string(),
                size_bytes: cache.size_bytes(),
                associativity: cache.associativity(),
                sets: cache.sets(),
                write_policy: cache.write_policy().to_string(),
                replacement_policy: cache.policy_name().to_string(),
                reads: stats.reads(),
                writes: stats.writes(),
                hits: stats.hits(),
                misses: stats.misses(),
                evictions: stats.evictions(),
                writebacks: stats.writebacks(),
                hit_ratio: stats.hit_ratio(),
                lines,
            },
            memory: MemoryReport {
                name: mem.name().to_string(),
                depth_words: mem.depth(),
                reads: mem.reads(),
                writes: mem.writes(),
                contents,
            },
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = &self.cache;
        let mem = &self.memory;
        let rule = "=".repeat(55);

        writeln!(f, "Cache {} total reads : {}", cache.name, cache.reads)?;
        writeln!(f, "Cache {} total writes : {}", cache.name, cache.writes)?;
        writeln!(f, "Cache {} hits : {}", cache.name, cache.hits)?;
        writeln!(f, "Cache {} misses : {}", cache.name, cache.misses)?;
        writeln!(f, "Cache {} evictions : {}", cache.name, cache.evictions)?;
        writeln!(f, "Cache {} write-backs : {}", cache.name, cache.writebacks)?;
        writeln!(f, "Cache {} hit ratio : {:.2}", cache.name, cache.hit_ratio)?;
        writeln!(f, "Memory {} total reads : {}", mem.name, mem.reads)?;
        writeln!(f, "Memory {} total writes : {}", mem.name, mem.writes)?;

        if let Some(lines) = &cache.lines {
            writeln!(f, "{}", rule)?;
            writeln!(f, "Cache name : {}", cache.name)?;
            writeln!(f, "Cache size : {}", cache.size_bytes)?;
            writeln!(f, "Cache write policy : {}", cache.write_policy)?;
            writeln!(f, "Cache replacement policy : {}", cache.replacement_policy)?;
            writeln!(f, "Cache associativity : {}", cache.associativity)?;
            writeln!(f, "Cache memory interface : {}", mem.name)?;
            writeln!(f, "{}", rule)?;
            writeln!(f, "Cache dump format - Cache[set index, set entry index]")?;
            for line in lines {
                writeln!(
                    f,
                    "Cache[{},{}] = valid={} dirty={} tag={:#x} data={:#x}",
                    line.set, line.slot, line.valid as u8, line.dirty as u8, line.tag, line.data
                )?;
            }
        }

        if let Some(contents) = &mem.contents {
            let banner = "=".repeat(18 + mem.name.len());
            writeln!(f, "{}", banner)?;
            writeln!(f, "Memory {} contents.", mem.name)?;
            writeln!(f, "{}", banner)?;
            for word in contents {
                writeln!(f, "addr[{:#x}] : {:#x}", word.addr, word.data)?;
            }
        }

        Ok(())
    }
}
