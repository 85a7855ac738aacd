//! Cache configuration and derived geometry

use std::fmt;
use std::str::FromStr;

use wordmem::{Error, Result};

use crate::decode::ADDRESS_BITS;
use crate::policy::PolicyKind;

/// Bytes per cache entry; every entry holds one word
pub const WORD_BYTES: u32 = 4;

/// Smallest supported cache (64 B)
pub const MIN_CACHE_SIZE: u32 = 64;

/// Largest supported cache (64 MiB)
pub const MAX_CACHE_SIZE: u32 = 64 * 1024 * 1024;

/// Highest supported associativity
pub const MAX_ASSOCIATIVITY: u32 = 16;

/// How writes reach the backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Writes stay in the cache until a dirty line is evicted or flushed
    WriteBack,
    /// Every write also lands in the backing store immediately
    WriteThrough,
}

impl FromStr for WritePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wb" | "write-back" | "writeback" => Ok(WritePolicy::WriteBack),
            "wt" | "write-through" | "writethrough" => Ok(WritePolicy::WriteThrough),
            other => Err(Error::config(format!(
                "unknown write policy '{}', expected write back (\"wb\") or write through (\"wt\")",
                other
            ))),
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WritePolicy::WriteBack => write!(f, "write-back"),
            WritePolicy::WriteThrough => write!(f, "write-through"),
        }
    }
}

/// Immutable configuration of one cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Cache name
    pub name: String,
    /// Capacity in bytes (power of two, 64 B to 64 MiB)
    pub size_bytes: u32,
    /// Lines per set (power of two, 1 to 16)
    pub associativity: u32,
    /// Write policy
    pub write_policy: WritePolicy,
    /// Replacement policy
    pub policy: PolicyKind,
}

impl CacheConfig {
    /// Create a config using the default (LRU) replacement policy
    pub fn new(
        name: impl Into<String>,
        size_bytes: u32,
        associativity: u32,
        write_policy: WritePolicy,
    ) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            associativity,
            write_policy,
            policy: PolicyKind::default(),
        }
    }

    /// Check sizing rules
    ///
    /// Size must be a power of two within 64 B..=64 MiB and associativity a
    /// power of two within 1..=16.
    pub fn validate(&self) -> Result<()> {
        if !self.size_bytes.is_power_of_two()
            || !(MIN_CACHE_SIZE..=MAX_CACHE_SIZE).contains(&self.size_bytes)
        {
            return Err(Error::config(format!(
                "cache size {} must be a power of 2 between {} bytes and {} bytes",
                self.size_bytes, MIN_CACHE_SIZE, MAX_CACHE_SIZE
            )));
        }

        if !self.associativity.is_power_of_two() || self.associativity > MAX_ASSOCIATIVITY {
            return Err(Error::config(format!(
                "associativity {} must be a power of 2 between 1 and {} (1 is direct-mapped)",
                self.associativity, MAX_ASSOCIATIVITY
            )));
        }

        Ok(())
    }

    /// Number of word entries
    pub fn entries(&self) -> u32 {
        self.size_bytes / WORD_BYTES
    }

    /// Number of sets
    pub fn sets(&self) -> u32 {
        self.entries() / self.associativity
    }

    /// Address bits selecting the set
    pub fn set_bits(&self) -> u32 {
        self.sets().trailing_zeros()
    }

    /// Address bits forming the tag
    pub fn tag_bits(&self) -> u32 {
        ADDRESS_BITS - self.set_bits()
    }
}
