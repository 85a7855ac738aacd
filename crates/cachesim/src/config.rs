//! Simulation configuration file
//!
//! ```json
//! {
//!   "name": "C0",
//!   "size_bytes": 64,
//!   "associativity": 2,
//!   "write_policy": "write-back",
//!   "replacement_policy": "lru",
//!   "backing_store": { "name": "M0", "depth_words": 128 }
//! }
//! ```

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use wordcache::{Cache, CacheConfig, PolicyKind, WritePolicy};
use wordmem::BackingStore;

/// Backing store section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackingStoreConfig {
    /// Memory name
    pub name: String,
    /// Depth in words (0 = unbounded)
    pub depth_words: u32,
}

/// Whole simulation setup: one cache over one backing store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimConfig {
    /// Cache name
    pub name: String,
    /// Cache size in bytes
    pub size_bytes: u32,
    /// Lines per set
    pub associativity: u32,
    /// `wb`/`write-back` or `wt`/`write-through`
    pub write_policy: String,
    /// Replacement policy name
    #[serde(default = "default_replacement_policy")]
    pub replacement_policy: String,
    /// Backing store
    pub backing_store: BackingStoreConfig,
}

fn default_replacement_policy() -> String {
    PolicyKind::default().to_string()
}

impl SimConfig {
    /// Load a configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: SimConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        info!("Loaded configuration for cache {} from {:?}", config.name, path);
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path.as_ref(), content).context("Failed to write config file")?;
        Ok(())
    }

    /// Validated cache configuration
    pub fn cache_config(&self) -> wordmem::Result<CacheConfig> {
        let write_policy: WritePolicy = self.write_policy.parse()?;
        let policy: PolicyKind = self.replacement_policy.parse()?;

        let config = CacheConfig {
            name: self.name.clone(),
            size_bytes: self.size_bytes,
            associativity: self.associativity,
            write_policy,
            policy,
        };
        config.validate()?;
        Ok(config)
    }

    /// Construct the backing store and the cache in front of it
    pub fn build(&self) -> wordmem::Result<(Cache, Arc<RwLock<BackingStore>>)> {
        let cache_config = self.cache_config()?;
        let mem = Arc::new(RwLock::new(BackingStore::new(
            self.backing_store.name.clone(),
            self.backing_store.depth_words,
        )));
        let cache = Cache::new(cache_config, Arc::clone(&mem))?;
        Ok((cache, mem))
    }
}
