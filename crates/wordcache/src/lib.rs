//! # wordcache
//!
//! Behavioral model of a set-associative cache in front of a flat,
//! word-addressed backing store.
//!
//! ## Architecture
//! - **decode**: splits a 32-bit word address into tag and set index
//! - **Cache**: line table (valid, dirty, tag, word), hit detection, eviction,
//!   write-back or write-through synchronization with the backing store
//! - **ReplacementPolicy**: pluggable victim selection; `Lru` uses age counters
//! - **Simulation**: replays `R`/`W` traces in order
//!
//! No timing is modelled: the interesting output is hits, misses and
//! backing-store traffic.

#![warn(missing_docs)]

mod cache;
mod config;
mod decode;
mod driver;
mod policy;
mod stats;

pub use cache::{Cache, LineView};
pub use config::{
    CacheConfig, WritePolicy, MAX_ASSOCIATIVITY, MAX_CACHE_SIZE, MIN_CACHE_SIZE, WORD_BYTES,
};
pub use decode::{decode, encode, ADDRESS_BITS};
pub use driver::{RunSummary, Simulation};
pub use policy::{Lru, PolicyKind, ReplacementPolicy};
pub use stats::CacheStats;
