//! # wordmem
//!
//! Word-granular backing memory and access traces for the wordcache simulator.
//!
//! ## Contents
//! - **BackingStore**: flat word store with bounds-checked reads/writes and access counters
//! - **Access / parse_trace**: the `R <addr>` / `W <addr> <data>` trace format
//! - **Error**: the error taxonomy shared by the whole simulator

#![warn(missing_docs)]

mod error;
mod store;
mod trace;

pub use error::{Error, Result};
pub use store::{BackingStore, DEFAULT_FILL};
pub use trace::{parse_line, parse_number, parse_trace, Access};
