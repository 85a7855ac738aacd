//! Random trace generation

use std::io::{self, Write};

use anyhow::{ensure, Result};
use rand::Rng;
use wordmem::Access;

/// Operations in a generated trace unless overridden
pub const DEFAULT_COUNT: usize = 32768;

/// Upper bound (exclusive) of generated addresses unless overridden
pub const DEFAULT_ADDR_RANGE: u32 = 16384;

/// Generate `count` random operations with addresses in `0..addr_range`
///
/// Reads and writes are equally likely; a write stores its own address.
pub fn generate<R: Rng>(rng: &mut R, count: usize, addr_range: u32) -> Result<Vec<Access>> {
    ensure!(addr_range > 0, "Address range must be greater than 0");

    let ops = (0..count)
        .map(|_| {
            let addr = rng.gen_range(0..addr_range);
            if rng.gen_bool(0.5) {
                Access::Write { addr, data: addr }
            } else {
                Access::Read { addr }
            }
        })
        .collect();
    Ok(ops)
}

/// Write operations one per line in trace format
pub fn write_trace<W: Write>(mut out: W, ops: &[Access]) -> io::Result<()> {
    for access in ops {
        writeln!(out, "{}", access)?;
    }
    out.flush()
}
