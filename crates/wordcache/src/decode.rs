//! Address decoding
//!
//! Addresses are 32-bit word indices with no block-offset bits. Reading the
//! address MSB first, the top `tag_bits` form the tag and the next
//! `set_bits` form the set index.

/// Width of a word address in bits
pub const ADDRESS_BITS: u32 = 32;

/// Split `address` into `(tag, set_index)`
///
/// `tag_bits + set_bits` must not exceed 32; when it equals 32 the split is
/// lossless and [`encode`] inverts it.
pub fn decode(address: u32, tag_bits: u32, set_bits: u32) -> (u32, u32) {
    debug_assert!(tag_bits + set_bits <= ADDRESS_BITS);

    // Widened so that shifts by 32 (empty tag or empty set field) are defined
    let addr = u64::from(address);
    let tag = addr >> (ADDRESS_BITS - tag_bits);
    let set = (addr >> (ADDRESS_BITS - tag_bits - set_bits)) & low_mask(set_bits);

    (tag as u32, set as u32)
}

/// Rebuild the address of a line from its tag and set index
pub fn encode(tag: u32, set_index: u32, set_bits: u32) -> u32 {
    ((u64::from(tag) << set_bits) | u64::from(set_index)) as u32
}

fn low_mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}
