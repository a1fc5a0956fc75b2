//! The djb2-variant bucket hash and the hash-index accessors.
//!
//! The index occupies `buf[0..hsize)` as `hsize / 4` head slots, each a
//! 4-byte offset; a slot value of 0 means "empty chain". The hash function
//! folds key bytes into a 32-bit state, then shifts and masks so the result
//! is always a 4-byte-aligned offset within `[0, hsize)` — i.e. a slot
//! offset, not a slot index.

use super::codec::{read_u32, write_u32};

/// `hash(key)`: the byte offset into the index of key's bucket head.
///
/// Not cryptographic — the 100-step chain cap is what bounds the damage
/// a flooding attacker can do, not this function.
#[inline]
pub(crate) fn bucket_offset(key: &[u8], hsize: u32) -> u32 {
    let mut h: u32 = 5381;
    for &b in key {
        h = h.wrapping_shl(5).wrapping_add(h) ^ (b as u32);
    }
    (h.wrapping_shl(2)) & (hsize - 4)
}

/// Reads the head-slot value at bucket offset `h` (0 means empty chain).
#[inline]
pub(crate) fn slot(buf: &[u8], h: u32) -> u32 {
    read_u32(buf, h)
}

/// Overwrites the head-slot value at bucket offset `h`.
#[inline]
pub(crate) fn set_slot(buf: &mut [u8], h: u32, value: u32) {
    write_u32(buf, h, value)
}

/// The largest power of two `hsize` with `4 <= hsize <= size/16` and
/// `hsize <= size/32`: doubled up from 4 while the next doubling still
/// fits under `size/32`.
pub(crate) fn choose_hsize(size: u32) -> u32 {
    let limit = size / 32;
    let mut hsize: u32 = 4;
    while hsize.saturating_mul(2) <= limit {
        hsize *= 2;
    }
    hsize
}
