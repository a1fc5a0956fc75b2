//! The on-arena entry layout: a fixed 20-byte header followed by the
//! key bytes and then the value bytes, all packed contiguously.
//!
//! ```text
//! +0  (4)  XOR link: previous_position XOR next_position within its chain
//! +4  (4)  keylen
//! +8  (4)  datalen
//! +12 (8)  absolute expiry timestamp
//! +20      key bytes (keylen)
//! +20+keylen  data bytes (datalen)
//! ```

use super::codec::{check_slice, read_expiry, read_u32, write_expiry, write_u32};
use crate::clock::AbsTime;

pub(crate) const HEADER_LEN: u32 = 20;

const OFF_LINK: u32 = 0;
const OFF_KEYLEN: u32 = 4;
const OFF_DATALEN: u32 = 8;
const OFF_EXPIRY: u32 = 12;
const OFF_KEY: u32 = 20;

#[inline]
pub(crate) fn entry_len(keylen: u32, datalen: u32) -> u32 {
    HEADER_LEN + keylen + datalen
}

#[inline]
pub(crate) fn read_link(buf: &[u8], pos: u32) -> u32 {
    read_u32(buf, pos + OFF_LINK)
}

#[inline]
pub(crate) fn write_link(buf: &mut [u8], pos: u32, link: u32) {
    write_u32(buf, pos + OFF_LINK, link)
}

#[inline]
pub(crate) fn read_keylen(buf: &[u8], pos: u32) -> u32 {
    read_u32(buf, pos + OFF_KEYLEN)
}

#[inline]
pub(crate) fn read_datalen(buf: &[u8], pos: u32) -> u32 {
    read_u32(buf, pos + OFF_DATALEN)
}

#[inline]
pub(crate) fn read_expiry_at(buf: &[u8], pos: u32) -> AbsTime {
    read_expiry(buf, pos + OFF_EXPIRY)
}

#[inline]
pub(crate) fn key_slice(buf: &[u8], pos: u32, keylen: u32) -> &[u8] {
    let off = pos + OFF_KEY;
    check_slice(buf.len(), off, keylen);
    &buf[off as usize..(off + keylen) as usize]
}

#[inline]
pub(crate) fn data_slice(buf: &[u8], pos: u32, keylen: u32, datalen: u32) -> &[u8] {
    let off = pos + OFF_KEY + keylen;
    check_slice(buf.len(), off, datalen);
    &buf[off as usize..(off + datalen) as usize]
}

/// Writes a complete entry header + key + data at `pos`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn write_entry(
    buf: &mut [u8],
    pos: u32,
    link: u32,
    key: &[u8],
    data: &[u8],
    expiry: AbsTime,
) {
    let keylen = key.len() as u32;
    let datalen = data.len() as u32;
    write_link(buf, pos, link);
    write_u32(buf, pos + OFF_KEYLEN, keylen);
    write_u32(buf, pos + OFF_DATALEN, datalen);
    write_expiry(buf, pos + OFF_EXPIRY, expiry);
    let key_off = (pos + OFF_KEY) as usize;
    check_slice(buf.len(), pos + OFF_KEY, keylen);
    buf[key_off..key_off + key.len()].copy_from_slice(key);
    let data_off = key_off + key.len();
    check_slice(buf.len(), pos + OFF_KEY + keylen, datalen);
    buf[data_off..data_off + data.len()].copy_from_slice(data);
}
