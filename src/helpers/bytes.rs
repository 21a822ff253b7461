//! Little-endian decoding of the fixed-width integers and floats found in
//! OLE compound files and BIFF8 records.
//!
//! Callers slice exactly the width they decode; the helpers only read the
//! leading bytes of the slice they are given.

/// Copies the first `N` bytes of `bytes` into an array.
#[inline]
fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut array = [0u8; N];
    let width = N.min(bytes.len());
    array[..width].copy_from_slice(&bytes[..width]);
    array
}

/// Splits a byte slice into little-endian `u32` sector identifiers.
pub(crate) fn to_usize_iter(bytes: &[u8]) -> impl Iterator<Item = usize> + '_ {
    bytes.chunks_exact(4).map(to_usize)
}

#[inline]
pub(crate) fn to_f64(bytes: &[u8]) -> f64 {
    f64::from_le_bytes(array(bytes))
}

#[inline]
pub(crate) fn to_u64(bytes: &[u8]) -> u64 {
    u64::from_le_bytes(array(bytes))
}

#[inline]
pub(crate) fn to_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes(array(bytes))
}

#[inline]
pub(crate) fn to_u16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes(array(bytes))
}

#[inline]
pub(crate) fn to_usize(bytes: &[u8]) -> usize {
    to_u32(bytes) as usize
}
