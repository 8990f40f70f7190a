//! Unsigned LEB128 varints: 7 data bits per byte, `0x80` continuation bit.

use std::ops::Deref;

use bytes::BufMut;

use crate::error::BipfError;

/// Longest encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// An encoded varint held inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Varint {
    buf: [u8; MAX_VARINT_LEN],
    len: u8,
}

impl Deref for Varint {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf[..usize::from(self.len)]
    }
}

/// Encodes `v` into 1..=10 bytes, low-order group first.
pub fn encode(mut v: u64) -> Varint {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let mut len = 0;
    while v >= 0x80 {
        buf[len] = (v as u8 & 0x7F) | 0x80;
        v >>= 7;
        len += 1;
    }
    buf[len] = v as u8;
    Varint {
        buf,
        len: len as u8 + 1,
    }
}

/// Appends the encoding of `v` to `buf`.
pub fn put_varint(buf: &mut impl BufMut, v: u64) {
    buf.put_slice(&encode(v));
}

/// Decodes a varint from the front of `bytes`, returning the value and the
/// number of bytes consumed.
///
/// Fails with [`BipfError::Truncated`] when `bytes` ends before a byte with
/// the continuation bit clear, and with [`BipfError::VarintOverflow`] when
/// the tenth byte carries anything above its lowest bit. Stream readers feed
/// this one byte at a time until it stops reporting `Truncated`.
pub fn decode(bytes: &[u8]) -> Result<(u64, usize), BipfError> {
    let mut value = 0u64;
    for (i, &byte) in bytes.iter().take(MAX_VARINT_LEN).enumerate() {
        if i == MAX_VARINT_LEN - 1 {
            if byte > 1 {
                return Err(BipfError::VarintOverflow);
            }
            return Ok((value | (u64::from(byte) << 63), MAX_VARINT_LEN));
        }
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte < 0x80 {
            return Ok((value, i + 1));
        }
    }
    Err(BipfError::Truncated)
}

/// Returns the encoded size of `v`, always within `1..=10`.
pub fn size(v: u64) -> usize {
    // 1 + (bit_len - 1) / 7, with 9/64 standing in for 1/7.
    let bits = 64 - v.leading_zeros();
    ((9 * bits + 64) / 64) as usize
}
