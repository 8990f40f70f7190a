//! Wire-level building blocks: varints and the tags built on them.
//!
//! Every value on the wire is a varint tag `(length << 3) | type` followed
//! by exactly `length` payload bytes. Fixed-width payloads are little-endian.

pub mod tag;
pub mod varint;

pub use tag::{Type, pack, unpack};
