//! BIPF — a compact, self-describing binary encoding with a lazy decoder.
//!
//! Every value is a varint tag packing a 3-bit type and a byte length,
//! followed by exactly that many payload bytes. Arrays and objects are
//! values whose payload is a run of nested values, so any subtree can be
//! skipped by its length alone and a keyed lookup never has to decode
//! unrelated fields.
//!
//! # Architecture
//!
//! - **`codec`** — Varint (LEB128) codec and tag packing
//! - **`encode`** — `Producer` values that write their own encoding
//! - **`decoder`** — Cursor-based navigator: inspect, read, skip, enter, seek by label
//! - **`types`** — Materialized `Value` trees
//! - **`frame`** — Reading and writing whole values over async streams

pub mod codec;
pub mod decoder;
pub mod encode;
pub mod error;
pub mod frame;
pub mod types;

pub use codec::Type;
pub use decoder::{Decoder, DecoderConfig};
pub use encode::Producer;
pub use error::BipfError;
pub use types::{Value, decode_value};
