//! Materialized value trees.

mod value;

pub use value::{Value, decode_value};
