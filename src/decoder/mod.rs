//! Streaming decoder: type inspection, scalar reads, and navigation.

pub mod config;
mod navigator;
pub mod scope;

pub use config::DecoderConfig;
pub use navigator::{Decoder, State};
