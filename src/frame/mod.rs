//! Async framing of whole top-level values over a byte stream.
//!
//! Values are self-delimiting, so a frame is simply one complete value:
//! its tag followed by the payload length the tag declares.

pub mod reader;
pub mod writer;

pub use reader::FrameReader;
pub use writer::FrameWriter;
