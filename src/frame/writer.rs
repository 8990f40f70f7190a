//! Writes values to an async byte stream.

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::encode::Producer;
use crate::error::BipfError;

/// Writes encoded values to an `AsyncWrite` stream, one frame per value.
pub struct FrameWriter<W> {
    writer: W,
    buf: BytesMut,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buf: BytesMut::new(),
        }
    }

    /// Encodes `value` in full, then writes it out.
    ///
    /// Nothing reaches the stream if encoding fails.
    pub async fn write_value<P: Producer + ?Sized>(&mut self, value: &P) -> Result<(), BipfError> {
        self.buf.clear();
        let mut out = (&mut self.buf).writer();
        value.write_to(&mut out)?;
        self.writer.write_all(&self.buf).await?;
        tracing::trace!(len = self.buf.len(), "wrote frame");
        Ok(())
    }

    /// Flushes the underlying writer.
    pub async fn flush(&mut self) -> Result<(), BipfError> {
        self.writer.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
