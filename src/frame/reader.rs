//! Reads complete values from an async byte stream.

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::codec::tag::{self, Type};
use crate::codec::varint::{self, MAX_VARINT_LEN};
use crate::error::BipfError;

/// Default ceiling for a single frame's payload (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: u64 = 16 * 1024 * 1024;

/// Reads one top-level value at a time from an `AsyncRead` stream.
///
/// Each frame is returned with its tag, ready to hand to a
/// [`Decoder`](crate::decoder::Decoder).
pub struct FrameReader<R> {
    reader: R,
    max_frame_size: u64,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Sets the largest payload a frame may declare.
    pub fn with_max_frame_size(mut self, limit: u64) -> Self {
        self.max_frame_size = limit;
        self
    }

    /// Reads the next complete value.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between values. A
    /// stream ending inside a tag or payload is an I/O error.
    pub async fn read_frame(&mut self) -> Result<Option<BytesMut>, BipfError> {
        let mut header = [0u8; MAX_VARINT_LEN];
        let mut n = 0;
        let raw = loop {
            let read = self.reader.read(&mut header[n..=n]).await?;
            if read == 0 {
                if n == 0 {
                    return Ok(None);
                }
                return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
            }
            n += 1;
            match varint::decode(&header[..n]) {
                Ok((raw, _)) => break raw,
                Err(BipfError::Truncated) if n < MAX_VARINT_LEN => continue,
                Err(e) => return Err(e),
            }
        };

        let (code, len) = tag::unpack(raw);
        let ty = Type::try_from(code)?;
        if len > self.max_frame_size {
            return Err(BipfError::LimitExceeded {
                what: "frame",
                len,
                limit: self.max_frame_size,
            });
        }

        // len <= max_frame_size, which the caller chose to fit in memory.
        let mut frame = BytesMut::with_capacity(n + len as usize);
        frame.put_slice(&header[..n]);
        frame.resize(n + len as usize, 0);
        self.reader.read_exact(&mut frame[n..]).await?;

        tracing::debug!(?ty, len, "read frame");
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Decoder;
    use crate::encode::{Producer, encode_bool, encode_int32, encode_object};
    use std::io::Cursor;

    #[tokio::test]
    async fn read_consecutive_frames() {
        let mut data = Vec::new();
        encode_int32(7).write_to(&mut data).unwrap();
        encode_object([("foo", encode_bool(true).boxed())], None)
            .unwrap()
            .write_to(&mut data)
            .unwrap();

        let mut reader = FrameReader::new(Cursor::new(data));
        let first = reader.read_frame().await.unwrap().unwrap();
        assert_eq!(&first[..], &[0x22, 0x07, 0x00, 0x00, 0x00]);

        let second = reader.read_frame().await.unwrap().unwrap();
        let mut dec = Decoder::from_slice(&second);
        dec.inspect_type().unwrap();
        dec.seek_to_label(&["foo"]).unwrap();
        assert!(dec.read_bool().unwrap());

        assert!(reader.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn multibyte_tag_frame() {
        let data = crate::encode::encode_string("x".repeat(300)).to_bytes().unwrap();
        let mut reader = FrameReader::new(Cursor::new(data.to_vec()));
        let frame = reader.read_frame().await.unwrap().unwrap();
        assert_eq!(&frame[..], &data[..]);
    }

    #[tokio::test]
    async fn truncated_payload_is_io_error() {
        let data: Vec<u8> = vec![0x22, 0x01, 0x00];
        let mut reader = FrameReader::new(Cursor::new(data));
        let err = reader.read_frame().await.unwrap_err();
        assert!(err.is_io());
    }

    #[tokio::test]
    async fn truncated_tag_is_io_error() {
        let data: Vec<u8> = vec![0x80];
        let mut reader = FrameReader::new(Cursor::new(data));
        assert!(reader.read_frame().await.unwrap_err().is_io());
    }

    #[tokio::test]
    async fn reserved_type_is_rejected() {
        let data: Vec<u8> = vec![0x0F, 0x00];
        let mut reader = FrameReader::new(Cursor::new(data));
        assert!(matches!(
            reader.read_frame().await,
            Err(BipfError::InvalidType(7))
        ));
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let data = crate::encode::encode_string("x".repeat(100)).to_bytes().unwrap();
        let mut reader = FrameReader::new(Cursor::new(data.to_vec())).with_max_frame_size(64);
        assert!(matches!(
            reader.read_frame().await,
            Err(BipfError::LimitExceeded { len: 100, limit: 64, .. })
        ));
    }
}
