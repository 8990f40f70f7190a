//! Lazy navigation over an encoded byte source.
//!
//! The decoder never builds a tree unless asked to. It reads one tag at a
//! time and lets the caller decide whether to read a scalar, skip a whole
//! subtree by its length prefix, or descend into a composite.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use super::config::DecoderConfig;
use super::scope::{Frame, ScopeStack};
use crate::codec::tag::{self, Type};
use crate::codec::varint::{self, MAX_VARINT_LEN};
use crate::error::BipfError;
use crate::types::Value;

/// Where the cursor stands relative to the value under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// At a value boundary, tag not yet read.
    Idle,
    /// Tag read; the cursor sits at the start of the payload.
    TypeKnown { ty: Type, len: u64 },
    /// Nothing left in the current scope.
    Exhausted,
}

/// A cursor over one seekable byte source.
///
/// Not meant to be shared between threads; independent decoders over
/// independent views of the same bytes need no coordination.
#[derive(Debug)]
pub struct Decoder<R> {
    source: R,
    pos: u64,
    end: u64,
    state: State,
    scopes: ScopeStack,
    config: DecoderConfig,
}

impl<'a> Decoder<Cursor<&'a [u8]>> {
    /// Creates a decoder over an in-memory buffer.
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        Self::from_slice_with_config(bytes, DecoderConfig::default())
    }

    pub fn from_slice_with_config(bytes: &'a [u8], config: DecoderConfig) -> Self {
        Self {
            end: bytes.len() as u64,
            source: Cursor::new(bytes),
            pos: 0,
            state: State::Idle,
            scopes: ScopeStack::new(config.max_depth),
            config,
        }
    }
}

impl<R: Read + Seek> Decoder<R> {
    /// Creates a decoder starting at the source's current position.
    pub fn new(source: R) -> Result<Self, BipfError> {
        Self::with_config(source, DecoderConfig::default())
    }

    pub fn with_config(mut source: R, config: DecoderConfig) -> Result<Self, BipfError> {
        let pos = source.stream_position()?;
        let end = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(pos))?;
        Ok(Self {
            source,
            pos,
            end,
            state: State::Idle,
            scopes: ScopeStack::new(config.max_depth),
            config,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Type of the inspected, not yet consumed value.
    pub fn current_type(&self) -> Option<Type> {
        match self.state {
            State::TypeKnown { ty, .. } => Some(ty),
            _ => None,
        }
    }

    /// Payload length of the inspected, not yet consumed value.
    pub fn current_len(&self) -> Option<u64> {
        match self.state {
            State::TypeKnown { len, .. } => Some(len),
            _ => None,
        }
    }

    /// Byte offset of the cursor in the source.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Number of entered scopes.
    pub fn depth(&self) -> usize {
        self.scopes.depth()
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    fn boundary(&self) -> u64 {
        self.scopes.boundary(self.end)
    }

    fn rewind(&mut self, pos: u64) -> Result<(), BipfError> {
        self.source.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    /// Reads the tag of the next value and returns its type.
    ///
    /// When the cursor sits on an unconsumed Array or Object, this descends
    /// into it and inspects its first child. On a malformed tag the cursor
    /// is rewound to the start of the tag.
    pub fn inspect_type(&mut self) -> Result<Type, BipfError> {
        match self.state {
            State::TypeKnown { ty, .. } if ty.is_composite() => self.enter()?,
            State::TypeKnown { .. } => {
                return Err(BipfError::Sequence("current value has not been read or skipped"));
            }
            State::Idle | State::Exhausted => {}
        }

        let boundary = self.boundary();
        if self.pos >= boundary {
            self.state = State::Exhausted;
            return Err(BipfError::Exhausted);
        }

        let start = self.pos;
        match self.read_tag(boundary) {
            Ok((ty, len)) => {
                self.state = State::TypeKnown { ty, len };
                Ok(ty)
            }
            Err(e) => {
                self.rewind(start)?;
                Err(e)
            }
        }
    }

    fn read_tag(&mut self, boundary: u64) -> Result<(Type, u64), BipfError> {
        let start = self.pos;
        let mut buf = [0u8; MAX_VARINT_LEN];
        let mut n = 0;
        let raw = loop {
            if start + n as u64 >= boundary {
                return Err(BipfError::Truncated);
            }
            self.source.read_exact(&mut buf[n..=n])?;
            n += 1;
            match varint::decode(&buf[..n]) {
                Ok((raw, _)) => break raw,
                Err(BipfError::Truncated) if n < MAX_VARINT_LEN => continue,
                Err(e) => return Err(e),
            }
        };
        self.pos = start + n as u64;

        let (code, len) = tag::unpack(raw);
        let ty = Type::try_from(code)?;
        match self.pos.checked_add(len) {
            Some(end) if end <= boundary => {}
            end => {
                return Err(BipfError::OutOfScope {
                    end: end.unwrap_or(u64::MAX),
                    boundary,
                });
            }
        }

        tracing::trace!(offset = start, ?ty, len, "decoded tag");
        if let Some(sink) = self.config.trace.as_mut() {
            let hex: String = buf[..n].iter().map(|b| format!("{b:02x}")).collect();
            let _ = writeln!(sink, "{start}: tag {hex} -> {ty} len {len}");
        }
        Ok((ty, len))
    }

    /// Checks the inspected value is `want` and returns its payload length.
    fn expect(&self, want: Type) -> Result<u64, BipfError> {
        match self.state {
            State::TypeKnown { ty, len } if ty == want => Ok(len),
            State::TypeKnown { ty, .. } => Err(BipfError::TypeMismatch {
                expected: want,
                actual: ty,
            }),
            State::Idle | State::Exhausted => Err(BipfError::Sequence("no value inspected")),
        }
    }

    /// Reads exactly `N` payload bytes and marks the value consumed.
    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], BipfError> {
        let mut out = [0u8; N];
        self.source.read_exact(&mut out)?;
        self.pos += N as u64;
        self.state = State::Idle;
        Ok(out)
    }

    fn take_vec(&mut self, len: u64) -> Result<Vec<u8>, BipfError> {
        let size = usize::try_from(len).map_err(|_| BipfError::LimitExceeded {
            what: "payload",
            len,
            limit: usize::MAX as u64,
        })?;
        let mut out = vec![0u8; size];
        self.source.read_exact(&mut out)?;
        self.pos += len;
        self.state = State::Idle;
        Ok(out)
    }

    fn check_string_limit(&self, len: u64) -> Result<(), BipfError> {
        match self.config.max_string_len {
            Some(limit) if len > limit => Err(BipfError::LimitExceeded {
                what: "string",
                len,
                limit,
            }),
            _ => Ok(()),
        }
    }

    pub fn read_bool(&mut self) -> Result<bool, BipfError> {
        let len = self.expect(Type::Bool)?;
        if len != 1 {
            return Err(BipfError::LengthMismatch {
                ty: Type::Bool,
                expected: "1",
                actual: len,
            });
        }
        let start = self.pos;
        match self.take_array::<1>()? {
            [0x00] => Ok(false),
            [0x01] => Ok(true),
            [other] => {
                self.rewind(start)?;
                self.state = State::TypeKnown { ty: Type::Bool, len };
                Err(BipfError::MalformedBool(other))
            }
        }
    }

    pub fn read_int32(&mut self) -> Result<i32, BipfError> {
        let len = self.expect(Type::Int32)?;
        if len != 4 {
            return Err(BipfError::LengthMismatch {
                ty: Type::Int32,
                expected: "4",
                actual: len,
            });
        }
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    /// Reads a double. A zero-length payload reads as `0.0`.
    pub fn read_double(&mut self) -> Result<f64, BipfError> {
        match self.expect(Type::Double)? {
            0 => {
                self.state = State::Idle;
                Ok(0.0)
            }
            8 => Ok(f64::from_le_bytes(self.take_array()?)),
            len => Err(BipfError::LengthMismatch {
                ty: Type::Double,
                expected: "0 or 8",
                actual: len,
            }),
        }
    }

    /// Copies out a string value.
    pub fn read_string(&mut self) -> Result<String, BipfError> {
        let len = self.expect(Type::String)?;
        self.check_string_limit(len)?;
        let start = self.pos;
        let bytes = self.take_vec(len)?;
        match String::from_utf8(bytes) {
            Ok(s) => Ok(s),
            Err(e) => {
                self.rewind(start)?;
                self.state = State::TypeKnown {
                    ty: Type::String,
                    len,
                };
                Err(BipfError::InvalidUtf8(e))
            }
        }
    }

    /// Copies out a buffer value.
    pub fn read_buffer(&mut self) -> Result<Vec<u8>, BipfError> {
        let len = self.expect(Type::Buffer)?;
        self.check_string_limit(len)?;
        self.take_vec(len)
    }

    /// Moves past the inspected value without looking at its payload.
    ///
    /// Composites are skipped whole: their length already covers everything
    /// nested inside them.
    pub fn skip(&mut self) -> Result<(), BipfError> {
        let State::TypeKnown { len, .. } = self.state else {
            return Err(BipfError::Sequence("no value inspected"));
        };
        self.rewind(self.pos + len)?;
        self.state = State::Idle;
        Ok(())
    }

    /// Advances to the next sibling in the current scope.
    ///
    /// Skips the current value if it was inspected but not consumed, then
    /// inspects the following one. Returns `false`, without reading, once
    /// the cursor reaches the end of the innermost entered scope (or of the
    /// source at top level).
    pub fn next(&mut self) -> Result<bool, BipfError> {
        if let State::TypeKnown { .. } = self.state {
            self.skip()?;
        }
        if self.pos >= self.boundary() {
            self.state = State::Exhausted;
            return Ok(false);
        }
        self.inspect_type()?;
        Ok(true)
    }

    /// Descends into the inspected Array or Object.
    pub fn enter(&mut self) -> Result<(), BipfError> {
        let State::TypeKnown { ty, len } = self.state else {
            return Err(BipfError::Sequence("no value inspected"));
        };
        if !ty.is_composite() {
            return Err(BipfError::Sequence("cannot enter a scalar value"));
        }
        self.scopes.push(Frame {
            ty,
            start: self.pos,
            len,
        })?;
        tracing::trace!(depth = self.scopes.depth(), start = self.pos, len, "entered {ty}");
        self.state = State::Idle;
        Ok(())
    }

    /// Leaves the innermost entered scope, skipping whatever is left of it.
    pub fn exit(&mut self) -> Result<(), BipfError> {
        let frame = self
            .scopes
            .pop()
            .ok_or(BipfError::Sequence("not inside a composite"))?;
        self.rewind(frame.end())?;
        tracing::trace!(depth = self.scopes.depth(), end = frame.end(), "left {}", frame.ty);
        self.state = State::Idle;
        Ok(())
    }

    /// Descends through nested objects by key and stops on the value found.
    ///
    /// The decoder must be positioned on an inspected Object. Each label is
    /// looked up by a linear scan of the current object's keys, skipping the
    /// values of keys that do not match; every value on the path except the
    /// last must itself be an Object. On success the decoder is left on the
    /// target value with its type inspected, inside every object entered on
    /// the way.
    ///
    /// A missing label fails with [`BipfError::LabelNotFound`] and leaves the
    /// cursor at the end of the object being scanned, never past it.
    pub fn seek_to_label(&mut self, path: &[&str]) -> Result<(), BipfError> {
        for (i, label) in path.iter().enumerate() {
            match self.state {
                State::TypeKnown {
                    ty: Type::Object, ..
                } => {}
                State::TypeKnown { ty, .. } => {
                    return Err(BipfError::TypeMismatch {
                        expected: Type::Object,
                        actual: ty,
                    });
                }
                State::Idle | State::Exhausted => {
                    return Err(BipfError::Sequence("no object inspected"));
                }
            }
            self.enter()?;

            loop {
                if self.pos >= self.boundary() {
                    self.state = State::Exhausted;
                    let missing = path[..=i].join(".");
                    tracing::debug!(label = %missing, "label not found");
                    return Err(BipfError::LabelNotFound(missing));
                }
                let key_ty = self.inspect_type()?;
                if key_ty != Type::String {
                    return Err(BipfError::TypeMismatch {
                        expected: Type::String,
                        actual: key_ty,
                    });
                }
                let matched = self.key_matches(label)?;
                self.inspect_type()?;
                if matched {
                    break;
                }
                self.skip()?;
            }
        }
        tracing::debug!(path = %path.join("."), offset = self.pos, "found label");
        Ok(())
    }

    /// Consumes the inspected key and compares it with `label`.
    fn key_matches(&mut self, label: &str) -> Result<bool, BipfError> {
        let len = self.expect(Type::String)?;
        if len != label.len() as u64 {
            self.skip()?;
            return Ok(false);
        }
        Ok(self.take_vec(len)? == label.as_bytes())
    }

    /// Materializes the inspected value and everything nested in it.
    pub fn read_value(&mut self) -> Result<Value, BipfError> {
        let ty = self
            .current_type()
            .ok_or(BipfError::Sequence("no value inspected"))?;
        match ty {
            Type::String => self.read_string().map(Value::String),
            Type::Buffer => self.read_buffer().map(Value::Buffer),
            Type::Int32 => self.read_int32().map(Value::Int32),
            Type::Double => self.read_double().map(Value::Double),
            Type::Bool => self.read_bool().map(Value::Bool),
            Type::Array => {
                self.enter()?;
                let mut items = Vec::new();
                while self.next()? {
                    items.push(self.read_value()?);
                }
                self.exit()?;
                Ok(Value::Array(items))
            }
            Type::Object => {
                self.enter()?;
                let mut fields = Vec::new();
                while self.next()? {
                    let key = self.read_string()?;
                    if !self.next()? {
                        return Err(BipfError::Exhausted);
                    }
                    fields.push((key, self.read_value()?));
                }
                self.exit()?;
                Ok(Value::Object(fields))
            }
        }
    }
}
