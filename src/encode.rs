//! Value producers: anything that can write its own encoding to a sink.
//!
//! Scalars write their tag and payload directly. Arrays and objects encode
//! their children into a scratch buffer first, since the tag has to declare
//! the payload length before any payload byte is written.

use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::tag::{self, Type};
use crate::codec::varint;
use crate::error::BipfError;

/// A value that can write its BIPF encoding to a byte sink.
pub trait Producer {
    /// Writes the complete encoding (tag and payload) to `sink`.
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError>;

    /// Encodes into a fresh buffer.
    fn to_bytes(&self) -> Result<Bytes, BipfError> {
        let mut out = BytesMut::new().writer();
        self.write_to(&mut out)?;
        Ok(out.into_inner().freeze())
    }

    fn boxed(self) -> Box<dyn Producer>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

impl<P: Producer + ?Sized> Producer for &P {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        (**self).write_to(sink)
    }
}

impl<P: Producer + ?Sized> Producer for Box<P> {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        (**self).write_to(sink)
    }
}

/// Writes a tag for `ty` followed by `payload`.
pub(crate) fn write_tagged(sink: &mut dyn Write, ty: Type, payload: &[u8]) -> Result<(), BipfError> {
    // An empty payload leaves just the one-byte tag.
    sink.write_all(&varint::encode(tag::pack(ty, payload.len() as u64)))?;
    sink.write_all(payload)?;
    Ok(())
}

/// A string value. The tag carries its byte length, not its char count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Str(pub String);

/// An opaque byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer(pub Vec<u8>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Int32(pub i32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Double(pub f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bool(pub bool);

pub fn encode_string(value: impl Into<String>) -> Str {
    Str(value.into())
}

pub fn encode_buffer(value: impl Into<Vec<u8>>) -> Buffer {
    Buffer(value.into())
}

pub fn encode_int32(value: i32) -> Int32 {
    Int32(value)
}

pub fn encode_double(value: f64) -> Double {
    Double(value)
}

pub fn encode_bool(value: bool) -> Bool {
    Bool(value)
}

impl Producer for Str {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        write_tagged(sink, Type::String, self.0.as_bytes())
    }
}

impl Producer for Buffer {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        write_tagged(sink, Type::Buffer, &self.0)
    }
}

impl Producer for Int32 {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        let mut out = [tag::INT32_TAG; 5];
        out[1..].copy_from_slice(&self.0.to_le_bytes());
        sink.write_all(&out)?;
        Ok(())
    }
}

impl Producer for Double {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        let mut out = [tag::DOUBLE_TAG; 9];
        out[1..].copy_from_slice(&self.0.to_le_bytes());
        sink.write_all(&out)?;
        Ok(())
    }
}

impl Producer for Bool {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        sink.write_all(&[tag::BOOL_TAG, u8::from(self.0)])?;
        Ok(())
    }
}

impl Producer for str {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        write_tagged(sink, Type::String, self.as_bytes())
    }
}

impl Producer for String {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        self.as_str().write_to(sink)
    }
}

impl Producer for i32 {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        Int32(*self).write_to(sink)
    }
}

impl Producer for f64 {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        Double(*self).write_to(sink)
    }
}

impl Producer for bool {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        Bool(*self).write_to(sink)
    }
}

/// A producer backed by a closure.
pub struct FnProducer<F>(F);

/// Wraps a closure as a [`Producer`].
pub fn from_fn<F>(f: F) -> FnProducer<F>
where
    F: Fn(&mut dyn Write) -> Result<(), BipfError>,
{
    FnProducer(f)
}

impl<F> Producer for FnProducer<F>
where
    F: Fn(&mut dyn Write) -> Result<(), BipfError>,
{
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        (self.0)(sink)
    }
}

/// An ordered list of values.
pub struct Array {
    items: Vec<Box<dyn Producer>>,
}

pub fn encode_array(items: impl IntoIterator<Item = Box<dyn Producer>>) -> Array {
    Array {
        items: items.into_iter().collect(),
    }
}

impl Producer for Array {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        let mut body = BytesMut::new().writer();
        for (idx, item) in self.items.iter().enumerate() {
            item.write_to(&mut body)
                .map_err(|e| BipfError::encode(format!("array item {idx}"), e))?;
        }
        let body = body.into_inner();
        tracing::trace!(items = self.items.len(), len = body.len(), "encoded array");
        write_tagged(sink, Type::Array, &body)
    }
}

/// A set of key/value pairs, written in a fixed key order.
pub struct Object {
    pairs: Vec<(String, Box<dyn Producer>)>,
}

/// Builds an object from `pairs`.
///
/// Without `order` the pairs are written in the order given. With `order`,
/// it must name every key exactly once; anything else is rejected here,
/// before any byte can reach a sink. Duplicate keys in `pairs` are rejected
/// as well.
pub fn encode_object<K>(
    pairs: impl IntoIterator<Item = (K, Box<dyn Producer>)>,
    order: Option<&[&str]>,
) -> Result<Object, BipfError>
where
    K: Into<String>,
{
    let mut pairs: Vec<(String, Box<dyn Producer>)> =
        pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();

    for (i, (key, _)) in pairs.iter().enumerate() {
        if pairs[..i].iter().any(|(k, _)| k == key) {
            return Err(BipfError::Construction(format!("duplicate key {key:?}")));
        }
    }

    let Some(order) = order else {
        return Ok(Object { pairs });
    };

    if order.len() != pairs.len() {
        return Err(BipfError::Construction(format!(
            "map and ordered field size differ: {} vs {}",
            pairs.len(),
            order.len()
        )));
    }

    let mut slots: Vec<Option<(String, Box<dyn Producer>)>> =
        pairs.drain(..).map(Some).collect();
    let mut ordered = Vec::with_capacity(slots.len());
    for &key in order {
        let idx = slots
            .iter()
            .position(|slot| matches!(slot, Some((k, _)) if k == key));
        match idx.and_then(|i| slots[i].take()) {
            Some(pair) => ordered.push(pair),
            None if ordered.iter().any(|(k, _): &(String, _)| k == key) => {
                return Err(BipfError::Construction(format!(
                    "ordered field {key:?} listed twice"
                )));
            }
            None => {
                return Err(BipfError::Construction(format!(
                    "ordered field {key:?} not in map"
                )));
            }
        }
    }

    Ok(Object { pairs: ordered })
}

impl Object {
    /// Keys in the order they will be written.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(k, _)| k.as_str())
    }
}

impl Producer for Object {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        let mut body = BytesMut::new().writer();
        for (key, value) in &self.pairs {
            key.write_to(&mut body)
                .map_err(|e| BipfError::encode(format!("object key {key:?}"), e))?;
            value
                .write_to(&mut body)
                .map_err(|e| BipfError::encode(format!("object value for key {key:?}"), e))?;
        }
        let body = body.into_inner();
        tracing::trace!(fields = self.pairs.len(), len = body.len(), "encoded object");
        write_tagged(sink, Type::Object, &body)
    }
}
