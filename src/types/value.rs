//! Materialized BIPF values.

use std::fmt;
use std::io::Write;

use crate::codec::tag::Type;
use crate::decoder::Decoder;
use crate::encode::{Producer, write_tagged};
use crate::error::BipfError;

/// A fully decoded value tree.
///
/// Objects keep their fields in encoded order. There is no null: the wire
/// format has no encoding for it distinct from `false`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Buffer(Vec<u8>),
    Int32(i32),
    Double(f64),
    Bool(bool),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Self::String(_) => Type::String,
            Self::Buffer(_) => Type::Buffer,
            Self::Int32(_) => Type::Int32,
            Self::Double(_) => Type::Double,
            Self::Bool(_) => Type::Bool,
            Self::Array(_) => Type::Array,
            Self::Object(_) => Type::Object,
        }
    }

    /// Returns the value as a string reference, if it is a `String` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int32(&self) -> Option<i32> {
        match self {
            Self::Int32(i) => Some(*i),
            _ => None,
        }
    }

    /// Looks up the first field named `key` of an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Object(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Decodes exactly one complete value from `bytes`.
pub fn decode_value(bytes: &[u8]) -> Result<Value, BipfError> {
    let mut dec = Decoder::from_slice(bytes);
    dec.inspect_type()?;
    let value = dec.read_value()?;
    let rest = bytes.len() as u64 - dec.position();
    if rest > 0 {
        return Err(BipfError::TrailingBytes(rest));
    }
    Ok(value)
}

impl Producer for Value {
    fn write_to(&self, sink: &mut dyn Write) -> Result<(), BipfError> {
        match self {
            Self::String(s) => write_tagged(sink, Type::String, s.as_bytes()),
            Self::Buffer(b) => write_tagged(sink, Type::Buffer, b),
            Self::Int32(i) => i.write_to(sink),
            Self::Double(d) => d.write_to(sink),
            Self::Bool(b) => b.write_to(sink),
            Self::Array(items) => {
                let mut body = Vec::new();
                for (idx, item) in items.iter().enumerate() {
                    item.write_to(&mut body)
                        .map_err(|e| BipfError::encode(format!("array item {idx}"), e))?;
                }
                write_tagged(sink, Type::Array, &body)
            }
            Self::Object(fields) => {
                let mut body = Vec::new();
                for (key, value) in fields {
                    key.write_to(&mut body)?;
                    value
                        .write_to(&mut body)
                        .map_err(|e| BipfError::encode(format!("object value for key {key:?}"), e))?;
                }
                write_tagged(sink, Type::Object, &body)
            }
        }
    }
}

// -- Convenience conversions --

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int32(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Double(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Buffer(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Buffer(b) => write!(f, "<{} bytes>", b.len()),
            Self::Int32(i) => write!(f, "{i}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Object(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode then decode a value and verify round-trip.
    fn round_trip(value: &Value) -> Value {
        let bytes = value.to_bytes().expect("encode failed");
        decode_value(&bytes).expect("decode failed")
    }

    #[test]
    fn round_trip_scalars() {
        for v in [
            Value::from(""),
            Value::from("hello"),
            Value::from("a".repeat(200)),
            Value::from(vec![0xDEu8, 0xAD, 0xBE, 0xEF]),
            Value::from(i32::MIN),
            Value::from(i32::MAX),
            Value::from(-0.001f64),
            Value::from(true),
            Value::from(false),
        ] {
            assert_eq!(round_trip(&v), v, "failed for {v}");
        }
    }

    #[test]
    fn round_trip_nested() {
        let val = Value::Array(vec![
            Value::Int32(-1),
            Value::Object(vec![("foo".into(), Value::Bool(true))]),
            Value::Buffer(vec![222, 173, 190, 239]),
            Value::Array(vec![]),
            Value::Object(vec![]),
        ]);
        assert_eq!(round_trip(&val), val);
    }

    #[test]
    fn matches_producer_encoding() {
        use crate::encode::{encode_object, encode_string};

        let val = Value::Object(vec![
            ("name".into(), "bipf".into()),
            ("v".into(), 2i32.into()),
        ]);
        let produced = encode_object(
            [
                ("name", encode_string("bipf").boxed()),
                ("v", 2i32.boxed()),
            ],
            None,
        )
        .unwrap();
        assert_eq!(val.to_bytes().unwrap(), produced.to_bytes().unwrap());
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = Value::Int32(1).to_bytes().unwrap().to_vec();
        bytes.push(0x00);
        assert!(matches!(decode_value(&bytes), Err(BipfError::TrailingBytes(1))));
    }

    #[test]
    fn object_lookup() {
        let val = Value::Object(vec![("a".into(), 1i32.into()), ("b".into(), "x".into())]);
        assert_eq!(val.get("a").and_then(Value::as_int32), Some(1));
        assert_eq!(val.get("b").and_then(Value::as_str), Some("x"));
        assert_eq!(val.get("c"), None);
        assert_eq!(val.ty(), Type::Object);
    }

    #[test]
    fn display() {
        let val = Value::Object(vec![
            ("list".into(), vec![Value::from(1i32), Value::from(false)].into()),
            ("s".into(), "hi".into()),
        ]);
        assert_eq!(val.to_string(), "{list: [1, false], s: \"hi\"}");
    }
}
