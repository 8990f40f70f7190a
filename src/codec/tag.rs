//! Value tags: a varint carrying `(length << 3) | type`.

use std::fmt;

use crate::error::BipfError;

/// Number of low bits holding the type code.
pub const TYPE_BITS: u32 = 3;
pub const TYPE_MASK: u64 = 0b111;

/// Type code 7 is never valid on the wire.
pub const RESERVED_CODE: u8 = 0b111;

/// Largest payload length whose tag still fits in a `u64`.
pub const MAX_LEN: u64 = u64::MAX >> TYPE_BITS;

// Fixed single-byte tags of the fixed-size scalars.
pub const INT32_TAG: u8 = 0x22; // pack(Int32, 4)
pub const DOUBLE_TAG: u8 = 0x43; // pack(Double, 8)
pub const BOOL_TAG: u8 = 0x0E; // pack(Bool, 1)

/// The type of an encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Type {
    String = 0,
    Buffer = 1,
    Int32 = 2,
    Double = 3,
    Array = 4,
    Object = 5,
    /// Also carries null by convention; there is no separate null encoding.
    Bool = 6,
}

impl Type {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns `true` for Array and Object, whose payload is nested values.
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }
}

impl TryFrom<u8> for Type {
    type Error = BipfError;

    fn try_from(code: u8) -> Result<Self, BipfError> {
        match code {
            0 => Ok(Self::String),
            1 => Ok(Self::Buffer),
            2 => Ok(Self::Int32),
            3 => Ok(Self::Double),
            4 => Ok(Self::Array),
            5 => Ok(Self::Object),
            6 => Ok(Self::Bool),
            other => Err(BipfError::InvalidType(other)),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Packs a type and payload length into a tag.
///
/// The format itself has no length ceiling; `len` is bounded only by
/// [`MAX_LEN`], the capacity of the 64-bit tag.
pub fn pack(ty: Type, len: u64) -> u64 {
    debug_assert!(len <= MAX_LEN, "payload length {len} overflows the tag");
    (len << TYPE_BITS) | u64::from(ty.code())
}

/// Splits a tag into its raw type code (`0..=7`) and payload length.
///
/// Rejecting [`RESERVED_CODE`] is left to the decoder.
pub fn unpack(tag: u64) -> (u8, u64) {
    ((tag & TYPE_MASK) as u8, tag >> TYPE_BITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_tags_match_pack() {
        assert_eq!(pack(Type::Int32, 4), u64::from(INT32_TAG));
        assert_eq!(pack(Type::Double, 8), u64::from(DOUBLE_TAG));
        assert_eq!(pack(Type::Bool, 1), u64::from(BOOL_TAG));
    }

    #[test]
    fn unpack_splits_fields() {
        assert_eq!(unpack(0x22), (2, 4));
        assert_eq!(unpack(0x35), (5, 6));
        assert_eq!(unpack(0x00), (0, 0));
        assert_eq!(unpack(pack(Type::Array, MAX_LEN)), (4, MAX_LEN));
    }

    #[test]
    fn reserved_code_is_rejected() {
        assert!(matches!(
            Type::try_from(RESERVED_CODE),
            Err(BipfError::InvalidType(7))
        ));
        for code in 0..RESERVED_CODE {
            assert_eq!(Type::try_from(code).unwrap().code(), code);
        }
    }

    #[test]
    fn composites() {
        assert!(Type::Array.is_composite());
        assert!(Type::Object.is_composite());
        assert!(!Type::String.is_composite());
        assert!(!Type::Bool.is_composite());
    }
}
