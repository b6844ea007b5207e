//! Wire format for schema-driven tag-wire messages.
//!
//! Every record in an encoded message starts with a single tag byte laid out
//! as `[continuation:1][field:4][wire:3]`. The leading `1` marks the byte as
//! a tag; the low three bits select the [`WireType`] and the middle four bits
//! select the wire field within that type.

use crate::error::MessageError;

/// Mask selecting the wire-type bits of a tag byte.
pub const WIRE_MASK: u8 = 0b111;

/// Denotes the type of a record in an encoded message.
///
/// Messages are a series of records. When encoded each record is turned into
/// a tag byte followed by a payload; the [`WireType`] indicates how the
/// proceeding payload is framed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer.
    ///
    /// Used for: `int32`, `sint32`, `bool`.
    Varint = 0,
    /// 64-bit payload.
    ///
    /// Used for: `fixed64` (IEEE-754 double).
    I64 = 1,
    /// Variable length field.
    ///
    /// Used for: `string`, packed lists.
    Len = 2,
    /// Synthetic message identifier, framed as a LEN string.
    ///
    /// Every message begins with exactly one record of this type.
    Type = 7,
}

impl WireType {
    /// Try to decode a [`WireType`] from the provided raw value.
    pub(crate) fn try_from_val(value: u8) -> Result<Self, MessageError> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            7 => Ok(WireType::Type),
            other => Err(MessageError::UnknownWire {
                wire: other,
                field: 0,
            }),
        }
    }

    /// Return the raw value for this [`WireType`].
    #[inline(always)]
    pub const fn into_val(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WireType {
    type Error = MessageError;

    #[inline(always)]
    fn try_from(value: u8) -> Result<Self, MessageError> {
        WireType::try_from_val(value)
    }
}

/// Wire-field code points. Their meaning depends on the [`WireType`] they
/// appear under.
pub mod field {
    /// Unsigned varint integer, under [`super::WireType::Varint`].
    pub const INT32: u8 = 1;
    /// Zig-zag varint integer, under [`super::WireType::Varint`].
    pub const SINT32: u8 = 2;
    /// Boolean, under [`super::WireType::Varint`].
    pub const BOOL: u8 = 3;
    /// IEEE-754 double, under [`super::WireType::I64`].
    pub const FIXED64: u8 = 1;
    /// Packed list, under [`super::WireType::Len`].
    pub const PACKED: u8 = 1;
    /// UTF-8 string, under [`super::WireType::Len`] or [`super::WireType::Type`].
    pub const STRING: u8 = 2;
}

/// A single tag byte containing a wire field and a wire type.
///
/// The layout mirrors the wire format:
/// * Bit 7: continuation flag, always `1` for a tag.
/// * Bits 3-6: wire field (0-15).
/// * Bits 0-2: wire type (see [`WireType`]).
///
/// The continuation flag is what distinguishes a tag byte from the final
/// group of a varint, whose top bit is `0`.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Tag(u8);

impl Tag {
    /// The identifier tag every message starts with: wire field
    /// [`field::STRING`] under [`WireType::Type`], aka `0b1001_0111`.
    pub const IDENTIFIER: Tag = Tag::new(field::STRING, WireType::Type);

    /// Creates a new [`Tag`] from a wire field and a [`WireType`].
    #[inline(always)]
    pub const fn new(field: u8, wire: WireType) -> Self {
        Tag(0x80 | (field << 3) | wire as u8)
    }

    /// Reinterprets a raw byte as a [`Tag`] without validation.
    ///
    /// The wire-type bits are validated lazily by [`Tag::wire_type`].
    #[inline(always)]
    pub const fn from_byte(byte: u8) -> Self {
        Tag(byte)
    }

    /// Returns the raw tag byte.
    #[inline(always)]
    pub const fn byte(self) -> u8 {
        self.0
    }

    /// Returns the raw wire-type bits of this tag.
    #[inline(always)]
    pub const fn wire_val(self) -> u8 {
        self.0 & WIRE_MASK
    }

    /// Returns the [`WireType`] component of this tag.
    #[inline(always)]
    pub fn wire_type(self) -> Result<WireType, MessageError> {
        WireType::try_from_val(self.wire_val()).map_err(|_| MessageError::UnknownWire {
            wire: self.wire_val(),
            field: self.field(),
        })
    }

    /// Returns the wire-field component of this tag.
    #[inline(always)]
    pub const fn field(self) -> u8 {
        (self.0 >> 3) & 0x0f
    }
}

impl core::fmt::Debug for Tag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tag")
            .field("byte", &format_args!("{:#010b}", self.0))
            .field("field", &self.field())
            .field("wire", &self.wire_val())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_tag() {
        assert_eq!(Tag::IDENTIFIER.byte(), 0x97);
        assert_eq!(Tag::IDENTIFIER.field(), field::STRING);
        assert_eq!(Tag::IDENTIFIER.wire_val(), WireType::Type.into_val());
    }

    #[test]
    fn test_record_tags() {
        assert_eq!(Tag::new(field::BOOL, WireType::Varint).byte(), 0x98);
        assert_eq!(Tag::new(field::INT32, WireType::Varint).byte(), 0x88);
        assert_eq!(Tag::new(field::SINT32, WireType::Varint).byte(), 0x90);
        assert_eq!(Tag::new(field::FIXED64, WireType::I64).byte(), 0x89);
        assert_eq!(Tag::new(field::STRING, WireType::Len).byte(), 0x92);
        assert_eq!(Tag::new(field::PACKED, WireType::Len).byte(), 0x8a);
    }

    #[test]
    fn test_tag_unpack() {
        let tag = Tag::from_byte(0x92);
        assert_eq!(tag.field(), field::STRING);
        assert_eq!(tag.wire_type().unwrap(), WireType::Len);

        let tag = Tag::from_byte(0x89);
        assert_eq!(tag.field(), field::FIXED64);
        assert_eq!(tag.wire_type().unwrap(), WireType::I64);
    }

    #[test]
    fn test_all_wire_type_values() {
        for raw in u8::MIN..=u8::MAX {
            let wire_type = WireType::try_from_val(raw);
            match (raw, wire_type) {
                (0, Ok(WireType::Varint))
                | (1, Ok(WireType::I64))
                | (2, Ok(WireType::Len))
                | (7, Ok(WireType::Type)) => (),
                (3..=6 | 8..=u8::MAX, Err(_)) => (),
                other => panic!("unexpected value {other:?}"),
            }
        }
    }

    #[test]
    fn test_unknown_wire_carries_field() {
        let tag = Tag::from_byte(0b1_0010_011);
        let err = tag.wire_type().unwrap_err();
        assert_eq!(
            err,
            MessageError::UnknownWire {
                wire: 3,
                field: field::STRING
            }
        );
    }
}
