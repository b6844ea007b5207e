//! Message decoding: bytes → mapping, checked against a schema.
//!
//! A [`Decoder`] owns its bit cursor and attribute queue, so decodes are
//! independent: no shared state across calls, and concurrent decodes
//! against the same schema never race.
//!
//! The state machine is `READ_IDENT → READ_ATTRS → READ_RECORD* → DONE`.
//! The attribute byte schedules the fields present in the message; records
//! are then paired with the scheduled bit positions in ascending order,
//! which is declaration order. That ordering is part of the wire contract.

use std::collections::VecDeque;

use crate::bits::BitReader;
use crate::error::MessageError;
use crate::schema::Schema;
use crate::value::{MessageMap, Value};
use crate::varint::{decode_varint, zigzag_decode_32};
use crate::wire::{field, Tag, WireType, WIRE_MASK};

/// Decodes one message buffer against a schema.
#[derive(Debug)]
pub struct Decoder<'a> {
    schema: &'a Schema,
    r: BitReader<'a>,
    /// Declaration indices scheduled by the attribute byte, consumed
    /// front-to-back as records are decoded.
    pending: VecDeque<usize>,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder over the provided buffer.
    pub fn new(schema: &'a Schema, data: &'a [u8]) -> Self {
        Decoder {
            schema,
            r: BitReader::new(data),
            pending: VecDeque::new(),
        }
    }

    /// Runs the decode to completion, returning the raw decoded mapping
    /// (including the `"type"` entry).
    ///
    /// The mapping is not normalized or validated against the schema;
    /// [`serialize`](crate::serialize::serialize) composes those steps.
    pub fn decode(mut self) -> Result<MessageMap, MessageError> {
        let mut message = MessageMap::new();

        // READ_IDENT: the message must open with a TYPE-wire tag.
        let first = self.r.peek_bits(8)? as u8;
        if first & WIRE_MASK != WireType::Type.into_val() {
            return Err(MessageError::InvalidMessage { found: first });
        }
        self.r.read_bits(8)?;
        let name = self.read_string_body()?;
        message.insert("type".to_string(), Value::String(name));

        // READ_ATTRS: schedule set bits in ascending bit-position order.
        let attributes = self.r.read_bits(8)? as u8;
        for idx in 0..8 {
            if attributes & (1 << idx) != 0 {
                self.pending.push_back(idx);
            }
        }

        // READ_RECORD*: each record pairs with the next scheduled field.
        while self.r.position() < self.r.len_bits() {
            let value = self.decode_record()?;
            let idx = self.pending.pop_front().ok_or_else(|| {
                MessageError::TypeMismatch {
                    expected: "records matching the attribute bitmap".to_string(),
                    found: "a record with no scheduled attribute".to_string(),
                }
            })?;
            let field = self
                .schema
                .field_at(idx)
                .ok_or_else(|| MessageError::TypeMismatch {
                    expected: format!(
                        "attribute bits within the {} declared fields",
                        self.schema.fields().len()
                    ),
                    found: format!("bit position {}", 1u16 << idx),
                })?;
            message.insert(field.key().to_string(), value);
        }

        Ok(message)
    }

    /// Decodes one `tag ‖ body` record, dispatching on the peeked tag.
    fn decode_record(&mut self) -> Result<Value, MessageError> {
        let tag = Tag::from_byte(self.r.peek_bits(8)? as u8);
        match tag.wire_type()? {
            WireType::Varint => {
                self.r.read_bits(8)?;
                self.decode_varint_body(tag.field())
            }
            WireType::I64 => {
                if tag.field() != field::FIXED64 {
                    return Err(MessageError::UnknownWire {
                        wire: WireType::I64.into_val(),
                        field: tag.field(),
                    });
                }
                self.r.read_bits(8)?;
                Ok(Value::Float(self.r.read_f64()?))
            }
            WireType::Len => {
                self.r.read_bits(8)?;
                match tag.field() {
                    field::PACKED => Ok(Value::List(self.decode_packed_body()?)),
                    field::STRING => Ok(Value::String(self.read_string_body()?)),
                    other => Err(MessageError::UnknownWire {
                        wire: WireType::Len.into_val(),
                        field: other,
                    }),
                }
            }
            // A second identifier mid-message has no registered decoder.
            WireType::Type => Err(MessageError::UnknownWire {
                wire: WireType::Type.into_val(),
                field: tag.field(),
            }),
        }
    }

    /// Decodes a varint body into the value its wire field selects.
    fn decode_varint_body(&mut self, wire_field: u8) -> Result<Value, MessageError> {
        let raw = decode_varint(&mut self.r)?;
        match wire_field {
            field::INT32 => i32::try_from(raw)
                .map(Value::Int)
                .map_err(|_| int_overflow(raw)),
            field::SINT32 => u32::try_from(raw)
                .map(|v| Value::Int(zigzag_decode_32(v)))
                .map_err(|_| int_overflow(raw)),
            field::BOOL => Ok(Value::Bool(raw != 0)),
            other => Err(MessageError::UnknownWire {
                wire: WireType::Varint.into_val(),
                field: other,
            }),
        }
    }

    /// Reads a length prefix: an int32 record whose tag byte is consumed
    /// without inspection.
    fn read_len_prefix(&mut self) -> Result<usize, MessageError> {
        self.r.read_bits(8)?;
        let len = decode_varint(&mut self.r)?;
        usize::try_from(len).map_err(|_| MessageError::TruncatedInput {
            needed: usize::MAX,
            remaining: self.r.remaining(),
        })
    }

    /// Reads a length-prefixed UTF-8 string body.
    fn read_string_body(&mut self) -> Result<String, MessageError> {
        let len = self.read_len_prefix()?;
        let bytes = self.r.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|_| MessageError::InvalidUtf8)
    }

    /// Decodes a packed-list body: `tag ‖ body` element records until the
    /// length-prefixed region is exhausted.
    fn decode_packed_body(&mut self) -> Result<Vec<Value>, MessageError> {
        let len = self.read_len_prefix()?;
        let region = len.saturating_mul(8);
        if region > self.r.remaining() {
            return Err(MessageError::TruncatedInput {
                needed: region,
                remaining: self.r.remaining(),
            });
        }

        let end = self.r.position() + region;
        let mut items = Vec::new();
        while self.r.position() < end {
            let tag = Tag::from_byte(self.r.peek_bits(8)? as u8);
            if tag.wire_val() == WireType::Len.into_val() && tag.field() == field::PACKED {
                return Err(MessageError::TypeMismatch {
                    expected: "a primitive packed element".to_string(),
                    found: "a nested packed list".to_string(),
                });
            }
            items.push(self.decode_record()?);
        }
        Ok(items)
    }
}

fn int_overflow(raw: u64) -> MessageError {
    MessageError::TypeMismatch {
        expected: "an integer within 32-bit range".to_string(),
        found: format!("varint {raw}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_message;
    use crate::field::Field;

    fn schema() -> Schema {
        Schema::builder("TestMessage")
            .field("flag", Field::bool())
            .field("num", Field::int())
            .field("text", Field::string())
            .build()
            .unwrap()
    }

    fn decode(schema: &Schema, data: &[u8]) -> Result<MessageMap, MessageError> {
        Decoder::new(schema, data).decode()
    }

    #[test]
    fn test_decode_simple_message() {
        let schema = schema();
        let mut message = MessageMap::new();
        message.insert("num".into(), Value::Int(144));
        message.insert("text".into(), Value::from("Hello World"));
        let data = encode_message(&schema, &message).unwrap();

        let decoded = decode(&schema, &data).unwrap();
        assert_eq!(decoded.get("num"), Some(&Value::Int(144)));
        assert_eq!(decoded.get("text"), Some(&Value::from("Hello World")));
        assert_eq!(
            decoded.get("type"),
            Some(&Value::String("TestMessage".into()))
        );
        assert_eq!(decoded.get("flag"), None);
    }

    #[test]
    fn test_decode_negative_int() {
        let schema = schema();
        let mut message = MessageMap::new();
        message.insert("num".into(), Value::Int(-3000));
        let data = encode_message(&schema, &message).unwrap();
        let decoded = decode(&schema, &data).unwrap();
        assert_eq!(decoded.get("num"), Some(&Value::Int(-3000)));
    }

    #[test]
    fn test_missing_identifier() {
        let schema = schema();
        // Wire bits of the first byte are Varint, not Type.
        let err = decode(&schema, &[0x88, 0x00]).unwrap_err();
        assert_eq!(err, MessageError::InvalidMessage { found: 0x88 });
        assert_eq!(err.code(), 3101);
    }

    #[test]
    fn test_empty_buffer() {
        let schema = schema();
        assert!(matches!(
            decode(&schema, &[]).unwrap_err(),
            MessageError::TruncatedInput { .. }
        ));
    }

    #[test]
    fn test_empty_message_decodes_to_type_only() {
        let schema = schema();
        let data = encode_message(&schema, &MessageMap::new()).unwrap();
        let decoded = decode(&schema, &data).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(
            decoded.get("type"),
            Some(&Value::String("TestMessage".into()))
        );
    }

    #[test]
    fn test_truncated_record() {
        let schema = schema();
        let mut message = MessageMap::new();
        message.insert("text".into(), Value::from("Hello World"));
        let data = encode_message(&schema, &message).unwrap();

        let err = decode(&schema, &data[..data.len() - 1]).unwrap_err();
        assert!(matches!(err, MessageError::TruncatedInput { .. }));
    }

    #[test]
    fn test_unknown_wire_in_records() {
        let schema = schema();
        // Identifier for "TestMessage", one attribute, then a tag whose
        // wire bits (3) have no registered decoder.
        let mut data = vec![0x97, 0x88, 0x0b];
        data.extend_from_slice(b"TestMessage");
        data.push(0b0000_0001);
        data.push(0b1_0001_011);
        let err = decode(&schema, &data).unwrap_err();
        assert!(matches!(err, MessageError::UnknownWire { wire: 3, .. }));
        assert_eq!(err.code(), 3103);
    }

    #[test]
    fn test_invalid_utf8_identifier() {
        let data = [0x97, 0x88, 0x02, 0xff, 0xfe];
        let schema = schema();
        assert_eq!(
            decode(&schema, &data).unwrap_err(),
            MessageError::InvalidUtf8
        );
    }

    #[test]
    fn test_record_without_scheduled_attribute() {
        let schema = schema();
        // Identifier, empty attribute byte, then a bool record anyway.
        let mut data = vec![0x97, 0x88, 0x0b];
        data.extend_from_slice(b"TestMessage");
        data.push(0x00);
        data.extend_from_slice(&[0x98, 0x01]);
        let err = decode(&schema, &data).unwrap_err();
        assert_eq!(err.code(), 3014);
    }

    #[test]
    fn test_attribute_bit_beyond_schema() {
        let schema = schema();
        // Bit 2^3 is set but the schema declares only three fields.
        let mut data = vec![0x97, 0x88, 0x0b];
        data.extend_from_slice(b"TestMessage");
        data.push(0b0000_1000);
        data.extend_from_slice(&[0x98, 0x01]);
        let err = decode(&schema, &data).unwrap_err();
        assert_eq!(err.code(), 3014);
    }

    #[test]
    fn test_nested_packed_rejected() {
        let schema = Schema::builder("TestMessage")
            .field("items", Field::list([Field::int()]))
            .build()
            .unwrap();
        // A packed region whose first element tag is itself packed.
        let mut data = vec![0x97, 0x88, 0x0b];
        data.extend_from_slice(b"TestMessage");
        data.push(0b0000_0001);
        data.extend_from_slice(&[0x8a, 0x88, 0x03, 0x8a, 0x88, 0x00]);
        let err = decode(&schema, &data).unwrap_err();
        assert_eq!(err.code(), 3014);
    }

    #[test]
    fn test_records_pair_in_ascending_bit_order() {
        let schema = schema();
        let mut message = MessageMap::new();
        message.insert("flag".into(), Value::Bool(true));
        message.insert("num".into(), Value::Int(7));
        message.insert("text".into(), Value::from("x"));
        let data = encode_message(&schema, &message).unwrap();

        // attrs byte covers bits 2^0..2^2
        assert_eq!(data[14], 0b0000_0111);

        let decoded = decode(&schema, &data).unwrap();
        assert_eq!(decoded.get("flag"), Some(&Value::Bool(true)));
        assert_eq!(decoded.get("num"), Some(&Value::Int(7)));
        assert_eq!(decoded.get("text"), Some(&Value::from("x")));
    }
}
