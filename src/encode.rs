//! Message encoding: schema-aware mapping → bytes.
//!
//! An encoded message is `identifier ‖ attributes ‖ records`. The
//! identifier is the schema name framed as a TYPE-wire string. The
//! attribute byte has bit `2^i` set iff the i-th declared field carries a
//! value; the records follow in declaration order, which is ascending
//! bit-position order.
//!
//! Every length-delimited body starts with its byte length framed as an
//! int32 record (`0x88` tag, then a varint), a quirk of the wire format
//! kept for compatibility with existing buffers.

use bytes::Bytes;

use crate::bits::BitWriter;
use crate::error::MessageError;
use crate::field::{int_wire_field, Field};
use crate::schema::Schema;
use crate::value::{MessageMap, Value};
use crate::varint::{encode_varint, zigzag_encode_32};
use crate::wire::{field, Tag, WireType};

/// Encodes a message mapping against its schema.
///
/// The mapping is expected to be normalized and validated;
/// [`serialize`](crate::serialize::serialize) composes those steps. The
/// identifier string is taken from the mapping's `"type"` entry, falling
/// back to the schema name.
pub fn encode_message(schema: &Schema, message: &MessageMap) -> Result<Bytes, MessageError> {
    let mut records = BitWriter::new();
    let mut attributes: u8 = 0;

    for (idx, field) in schema.fields().iter().enumerate() {
        if let Some(value) = message.get(field.key()) {
            encode_record(&mut records, field, value)?;
            attributes |= 1 << idx;
        }
    }
    let records = records.seal();

    let name = match message.get("type") {
        Some(Value::String(name)) => name.as_str(),
        _ => schema.name(),
    };

    let mut w = BitWriter::with_capacity(name.len() + records.len() + 8);
    encode_string(&mut w, name, WireType::Type);
    w.write_bits(u64::from(attributes), 8);
    w.write_bytes(&records);
    Ok(w.seal())
}

/// Encodes one `tag ‖ body` record for a field's value.
fn encode_record(w: &mut BitWriter, field: &Field, value: &Value) -> Result<(), MessageError> {
    match value {
        Value::List(items) => encode_packed(w, field, items),
        primitive => encode_element(w, primitive),
    }
}

/// Encodes a primitive `tag ‖ body` record, selecting the wire pair from
/// the value itself.
fn encode_element(w: &mut BitWriter, value: &Value) -> Result<(), MessageError> {
    match value {
        Value::Bool(v) => {
            write_tag(w, Tag::new(field::BOOL, WireType::Varint));
            w.write_bits(u64::from(*v), 8);
        }
        Value::Int(v) => encode_int(w, *v),
        Value::Float(v) => {
            write_tag(w, Tag::new(field::FIXED64, WireType::I64));
            w.write_f64(*v);
        }
        Value::String(v) => encode_string(w, v, WireType::Len),
        Value::List(_) => {
            return Err(MessageError::TypeMismatch {
                expected: "a primitive packed element".to_string(),
                found: "a nested list".to_string(),
            });
        }
    }
    Ok(())
}

/// Encodes an integer record. The wire field is chosen per encode:
/// `int32` for non-negative values, `sint32` (zig-zag) for negative.
fn encode_int(w: &mut BitWriter, value: i32) {
    match int_wire_field(value) {
        field::SINT32 => {
            write_tag(w, Tag::new(field::SINT32, WireType::Varint));
            encode_varint(u64::from(zigzag_encode_32(value)), w);
        }
        _ => {
            write_tag(w, Tag::new(field::INT32, WireType::Varint));
            encode_varint(value as u64, w);
        }
    }
}

/// Encodes a string record under the given wire type: LEN for user
/// fields, TYPE for the message identifier.
fn encode_string(w: &mut BitWriter, value: &str, wire: WireType) {
    write_tag(w, Tag::new(field::STRING, wire));
    encode_len_prefix(w, value.len());
    w.write_bytes(value.as_bytes());
}

/// Encodes a packed-list record: elements are encoded back to back, their
/// bit positions not represented, and the body is length-prefixed.
fn encode_packed(w: &mut BitWriter, list: &Field, items: &[Value]) -> Result<(), MessageError> {
    let sub_fields = list.sub_fields();
    if items.len() > sub_fields.len() {
        return Err(MessageError::TooManyValues {
            expected: sub_fields.len(),
            found: items.len(),
        });
    }

    let mut body = BitWriter::new();
    for item in items {
        encode_element(&mut body, item)?;
    }
    let body = body.seal();

    write_tag(w, Tag::new(field::PACKED, WireType::Len));
    encode_len_prefix(w, body.len());
    w.write_bytes(&body);
    Ok(())
}

/// Writes a length prefix framed as an int32 record.
fn encode_len_prefix(w: &mut BitWriter, byte_len: usize) {
    write_tag(w, Tag::new(field::INT32, WireType::Varint));
    encode_varint(byte_len as u64, w);
}

#[inline(always)]
fn write_tag(w: &mut BitWriter, tag: Tag) {
    w.write_bits(u64::from(tag.byte()), 8);
}
