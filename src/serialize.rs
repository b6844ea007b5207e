//! Serializer dispatch: one entry point for both directions.
//!
//! A mapping input runs the encode path, a byte input runs the decode
//! path; both return the normalized mapping together with the encoded
//! bytes. Normalization fills declared keys from the input or the field's
//! default, elides absent values, ignores undeclared keys, and runs every
//! field's validator chain.

use bytes::Bytes;

use crate::decode::Decoder;
use crate::encode::encode_message;
use crate::error::MessageError;
use crate::schema::Schema;
use crate::validate;
use crate::value::{MessageMap, Value};

/// Input accepted by [`serialize`]: a mapping to encode or bytes to
/// decode.
#[derive(Debug, Clone)]
pub enum Input {
    /// A field mapping; runs the encode path.
    Mapping(MessageMap),
    /// An encoded buffer; runs the decode path.
    Bytes(Bytes),
}

impl From<MessageMap> for Input {
    fn from(message: MessageMap) -> Self {
        Input::Mapping(message)
    }
}

impl From<Bytes> for Input {
    fn from(data: Bytes) -> Self {
        Input::Bytes(data)
    }
}

impl From<Vec<u8>> for Input {
    fn from(data: Vec<u8>) -> Self {
        Input::Bytes(Bytes::from(data))
    }
}

impl From<&[u8]> for Input {
    fn from(data: &[u8]) -> Self {
        Input::Bytes(Bytes::copy_from_slice(data))
    }
}

impl TryFrom<Value> for Input {
    type Error = MessageError;

    /// A bare [`Value`] is neither a mapping nor bytes, so there is no
    /// serializer for it. This is the dynamic tail of the dispatch chain
    /// for callers funneling loosely-typed data.
    fn try_from(value: Value) -> Result<Self, MessageError> {
        Err(MessageError::UnsupportedInputType {
            found: value.data_type().name().to_string(),
        })
    }
}

/// Serializes `input` against `schema`.
///
/// * mapping → `(normalized mapping, encoded bytes)`
/// * bytes → `(decoded normalized mapping, the input bytes)`
///
/// Values are validated against the schema in both directions; the decode
/// direction is where a foreign identifier string surfaces as a type
/// mismatch.
pub fn serialize(
    schema: &Schema,
    input: impl Into<Input>,
) -> Result<(MessageMap, Bytes), MessageError> {
    match input.into() {
        Input::Mapping(message) => {
            let message = normalize(schema, &message)?;
            let data = encode_message(schema, &message)?;
            Ok((message, data))
        }
        Input::Bytes(data) => {
            let decoded = Decoder::new(schema, &data).decode()?;
            let message = normalize(schema, &decoded)?;
            Ok((message, data))
        }
    }
}

impl Schema {
    /// Serializes a mapping or a byte buffer against this schema.
    ///
    /// Convenience for [`serialize`].
    pub fn load(&self, input: impl Into<Input>) -> Result<(MessageMap, Bytes), MessageError> {
        serialize(self, input)
    }
}

/// Produces the normalized mapping: every declared key resolved to its
/// input value or default, validated, with absent values elided.
fn normalize(schema: &Schema, input: &MessageMap) -> Result<MessageMap, MessageError> {
    let mut message = MessageMap::new();

    let type_field = schema.type_field();
    let type_value = input
        .get(type_field.key())
        .or(type_field.default())
        .cloned();
    validate::verify(type_field, type_value.as_ref(), schema.name())?;
    if let Some(value) = type_value {
        message.insert(type_field.key().to_string(), value);
    }

    for field in schema.fields() {
        let value = input.get(field.key()).or(field.default()).cloned();
        validate::verify(field, value.as_ref(), schema.name())?;
        if let Some(value) = value {
            message.insert(field.key().to_string(), value);
        }
    }

    Ok(message)
}
