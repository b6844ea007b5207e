//! Error taxonomy for schema construction, validation, encoding, and
//! decoding.
//!
//! Every error kind carries a stable numeric code, exposed via
//! [`MessageError::code`]. Codes `3013`-`3017` and `3101` predate this
//! implementation and are kept for compatibility with existing callers;
//! the remaining kinds are numbered contiguously after them.

/// The single error type surfaced by this crate.
///
/// Validators and decoders do not catch: the caller of an encode or decode
/// receives exactly one kind per failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MessageError {
    /// A field marked `required` had no value and no default.
    #[error("expected required message field {key:?}")]
    RequiredMessageField {
        /// Key of the missing field.
        key: String,
    },

    /// A value did not match the shape something expected of it.
    #[error("expected {expected} but found {found}")]
    TypeMismatch {
        /// What was expected, e.g. a data type or a message name.
        expected: String,
        /// What was actually found.
        found: String,
    },

    /// A list field reached validation with no declared sub-fields.
    #[error("list field must declare at least one sub-field")]
    EmptyListField,

    /// A list held more elements than its field declares sub-fields.
    #[error("too many values: expected {expected} but found {found}")]
    TooManyValues {
        /// Number of declared sub-fields.
        expected: usize,
        /// Number of elements in the offending list.
        found: usize,
    },

    /// A field descriptor had no primitive data type.
    #[error("field is missing a primitive data type")]
    MissingPrimitive,

    /// A schema declared more than eight user fields.
    #[error("schema {name:?} declares {found} fields but at most 8 are supported")]
    SchemaTooWide {
        /// Name of the offending schema.
        name: String,
        /// Number of fields it declared.
        found: usize,
    },

    /// A schema tried to declare the protected key `"type"`.
    #[error("attempted to overwrite protected field \"type\"")]
    ReservedKey,

    /// A schema declared the same key twice.
    #[error("field key {key:?} is declared twice")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },

    /// The serializer was handed something that is neither a mapping nor
    /// bytes.
    #[error("no serializer exists for input of type {found}")]
    UnsupportedInputType {
        /// Description of the rejected input.
        found: String,
    },

    /// A buffer did not begin with the 8-bit message identifier tag.
    #[error("message must begin with the identifier tag 10010111 but found {found:08b}")]
    InvalidMessage {
        /// The first byte of the buffer.
        found: u8,
    },

    /// A read extended past the end of the buffer.
    #[error("unexpected end of buffer: needed {needed} bits but only {remaining} remain")]
    TruncatedInput {
        /// Bits the read required.
        needed: usize,
        /// Bits left in the buffer.
        remaining: usize,
    },

    /// A tag byte carried a wire code no decoder is registered for.
    #[error("unknown wire code {wire}/{field}")]
    UnknownWire {
        /// Raw wire-type bits.
        wire: u8,
        /// Raw wire-field bits.
        field: u8,
    },

    /// A string body was not valid UTF-8.
    #[error("invalid UTF-8 in string record")]
    InvalidUtf8,
}

impl MessageError {
    /// Returns the stable numeric code for this error kind.
    pub const fn code(&self) -> u16 {
        match self {
            MessageError::RequiredMessageField { .. } => 3013,
            MessageError::TypeMismatch { .. } => 3014,
            MessageError::EmptyListField => 3015,
            MessageError::TooManyValues { .. } => 3016,
            MessageError::MissingPrimitive => 3017,
            MessageError::SchemaTooWide { .. } => 3018,
            MessageError::ReservedKey => 3019,
            MessageError::DuplicateKey { .. } => 3020,
            MessageError::UnsupportedInputType { .. } => 3021,
            MessageError::InvalidMessage { .. } => 3101,
            MessageError::TruncatedInput { .. } => 3102,
            MessageError::UnknownWire { .. } => 3103,
            MessageError::InvalidUtf8 => 3104,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MessageError::TooManyValues {
            expected: 2,
            found: 3,
        };
        assert_eq!(format!("{err}"), "too many values: expected 2 but found 3");

        let err = MessageError::InvalidMessage { found: 0b0001_0010 };
        assert_eq!(
            format!("{err}"),
            "message must begin with the identifier tag 10010111 but found 00010010"
        );

        let err = MessageError::RequiredMessageField { key: "num".into() };
        assert_eq!(format!("{err}"), "expected required message field \"num\"");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            MessageError::RequiredMessageField { key: String::new() }.code(),
            3013
        );
        assert_eq!(
            MessageError::TypeMismatch {
                expected: String::new(),
                found: String::new(),
            }
            .code(),
            3014
        );
        assert_eq!(MessageError::InvalidMessage { found: 0 }.code(), 3101);
        assert_eq!(MessageError::InvalidUtf8.code(), 3104);
    }
}
