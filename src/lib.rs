//! Schema-driven binary message codec over a length-prefixed tag-wire
//! encoding.
//!
//! A [`Schema`] declares a message as a named, ordered set of up to eight
//! typed fields. From it the crate derives a bit-packed byte encoding, a
//! decoder that reconstructs the original mapping, and a validation layer
//! enforcing presence, types, and list composition.
//!
//! # Example
//!
//! ```
//! use tagwire::{serialize, Field, MessageMap, Schema, Value};
//!
//! let schema = Schema::builder("Greeting")
//!     .field("count", Field::int())
//!     .field("text", Field::string().required())
//!     .build()?;
//!
//! let mut message = MessageMap::new();
//! message.insert("count".into(), Value::Int(144));
//! message.insert("text".into(), Value::from("Hello World"));
//!
//! // A mapping encodes; the resulting bytes decode back to the mapping.
//! let (sent, data) = serialize(&schema, message)?;
//! let (received, _) = serialize(&schema, data)?;
//! assert_eq!(sent, received);
//! assert_eq!(received.get("type"), Some(&Value::String("Greeting".into())));
//! # Ok::<(), tagwire::MessageError>(())
//! ```

// Publically export `bits` and `varint` so the primitives are usable on
// their own.
pub mod bits;
pub mod varint;
pub mod wire;

pub mod decode;
pub mod encode;
mod error;
mod field;
mod schema;
mod serialize;
mod validate;
mod value;

pub use decode::Decoder;
pub use encode::encode_message;
pub use error::MessageError;
pub use field::{Field, FieldKind};
pub use schema::{Schema, SchemaBuilder, MAX_FIELDS};
pub use serialize::{serialize, Input};
pub use validate::Validator;
pub use value::{DataType, MessageMap, Value};
