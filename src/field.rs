//! Typed field descriptors.
//!
//! A [`Field`] describes one slot of a schema: its primitive kind, whether a
//! value is required, an optional default, and for lists the ordered
//! sub-fields its elements are matched against. Descriptors are built with
//! the constructors here and become immutable once bound into a
//! [`Schema`](crate::schema::Schema).

use smallvec::SmallVec;

use crate::validate::Validator;
use crate::value::{DataType, Value};
use crate::wire::{self, WireType};

/// Field storage sized for the 8-field schema limit.
pub(crate) type FieldVec = SmallVec<[Field; 8]>;

/// The primitive kind of a [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Boolean, encoded as a one-byte varint record.
    Bool,
    /// Signed 32-bit integer. The wire field is selected per encode:
    /// `int32` for non-negative values, `sint32` (zig-zag) for negative.
    Int,
    /// IEEE-754 double, encoded as a fixed 8-byte record.
    Float,
    /// UTF-8 string, length-delimited.
    String,
    /// Packed list of primitives. Elements are matched against
    /// `sub_fields`; in `sorted` mode the match is positional, otherwise
    /// it is by multiset of data types.
    List {
        /// Ordered element descriptors, at least one.
        sub_fields: Vec<Field>,
        /// Positional (`true`) versus multiset (`false`) element matching.
        sorted: bool,
    },
    /// The synthetic message-type identifier. Attached by the schema, never
    /// declared by users.
    MessageType,
}

/// One typed slot of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub(crate) key: String,
    pub(crate) kind: FieldKind,
    pub(crate) required: bool,
    pub(crate) default: Option<Value>,
    /// Ordered validator chain, built when the schema binds the field.
    pub(crate) validators: Vec<Validator>,
}

impl Field {
    fn new(kind: FieldKind) -> Self {
        Field {
            key: String::new(),
            kind,
            required: false,
            default: None,
            validators: Vec::new(),
        }
    }

    /// A boolean field.
    pub fn bool() -> Self {
        Field::new(FieldKind::Bool)
    }

    /// A signed 32-bit integer field.
    pub fn int() -> Self {
        Field::new(FieldKind::Int)
    }

    /// An IEEE-754 double field.
    pub fn float() -> Self {
        Field::new(FieldKind::Float)
    }

    /// A UTF-8 string field.
    pub fn string() -> Self {
        Field::new(FieldKind::String)
    }

    /// A packed list field with positional (`sorted`) element matching.
    ///
    /// Lists must declare at least one sub-field; an empty declaration is
    /// rejected when the schema is built.
    pub fn list<I>(sub_fields: I) -> Self
    where
        I: IntoIterator<Item = Field>,
    {
        Field::new(FieldKind::List {
            sub_fields: sub_fields.into_iter().collect(),
            sorted: true,
        })
    }

    /// The synthetic type-identifier field for the named schema.
    pub(crate) fn message_type(schema_name: &str) -> Self {
        let mut field = Field::new(FieldKind::MessageType);
        field.key = "type".to_string();
        field.default = Some(Value::String(schema_name.to_string()));
        field
    }

    /// Marks this field as required: a missing value fails validation.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the value used when the field is absent from an input mapping.
    ///
    /// The default must match the field's data type; mismatches are rejected
    /// when the schema is built.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Switches a list field to multiset element matching.
    ///
    /// Has no effect on other kinds.
    pub fn unsorted(mut self) -> Self {
        if let FieldKind::List { sorted, .. } = &mut self.kind {
            *sorted = false;
        }
        self
    }

    /// The key this field was bound under, empty before binding.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The primitive kind of this field.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Whether a value for this field is required.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The default value, if one was declared.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The semantic primitive category this field holds.
    pub fn data_type(&self) -> DataType {
        match &self.kind {
            FieldKind::Bool => DataType::Bool,
            FieldKind::Int => DataType::Int,
            FieldKind::Float => DataType::Float,
            FieldKind::String | FieldKind::MessageType => DataType::String,
            FieldKind::List { .. } => DataType::List,
        }
    }

    /// The wire type records of this field are framed with.
    pub(crate) fn wire(&self) -> WireType {
        match &self.kind {
            FieldKind::Bool | FieldKind::Int => WireType::Varint,
            FieldKind::Float => WireType::I64,
            FieldKind::String | FieldKind::List { .. } => WireType::Len,
            FieldKind::MessageType => WireType::Type,
        }
    }

    /// The declared sub-fields, empty for non-list kinds.
    pub fn sub_fields(&self) -> &[Field] {
        match &self.kind {
            FieldKind::List { sub_fields, .. } => sub_fields,
            _ => &[],
        }
    }

    /// Whether list elements are matched positionally. Non-list kinds
    /// report `true`.
    pub fn is_sorted(&self) -> bool {
        match &self.kind {
            FieldKind::List { sorted, .. } => *sorted,
            _ => true,
        }
    }
}

/// Selects the varint wire field for an integer value: `int32` for
/// non-negative values, `sint32` (zig-zag) for negative.
///
/// A pure function of the value so concurrent encodes against the same
/// schema never race on descriptor state.
#[inline(always)]
pub(crate) fn int_wire_field(value: i32) -> u8 {
    if value >= 0 {
        wire::field::INT32
    } else {
        wire::field::SINT32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_options() {
        let field = Field::int().required().default_value(7);
        assert!(field.is_required());
        assert_eq!(field.default(), Some(&Value::Int(7)));
        assert_eq!(field.data_type(), DataType::Int);
    }

    #[test]
    fn test_list_sorting() {
        let sorted = Field::list([Field::int(), Field::float()]);
        assert!(sorted.is_sorted());
        assert_eq!(sorted.sub_fields().len(), 2);

        let unsorted = Field::list([Field::int()]).unsorted();
        assert!(!unsorted.is_sorted());

        // `unsorted` is meaningless on primitives and leaves them alone.
        assert!(Field::bool().unsorted().is_sorted());
    }

    #[test]
    fn test_wire_derivation() {
        assert_eq!(Field::bool().wire(), WireType::Varint);
        assert_eq!(Field::int().wire(), WireType::Varint);
        assert_eq!(Field::float().wire(), WireType::I64);
        assert_eq!(Field::string().wire(), WireType::Len);
        assert_eq!(Field::list([Field::int()]).wire(), WireType::Len);
        assert_eq!(Field::message_type("Test").wire(), WireType::Type);
    }

    #[test]
    fn test_int_wire_field_selection() {
        assert_eq!(int_wire_field(0), wire::field::INT32);
        assert_eq!(int_wire_field(144), wire::field::INT32);
        assert_eq!(int_wire_field(-1), wire::field::SINT32);
        assert_eq!(int_wire_field(i32::MIN), wire::field::SINT32);
    }

    #[test]
    fn test_message_type_field() {
        let field = Field::message_type("TestMessage");
        assert_eq!(field.key(), "type");
        assert_eq!(field.data_type(), DataType::String);
        assert_eq!(
            field.default(),
            Some(&Value::String("TestMessage".to_string()))
        );
    }
}
