//! Schema binding: a named message as an ordered sequence of keyed fields.
//!
//! A schema is built once with [`SchemaBuilder`] and immutable afterwards.
//! Binding assigns each field its key and bit position (`2^i` for the i-th
//! declared field), composes the validator chains, and appends the
//! synthetic type-identifier field whose default is the schema's name.

use crate::error::MessageError;
use crate::field::{Field, FieldVec};
use crate::validate;

/// Maximum number of user fields a schema can declare; one bit of the
/// attribute byte per field.
pub const MAX_FIELDS: usize = 8;

/// An immutable, named message schema.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: FieldVec,
    type_field: Field,
}

impl Schema {
    /// Starts building a schema with the given message name.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            all_required: false,
            fields: FieldVec::new(),
        }
    }

    /// The message name, carried on the wire as the identifier string.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The user fields in declaration order. The i-th field owns bit
    /// position `2^i` of the attribute byte.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The synthetic type-identifier field.
    pub(crate) fn type_field(&self) -> &Field {
        &self.type_field
    }

    /// The field at the given declaration index, if one exists.
    pub(crate) fn field_at(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }
}

/// Builds a [`Schema`] from an ordered list of `(key, field)` pairs.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    all_required: bool,
    fields: FieldVec,
}

impl SchemaBuilder {
    /// Declares the next field under `key`. Declaration order fixes the
    /// field's bit position.
    pub fn field(mut self, key: impl Into<String>, mut field: Field) -> Self {
        field.key = key.into();
        self.fields.push(field);
        self
    }

    /// Marks every declared field as required.
    pub fn all_required(mut self) -> Self {
        self.all_required = true;
        self
    }

    /// Finishes the schema, checking the binding rules.
    pub fn build(self) -> Result<Schema, MessageError> {
        let SchemaBuilder {
            name,
            all_required,
            mut fields,
        } = self;

        if fields.len() > MAX_FIELDS {
            return Err(MessageError::SchemaTooWide {
                name,
                found: fields.len(),
            });
        }

        for idx in 0..fields.len() {
            if fields[idx].key == "type" {
                return Err(MessageError::ReservedKey);
            }
            if fields[..idx].iter().any(|f| f.key == fields[idx].key) {
                return Err(MessageError::DuplicateKey {
                    key: fields[idx].key.clone(),
                });
            }
            if all_required {
                fields[idx].required = true;
            }
            bind(&mut fields[idx])?;
        }

        let mut type_field = Field::message_type(&name);
        type_field.validators = validate::chain_for(&type_field);

        Ok(Schema {
            name,
            fields,
            type_field,
        })
    }
}

/// Binds a field and, recursively, its sub-fields: checks the default's
/// type and composes the validator chain.
fn bind(field: &mut Field) -> Result<(), MessageError> {
    if let Some(default) = &field.default {
        if default.data_type() != field.data_type() {
            return Err(MessageError::TypeMismatch {
                expected: format!("a default of type {}", field.data_type()),
                found: default.data_type().name().to_string(),
            });
        }
    }

    field.validators = validate::chain_for(field);

    let parent = field.key.clone();
    if let crate::field::FieldKind::List { sub_fields, .. } = &mut field.kind {
        for (idx, sub) in sub_fields.iter_mut().enumerate() {
            if sub.key.is_empty() {
                sub.key = format!("{parent}[{idx}]");
            }
            bind(sub)?;
        }
    }
    Ok(())
}
