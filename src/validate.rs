//! Composable field validators.
//!
//! Each field carries an ordered chain of [`Validator`]s, applied in
//! iteration with a short circuit on the first failure. The chain is
//! composed when a schema binds the field:
//!
//! * every field gets [`Validator::FieldType`], except unsorted lists which
//!   get [`Validator::Unordered`] in its place;
//! * `required` fields get [`Validator::Required`] prepended;
//! * lists additionally get [`Validator::SubFields`] and
//!   [`Validator::Overflow`];
//! * the synthetic type-identifier field gets [`Validator::MessageType`]
//!   alone.

use crate::error::MessageError;
use crate::field::{Field, FieldKind};
use crate::value::{DataType, Value};

/// A single verification step in a field's chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    /// The value must be present.
    Required,
    /// A present value must match the field's data type.
    FieldType,
    /// A list field must declare at least one primitive sub-field.
    SubFields,
    /// A list must not hold more elements than declared sub-fields.
    Overflow,
    /// List elements must match the sub-field data types as a multiset.
    Unordered,
    /// The value must equal the schema's name.
    MessageType,
}

/// Builds the validator chain for a bound field.
pub(crate) fn chain_for(field: &Field) -> Vec<Validator> {
    if matches!(field.kind, FieldKind::MessageType) {
        return vec![Validator::MessageType];
    }

    let mut chain = Vec::with_capacity(4);
    if field.required {
        chain.push(Validator::Required);
    }
    if field.is_sorted() {
        chain.push(Validator::FieldType);
    } else {
        chain.push(Validator::Unordered);
    }
    if matches!(field.kind, FieldKind::List { .. }) {
        chain.push(Validator::SubFields);
        chain.push(Validator::Overflow);
    }
    chain
}

/// Runs a field's chain against a value, then recurses into sorted list
/// elements positionally.
///
/// `value` is `None` when the field is absent from the mapping; every
/// validator except [`Validator::Required`] and [`Validator::MessageType`]
/// lets an absent value through.
pub(crate) fn verify(
    field: &Field,
    value: Option<&Value>,
    schema_name: &str,
) -> Result<(), MessageError> {
    for validator in &field.validators {
        validator.verify(field, value, schema_name)?;
    }

    // Sorted lists validate each sub-field's own chain against the element
    // at its position; a required sub-field with no element at its index
    // fails here.
    if let FieldKind::List {
        sub_fields,
        sorted: true,
    } = &field.kind
    {
        if let Some(Value::List(items)) = value {
            for (idx, sub) in sub_fields.iter().enumerate() {
                verify(sub, items.get(idx), schema_name)?;
            }
        }
    }

    Ok(())
}

impl Validator {
    fn verify(
        self,
        field: &Field,
        value: Option<&Value>,
        schema_name: &str,
    ) -> Result<(), MessageError> {
        match self {
            Validator::Required => match value {
                Some(_) => Ok(()),
                None => Err(MessageError::RequiredMessageField {
                    key: field.key.clone(),
                }),
            },
            Validator::FieldType => match value {
                None => Ok(()),
                Some(v) if v.data_type() == field.data_type() => Ok(()),
                Some(v) => Err(type_mismatch(field.data_type(), v.data_type())),
            },
            Validator::SubFields => {
                let sub_fields = field.sub_fields();
                if sub_fields.is_empty() {
                    return Err(MessageError::EmptyListField);
                }
                // Nested packed lists are unrepresentable on the wire.
                if sub_fields.iter().any(|s| s.data_type() == DataType::List) {
                    return Err(MessageError::TypeMismatch {
                        expected: "primitive sub-fields".to_string(),
                        found: "a nested list sub-field".to_string(),
                    });
                }
                Ok(())
            }
            Validator::Overflow => match value {
                Some(Value::List(items)) if items.len() > field.sub_fields().len() => {
                    Err(MessageError::TooManyValues {
                        expected: field.sub_fields().len(),
                        found: items.len(),
                    })
                }
                _ => Ok(()),
            },
            Validator::Unordered => verify_unordered(field, value, schema_name),
            Validator::MessageType => match value {
                Some(Value::String(name)) if name == schema_name => Ok(()),
                other => Err(MessageError::TypeMismatch {
                    expected: format!("message type {schema_name:?}"),
                    found: match other {
                        Some(v) => format!("{v:?}"),
                        None => "no type".to_string(),
                    },
                }),
            },
        }
    }
}

/// Multiset validation for unsorted lists.
///
/// Each element must be consumed by a distinct sub-field of the same data
/// type; leftover elements fail. Sub-fields left without an element run
/// their chain against an absent value, so a required sub-field still
/// fails.
fn verify_unordered(
    field: &Field,
    value: Option<&Value>,
    schema_name: &str,
) -> Result<(), MessageError> {
    let Some(Value::List(items)) = value else {
        // Absent values pass; non-list values are caught by the sub-field
        // chains receiving nothing to consume.
        return match value {
            None => Ok(()),
            Some(v) => Err(type_mismatch(field.data_type(), v.data_type())),
        };
    };

    let mut pool: Vec<Option<&Value>> = items.iter().map(Some).collect();
    for sub in field.sub_fields() {
        let item = pool
            .iter_mut()
            .find(|slot| matches!(slot, Some(v) if v.data_type() == sub.data_type()))
            .and_then(Option::take);
        verify(sub, item, schema_name)?;
    }

    if let Some(leftover) = pool.iter().flatten().next() {
        return Err(MessageError::TypeMismatch {
            expected: "elements consumed by the declared sub-fields".to_string(),
            found: format!("unexpected {} value", leftover.data_type()),
        });
    }
    Ok(())
}

fn type_mismatch(expected: DataType, found: DataType) -> MessageError {
    MessageError::TypeMismatch {
        expected: expected.name().to_string(),
        found: found.name().to_string(),
    }
}
