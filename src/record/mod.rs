//! Typed record views over entities.
//!
//! Code can be written against a record *shape* and still work with plain,
//! independently mutable values. Two kinds of records implement
//! [`FieldAccess`]:
//!
//! - [`FieldBag`], synthesized at runtime from a [`Shape`] by a
//!   [`Synthesizer`];
//! - structs declared with the [`record!`](crate::record!) macro.
//!
//! Entities convert to and from both; see `Entity::to_bag`,
//! `Entity::to_record` and `Entity::from_record`.
//!
//! # Example
//!
//! ```no_run
//! use datacore::record;
//! use datacore::record::FieldAccess;
//!
//! record! {
//!     pub struct Role as "Role" {
//!         pub id: i64 => "Id",
//!         pub name: String => "Name",
//!     }
//! }
//!
//! let mut role = Role::default();
//! role.set_field("Name", "admin".into());
//! assert_eq!(role.name, "admin");
//! ```

mod shape;
mod synth;

pub use shape::{FieldSpec, Shape};
pub use synth::{FieldBag, RecordType, Synthesizer};

use crate::value::Value;

/// Name-based field access for records
pub trait FieldAccess {
    /// Declared fields, in declaration order
    fn fields(&self) -> Vec<FieldSpec>;

    /// Current value of a field; `None` for an unknown field
    fn get_field(&self, name: &str) -> Option<Value>;

    /// Write a field; `false` when the field is unknown or the value does not
    /// convert to its type
    fn set_field(&mut self, name: &str, value: Value) -> bool;
}

/// Declare a record struct with [`FieldAccess`] and a `shape()` constructor.
///
/// Each field names the column it maps to. Field types must implement
/// [`ValueType`](crate::ValueType), `Clone`, `Default` and `PartialEq`.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident as $entity:literal {
            $( $field_vis:vis $field:ident : $ty:ty => $column:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $( $field_vis $field: $ty, )*
        }

        impl $name {
            /// Shape describing this record
            pub fn shape() -> $crate::record::Shape {
                $crate::record::Shape::new($entity)
                    $( .field($column, <$ty as $crate::ValueType>::data_type()) )*
            }
        }

        impl $crate::record::FieldAccess for $name {
            fn fields(&self) -> Vec<$crate::record::FieldSpec> {
                Self::shape().all_fields()
            }

            fn get_field(&self, name: &str) -> Option<$crate::Value> {
                $(
                    if name.eq_ignore_ascii_case($column) {
                        return Some($crate::ValueType::into_value(self.$field.clone()));
                    }
                )*
                None
            }

            #[allow(unused_variables)]
            fn set_field(&mut self, name: &str, value: $crate::Value) -> bool {
                $(
                    if name.eq_ignore_ascii_case($column) {
                        if value.is_null() {
                            self.$field = Default::default();
                            return true;
                        }
                        return match <$ty as $crate::ValueType>::from_value(&value) {
                            Some(v) => {
                                self.$field = v;
                                true
                            }
                            None => false,
                        };
                    }
                )*
                false
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    crate::record! {
        struct Parameter as "Parameter" {
            id: i64 => "Id",
            name: String => "Name",
            note: Option<String> => "Note",
            active: bool => "IsActive",
        }
    }

    #[test]
    fn test_declared_record_shape() {
        let shape = Parameter::shape();
        assert_eq!(shape.name(), "Parameter");
        let types: Vec<DataType> = shape.all_fields().iter().map(|f| f.data_type).collect();
        assert_eq!(
            types,
            vec![DataType::Int64, DataType::String, DataType::String, DataType::Boolean]
        );
    }

    #[test]
    fn test_declared_record_access() {
        let mut p = Parameter::default();
        assert!(p.set_field("id", Value::from("7")));
        assert!(p.set_field("Note", Value::from("x")));
        assert!(p.set_field("IsActive", Value::Bool(true)));
        assert!(!p.set_field("Unknown", Value::Bool(true)));
        assert_eq!(p.id, 7);
        assert_eq!(p.note.as_deref(), Some("x"));
        assert_eq!(p.get_field("Name"), Some(Value::from("")));
        assert!(p.set_field("Note", Value::Null));
        assert_eq!(p.note, None);
    }
}
