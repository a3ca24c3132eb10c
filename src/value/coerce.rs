//! Normalization of loosely-typed values to a declared column type.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{EntityReference, OptionSetValue, Value, ValueType};
use crate::schema::DataType;

/// Convert `value` to the variant for `data_type`.
///
/// `Null` stays `Null`. Returns `None` when the value cannot be represented
/// in the target type.
pub fn coerce(value: &Value, data_type: DataType) -> Option<Value> {
    if value.is_null() {
        return Some(Value::Null);
    }
    let coerced = match data_type {
        DataType::String => String::from_value(value).map(Value::String),
        DataType::Binary => Vec::<u8>::from_value(value).map(Value::Binary),
        DataType::Byte => u8::from_value(value).map(Value::Byte),
        DataType::Boolean => bool::from_value(value).map(Value::Bool),
        DataType::Int16 => i16::from_value(value).map(Value::Int16),
        DataType::Int32 => i32::from_value(value).map(Value::Int32),
        DataType::Int64 => i64::from_value(value).map(Value::Int64),
        DataType::Double => f64::from_value(value).map(Value::Double),
        DataType::Decimal => Decimal::from_value(value).map(Value::Decimal),
        DataType::Currency => Decimal::from_value(value).map(Value::Currency),
        DataType::Guid => Uuid::from_value(value).map(Value::Guid),
        DataType::Date => NaiveDate::from_value(value).map(Value::Date),
        DataType::DateTime => NaiveDateTime::from_value(value).map(Value::DateTime),
        DataType::Time => NaiveTime::from_value(value).map(Value::Time),
        DataType::OptionSet => OptionSetValue::from_value(value).map(Value::OptionSet),
        DataType::Reference => EntityReference::from_value(value).map(Value::Reference),
        DataType::Array => match value {
            Value::Array(_) | Value::Collection(_) => Some(value.clone()),
            _ => None,
        },
        DataType::Unknown => Some(value.clone()),
    };
    if coerced.is_none() {
        log::debug!("cannot coerce {:?} to {}", value, data_type);
    }
    coerced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_keeps_declared_width() {
        assert_eq!(coerce(&Value::from("42"), DataType::Int32), Some(Value::Int32(42)));
        assert_eq!(coerce(&Value::Int32(42), DataType::Int64), Some(Value::Int64(42)));
        assert_eq!(coerce(&Value::Int64(70000), DataType::Int16), None);
    }

    #[test]
    fn test_coerce_text_forms() {
        let g = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
        assert_eq!(
            coerce(&Value::from(g), DataType::Guid),
            Some(Value::Guid(Uuid::parse_str(g).unwrap()))
        );
        assert_eq!(coerce(&Value::from("true"), DataType::Boolean), Some(Value::Bool(true)));
        assert_eq!(coerce(&Value::Int64(5), DataType::String), Some(Value::from("5")));
        assert_eq!(
            coerce(&Value::Double(1.5), DataType::Currency),
            Some(Value::Currency(Decimal::new(15, 1)))
        );
    }

    #[test]
    fn test_coerce_null_and_unknown() {
        assert_eq!(coerce(&Value::Null, DataType::Int32), Some(Value::Null));
        assert_eq!(coerce(&Value::from("x"), DataType::Unknown), Some(Value::from("x")));
        assert_eq!(coerce(&Value::from("x"), DataType::Array), None);
    }
}
