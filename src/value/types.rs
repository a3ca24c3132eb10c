//! ValueType trait for typed access to dynamic values
//!
//! `ValueType` maps a Rust type to its [`Value`] variant and back. Reading is
//! lenient: compatible variants convert (an `Int32` reads as `i64`, numeric
//! text reads as a number), which is what entity getters and record
//! conversion rely on.
//!
//! ## Usage
//!
//! ```rust
//! use datacore::{Value, ValueType};
//!
//! let value = 42i32.into_value();
//! assert_eq!(i64::from_value(&value), Some(42));
//! assert_eq!(String::from_value(&value), Some("42".to_string()));
//! ```

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{EntityReference, OptionSetValue, Value, DATE_FORMAT, DATE_TIME_FORMAT, TIME_FORMAT};
use crate::schema::DataType;

/// Conversion between a Rust type and [`Value`]
pub trait ValueType: Sized {
    /// Wrap this value in its `Value` variant
    fn into_value(self) -> Value;

    /// Read this type from a value, converting from compatible variants.
    ///
    /// Returns `None` for `Null` and for values that cannot be represented.
    fn from_value(value: &Value) -> Option<Self>;

    /// Data type tag for this Rust type
    fn data_type() -> DataType;
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl ValueType for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            Value::Double(v) => Some(*v != 0.0),
            Value::Decimal(v) | Value::Currency(v) => Some(!v.is_zero()),
            Value::String(s) => parse_bool(s),
            other => other.as_i64().map(|v| v != 0),
        }
    }

    fn data_type() -> DataType {
        DataType::Boolean
    }
}

impl ValueType for i64 {
    fn into_value(self) -> Value {
        Value::Int64(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Double(v) if v.fract() == 0.0 => v.to_i64(),
            Value::Decimal(v) | Value::Currency(v) if v.fract().is_zero() => v.to_i64(),
            Value::Bool(v) => Some(i64::from(*v)),
            Value::OptionSet(o) => Some(i64::from(o.value)),
            Value::String(s) => s.trim().parse().ok(),
            other => other.as_i64(),
        }
    }

    fn data_type() -> DataType {
        DataType::Int64
    }
}

macro_rules! impl_narrow_integer {
    ($type:ty, $variant:ident, $data_type:ident) => {
        impl ValueType for $type {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: &Value) -> Option<Self> {
                i64::from_value(value).and_then(|v| <$type>::try_from(v).ok())
            }

            fn data_type() -> DataType {
                DataType::$data_type
            }
        }
    };
}

impl_narrow_integer!(u8, Byte, Byte);
impl_narrow_integer!(i16, Int16, Int16);
impl_narrow_integer!(i32, Int32, Int32);

impl ValueType for f64 {
    fn into_value(self) -> Value {
        Value::Double(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(*v),
            Value::Decimal(v) | Value::Currency(v) => v.to_f64(),
            Value::String(s) => s.trim().parse().ok(),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    fn data_type() -> DataType {
        DataType::Double
    }
}

impl ValueType for Decimal {
    fn into_value(self) -> Value {
        Value::Decimal(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Decimal(v) | Value::Currency(v) => Some(*v),
            Value::Double(v) => Decimal::try_from(*v).ok(),
            Value::String(s) => s.trim().parse().ok(),
            other => other.as_i64().map(Decimal::from),
        }
    }

    fn data_type() -> DataType {
        DataType::Decimal
    }
}

impl ValueType for Uuid {
    fn into_value(self) -> Value {
        Value::Guid(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Guid(v) => Some(*v),
            Value::String(s) => Uuid::parse_str(s.trim()).ok(),
            Value::Binary(b) => Uuid::from_slice(b).ok(),
            _ => None,
        }
    }

    fn data_type() -> DataType {
        DataType::Guid
    }
}

impl ValueType for NaiveDateTime {
    fn into_value(self) -> Value {
        Value::DateTime(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DateTime(v) => Some(*v),
            Value::Date(d) => d.and_hms_opt(0, 0, 0),
            Value::String(s) => parse_date_time(s),
            _ => None,
        }
    }

    fn data_type() -> DataType {
        DataType::DateTime
    }
}

impl ValueType for NaiveDate {
    fn into_value(self) -> Value {
        Value::Date(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(v) => Some(*v),
            Value::DateTime(v) => Some(v.date()),
            Value::String(s) => parse_date_time(s).map(|dt| dt.date()),
            _ => None,
        }
    }

    fn data_type() -> DataType {
        DataType::Date
    }
}

impl ValueType for NaiveTime {
    fn into_value(self) -> Value {
        Value::Time(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Time(v) => Some(*v),
            Value::DateTime(v) => Some(v.time()),
            Value::String(s) => NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
                .ok()
                .or_else(|| parse_date_time(s).map(|dt| dt.time())),
            _ => None,
        }
    }

    fn data_type() -> DataType {
        DataType::Time
    }
}

impl ValueType for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn data_type() -> DataType {
        DataType::String
    }
}

impl ValueType for Vec<u8> {
    fn into_value(self) -> Value {
        Value::Binary(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Binary(b) => Some(b.clone()),
            Value::String(s) => Some(s.as_bytes().to_vec()),
            Value::Guid(g) => Some(g.as_bytes().to_vec()),
            _ => None,
        }
    }

    fn data_type() -> DataType {
        DataType::Binary
    }
}

impl ValueType for OptionSetValue {
    fn into_value(self) -> Value {
        Value::OptionSet(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::OptionSet(o) => Some(o.clone()),
            Value::String(s) => OptionSetValue::parse(s)
                .or_else(|| s.trim().parse().ok().map(OptionSetValue::new)),
            other => i32::from_value(other).map(OptionSetValue::new),
        }
    }

    fn data_type() -> DataType {
        DataType::OptionSet
    }
}

impl ValueType for EntityReference {
    fn into_value(self) -> Value {
        Value::Reference(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Reference(r) => Some(r.clone()),
            Value::String(s) => EntityReference::parse(s),
            _ => None,
        }
    }

    fn data_type() -> DataType {
        DataType::Reference
    }
}

/// `Null` reads as `Some(None)`; a present but unconvertible value as `None`
impl<T: ValueType> ValueType for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, ValueType::into_value)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn data_type() -> DataType {
        T::data_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widening_and_narrowing() {
        assert_eq!(i64::from_value(&Value::Int16(7)), Some(7));
        assert_eq!(i32::from_value(&Value::Int64(1 << 40)), None);
        assert_eq!(i16::from_value(&Value::from("12")), Some(12));
        assert_eq!(i64::from_value(&Value::Double(3.0)), Some(3));
        assert_eq!(i64::from_value(&Value::Double(3.5)), None);
    }

    #[test]
    fn test_bool_from_loose_values() {
        assert_eq!(bool::from_value(&Value::from("TRUE")), Some(true));
        assert_eq!(bool::from_value(&Value::from("0")), Some(false));
        assert_eq!(bool::from_value(&Value::Int32(3)), Some(true));
        assert_eq!(bool::from_value(&Value::from("maybe")), None);
    }

    #[test]
    fn test_dates_from_text() {
        let dt = NaiveDateTime::from_value(&Value::from("2024-03-01T08:30:00")).unwrap();
        assert_eq!(dt.format(DATE_TIME_FORMAT).to_string(), "2024-03-01T08:30:00");
        let d = NaiveDate::from_value(&Value::from("2024-03-01")).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(NaiveDateTime::from_value(&Value::from("yesterday")).is_none());
    }

    #[test]
    fn test_option_reads_null() {
        assert_eq!(Option::<i32>::from_value(&Value::Null), Some(None));
        assert_eq!(Option::<i32>::from_value(&Value::Int32(4)), Some(Some(4)));
        assert_eq!(None::<i32>.into_value(), Value::Null);
    }

    #[test]
    fn test_structured_values_from_text() {
        let o = OptionSetValue::from_value(&Value::from("#SET=2/#TXT=Open")).unwrap();
        assert_eq!(o.value, 2);
        let r = EntityReference::from_value(&Value::from("#REF=Customer/#ID=1")).unwrap();
        assert_eq!(r.id, "1");
        assert_eq!(String::from_value(&Value::Int32(9)), Some("9".to_string()));
    }
}
