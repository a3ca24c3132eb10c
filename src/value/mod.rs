//! Dynamic value model.
//!
//! [`Value`] is the payload of every entity attribute. Each variant maps to a
//! [`DataType`], which is what schema validation compares against.
//!
//! ## Modules
//!
//! - **`types`** - [`ValueType`], conversions between Rust types and `Value`
//! - **`coerce`** - normalization of a loosely-typed value to a declared type
//! - **`sql`** - conversion to `sea_query::Value` for statement binding
//! - **`option_set`** / **`reference`** - the two structured scalar kinds

mod coerce;
mod option_set;
mod reference;
mod sql;
mod types;

pub use coerce::coerce;
pub use option_set::OptionSetValue;
pub use reference::{EntityReference, MAX_REFERENCE_LENGTH};
pub use types::ValueType;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::collection::EntityCollection;
use crate::entity::Entity;
use crate::schema::DataType;

/// Format used for date/time text, e.g. `2024-03-01T08:30:00`
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Format used for date text
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Format used for time-of-day text
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Dynamically-typed attribute value
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    String(String),
    Binary(Vec<u8>),
    Byte(u8),
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Decimal(Decimal),
    Currency(Decimal),
    Guid(Uuid),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    OptionSet(OptionSetValue),
    Reference(EntityReference),
    /// Ordered list of values
    Array(Vec<Value>),
    /// Named collection of entities
    Collection(EntityCollection),
    /// Nested entity
    Entity(Entity),
}

impl Value {
    /// Data type tag of this value; `Null` and nested entities report `Unknown`
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null | Value::Entity(_) => DataType::Unknown,
            Value::String(_) => DataType::String,
            Value::Binary(_) => DataType::Binary,
            Value::Byte(_) => DataType::Byte,
            Value::Bool(_) => DataType::Boolean,
            Value::Int16(_) => DataType::Int16,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::Double(_) => DataType::Double,
            Value::Decimal(_) => DataType::Decimal,
            Value::Currency(_) => DataType::Currency,
            Value::Guid(_) => DataType::Guid,
            Value::Date(_) => DataType::Date,
            Value::DateTime(_) => DataType::DateTime,
            Value::Time(_) => DataType::Time,
            Value::OptionSet(_) => DataType::OptionSet,
            Value::Reference(_) => DataType::Reference,
            Value::Array(_) | Value::Collection(_) => DataType::Array,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer value widened to `i64`, for the integer variants only
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether an integer variant holds zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Value::Int16(0) | Value::Int32(0) | Value::Int64(0))
    }

    /// Whether this value could be an entity identifier: an integer or GUID,
    /// or non-empty text parsing as one
    #[must_use]
    pub fn is_key_like(&self) -> bool {
        match self {
            Value::Int32(_) | Value::Int64(_) | Value::Guid(_) => true,
            Value::String(s) => {
                let s = s.trim();
                !s.is_empty() && (Uuid::parse_str(s).is_ok() || s.parse::<i64>().is_ok())
            }
            _ => false,
        }
    }

    /// Whether the grammar encoder omits this value: empty text, integer
    /// zero or the nil GUID
    #[must_use]
    pub fn is_omitted_on_encode(&self) -> bool {
        match self {
            Value::Guid(g) => g.is_nil(),
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Entity(_) | Value::Collection(_) | Value::Array(_) => false,
            other => other.is_zero(),
        }
    }

    /// Textual equality used to detect no-op writes
    #[must_use]
    pub fn text_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            _ => self.to_string() == other.to_string(),
        }
    }
}

fn write_hex(f: &mut std::fmt::Formatter<'_>, bytes: &[u8]) -> std::fmt::Result {
    for b in bytes {
        write!(f, "{:02x}", b)?;
    }
    Ok(())
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::String(s) => f.write_str(s),
            Value::Binary(b) => write_hex(f, b),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Decimal(v) | Value::Currency(v) => write!(f, "{}", v),
            Value::Guid(v) => write!(f, "{}", v.hyphenated()),
            Value::Date(v) => write!(f, "{}", v.format(DATE_FORMAT)),
            Value::DateTime(v) => write!(f, "{}", v.format(DATE_TIME_FORMAT)),
            Value::Time(v) => write!(f, "{}", v.format(TIME_FORMAT)),
            Value::OptionSet(v) => write!(f, "{}", v),
            Value::Reference(v) => write!(f, "{}", v),
            Value::Array(items) => f.write_str(&crate::grammar::encode_array(items)),
            Value::Collection(c) => f.write_str(&crate::grammar::encode_collection(c)),
            Value::Entity(e) => write!(f, "{}", e),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Currency(a), Value::Currency(b)) => a == b,
            (Value::Guid(a), Value::Guid(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::OptionSet(a), Value::OptionSet(b)) => a == b,
            (Value::Reference(a), Value::Reference(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            // Entities and collections compare by identity
            (Value::Entity(a), Value::Entity(b)) => a.ptr_eq(b),
            (Value::Collection(a), Value::Collection(b)) => {
                a.entity_name() == b.entity_name()
                    && a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x.ptr_eq(y))
            }
            _ => false,
        }
    }
}

macro_rules! impl_from_for_value {
    ($type:ty, $variant:ident) => {
        impl From<$type> for Value {
            fn from(v: $type) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_from_for_value!(String, String);
impl_from_for_value!(Vec<u8>, Binary);
impl_from_for_value!(u8, Byte);
impl_from_for_value!(bool, Bool);
impl_from_for_value!(i16, Int16);
impl_from_for_value!(i32, Int32);
impl_from_for_value!(i64, Int64);
impl_from_for_value!(f64, Double);
impl_from_for_value!(Decimal, Decimal);
impl_from_for_value!(Uuid, Guid);
impl_from_for_value!(NaiveDate, Date);
impl_from_for_value!(NaiveDateTime, DateTime);
impl_from_for_value!(NaiveTime, Time);
impl_from_for_value!(OptionSetValue, OptionSet);
impl_from_for_value!(EntityReference, Reference);
impl_from_for_value!(Vec<Value>, Array);
impl_from_for_value!(EntityCollection, Collection);
impl_from_for_value!(Entity, Entity);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
