//! Conversion of dynamic values to `sea_query::Value` for binding.

use super::Value;

impl Value {
    /// Bindable `sea_query` value.
    ///
    /// Option sets bind their integer, references their id text; nested
    /// entities and collections bind as JSON text of their grammar form.
    #[must_use]
    pub fn to_sql_value(&self) -> sea_query::Value {
        match self {
            Value::Null => sea_query::Value::String(None),
            Value::String(s) => sea_query::Value::String(Some(s.clone())),
            Value::Binary(b) => sea_query::Value::Bytes(Some(b.clone())),
            Value::Byte(v) => sea_query::Value::SmallInt(Some(i16::from(*v))),
            Value::Bool(v) => sea_query::Value::Bool(Some(*v)),
            Value::Int16(v) => sea_query::Value::SmallInt(Some(*v)),
            Value::Int32(v) => sea_query::Value::Int(Some(*v)),
            Value::Int64(v) => sea_query::Value::BigInt(Some(*v)),
            Value::Double(v) => sea_query::Value::Double(Some(*v)),
            Value::Decimal(v) | Value::Currency(v) => sea_query::Value::from(*v),
            Value::Guid(v) => sea_query::Value::from(*v),
            Value::Date(v) => sea_query::Value::from(*v),
            Value::DateTime(v) => sea_query::Value::from(*v),
            Value::Time(v) => sea_query::Value::from(*v),
            Value::OptionSet(o) => sea_query::Value::Int(Some(o.value)),
            Value::Reference(r) => sea_query::Value::String(Some(r.id.clone())),
            Value::Array(_) | Value::Collection(_) | Value::Entity(_) => {
                sea_query::Value::String(Some(self.to_string()))
            }
        }
    }
}

impl From<&Value> for sea_query::Value {
    fn from(value: &Value) -> Self {
        value.to_sql_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{EntityReference, OptionSetValue};

    #[test]
    fn test_scalar_binding() {
        assert_eq!(Value::Int32(5).to_sql_value(), sea_query::Value::Int(Some(5)));
        assert_eq!(Value::Null.to_sql_value(), sea_query::Value::String(None));
        assert_eq!(
            Value::from("a").to_sql_value(),
            sea_query::Value::String(Some("a".to_string()))
        );
    }

    #[test]
    fn test_structured_binding() {
        let o = Value::from(OptionSetValue::with_text(3, "Closed"));
        assert_eq!(o.to_sql_value(), sea_query::Value::Int(Some(3)));
        let r = Value::from(EntityReference::new("Customer", "17"));
        assert_eq!(r.to_sql_value(), sea_query::Value::String(Some("17".to_string())));
    }
}
