//! Runtime record synthesis.
//!
//! A [`Synthesizer`] turns a [`Shape`] into a [`RecordType`] once and caches
//! it by shape name; every [`FieldBag`] built from that type has its own
//! storage. A shape whose fields differ from the cached type under the same
//! name replaces that entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{FieldAccess, FieldSpec, Shape};
use crate::schema::DataType;
use crate::value::{coerce, Value};

/// Synthesized record type: the resolved field list of a shape
#[derive(Debug)]
pub struct RecordType {
    name: String,
    fields: Vec<FieldSpec>,
    index: HashMap<String, usize>,
}

impl RecordType {
    fn from_shape(shape: &Shape) -> Self {
        let fields = shape.all_fields();
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.to_lowercase(), i))
            .collect();
        Self {
            name: shape.name().to_string(),
            fields,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Position of a field, matched without regard to case
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_lowercase()).copied()
    }
}

/// Initial value of a freshly synthesized field
fn initial_value(data_type: DataType) -> Value {
    match data_type {
        DataType::Boolean => Value::Bool(false),
        DataType::Byte => Value::Byte(0),
        DataType::Int16 => Value::Int16(0),
        DataType::Int32 => Value::Int32(0),
        DataType::Int64 => Value::Int64(0),
        DataType::Double => Value::Double(0.0),
        _ => Value::Null,
    }
}

/// Instance of a synthesized record type
#[derive(Debug, Clone)]
pub struct FieldBag {
    record_type: Arc<RecordType>,
    values: Vec<Value>,
}

impl FieldBag {
    pub fn new(record_type: Arc<RecordType>) -> Self {
        let values = record_type
            .fields()
            .iter()
            .map(|f| initial_value(f.data_type))
            .collect();
        Self {
            record_type,
            values,
        }
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }
}

impl FieldAccess for FieldBag {
    fn fields(&self) -> Vec<FieldSpec> {
        self.record_type.fields().to_vec()
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        let i = self.record_type.position(name)?;
        self.values.get(i).cloned()
    }

    /// Values are converted to the field's type; an unknown field or an
    /// unconvertible value is rejected
    fn set_field(&mut self, name: &str, value: Value) -> bool {
        let Some(i) = self.record_type.position(name) else {
            return false;
        };
        let data_type = self.record_type.fields()[i].data_type;
        match coerce(&value, data_type) {
            Some(v) => {
                self.values[i] = v;
                true
            }
            None => false,
        }
    }
}

/// Cache of record types keyed by shape name
#[derive(Debug, Default)]
pub struct Synthesizer {
    types: Mutex<HashMap<String, Arc<RecordType>>>,
}

impl Synthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record type for `shape`, built on first request or when the shape's
    /// fields no longer match the cached type
    pub fn record_type(&self, shape: &Shape) -> Arc<RecordType> {
        let mut types = self.types.lock().unwrap_or_else(PoisonError::into_inner);
        let fields = shape.all_fields();
        if let Some(cached) = types.get(shape.name()) {
            if cached.fields == fields {
                return Arc::clone(cached);
            }
            log::warn!("record type {} redefined with different fields", shape.name());
        } else {
            log::debug!("synthesizing record type {}", shape.name());
        }
        let record_type = Arc::new(RecordType::from_shape(shape));
        types.insert(shape.name().to_string(), Arc::clone(&record_type));
        record_type
    }

    /// Fresh instance of the record type for `shape`
    pub fn instantiate(&self, shape: &Shape) -> FieldBag {
        FieldBag::new(self.record_type(shape))
    }

    pub fn len(&self) -> usize {
        self.types.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role_shape() -> Shape {
        Shape::new("Role")
            .field("Id", DataType::Int64)
            .field("Name", DataType::String)
            .field("IsActive", DataType::Boolean)
    }

    #[test]
    fn test_type_built_once() {
        let synth = Synthesizer::new();
        let a = synth.record_type(&role_shape());
        let b = synth.record_type(&role_shape());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(synth.len(), 1);
    }

    #[test]
    fn test_same_name_with_other_fields_rebuilds() {
        let synth = Synthesizer::new();
        let first = synth.record_type(&role_shape());
        let narrow = Shape::new("Role").field("Code", DataType::String);
        let second = synth.record_type(&narrow);

        assert!(!Arc::ptr_eq(&first, &second));
        let names: Vec<&str> = second.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Code"]);
        assert_eq!(first.fields().len(), 3);
        assert_eq!(synth.len(), 1);

        let mut bag = synth.instantiate(&narrow);
        assert!(bag.set_field("Code", Value::from("x")));
        assert!(!bag.set_field("Name", Value::from("x")));
    }

    #[test]
    fn test_instances_are_independent() {
        let synth = Synthesizer::new();
        let mut a = synth.instantiate(&role_shape());
        let b = synth.instantiate(&role_shape());
        assert!(a.set_field("name", Value::from("admin")));
        assert_eq!(a.get_field("Name"), Some(Value::from("admin")));
        assert_eq!(b.get_field("Name"), Some(Value::Null));
        assert_eq!(b.get_field("IsActive"), Some(Value::Bool(false)));
    }

    #[test]
    fn test_set_converts_or_rejects() {
        let synth = Synthesizer::new();
        let mut bag = synth.instantiate(&role_shape());
        assert!(bag.set_field("Id", Value::from("12")));
        assert_eq!(bag.get_field("Id"), Some(Value::Int64(12)));
        assert!(!bag.set_field("Id", Value::from("twelve")));
        assert!(!bag.set_field("Missing", Value::from(1i32)));
    }
}
