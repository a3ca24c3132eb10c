//! Conversion between entities and typed records.

use std::sync::Arc;

use super::Entity;
use crate::record::{FieldAccess, FieldBag, Shape, Synthesizer};
use crate::schema::{is_equal_types, TableSchema};
use crate::value::coerce;

impl Entity {
    fn fill(&self, record: &mut dyn FieldAccess) {
        for field in record.fields() {
            let Some(value) = self.get_item_value(&field.name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let value = coerce(&value, field.data_type).unwrap_or(value);
            if !record.set_field(&field.name, value) {
                log::debug!("{}: field {} not converted", self.entity_name(), field.name);
            }
        }
    }

    /// Synthesized record for `shape` filled from this entity's attributes
    pub fn to_bag(&self, synthesizer: &Synthesizer, shape: &Shape) -> FieldBag {
        let mut bag = synthesizer.instantiate(shape);
        self.fill(&mut bag);
        bag
    }

    /// Declared record filled from this entity's attributes.
    ///
    /// Fields without a matching attribute keep their default; values are
    /// converted to each field's type where possible.
    pub fn to_record<T: FieldAccess + Default>(&self) -> T {
        let mut record = T::default();
        self.fill(&mut record);
        record
    }

    /// New `Created` entity holding every field of `record`
    pub fn from_record(record: &dyn FieldAccess, name: &str) -> Entity {
        let entity = Entity::new(name);
        for field in record.fields() {
            let value = record.get_field(&field.name).unwrap_or_default();
            entity.push_item(field.name, value);
        }
        entity
    }

    /// New `Created` entity bound to `schema`.
    ///
    /// Fields missing from the schema, or whose type the column cannot hold,
    /// are skipped with a warning.
    pub fn from_record_with_schema(record: &dyn FieldAccess, schema: Arc<TableSchema>) -> Entity {
        let entity = Entity::with_schema(Arc::clone(&schema));
        for field in record.fields() {
            let Some(column) = schema.column(&field.name) else {
                log::warn!("{}: field {} is not a column, skipped", schema.name, field.name);
                continue;
            };
            if !is_equal_types(column.data_type, field.data_type) {
                log::warn!(
                    "{}: field {} is {}, column expects {}, skipped",
                    schema.name,
                    field.name,
                    field.data_type,
                    column.data_type
                );
                continue;
            }
            let value = record.get_field(&field.name).unwrap_or_default();
            let value = coerce(&value, column.data_type).unwrap_or(value);
            entity.push_item(column.name.clone(), value);
        }
        entity
    }
}
