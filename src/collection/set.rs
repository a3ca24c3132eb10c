//! Unit-of-work sets: the creating / updating / deleting partition handed
//! to a transactional connector.

use std::sync::Arc;

use chrono::Local;

use super::{Keyed, KeyedCollection};
use crate::entity::{Entity, EntityState};
use crate::record::FieldAccess;
use crate::schema::TableSchema;
use crate::value::{Value, ValueType};

/// Pending changes of a unit of work
pub trait EntitySet {
    /// New entities to insert
    fn creating(&self) -> Vec<Entity>;

    /// Changed entities to update
    fn updating(&self) -> Vec<Entity>;

    /// Entities to delete; the pending list is drained
    fn take_deleting(&mut self) -> Vec<Entity>;
}

/// Type-erased view of a [`SetCollection`]
pub trait RecordSet {
    fn schema(&self) -> Option<Arc<TableSchema>>;

    /// Records as entities in `state`
    fn entities(&self, state: EntityState) -> Vec<Entity>;

    /// Removed records as entities; the removed list is drained
    fn deleting_with_clear(&mut self) -> Vec<Entity>;
}

const ID_FIELD: &str = "Id";
const CREATED_FIELD: &str = "Created";
const MODIFIED_FIELD: &str = "Modified";

#[derive(Debug, Clone, PartialEq)]
struct Row<T>(T);

impl<T: FieldAccess> Keyed for Row<T> {
    type Key = i64;

    fn key(&self) -> i64 {
        self.0
            .get_field(ID_FIELD)
            .and_then(|v| i64::from_value(&v))
            .unwrap_or(0)
    }
}

/// Ordered set of records keyed by their `Id` field.
///
/// A record whose id is already present is rejected with a warning.
/// Records carry no change tracking, so every record is reported as
/// creating and none as updating.
#[derive(Debug)]
pub struct SetCollection<T: FieldAccess> {
    entity_name: String,
    schema: Option<Arc<TableSchema>>,
    rows: KeyedCollection<Row<T>>,
}

impl<T: FieldAccess> SetCollection<T> {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            schema: None,
            rows: KeyedCollection::new(),
        }
    }

    /// Set whose records convert against `schema`
    pub fn with_schema(schema: Arc<TableSchema>) -> Self {
        Self {
            entity_name: schema.name.clone(),
            schema: Some(schema),
            rows: KeyedCollection::new(),
        }
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter().map(|r| &r.0)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.rows.get(index).map(|r| &r.0)
    }

    pub fn get_by_id(&self, id: i64) -> Option<&T> {
        let found = self.rows.get_by(&id).map(|r| &r.0);
        if found.is_none() {
            log::warn!("{}: no record with Id={}", self.entity_name, id);
        }
        found
    }

    fn accepts(&self, row: &Row<T>) -> bool {
        let id = row.key();
        if self.rows.contains_key(&id) {
            log::warn!("{}: record with Id={} already present", self.entity_name, id);
            return false;
        }
        true
    }

    /// Append; `false` when the id is already present
    pub fn push(&mut self, record: T) -> bool {
        let row = Row(record);
        if !self.accepts(&row) {
            return false;
        }
        self.rows.push(row);
        true
    }

    pub fn insert(&mut self, index: usize, record: T) -> bool {
        let row = Row(record);
        if !self.accepts(&row) {
            return false;
        }
        self.rows.insert(index, row);
        true
    }

    /// Replace the record at `index`; `false` when another record has the
    /// new record's id
    pub fn replace(&mut self, index: usize, record: T) -> bool
    where
        T: PartialEq,
    {
        let row = Row(record);
        if let Some(at) = self.rows.position_by(&row.key()) {
            if at != index {
                log::warn!("{}: record with Id={} already present", self.entity_name, row.key());
                return false;
            }
        }
        self.rows.replace(index, row);
        true
    }

    pub fn move_item(&mut self, from: usize, to: usize) {
        self.rows.move_item(from, to);
    }

    /// Remove the record at `index`, recording it for deletion
    pub fn remove(&mut self, index: usize) -> Option<&T> {
        self.rows.remove(index).map(|r| &r.0)
    }

    /// Remove every record, recording each for deletion
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    fn to_entity(&self, record: &T) -> Entity {
        match &self.schema {
            Some(schema) => Entity::from_record_with_schema(record, Arc::clone(schema)),
            None => Entity::from_record(record, &self.entity_name),
        }
    }
}

fn has_field(entity: &Entity, name: &str) -> bool {
    match entity.schema() {
        Some(table) => table.column(name).is_some(),
        None => entity.contains_item(name),
    }
}

impl<T: FieldAccess> RecordSet for SetCollection<T> {
    fn schema(&self) -> Option<Arc<TableSchema>> {
        self.schema.clone()
    }

    /// `Created` yields every record stamped with the current local time in
    /// its `Created` and `Modified` fields; other states yield nothing
    fn entities(&self, state: EntityState) -> Vec<Entity> {
        if state != EntityState::Created {
            return Vec::new();
        }
        let now = Value::DateTime(Local::now().naive_local());
        self.iter()
            .map(|record| {
                let entity = self.to_entity(record);
                for field in [CREATED_FIELD, MODIFIED_FIELD] {
                    if has_field(&entity, field) {
                        entity.set_item_value(field, now.clone());
                    }
                }
                entity
            })
            .collect()
    }

    fn deleting_with_clear(&mut self) -> Vec<Entity> {
        let removed = self.rows.take_deleting();
        removed
            .iter()
            .map(|row| {
                let entity = self.to_entity(&row.0);
                entity.actualization(None);
                entity
            })
            .collect()
    }
}

/// Several record sets committed as one unit of work.
///
/// Creating and updating follow the order the sets were added; deleting
/// walks them in reverse so dependents go before what they reference.
#[derive(Default)]
pub struct EntitySetCollection {
    sets: Vec<Box<dyn RecordSet>>,
}

impl EntitySetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_set(&mut self, set: Box<dyn RecordSet>) {
        self.sets.push(set);
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    fn entities(&self, state: EntityState) -> Vec<Entity> {
        self.sets.iter().flat_map(|s| s.entities(state)).collect()
    }
}

impl EntitySet for EntitySetCollection {
    fn creating(&self) -> Vec<Entity> {
        self.entities(EntityState::Created)
    }

    fn updating(&self) -> Vec<Entity> {
        self.entities(EntityState::Modified)
    }

    fn take_deleting(&mut self) -> Vec<Entity> {
        self.sets
            .iter_mut()
            .rev()
            .flat_map(|s| s.deleting_with_clear())
            .collect()
    }
}
