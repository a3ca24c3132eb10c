//! Connector contract.
//!
//! Storage backends implement [`ReadonlyData`], [`CrudData`] and
//! [`TransactedData`]; the core never performs I/O itself. The traits are
//! synchronous; an async runtime wraps them at the connector layer.
//!
//! [`DataSources`] maps source names to connectors. With the `mock` feature
//! (and in tests) [`MemoryConnector`] keeps entities in memory and answers
//! queries through [`Filter::matches`](crate::query::Filter::matches).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::collection::{EntityCollection, EntitySet};
use crate::entity::Entity;
use crate::error::DataError;
use crate::query::Query;
use crate::schema::Schema;
use crate::value::Value;

/// Read access to a data source
pub trait ReadonlyData: Send + Sync {
    /// Entities of `entity_name` whose attributes equal every `(name, value)` pair
    fn read(&self, entity_name: &str, pairs: &[(&str, Value)]) -> Result<EntityCollection, DataError>;

    /// Entities selected by `query`
    fn select(&self, query: &Query) -> Result<EntityCollection, DataError>;

    /// Schema restricted to `table_names`; all tables when empty
    fn get_schema(&self, table_names: &[&str]) -> Result<Schema, DataError>;
}

/// Create, update and delete on top of [`ReadonlyData`]
pub trait CrudData: ReadonlyData {
    fn create(&self, entities: &[Entity]) -> Result<(), DataError>;

    fn update(&self, entities: &[Entity]) -> Result<(), DataError>;

    fn delete(&self, entities: &[Entity]) -> Result<(), DataError>;

    /// Delete the rows of `entity_name` whose `key` column holds one of `ids`
    fn delete_by_ids(&self, entity_name: &str, key: &str, ids: &[Value]) -> Result<(), DataError>;
}

/// All-or-nothing application of a unit of work
pub trait TransactedData: CrudData {
    /// Apply `set` in one transaction: creating, then updating, then deleting
    fn transaction(&self, set: &mut dyn EntitySet) -> Result<(), DataError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Named data sources
#[derive(Default)]
pub struct DataSources {
    sources: Mutex<HashMap<String, Arc<dyn ReadonlyData>>>,
}

impl std::fmt::Debug for DataSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSources")
            .field("names", &self.names())
            .finish()
    }
}

impl DataSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` under `name`, returning any source it replaces
    pub fn register(&self, name: impl Into<String>, source: Arc<dyn ReadonlyData>) -> Option<Arc<dyn ReadonlyData>> {
        let name = name.into();
        log::debug!("registering data source {}", name);
        lock(&self.sources).insert(name.to_lowercase(), source)
    }

    /// Source by name, ignoring case
    pub fn get(&self, name: &str) -> Result<Arc<dyn ReadonlyData>, DataError> {
        lock(&self.sources)
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| DataError::SourceNotFound(name.to_string()))
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn ReadonlyData>> {
        lock(&self.sources).remove(&name.to_lowercase())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.sources).keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryConnector;

#[cfg(any(test, feature = "mock"))]
mod memory {
    use std::cmp::Ordering;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
    use std::sync::{Arc, Mutex};

    use uuid::Uuid;

    use super::{lock, CrudData, ReadonlyData, TransactedData};
    use crate::collection::{EntityCollection, EntitySet};
    use crate::entity::{Entity, EntityState};
    use crate::error::{DataError, SchemaError};
    use crate::query::eval::compare;
    use crate::query::{OrderType, Query};
    use crate::schema::{DataType, Schema, SchemaRegistry, TableSchema};
    use crate::value::Value;

    type Tables = HashMap<String, Vec<Entity>>;

    /// In-memory connector over a fixed schema.
    ///
    /// Stored rows are private copies; callers' entities are actualized
    /// after a successful write. Missing integer and GUID keys are
    /// generated on create and handed to the caller's entity only once the
    /// write commits.
    #[derive(Debug)]
    pub struct MemoryConnector {
        schema: Schema,
        registry: SchemaRegistry,
        tables: Mutex<Tables>,
        next_id: AtomicI64,
    }

    impl MemoryConnector {
        pub fn new(schema: Schema) -> Self {
            let registry = SchemaRegistry::from_schema(schema.clone());
            Self {
                schema,
                registry,
                tables: Mutex::new(HashMap::new()),
                next_id: AtomicI64::new(1),
            }
        }

        pub fn registry(&self) -> &SchemaRegistry {
            &self.registry
        }

        /// Number of stored rows of `entity_name`
        pub fn count(&self, entity_name: &str) -> usize {
            lock(&self.tables)
                .get(&entity_name.to_lowercase())
                .map_or(0, Vec::len)
        }

        fn table(&self, name: &str) -> Result<Arc<TableSchema>, DataError> {
            self.registry
                .get(name)
                .ok_or_else(|| SchemaError::TableNotFound(name.to_string()).into())
        }

        /// Stored copy bound to the table schema, keyed when the key is
        /// unset. The generated key, if any, is returned; `entity` itself is
        /// left untouched.
        fn stored_copy(
            &self,
            entity: &Entity,
            table: &Arc<TableSchema>,
        ) -> Result<(Entity, Option<String>), DataError> {
            let copy = entity.duplicate();
            let key = copy.primary_key();
            let id = copy.entity_id();
            let mut generated = None;
            if id.is_empty() || id == "0" {
                generated = match table.column(&key).map(|c| c.data_type) {
                    Some(DataType::Int32 | DataType::Int64) => {
                        Some(self.next_id.fetch_add(1, AtomicOrdering::Relaxed).to_string())
                    }
                    Some(DataType::Guid) => Some(Uuid::new_v4().to_string()),
                    _ => None,
                };
                if let Some(generated) = &generated {
                    copy.set_entity_id(generated)?;
                }
            }
            copy.actualization_with_schema(Arc::clone(table))?;
            Ok((copy, generated))
        }

        /// Store a new row; a generated key is queued in `assigned`
        fn create_in(
            &self,
            tables: &mut Tables,
            entity: &Entity,
            assigned: &mut Vec<(Entity, String)>,
        ) -> Result<(), DataError> {
            let table = self.table(&entity.entity_name())?;
            let (copy, generated) = self.stored_copy(entity, &table)?;
            let rows = tables.entry(table.name.to_lowercase()).or_default();
            let id = copy.entity_id();
            if !id.is_empty() && rows.iter().any(|r| r.entity_id() == id) {
                return Err(DataError::Connector(format!("{} {} already exists", table.name, id)));
            }
            rows.push(copy);
            if let Some(generated) = generated {
                assigned.push((entity.clone(), generated));
            }
            Ok(())
        }

        fn update_in(&self, tables: &mut Tables, entity: &Entity) -> Result<(), DataError> {
            let table = self.table(&entity.entity_name())?;
            let id = entity.entity_id();
            let rows = tables.entry(table.name.to_lowercase()).or_default();
            let position = rows
                .iter()
                .position(|r| r.entity_id() == id)
                .ok_or_else(|| DataError::NotFound(format!("{} {}", table.name, id)))?;
            rows[position] = self.stored_copy(entity, &table)?.0;
            Ok(())
        }

        fn delete_in(&self, tables: &mut Tables, entity: &Entity) -> Result<(), DataError> {
            let table = self.table(&entity.entity_name())?;
            let id = entity.entity_id();
            let rows = tables.entry(table.name.to_lowercase()).or_default();
            let before = rows.len();
            rows.retain(|r| r.entity_id() != id);
            if rows.len() == before {
                return Err(DataError::NotFound(format!("{} {}", table.name, id)));
            }
            Ok(())
        }

        /// Run `apply` against a scratch copy of the tables and keep it only on success
        fn write<F>(&self, apply: F) -> Result<(), DataError>
        where
            F: FnOnce(&mut Tables) -> Result<(), DataError>,
        {
            let mut tables = lock(&self.tables);
            let mut scratch: Tables = tables
                .iter()
                .map(|(name, rows)| (name.clone(), rows.iter().map(Entity::duplicate).collect()))
                .collect();
            apply(&mut scratch)?;
            *tables = scratch;
            Ok(())
        }

        fn rows(&self, entity_name: &str) -> Result<(Arc<TableSchema>, Vec<Entity>), DataError> {
            let table = self.table(entity_name)?;
            let rows = lock(&self.tables)
                .get(&table.name.to_lowercase())
                .map(|rows| rows.iter().map(Entity::duplicate).collect())
                .unwrap_or_default();
            Ok((table, rows))
        }
    }

    /// Hand committed keys back to the callers' entities
    fn assign_ids(assigned: Vec<(Entity, String)>) -> Result<(), DataError> {
        for (entity, id) in assigned {
            entity.set_entity_id(&id)?;
        }
        Ok(())
    }

    fn actualize_all(entities: &[Entity]) {
        for entity in entities {
            entity.actualization(None);
        }
    }

    fn project(entity: &Entity, columns: &[String]) -> Entity {
        if columns.is_empty() {
            return entity.clone();
        }
        let projected = Entity::actual(entity.entity_name());
        for name in columns {
            if let Some(value) = entity.get_item_value(name) {
                projected.push_item(name.clone(), value);
            }
        }
        projected
    }

    impl ReadonlyData for MemoryConnector {
        fn read(&self, entity_name: &str, pairs: &[(&str, Value)]) -> Result<EntityCollection, DataError> {
            let (table, rows) = self.rows(entity_name)?;
            let mut collection = EntityCollection::named(table.name.clone());
            for row in rows {
                let matched = pairs.iter().all(|(name, value)| {
                    row.get_item_value(name)
                        .is_some_and(|actual| actual.text_eq(value))
                });
                if matched {
                    collection.push(row);
                }
            }
            collection.total_count = collection.len() as i64;
            Ok(collection)
        }

        fn select(&self, query: &Query) -> Result<EntityCollection, DataError> {
            let (table, rows) = self.rows(&query.entity_name)?;
            let mut matched: Vec<Entity> = rows
                .into_iter()
                .filter(|row| query.criteria.as_ref().map_or(true, |c| c.matches(row)))
                .collect();
            matched.sort_by(|a, b| {
                for order in &query.orders {
                    let left = a.get_item_value(&order.item_name).unwrap_or_default();
                    let right = b.get_item_value(&order.item_name).unwrap_or_default();
                    let ord = compare(&left, &right).unwrap_or(Ordering::Equal);
                    let ord = match order.order_type {
                        OrderType::Ascending => ord,
                        OrderType::Descending => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
            let total = matched.len();
            let skip = query.effective_skip().map_or(0, |s| s as usize);
            let top = query.effective_top().map_or(usize::MAX, |t| t as usize);
            let mut collection = EntityCollection::named(table.name.clone());
            for row in matched.iter().skip(skip).take(top) {
                collection.push(project(row, &query.columns));
            }
            collection.total_count = total as i64;
            collection.has_more = skip.saturating_add(collection.len()) < total;
            if let Some(page) = &query.page_info {
                collection.paging_cookie = page.paging_cookie.clone();
            }
            Ok(collection)
        }

        fn get_schema(&self, table_names: &[&str]) -> Result<Schema, DataError> {
            let mut schema = Schema::new(self.schema.name.clone());
            schema.title = self.schema.title.clone();
            schema.key_type = self.schema.key_type;
            if table_names.is_empty() {
                for table in self.schema.tables() {
                    schema.add_table(table.clone());
                }
            } else {
                for name in table_names {
                    schema.add_table(self.schema.require_table(name)?.clone());
                }
            }
            Ok(schema)
        }
    }

    impl CrudData for MemoryConnector {
        fn create(&self, entities: &[Entity]) -> Result<(), DataError> {
            let mut assigned = Vec::new();
            self.write(|tables| {
                entities
                    .iter()
                    .try_for_each(|e| self.create_in(tables, e, &mut assigned))
            })?;
            assign_ids(assigned)?;
            actualize_all(entities);
            Ok(())
        }

        fn update(&self, entities: &[Entity]) -> Result<(), DataError> {
            self.write(|tables| entities.iter().try_for_each(|e| self.update_in(tables, e)))?;
            actualize_all(entities);
            Ok(())
        }

        fn delete(&self, entities: &[Entity]) -> Result<(), DataError> {
            self.write(|tables| entities.iter().try_for_each(|e| self.delete_in(tables, e)))
        }

        fn delete_by_ids(&self, entity_name: &str, key: &str, ids: &[Value]) -> Result<(), DataError> {
            let table = self.table(entity_name)?;
            self.write(|tables| {
                if let Some(rows) = tables.get_mut(&table.name.to_lowercase()) {
                    rows.retain(|row| {
                        let value = row.get_item_value(key).unwrap_or_default();
                        !ids.iter().any(|id| id.text_eq(&value))
                    });
                }
                Ok(())
            })
        }
    }

    impl TransactedData for MemoryConnector {
        fn transaction(&self, set: &mut dyn EntitySet) -> Result<(), DataError> {
            let creating = set.creating();
            let updating = set.updating();
            let deleting = set.take_deleting();
            log::debug!(
                "transaction: {} creating, {} updating, {} deleting",
                creating.len(),
                updating.len(),
                deleting.len()
            );
            let mut assigned = Vec::new();
            self.write(|tables| {
                for entity in &creating {
                    self.create_in(tables, entity, &mut assigned)?;
                }
                for entity in updating.iter().filter(|e| e.state() == EntityState::Modified) {
                    self.update_in(tables, entity)?;
                }
                for entity in &deleting {
                    self.delete_in(tables, entity)?;
                }
                Ok(())
            })?;
            assign_ids(assigned)?;
            actualize_all(&creating);
            actualize_all(&updating);
            Ok(())
        }
    }
}
