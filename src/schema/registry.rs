//! Process-wide table-schema cache.
//!
//! A [`SchemaRegistry`] is constructed once at startup and passed by reference
//! to whatever needs table metadata. Lookups are case-insensitive. The lock is
//! held across read-and-insert and across key resolution, since resolution
//! writes the memoized key names into the cached table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{keys, Schema, TableSchema};

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: Mutex<HashMap<String, Arc<TableSchema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every table of `schema`
    pub fn from_schema(schema: Schema) -> Self {
        let registry = Self::new();
        registry.register_schema(schema);
        registry
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<TableSchema>>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a table; existing holders keep the old `Arc`
    pub fn register(&self, table: TableSchema) -> Arc<TableSchema> {
        let table = Arc::new(table);
        let previous = self
            .lock()
            .insert(table.name.to_lowercase(), Arc::clone(&table));
        if previous.is_some() {
            log::debug!("replaced cached schema for table {}", table.name);
        }
        table
    }

    /// Register every table of a schema
    pub fn register_schema(&self, schema: Schema) -> Vec<Arc<TableSchema>> {
        schema
            .into_tables()
            .into_iter()
            .map(|t| self.register(t))
            .collect()
    }

    /// Table by name, ignoring case
    pub fn get(&self, name: &str) -> Option<Arc<TableSchema>> {
        self.lock().get(&name.to_lowercase()).cloned()
    }

    /// Cached table, or the result of `build` inserted under `name`
    pub fn get_or_insert_with<F>(&self, name: &str, build: F) -> Arc<TableSchema>
    where
        F: FnOnce() -> TableSchema,
    {
        let mut tables = self.lock();
        Arc::clone(
            tables
                .entry(name.to_lowercase())
                .or_insert_with(|| Arc::new(build())),
        )
    }

    pub fn remove(&self, name: &str) -> Option<Arc<TableSchema>> {
        self.lock().remove(&name.to_lowercase())
    }

    /// Names of the cached tables, sorted
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().values().map(|t| t.name.clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Resolve a cached table's primary key under the registry lock
    pub fn primary_key(&self, name: &str) -> Option<String> {
        let tables = self.lock();
        let table = tables.get(&name.to_lowercase())?;
        Some(keys::resolve_primary_key(table).unwrap_or_else(|| keys::fallback_primary_key(&table.name)))
    }

    /// Resolve a cached table's parent key under the registry lock
    pub fn parent_key(&self, name: &str) -> Option<String> {
        let tables = self.lock();
        let table = tables.get(&name.to_lowercase())?;
        Some(keys::resolve_parent_key(table).unwrap_or_else(|| keys::fallback_parent_key(&table.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSchema, DataType};
    use std::thread;

    fn order() -> TableSchema {
        TableSchema::new("Order")
            .with_column(ColumnSchema::new("Id", DataType::Int64))
            .unwrap()
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = SchemaRegistry::new();
        registry.register(order());
        assert!(registry.get("ORDER").is_some());
        assert!(registry.get("Customer").is_none());
        assert_eq!(registry.table_names(), vec!["Order".to_string()]);
    }

    #[test]
    fn test_get_or_insert_builds_once() {
        let registry = SchemaRegistry::new();
        let first = registry.get_or_insert_with("Order", order);
        let second = registry.get_or_insert_with("order", || panic!("must not rebuild"));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_key_resolution_is_shared_across_handles() {
        let registry = SchemaRegistry::new();
        let handle = registry.register(order());
        assert_eq!(registry.primary_key("order").as_deref(), Some("Id"));
        assert_eq!(handle.primary_key(), Some("Id"));
    }

    #[test]
    fn test_concurrent_resolution() {
        let registry = Arc::new(SchemaRegistry::new());
        registry.register(order());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.primary_key("Order"))
            })
            .collect();
        for worker in workers {
            assert_eq!(worker.join().unwrap().as_deref(), Some("Id"));
        }
    }
}
