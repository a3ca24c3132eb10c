//! Entity model: named, dynamically keyed records with change tracking.
//!
//! An [`Entity`] holds an ordered attribute map (`items`), a snapshot of the
//! pre-change values of modified attributes (`old_items`) and a list of
//! nested child entities. When a [`TableSchema`] is bound, writes are
//! validated against its columns.
//!
//! ## State machine
//!
//! - `Created` entities stay `Created` on writes.
//! - `Actual` entities become `Modified` on the first differing write.
//! - While `Modified`, the first write to each attribute snapshots its prior
//!   value into `old_items`; later writes keep that first snapshot.
//! - [`Entity::actualization`] clears `old_items` and resets to `Actual`.
//!
//! ## Handles
//!
//! `Entity` is a shared handle: `Clone` yields another handle to the same
//! record. [`Entity::clone_entity`] implements record cloning, where a
//! non-fast clone is a new record that still shares the attribute storage
//! with its source.
//!
//! # Example
//!
//! ```no_run
//! use datacore::{Entity, EntityState, Value};
//!
//! let order = Entity::actual("Order");
//! order.set_item_value("OrderId", 42i64);
//! order.actualization(None);
//! order.set_item_value("Total", 10.5f64);
//! assert_eq!(order.state(), EntityState::Modified);
//! assert_eq!(order.old_items()[0], ("Total".to_string(), Value::Null));
//! assert_eq!(order.to_string(), "Order[42]");
//! ```

mod convert;
mod items;
mod merge;

pub use items::ItemMap;
pub use merge::{best_match, MergeRules};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EntityError;
use crate::schema::{is_equal_types, keys, DataType, SchemaRegistry, TableSchema};
use crate::value::{coerce, Value, ValueType};

/// Change state of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityState {
    /// Matches the stored record
    Actual,
    /// New, never stored
    Created,
    /// Stored record with pending changes
    Modified,
}

impl std::fmt::Display for EntityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityState::Actual => "Actual",
            EntityState::Created => "Created",
            EntityState::Modified => "Modified",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default)]
struct Store {
    items: ItemMap,
    old_items: ItemMap,
}

#[derive(Debug)]
struct Node {
    name: String,
    schema: Option<Arc<TableSchema>>,
    state: EntityState,
    store: Arc<Mutex<Store>>,
    children: Vec<Entity>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Named record with change tracking
#[derive(Debug, Clone)]
pub struct Entity {
    node: Arc<Mutex<Node>>,
}

impl Entity {
    fn from_node(name: String, schema: Option<Arc<TableSchema>>, state: EntityState, store: Store) -> Self {
        Self {
            node: Arc::new(Mutex::new(Node {
                name,
                schema,
                state,
                store: Arc::new(Mutex::new(store)),
                children: Vec::new(),
            })),
        }
    }

    /// New entity without schema, in state `Created`
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_node(name.into(), None, EntityState::Created, Store::default())
    }

    /// Entity read from a store, in state `Actual`
    pub fn actual(name: impl Into<String>) -> Self {
        Self::from_node(name.into(), None, EntityState::Actual, Store::default())
    }

    /// New entity bound to a table schema, in state `Created`
    pub fn with_schema(schema: Arc<TableSchema>) -> Self {
        Self::from_node(schema.name.clone(), Some(schema), EntityState::Created, Store::default())
    }

    /// New entity bound to the registered table `name`, or unbound when the
    /// registry does not know it
    pub fn from_registry(registry: &SchemaRegistry, name: &str) -> Self {
        match registry.get(name) {
            Some(table) => Self::with_schema(table),
            None => Self::new(name),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Node> {
        lock(&self.node)
    }

    fn store(&self) -> Arc<Mutex<Store>> {
        Arc::clone(&self.lock().store)
    }

    /// Whether both handles point at the same record
    #[must_use]
    pub fn ptr_eq(&self, other: &Entity) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Whether both records share attribute storage
    #[must_use]
    pub fn shares_items_with(&self, other: &Entity) -> bool {
        Arc::ptr_eq(&self.store(), &other.store())
    }

    /// Logical name: the bound table's name, otherwise the explicit name
    pub fn entity_name(&self) -> String {
        let node = self.lock();
        match &node.schema {
            Some(table) => table.name.clone(),
            None => node.name.clone(),
        }
    }

    pub fn schema(&self) -> Option<Arc<TableSchema>> {
        self.lock().schema.clone()
    }

    pub fn state(&self) -> EntityState {
        self.lock().state
    }

    /// Snapshot of the current attributes, in insertion order
    pub fn items(&self) -> Vec<(String, Value)> {
        lock(&self.store()).items.to_vec()
    }

    /// Snapshot of pre-change values of modified attributes
    pub fn old_items(&self) -> Vec<(String, Value)> {
        lock(&self.store()).old_items.to_vec()
    }

    pub fn item_names(&self) -> Vec<String> {
        lock(&self.store()).items.keys().map(str::to_string).collect()
    }

    pub fn contains_item(&self, name: &str) -> bool {
        lock(&self.store()).items.contains_key(name)
    }

    /// Value under `name`, then under its lower-case form
    pub fn get_item_value(&self, name: &str) -> Option<Value> {
        let store = self.store();
        let store = lock(&store);
        store
            .items
            .get(name)
            .or_else(|| store.items.get(&name.to_lowercase()))
            .cloned()
    }

    /// Typed read; `None` when absent, null or not convertible
    pub fn get<T: ValueType>(&self, name: &str) -> Option<T> {
        self.get_item_value(name).and_then(|v| T::from_value(&v))
    }

    /// Checked read: an unknown column of the bound schema is an error,
    /// an absent attribute reads as `Null`
    pub fn try_get(&self, name: &str) -> Result<Value, EntityError> {
        if let Some(table) = self.schema() {
            let column = table.column(name).ok_or_else(|| EntityError::ColumnNotFound {
                entity: table.name.clone(),
                column: name.to_string(),
            })?;
            return Ok(self.get_item_value(&column.name).unwrap_or_default());
        }
        Ok(self.get_item_value(name).unwrap_or_default())
    }

    /// Text of the value under `name`, empty when absent
    pub fn get_item_text(&self, name: &str) -> String {
        self.get_item_value(name)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    /// Write an attribute; returns `false` when the write is rejected.
    ///
    /// With a bound schema the name must be a column (matched without
    /// regard to case, stored under the column's name) and a non-null value
    /// must have a compatible type. Writing a value equal to the current one
    /// succeeds without touching the state.
    pub fn set_item_value(&self, name: &str, value: impl Into<Value>) -> bool {
        self.write_item(name, value.into()).is_ok()
    }

    /// Checked write with the same rules as [`set_item_value`](Self::set_item_value)
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), EntityError> {
        self.write_item(name, value.into())
    }

    fn write_item(&self, name: &str, value: Value) -> Result<(), EntityError> {
        if name.trim().is_empty() {
            return Err(EntityError::EmptyName);
        }
        let (schema, store) = {
            let node = self.lock();
            (node.schema.clone(), Arc::clone(&node.store))
        };
        let name = match &schema {
            Some(table) => {
                let column = table.column(name).ok_or_else(|| EntityError::ColumnNotFound {
                    entity: table.name.clone(),
                    column: name.to_string(),
                })?;
                if !value.is_null() && !is_equal_types(column.data_type, value.data_type()) {
                    return Err(EntityError::TypeMismatch {
                        entity: table.name.clone(),
                        column: column.name.clone(),
                        expected: column.data_type,
                        actual: value.data_type(),
                    });
                }
                column.name.clone()
            }
            None => name.to_string(),
        };

        let old = lock(&store).items.get(&name).cloned().unwrap_or_default();
        if old == value || old.text_eq(&value) {
            return Ok(());
        }

        let state = {
            let mut node = self.lock();
            if node.state == EntityState::Actual {
                node.state = EntityState::Modified;
            }
            node.state
        };
        let mut store = lock(&store);
        if state == EntityState::Modified && !store.old_items.contains_key(&name) {
            store.old_items.insert(name.clone(), old);
        }
        store.items.insert(name, value);
        Ok(())
    }

    /// Raw insert used by decoders: no validation, no state change
    pub(crate) fn push_item(&self, name: impl Into<String>, value: Value) {
        lock(&self.store()).items.insert(name, value);
    }

    /// Primary key column name, inferred when no schema fixes it
    pub fn primary_key(&self) -> String {
        let name = self.entity_name();
        match self.schema() {
            Some(table) => keys::infer_primary_key(&name, Some(&table), None),
            None => {
                let items = self.items();
                keys::infer_primary_key(&name, None, Some(&items))
            }
        }
    }

    /// Parent key column name, inferred when no schema fixes it
    pub fn parent_key(&self) -> String {
        let name = self.entity_name();
        match self.schema() {
            Some(table) => keys::infer_parent_key(&name, Some(&table), None),
            None => {
                let items = self.items();
                keys::infer_parent_key(&name, None, Some(&items))
            }
        }
    }

    /// Text of the primary key value, empty when unset
    pub fn entity_id(&self) -> String {
        self.get_item_text(&self.primary_key())
    }

    /// Set the primary key from text.
    ///
    /// When the bound schema types the key column as Int32, Int64 or Guid the
    /// text is parsed, with zero or the nil GUID for unparsable text.
    /// Otherwise the text is stored as is.
    pub fn set_entity_id(&self, id: &str) -> Result<(), EntityError> {
        let key = self.primary_key();
        let key_type = self
            .schema()
            .and_then(|table| table.column(&key).map(|c| c.data_type));
        let value = match key_type {
            Some(DataType::Int32) => Value::Int32(id.trim().parse().unwrap_or(0)),
            Some(DataType::Int64) => Value::Int64(id.trim().parse().unwrap_or(0)),
            Some(DataType::Guid) => Value::Guid(Uuid::parse_str(id.trim()).unwrap_or_else(|_| Uuid::nil())),
            _ => Value::String(id.to_string()),
        };
        self.set(&key, value)
    }

    /// Clone the record.
    ///
    /// - `fast` with a name renames this record in place and returns it,
    ///   dropping its children.
    /// - Otherwise the clone is a new record sharing this record's
    ///   attribute storage (`items` and `old_items`). Children are cloned
    ///   recursively unless `fast` is set, in which case the clone has none.
    pub fn clone_entity(&self, name: Option<&str>, fast: bool) -> Entity {
        let rename = name.filter(|n| !n.trim().is_empty());
        let clone = if rename.is_some() && fast {
            self.clone()
        } else {
            let node = self.lock();
            Entity {
                node: Arc::new(Mutex::new(Node {
                    name: node.name.clone(),
                    schema: node.schema.clone(),
                    state: node.state,
                    store: Arc::clone(&node.store),
                    children: Vec::new(),
                })),
            }
        };
        let children = if fast {
            Vec::new()
        } else {
            self.children()
                .iter()
                .map(|child| child.clone_entity(None, false))
                .collect()
        };
        let mut node = clone.lock();
        node.children = children;
        if let Some(name) = rename {
            node.name = name.to_string();
        }
        drop(node);
        clone
    }

    /// Independent copy with its own attribute storage and copied children
    pub fn duplicate(&self) -> Entity {
        let (name, schema, state, store, children) = {
            let node = self.lock();
            (
                node.name.clone(),
                node.schema.clone(),
                node.state,
                Arc::clone(&node.store),
                node.children.clone(),
            )
        };
        let store = {
            let store = lock(&store);
            Store {
                items: store.items.clone(),
                old_items: store.old_items.clone(),
            }
        };
        let copy = Self::from_node(name, schema, state, store);
        copy.lock().children = children.iter().map(Entity::duplicate).collect();
        copy
    }

    /// Commit pending changes: state `Actual`, `old_items` cleared, and an
    /// optional new name
    pub fn actualization(&self, name: Option<&str>) {
        let store = {
            let mut node = self.lock();
            if let Some(name) = name.filter(|n| !n.is_empty()) {
                node.name = name.to_string();
            }
            node.state = EntityState::Actual;
            Arc::clone(&node.store)
        };
        lock(&store).old_items.clear();
    }

    /// Validate and normalize against `schema`, bind it, then actualize.
    ///
    /// Each column's value is coerced to the declared type when its current
    /// type is not compatible; a value that cannot be coerced is kept. Fails
    /// without binding when a required column holds no value.
    pub fn actualization_with_schema(&self, schema: Arc<TableSchema>) -> Result<(), EntityError> {
        let store = self.store();
        {
            let mut store = lock(&store);
            for column in schema.columns() {
                let value = store.items.get(&column.name).cloned().unwrap_or_default();
                if column.is_required() && value.is_null() {
                    return Err(EntityError::RequiredMissing {
                        entity: schema.name.clone(),
                        column: column.name.clone(),
                    });
                }
                if value.is_null() || is_equal_types(column.data_type, value.data_type()) {
                    continue;
                }
                if let Some(coerced) = coerce(&value, column.data_type) {
                    store.items.insert(column.name.clone(), coerced);
                }
            }
        }
        self.lock().schema = Some(schema);
        self.actualization(None);
        Ok(())
    }

    /// Depth-first lookup in this record, then its children
    pub fn search_named_value(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.get_item_value(name) {
            if !value.is_null() {
                return Some(value);
            }
        }
        self.children()
            .iter()
            .find_map(|child| child.search_named_value(name))
    }

    pub fn children(&self) -> Vec<Entity> {
        self.lock().children.clone()
    }

    pub fn add_child(&self, child: Entity) {
        self.lock().children.push(child);
    }
}

/// Entities compare by identity
impl PartialEq for Entity {
    fn eq(&self, other: &Entity) -> bool {
        self.ptr_eq(other)
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.entity_name(), self.entity_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSchema, Requirement};

    fn customer_table() -> Arc<TableSchema> {
        let table = TableSchema::new("Customer")
            .with_column(ColumnSchema::new("Id", DataType::Int64).with_requirement(Requirement::PRIMARY_KEY))
            .and_then(|t| t.with_column(ColumnSchema::new("Name", DataType::String).with_requirement(Requirement::REQUIRED)))
            .and_then(|t| t.with_column(ColumnSchema::new("Age", DataType::Int32)))
            .and_then(|t| t.with_column(ColumnSchema::new("Active", DataType::Boolean)))
            .unwrap();
        Arc::new(table)
    }

    #[test]
    fn test_created_stays_created() {
        let e = Entity::new("Note");
        for i in 0..3 {
            assert!(e.set_item_value("Text", format!("v{}", i)));
        }
        assert_eq!(e.state(), EntityState::Created);
        assert!(e.old_items().is_empty());
    }

    #[test]
    fn test_first_snapshot_wins() {
        let e = Entity::actual("Note");
        {
            let store = e.store();
            lock(&store).items.insert("Text", Value::from("a"));
        }
        e.set_item_value("Text", "b");
        e.set_item_value("Text", "c");
        assert_eq!(e.state(), EntityState::Modified);
        assert_eq!(e.old_items(), vec![("Text".to_string(), Value::from("a"))]);
        assert_eq!(e.get_item_text("Text"), "c");
    }

    #[test]
    fn test_equal_write_is_noop() {
        let e = Entity::actual("Note");
        e.set_item_value("Count", 5i32);
        e.actualization(None);
        assert!(e.set_item_value("Count", "5"));
        assert_eq!(e.state(), EntityState::Actual);
        assert!(e.set_item_value("Missing", Value::Null));
        assert_eq!(e.state(), EntityState::Actual);
    }

    #[test]
    fn test_schema_validation() {
        let e = Entity::with_schema(customer_table());
        assert!(e.set_item_value("name", "Acme"));
        assert_eq!(e.item_names(), vec!["Name".to_string()]);
        assert!(!e.set_item_value("Unknown", 1i32));
        assert!(!e.set_item_value("Age", "old"));
        assert!(e.set_item_value("Age", 12i16));
        assert!(e.set_item_value("Age", Value::Null));
        assert!(matches!(
            e.set("Age", 1.5f64),
            Err(EntityError::TypeMismatch { expected: DataType::Int32, actual: DataType::Double, .. })
        ));
        assert!(matches!(e.try_get("Nope"), Err(EntityError::ColumnNotFound { .. })));
        assert!(!e.set_item_value(" ", 1i32));
    }

    #[test]
    fn test_entity_id_and_display() {
        let e = Entity::with_schema(customer_table());
        e.set_entity_id("17").unwrap();
        assert_eq!(e.get_item_value("Id"), Some(Value::Int64(17)));
        assert_eq!(e.to_string(), "Customer[17]");
        e.set_entity_id("x").unwrap();
        assert_eq!(e.entity_id(), "0");

        let loose = Entity::new("Order");
        assert_eq!(loose.primary_key(), "Id");
        loose.set_item_value("OrderId", 42i32);
        assert_eq!(loose.primary_key(), "OrderId");
        assert_eq!(loose.to_string(), "Order[42]");
    }

    #[test]
    fn test_actualization_always_clean() {
        for e in [Entity::new("A"), Entity::actual("A")] {
            e.set_item_value("x", 1i32);
            e.set_item_value("x", 2i32);
            e.actualization(Some("B"));
            assert_eq!(e.state(), EntityState::Actual);
            assert!(e.old_items().is_empty());
            assert_eq!(e.entity_name(), "B");
        }
    }

    #[test]
    fn test_actualization_with_schema_coerces() {
        let e = Entity::new("Customer");
        e.set_item_value("Name", "Acme");
        e.set_item_value("Age", "41");
        e.set_item_value("Id", 3i32);
        e.set_item_value("Active", 1i64);
        e.actualization_with_schema(customer_table()).unwrap();
        assert_eq!(e.get_item_value("Age"), Some(Value::Int32(41)));
        assert_eq!(e.get_item_value("Id"), Some(Value::Int32(3)));
        assert_eq!(e.get_item_value("Active"), Some(Value::Bool(true)));
        assert_eq!(e.state(), EntityState::Actual);
        assert!(e.schema().is_some());
    }

    #[test]
    fn test_actualization_with_schema_requires_values() {
        let e = Entity::new("Customer");
        e.set_item_value("Id", 1i64);
        let err = e.actualization_with_schema(customer_table()).unwrap_err();
        assert_eq!(
            err,
            EntityError::RequiredMissing {
                entity: "Customer".to_string(),
                column: "Name".to_string()
            }
        );
        assert!(e.schema().is_none());
        assert_eq!(e.state(), EntityState::Created);
    }

    #[test]
    fn test_clone_shares_items() {
        let parent = Entity::new("Folder");
        parent.set_item_value("Name", "root");
        let child = Entity::new("File");
        parent.add_child(child.clone());

        let deep = parent.clone_entity(None, false);
        assert!(!deep.ptr_eq(&parent));
        assert!(deep.shares_items_with(&parent));
        assert_eq!(deep.children().len(), 1);
        assert!(!deep.children()[0].ptr_eq(&child));
        deep.set_item_value("Name", "changed");
        assert_eq!(parent.get_item_text("Name"), "changed");

        let renamed = parent.clone_entity(Some("Archive"), true);
        assert!(renamed.ptr_eq(&parent));
        assert_eq!(parent.entity_name(), "Archive");
        assert!(parent.children().is_empty());
    }

    #[test]
    fn test_duplicate_is_independent() {
        let e = Entity::new("Folder");
        e.set_item_value("Name", "root");
        let copy = e.duplicate();
        copy.set_item_value("Name", "other");
        assert_eq!(e.get_item_text("Name"), "root");
    }

    #[test]
    fn test_search_named_value() {
        let root = Entity::new("Root");
        let child = Entity::new("Child");
        let grandchild = Entity::new("Leaf");
        grandchild.set_item_value("Code", "X1");
        child.add_child(grandchild);
        root.add_child(child);
        assert_eq!(root.search_named_value("Code"), Some(Value::from("X1")));
        assert_eq!(root.search_named_value("CODE"), None);
        assert_eq!(root.search_named_value("Missing"), None);
    }

    #[test]
    fn test_registry_binding() {
        let registry = SchemaRegistry::new();
        registry.register((*customer_table()).clone());
        let bound = Entity::from_registry(&registry, "customer");
        assert!(bound.schema().is_some());
        assert_eq!(bound.entity_name(), "Customer");
        let unbound = Entity::from_registry(&registry, "Invoice");
        assert!(unbound.schema().is_none());
    }
}
