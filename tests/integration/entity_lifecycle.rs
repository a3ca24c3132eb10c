//! State machine, actualization and key inference through the public API.

use std::sync::Arc;

use datacore::schema::ColumnSchema;
use datacore::{is_equal_types, DataType, Entity, EntityState, SchemaRegistry, TableSchema, Value};

// ============================================================================
// State machine
// ============================================================================

#[test]
fn created_entity_stays_created() {
    let e = Entity::new("Order");
    for total in [1i32, 2, 3] {
        assert!(e.set_item_value("Total", total));
    }
    e.set_item_value("Note", "x");
    assert_eq!(e.state(), EntityState::Created);
    assert!(e.old_items().is_empty());
}

#[test]
fn actual_entity_keeps_first_snapshot() {
    let e = Entity::new("Order");
    e.set_item_value("Total", 10i32);
    e.actualization(None);
    assert!(e.set_item_value("Total", 10i32));
    assert_eq!(e.state(), EntityState::Actual);

    e.set_item_value("Total", 11i32);
    assert_eq!(e.state(), EntityState::Modified);
    e.set_item_value("Total", 12i32);
    e.set_item_value("Total", 13i32);
    assert_eq!(e.old_items(), vec![("Total".to_string(), Value::Int32(10))]);
    assert_eq!(e.get::<i32>("Total"), Some(13));
}

#[test]
fn actualization_is_idempotent() {
    for start in [Entity::new("Order"), Entity::actual("Order")] {
        start.set_item_value("Total", 5i32);
        start.actualization(None);
        start.actualization(None);
        assert_eq!(start.state(), EntityState::Actual);
        assert!(start.old_items().is_empty());
    }
}

// ============================================================================
// Key inference
// ============================================================================

#[test]
fn primary_key_from_items() {
    let e = Entity::actual("Order");
    e.set_item_value("OrderId", 42i32);
    assert_eq!(e.primary_key(), "OrderId");
    assert_eq!(e.entity_id(), "42");
}

#[test]
fn primary_key_from_schema_is_memoized() {
    let registry = SchemaRegistry::new();
    let table = TableSchema::new("Order")
        .with_column(ColumnSchema::new("Id", DataType::Int64))
        .and_then(|t| t.with_column(ColumnSchema::new("OrderId", DataType::Int64)))
        .unwrap();
    let table: Arc<TableSchema> = registry.register(table);
    let e = Entity::with_schema(Arc::clone(&table));
    assert_eq!(e.primary_key(), "Id");
    e.set_item_value("OrderId", 7i64);
    assert_eq!(e.primary_key(), "Id");
    assert_eq!(table.primary_key(), Some("Id"));
}

#[test]
fn type_compatibility_is_asymmetric() {
    assert!(is_equal_types(DataType::Int64, DataType::Int32));
    assert!(!is_equal_types(DataType::Int32, DataType::Int64));
    assert!(!is_equal_types(DataType::String, DataType::Int32));
}
