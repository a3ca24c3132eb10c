//! Primary and parent key inference.
//!
//! Resolution order for a primary key:
//!
//! 1. the table's already-resolved key;
//! 2. a column matching the candidate set `{id, <name>id, id_<name>, <name>_id, activityid}`
//!    (case-insensitive, key-typed columns only), memoized on the table;
//! 3. without table metadata, an attribute whose name is the fallback or a
//!    candidate and whose value looks like an integer or GUID;
//! 4. the fallback `<Name>Id` (`<name>id` for lower-case entity names).
//!
//! With no table and no attributes at all the key is plain `Id`.

use super::TableSchema;
use crate::value::Value;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
use crate::metrics::METRICS;

/// Key name when neither table metadata nor attributes are available
pub const DEFAULT_PRIMARY_KEY: &str = "Id";

fn primary_candidates(lower: &str) -> [String; 5] {
    [
        "id".to_string(),
        format!("{}id", lower),
        format!("id_{}", lower),
        format!("{}_id", lower),
        "activityid".to_string(),
    ]
}

fn parent_candidates(lower: &str) -> [String; 5] {
    [
        "parentid".to_string(),
        format!("parent{}id", lower),
        format!("parentid_{}", lower),
        format!("parent_id_{}", lower),
        format!("parent_{}_id", lower),
    ]
}

fn starts_lowercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_lowercase)
}

/// Fallback primary key name for an entity
#[must_use]
pub fn fallback_primary_key(entity_name: &str) -> String {
    if starts_lowercase(entity_name) {
        format!("{}id", entity_name)
    } else {
        format!("{}Id", entity_name)
    }
}

/// Fallback parent key name for an entity
#[must_use]
pub fn fallback_parent_key(entity_name: &str) -> String {
    if starts_lowercase(entity_name) {
        format!("parent{}id", entity_name)
    } else {
        "ParentId".to_string()
    }
}

/// Resolve and memoize a table's primary key from its columns.
///
/// Returns `None` when neither a memoized key nor a matching column exists;
/// in that case nothing is recorded on the table.
pub fn resolve_primary_key(table: &TableSchema) -> Option<String> {
    if let Some(pk) = table.primary_key() {
        return Some(pk.to_string());
    }
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::resolve_key_span(&table.name).entered();

    if let Some(column) = table.columns().iter().find(|c| c.requirement.is_primary_key()) {
        table.set_primary_key(column.name.clone());
        return table.primary_key().map(str::to_string);
    }
    let lower = table.name.to_lowercase();
    for candidate in primary_candidates(&lower) {
        let found = table
            .columns()
            .iter()
            .find(|c| c.data_type.is_key_type() && c.name.to_lowercase() == candidate);
        if let Some(column) = found {
            log::debug!("resolved primary key {}.{}", table.name, column.name);
            METRICS.record_key_resolution();
            table.set_primary_key(column.name.clone());
            // A concurrent resolver may have won the cell; its value stands.
            return table.primary_key().map(str::to_string);
        }
    }
    None
}

/// Resolve and memoize a table's parent key from its columns
pub fn resolve_parent_key(table: &TableSchema) -> Option<String> {
    if let Some(pk) = table.parent_key() {
        return Some(pk.to_string());
    }
    let lower = table.name.to_lowercase();
    for candidate in parent_candidates(&lower) {
        if let Some(column) = table.columns().iter().find(|c| c.name.to_lowercase() == candidate) {
            log::debug!("resolved parent key {}.{}", table.name, column.name);
            METRICS.record_key_resolution();
            table.set_parent_key(column.name.clone());
            return table.parent_key().map(str::to_string);
        }
    }
    None
}

/// Infer the primary key name for an entity.
///
/// With table metadata the result comes from the table (memoized) or the
/// fallback. Without it, the attribute map is searched; with no attributes the key is `Id`.
pub fn infer_primary_key(
    entity_name: &str,
    table: Option<&TableSchema>,
    items: Option<&[(String, Value)]>,
) -> String {
    if entity_name.is_empty() {
        return DEFAULT_PRIMARY_KEY.to_string();
    }
    let fallback = fallback_primary_key(entity_name);
    if let Some(table) = table {
        return resolve_primary_key(table).unwrap_or(fallback);
    }
    let items = match items {
        Some(items) if !items.is_empty() => items,
        _ => return DEFAULT_PRIMARY_KEY.to_string(),
    };
    if items.iter().any(|(k, _)| *k == fallback) {
        return fallback;
    }
    let lower = entity_name.to_lowercase();
    for candidate in primary_candidates(&lower) {
        let found = items
            .iter()
            .find(|(k, v)| k.to_lowercase() == candidate && v.is_key_like());
        if let Some((key, _)) = found {
            return key.clone();
        }
    }
    fallback
}

/// Infer the parent key name for an entity
pub fn infer_parent_key(
    entity_name: &str,
    table: Option<&TableSchema>,
    items: Option<&[(String, Value)]>,
) -> String {
    if let Some(table) = table {
        if let Some(key) = resolve_parent_key(table) {
            return key;
        }
        return fallback_parent_key(entity_name);
    }
    if let Some(items) = items {
        let lower = entity_name.to_lowercase();
        for candidate in parent_candidates(&lower) {
            if let Some((key, _)) = items.iter().find(|(k, _)| k.to_lowercase() == candidate) {
                return key.clone();
            }
        }
    }
    fallback_parent_key(entity_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSchema, DataType};

    #[test]
    fn test_fallback_follows_entity_casing() {
        assert_eq!(fallback_primary_key("Order"), "OrderId");
        assert_eq!(fallback_primary_key("order"), "orderid");
        assert_eq!(fallback_parent_key("task"), "parenttaskid");
        assert_eq!(fallback_parent_key("Task"), "ParentId");
    }

    #[test]
    fn test_no_metadata_means_plain_id() {
        assert_eq!(infer_primary_key("Order", None, None), "Id");
        assert_eq!(infer_primary_key("Order", None, Some(&[])), "Id");
        assert_eq!(infer_primary_key("", None, None), "Id");
    }

    #[test]
    fn test_items_fallback_name() {
        let items = vec![("OrderId".to_string(), Value::Int32(42))];
        assert_eq!(infer_primary_key("Order", None, Some(&items)), "OrderId");
    }

    #[test]
    fn test_items_candidate_needs_key_like_value() {
        let items = vec![
            ("order_id".to_string(), Value::String("n/a".into())),
            ("ID".to_string(), Value::String("17".into())),
        ];
        assert_eq!(infer_primary_key("Order", None, Some(&items)), "ID");
    }

    #[test]
    fn test_table_resolution_is_memoized() {
        let table = TableSchema::new("Order")
            .with_column(ColumnSchema::new("Name", DataType::String))
            .and_then(|t| t.with_column(ColumnSchema::new("Id", DataType::Int64)))
            .unwrap();
        assert_eq!(table.primary_key(), None);
        assert_eq!(infer_primary_key("Order", Some(&table), None), "Id");
        assert_eq!(table.primary_key(), Some("Id"));
        let items = vec![("OrderId".to_string(), Value::Int32(5))];
        assert_eq!(infer_primary_key("Order", Some(&table), Some(&items)), "Id");
    }

    #[test]
    fn test_candidate_requires_key_type() {
        let table = TableSchema::new("Order")
            .with_column(ColumnSchema::new("Id", DataType::Double))
            .unwrap();
        assert_eq!(resolve_primary_key(&table), None);
        assert_eq!(table.primary_key(), None);
        assert_eq!(infer_primary_key("Order", Some(&table), None), "OrderId");
    }

    #[test]
    fn test_parent_key_resolution() {
        let table = TableSchema::new("Task")
            .with_column(ColumnSchema::new("Id", DataType::Int64))
            .and_then(|t| t.with_column(ColumnSchema::new("Parent_Task_Id", DataType::Int64)))
            .unwrap();
        assert_eq!(infer_parent_key("Task", Some(&table), None), "Parent_Task_Id");
        assert_eq!(table.parent_key(), Some("Parent_Task_Id"));
    }
}
