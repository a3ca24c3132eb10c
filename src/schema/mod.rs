//! Schema model: metadata describing tables, columns, keys and relations.
//!
//! A [`Schema`] is the exchange shape handed over by a connector or produced
//! by [`SchemaBuilder`]. At runtime tables live in a [`SchemaRegistry`] behind
//! `Arc`s and are referenced, never owned, by entities.
//!
//! # Example
//!
//! ```no_run
//! use datacore::schema::{DataType, Requirement, SchemaBuilder, SchemaRegistry};
//!
//! let schema = SchemaBuilder::new("shop")
//!     .table("Customer")
//!     .column("Name", DataType::String, Requirement::REQUIRED)
//!     .table("Order")
//!     .column("Total", DataType::Decimal, Requirement::NONE)
//!     .foreign_key("CustomerId", "Customer")
//!     .build()?;
//!
//! let registry = SchemaRegistry::from_schema(schema);
//! assert_eq!(registry.primary_key("order").as_deref(), Some("Id"));
//! # Ok::<(), datacore::SchemaError>(())
//! ```

mod builder;
mod column;
mod data_type;
pub mod keys;
mod registry;
mod relation;
mod table;
mod type_mapping;

pub use builder::{SchemaBuilder, TableBuilder};
pub use column::{length_pattern, ColumnSchema, OptionSchema, PatternPreset};
pub use data_type::{is_equal_types, DataType, Requirement};
pub use registry::SchemaRegistry;
pub use relation::{IndexSchema, ReferenceAction, RelationSchema};
pub use table::TableSchema;
pub use type_mapping::data_type_from_sql;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// A set of tables and the relations between them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Type of generated identifier columns
    #[serde(default = "default_key_type")]
    pub key_type: DataType,
    #[serde(default)]
    pub created: Option<NaiveDateTime>,
    #[serde(default)]
    tables: Vec<TableSchema>,
    #[serde(default)]
    pub relations: Vec<RelationSchema>,
}

fn default_key_type() -> DataType {
    DataType::Int64
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            description: String::new(),
            key_type: default_key_type(),
            created: None,
            tables: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Append a table, replacing one with the same name
    pub fn add_table(&mut self, table: TableSchema) {
        let lower = table.name.to_lowercase();
        match self.tables.iter_mut().find(|t| t.name.to_lowercase() == lower) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn into_tables(self) -> Vec<TableSchema> {
        self.tables
    }

    /// Table by name, ignoring case and any `schema.` qualifier
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        let (_, table) = split_qualified_name(name);
        let lower = table.to_lowercase();
        self.tables.iter().find(|t| t.name.to_lowercase() == lower)
    }

    /// Like [`table`](Self::table) but failing with `SchemaError::TableNotFound`
    pub fn require_table(&self, name: &str) -> Result<&TableSchema, SchemaError> {
        self.table(name)
            .ok_or_else(|| SchemaError::TableNotFound(name.to_string()))
    }

    /// Order tables so that referenced tables precede the tables referencing them.
    ///
    /// Dependencies come from foreign-key columns and from relations.
    /// Independent tables keep their relative order; tables caught in a
    /// cycle are appended in their original order.
    pub fn sort_tables(&mut self) {
        let deps: Vec<Vec<String>> = self
            .tables
            .iter()
            .map(|t| {
                let own = t.name.to_lowercase();
                let mut d: Vec<String> = t
                    .foreign_tables()
                    .map(str::to_lowercase)
                    .chain(
                        self.relations
                            .iter()
                            .filter(|r| r.from_table.to_lowercase() == own)
                            .map(|r| r.to_table.to_lowercase()),
                    )
                    .filter(|name| *name != own)
                    .collect();
                d.dedup();
                d
            })
            .collect();
        let known: Vec<String> = self.tables.iter().map(|t| t.name.to_lowercase()).collect();

        let mut placed: Vec<String> = Vec::with_capacity(self.tables.len());
        let mut order: Vec<usize> = Vec::with_capacity(self.tables.len());
        let mut pending: Vec<usize> = (0..self.tables.len()).collect();
        while !pending.is_empty() {
            let ready = pending.iter().position(|&i| {
                deps[i]
                    .iter()
                    .all(|d| !known.contains(d) || placed.contains(d))
            });
            let idx = pending.remove(ready.unwrap_or(0));
            placed.push(known[idx].clone());
            order.push(idx);
        }

        let mut slots: Vec<Option<TableSchema>> = self.tables.drain(..).map(Some).collect();
        self.tables = order.into_iter().filter_map(|i| slots[i].take()).collect();
    }

    /// Serialize to the JSON exchange shape
    pub fn to_json(&self) -> Result<String, SchemaError> {
        serde_json::to_string_pretty(self).map_err(|e| SchemaError::Exchange(e.to_string()))
    }

    /// Read the JSON exchange shape
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(text).map_err(|e| SchemaError::Exchange(e.to_string()))
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SCHEMA [{}:{}]", self.name, self.tables.len())
    }
}

/// Split `schema.table` into its optional schema part and the table name
#[must_use]
pub fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    match name.rsplit_once('.') {
        Some((schema, table)) if !schema.is_empty() => (Some(schema), table),
        Some((_, table)) => (None, table),
        None => (None, name),
    }
}
