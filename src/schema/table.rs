//! Table metadata.
//!
//! A [`TableSchema`] is built once and then shared behind an `Arc`. The only
//! state that changes after construction is the resolved primary and parent
//! key names, which are write-once cells: empty until first resolved, then
//! stable for the lifetime of the table.

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use sea_query::{DynIden, Expr, Index, IndexCreateStatement, Table, TableCreateStatement};
use serde::{Deserialize, Serialize};

use super::{ColumnSchema, DataType, IndexSchema};
use crate::error::SchemaError;

static VIEW_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{%\s*([^%{}]+?)\s*%\}").expect("placeholder regex is valid"));

/// Table metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub collection_title: String,
    #[serde(default)]
    pub schema_name: String,
    /// Display template with `{%column%}` placeholders
    #[serde(default)]
    pub view_format: String,
    #[serde(default)]
    pub many_to_many: bool,
    #[serde(default, with = "memo")]
    primary_key: OnceCell<String>,
    #[serde(default, with = "memo")]
    parent_key: OnceCell<String>,
    #[serde(default)]
    columns: Vec<ColumnSchema>,
    #[serde(default)]
    pub indexes: Vec<IndexSchema>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            description: String::new(),
            collection_title: String::new(),
            schema_name: String::new(),
            view_format: String::new(),
            many_to_many: false,
            primary_key: OnceCell::new(),
            parent_key: OnceCell::new(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Append a column, rejecting a name already present (case-insensitive)
    pub fn add_column(&mut self, mut column: ColumnSchema) -> Result<(), SchemaError> {
        if self.column(&column.name).is_some() {
            return Err(SchemaError::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            });
        }
        column.table_name = self.name.clone();
        if column.order < 0 {
            column.order = self.columns.len() as i32;
        }
        self.columns.push(column);
        Ok(())
    }

    /// Insert a column at `index`, renumbering display order
    pub fn insert_column(&mut self, index: usize, mut column: ColumnSchema) -> Result<(), SchemaError> {
        if self.column(&column.name).is_some() {
            return Err(SchemaError::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            });
        }
        column.table_name = self.name.clone();
        self.columns.insert(index.min(self.columns.len()), column);
        for (order, column) in self.columns.iter_mut().enumerate() {
            column.order = order as i32;
        }
        Ok(())
    }

    /// Builder-style [`add_column`](Self::add_column)
    pub fn with_column(mut self, column: ColumnSchema) -> Result<Self, SchemaError> {
        self.add_column(column)?;
        Ok(self)
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Column by exact name, then by case-insensitive name
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name).or_else(|| {
            let lower = name.to_lowercase();
            self.columns.iter().find(|c| c.name.to_lowercase() == lower)
        })
    }

    /// Resolved primary key name, if any
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.get().map(String::as_str)
    }

    /// Record the primary key name; returns `false` when one is already set
    pub fn set_primary_key(&self, name: impl Into<String>) -> bool {
        self.primary_key.set(name.into()).is_ok()
    }

    /// Resolved parent key name, if any
    pub fn parent_key(&self) -> Option<&str> {
        self.parent_key.get().map(String::as_str)
    }

    /// Record the parent key name; returns `false` when one is already set
    pub fn set_parent_key(&self, name: impl Into<String>) -> bool {
        self.parent_key.set(name.into()).is_ok()
    }

    /// Column used to display a row.
    ///
    /// The first `{%column%}` placeholder of `view_format` naming an existing
    /// column wins; otherwise the first String column.
    pub fn primary_column(&self) -> Option<&ColumnSchema> {
        VIEW_PLACEHOLDER
            .captures_iter(&self.view_format)
            .find_map(|caps| self.column(&caps[1]))
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| c.data_type == DataType::String)
            })
    }

    /// Names of tables referenced through foreign-key columns
    pub fn foreign_tables(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter_map(|c| c.foreign_table.as_deref())
    }

    /// `CREATE TABLE` statement for this table
    pub fn to_create_statement(&self) -> TableCreateStatement {
        let mut table = Table::create();
        table
            .table(DynIden::from(self.name.clone()))
            .if_not_exists();
        for column in &self.columns {
            let mut def = column.to_column_def();
            table.col(&mut def);
        }
        table.to_owned()
    }

    /// `CREATE INDEX` statements for the declared indexes
    pub fn to_index_statements(&self) -> Vec<IndexCreateStatement> {
        self.indexes
            .iter()
            .map(|idx| {
                let mut stmt = Index::create();
                stmt.name(idx.name.clone())
                    .table(DynIden::from(self.name.clone()));
                for col in &idx.columns {
                    stmt.col(Expr::col(DynIden::from(col.clone())));
                }
                if idx.unique {
                    stmt.unique();
                }
                stmt.to_owned()
            })
            .collect()
    }
}

impl std::fmt::Display for TableSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TABLE [{}:{}]", self.name, self.columns.len())
    }
}

/// Serde adapter storing a write-once key name as an optional string.
mod memo {
    use once_cell::sync::OnceCell;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(cell: &OnceCell<String>, s: S) -> Result<S::Ok, S::Error> {
        cell.get().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<OnceCell<String>, D::Error> {
        let cell = OnceCell::new();
        if let Some(name) = Option::<String>::deserialize(d)? {
            if !name.is_empty() {
                let _ = cell.set(name);
            }
        }
        Ok(cell)
    }
}
