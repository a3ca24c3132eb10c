//! Relation and index metadata.

use serde::{Deserialize, Serialize};

/// Referential action applied when a referenced row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferenceAction {
    None,
    Cascade,
    #[default]
    Restrict,
    SetNull,
    SetDefault,
}

/// Foreign-key relation between two tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSchema {
    pub name: String,
    #[serde(default)]
    pub update: ReferenceAction,
    #[serde(default)]
    pub delete: ReferenceAction,
    #[serde(default)]
    pub share: bool,
    /// Referenced table
    pub to_table: String,
    /// Referencing table
    pub from_table: String,
    /// Referencing column in `from_table`
    pub column: String,
}

impl RelationSchema {
    pub fn new(
        from_table: impl Into<String>,
        column: impl Into<String>,
        to_table: impl Into<String>,
    ) -> Self {
        let from_table = from_table.into();
        let column = column.into();
        let to_table = to_table.into();
        Self {
            name: format!("FK_{}_{}_{}", from_table, column, to_table),
            update: ReferenceAction::default(),
            delete: ReferenceAction::default(),
            share: false,
            to_table,
            from_table,
            column,
        }
    }
}

impl std::fmt::Display for RelationSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RELATION [{}:{}/{}->{}]",
            self.name, self.from_table, self.column, self.to_table
        )
    }
}

/// Table index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub table_name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexSchema {
    pub fn new(name: impl Into<String>, table_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            table_name: table_name.into(),
            columns,
            unique: false,
        }
    }
}

impl std::fmt::Display for IndexSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "INDEX [{}_{}", self.name, self.table_name)?;
        for column in &self.columns {
            write!(f, "_{}", column)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_defaults_to_restrict() {
        let rel = RelationSchema::new("Order", "CustomerId", "Customer");
        assert_eq!(rel.delete, ReferenceAction::Restrict);
        assert_eq!(
            rel.to_string(),
            "RELATION [FK_Order_CustomerId_Customer:Order/CustomerId->Customer]"
        );
    }

    #[test]
    fn test_index_display() {
        let idx = IndexSchema::new("UX", "Order", vec!["Number".into(), "Year".into()]);
        assert_eq!(idx.to_string(), "INDEX [UX_Order_Number_Year]");
    }
}
