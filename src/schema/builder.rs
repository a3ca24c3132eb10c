//! Declarative schema construction.
//!
//! The builder replaces attribute-driven derivation: tables and columns are
//! declared in code and produce the same [`TableSchema`] shape a connector
//! would report.

use super::{
    ColumnSchema, DataType, IndexSchema, OptionSchema, PatternPreset, RelationSchema,
    Requirement, Schema, TableSchema,
};
use crate::config::CoreConfig;
use crate::error::SchemaError;

/// Builder for a [`Schema`]
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: Schema,
    auto_id: bool,
    error: Option<SchemaError>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: Schema::new(name),
            auto_id: true,
            error: None,
        }
    }

    /// Take the identifier column type from configuration
    #[must_use]
    pub fn with_config(mut self, config: &CoreConfig) -> Self {
        self.schema.key_type = config.default_key_type;
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.schema.title = title.into();
        self
    }

    /// Whether tables without a primary key get an `Id` column (default `true`)
    #[must_use]
    pub fn auto_id(mut self, enabled: bool) -> Self {
        self.auto_id = enabled;
        self
    }

    /// Start declaring a table
    pub fn table(self, name: impl Into<String>) -> TableBuilder {
        TableBuilder {
            parent: self,
            table: TableSchema::new(name),
            primary_key: None,
        }
    }

    /// Add a relation not implied by a foreign-key column
    #[must_use]
    pub fn relation(mut self, relation: RelationSchema) -> Self {
        self.schema.relations.push(relation);
        self
    }

    /// Finish the schema; the first recorded declaration error wins
    pub fn build(self) -> Result<Schema, SchemaError> {
        match self.error {
            Some(e) => Err(e),
            None => {
                let mut schema = self.schema;
                schema.created = Some(chrono::Utc::now().naive_utc());
                Ok(schema)
            }
        }
    }

    fn fail(&mut self, error: SchemaError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

/// Builder for one table inside a [`SchemaBuilder`]
#[derive(Debug)]
pub struct TableBuilder {
    parent: SchemaBuilder,
    table: TableSchema,
    primary_key: Option<String>,
}

impl TableBuilder {
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.table.title = title.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.table.description = description.into();
        self
    }

    #[must_use]
    pub fn collection_title(mut self, title: impl Into<String>) -> Self {
        self.table.collection_title = title.into();
        self
    }

    /// Display template, e.g. `{%Name%} ({%Code%})`
    #[must_use]
    pub fn view_format(mut self, format: impl Into<String>) -> Self {
        self.table.view_format = format.into();
        self
    }

    /// Declare the primary key column name explicitly
    #[must_use]
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = Some(name.into());
        self
    }

    /// Declare the parent key column name explicitly
    #[must_use]
    pub fn parent_key(self, name: impl Into<String>) -> Self {
        self.table.set_parent_key(name);
        self
    }

    #[must_use]
    pub fn column(self, name: impl Into<String>, data_type: DataType, requirement: Requirement) -> Self {
        self.column_with(ColumnSchema::new(name, data_type).with_requirement(requirement))
    }

    /// Add a fully described column
    #[must_use]
    pub fn column_with(mut self, column: ColumnSchema) -> Self {
        if let Err(e) = self.table.add_column(column) {
            self.parent.fail(e);
        }
        self
    }

    /// Add a required foreign-key column and the matching relation
    #[must_use]
    pub fn foreign_key(mut self, name: impl Into<String>, table: impl Into<String>) -> Self {
        let name = name.into();
        let target = table.into();
        let key_type = self.parent.schema.key_type;
        self.parent
            .schema
            .relations
            .push(RelationSchema::new(self.table.name.clone(), name.clone(), target.clone()));
        self.column_with(
            ColumnSchema::new(name, key_type)
                .with_requirement(Requirement::REQUIRED_FOREIGN_KEY)
                .with_foreign_table(target),
        )
    }

    /// Add an option-set column with its catalog
    #[must_use]
    pub fn option_set(self, name: impl Into<String>, requirement: Requirement, options: Vec<OptionSchema>) -> Self {
        self.column_with(
            ColumnSchema::new(name, DataType::OptionSet)
                .with_requirement(requirement)
                .with_options(options),
        )
    }

    /// Add a text column validated by a preset pattern
    #[must_use]
    pub fn pattern_column(self, name: impl Into<String>, preset: PatternPreset, requirement: Requirement) -> Self {
        self.column_with(
            ColumnSchema::new(name, DataType::String)
                .with_requirement(requirement)
                .with_pattern(preset.pattern()),
        )
    }

    /// Add an index over existing columns
    #[must_use]
    pub fn index(mut self, name: impl Into<String>, columns: &[&str], unique: bool) -> Self {
        for col in columns {
            if self.table.column(col).is_none() {
                let table = self.table.name.clone();
                self.parent.fail(SchemaError::ColumnNotFound {
                    table,
                    column: col.to_string(),
                });
                return self;
            }
        }
        let mut index = IndexSchema::new(
            name,
            self.table.name.clone(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        index.unique = unique;
        self.table.indexes.push(index);
        self
    }

    /// Finish this table and start the next one
    pub fn table(self, name: impl Into<String>) -> TableBuilder {
        self.finish().table(name)
    }

    /// Finish this table and the schema
    pub fn build(self) -> Result<Schema, SchemaError> {
        self.finish().build()
    }

    /// Finish this table and return to the schema builder
    pub fn finish(mut self) -> SchemaBuilder {
        let has_pk = self.primary_key.is_some()
            || self.table.columns().iter().any(|c| c.requirement.is_primary_key());
        if !has_pk && self.parent.auto_id && self.table.column("Id").is_none() {
            let key_type = self.parent.schema.key_type;
            let id = ColumnSchema::new("Id", key_type).with_requirement(Requirement::PRIMARY_KEY);
            if let Err(e) = self.table.insert_column(0, id) {
                self.parent.fail(e);
            }
            self.table.set_primary_key("Id");
        } else if let Some(pk) = self.primary_key.take() {
            if self.table.column(&pk).is_none() {
                let table = self.table.name.clone();
                self.parent.fail(SchemaError::ColumnNotFound { table, column: pk });
            } else {
                self.table.set_primary_key(pk);
            }
        }
        let mut parent = self.parent;
        parent.schema.add_table(self.table);
        parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_adds_id_column() {
        let schema = SchemaBuilder::new("shop")
            .table("Customer")
            .column("Name", DataType::String, Requirement::REQUIRED)
            .build()
            .unwrap();
        let customer = schema.table("Customer").unwrap();
        assert_eq!(customer.columns()[0].name, "Id");
        assert_eq!(customer.columns()[0].data_type, DataType::Int64);
        assert_eq!(customer.columns()[1].order, 1);
        assert_eq!(customer.primary_key(), Some("Id"));
        assert!(schema.created.is_some());
    }

    #[test]
    fn test_builder_foreign_key_creates_relation() {
        let schema = SchemaBuilder::new("shop")
            .table("Customer")
            .table("Order")
            .foreign_key("CustomerId", "Customer")
            .build()
            .unwrap();
        let order = schema.table("Order").unwrap();
        let fk = order.column("CustomerId").unwrap();
        assert_eq!(fk.foreign_table.as_deref(), Some("Customer"));
        assert!(fk.requirement.contains(Requirement::FOREIGN_KEY));
        assert_eq!(schema.relations.len(), 1);
        assert_eq!(schema.relations[0].to_table, "Customer");
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let err = SchemaBuilder::new("shop")
            .table("Customer")
            .column("Name", DataType::String, Requirement::NONE)
            .column("NAME", DataType::String, Requirement::NONE)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_explicit_primary_key() {
        let schema = SchemaBuilder::new("shop")
            .table("Country")
            .column("Code", DataType::String, Requirement::REQUIRED)
            .primary_key("Code")
            .parent_key("Code")
            .build()
            .unwrap();
        let country = schema.table("Country").unwrap();
        assert_eq!(country.columns().len(), 1);
        assert_eq!(country.primary_key(), Some("Code"));
        assert_eq!(country.parent_key(), Some("Code"));
    }

    #[test]
    fn test_config_key_type() {
        let config = CoreConfig {
            default_key_type: DataType::Guid,
            ..CoreConfig::default()
        };
        let schema = SchemaBuilder::new("shop")
            .with_config(&config)
            .table("Tag")
            .build()
            .unwrap();
        assert_eq!(schema.table("Tag").unwrap().columns()[0].data_type, DataType::Guid);
    }
}
