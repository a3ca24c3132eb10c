//! Error types for schema, entity and connector operations.
//!
//! Grammar decoding does not appear here: malformed text yields `None`
//! rather than an error so that payloads can be treated as untrusted input.

use crate::schema::DataType;

/// Error raised when a name or value does not agree with the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Table name unknown to the schema
    TableNotFound(String),
    /// Column name unknown to the table
    ColumnNotFound { table: String, column: String },
    /// Column declared twice in one table
    DuplicateColumn { table: String, column: String },
    /// Incoming value does not match the declared column type
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
    /// Query option could not be interpreted
    InvalidOption { option: String, text: String },
    /// Schema exchange document could not be read or written
    Exchange(String),
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::TableNotFound(table) => write!(f, "Table {} not found", table),
            SchemaError::ColumnNotFound { table, column } => {
                write!(f, "Column {} not found in table {}", column, table)
            }
            SchemaError::DuplicateColumn { table, column } => {
                write!(f, "Column {} declared twice in table {}", column, table)
            }
            SchemaError::TypeMismatch {
                column,
                expected,
                actual,
            } => write!(
                f,
                "Mismatched types in column {}: expected {:?}, got {:?}",
                column, expected, actual
            ),
            SchemaError::InvalidOption { option, text } => {
                write!(f, "Incorrect {}: {}", option, text)
            }
            SchemaError::Exchange(msg) => write!(f, "Schema exchange error: {}", msg),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Error raised by checked entity mutation.
///
/// The boolean setter (`Entity::set_item_value`) reports the same
/// conditions as `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// Attribute name empty or whitespace
    EmptyName,
    /// Attribute name not present in the bound table schema
    ColumnNotFound { entity: String, column: String },
    /// Value type not accepted by the column
    TypeMismatch {
        entity: String,
        column: String,
        expected: DataType,
        actual: DataType,
    },
    /// Required column holds no value during actualization
    RequiredMissing { entity: String, column: String },
    /// Schema-level failure
    Schema(SchemaError),
}

impl std::fmt::Display for EntityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityError::EmptyName => write!(f, "Attribute name is empty"),
            EntityError::ColumnNotFound { entity, column } => {
                write!(f, "Entity {} has no column {}", entity, column)
            }
            EntityError::TypeMismatch {
                entity,
                column,
                expected,
                actual,
            } => write!(
                f,
                "Type mismatch for {}.{}: expected {:?}, got {:?}",
                entity, column, expected, actual
            ),
            EntityError::RequiredMissing { entity, column } => {
                write!(f, "Required column {}.{} has no value", entity, column)
            }
            EntityError::Schema(e) => write!(f, "Schema error: {}", e),
        }
    }
}

impl std::error::Error for EntityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EntityError::Schema(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SchemaError> for EntityError {
    fn from(e: SchemaError) -> Self {
        EntityError::Schema(e)
    }
}

/// Error surfaced at the connector boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// Requested entity does not exist in the store
    NotFound(String),
    /// Named data source is not registered
    SourceNotFound(String),
    /// Schema contract violation
    Schema(SchemaError),
    /// Entity mutation failure
    Entity(EntityError),
    /// Failure reported by the connector implementation
    Connector(String),
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NotFound(what) => write!(f, "Not found: {}", what),
            DataError::SourceNotFound(name) => write!(f, "Data source {} is not registered", name),
            DataError::Schema(e) => write!(f, "Schema error: {}", e),
            DataError::Entity(e) => write!(f, "Entity error: {}", e),
            DataError::Connector(msg) => write!(f, "Connector error: {}", msg),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Schema(e) => Some(e),
            DataError::Entity(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SchemaError> for DataError {
    fn from(e: SchemaError) -> Self {
        DataError::Schema(e)
    }
}

impl From<EntityError> for DataError {
    fn from(e: EntityError) -> Self {
        DataError::Entity(e)
    }
}
