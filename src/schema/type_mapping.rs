//! Mapping between SQL type names, [`DataType`] and `SeaQuery` column types.

use sea_query::ColumnDef;

use super::DataType;

/// Map a SQL type name, as reported by a database catalog, to a [`DataType`].
///
/// Matching ignores case and any length suffix such as `varchar(50)`.
/// Unrecognised names map to `DataType::Unknown`.
pub fn data_type_from_sql(sql_type: &str) -> DataType {
    let lower = sql_type.trim().to_lowercase();
    let base = lower.split('(').next().unwrap_or_default().trim();
    match base {
        "tinyint" => DataType::Byte,
        "smallint" => DataType::Int16,
        "int" | "integer" => DataType::Int32,
        "bigint" => DataType::Int64,
        "float" | "real" | "double precision" => DataType::Double,
        "uniqueidentifier" | "uuid" => DataType::Guid,
        "bit" | "boolean" | "bool" => DataType::Boolean,
        "binary" | "varbinary" | "bytea" | "blob" => DataType::Binary,
        "char" | "nchar" | "varchar" | "nvarchar" | "text" | "ntext" | "character varying" => {
            DataType::String
        }
        "decimal" | "numeric" => DataType::Decimal,
        "money" | "smallmoney" => DataType::Currency,
        "datetime" | "smalldatetime" | "date" => DataType::Date,
        "time" | "timestamp" => DataType::Time,
        _ => DataType::Unknown,
    }
}

/// Configure a `SeaQuery` `ColumnDef` for a [`DataType`].
///
/// `length` applies to string columns when positive.
pub(crate) fn apply_column_type(data_type: DataType, length: i32, def: &mut ColumnDef) {
    match data_type {
        DataType::String => {
            if length > 0 {
                def.string_len(length as u32);
            } else {
                def.text();
            }
        }
        DataType::Binary => {
            def.binary();
        }
        DataType::Byte => {
            def.tiny_integer();
        }
        DataType::Boolean => {
            def.boolean();
        }
        DataType::Currency => {
            def.money();
        }
        DataType::Date => {
            def.date();
        }
        DataType::DateTime => {
            def.timestamp();
        }
        DataType::Decimal => {
            def.decimal_len(18, 4);
        }
        DataType::Double => {
            def.double();
        }
        DataType::Guid => {
            def.uuid();
        }
        DataType::Int16 => {
            def.small_integer();
        }
        DataType::Int32 | DataType::OptionSet => {
            def.integer();
        }
        DataType::Int64 | DataType::Reference => {
            def.big_integer();
        }
        DataType::Time => {
            def.time();
        }
        DataType::Array | DataType::Unknown => {
            def.text();
        }
    }
}
