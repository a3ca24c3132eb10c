//! Parser for OData query options.
//!
//! Reads `$select`, `$expand`, `$orderby`, `$top` and `$skip` against a
//! schema; every name is checked and failures surface as [`SchemaError`].
//! `$filter` is accepted but not interpreted.

use std::collections::HashMap;

use super::model::{JoinOperator, Link, Order, OrderType, Query};
use crate::error::SchemaError;
use crate::schema::{keys, ColumnSchema, Schema, TableSchema};

/// OData options parsed against one table of a schema
#[derive(Debug)]
pub struct ODataQueryParser<'a> {
    schema: &'a Schema,
    table: &'a TableSchema,
    options: HashMap<String, String>,
}

impl<'a> ODataQueryParser<'a> {
    /// Split `query` into options.
    ///
    /// Options are separated by `&`, or by `&$` when the text starts with
    /// `$`. A part without `=` continues the previous option.
    pub fn new(schema: &'a Schema, table: &str, query: &str) -> Result<Self, SchemaError> {
        let table_name = table.trim_matches([' ', '(']);
        let table = schema
            .table(table_name)
            .ok_or_else(|| SchemaError::TableNotFound(table_name.to_string()))?;
        let mut options: HashMap<String, String> = HashMap::new();
        let query = query.trim();
        let (body, separator) = match query.strip_prefix('$') {
            Some(rest) => (rest, "&$"),
            None => (query, "&"),
        };
        let mut key = String::new();
        for part in body.split(separator).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some((name, value)) => {
                    key = name.trim().trim_start_matches('$').to_lowercase();
                    options.insert(key.clone(), value.to_string());
                }
                None => {
                    let entry = options.entry(key.clone()).or_default();
                    entry.push('&');
                    entry.push_str(part);
                }
            }
        }
        Ok(Self {
            schema,
            table,
            options,
        })
    }

    fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    fn column(&self, name: &str) -> Result<&'a ColumnSchema, SchemaError> {
        self.table.column(name).ok_or_else(|| SchemaError::ColumnNotFound {
            table: self.table.name.clone(),
            column: name.to_string(),
        })
    }

    /// Selected column names as declared by the schema
    pub fn parse_select(&self) -> Result<Vec<String>, SchemaError> {
        let Some(text) = self.option("select") else {
            return Ok(Vec::new());
        };
        text.split(',')
            .map(|part| self.column(part.trim()).map(|c| c.name.clone()))
            .collect()
    }

    /// First expanded foreign-key column.
    ///
    /// Each entry is `Table` or `Table/Column`; the column defaults to
    /// `<Table>Id`. Every named table and column must exist.
    pub fn parse_expand(&self) -> Result<Option<&'a ColumnSchema>, SchemaError> {
        let Some(text) = self.option("expand") else {
            return Ok(None);
        };
        for part in text.split(',') {
            let mut pieces = part.trim().splitn(2, '/');
            let table = pieces.next().unwrap_or_default().trim();
            if table.is_empty() {
                return Err(SchemaError::InvalidOption {
                    option: "expand".to_string(),
                    text: text.to_string(),
                });
            }
            let name = match pieces.next() {
                Some(column) => column.trim().to_string(),
                None => format!("{}Id", table),
            };
            self.schema
                .table(table)
                .ok_or_else(|| SchemaError::TableNotFound(table.to_string()))?;
            let column = self.column(&name)?;
            let linked = column
                .foreign_table
                .as_deref()
                .is_some_and(|f| f.eq_ignore_ascii_case(table));
            if linked {
                return Ok(Some(column));
            }
        }
        Ok(None)
    }

    /// Orders as `Column [asc|desc]`, comma separated; direction defaults
    /// to ascending
    pub fn parse_order_by(&self) -> Result<Vec<Order>, SchemaError> {
        let Some(text) = self.option("orderby") else {
            return Ok(Vec::new());
        };
        let invalid = || SchemaError::InvalidOption {
            option: "orderBy".to_string(),
            text: text.to_string(),
        };
        let mut orders = Vec::new();
        for part in text.split(',') {
            let words: Vec<&str> = part.split_whitespace().collect();
            let order_type = match words.get(1).map(|w| w.to_lowercase()).as_deref() {
                None | Some("asc") => OrderType::Ascending,
                Some("desc") => OrderType::Descending,
                Some(_) => return Err(invalid()),
            };
            if words.len() > 2 {
                return Err(invalid());
            }
            let name = words.first().ok_or_else(invalid)?;
            let column = self.table.column(name).ok_or_else(invalid)?;
            orders.push(Order::new(column.name.clone(), order_type));
        }
        Ok(orders)
    }

    fn parse_count(&self, option: &str) -> Result<Option<i64>, SchemaError> {
        let Some(text) = self.option(option) else {
            return Ok(None);
        };
        text.trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| SchemaError::InvalidOption {
                option: option.to_string(),
                text: text.to_string(),
            })
    }

    pub fn parse_top(&self) -> Result<Option<i64>, SchemaError> {
        self.parse_count("top")
    }

    pub fn parse_skip(&self) -> Result<Option<i64>, SchemaError> {
        self.parse_count("skip")
    }

    /// Query over the table with every supported option applied
    pub fn parse(&self) -> Result<Query, SchemaError> {
        if self.option("filter").is_some() {
            log::debug!("{}: $filter is not interpreted", self.table.name);
        }
        let mut query = Query::new(self.table.name.clone());
        query.columns = self.parse_select()?;
        if let Some(column) = self.parse_expand()? {
            let to_table = column.foreign_table.clone().unwrap_or_default();
            let to_item = self
                .schema
                .table(&to_table)
                .and_then(keys::resolve_primary_key)
                .unwrap_or_else(|| "Id".to_string());
            query.links.push(Link::new(
                query.entity_name.clone(),
                to_table,
                column.name.clone(),
                to_item,
                JoinOperator::Inner,
            ));
        }
        query.orders = self.parse_order_by()?;
        query.top = self.parse_top()?.unwrap_or_default();
        query.skip = self.parse_skip()?.unwrap_or_default();
        Ok(query)
    }
}

impl Query {
    /// Query over `table` built from OData option text
    pub fn from_odata(schema: &Schema, table: &str, text: &str) -> Result<Query, SchemaError> {
        ODataQueryParser::new(schema, table, text)?.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataType, Requirement, SchemaBuilder};

    fn shop() -> Schema {
        SchemaBuilder::new("shop")
            .table("Customer")
            .column("Name", DataType::String, Requirement::REQUIRED)
            .column("Age", DataType::Int32, Requirement::NONE)
            .table("Order")
            .column("Total", DataType::Decimal, Requirement::NONE)
            .foreign_key("CustomerId", "Customer")
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_full_query() {
        let schema = shop();
        let q = Query::from_odata(
            &schema,
            "order",
            "$select=total,CustomerId&$expand=Customer&$orderby=Total desc&$top=10&$skip=20",
        )
        .unwrap();
        assert_eq!(q.entity_name, "Order");
        assert_eq!(q.columns, vec!["Total", "CustomerId"]);
        assert_eq!(q.links.len(), 1);
        assert_eq!(q.links[0].to_entity_name, "Customer");
        assert_eq!(q.links[0].from_item_name, "CustomerId");
        assert_eq!(q.links[0].to_item_name, "Id");
        assert_eq!(q.orders, vec![Order::new("Total", OrderType::Descending)]);
        assert_eq!(q.top, 10);
        assert_eq!(q.skip, 20);
    }

    #[test]
    fn test_plain_ampersand_split() {
        let schema = shop();
        let q = Query::from_odata(&schema, "Customer", "orderby=Name&top=5").unwrap();
        assert_eq!(q.orders, vec![Order::new("Name", OrderType::Ascending)]);
        assert_eq!(q.top, 5);
    }

    #[test]
    fn test_unknown_names_rejected() {
        let schema = shop();
        assert!(matches!(
            Query::from_odata(&schema, "Invoice", ""),
            Err(SchemaError::TableNotFound(_))
        ));
        assert!(matches!(
            Query::from_odata(&schema, "Customer", "$select=Email"),
            Err(SchemaError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            Query::from_odata(&schema, "Order", "$expand=Invoice"),
            Err(SchemaError::TableNotFound(_))
        ));
        assert!(matches!(
            Query::from_odata(&schema, "Customer", "$orderby=Name sideways"),
            Err(SchemaError::InvalidOption { .. })
        ));
        assert!(matches!(
            Query::from_odata(&schema, "Customer", "$top=ten"),
            Err(SchemaError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_compiled_options_parse_back() {
        let schema = shop();
        let mut q = Query::new("Customer");
        q.add_column("Name").add_order("Age", OrderType::Descending);
        q.top = 3;
        let back = Query::from_odata(&schema, "Customer", &q.odata_options()).unwrap();
        assert_eq!(back.columns, q.columns);
        assert_eq!(back.orders, q.orders);
        assert_eq!(back.top, 3);
    }
}
