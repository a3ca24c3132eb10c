//! # Datacore
//!
//! Schema-driven entity model for data-access layers: dynamically keyed
//! records with change tracking, keyed collections, a compact text grammar,
//! and a query model that compiles to OData options or SQL.
//!
//! The core performs no I/O. Storage lives behind the traits in
//! [`connector`].
//!
//! ## Modules
//!
//! - **`schema`** - tables, columns, key inference and the [`SchemaRegistry`]
//! - **`value`** - the dynamic [`Value`] and its conversions
//! - **`entity`** - [`Entity`] with `Created` / `Actual` / `Modified` tracking
//! - **`collection`** - [`EntityCollection`], [`KeyedCollection`] and unit-of-work sets
//! - **`grammar`** - `{"key":value}` encoding and decoding
//! - **`query`** - [`Query`], OData and SQL compilation, in-memory filtering
//! - **`record`** - typed records, shapes and synthesized field bags
//! - **`connector`** - the storage contract
//! - **`config`** / **`metrics`** - settings, counters and tracing spans
//!
//! # Example
//!
//! ```no_run
//! use datacore::{grammar, Entity, EntityState};
//!
//! let order = Entity::actual("Order");
//! order.set_item_value("OrderId", 42i64);
//! order.set_item_value("Note", "rush");
//! assert_eq!(order.primary_key(), "OrderId");
//!
//! order.set_item_value("Note", "standard");
//! assert_eq!(order.state(), EntityState::Modified);
//!
//! let text = grammar::encode_entity(&order);
//! let copy = grammar::parse_entity(&text, "Order").unwrap();
//! assert_eq!(copy.get_item_text("Note"), "standard");
//! ```

pub mod collection;
pub mod config;
pub mod connector;
pub mod entity;
pub mod error;
pub mod grammar;
pub mod metrics;
pub mod query;
pub mod record;
pub mod schema;
pub mod value;

pub use collection::{EntityCollection, EntitySet, Keyed, KeyedCollection, SetCollection};
pub use config::CoreConfig;
pub use connector::{CrudData, DataSources, ReadonlyData, TransactedData};
pub use entity::{Entity, EntityState, MergeRules};
pub use error::{DataError, EntityError, SchemaError};
pub use query::{Condition, ConditionOperator, Filter, JoinOperator, LogicalOperator, OrderType, Query};
pub use record::{FieldAccess, Shape, Synthesizer};
pub use schema::{is_equal_types, DataType, Requirement, Schema, SchemaBuilder, SchemaRegistry, TableSchema};
pub use value::{EntityReference, OptionSetValue, Value, ValueType};

#[cfg(any(test, feature = "mock"))]
pub use connector::MemoryConnector;
