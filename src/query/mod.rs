//! Query model and its compilers.
//!
//! A [`Query`] names an entity, the columns to return, a [`Filter`] tree,
//! orders, single-hop [`Link`]s and paging. It compiles to an OData option
//! string ([`Query::to_odata`]) or a `sea-query` `SELECT`
//! ([`Query::to_select_statement`]), and its filter can be evaluated in
//! memory ([`Filter::matches`]).
//!
//! ## Modules
//!
//! - **`model`** - the query tree
//! - **`odata`** - OData compiler
//! - **`parser`** - [`ODataQueryParser`], OData options back to a query
//! - **`sql`** - `sea-query` compiler
//! - **`eval`** - in-memory filter evaluation
//!
//! # Example
//!
//! ```no_run
//! use datacore::query::{ConditionOperator, OrderType, Query};
//!
//! let mut query = Query::new("Customer");
//! query
//!     .criteria_mut()
//!     .add_condition("Age", ConditionOperator::GreaterThan, 18)
//!     .add_condition("Age", ConditionOperator::LessThan, 65);
//! query.add_order("Name", OrderType::Ascending);
//! query.top = 10;
//!
//! assert_eq!(
//!     query.odata_options(),
//!     "$filter=Age gt 18 and Age lt 65&$orderby=Name&$top=10"
//! );
//! ```

pub(crate) mod eval;
mod model;
mod odata;
mod parser;
mod sql;

pub use model::{
    Condition, ConditionOperator, Filter, JoinOperator, Link, LogicalOperator, Order, OrderType,
    PagingInfo, Query,
};
pub use odata::odata_value;
pub use parser::ODataQueryParser;
pub use sql::filter_condition;
