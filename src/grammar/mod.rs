//! Compact text grammar for entities, collections and arrays.
//!
//! ```text
//! {"OrderId":7,"Customer":"#REF=Customer/#ID=42","Lines":{#Line[{"Qty":2}]}}
//! ```
//!
//! ## Modules
//!
//! - **`scan`** - delimiter matching and bare-token extraction over `&[char]`
//! - **`infer`** - [`ValueParser`], the token classifier
//! - **`codec`** - [`encode_entity`], [`Decoder`] and friends
//!
//! ## Example
//!
//! ```no_run
//! use datacore::grammar::{encode_entity, parse_entity};
//!
//! let order = parse_entity(r#"{"OrderId":7,"Note":"rush"}"#, "Order").unwrap();
//! assert_eq!(encode_entity(&order), r#"{"OrderId":7,"Note":"rush"}"#);
//! ```

mod codec;
mod infer;
mod scan;

pub use codec::{
    encode_array, encode_collection, encode_entity, encode_value, parse_collection, parse_entity,
    Decoder,
};
pub use infer::{is_number, is_utc_date, NumberCulture, ValueParser};
pub use scan::{add_quotes, next, pair, remove_quotes, text_for_value};
