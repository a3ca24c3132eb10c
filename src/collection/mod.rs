//! Collections with key indexes and deletion tracking.
//!
//! ## Modules
//!
//! - **`keyed`** - [`KeyedCollection`], the generic ordered collection with a
//!   `key -> position` index and a `deleting` shadow list
//! - **`entities`** - [`EntityCollection`], entities of one logical name
//! - **`set`** - [`EntitySet`], the unit of work given to a transactional
//!   connector, and record sets that feed it

mod entities;
mod keyed;
mod set;

pub use entities::EntityCollection;
pub use keyed::{Keyed, KeyedCollection};
pub use set::{EntitySet, EntitySetCollection, RecordSet, SetCollection};
