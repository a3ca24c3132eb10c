//! Cross-module integration tests for datacore.
//!
//! No external store is needed: storage-facing cases run against the
//! in-memory connector.

mod collection_units;
mod entity_lifecycle;
mod grammar_round_trip;
mod query_compile;
