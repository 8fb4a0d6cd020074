//! Storage layer
//!
//! SQLite persistence for notes.
//!
//! - `schema`: table layout and schema version
//! - `notes`: row-level queries and writes
//! - `error`: typed storage errors

pub mod error;
pub mod notes;
pub mod schema;

pub use error::{StorageError, StorageResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
