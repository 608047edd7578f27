// ============================================================================
// docorm Library
// ============================================================================

pub mod backend;
pub mod coercion;
pub mod connection;
pub mod core;
pub mod entity;
pub mod prelude;
pub mod schema;

// Re-export main types for convenience
pub use backend::{Backend, MigrationLine, Relational, Term};
pub use connection::config::BackendConfig;
pub use crate::core::{OrmError, Result, SqlValue, TypeError, Value};
pub use entity::{Entity, FromValue, Ref};
pub use schema::{
    OptionKey, OptionValue, Options, PropertyDescriptor, Schema, TypeDoc, TypeRef, Use,
};
