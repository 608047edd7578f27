//! Everything needed to declare an entity and persist it.

pub use crate::backend::{Backend, MigrationLine, Relational, Term};
pub use crate::connection::config::BackendConfig;
pub use crate::core::{OrmError, TypeError, Value};
pub use crate::entity::{Entity, FromValue, Ref};
pub use crate::schema::{TypeDoc, Use};
