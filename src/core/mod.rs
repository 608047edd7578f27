pub mod error;
pub mod value;

pub use error::{OrmError, Result, TypeError};
pub use value::{SqlValue, TIMESTAMP_FORMAT, Value};
