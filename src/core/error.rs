use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrmError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Object with id {id} in table '{table}' does not exist anymore")]
    Gone { table: String, id: String },

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Entity '{0}' declares no identifier property")]
    MissingIdentifier(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Raised by the weakly typed setter when a value cannot be assigned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("Property '{0}' not found")]
    UnknownProperty(String),

    #[error("Type mismatch for '{property}': expected {expected}, found {found}")]
    Mismatch {
        property: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl TypeError {
    pub fn mismatch(property: &str, expected: &'static str, found: &'static str) -> Self {
        Self::Mismatch {
            property: property.to_string(),
            expected,
            found,
        }
    }
}

pub type Result<T> = std::result::Result<T, OrmError>;
