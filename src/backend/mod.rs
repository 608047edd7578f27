//! Storage backends: the capability contract and its relational implementation.

pub mod migration;
pub mod naming;
pub mod relational;

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::core::{OrmError, Result, Value};
use crate::entity::Entity;
pub use migration::MigrationLine;
pub use relational::Relational;

/// Search term for [`Backend::find`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Term {
    /// Every row.
    #[default]
    All,
    /// Lookup against the identifier property.
    Id(Value),
    /// One pattern condition per property, all of which must hold.
    Match(Vec<(String, Value)>),
}

impl Term {
    pub fn id(value: impl Into<Value>) -> Self {
        Self::Id(value.into())
    }

    pub fn matching<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Match(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Property/value conditions for entity type `E`.
    pub fn conditions<E: Entity>(&self) -> Result<Vec<(String, Value)>> {
        match self {
            Self::All => Ok(Vec::new()),
            Self::Id(value) => {
                let id = E::id_property()
                    .ok_or_else(|| OrmError::MissingIdentifier(E::type_doc().qualified_name()))?;
                Ok(vec![(id.name, value.clone())])
            }
            Self::Match(pairs) => Ok(pairs.clone()),
        }
    }
}

impl From<()> for Term {
    fn from(_: ()) -> Self {
        Self::All
    }
}

impl From<i64> for Term {
    fn from(id: i64) -> Self {
        Self::Id(Value::Integer(id))
    }
}

impl From<&str> for Term {
    fn from(id: &str) -> Self {
        Self::Id(Value::Text(id.to_string()))
    }
}

impl From<String> for Term {
    fn from(id: String) -> Self {
        Self::Id(Value::Text(id))
    }
}

impl From<Value> for Term {
    fn from(id: Value) -> Self {
        Self::Id(id)
    }
}

impl From<BTreeMap<String, Value>> for Term {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Match(map.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Term {
    fn from(pairs: [(K, V); N]) -> Self {
        Self::matching(pairs)
    }
}

/// A store able to search, persist and remove entities and to describe the
/// changes its physical structure needs.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Lazily streams fresh entities matching `term`.
    ///
    /// The stream holds the store's cursor; consume or drop it before issuing
    /// further statements on the same connection.
    fn find<'a, E: Entity>(&'a self, term: Term) -> BoxStream<'a, Result<E>>;

    /// Inserts or updates `entity`, assigning a generated identifier on insert.
    ///
    /// Fails with [`OrmError::Gone`] when the entity's identifier no longer
    /// matches a stored row.
    async fn save<E: Entity>(&self, entity: &mut E) -> Result<&Self>;

    /// Removes the row of `entity`; nothing happens without an identifier.
    async fn delete<E: Entity>(&self, entity: &E) -> Result<&Self>;

    /// Ordered change instructions from the stored structure to `E`'s schema.
    async fn create_migration<E: Entity>(&self) -> Result<Vec<MigrationLine>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_conversions() {
        assert_eq!(Term::from(()), Term::All);
        assert_eq!(Term::from(7i64), Term::Id(Value::Integer(7)));
        assert_eq!(
            Term::from([("status", "open")]),
            Term::Match(vec![("status".to_string(), Value::Text("open".into()))])
        );
    }
}
