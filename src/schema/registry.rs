//! Static type declarations plus the process-wide type and schema registries.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;
use tracing::{debug, warn};

use super::descriptor::{Schema, TypeRef};

/// An entry of a type's local alias table.
#[derive(Debug, Clone, Copy)]
pub enum Use {
    /// Alias for another entity type.
    Entity {
        alias: &'static str,
        doc: fn() -> &'static TypeDoc,
    },
    /// Alias for a non-entity type such as `chrono::NaiveDateTime`.
    Path {
        alias: &'static str,
        path: &'static str,
    },
}

impl Use {
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Entity { alias, .. } | Self::Path { alias, .. } => alias,
        }
    }
}

/// Declaration attached to an entity type: its name, documentation block,
/// imports and parent type.
#[derive(Debug)]
pub struct TypeDoc {
    pub name: &'static str,
    pub namespace: &'static str,
    pub doc: Option<&'static str>,
    pub uses: &'static [Use],
    pub parent: Option<fn() -> &'static TypeDoc>,
}

impl TypeDoc {
    pub const fn new(namespace: &'static str, name: &'static str) -> Self {
        Self {
            name,
            namespace,
            doc: None,
            uses: &[],
            parent: None,
        }
    }

    pub const fn doc(mut self, doc: &'static str) -> Self {
        self.doc = Some(doc);
        self
    }

    pub const fn uses(mut self, uses: &'static [Use]) -> Self {
        self.uses = uses;
        self
    }

    pub const fn extends(mut self, parent: fn() -> &'static TypeDoc) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.to_string()
        } else {
            format!("{}::{}", self.namespace, self.name)
        }
    }

    /// Inheritance chain from the most-base type down to `self`.
    pub fn ancestors(&'static self) -> Vec<&'static TypeDoc> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(self);

        while let Some(doc) = current {
            if !seen.insert(doc.qualified_name()) {
                break;
            }
            chain.push(doc);
            current = doc.parent.map(|parent| parent());
        }

        chain.reverse();
        chain
    }

    /// Resolves a declared type token: alias table, then this type's
    /// namespace, then an already qualified path; otherwise the literal.
    pub fn resolve(&self, token: &str) -> TypeRef {
        if let Some(entry) = self.uses.iter().find(|u| u.alias() == token) {
            return match entry {
                Use::Entity { doc, .. } => {
                    let target = doc();
                    register_entity(target);
                    TypeRef::Entity(target)
                }
                Use::Path { path, .. } => TypeRef::Path(path.to_string()),
            };
        }

        if !self.namespace.is_empty() && !token.contains("::") {
            if let Some(found) = lookup(&format!("{}::{}", self.namespace, token)) {
                return found;
            }
        }

        if token.contains("::") {
            if let Some(found) = lookup(token.trim_start_matches("::")) {
                return found;
            }
        }

        TypeRef::Literal(token.to_string())
    }
}

#[derive(Clone, Copy)]
enum Known {
    Entity(&'static TypeDoc),
    Plain,
}

lazy_static! {
    static ref TYPES: RwLock<HashMap<String, Known>> = RwLock::new(HashMap::new());
    static ref SCHEMAS: RwLock<HashMap<String, Arc<Schema>>> = RwLock::new(HashMap::new());
}

/// Makes an entity type discoverable by namespace probing.
///
/// A type referenced without a `Use` alias is only found once it has been
/// registered here, or once its own schema has been built.
pub fn register_entity(doc: &'static TypeDoc) {
    let name = doc.qualified_name();
    if TYPES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(&name)
    {
        return;
    }
    TYPES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name, Known::Entity(doc));
}

/// Makes a non-entity type discoverable by namespace probing.
pub fn register_type(path: &str) {
    TYPES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(path.to_string())
        .or_insert(Known::Plain);
}

pub fn lookup(qualified: &str) -> Option<TypeRef> {
    let types = TYPES.read().unwrap_or_else(PoisonError::into_inner);
    types.get(qualified).map(|known| match known {
        Known::Entity(doc) => TypeRef::Entity(*doc),
        Known::Plain => TypeRef::Path(qualified.to_string()),
    })
}

/// Returns the cached schema of `doc`, building it on first access.
///
/// Concurrent first accesses may each build; the first stored result wins.
/// A schema naming a type that is not registered yet is returned but not
/// cached, so it is rebuilt once the missing type has been registered.
pub fn schema_for(doc: &'static TypeDoc) -> Arc<Schema> {
    let key = doc.qualified_name();
    if let Some(schema) = SCHEMAS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Arc::clone(schema);
    }

    let built = Arc::new(super::build_schema(doc));
    if !built.is_resolved() {
        warn!(
            "Schema for {} names unregistered types, not caching it",
            key
        );
        return built;
    }
    debug!("Built schema for {} with {} properties", key, built.len());

    let mut schemas = SCHEMAS.write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(schemas.entry(key).or_insert(built))
}

#[cfg(test)]
mod tests {
    use super::*;

    static BASE: TypeDoc = TypeDoc::new("registry_tests", "Base");
    static CHILD: TypeDoc = TypeDoc::new("registry_tests", "Child")
        .uses(&[
            Use::Entity {
                alias: "Parent",
                doc: base,
            },
            Use::Path {
                alias: "DateTime",
                path: "chrono::NaiveDateTime",
            },
        ])
        .extends(base);
    static LOOP: TypeDoc = TypeDoc::new("registry_tests", "Loop").extends(looped);

    fn base() -> &'static TypeDoc {
        &BASE
    }

    fn looped() -> &'static TypeDoc {
        &LOOP
    }

    #[test]
    fn test_ancestors_base_first() {
        let names: Vec<&str> = CHILD.ancestors().iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Base", "Child"]);
    }

    #[test]
    fn test_self_parent_terminates() {
        assert_eq!(LOOP.ancestors().len(), 1);
    }

    #[test]
    fn test_resolution_order() {
        assert!(CHILD.resolve("Parent").is_entity());
        assert_eq!(
            CHILD.resolve("DateTime"),
            TypeRef::Path("chrono::NaiveDateTime".into())
        );
        assert_eq!(CHILD.resolve("int"), TypeRef::Literal("int".into()));

        register_entity(&BASE);
        assert!(CHILD.resolve("Base").is_entity());
        assert!(CHILD.resolve("registry_tests::Base").is_entity());
    }

    #[test]
    fn test_namespace_probe_finds_plain_types() {
        register_type("registry_tests::Money");
        assert_eq!(
            CHILD.resolve("Money"),
            TypeRef::Path("registry_tests::Money".into())
        );
    }
}
