use std::collections::HashMap;
use std::fmt;

use super::options::{OptionKey, Options};
use super::registry::TypeDoc;
use crate::coercion::StorageKind;

/// Declared type of a property after resolution.
#[derive(Debug, Clone)]
pub enum TypeRef {
    /// Another entity type.
    Entity(&'static TypeDoc),
    /// A known non-entity type, stored by its qualified path.
    Path(String),
    /// Unresolved token, used as a scalar marker (`int`, `string`, ...).
    Literal(String),
}

impl TypeRef {
    pub fn is_entity(&self) -> bool {
        matches!(self, Self::Entity(_))
    }

    /// A capitalised token that names no scalar; most likely a type that
    /// was not registered when the schema was built.
    pub fn is_unresolved(&self) -> bool {
        match self {
            Self::Literal(token) => {
                token.starts_with(|c: char| c.is_ascii_uppercase())
                    && StorageKind::of(self) == StorageKind::Raw
            }
            _ => false,
        }
    }

    /// Last path segment, lower-cased, used to pick scalar conversions.
    pub fn short_name(&self) -> String {
        let full = match self {
            Self::Entity(doc) => doc.name,
            Self::Path(path) => path.as_str(),
            Self::Literal(token) => token.as_str(),
        };
        full.rsplit("::").next().unwrap_or(full).to_ascii_lowercase()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Entity(a), Self::Entity(b)) => a.qualified_name() == b.qualified_name(),
            (Self::Path(a), Self::Path(b)) => a == b,
            (Self::Literal(a), Self::Literal(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(doc) => write!(f, "{}", doc.qualified_name()),
            Self::Path(path) => write!(f, "{}", path),
            Self::Literal(token) => write!(f, "{}", token),
        }
    }
}

/// Metadata of one persistent property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: TypeRef,
    pub required: bool,
    pub options: Options,
}

impl PropertyDescriptor {
    /// Builds a descriptor; an explicit `required` option overrides the
    /// default derived from the type.
    pub fn new(name: impl Into<String>, ty: TypeRef, options: Options) -> Self {
        let required = options
            .flag(OptionKey::Required)
            .unwrap_or_else(|| ty.is_entity());
        Self {
            name: name.into(),
            ty,
            required,
            options,
        }
    }

    pub fn is_id(&self) -> bool {
        self.options.is_set(OptionKey::Id)
    }

    pub fn is_generated(&self) -> bool {
        self.options.is_set(OptionKey::GeneratedValue)
    }

    pub fn is_nullable(&self) -> bool {
        self.options.is_set(OptionKey::Nullable)
    }
}

/// Ordered set of descriptors for one entity type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    properties: Vec<PropertyDescriptor>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `descriptor`, replacing any previous one of the same name in place.
    pub fn insert(&mut self, descriptor: PropertyDescriptor) {
        match self.index.get(&descriptor.name) {
            Some(&slot) => self.properties[slot] = descriptor,
            None => {
                self.index
                    .insert(descriptor.name.clone(), self.properties.len());
                self.properties.push(descriptor);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.index.get(name).map(|&slot| &self.properties[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// The property marked `@id`, or one literally named `id`.
    pub fn id_property(&self) -> Option<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|p| p.is_id())
            .or_else(|| self.get("id"))
    }

    /// False while some property names a type the registry does not know yet.
    pub fn is_resolved(&self) -> bool {
        !self.properties.iter().any(|p| p.ty.is_unresolved())
    }
}
