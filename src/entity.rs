//! The entity capability and typed conversions for its weakly typed setter.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::backend::naming;
use crate::core::{TIMESTAMP_FORMAT, TypeError, Value};
use crate::schema::{PropertyDescriptor, Schema, TypeDoc, schema_for};

/// A user type participating in persistence.
///
/// Implementors expose their declaration plus a getter and setter keyed by
/// property name; everything else is derived from the cached schema.
///
/// ```ignore
/// static INVOICE: TypeDoc = TypeDoc::new("billing", "Invoice").doc(
///     "@property int $id @id @generated_value
///      @property string $customer @length(64)",
/// );
///
/// impl Entity for Invoice {
///     fn type_doc() -> &'static TypeDoc { &INVOICE }
///
///     fn property(&self, name: &str) -> Option<Value> {
///         match name {
///             "id" => Some(self.id.into()),
///             "customer" => Some(self.customer.clone().into()),
///             _ => None,
///         }
///     }
///
///     fn set_property(&mut self, name: &str, value: Value) -> Result<(), TypeError> {
///         match name {
///             "id" => self.id = FromValue::from_value(name, value)?,
///             "customer" => self.customer = FromValue::from_value(name, value)?,
///             _ => return Err(TypeError::UnknownProperty(name.to_string())),
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Entity: Default + Send + Sync + 'static {
    fn type_doc() -> &'static TypeDoc;

    /// Current value of a declared property.
    fn property(&self, name: &str) -> Option<Value>;

    /// Assigns an untyped value to a declared property.
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), TypeError>;

    fn schema() -> Arc<Schema> {
        schema_for(Self::type_doc())
    }

    /// Short type name in snake_case.
    fn table_name() -> String {
        naming::table_name(Self::type_doc().name)
    }

    fn id_property() -> Option<PropertyDescriptor> {
        Self::schema().id_property().cloned()
    }

    /// Identifier value, `Value::Null` when unset or undeclared.
    ///
    /// Backends treat a null, `0` or empty identifier as not stored yet, so a
    /// plain `i64` field works as well as an `Option<i64>`.
    fn id(&self) -> Value {
        Self::id_property()
            .and_then(|p| self.property(&p.name))
            .unwrap_or(Value::Null)
    }

    /// Every schema property with its current value, in schema order.
    fn values(&self) -> Vec<(String, Value)> {
        Self::schema()
            .iter()
            .map(|p| {
                let value = self.property(&p.name).unwrap_or(Value::Null);
                (p.name.clone(), value)
            })
            .collect()
    }
}

/// Conversion from an untyped [`Value`] into a field type.
pub trait FromValue: Sized {
    fn from_value(property: &str, value: Value) -> Result<Self, TypeError>;
}

fn mismatch(property: &str, expected: &'static str, found: &Value) -> TypeError {
    TypeError::mismatch(property, expected, found.type_name())
}

impl FromValue for Value {
    fn from_value(_property: &str, value: Value) -> Result<Self, TypeError> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(property: &str, value: Value) -> Result<Self, TypeError> {
        match &value {
            Value::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            Value::Reference(inner) => i64::from_value(property, (**inner).clone()),
            other => other
                .as_i64()
                .ok_or_else(|| mismatch(property, "INTEGER", &value)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(property: &str, value: Value) -> Result<Self, TypeError> {
        let found = value.type_name();
        let wide = i64::from_value(property, value)?;
        i32::try_from(wide).map_err(|_| TypeError::mismatch(property, "INTEGER(32)", found))
    }
}

impl FromValue for u32 {
    fn from_value(property: &str, value: Value) -> Result<Self, TypeError> {
        let found = value.type_name();
        let wide = i64::from_value(property, value)?;
        u32::try_from(wide).map_err(|_| TypeError::mismatch(property, "UNSIGNED", found))
    }
}

impl FromValue for f64 {
    fn from_value(property: &str, value: Value) -> Result<Self, TypeError> {
        match &value {
            Value::Float(f) => Ok(*f),
            Value::Integer(i) => Ok(*i as f64),
            Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| mismatch(property, "FLOAT", &value)),
            _ => Err(mismatch(property, "FLOAT", &value)),
        }
    }
}

impl FromValue for bool {
    fn from_value(property: &str, value: Value) -> Result<Self, TypeError> {
        match &value {
            Value::Boolean(b) => Ok(*b),
            Value::Integer(i) => Ok(*i != 0),
            Value::Text(s) => match s.to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(true),
                "0" | "false" | "" => Ok(false),
                _ => Err(mismatch(property, "BOOLEAN", &value)),
            },
            _ => Err(mismatch(property, "BOOLEAN", &value)),
        }
    }
}

impl FromValue for String {
    fn from_value(property: &str, value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Null | Value::Bytes(_) | Value::List(_) | Value::Map(_) => {
                Err(mismatch(property, "TEXT", &value))
            }
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(property: &str, value: Value) -> Result<Self, TypeError> {
        match &value {
            Value::Timestamp(t) => Ok(*t),
            Value::Text(s) => NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
                .map_err(|_| mismatch(property, "TIMESTAMP", &value)),
            _ => Err(mismatch(property, "TIMESTAMP", &value)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(property: &str, value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(mismatch(property, "BYTES", &other)),
        }
    }
}

impl FromValue for Vec<Value> {
    fn from_value(property: &str, value: Value) -> Result<Self, TypeError> {
        match value {
            Value::List(items) => Ok(items),
            other => Err(mismatch(property, "LIST", &other)),
        }
    }
}

impl FromValue for BTreeMap<String, Value> {
    fn from_value(property: &str, value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Map(entries) => Ok(entries),
            other => Err(mismatch(property, "MAP", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(property: &str, value: Value) -> Result<Self, TypeError> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(property, value).map(Some)
    }
}

/// Reference to another entity, held as that entity's identifier.
pub struct Ref<E> {
    id: Value,
    _target: PhantomData<fn() -> E>,
}

impl<E: Entity> Ref<E> {
    pub fn new(id: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            _target: PhantomData,
        }
    }

    pub fn to(entity: &E) -> Self {
        Self::new(entity.id())
    }

    pub fn id(&self) -> &Value {
        &self.id
    }
}

impl<E> Clone for Ref<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            _target: PhantomData,
        }
    }
}

impl<E> PartialEq for Ref<E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<E> fmt::Debug for Ref<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.id).finish()
    }
}

impl<E> From<Ref<E>> for Value {
    fn from(reference: Ref<E>) -> Self {
        Value::Reference(Box::new(reference.id))
    }
}

impl<E: Entity> FromValue for Ref<E> {
    fn from_value(property: &str, value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Reference(id) => Ok(Self::new(*id)),
            Value::Integer(_) | Value::Text(_) => Ok(Self::new(value)),
            other => Err(mismatch(property, "REFERENCE", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_conversions() {
        assert_eq!(i64::from_value("n", Value::Text("17".into())), Ok(17));
        assert_eq!(i64::from_value("n", Value::Float(3.0)), Ok(3));
        assert!(i64::from_value("n", Value::Text("x".into())).is_err());
        assert!(u32::from_value("n", Value::Integer(-1)).is_err());
    }

    #[test]
    fn test_option_absorbs_null() {
        assert_eq!(Option::<i64>::from_value("n", Value::Null), Ok(None));
        assert_eq!(
            Option::<String>::from_value("s", Value::Text("a".into())),
            Ok(Some("a".to_string()))
        );
    }

    #[test]
    fn test_bool_from_storage_integers() {
        assert_eq!(bool::from_value("b", Value::Integer(1)), Ok(true));
        assert_eq!(bool::from_value("b", Value::Integer(0)), Ok(false));
    }

    #[test]
    fn test_timestamp_from_text() {
        let parsed = NaiveDateTime::from_value("t", Value::Text("2024-02-29 13:45:00".into()));
        assert_eq!(parsed.unwrap().to_string(), "2024-02-29 13:45:00");
    }

    #[test]
    fn test_mismatch_names_property() {
        let err = Vec::<Value>::from_value("tags", Value::Integer(1)).unwrap_err();
        assert_eq!(err, TypeError::mismatch("tags", "LIST", "INTEGER"));
    }
}
