//! Conversion between property values and storable scalars.

use chrono::NaiveDateTime;

use crate::core::{Result, SqlValue, TIMESTAMP_FORMAT, Value};
use crate::schema::{PropertyDescriptor, TypeRef};

/// How a declared type is represented in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Integer,
    Float,
    Boolean,
    Text,
    Timestamp,
    Binary,
    Collection,
    Reference,
    Raw,
}

impl StorageKind {
    pub fn of(ty: &TypeRef) -> Self {
        if ty.is_entity() {
            return Self::Reference;
        }
        let name = ty.short_name();
        if name.ends_with("[]") {
            return Self::Collection;
        }
        match name.as_str() {
            "int" | "integer" | "i64" | "i32" | "u32" | "u64" => Self::Integer,
            "float" | "double" | "f32" | "f64" => Self::Float,
            "bool" | "boolean" => Self::Boolean,
            "string" | "text" | "str" => Self::Text,
            "datetime" | "naivedatetime" | "timestamp" => Self::Timestamp,
            "binary" | "blob" | "bytes" => Self::Binary,
            "array" | "list" | "map" | "vec" | "btreemap" => Self::Collection,
            _ => Self::Raw,
        }
    }
}

/// Flattens an in-memory value into something the backend can bind.
pub fn to_storage(value: &Value) -> Result<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Float(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Boolean(b) => SqlValue::Integer(i64::from(*b)),
        Value::Timestamp(t) => SqlValue::Text(t.format(TIMESTAMP_FORMAT).to_string()),
        Value::Bytes(bytes) => SqlValue::Blob(bytes.clone()),
        Value::List(_) | Value::Map(_) => SqlValue::Text(serde_json::to_string(value)?),
        Value::Reference(id) => to_storage(id)?,
    })
}

/// Rebuilds a property value from a stored scalar, guided by the declared type.
///
/// Without a descriptor the scalar is passed through unchanged.
pub fn from_storage(raw: SqlValue, descriptor: Option<&PropertyDescriptor>) -> Result<Value> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let Some(descriptor) = descriptor else {
        return Ok(plain(raw));
    };

    Ok(match (StorageKind::of(&descriptor.ty), raw) {
        (StorageKind::Reference, raw) => Value::Reference(Box::new(plain(raw))),
        (StorageKind::Integer, SqlValue::Text(s)) => match s.trim().parse() {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Text(s),
        },
        (StorageKind::Integer, SqlValue::Float(f)) if f.fract() == 0.0 => Value::Integer(f as i64),
        (StorageKind::Float, SqlValue::Integer(i)) => Value::Float(i as f64),
        (StorageKind::Boolean, SqlValue::Integer(i)) => Value::Boolean(i != 0),
        (StorageKind::Text, SqlValue::Integer(i)) => Value::Text(i.to_string()),
        (StorageKind::Text, SqlValue::Float(f)) => Value::Text(f.to_string()),
        (StorageKind::Timestamp, SqlValue::Text(s)) => {
            match NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT) {
                Ok(t) => Value::Timestamp(t),
                Err(_) => Value::Text(s),
            }
        }
        (StorageKind::Binary, SqlValue::Text(s)) => Value::Bytes(s.into_bytes()),
        (StorageKind::Collection, SqlValue::Text(s)) => serde_json::from_str(&s)?,
        (_, raw) => plain(raw),
    })
}

fn plain(raw: SqlValue) -> Value {
    match raw {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::Integer(i),
        SqlValue::Float(f) => Value::Float(f),
        SqlValue::Text(s) => Value::Text(s),
        SqlValue::Blob(bytes) => Value::Bytes(bytes),
    }
}
