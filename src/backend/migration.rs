//! Schema-to-table diffing for the relational backend.

use std::collections::HashSet;
use std::fmt;

use super::naming::{quote_identifier, quote_literal};
use crate::coercion::StorageKind;
use crate::schema::{OptionKey, PropertyDescriptor, Schema, TypeRef, schema_for};

/// Column definition derived from a property descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: String,
    pub primary_key: bool,
    pub autoincrement: bool,
    pub not_null: bool,
    pub unsigned: bool,
    pub default: Option<String>,
}

impl ColumnDef {
    pub fn from_descriptor(descriptor: &PropertyDescriptor) -> Self {
        let primary_key = descriptor.is_id();
        let autoincrement = primary_key && descriptor.is_generated();
        let sql_type = if autoincrement {
            "INTEGER".to_string()
        } else {
            sql_type(&descriptor.ty, descriptor.options.length())
        };

        Self {
            name: descriptor.name.clone(),
            sql_type,
            primary_key,
            autoincrement,
            not_null: !primary_key && descriptor.required && !descriptor.is_nullable(),
            unsigned: descriptor.options.is_set(OptionKey::Unsigned),
            default: descriptor
                .options
                .text(OptionKey::Default)
                .map(str::to_string),
        }
    }

    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", quote_identifier(&self.name), self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
            if self.autoincrement {
                sql.push_str(" AUTOINCREMENT");
            }
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&quote_literal(default));
        }
        if self.unsigned {
            sql.push_str(&format!(" CHECK ({} >= 0)", quote_identifier(&self.name)));
        }
        sql
    }
}

fn sql_type(ty: &TypeRef, length: Option<i64>) -> String {
    match StorageKind::of(ty) {
        StorageKind::Integer | StorageKind::Boolean => "INTEGER".to_string(),
        StorageKind::Float => "REAL".to_string(),
        StorageKind::Text => match length {
            Some(n) if n > 0 => format!("VARCHAR({})", n),
            _ => "TEXT".to_string(),
        },
        StorageKind::Timestamp => "DATETIME".to_string(),
        StorageKind::Binary => "BLOB".to_string(),
        StorageKind::Reference => reference_type(ty),
        StorageKind::Collection | StorageKind::Raw => "TEXT".to_string(),
    }
}

/// A reference column takes the scalar type of the target's identifier.
fn reference_type(ty: &TypeRef) -> String {
    let TypeRef::Entity(doc) = ty else {
        return "INTEGER".to_string();
    };
    match schema_for(doc).id_property() {
        Some(id) if !id.ty.is_entity() => {
            if id.is_generated() {
                "INTEGER".to_string()
            } else {
                sql_type(&id.ty, id.options.length())
            }
        }
        _ => "INTEGER".to_string(),
    }
}

/// A column as it currently exists in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalColumn {
    pub name: String,
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

/// One schema change instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationLine {
    CreateTable {
        table: String,
        columns: Vec<ColumnDef>,
    },
    AddColumn {
        table: String,
        column: ColumnDef,
    },
    ChangeColumn {
        table: String,
        column: ColumnDef,
        from: String,
    },
    DropColumn {
        table: String,
        column: String,
    },
}

impl MigrationLine {
    /// SQLite statement for this line; SQLite cannot change a column's type,
    /// so `ChangeColumn` has none.
    pub fn statement(&self) -> Option<String> {
        match self {
            Self::CreateTable { table, columns } => {
                let columns: Vec<String> = columns.iter().map(ColumnDef::to_sql).collect();
                Some(format!(
                    "CREATE TABLE {} ({})",
                    quote_identifier(table),
                    columns.join(", ")
                ))
            }
            Self::AddColumn { table, column } => Some(format!(
                "ALTER TABLE {} ADD COLUMN {}",
                quote_identifier(table),
                column.to_sql()
            )),
            Self::ChangeColumn { .. } => None,
            Self::DropColumn { table, column } => Some(format!(
                "ALTER TABLE {} DROP COLUMN {}",
                quote_identifier(table),
                quote_identifier(column)
            )),
        }
    }
}

impl fmt::Display for MigrationLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChangeColumn {
                table,
                column,
                from,
            } => write!(
                f,
                "change {}.{} from {} to {}",
                quote_identifier(table),
                quote_identifier(&column.name),
                from,
                column.sql_type
            ),
            other => match other.statement() {
                Some(sql) => f.write_str(&sql),
                None => Ok(()),
            },
        }
    }
}

/// Lines that bring `physical` in line with `schema`.
///
/// An empty `physical` means the table does not exist. Added and changed
/// columns follow schema order, dropped columns follow table order.
pub fn diff(table: &str, schema: &Schema, physical: &[PhysicalColumn]) -> Vec<MigrationLine> {
    if physical.is_empty() {
        return vec![MigrationLine::CreateTable {
            table: table.to_string(),
            columns: schema.iter().map(ColumnDef::from_descriptor).collect(),
        }];
    }

    let mut lines = Vec::new();

    for descriptor in schema.iter() {
        let column = ColumnDef::from_descriptor(descriptor);
        match physical.iter().find(|p| p.name == column.name) {
            None => lines.push(MigrationLine::AddColumn {
                table: table.to_string(),
                column,
            }),
            Some(existing) if !existing.sql_type.eq_ignore_ascii_case(&column.sql_type) => {
                lines.push(MigrationLine::ChangeColumn {
                    table: table.to_string(),
                    from: existing.sql_type.clone(),
                    column,
                })
            }
            Some(_) => {}
        }
    }

    let declared: HashSet<&str> = schema.names().collect();
    for existing in physical {
        if !declared.contains(existing.name.as_str()) {
            lines.push(MigrationLine::DropColumn {
                table: table.to_string(),
                column: existing.name.clone(),
            });
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_options;

    fn schema(props: &[(&str, &str, &str)]) -> Schema {
        let mut schema = Schema::new();
        for (name, token, desc) in props {
            schema.insert(PropertyDescriptor::new(
                *name,
                TypeRef::Literal(token.to_string()),
                parse_options(desc),
            ));
        }
        schema
    }

    fn physical(name: &str, sql_type: &str) -> PhysicalColumn {
        PhysicalColumn {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
            not_null: false,
            primary_key: false,
        }
    }

    #[test]
    fn test_create_table_statement() {
        let schema = schema(&[
            ("id", "int", "@id @generated_value"),
            ("customer", "string", "@length(64) @required"),
            ("status", "string", "@default(open)"),
            ("total", "float", "@signed"),
        ]);
        let lines = diff("invoice", &schema, &[]);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].statement().unwrap(),
            "CREATE TABLE \"invoice\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
             \"customer\" VARCHAR(64) NOT NULL, \"status\" TEXT DEFAULT 'open', \
             \"total\" REAL CHECK (\"total\" >= 0))"
        );
    }

    #[test]
    fn test_nullable_wins_over_required() {
        let schema = schema(&[("note", "string", "@required @nullable")]);
        let column = ColumnDef::from_descriptor(schema.get("note").unwrap());
        assert!(!column.not_null);
    }

    #[test]
    fn test_diff_against_existing_table() {
        let schema = schema(&[
            ("id", "int", "@id @generated_value"),
            ("customer", "string", "@length(64)"),
            ("paid", "bool", ""),
        ]);
        let existing = vec![
            physical("id", "INTEGER"),
            physical("legacy", "TEXT"),
            physical("customer", "text"),
        ];

        let lines = diff("invoice", &schema, &existing);
        assert_eq!(lines.len(), 3);
        assert!(matches!(
            &lines[0],
            MigrationLine::ChangeColumn { column, from, .. }
                if column.name == "customer" && from == "text"
        ));
        assert_eq!(
            lines[1].statement().unwrap(),
            "ALTER TABLE \"invoice\" ADD COLUMN \"paid\" INTEGER"
        );
        assert_eq!(
            lines[2].statement().unwrap(),
            "ALTER TABLE \"invoice\" DROP COLUMN \"legacy\""
        );
        assert_eq!(
            lines[0].to_string(),
            "change \"invoice\".\"customer\" from text to VARCHAR(64)"
        );
    }

    #[test]
    fn test_diff_is_empty_when_in_sync() {
        let schema = schema(&[("id", "int", "@id"), ("name", "string", "")]);
        let existing = vec![physical("id", "integer"), physical("name", "TEXT")];
        assert!(diff("thing", &schema, &existing).is_empty());
    }
}
