//! Relational backend over an SQLite connection pool.

use async_trait::async_trait;
use futures::SinkExt;
use futures::channel::mpsc;
use futures::stream::{self, BoxStream, StreamExt};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnection, SqlitePool, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::{debug, warn};

use super::migration::{self, MigrationLine, PhysicalColumn};
use super::naming::quote_identifier;
use super::{Backend, Term};
use crate::coercion;
use crate::connection::{self, config::BackendConfig};
use crate::core::{OrmError, Result, SqlValue};
use crate::entity::Entity;
use crate::schema::{PropertyDescriptor, Schema};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Rows fetched ahead of the consumer of a `find` stream.
const ROW_BUFFER: usize = 16;

fn bind(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Integer(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(bytes) => query.bind(bytes),
    }
}

fn read_column(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let storage = raw.type_info().name().to_string();

    Ok(match storage.as_str() {
        "INTEGER" | "BOOLEAN" => SqlValue::Integer(row.try_get_unchecked(index)?),
        "REAL" => SqlValue::Float(row.try_get_unchecked(index)?),
        "BLOB" => SqlValue::Blob(row.try_get_unchecked(index)?),
        _ => SqlValue::Text(row.try_get_unchecked(index)?),
    })
}

/// Builds a fresh entity from `row`, assigning every column through the setter.
fn hydrate<E: Entity>(schema: &Schema, row: &SqliteRow) -> Result<E> {
    let mut entity = E::default();
    for (index, column) in row.columns().iter().enumerate() {
        let raw = read_column(row, index)?;
        let value = coercion::from_storage(raw, schema.get(column.name()))?;
        entity.set_property(column.name(), value)?;
    }
    Ok(entity)
}

fn identifier<E: Entity>() -> Result<PropertyDescriptor> {
    E::id_property().ok_or_else(|| OrmError::MissingIdentifier(E::type_doc().qualified_name()))
}

/// Identifiers that count as "not stored yet": null, `0` and `""`.
fn is_unassigned(id: &SqlValue) -> bool {
    match id {
        SqlValue::Null => true,
        SqlValue::Integer(i) => *i == 0,
        SqlValue::Text(s) => s.is_empty(),
        _ => false,
    }
}

/// Runs `sql` on its own task, handing rows over a bounded channel.
///
/// The task owns the statement text for as long as the cursor is open and
/// stops once the receiver is dropped.
fn spawn_fetch(
    pool: SqlitePool,
    sql: String,
    binds: Vec<SqlValue>,
) -> mpsc::Receiver<sqlx::Result<SqliteRow>> {
    let (mut sender, receiver) = mpsc::channel(ROW_BUFFER);
    tokio::spawn(async move {
        let mut query = sqlx::query(&sql);
        for value in binds {
            query = bind(query, value);
        }
        let mut rows = query.fetch(&pool);
        while let Some(row) = rows.next().await {
            if sender.send(row).await.is_err() {
                debug!("find stream dropped before exhaustion: {}", sql);
                break;
            }
        }
    });
    receiver
}

enum SaveOutcome {
    Updated,
    Inserted(i64),
}

/// Existence check plus write, run on the caller's transaction.
async fn write_row(
    conn: &mut SqliteConnection,
    table: &str,
    id_column: &str,
    id: SqlValue,
    columns: Vec<(String, SqlValue)>,
) -> Result<SaveOutcome> {
    let table_sql = quote_identifier(table);
    let id_sql = quote_identifier(id_column);

    if !is_unassigned(&id) {
        let check = format!("SELECT {} FROM {} WHERE {} = ?", id_sql, table_sql, id_sql);
        debug!("Executing query: {} with params: {:?}", check, [&id]);
        let found = bind(sqlx::query(&check), id.clone())
            .fetch_optional(&mut *conn)
            .await?;
        if found.is_none() {
            return Err(OrmError::Gone {
                table: table.to_string(),
                id: id.to_string(),
            });
        }

        let assignments: Vec<String> = columns
            .iter()
            .map(|(name, _)| format!("{} = ?", quote_identifier(name)))
            .collect();
        let update = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            table_sql,
            assignments.join(", "),
            id_sql
        );
        debug!("Executing query: {} with params: {:?}", update, columns);
        let mut query = sqlx::query(&update);
        for (_, value) in columns {
            query = bind(query, value);
        }
        bind(query, id).execute(&mut *conn).await?;
        return Ok(SaveOutcome::Updated);
    }

    let present: Vec<(String, SqlValue)> = columns
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect();
    let insert = if present.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", table_sql)
    } else {
        let names: Vec<String> = present.iter().map(|(n, _)| quote_identifier(n)).collect();
        let placeholders = vec!["?"; present.len()];
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table_sql,
            names.join(", "),
            placeholders.join(", ")
        )
    };
    debug!("Executing query: {} with params: {:?}", insert, present);

    let mut query = sqlx::query(&insert);
    for (_, value) in present {
        query = bind(query, value);
    }
    let result = query.execute(&mut *conn).await?;
    Ok(SaveOutcome::Inserted(result.last_insert_rowid()))
}

async fn delete_row(
    conn: &mut SqliteConnection,
    table: &str,
    id_column: &str,
    id: SqlValue,
) -> Result<()> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_identifier(table),
        quote_identifier(id_column)
    );
    debug!("Executing query: {} with params: {:?}", sql, [&id]);
    bind(sqlx::query(&sql), id).execute(&mut *conn).await?;
    Ok(())
}

/// Backend storing each entity type in a table named after the type.
#[derive(Debug, Clone)]
pub struct Relational {
    pool: SqlitePool,
}

impl Relational {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &BackendConfig) -> Result<Self> {
        Ok(Self::from_pool(connection::connect(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Columns of `table` as the store reports them; empty when it is missing.
    pub async fn table_columns(&self, table: &str) -> Result<Vec<PhysicalColumn>> {
        let sql = format!("PRAGMA table_info({})", quote_identifier(table));
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<PhysicalColumn> {
                Ok(PhysicalColumn {
                    name: row.try_get("name")?,
                    sql_type: row.try_get("type")?,
                    not_null: row.try_get::<i64, _>("notnull")? != 0,
                    primary_key: row.try_get::<i64, _>("pk")? != 0,
                })
            })
            .collect()
    }

    /// Executes every statement-bearing line inside one transaction.
    pub async fn apply_migration(&self, lines: &[MigrationLine]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for line in lines {
            match line.statement() {
                Some(sql) => {
                    debug!("Applying migration: {}", sql);
                    sqlx::query(&sql).execute(&mut *tx).await?;
                }
                None => warn!("Migration line needs manual action: {}", line),
            }
        }
        tx.commit().await?;
        Ok(())
    }

    /// Computes and applies the migration for `E`, returning the applied lines.
    pub async fn migrate<E: Entity>(&self) -> Result<Vec<MigrationLine>> {
        let lines = self.create_migration::<E>().await?;
        self.apply_migration(&lines).await?;
        Ok(lines)
    }

    fn select_statement<E: Entity>(term: &Term) -> Result<(String, Vec<SqlValue>)> {
        let mut sql = format!("SELECT * FROM {}", quote_identifier(&E::table_name()));
        let mut binds = Vec::new();

        for (i, (column, value)) in term.conditions::<E>()?.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(&quote_identifier(column));
            sql.push_str(" LIKE ?");
            binds.push(coercion::to_storage(value)?);
        }

        Ok((sql, binds))
    }
}

#[async_trait]
impl Backend for Relational {
    fn find<'a, E: Entity>(&'a self, term: Term) -> BoxStream<'a, Result<E>> {
        let (sql, binds) = match Self::select_statement::<E>(&term) {
            Ok(statement) => statement,
            Err(err) => return stream::once(async move { Err(err) }).boxed(),
        };
        debug!("Executing query: {} with params: {:?}", sql, binds);

        let pool = self.pool.clone();
        let schema = E::schema();
        // Spawned on first poll so that building the stream needs no runtime.
        stream::once(async move { spawn_fetch(pool, sql, binds) })
            .flatten()
            .map(move |row: sqlx::Result<SqliteRow>| -> Result<E> {
                hydrate::<E>(&schema, &row?)
            })
            .boxed()
    }

    async fn save<E: Entity>(&self, entity: &mut E) -> Result<&Self> {
        let table = E::table_name();
        let id_property = identifier::<E>()?;
        let id = coercion::to_storage(&entity.id())?;
        let unassigned = is_unassigned(&id);

        let mut columns = Vec::new();
        for (name, value) in entity.values() {
            if unassigned && id_property.is_generated() && name == id_property.name {
                continue;
            }
            columns.push((name, coercion::to_storage(&value)?));
        }

        let mut tx = self.pool.begin().await?;
        let outcome = write_row(&mut tx, &table, &id_property.name, id, columns).await?;
        tx.commit().await?;

        if let SaveOutcome::Inserted(rowid) = outcome {
            if id_property.is_generated() {
                let value =
                    coercion::from_storage(SqlValue::Integer(rowid), Some(&id_property))?;
                entity.set_property(&id_property.name, value)?;
            }
        }
        Ok(self)
    }

    async fn delete<E: Entity>(&self, entity: &E) -> Result<&Self> {
        let id = coercion::to_storage(&entity.id())?;
        if is_unassigned(&id) {
            return Ok(self);
        }
        let id_property = identifier::<E>()?;

        let mut tx = self.pool.begin().await?;
        delete_row(&mut tx, &E::table_name(), &id_property.name, id).await?;
        tx.commit().await?;
        Ok(self)
    }

    async fn create_migration<E: Entity>(&self) -> Result<Vec<MigrationLine>> {
        let table = E::table_name();
        let physical = self.table_columns(&table).await?;
        Ok(migration::diff(&table, &E::schema(), &physical))
    }
}
