pub mod config;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::core::{OrmError, Result};
use config::BackendConfig;

/// Opens a connection pool described by `config`.
pub async fn connect(config: &BackendConfig) -> Result<SqlitePool> {
    config.validate().map_err(OrmError::Config)?;

    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(config.create_if_missing);

    let max_connections = config.effective_max_connections();
    let mut pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .min_connections(config.min_connections.min(max_connections))
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout);
    if config.is_in_memory() {
        // Closing the only connection would discard the database.
        pool = pool.idle_timeout(None).max_lifetime(None);
    }

    debug!(
        "Connecting to {} with up to {} connections",
        config.url, max_connections
    );
    Ok(pool.connect_with(options).await?)
}
