use std::time::Duration;

use serde::Deserialize;

/// SQL store connection configuration
///
/// The URL uses sqlx syntax, e.g. `sqlite://app.db` or `sqlite::memory:`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Minimum number of connections in pool
    pub min_connections: u32,

    /// Connection timeout
    #[serde(with = "seconds")]
    pub connect_timeout: Duration,

    /// Connection idle timeout
    #[serde(with = "optional_seconds")]
    pub idle_timeout: Option<Duration>,

    /// Create the database file if it does not exist
    pub create_if_missing: bool,
}

impl BackendConfig {
    /// Create a new configuration for `url`
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)), // 10 minutes
            create_if_missing: true,
        }
    }

    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:")
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set minimum connections
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Set connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Parse from connection string
    ///
    /// Accepts `sqlite://<path>`, `sqlite:<path>` and `sqlite::memory:`.
    pub fn from_url(url: &str) -> Result<Self, String> {
        if !url.starts_with("sqlite:") {
            return Err("URL must start with 'sqlite:'".to_string());
        }
        let path = url
            .trim_start_matches("sqlite:")
            .trim_start_matches("//");
        if path.is_empty() {
            return Err("URL has no database path".to_string());
        }
        Ok(Self::new(url))
    }

    /// Every connection of an in-memory SQLite pool would open its own
    /// database, so such pools are pinned to one connection.
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    pub fn effective_max_connections(&self) -> u32 {
        if self.is_in_memory() {
            1
        } else {
            self.max_connections
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("url cannot be empty".to_string());
        }

        if self.max_connections == 0 {
            return Err("max_connections must be > 0".to_string());
        }

        if self.min_connections > self.max_connections {
            return Err("min_connections cannot exceed max_connections".to_string());
        }

        Ok(())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

mod optional_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|secs| secs.map(Duration::from_secs))
    }
}
