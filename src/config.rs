//! Server configuration
//!
//! Loaded from an optional TOML file, then overridden by command-line flags
//! and environment variables:
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 4000
//! body_limit_bytes = 65536
//!
//! [store]
//! backend = "postgres"
//! host = "db"
//! dbname = "pantrypal"
//! pool_size = 8
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pantrypal_storage::PgConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            body_limit_bytes: 64 * 1024,
        }
    }
}

/// Which store backs the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    Postgres(PgConfig),
    /// SQLite file, or an in-memory database when `path` is absent.
    Sqlite {
        #[serde(default)]
        path: Option<PathBuf>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Sqlite { path: None }
    }
}

/// Values from the command line and environment. Each one that is set
/// replaces the matching file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_url: Option<String>,
    pub sqlite_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("invalid configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        Self::from_toml(&raw).with_context(|| format!("in config file {:?}", path))
    }

    /// Reads `path` when given, otherwise starts from defaults, then applies
    /// `overrides`.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(overrides))
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        // A database URL beats a SQLite path when both are given.
        if let Some(path) = overrides.sqlite_path {
            self.store = StoreConfig::Sqlite { path: Some(path) };
        }
        if let Some(url) = overrides.database_url {
            self.store = StoreConfig::Postgres(PgConfig::from_url(url));
        }
        self
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.bind_addr(), "0.0.0.0:4000");
        assert!(matches!(config.store, StoreConfig::Sqlite { path: None }));
    }

    #[test]
    fn test_parse_postgres_store() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 8081

            [store]
            backend = "postgres"
            host = "db"
            pool_size = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "0.0.0.0");
        match config.store {
            StoreConfig::Postgres(pg) => {
                assert_eq!(pg.host, "db");
                assert_eq!(pg.pool_size, 4);
                assert_eq!(pg.port, 5432);
                assert_eq!(pg.dbname, "pantrypal");
                assert!(pg.url.is_none());
            }
            other => panic!("expected postgres store, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_sqlite_store() {
        let config = AppConfig::from_toml(
            r#"
            [store]
            backend = "sqlite"
            path = "/var/lib/pantrypal.db"
            "#,
        )
        .unwrap();
        match config.store {
            StoreConfig::Sqlite { path } => {
                assert_eq!(path, Some(PathBuf::from("/var/lib/pantrypal.db")));
            }
            other => panic!("expected sqlite store, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_backend_is_an_error() {
        assert!(AppConfig::from_toml("[store]\nbackend = \"mysql\"\n").is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [store]
            backend = "sqlite"
            "#,
        )
        .unwrap()
        .with_overrides(Overrides {
            port: Some(4100),
            database_url: Some("postgres://u:p@db/pantrypal".to_string()),
            ..Default::default()
        });

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 4100);
        match config.store {
            StoreConfig::Postgres(pg) => {
                assert_eq!(pg.url.as_deref(), Some("postgres://u:p@db/pantrypal"));
            }
            other => panic!("expected postgres store, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pantrypal.toml");
        std::fs::write(&path, "[server]\nbody_limit_bytes = 1024\n").unwrap();

        let config = AppConfig::load(Some(&path), Overrides::default()).unwrap();
        assert_eq!(config.server.body_limit_bytes, 1024);
        assert_eq!(config.server.port, 4000);

        let missing = dir.path().join("missing.toml");
        assert!(AppConfig::load(Some(&missing), Overrides::default()).is_err());
    }
}
