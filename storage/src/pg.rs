use std::fmt;

use deadpool_postgres::{Config, CreatePoolError, ManagerConfig, Pool, RecyclingMethod, Runtime};
use serde::Deserialize;
use tokio_postgres::NoTls;

pub type PgPool = Pool;

#[derive(Clone, Deserialize)]
pub struct PgConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_dbname")]
    pub dbname: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Full connection string; when set it wins over the discrete fields.
    #[serde(default)]
    pub url: Option<String>,
}

impl fmt::Debug for PgConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("dbname", &self.dbname)
            .field("pool_size", &self.pool_size)
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_password() -> String {
    "postgres".to_string()
}

fn default_dbname() -> String {
    "pantrypal".to_string()
}

fn default_pool_size() -> usize {
    16
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: default_password(),
            dbname: default_dbname(),
            pool_size: default_pool_size(),
            url: None,
        }
    }
}

impl PgConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

pub fn create_pool(cfg: &PgConfig) -> Result<PgPool, CreatePoolError> {
    let mut config = Config::new();
    match &cfg.url {
        Some(url) => config.url = Some(url.clone()),
        None => {
            config.host = Some(cfg.host.clone());
            config.port = Some(cfg.port);
            config.user = Some(cfg.user.clone());
            config.password = Some(cfg.password.clone());
            config.dbname = Some(cfg.dbname.clone());
        }
    }
    config.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    config.pool = Some(deadpool_postgres::PoolConfig::new(cfg.pool_size));

    config.create_pool(Some(Runtime::Tokio1), NoTls)
}
