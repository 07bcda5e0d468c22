//! PantryPal Server
//!
//! Runs the challenge-request API over PostgreSQL or SQLite.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use pantrypal::storage::{ChallengeStore, LocalStore, PgStore};
use pantrypal::{run_server, AppConfig, Overrides, StoreConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pantrypal-server")]
#[command(about = "PantryPal challenge request API")]
struct Args {
    /// Server host [default: 0.0.0.0]
    #[arg(long, env = "PANTRYPAL_HOST")]
    host: Option<String>,

    /// Server port [default: 4000]
    #[arg(short, long, env = "PANTRYPAL_PORT")]
    port: Option<u16>,

    /// TOML configuration file
    #[arg(short, long, env = "PANTRYPAL_CONFIG")]
    config: Option<PathBuf>,

    /// PostgreSQL connection string; selects the PostgreSQL store
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// SQLite database file; selects the SQLite store
    #[arg(long, env = "PANTRYPAL_SQLITE_PATH")]
    sqlite_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pantrypal=debug,info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::load(
        args.config.as_deref(),
        Overrides {
            host: args.host,
            port: args.port,
            database_url: args.database_url,
            sqlite_path: args.sqlite_path,
        },
    )?;

    info!("Starting PantryPal server");
    info!("  Listening on: {}", config.bind_addr());

    let store: Arc<dyn ChallengeStore> = match &config.store {
        StoreConfig::Postgres(pg) => {
            info!("  Store: PostgreSQL {:?}", pg);
            Arc::new(PgStore::connect(pg).await?)
        }
        StoreConfig::Sqlite { path: Some(path) } => {
            info!("  Store: SQLite at {:?}", path);
            Arc::new(LocalStore::open(path)?)
        }
        StoreConfig::Sqlite { path: None } => {
            info!("  Store: SQLite in memory (data is lost on exit)");
            Arc::new(LocalStore::open_in_memory()?)
        }
    };

    run_server(store, &config.server).await
}
