pub mod local;
pub mod pg;
pub mod postgres;
pub mod schema;
pub mod traits;
pub mod types;

pub use local::LocalStore;
pub use pg::{create_pool, PgConfig, PgPool};
pub use postgres::PgStore;
pub use traits::ChallengeStore;
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("failed to create pool: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<UnknownVariant> for StorageError {
    fn from(err: UnknownVariant) -> Self {
        StorageError::InvalidData(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
