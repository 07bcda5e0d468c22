//! PostgreSQL backend.
//!
//! Query functions take the pool directly so they can be used without a
//! `PgStore`; `PgStore` wires them to the `ChallengeStore` trait.

pub mod catalog;
pub mod challenges;
pub mod requests;

use async_trait::async_trait;
use tracing::info;

use crate::pg::{create_pool, PgConfig, PgPool};
use crate::schema::POSTGRES_SCHEMA;
use crate::traits::ChallengeStore;
use crate::types::{
    Challenge, ChallengeFilter, ChallengeRequest, ChallengeStatus, Difficulty, Ingredient,
    NewChallengeRequest, RequestFilter,
};
use crate::Result;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Builds the pool, checks connectivity and provisions the schema.
    pub async fn connect(cfg: &PgConfig) -> Result<Self> {
        let pool = create_pool(cfg)?;

        let client = pool.get().await?;
        info!("Connected to PostgreSQL database");

        client.batch_execute(POSTGRES_SCHEMA).await?;
        info!("Database schema initialized");

        Ok(Self { pool })
    }
}

#[async_trait]
impl ChallengeStore for PgStore {
    async fn create_user(&self, username: &str) -> Result<i64> {
        catalog::insert_user(&self.pool, username).await
    }

    async fn create_ingredient(&self, name: &str) -> Result<Ingredient> {
        catalog::insert_ingredient(&self.pool, name).await
    }

    async fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        catalog::list_ingredients(&self.pool).await
    }

    async fn submit_request(&self, request: &NewChallengeRequest) -> Result<i64> {
        requests::insert_request(&self.pool, request).await
    }

    async fn get_request(&self, request_id: i64) -> Result<Option<ChallengeRequest>> {
        requests::get_request(&self.pool, request_id).await
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<ChallengeRequest>> {
        requests::list_requests(&self.pool, filter).await
    }

    async fn request_ingredients(&self, request_id: i64) -> Result<Vec<Ingredient>> {
        requests::list_request_ingredients(&self.pool, request_id).await
    }

    async fn approve_request(&self, request_id: i64, reviewer_id: i64) -> Result<i64> {
        requests::approve_request(&self.pool, request_id, reviewer_id).await
    }

    async fn deny_request(&self, request_id: i64, reviewer_id: i64) -> Result<()> {
        requests::deny_request(&self.pool, request_id, reviewer_id).await
    }

    async fn get_challenge(&self, challenge_id: i64) -> Result<Option<Challenge>> {
        challenges::get_challenge(&self.pool, challenge_id).await
    }

    async fn list_challenges(&self, filter: &ChallengeFilter) -> Result<Vec<Challenge>> {
        challenges::list_challenges(&self.pool, filter).await
    }

    async fn challenge_ingredients(&self, challenge_id: i64) -> Result<Vec<Ingredient>> {
        challenges::list_challenge_ingredients(&self.pool, challenge_id).await
    }

    async fn claim_challenge(&self, challenge_id: i64, user_id: i64) -> Result<Challenge> {
        challenges::claim_challenge(&self.pool, challenge_id, user_id).await
    }

    async fn set_challenge_status(
        &self,
        challenge_id: i64,
        status: ChallengeStatus,
    ) -> Result<Challenge> {
        challenges::update_challenge_status(&self.pool, challenge_id, status).await
    }

    async fn set_challenge_difficulty(
        &self,
        challenge_id: i64,
        difficulty: Difficulty,
    ) -> Result<Challenge> {
        challenges::update_challenge_difficulty(&self.pool, challenge_id, difficulty).await
    }
}
