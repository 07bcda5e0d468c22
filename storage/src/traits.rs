use async_trait::async_trait;

use crate::types::{
    Challenge, ChallengeFilter, ChallengeRequest, ChallengeStatus, Difficulty, Ingredient,
    NewChallengeRequest, RequestFilter,
};
use crate::Result;

/// Persistence for the challenge lifecycle.
///
/// Every mutating method runs as a single transaction: it either applies all
/// of its writes or none. Preconditions are re-checked inside that
/// transaction, so two concurrent callers racing on the same row cannot both
/// succeed.
///
/// Missing rows are reported as `StorageError::NotFound`, violated
/// preconditions as `StorageError::InvalidState`.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    // ==================== Catalogue ====================

    async fn create_user(&self, username: &str) -> Result<i64>;
    async fn create_ingredient(&self, name: &str) -> Result<Ingredient>;
    /// Whole catalogue, ordered by name.
    async fn list_ingredients(&self) -> Result<Vec<Ingredient>>;

    // ==================== Challenge Requests ====================

    /// Inserts a `NOT_REVIEWED` request with its ingredient rows. The
    /// submitter and every ingredient must exist.
    async fn submit_request(&self, request: &NewChallengeRequest) -> Result<i64>;
    async fn get_request(&self, request_id: i64) -> Result<Option<ChallengeRequest>>;
    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<ChallengeRequest>>;
    /// Ingredients attached to a request, ordered by name. A missing request
    /// is `NotFound`, not an empty list.
    async fn request_ingredients(&self, request_id: i64) -> Result<Vec<Ingredient>>;

    /// Marks the request approved and materializes its challenge, copying
    /// the request's ingredient set. Returns the new challenge id.
    async fn approve_request(&self, request_id: i64, reviewer_id: i64) -> Result<i64>;
    async fn deny_request(&self, request_id: i64, reviewer_id: i64) -> Result<()>;

    // ==================== Challenges ====================

    async fn get_challenge(&self, challenge_id: i64) -> Result<Option<Challenge>>;
    async fn list_challenges(&self, filter: &ChallengeFilter) -> Result<Vec<Challenge>>;
    async fn challenge_ingredients(&self, challenge_id: i64) -> Result<Vec<Ingredient>>;

    /// Assigns `user_id` to an `UNCLAIMED` challenge and moves it to
    /// `IN_PROGRESS`.
    async fn claim_challenge(&self, challenge_id: i64, user_id: i64) -> Result<Challenge>;
    /// Applies `ChallengeStatus::transition_to` from the stored status.
    async fn set_challenge_status(
        &self,
        challenge_id: i64,
        status: ChallengeStatus,
    ) -> Result<Challenge>;
    async fn set_challenge_difficulty(
        &self,
        challenge_id: i64,
        difficulty: Difficulty,
    ) -> Result<Challenge>;
}
