//! Challenge lifecycle service.
//!
//! Validates caller input before touching the store, then delegates each
//! operation to one `ChallengeStore` call. Every state change is logged.

use std::collections::HashSet;
use std::sync::Arc;

use pantrypal_storage::{
    Challenge, ChallengeFilter, ChallengeRequest, ChallengeStatus, ChallengeStore, Difficulty,
    Ingredient, NewChallengeRequest, RequestFilter,
};
use tracing::{info, warn};

use crate::error::{Result, ServiceError};

#[derive(Clone)]
pub struct ChallengeService {
    store: Arc<dyn ChallengeStore>,
}

impl ChallengeService {
    pub fn new(store: Arc<dyn ChallengeStore>) -> Self {
        Self { store }
    }

    // ==================== Catalogue ====================

    /// Registers a user and returns the id that requests, reviews and
    /// claims refer to.
    pub async fn add_user(&self, username: &str) -> Result<i64> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ServiceError::Validation(
                "username must not be blank".to_string(),
            ));
        }

        let user_id = self.store.create_user(username).await?;
        info!("Added user {} ({})", user_id, username);
        Ok(user_id)
    }

    pub async fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        Ok(self.store.list_ingredients().await?)
    }

    pub async fn add_ingredient(&self, name: &str) -> Result<Ingredient> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation(
                "ingredient name must not be blank".to_string(),
            ));
        }

        let ingredient = self.store.create_ingredient(name).await?;
        info!(
            "Added ingredient {} ({})",
            ingredient.ingredient_id, ingredient.name
        );
        Ok(ingredient)
    }

    // ==================== Challenge Requests ====================

    /// Submits a new request. Duplicate ingredient ids are collapsed, keeping
    /// first-seen order.
    pub async fn submit_request(
        &self,
        requested_by_id: i64,
        description: &str,
        ingredient_ids: &[i64],
    ) -> Result<i64> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ServiceError::Validation(
                "description must not be blank".to_string(),
            ));
        }
        if ingredient_ids.is_empty() {
            return Err(ServiceError::Validation(
                "at least one ingredient is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let ingredient_ids: Vec<i64> = ingredient_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let request_id = self
            .store
            .submit_request(&NewChallengeRequest {
                requested_by_id,
                description: description.to_string(),
                ingredient_ids,
            })
            .await?;

        info!(
            "Request {} submitted by user {}",
            request_id, requested_by_id
        );
        Ok(request_id)
    }

    pub async fn get_request(&self, request_id: i64) -> Result<ChallengeRequest> {
        self.store
            .get_request(request_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("request {}", request_id)))
    }

    pub async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<ChallengeRequest>> {
        Ok(self.store.list_requests(filter).await?)
    }

    pub async fn request_ingredients(&self, request_id: i64) -> Result<Vec<Ingredient>> {
        Ok(self.store.request_ingredients(request_id).await?)
    }

    /// Approves a pending request and returns the id of the challenge it
    /// became.
    pub async fn approve(&self, request_id: i64, reviewer_id: i64) -> Result<i64> {
        match self.store.approve_request(request_id, reviewer_id).await {
            Ok(challenge_id) => {
                info!(
                    "Request {} approved by user {}, created challenge {}",
                    request_id, reviewer_id, challenge_id
                );
                Ok(challenge_id)
            }
            Err(e) => {
                let err = ServiceError::from(e);
                if matches!(err, ServiceError::InvalidState(_)) {
                    warn!("Approval of request {} rejected: {}", request_id, err);
                }
                Err(err)
            }
        }
    }

    pub async fn deny(&self, request_id: i64, reviewer_id: i64) -> Result<()> {
        match self.store.deny_request(request_id, reviewer_id).await {
            Ok(()) => {
                info!("Request {} denied by user {}", request_id, reviewer_id);
                Ok(())
            }
            Err(e) => {
                let err = ServiceError::from(e);
                if matches!(err, ServiceError::InvalidState(_)) {
                    warn!("Denial of request {} rejected: {}", request_id, err);
                }
                Err(err)
            }
        }
    }

    // ==================== Challenges ====================

    pub async fn get_challenge(&self, challenge_id: i64) -> Result<Challenge> {
        self.store
            .get_challenge(challenge_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("challenge {}", challenge_id)))
    }

    pub async fn list_challenges(&self, filter: &ChallengeFilter) -> Result<Vec<Challenge>> {
        Ok(self.store.list_challenges(filter).await?)
    }

    pub async fn challenge_ingredients(&self, challenge_id: i64) -> Result<Vec<Ingredient>> {
        Ok(self.store.challenge_ingredients(challenge_id).await?)
    }

    pub async fn claim(&self, challenge_id: i64, user_id: i64) -> Result<Challenge> {
        match self.store.claim_challenge(challenge_id, user_id).await {
            Ok(challenge) => {
                info!("Challenge {} claimed by user {}", challenge_id, user_id);
                Ok(challenge)
            }
            Err(e) => {
                let err = ServiceError::from(e);
                if matches!(err, ServiceError::InvalidState(_)) {
                    warn!(
                        "Claim of challenge {} by user {} rejected: {}",
                        challenge_id, user_id, err
                    );
                }
                Err(err)
            }
        }
    }

    pub async fn set_status(&self, challenge_id: i64, status: ChallengeStatus) -> Result<Challenge> {
        match self.store.set_challenge_status(challenge_id, status).await {
            Ok(challenge) => {
                info!("Challenge {} is now {}", challenge_id, challenge.status);
                Ok(challenge)
            }
            Err(e) => {
                let err = ServiceError::from(e);
                if matches!(err, ServiceError::InvalidState(_)) {
                    warn!(
                        "Status change of challenge {} to {} rejected: {}",
                        challenge_id, status, err
                    );
                }
                Err(err)
            }
        }
    }

    pub async fn set_difficulty(
        &self,
        challenge_id: i64,
        difficulty: Difficulty,
    ) -> Result<Challenge> {
        let challenge = self
            .store
            .set_challenge_difficulty(challenge_id, difficulty)
            .await?;
        info!("Challenge {} difficulty set to {}", challenge_id, difficulty);
        Ok(challenge)
    }
}
