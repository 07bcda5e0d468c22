//! Published challenge endpoints: browsing, claiming and progress.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use pantrypal_storage::{
    Challenge, ChallengeFilter, ChallengeStatus, Difficulty, Ingredient, UnknownVariant,
};
use serde::{Deserialize, Serialize};

use crate::api::ApiState;
use crate::error::{Result, ServiceError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChallengesQuery {
    pub status: Option<String>,
    pub difficulty: Option<String>,
    pub claimed_by: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimBody {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct DifficultyBody {
    pub difficulty: String,
}

/// Claim and status changes answer with the fields they touch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeStateResponse {
    pub challenge_id: i64,
    pub status: ChallengeStatus,
    pub claimed_by_id: Option<i64>,
}

impl From<Challenge> for ChallengeStateResponse {
    fn from(challenge: Challenge) -> Self {
        Self {
            challenge_id: challenge.challenge_id,
            status: challenge.status,
            claimed_by_id: challenge.claimed_by_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyResponse {
    pub challenge_id: i64,
    pub difficulty: Option<Difficulty>,
}

fn parse_field<T>(raw: &str) -> Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    raw.parse()
        .map_err(|e: UnknownVariant| ServiceError::Validation(e.to_string()))
}

/// GET /challenges?status=&difficulty=&claimedBy=
pub async fn list_challenges(
    State(state): State<Arc<ApiState>>,
    query: std::result::Result<Query<ListChallengesQuery>, QueryRejection>,
) -> Result<Json<Vec<Challenge>>> {
    let Query(query) = query?;

    let filter = ChallengeFilter {
        status: query.status.as_deref().map(parse_field).transpose()?,
        difficulty: query.difficulty.as_deref().map(parse_field).transpose()?,
        claimed_by_id: query.claimed_by,
    };
    Ok(Json(state.service.list_challenges(&filter).await?))
}

/// GET /challenges/:id
pub async fn get_challenge(
    State(state): State<Arc<ApiState>>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Challenge>> {
    let Path(challenge_id) = id?;
    Ok(Json(state.service.get_challenge(challenge_id).await?))
}

/// GET /challenges/:id/ingredients
pub async fn get_challenge_ingredients(
    State(state): State<Arc<ApiState>>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Ingredient>>> {
    let Path(challenge_id) = id?;
    Ok(Json(state.service.challenge_ingredients(challenge_id).await?))
}

/// PUT /challenges/:id/claim
///
/// Only an unclaimed challenge can be claimed; anything else is a 409.
pub async fn claim_challenge(
    State(state): State<Arc<ApiState>>,
    id: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<ClaimBody>, JsonRejection>,
) -> Result<Json<ChallengeStateResponse>> {
    let Path(challenge_id) = id?;
    let Json(body) = body?;

    let challenge = state.service.claim(challenge_id, body.user_id).await?;
    Ok(Json(challenge.into()))
}

/// PUT /challenges/:id/status
pub async fn set_status(
    State(state): State<Arc<ApiState>>,
    id: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<ChallengeStateResponse>> {
    let Path(challenge_id) = id?;
    let Json(body) = body?;
    let status: ChallengeStatus = parse_field(&body.status)?;

    let challenge = state.service.set_status(challenge_id, status).await?;
    Ok(Json(challenge.into()))
}

/// PUT /challenges/:id/difficulty
pub async fn set_difficulty(
    State(state): State<Arc<ApiState>>,
    id: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<DifficultyBody>, JsonRejection>,
) -> Result<Json<DifficultyResponse>> {
    let Path(challenge_id) = id?;
    let Json(body) = body?;
    let difficulty: Difficulty = parse_field(&body.difficulty)?;

    let challenge = state
        .service
        .set_difficulty(challenge_id, difficulty)
        .await?;
    Ok(Json(DifficultyResponse {
        challenge_id: challenge.challenge_id,
        difficulty: challenge.difficulty,
    }))
}
