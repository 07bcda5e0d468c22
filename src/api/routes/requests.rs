//! Challenge request endpoints: submission and admin review.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use pantrypal_storage::{ChallengeRequest, Ingredient, RequestFilter, RequestStatus};
use serde::{Deserialize, Serialize};

use crate::api::ApiState;
use crate::error::{Result, ServiceError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequestsQuery {
    pub status: Option<String>,
    pub requested_by_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequestBody {
    pub requested_by_id: i64,
    pub description: String,
    pub ingredients: Vec<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequestResponse {
    pub request_id: i64,
}

/// Identifies the admin acting on a request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    pub reviewer_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveResponse {
    pub challenge_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclineResponse {
    pub request_id: i64,
    pub status: RequestStatus,
}

/// GET /requests?status=&requestedById=
pub async fn list_requests(
    State(state): State<Arc<ApiState>>,
    query: std::result::Result<Query<ListRequestsQuery>, QueryRejection>,
) -> Result<Json<Vec<ChallengeRequest>>> {
    let Query(query) = query?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<RequestStatus>)
        .transpose()
        .map_err(|e| ServiceError::Validation(e.to_string()))?;

    let filter = RequestFilter {
        status,
        requested_by_id: query.requested_by_id,
    };
    Ok(Json(state.service.list_requests(&filter).await?))
}

/// POST /requests
pub async fn submit_request(
    State(state): State<Arc<ApiState>>,
    body: std::result::Result<Json<SubmitRequestBody>, JsonRejection>,
) -> Result<Json<SubmitRequestResponse>> {
    let Json(body) = body?;
    let request_id = state
        .service
        .submit_request(body.requested_by_id, &body.description, &body.ingredients)
        .await?;

    Ok(Json(SubmitRequestResponse { request_id }))
}

/// GET /requests/:id
pub async fn get_request(
    State(state): State<Arc<ApiState>>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<ChallengeRequest>> {
    let Path(request_id) = id?;
    Ok(Json(state.service.get_request(request_id).await?))
}

/// GET /requests/:id/ingredients
pub async fn get_request_ingredients(
    State(state): State<Arc<ApiState>>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Ingredient>>> {
    let Path(request_id) = id?;
    Ok(Json(state.service.request_ingredients(request_id).await?))
}

/// PUT /requests/:id/approve
///
/// Publishes the request as an unclaimed challenge carrying the same
/// ingredients.
pub async fn approve_request(
    State(state): State<Arc<ApiState>>,
    id: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<ReviewBody>, JsonRejection>,
) -> Result<Json<ApproveResponse>> {
    let Path(request_id) = id?;
    let Json(body) = body?;

    let challenge_id = state.service.approve(request_id, body.reviewer_id).await?;
    Ok(Json(ApproveResponse { challenge_id }))
}

/// PUT /requests/:id/decline
pub async fn decline_request(
    State(state): State<Arc<ApiState>>,
    id: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<ReviewBody>, JsonRejection>,
) -> Result<Json<DeclineResponse>> {
    let Path(request_id) = id?;
    let Json(body) = body?;

    state.service.deny(request_id, body.reviewer_id).await?;
    Ok(Json(DeclineResponse {
        request_id,
        status: RequestStatus::Denied,
    }))
}
