use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::ApiState;
use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct NewUserBody {
    pub username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserResponse {
    pub user_id: i64,
    pub username: String,
}

/// POST /users
pub async fn add_user(
    State(state): State<Arc<ApiState>>,
    body: std::result::Result<Json<NewUserBody>, JsonRejection>,
) -> Result<Json<NewUserResponse>> {
    let Json(body) = body?;
    let user_id = state.service.add_user(&body.username).await?;

    Ok(Json(NewUserResponse {
        user_id,
        username: body.username.trim().to_string(),
    }))
}
