use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use pantrypal_storage::Ingredient;
use serde::Deserialize;

use crate::api::ApiState;
use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct NewIngredientBody {
    pub name: String,
}

/// GET /ingredients
pub async fn list_ingredients(State(state): State<Arc<ApiState>>) -> Result<Json<Vec<Ingredient>>> {
    Ok(Json(state.service.list_ingredients().await?))
}

/// POST /ingredients
pub async fn add_ingredient(
    State(state): State<Arc<ApiState>>,
    body: std::result::Result<Json<NewIngredientBody>, JsonRejection>,
) -> Result<Json<Ingredient>> {
    let Json(body) = body?;
    Ok(Json(state.service.add_ingredient(&body.name).await?))
}
