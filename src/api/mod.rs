//! REST API.
//!
//! All bodies are JSON. Failures answer `{"success": false, "error": "..."}`
//! with the status code chosen by `ServiceError`.

pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

pub use state::ApiState;

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        // Challenge requests
        .route(
            "/requests",
            get(routes::requests::list_requests).post(routes::requests::submit_request),
        )
        .route("/requests/:id", get(routes::requests::get_request))
        .route(
            "/requests/:id/ingredients",
            get(routes::requests::get_request_ingredients),
        )
        .route("/requests/:id/approve", put(routes::requests::approve_request))
        .route("/requests/:id/decline", put(routes::requests::decline_request))
        // Challenges
        .route("/challenges", get(routes::challenges::list_challenges))
        .route("/challenges/:id", get(routes::challenges::get_challenge))
        .route(
            "/challenges/:id/ingredients",
            get(routes::challenges::get_challenge_ingredients),
        )
        .route("/challenges/:id/claim", put(routes::challenges::claim_challenge))
        .route("/challenges/:id/status", put(routes::challenges::set_status))
        .route(
            "/challenges/:id/difficulty",
            put(routes::challenges::set_difficulty),
        )
        // Catalogue
        .route(
            "/ingredients",
            get(routes::ingredients::list_ingredients).post(routes::ingredients::add_ingredient),
        )
        .route("/users", post(routes::users::add_user))
        .fallback(routes::not_found)
        .layer(middleware::map_response(routes::method_not_allowed))
        .with_state(state)
}
