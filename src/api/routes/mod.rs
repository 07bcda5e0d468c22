//! Route handlers, one submodule per resource.

pub mod challenges;
pub mod ingredients;
pub mod requests;
pub mod users;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode, Uri},
    response::Response,
    Json,
};
use serde_json::{json, Value};

use crate::error::ServiceError;

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Any path no route matches.
pub async fn not_found(uri: Uri) -> ServiceError {
    ServiceError::NotFound(format!("route {}", uri.path()))
}

/// Gives axum's empty 405 responses the usual error body. The `Allow`
/// header is kept.
pub async fn method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);
    let body = json!({ "success": false, "error": "method not allowed" }).to_string();

    Response::from_parts(parts, Body::from(body))
}
