//! Bearer-token guard for the trigger endpoint.
//!
//! When `server.api_key` is unset every request passes.

use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::context::AppContext;

/// Check an `Authorization` header value against the expected key.
pub fn bearer_matches(authorization: Option<&str>, expected: &str) -> bool {
    authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token.trim() == expected)
}

pub async fn require_api_key(
    State(ctx): State<AppContext>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let Some(expected) = ctx.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if bearer_matches(authorization, expected) {
        Ok(next.run(request).await)
    } else {
        tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated request");
        Err((
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({ "status": "unauthorized" })),
        )
            .into_response())
    }
}
