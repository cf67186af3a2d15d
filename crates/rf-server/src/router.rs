//! Axum router construction.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::auth::require_api_key;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let protected = Router::new()
        .route("/process_video", post(routes::process::process_video))
        .layer(middleware::from_fn_with_state(ctx.clone(), require_api_key));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
