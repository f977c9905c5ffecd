//! Route definitions for the VestibulaRe operator API.
//!
//! All routes are mounted under `/api`. Admin routes sit behind the
//! operator token middleware; the health check does not.

use axum::{Router, middleware as axum_middleware, routing::get, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(admin_routes(state.clone()))
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Operator endpoints: sweep, broadcast
fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/sweep", post(handlers::admin::sweep::run_sweep))
        .route(
            "/admin/events/{id}/broadcast",
            post(handlers::admin::broadcast::broadcast_event),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::auth::require_operator,
        ))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
