//! API routes

pub mod health;
pub mod routing;

use axum::{middleware, routing::get, Router};

use crate::{routing::host_routing_middleware, state::AppState};

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (no host routing, probes hit the server by IP)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness));

    // Host-routed routes
    let routed = Router::new()
        .route("/", get(routing::current_routing))
        .route("/_routing", get(routing::current_routing))
        .layer(middleware::from_fn_with_state(
            state.resolver.clone(),
            host_routing_middleware,
        ));

    Router::new().merge(health_routes).merge(routed)
}
