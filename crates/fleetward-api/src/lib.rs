//! Fleetward API — axum routers for the public `/api` surface and the
//! internal `/internal` surface used by sibling services.
//!
//! The two routers are built separately so the binary can serve the
//! internal one on a private listener.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Routes reachable by end users and devices.
pub fn public_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health::healthz))
        .route("/api/login", post(handlers::auth::login))
        .route(
            "/api/devices/auth",
            post(handlers::auth::authenticate_device),
        )
        .route("/api/devices", get(handlers::devices::list_devices))
        .route(
            "/api/devices/{uid}",
            get(handlers::devices::get_device)
                .patch(handlers::devices::rename_device)
                .delete(handlers::devices::delete_device),
        )
        .route(
            "/api/devices/{uid}/accepted",
            patch(handlers::devices::accept_device),
        )
        .route("/api/sessions", get(handlers::sessions::list_sessions))
        .route(
            "/api/sessions/{uid}",
            get(handlers::sessions::get_session),
        )
        .route("/api/stats", get(handlers::stats::get_stats))
        .with_state(state)
}

/// Routes for trusted services. Never exposed with bearer auth.
pub fn internal_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/internal/auth/token/{tenant_id}",
            get(handlers::auth::internal_token),
        )
        .route(
            "/internal/sessions",
            post(handlers::sessions::create_session),
        )
        .route(
            "/internal/sessions/{uid}",
            patch(handlers::sessions::set_authenticated),
        )
        .route(
            "/internal/sessions/{uid}/finish",
            post(handlers::sessions::finish_session),
        )
        .route(
            "/internal/sessions/{uid}/keepalive",
            post(handlers::sessions::keepalive),
        )
        .with_state(state)
}

/// Wrap a router with request tracing and a per-request deadline.
pub fn with_layers(router: Router, request_timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                request_timeout,
            )),
    )
}

/// Both surfaces on one router, for single-listener deployments.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    with_layers(
        public_router(state.clone()).merge(internal_router(state)),
        request_timeout,
    )
}
