use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use otpgate_core::health::healthz;
use otpgate_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    health::readyz,
    login::{init_login, login},
    user::{get_user, register_user},
};
use crate::state::AppState;

/// Timed-out requests are dropped, which rolls back any open transaction.
#[allow(deprecated)]
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let users = Router::new()
        .route("/", post(register_user))
        .route("/init/login", post(init_login))
        .route("/login", post(login))
        .route("/{id}", get(get_user));

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Users + OTP login
        .nest("/api/v1/users", users)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
