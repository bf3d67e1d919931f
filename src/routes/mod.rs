//! HTTP routes for Switchyard
//!
//! This module defines all HTTP endpoints exposed by the gateway.

pub mod anthropic;
pub mod control;
pub mod health;
pub mod metrics;
pub mod openai;
pub mod relay;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    middleware::auth::{control_auth_middleware, model_auth_middleware},
    AppState,
};

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Completion routes, one per client dialect
    let model_routes = Router::new()
        .route("/v1/chat/completions", post(openai::chat_completions))
        .route("/openai/v1/chat/completions", post(openai::chat_completions))
        .route("/v1/messages", post(anthropic::messages))
        .route("/anthropic/v1/messages", post(anthropic::messages))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            model_auth_middleware,
        ));

    let control_routes = Router::new()
        .route("/api/status", get(control::status))
        .route("/api/providers", get(control::list_providers))
        .route("/api/token", get(control::issue_token))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            control_auth_middleware,
        ));

    // Public routes (health checks, metrics) - no auth required
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    Router::new()
        .merge(public_routes)
        .merge(model_routes)
        .merge(control_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
