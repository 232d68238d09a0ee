//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{any, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/countdown/start", post(countdown_start_handler))
        .route("/countdown/slide", post(countdown_slide_handler))
        .route("/countdown/save", post(countdown_save_handler))
        .route("/countdown/stop", post(countdown_stop_handler))
        .route("/countdown/status", get(countdown_status_handler))
        .route("/signals/:action", post(signal_handler))
        .route("/provider/call", post(provider_call_handler))
        // Tabular surface is unsupported by design
        .route("/provider/query", any(provider_query_handler))
        .route("/provider/type", any(provider_type_handler))
        .route("/provider/insert", any(provider_insert_handler))
        .route("/provider/update", any(provider_update_handler))
        .route("/provider/delete", any(provider_delete_handler))
        .route(
            "/settings/warning-sound",
            get(sound_setting_handler).put(sound_setting_update_handler),
        )
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
