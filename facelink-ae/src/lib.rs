//! facelink-ae library interface
//!
//! Exposes the pipeline services and HTTP surface for integration testing.

pub mod api;
pub mod config;
pub mod models;
pub mod services;

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::PipelineDispatcher;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// The running notification pipeline
    pub dispatcher: Arc<PipelineDispatcher>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(dispatcher: Arc<PipelineDispatcher>) -> Self {
        Self {
            dispatcher,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::notification_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
