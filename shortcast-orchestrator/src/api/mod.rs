//! API Module
//!
//! HTTP API layer for the orchestrator. All pipeline endpoints live under
//! `/api/v1/pipeline`; gate endpoints come in GET (prompt) / POST (resume)
//! pairs, one per gate.

pub mod error;
pub mod health;
pub mod run;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::RunEngine;

/// Create the main API router with all endpoints
pub fn create_router(engine: Arc<RunEngine>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Run lifecycle
        .route("/api/v1/pipeline/start", post(run::start_run))
        .route("/api/v1/pipeline/{run_id}/status", get(run::get_status))
        .route("/api/v1/pipeline/{run_id}/result", get(run::get_result))
        // Gate endpoints: GET prompt / POST resume
        .route("/api/v1/pipeline/{run_id}/topics", get(run::get_topics))
        .route(
            "/api/v1/pipeline/{run_id}/topic-selection",
            post(run::submit_topic_selection),
        )
        .route("/api/v1/pipeline/{run_id}/speakers", get(run::get_speakers))
        .route(
            "/api/v1/pipeline/{run_id}/speaker-selection",
            post(run::submit_speaker_selection),
        )
        .route("/api/v1/pipeline/{run_id}/script", get(run::get_script))
        .route("/api/v1/pipeline/{run_id}/review", post(run::submit_review))
        .route(
            "/api/v1/pipeline/{run_id}/audio-choice",
            get(run::get_audio_choice).post(run::submit_audio_choice),
        )
        .route(
            "/api/v1/pipeline/{run_id}/hook-prompt",
            get(run::get_hook_prompt).post(run::submit_hook_prompt),
        )
        // Add state and middleware
        .with_state(engine)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
