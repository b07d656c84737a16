//! Shortcast Orchestrator
//!
//! The durable pipeline engine behind the shorts-generation wizard.
//! Runs advance through a fixed stage graph, suspend at human-decision
//! gates, and survive process restarts when a database is configured.
//!
//! Architecture:
//! - Store: keyed run persistence (memory or Postgres)
//! - Engine: run executor, gate controller, stage-worker boundary
//! - API: axum HTTP layer the wizard client polls

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod store;

use crate::config::Config;
use crate::engine::RunEngine;
use crate::engine::worker::HttpStageWorker;
use crate::store::{MemoryRunStore, PostgresRunStore, RunStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shortcast_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Shortcast Orchestrator...");

    let config = Config::from_env();
    config.validate()?;

    let store: Arc<dyn RunStore> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(database_url).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Database connection pool created");
            Arc::new(PostgresRunStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; runs will not survive a restart");
            Arc::new(MemoryRunStore::new())
        }
    };

    let worker = Arc::new(HttpStageWorker::new(config.worker_url.clone()));
    tracing::info!("Stage worker endpoint: {}", config.worker_url);

    let engine = RunEngine::new(store, worker, config.roster.clone());

    // Build router with all API endpoints
    let app = api::create_router(engine);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
