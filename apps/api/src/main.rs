mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod pipeline;
mod providers;
mod retrieval;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::models::bullet::SelectionConstraints;
use crate::pipeline::orchestrator::Orchestrator;
use crate::pipeline::worker::{spawn_workers, JobQueue, RedisReservations};
use crate::providers::{LexicalProvider, LlmProvider};
use crate::retrieval::PgRetriever;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::PgJobStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.database_max_connections).await?;

    // Initialize Redis (job id dedup keys)
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Wire the pipeline: storage, retrieval, providers, orchestrator
    let store = Arc::new(PgJobStore::new(db.clone()));
    let retriever = Arc::new(PgRetriever::new(db.clone()));
    let llm_provider = Arc::new(LlmProvider::new(llm));
    let lexical_provider = Arc::new(LexicalProvider);

    let (progress, _) = broadcast::channel(256);

    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        retriever,
        llm_provider,
        lexical_provider,
        SelectionConstraints::default(),
        progress.clone(),
    ));

    // Start the worker pool
    let reservations = Arc::new(RedisReservations::new(redis));
    let (queue, receiver) = JobQueue::new(reservations, store);
    spawn_workers(
        config.worker_count,
        receiver,
        orchestrator,
        queue.in_flight_counter(),
    );
    info!("Started {} pipeline workers", config.worker_count);

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        queue,
        progress,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
