use tokio::sync::broadcast;
use sqlx::PgPool;

use crate::config::Config;
use crate::models::job::ProgressEvent;
use crate::pipeline::worker::JobQueue;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Admission handle for resume generation jobs.
    pub queue: JobQueue,
    /// Stage transition feed. Subscribe for live progress consumers.
    pub progress: broadcast::Sender<ProgressEvent>,
}
