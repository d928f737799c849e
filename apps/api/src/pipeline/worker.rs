//! Job admission and the background worker pool.
//!
//! `JobQueue` is the handler-facing side: it enforces the idempotency check
//! (a reservation on the client-supplied job id), the in-flight ceiling, and
//! the initial QUEUED row, then hands the job to an in-process channel.
//! `spawn_workers` drains that channel with a fixed pool of tokio tasks, each
//! pulling from a shared receiver.
//!
//! Admission either fully succeeds or leaves no trace: a failure after the
//! reservation is taken releases it, and a failure after the job row exists
//! marks that row FAILED, so a client retry of the same id is never stuck
//! behind state from a half-finished attempt.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::JobRequest;
use crate::pipeline::orchestrator::Orchestrator;
use crate::storage::JobStore;

/// Hard ceiling on jobs admitted but not yet finished.
pub const MAX_IN_FLIGHT_JOBS: usize = 10;

/// How long a job id stays reserved. Long enough to make duplicate client
/// retries harmless, short enough that the keyspace does not grow unbounded.
const DEDUP_TTL_SECS: u64 = 24 * 60 * 60;

const QUEUE_DEPTH: usize = 128;

/// Reservation of client-supplied job ids, backing the duplicate-submission
/// check. A reservation outlives the job it admitted, so resubmitting a
/// finished id still conflicts until the TTL lapses.
#[async_trait]
pub trait JobReservations: Send + Sync {
    /// Attempts to reserve the id. Returns true if this call created the
    /// reservation, false if it was already held.
    async fn reserve(&self, job_id: Uuid) -> Result<bool, AppError>;

    /// Releases a reservation taken by [`reserve`](Self::reserve). Called
    /// when admission fails after the reservation succeeded.
    async fn release(&self, job_id: Uuid) -> Result<(), AppError>;
}

/// Redis-backed reservations: `SET NX EX` to reserve, `DEL` to release.
pub struct RedisReservations {
    client: redis::Client,
}

impl RedisReservations {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, AppError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Queue(format!("Redis connection failed: {e}")))
    }
}

fn dedup_key(job_id: Uuid) -> String {
    format!("resume_jobs:dedup:{job_id}")
}

#[async_trait]
impl JobReservations for RedisReservations {
    async fn reserve(&self, job_id: Uuid) -> Result<bool, AppError> {
        let mut conn = self.connection().await?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(dedup_key(job_id))
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(DEDUP_TTL_SECS)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Queue(format!("Redis SET failed: {e}")))?;
        Ok(reply.is_some())
    }

    async fn release(&self, job_id: Uuid) -> Result<(), AppError> {
        let mut conn = self.connection().await?;
        redis::cmd("DEL")
            .arg(dedup_key(job_id))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| AppError::Queue(format!("Redis DEL failed: {e}")))?;
        Ok(())
    }
}

/// Cheap-to-clone admission handle shared across request handlers.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<JobRequest>,
    reservations: Arc<dyn JobReservations>,
    store: Arc<dyn JobStore>,
    in_flight: Arc<AtomicUsize>,
}

impl JobQueue {
    pub fn new(
        reservations: Arc<dyn JobReservations>,
        store: Arc<dyn JobStore>,
    ) -> (Self, mpsc::Receiver<JobRequest>) {
        let (sender, receiver) = mpsc::channel(QUEUE_DEPTH);
        let queue = Self {
            sender,
            reservations,
            store,
            in_flight: Arc::new(AtomicUsize::new(0)),
        };
        (queue, receiver)
    }

    pub fn in_flight_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.in_flight)
    }

    /// Admits a job: capacity check, idempotency reservation, QUEUED row,
    /// then channel handoff. Errors map to 503 (full), 409 (duplicate id)
    /// or 500 at the HTTP surface. On any failure after the reservation was
    /// taken it is released again, so the same id can be resubmitted.
    pub async fn enqueue(&self, request: JobRequest) -> Result<(), AppError> {
        if self.in_flight.load(Ordering::SeqCst) >= MAX_IN_FLIGHT_JOBS {
            return Err(AppError::QueueFull(format!(
                "{MAX_IN_FLIGHT_JOBS} jobs already in flight, retry later"
            )));
        }

        if !self.reservations.reserve(request.job_id).await? {
            return Err(AppError::Conflict(format!(
                "Job {} was already submitted",
                request.job_id
            )));
        }

        if let Err(e) = self.store.create_job(&request).await {
            self.release_reservation(request.job_id).await;
            return Err(e);
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let job_id = request.job_id;
        if self.sender.send(request).await.is_err() {
            // Channel closed: the row exists but no worker will ever pick it
            // up. Mark it terminal, release the id, surrender the slot.
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.release_reservation(job_id).await;
            if let Err(e) = self
                .store
                .mark_failed(job_id, "Worker channel is closed")
                .await
            {
                error!("Job {job_id}: could not persist FAILED state: {e}");
            }
            return Err(AppError::Queue("Worker channel is closed".to_string()));
        }
        Ok(())
    }

    async fn release_reservation(&self, job_id: Uuid) {
        if let Err(e) = self.reservations.release(job_id).await {
            error!("Job {job_id}: could not release dedup reservation: {e}");
        }
    }
}

/// Starts `count` worker tasks draining a shared receiver. Each worker runs
/// one job at a time to completion; the orchestrator persists the terminal
/// state, so a failed job needs no further handling here beyond releasing
/// its in-flight slot.
pub fn spawn_workers(
    count: usize,
    receiver: mpsc::Receiver<JobRequest>,
    orchestrator: Arc<Orchestrator>,
    in_flight: Arc<AtomicUsize>,
) {
    let receiver = Arc::new(Mutex::new(receiver));

    for worker_id in 0..count {
        let receiver = Arc::clone(&receiver);
        let orchestrator = Arc::clone(&orchestrator);
        let in_flight = Arc::clone(&in_flight);

        tokio::spawn(async move {
            info!("Worker {worker_id} started");
            loop {
                let job = {
                    let mut guard = receiver.lock().await;
                    guard.recv().await
                };
                let Some(job) = job else {
                    info!("Worker {worker_id} shutting down, queue closed");
                    break;
                };

                info!("Worker {worker_id} picked up job {}", job.job_id);
                if let Err(e) = orchestrator.run(&job).await {
                    error!("Worker {worker_id}: job {} failed: {e}", job.job_id);
                }
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        });
    }
}
