//! Pipeline orchestrator: the per-job state machine.
//!
//! Sequences extraction → retrieval → selection → (rewrite → verification)
//! → assembly → persistence, persisting the job record and publishing a
//! progress event after every stage. The full strategy runs all stages; the
//! bm25 strategy skips from selection straight to assembly.
//!
//! The orchestrator owns all I/O and all error handling: a stage failure
//! writes the terminal FAILED record and re-raises, with no retry. Only
//! per-bullet rewrite failures degrade instead of failing the job.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::bullet::{BulletCandidate, RewriteOutcome, SelectionConstraints, VerifiedBullet};
use crate::models::job::{JobRequest, JobStage, ProgressEvent, Strategy};
use crate::pipeline::{assembler, selector, verifier};
use crate::providers::ContentProvider;
use crate::retrieval::Retriever;
use crate::storage::{AuditInsert, JobStore};

/// How many candidates to pull from retrieval before selection.
const RETRIEVAL_SIZE: usize = 50;

pub struct Orchestrator {
    store: Arc<dyn JobStore>,
    retriever: Arc<dyn Retriever>,
    llm_provider: Arc<dyn ContentProvider>,
    lexical_provider: Arc<dyn ContentProvider>,
    constraints: SelectionConstraints,
    progress: broadcast::Sender<ProgressEvent>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        retriever: Arc<dyn Retriever>,
        llm_provider: Arc<dyn ContentProvider>,
        lexical_provider: Arc<dyn ContentProvider>,
        constraints: SelectionConstraints,
        progress: broadcast::Sender<ProgressEvent>,
    ) -> Self {
        Self {
            store,
            retriever,
            llm_provider,
            lexical_provider,
            constraints,
            progress,
        }
    }

    /// Runs a job to a terminal state. Exactly one execution attempt: on any
    /// stage failure the job record is marked FAILED and the error re-raised
    /// to the worker.
    pub async fn run(&self, job: &JobRequest) -> Result<(), AppError> {
        match self.run_pipeline(job).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let message = e.to_string();
                warn!("Job {} failed: {message}", job.job_id);
                // A failing FAILED write must not mask the stage error or
                // swallow the failure event.
                if let Err(store_err) = self.store.mark_failed(job.job_id, &message).await {
                    error!(
                        "Job {}: could not persist FAILED state: {store_err}",
                        job.job_id
                    );
                }
                let _ = self.progress.send(ProgressEvent::Failed {
                    job_id: job.job_id,
                    error: message,
                });
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, job: &JobRequest) -> Result<(), AppError> {
        let provider = self.provider_for(job.strategy);
        info!(
            "Job {} starting ({} strategy) for user {}",
            job.job_id,
            provider.name(),
            job.user_id
        );

        // Stage 1: parse the JD into search terms.
        let terms = provider.parse_job_description(&job.job_description).await?;
        self.advance(job.job_id, JobStage::ParsingJd).await?;

        // Stage 2: retrieval.
        let candidates = self
            .retriever
            .search(job.user_id, &terms.search_terms(), RETRIEVAL_SIZE)
            .await?;
        info!("Job {}: {} candidates retrieved", job.job_id, candidates.len());
        self.advance(job.job_id, JobStage::RetrievingBullets).await?;

        // Stage 3: constrained selection.
        let selected = selector::select(&candidates, &self.constraints);
        info!("Job {}: {} bullets selected", job.job_id, selected.len());
        self.advance(job.job_id, JobStage::SelectingBullets).await?;

        // Stages 4-5: rewrite + verification, full strategy only.
        let verified: Vec<(RewriteOutcome, VerifiedBullet)> = if job.strategy == Strategy::Llm {
            let rewrites = self.rewrite_all(job, provider.as_ref(), &terms, &selected).await;
            self.advance(job.job_id, JobStage::RewritingBullets).await?;

            let verified = selected
                .iter()
                .zip(rewrites)
                .map(|(bullet, outcome)| {
                    let checked = verifier::verify_rewrite(bullet, &outcome.rewritten_text);
                    (outcome, checked)
                })
                .collect();
            self.advance(job.job_id, JobStage::Verifying).await?;
            verified
        } else {
            Vec::new()
        };

        // Stage 6: assembly.
        let final_texts: HashMap<Uuid, String> = verified
            .iter()
            .map(|(_, v)| (v.bullet_id, v.text.clone()))
            .collect();
        let profile = self.store.load_profile(job.user_id).await?;
        let resume = assembler::assemble_resume(&profile, &selected, &final_texts);
        self.advance(job.job_id, JobStage::Assembling).await?;

        // Stage 7: persistence. Audit rows first, then the terminal record.
        let audits = build_audits(&selected, &verified);
        self.store.insert_audits(job.job_id, &audits).await?;

        let resume_value = serde_json::to_value(&resume)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize resume: {e}")))?;
        self.store.complete(job.job_id, &resume_value).await?;
        let _ = self
            .progress
            .send(ProgressEvent::Completed { job_id: job.job_id });

        info!("Job {} completed", job.job_id);
        Ok(())
    }

    /// Rewrites every selected bullet. A failing bullet degrades to its
    /// original content with a `rewrite_failed` flag instead of aborting
    /// the job.
    async fn rewrite_all(
        &self,
        job: &JobRequest,
        provider: &dyn ContentProvider,
        terms: &crate::pipeline::keywords::ExtractedTerms,
        selected: &[BulletCandidate],
    ) -> Vec<RewriteOutcome> {
        let mut outcomes = Vec::with_capacity(selected.len());
        for bullet in selected {
            let outcome = match provider.rewrite_bullet(bullet, terms).await {
                Ok(outcome) => {
                    if !outcome.risk_flags.is_empty() {
                        warn!(
                            "Job {}: bullet {} self-reported risk flags: {:?}",
                            job.job_id, bullet.bullet_id, outcome.risk_flags
                        );
                    }
                    outcome
                }
                Err(e) => {
                    warn!(
                        "Job {}: rewrite failed for bullet {}, keeping original: {e}",
                        job.job_id, bullet.bullet_id
                    );
                    RewriteOutcome::fallback(bullet)
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn advance(&self, job_id: Uuid, stage: JobStage) -> Result<(), AppError> {
        self.store.set_stage(job_id, stage).await?;
        let _ = self.progress.send(ProgressEvent::stage(job_id, stage));
        Ok(())
    }

    fn provider_for(&self, strategy: Strategy) -> Arc<dyn ContentProvider> {
        match strategy {
            Strategy::Llm => Arc::clone(&self.llm_provider),
            Strategy::Lexical => Arc::clone(&self.lexical_provider),
        }
    }
}

/// One audit row per selected bullet. Without a rewrite pass (bm25) the
/// final text is the retrieved content and the note is null.
fn build_audits(
    selected: &[BulletCandidate],
    verified: &[(RewriteOutcome, VerifiedBullet)],
) -> Vec<AuditInsert> {
    let by_id: HashMap<Uuid, &(RewriteOutcome, VerifiedBullet)> = verified
        .iter()
        .map(|pair| (pair.1.bullet_id, pair))
        .collect();

    selected
        .iter()
        .map(|bullet| match by_id.get(&bullet.bullet_id) {
            Some((outcome, checked)) => AuditInsert {
                bullet_id: bullet.bullet_id,
                original_text: bullet.content.clone(),
                rewritten_text: checked.text.clone(),
                evidence: json!(outcome.evidence_bullet_ids),
                verifier_note: checked.verifier_note.clone(),
            },
            None => AuditInsert {
                bullet_id: bullet.bullet_id,
                original_text: bullet.content.clone(),
                rewritten_text: bullet.content.clone(),
                evidence: json!([bullet.bullet_id]),
                verifier_note: None,
            },
        })
        .collect()
}
