use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Coarse lifecycle status of a resume job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }
}

/// Named pipeline stage, with its progress value once the stage completes.
///
/// Only the orchestrator advances the stage; progress is monotonically
/// non-decreasing within a job. `Failed` is terminal and reachable from
/// any other stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStage {
    ParsingJd,
    RetrievingBullets,
    SelectingBullets,
    RewritingBullets,
    Verifying,
    Assembling,
    Completed,
    Failed,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::ParsingJd => "PARSING_JD",
            JobStage::RetrievingBullets => "RETRIEVING_BULLETS",
            JobStage::SelectingBullets => "SELECTING_BULLETS",
            JobStage::RewritingBullets => "REWRITING_BULLETS",
            JobStage::Verifying => "VERIFYING",
            JobStage::Assembling => "ASSEMBLING",
            JobStage::Completed => "COMPLETED",
            JobStage::Failed => "FAILED",
        }
    }

    /// Progress persisted when this stage completes.
    pub fn progress(&self) -> i32 {
        match self {
            JobStage::ParsingJd => 10,
            JobStage::RetrievingBullets => 25,
            JobStage::SelectingBullets => 45,
            JobStage::RewritingBullets => 55,
            JobStage::Verifying => 75,
            JobStage::Assembling => 90,
            JobStage::Completed => 100,
            JobStage::Failed => 0,
        }
    }
}

/// Which pipeline variant a job runs.
///
/// Wire names match the submission contract: `openai` drives the full
/// LLM-assisted pipeline (rewrite + verify), `bm25` skips from selection
/// straight to assembly using lexical JD parsing only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    #[default]
    #[serde(rename = "openai")]
    Llm,
    #[serde(rename = "bm25")]
    Lexical,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Llm => "openai",
            Strategy::Lexical => "bm25",
        }
    }
}

/// A job submission message. `job_id` is the idempotency/dedup key; a
/// submission without one gets a fresh id (and no duplicate protection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    #[serde(default = "Uuid::new_v4")]
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub job_description: String,
    #[serde(default)]
    pub strategy: Strategy,
}

/// Persisted job record, the single source of truth for status/progress.
/// Mutated only by the orchestrator owning the job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeJobRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub jd_text: String,
    pub strategy: String,
    pub status: String,
    /// Null until the orchestrator completes the first stage.
    pub stage: Option<String>,
    pub progress: i32,
    pub error_message: Option<String>,
    pub result_resume: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Event published after each stage transition, consumed externally
/// for live UI updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressEvent {
    Stage {
        job_id: Uuid,
        progress: i32,
        stage: String,
    },
    Failed {
        job_id: Uuid,
        error: String,
    },
    Completed {
        job_id: Uuid,
    },
}

impl ProgressEvent {
    pub fn stage(job_id: Uuid, stage: JobStage) -> Self {
        ProgressEvent::Stage {
            job_id,
            progress: stage.progress(),
            stage: stage.as_str().to_string(),
        }
    }
}
