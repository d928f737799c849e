//! Job-record and audit persistence behind the `JobStore` trait.
//!
//! The orchestrator is the only writer for a given job's record; handlers
//! read job rows directly with sqlx. Tests swap in an in-memory store.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobRequest, JobStage, JobStatus};
use crate::models::profile::{
    EducationRow, ExperienceRow, ProjectRow, SkillCategoryRow, User, UserProfile,
};

/// One audit insert per selected bullet per job.
#[derive(Debug, Clone)]
pub struct AuditInsert {
    pub bullet_id: Uuid,
    pub original_text: String,
    pub rewritten_text: String,
    pub evidence: Value,
    pub verifier_note: Option<String>,
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts the job record as QUEUED with progress 0 and no stage; the
    /// stage column stays null until the orchestrator starts the job.
    async fn create_job(&self, request: &JobRequest) -> Result<(), AppError>;

    /// Persists a completed stage: PROCESSING status, stage name, and the
    /// stage's progress value.
    async fn set_stage(&self, job_id: Uuid, stage: JobStage) -> Result<(), AppError>;

    /// Terminal failure: FAILED status and stage, progress 0, message.
    async fn mark_failed(&self, job_id: Uuid, error: &str) -> Result<(), AppError>;

    /// Terminal success: COMPLETED/100, result document, completion time.
    async fn complete(&self, job_id: Uuid, resume: &Value) -> Result<(), AppError>;

    async fn insert_audits(&self, job_id: Uuid, audits: &[AuditInsert]) -> Result<(), AppError>;

    async fn load_profile(&self, user_id: Uuid) -> Result<UserProfile, AppError>;
}

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create_job(&self, request: &JobRequest) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO resume_jobs (id, user_id, jd_text, strategy, status, progress)
            VALUES ($1, $2, $3, $4, $5, 0)
            "#,
        )
        .bind(request.job_id)
        .bind(request.user_id)
        .bind(&request.job_description)
        .bind(request.strategy.as_str())
        .bind(JobStatus::Queued.as_str())
        .execute(&self.pool)
        .await?;

        info!("Created job {} for user {}", request.job_id, request.user_id);
        Ok(())
    }

    async fn set_stage(&self, job_id: Uuid, stage: JobStage) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE resume_jobs
            SET status = $2, stage = $3, progress = $4, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(JobStatus::Processing.as_str())
        .bind(stage.as_str())
        .bind(stage.progress())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_failed(&self, job_id: Uuid, error: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE resume_jobs
            SET status = $2, stage = $2, progress = 0, error_message = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(JobStatus::Failed.as_str())
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn complete(&self, job_id: Uuid, resume: &Value) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE resume_jobs
            SET status = $2, stage = $2, progress = 100, result_resume = $3,
                completed_at = now(), updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(JobStatus::Completed.as_str())
        .bind(resume)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_audits(&self, job_id: Uuid, audits: &[AuditInsert]) -> Result<(), AppError> {
        for audit in audits {
            sqlx::query(
                r#"
                INSERT INTO bullet_audit
                    (resume_job_id, bullet_id, original_text, rewritten_text, evidence, verifier_note)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(job_id)
            .bind(audit.bullet_id)
            .bind(&audit.original_text)
            .bind(&audit.rewritten_text)
            .bind(&audit.evidence)
            .bind(&audit.verifier_note)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    async fn load_profile(&self, user_id: Uuid) -> Result<UserProfile, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

        let experiences = sqlx::query_as::<_, ExperienceRow>(
            "SELECT * FROM experiences WHERE user_id = $1 ORDER BY start_date DESC NULLS LAST",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let projects = sqlx::query_as::<_, ProjectRow>(
            "SELECT * FROM projects WHERE user_id = $1 ORDER BY start_date DESC NULLS LAST",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let education = sqlx::query_as::<_, EducationRow>(
            "SELECT * FROM education WHERE user_id = $1 ORDER BY end_date DESC NULLS LAST",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let skill_categories = sqlx::query_as::<_, SkillCategoryRow>(
            "SELECT * FROM skill_categories WHERE user_id = $1 ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(UserProfile {
            user,
            experiences,
            projects,
            education,
            skill_categories,
        })
    }
}
