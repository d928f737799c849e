use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobRequest, ResumeJobRow};
use crate::state::AppState;

#[derive(Serialize)]
pub struct JobAcceptedResponse {
    pub job_id: Uuid,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub progress: i32,
    pub strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<ResumeJobRow> for JobStatusResponse {
    fn from(row: ResumeJobRow) -> Self {
        Self {
            job_id: row.id,
            status: row.status,
            stage: row.stage,
            progress: row.progress,
            strategy: row.strategy,
            error_message: row.error_message,
        }
    }
}

/// POST /api/v1/jobs
pub async fn handle_submit_job(
    State(state): State<AppState>,
    Json(req): Json<JobRequest>,
) -> Result<(StatusCode, Json<JobAcceptedResponse>), AppError> {
    if req.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description must not be empty".to_string(),
        ));
    }

    let job_id = req.job_id;
    state.queue.enqueue(req).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAcceptedResponse {
            job_id,
            status: "queued",
        }),
    ))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let row: Option<ResumeJobRow> = sqlx::query_as("SELECT * FROM resume_jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;

    let row = row.ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    Ok(Json(row.into()))
}

/// GET /api/v1/jobs/:id/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let row: Option<ResumeJobRow> = sqlx::query_as("SELECT * FROM resume_jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;

    let row = row.ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    let resume = row.result_resume.ok_or_else(|| {
        AppError::NotFound(format!("Job {id} has no finished resume (status {})", row.status))
    })?;
    Ok(Json(resume))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_row(status: &str, stage: Option<&str>, progress: i32) -> ResumeJobRow {
        ResumeJobRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            jd_text: "Senior Rust engineer".to_string(),
            strategy: "openai".to_string(),
            status: status.to_string(),
            stage: stage.map(str::to_string),
            progress,
            error_message: None,
            result_resume: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_queued_job_status_response_has_no_stage() {
        let row = make_row("QUEUED", None, 0);
        let value = serde_json::to_value(JobStatusResponse::from(row)).unwrap();
        assert!(value.get("stage").is_none());
        assert_eq!(value["status"], "QUEUED");
        assert_eq!(value["progress"], 0);
    }

    #[test]
    fn test_processing_job_status_response_carries_stage() {
        let row = make_row("PROCESSING", Some("SELECTING_BULLETS"), 45);
        let value = serde_json::to_value(JobStatusResponse::from(row)).unwrap();
        assert_eq!(value["stage"], "SELECTING_BULLETS");
    }
}
