use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// The kind of profile item a bullet hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentType {
    Experience,
    Project,
}

impl ParentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParentType::Experience => "experience",
            ParentType::Project => "project",
        }
    }
}

/// A work-history bullet retrieved as relevant to a job description.
///
/// `score` is the retrieval-time relevance and is never mutated afterwards.
/// Identity is `bullet_id`; two candidates with the same id are the same bullet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletCandidate {
    pub bullet_id: Uuid,
    pub content: String,
    pub score: f64,
    pub parent_id: Uuid,
    pub parent_type: ParentType,
    /// ISO date string (`YYYY-MM-DD`); lexicographic order is chronological.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Inclusive target range for the final bullet count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TargetCount {
    pub min: usize,
    pub max: usize,
}

/// Constraints applied by the bullet selector.
///
/// Build through [`SelectionConstraints::new`]; selection itself never
/// revalidates, so a malformed set of constraints is a caller bug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConstraints {
    pub max_bullets_per_parent: usize,
    /// Jaccard token-overlap above this drops the later bullet. In [0, 1].
    pub similarity_threshold: f64,
    pub target_count: TargetCount,
}

impl SelectionConstraints {
    pub fn new(
        max_bullets_per_parent: usize,
        similarity_threshold: f64,
        target_count: TargetCount,
    ) -> Result<Self, String> {
        if max_bullets_per_parent < 1 {
            return Err("max_bullets_per_parent must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(format!(
                "similarity_threshold must be in [0, 1], got {similarity_threshold}"
            ));
        }
        if target_count.min > target_count.max {
            return Err(format!(
                "target_count.min ({}) exceeds target_count.max ({})",
                target_count.min, target_count.max
            ));
        }
        Ok(Self {
            max_bullets_per_parent,
            similarity_threshold,
            target_count,
        })
    }
}

impl Default for SelectionConstraints {
    fn default() -> Self {
        Self {
            max_bullets_per_parent: 4,
            similarity_threshold: 0.7,
            target_count: TargetCount { min: 12, max: 25 },
        }
    }
}

/// Output of a rewrite call for one bullet. A failed rewrite degrades to the
/// original content with a `rewrite_failed` risk flag instead of failing the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteOutcome {
    pub bullet_id: Uuid,
    pub rewritten_text: String,
    #[serde(default)]
    pub evidence_bullet_ids: Vec<Uuid>,
    #[serde(default)]
    pub risk_flags: Vec<String>,
}

impl RewriteOutcome {
    /// Fallback outcome when the rewrite collaborator fails for this bullet.
    pub fn fallback(bullet: &BulletCandidate) -> Self {
        Self {
            bullet_id: bullet.bullet_id,
            rewritten_text: bullet.content.clone(),
            evidence_bullet_ids: vec![bullet.bullet_id],
            risk_flags: vec!["rewrite_failed".to_string()],
        }
    }
}

/// Final text of a bullet after verification. A non-null `verifier_note`
/// means the rewrite was reverted to the original content, and says why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedBullet {
    pub bullet_id: Uuid,
    pub text: String,
    pub verifier_note: Option<String>,
}

/// One audit row per selected bullet per job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BulletAuditRow {
    pub id: Uuid,
    pub resume_job_id: Uuid,
    pub bullet_id: Uuid,
    pub original_text: String,
    pub rewritten_text: String,
    pub evidence: Value,
    pub verifier_note: Option<String>,
    pub created_at: DateTime<Utc>,
}
