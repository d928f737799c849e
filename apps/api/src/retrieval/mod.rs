//! Retrieval collaborator: turns search terms into scored bullet candidates.
//!
//! The pipeline only consumes the `Retriever` trait; the default backend is
//! Postgres full-text search over the user's stored bullets, ranked by
//! `ts_rank`. Swapping in a dedicated search index means implementing the
//! trait, nothing more.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::bullet::{BulletCandidate, ParentType};

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns up to `size` candidates for the user, ranked by relevance to
    /// `terms`. An empty term list returns an empty hit list.
    async fn search(
        &self,
        user_id: Uuid,
        terms: &[String],
        size: usize,
    ) -> Result<Vec<BulletCandidate>, AppError>;
}

/// Postgres full-text retriever over the `bullets` table. Rows carry parent
/// dates denormalized and `parent_type` as text ('experience' | 'project').
pub struct PgRetriever {
    pool: PgPool,
}

impl PgRetriever {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BulletHitRow {
    bullet_id: Uuid,
    content: String,
    score: f64,
    parent_id: Uuid,
    parent_type: String,
    start_date: Option<String>,
    end_date: Option<String>,
    tags: Vec<String>,
    skills: Vec<String>,
}

#[async_trait]
impl Retriever for PgRetriever {
    async fn search(
        &self,
        user_id: Uuid,
        terms: &[String],
        size: usize,
    ) -> Result<Vec<BulletCandidate>, AppError> {
        let query = build_ts_query(terms);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, BulletHitRow>(
            r#"
            SELECT b.id AS bullet_id,
                   b.content,
                   ts_rank(to_tsvector('english', b.content),
                           to_tsquery('english', $2))::float8 AS score,
                   b.parent_id,
                   b.parent_type,
                   b.start_date,
                   b.end_date,
                   b.tags,
                   b.skills
            FROM bullets b
            WHERE b.user_id = $1
              AND to_tsvector('english', b.content) @@ to_tsquery('english', $2)
            ORDER BY score DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(&query)
        .bind(size as i64)
        .fetch_all(&self.pool)
        .await?;

        debug!("Retrieved {} bullet hits for user {user_id}", rows.len());

        rows.into_iter().map(row_to_candidate).collect()
    }
}

fn row_to_candidate(row: BulletHitRow) -> Result<BulletCandidate, AppError> {
    let parent_type = match row.parent_type.as_str() {
        "experience" => ParentType::Experience,
        "project" => ParentType::Project,
        other => {
            return Err(AppError::Retrieval(format!(
                "Unknown parent_type '{other}' for bullet {}",
                row.bullet_id
            )))
        }
    };
    Ok(BulletCandidate {
        bullet_id: row.bullet_id,
        content: row.content,
        score: row.score,
        parent_id: row.parent_id,
        parent_type,
        start_date: row.start_date,
        end_date: row.end_date,
        tags: row.tags,
        skills: row.skills,
    })
}

/// Builds an OR'd tsquery from free-form terms. Terms are sanitized down to
/// alphanumeric words; multi-word terms become AND groups.
fn build_ts_query(terms: &[String]) -> String {
    terms
        .iter()
        .filter_map(|term| {
            let words: Vec<String> = term
                .split(|c: char| !c.is_ascii_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(|w| w.to_lowercase())
                .collect();
            match words.len() {
                0 => None,
                1 => Some(words[0].clone()),
                _ => Some(format!("({})", words.join(" & "))),
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ts_query_single_terms_ored() {
        let terms = vec!["rust".to_string(), "kafka".to_string()];
        assert_eq!(build_ts_query(&terms), "rust | kafka");
    }

    #[test]
    fn test_ts_query_multi_word_term_becomes_and_group() {
        let terms = vec!["distributed systems".to_string()];
        assert_eq!(build_ts_query(&terms), "(distributed & systems)");
    }

    #[test]
    fn test_ts_query_strips_operator_characters() {
        let terms = vec!["c++".to_string(), "node.js".to_string()];
        assert_eq!(build_ts_query(&terms), "c | (node & js)");
    }

    #[test]
    fn test_ts_query_empty_terms() {
        assert_eq!(build_ts_query(&[]), "");
        assert_eq!(build_ts_query(&["!!!".to_string()]), "");
    }

    #[test]
    fn test_row_to_candidate_rejects_unknown_parent_type() {
        let row = BulletHitRow {
            bullet_id: Uuid::new_v4(),
            content: "x".to_string(),
            score: 1.0,
            parent_id: Uuid::new_v4(),
            parent_type: "certification".to_string(),
            start_date: None,
            end_date: None,
            tags: vec![],
            skills: vec![],
        };
        assert!(row_to_candidate(row).is_err());
    }
}
