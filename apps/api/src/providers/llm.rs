//! LLM-backed content provider. Both capabilities go through the shared
//! Anthropic client with JSON-only prompts.

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::bullet::{BulletCandidate, RewriteOutcome};
use crate::pipeline::keywords::ExtractedTerms;
use crate::providers::prompts::{
    JD_PARSE_PROMPT_TEMPLATE, JD_PARSE_SYSTEM, REWRITE_PROMPT_TEMPLATE, REWRITE_SYSTEM,
};
use crate::providers::ContentProvider;

pub struct LlmProvider {
    llm: LlmClient,
}

impl LlmProvider {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ContentProvider for LlmProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn parse_job_description(&self, jd_text: &str) -> Result<ExtractedTerms, AppError> {
        let prompt = JD_PARSE_PROMPT_TEMPLATE.replace("{jd_text}", jd_text);
        self.llm
            .call_json::<ExtractedTerms>(&prompt, JD_PARSE_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("JD parsing failed: {e}")))
    }

    async fn rewrite_bullet(
        &self,
        bullet: &BulletCandidate,
        terms: &ExtractedTerms,
    ) -> Result<RewriteOutcome, AppError> {
        let bullet_json = serde_json::to_string_pretty(&json!({
            "bullet_id": bullet.bullet_id,
            "content": bullet.content,
            "tags": bullet.tags,
            "skills": bullet.skills,
        }))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize bullet: {e}")))?;

        let terms_json = serde_json::to_string(&terms.search_terms())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize terms: {e}")))?;

        let prompt = REWRITE_PROMPT_TEMPLATE
            .replace("{bullet_json}", &bullet_json)
            .replace("{terms_json}", &terms_json);

        let outcome = self
            .llm
            .call_json::<RewriteOutcome>(&prompt, REWRITE_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Bullet rewrite failed: {e}")))?;

        validate_outcome(bullet.bullet_id, outcome)
    }
}

/// A rewrite echoing the wrong bullet id or empty text is a malformed
/// response; the caller treats it as a per-bullet failure and degrades to
/// the original content.
fn validate_outcome(
    expected_id: Uuid,
    outcome: RewriteOutcome,
) -> Result<RewriteOutcome, AppError> {
    if outcome.bullet_id != expected_id {
        return Err(AppError::Llm(format!(
            "Rewrite echoed bullet {} but {} was requested",
            outcome.bullet_id, expected_id
        )));
    }
    if outcome.rewritten_text.trim().is_empty() {
        return Err(AppError::Llm("Rewrite returned empty text".to_string()));
    }
    Ok(outcome)
}
