// All LLM prompt constants for the content provider calls.

/// System prompt for JD term extraction; enforces JSON-only output.
pub const JD_PARSE_SYSTEM: &str =
    "You are an expert job description analyst. \
    Extract the search-relevant terms from a job description. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// JD term-extraction prompt template. Replace `{jd_text}` before sending.
pub const JD_PARSE_PROMPT_TEMPLATE: &str = r#"Extract search terms from the following job description.

Return a JSON object with this EXACT schema (no extra fields):
{
  "keywords": ["distributed", "latency", "payments"],
  "skills": ["Rust", "PostgreSQL"],
  "tech_stack": ["kubernetes", "kafka"]
}

Rules:
- "keywords": the most important terms by emphasis and repetition, most important first, at most 20
- "skills": named skills and languages, with conventional casing
- "tech_stack": concrete technologies, lowercase canonical names ("kubernetes" not "k8s")
- Do NOT invent terms that are not in the text

JOB DESCRIPTION:
{jd_text}"#;

/// System prompt for the bullet rewrite; enforces grounding and JSON-only output.
pub const REWRITE_SYSTEM: &str =
    "You are an expert resume writer tailoring one accomplishment bullet to a target role. \
    You MUST respond with valid JSON only. \
    Do NOT use markdown code fences. \
    Use ONLY facts present in the source bullet. \
    Do NOT add numbers, technologies, or ownership claims that the source does not state.";

/// Bullet rewrite prompt template.
/// Replace: {bullet_json}, {terms_json}
pub const REWRITE_PROMPT_TEMPLATE: &str = r#"Rewrite this resume bullet so it speaks to the target role, without adding any claim the source does not support.

SOURCE BULLET (the only source of truth):
{bullet_json}

TARGET ROLE TERMS to incorporate where the source already supports them:
{terms_json}

Return a JSON object with this EXACT schema:
{
  "bullet_id": "the exact bullet_id from the source",
  "rewritten_text": "the rewritten bullet",
  "evidence_bullet_ids": ["the bullet_id again"],
  "risk_flags": []
}

Rules:
1. `bullet_id` and `evidence_bullet_ids` must echo the source bullet_id exactly
2. Keep every number identical to the source; never introduce a new one
3. Mention a technology only if the source text, tags, or skills mention it
4. Do not upgrade the author's role: no "led" or "owned" unless the source says so
5. If you weaken any of rules 2-4, add a short lowercase reason to `risk_flags`"#;
