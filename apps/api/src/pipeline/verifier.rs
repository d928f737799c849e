//! Rewrite verification: a state-free diff heuristic that compares an
//! AI-rewritten bullet against its source and reverts anything it cannot
//! account for: new numbers, new technologies, scope-inflating verbs.
//!
//! On any flag the unmodified source text wins over the rewrite.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::bullet::{BulletCandidate, VerifiedBullet};

/// Technology terms the verifier treats as claims needing evidence. A term
/// appearing in the rewrite but in none of the original text, tags, or
/// skills flags the rewrite.
const WATCHED_TECH_TERMS: &[&str] = &[
    "kubernetes",
    "docker",
    "terraform",
    "kafka",
    "rabbitmq",
    "redis",
    "postgresql",
    "postgres",
    "mysql",
    "mongodb",
    "elasticsearch",
    "graphql",
    "grpc",
    "react",
    "angular",
    "vue",
    "node.js",
    "typescript",
    "javascript",
    "python",
    "rust",
    "java",
    "golang",
    "aws",
    "gcp",
    "azure",
    "spark",
    "airflow",
    "snowflake",
    "jenkins",
    "ansible",
];

/// Verbs that assert ownership or leadership. Present in the rewrite but not
/// the original means the rewrite inflated the author's scope.
const SCOPE_VERBS: &[&str] = &[
    "led",
    "spearheaded",
    "architected",
    "owned",
    "directed",
    "headed",
    "drove",
    "founded",
    "pioneered",
    "championed",
    "oversaw",
    "managed",
];

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static digit pattern"));

/// Checks a rewritten bullet against its source candidate.
///
/// If any flag fires the returned text is the original content and
/// `verifier_note` joins the reasons; otherwise the rewrite is accepted
/// verbatim with a null note.
pub fn verify_rewrite(bullet: &BulletCandidate, rewritten: &str) -> VerifiedBullet {
    let mut reasons: Vec<String> = Vec::new();

    let new_numbers = new_digit_runs(&bullet.content, rewritten);
    if !new_numbers.is_empty() {
        reasons.push(format!("unverified numbers: {}", new_numbers.join(", ")));
    }

    let new_tech = new_technologies(bullet, rewritten);
    if !new_tech.is_empty() {
        reasons.push(format!("unverified technologies: {}", new_tech.join(", ")));
    }

    let inflation = scope_inflation(&bullet.content, rewritten);
    if !inflation.is_empty() {
        reasons.push(format!("scope inflation: {}", inflation.join(", ")));
    }

    if reasons.is_empty() {
        VerifiedBullet {
            bullet_id: bullet.bullet_id,
            text: rewritten.to_string(),
            verifier_note: None,
        }
    } else {
        VerifiedBullet {
            bullet_id: bullet.bullet_id,
            text: bullet.content.clone(),
            verifier_note: Some(reasons.join("; ")),
        }
    }
}

/// Digit runs present in the rewrite but not the original, in rewrite order.
fn new_digit_runs(original: &str, rewritten: &str) -> Vec<String> {
    let original_runs: HashSet<&str> =
        DIGIT_RUN.find_iter(original).map(|m| m.as_str()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    DIGIT_RUN
        .find_iter(rewritten)
        .map(|m| m.as_str().to_string())
        .filter(|run| !original_runs.contains(run.as_str()) && seen.insert(run.clone()))
        .collect()
}

/// Watched technology terms present in the rewrite but absent from the
/// original text and the bullet's own declared tags/skills.
fn new_technologies(bullet: &BulletCandidate, rewritten: &str) -> Vec<String> {
    let rewritten_lower = rewritten.to_lowercase();
    let original_lower = bullet.content.to_lowercase();
    let declared: HashSet<String> = bullet
        .tags
        .iter()
        .chain(bullet.skills.iter())
        .map(|t| t.to_lowercase())
        .collect();

    WATCHED_TECH_TERMS
        .iter()
        .filter(|term| {
            contains_term(&rewritten_lower, term)
                && !contains_term(&original_lower, term)
                && !declared.contains(**term)
        })
        .map(|term| (*term).to_string())
        .collect()
}

/// Scope verbs present in the rewrite but not the original.
fn scope_inflation(original: &str, rewritten: &str) -> Vec<String> {
    let rewritten_lower = rewritten.to_lowercase();
    let original_lower = original.to_lowercase();
    SCOPE_VERBS
        .iter()
        .filter(|verb| contains_term(&rewritten_lower, verb) && !contains_term(&original_lower, verb))
        .map(|verb| (*verb).to_string())
        .collect()
}

/// Whole-word containment on lowercased text. Terms with non-alphanumeric
/// characters ("node.js") fall back to plain substring matching.
fn contains_term(haystack_lower: &str, term: &str) -> bool {
    if !term.chars().all(|c| c.is_ascii_alphanumeric()) {
        return haystack_lower.contains(term);
    }
    haystack_lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| token == term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bullet::ParentType;
    use uuid::Uuid;

    fn make_bullet(content: &str, tags: Vec<&str>, skills: Vec<&str>) -> BulletCandidate {
        BulletCandidate {
            bullet_id: Uuid::new_v4(),
            content: content.to_string(),
            score: 1.0,
            parent_id: Uuid::new_v4(),
            parent_type: ParentType::Experience,
            start_date: None,
            end_date: None,
            tags: tags.into_iter().map(str::to_string).collect(),
            skills: skills.into_iter().map(str::to_string).collect(),
        }
    }

    #[test]
    fn test_clean_rewrite_accepted_verbatim() {
        let bullet = make_bullet("Improved API latency by 40% using caching", vec![], vec![]);
        let verified = verify_rewrite(&bullet, "Cut API latency 40% through caching");
        assert_eq!(verified.text, "Cut API latency 40% through caching");
        assert!(verified.verifier_note.is_none());
    }

    #[test]
    fn test_new_number_reverts_with_numbers_note() {
        let bullet = make_bullet("Improved API latency using caching", vec![], vec![]);
        let verified = verify_rewrite(&bullet, "Improved API latency by 40% using caching");
        assert_eq!(verified.text, bullet.content);
        let note = verified.verifier_note.expect("note must be set");
        assert!(note.contains("numbers"), "note was: {note}");
        assert!(note.contains("40"));
    }

    #[test]
    fn test_number_present_in_original_is_fine() {
        let bullet = make_bullet("Served 500 requests per second", vec![], vec![]);
        let verified = verify_rewrite(&bullet, "Sustained 500 requests per second in production");
        assert!(verified.verifier_note.is_none());
    }

    #[test]
    fn test_new_technology_reverts() {
        let bullet = make_bullet("Built a task scheduler for batch work", vec![], vec![]);
        let verified = verify_rewrite(&bullet, "Built a task scheduler on Kubernetes");
        assert_eq!(verified.text, bullet.content);
        assert!(verified
            .verifier_note
            .unwrap()
            .contains("unverified technologies: kubernetes"));
    }

    #[test]
    fn test_technology_declared_in_tags_is_allowed() {
        let bullet = make_bullet(
            "Built a task scheduler for batch work",
            vec!["kubernetes"],
            vec![],
        );
        let verified = verify_rewrite(&bullet, "Built a task scheduler on Kubernetes");
        assert!(verified.verifier_note.is_none());
    }

    #[test]
    fn test_technology_declared_in_skills_is_allowed() {
        let bullet = make_bullet("Shipped the ingest service", vec![], vec!["Kafka"]);
        let verified = verify_rewrite(&bullet, "Shipped the Kafka ingest service");
        assert!(verified.verifier_note.is_none());
    }

    #[test]
    fn test_scope_verb_reverts() {
        let bullet = make_bullet("Worked on the migration to the new billing system", vec![], vec![]);
        let verified = verify_rewrite(&bullet, "Led the migration to the new billing system");
        assert_eq!(verified.text, bullet.content);
        assert!(verified.verifier_note.unwrap().contains("scope inflation: led"));
    }

    #[test]
    fn test_scope_verb_in_original_is_kept() {
        let bullet = make_bullet("Led weekly syncs for the infra group", vec![], vec![]);
        let verified = verify_rewrite(&bullet, "Led weekly syncs across three infra groups");
        // "three" is not a digit run, and "led" appears in the original.
        assert!(verified.verifier_note.is_none());
    }

    #[test]
    fn test_multiple_flags_joined_in_note() {
        let bullet = make_bullet("Worked on data pipelines", vec![], vec![]);
        let verified =
            verify_rewrite(&bullet, "Led 12 data pipelines on Airflow serving analytics");
        let note = verified.verifier_note.expect("note must be set");
        assert!(note.contains("numbers"));
        assert!(note.contains("airflow"));
        assert!(note.contains("scope inflation"));
        assert!(note.contains("; "), "reasons are joined: {note}");
    }

    #[test]
    fn test_word_boundary_matching_avoids_substring_hits() {
        // "managed" must not fire on "unmanaged" in the rewrite.
        let bullet = make_bullet("Maintained the fleet tooling", vec![], vec![]);
        let verified = verify_rewrite(&bullet, "Maintained tooling for unmanaged hosts");
        assert!(verified.verifier_note.is_none());
    }
}
