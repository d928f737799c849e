//! Bullet selection: caps per-parent counts, drops near-duplicate phrasing,
//! and orders the survivors for the resume.
//!
//! Pure functions, no I/O. The per-parent cap stops one job or project from
//! dominating the page; Jaccard dedup removes minor rewordings without
//! needing embeddings; the date-then-score sort favors recency.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::bullet::{BulletCandidate, SelectionConstraints};

/// Stable partition of candidates by parent. Input order is preserved
/// within each group.
pub fn group_by_parent(bullets: &[BulletCandidate]) -> HashMap<Uuid, Vec<BulletCandidate>> {
    let mut groups: HashMap<Uuid, Vec<BulletCandidate>> = HashMap::new();
    for bullet in bullets {
        groups.entry(bullet.parent_id).or_default().push(bullet.clone());
    }
    groups
}

/// Selects bullets under the given constraints.
///
/// 1. Group by parent; within each group keep the top
///    `max_bullets_per_parent` by score.
/// 2. Flatten (parents in first-seen order), then greedily drop bullets too
///    similar to an already-kept one.
/// 3. Sort by start date descending (missing dates last), score descending.
/// 4. Truncate to `target_count.max`.
///
/// `target_count.min` is accepted but not enforced: a shorter result is
/// returned as-is, never an error.
pub fn select(
    candidates: &[BulletCandidate],
    constraints: &SelectionConstraints,
) -> Vec<BulletCandidate> {
    if candidates.is_empty() {
        return Vec::new();
    }

    // Per-parent cap, parents visited in first-seen order so the greedy
    // dedup pass below has a deterministic survivor preference.
    let mut parent_order: Vec<Uuid> = Vec::new();
    let mut groups: HashMap<Uuid, Vec<BulletCandidate>> = HashMap::new();
    for bullet in candidates {
        let group = groups.entry(bullet.parent_id).or_insert_with(|| {
            parent_order.push(bullet.parent_id);
            Vec::new()
        });
        group.push(bullet.clone());
    }

    let mut flattened: Vec<BulletCandidate> = Vec::new();
    for parent_id in &parent_order {
        let mut group = groups.remove(parent_id).unwrap_or_default();
        group.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        group.truncate(constraints.max_bullets_per_parent);
        flattened.extend(group);
    }

    let mut kept = deduplicate_by_similarity(flattened, constraints.similarity_threshold);

    // Recency first; score breaks ties. Missing dates sort as "" and land last.
    kept.sort_by(|a, b| {
        let a_date = a.start_date.as_deref().unwrap_or("");
        let b_date = b.start_date.as_deref().unwrap_or("");
        b_date
            .cmp(a_date)
            .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal))
    });

    kept.truncate(constraints.target_count.max);
    kept
}

/// Greedy single-pass dedup: a bullet survives only if its token overlap with
/// every already-kept bullet stays at or below `threshold`. O(n²) and
/// order-sensitive: earlier bullets are the preferred survivors.
pub fn deduplicate_by_similarity(
    bullets: Vec<BulletCandidate>,
    threshold: f64,
) -> Vec<BulletCandidate> {
    let mut kept: Vec<BulletCandidate> = Vec::with_capacity(bullets.len());
    for bullet in bullets {
        let near_duplicate = kept
            .iter()
            .any(|survivor| token_overlap(&survivor.content, &bullet.content) > threshold);
        if !near_duplicate {
            kept.push(bullet);
        }
    }
    kept
}

/// Jaccard similarity of the two texts' token sets. Tokenization matches the
/// keyword extractor: lowercase, non-alphanumerics to whitespace, split.
/// Returns 0.0 when the union is empty. Symmetric.
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let set_a = token_set(a);
    let set_b = token_set(b);
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    intersection as f64 / union as f64
}

fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
