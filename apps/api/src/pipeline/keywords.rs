//! Keyword extraction: turns raw job-description text into ranked keywords,
//! dictionary-matched skills, and canonicalized technology names.
//!
//! Pure functions, no I/O. This is the whole of the `bm25` strategy's JD
//! parsing and the search-term source for retrieval in both strategies.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default cap on ranked keywords returned by [`extract_keywords`].
pub const DEFAULT_MAX_KEYWORDS: usize = 20;

/// Aggregate output of the three extraction passes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedTerms {
    pub keywords: Vec<String>,
    pub skills: Vec<String>,
    pub tech_stack: Vec<String>,
}

impl ExtractedTerms {
    /// Merges skills, tech stack, and keywords into one search-term list,
    /// de-duplicated case-insensitively. Skills and tech come first, ahead
    /// of raw frequency keywords.
    pub fn search_terms(&self) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut terms = Vec::new();
        for term in self
            .skills
            .iter()
            .chain(self.tech_stack.iter())
            .chain(self.keywords.iter())
        {
            if seen.insert(term.to_lowercase()) {
                terms.push(term.clone());
            }
        }
        terms
    }
}

/// Tokens never worth ranking, no matter how frequent.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "with", "you", "our", "are", "will", "have", "this", "that", "your",
        "from", "about", "who", "what", "can", "all", "has", "was", "were", "been", "being", "its",
        "they", "their", "them", "but", "not", "into", "out", "more", "than", "also", "such",
        "should", "must", "may", "would", "could", "work", "working", "team", "role", "years",
        "experience", "ability", "strong", "skills", "including", "required", "preferred", "plus",
        "etc", "per", "each", "any", "other", "well", "both", "across", "within", "using", "use",
        "new", "like", "able", "while", "where", "when", "how", "why", "his", "her", "him", "she",
        "looking", "join", "help", "make", "build", "building",
    ]
    .into_iter()
    .collect()
});

/// Fixed skill dictionary. Matching is case-insensitive substring; output
/// preserves this casing.
const SKILL_DICTIONARY: &[&str] = &[
    "Rust",
    "Python",
    "TypeScript",
    "JavaScript",
    "Java",
    "C++",
    "C#",
    "Ruby",
    "Scala",
    "Kotlin",
    "Swift",
    "SQL",
    "HTML",
    "CSS",
    "React",
    "Angular",
    "Vue",
    "Node.js",
    "Django",
    "Flask",
    "Spring Boot",
    "Rails",
    "GraphQL",
    "REST",
    "gRPC",
    "Kafka",
    "RabbitMQ",
    "PostgreSQL",
    "MySQL",
    "MongoDB",
    "Redis",
    "Elasticsearch",
    "Docker",
    "Kubernetes",
    "Terraform",
    "Ansible",
    "Jenkins",
    "AWS",
    "GCP",
    "Azure",
    "Linux",
    "Git",
    "CI/CD",
    "Machine Learning",
    "Deep Learning",
    "Data Engineering",
    "Distributed Systems",
    "Microservices",
    "Agile",
    "Scrum",
    "TDD",
    "System Design",
];

/// Ordered technology patterns. Each maps common aliases to one canonical
/// lowercase name ("k8s" and "kubernetes" both yield "kubernetes").
static TECH_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    let table: &[(&str, &str)] = &[
        ("react", r"(?i)\breact(\.js|js)?\b"),
        ("angular", r"(?i)\bangular(js)?\b"),
        ("vue", r"(?i)\bvue(\.js|js)?\b"),
        ("next.js", r"(?i)\bnext\.?js\b"),
        ("node.js", r"(?i)\bnode(\.js|js)?\b"),
        ("typescript", r"(?i)\btypescript\b"),
        ("javascript", r"(?i)\b(javascript|js)\b"),
        ("python", r"(?i)\bpython\b"),
        ("rust", r"(?i)\brust\b"),
        ("go", r"(?i)\b(golang|go)\b"),
        ("java", r"(?i)\bjava\b"),
        ("django", r"(?i)\bdjango\b"),
        ("flask", r"(?i)\bflask\b"),
        ("rails", r"(?i)\b(ruby on rails|rails)\b"),
        ("spring", r"(?i)\bspring( boot)?\b"),
        ("kubernetes", r"(?i)\b(kubernetes|k8s)\b"),
        ("docker", r"(?i)\bdocker\b"),
        ("terraform", r"(?i)\bterraform\b"),
        ("ansible", r"(?i)\bansible\b"),
        ("jenkins", r"(?i)\bjenkins\b"),
        ("aws", r"(?i)\b(aws|amazon web services)\b"),
        ("gcp", r"(?i)\b(gcp|google cloud)\b"),
        ("azure", r"(?i)\bazure\b"),
        ("postgresql", r"(?i)\b(postgresql|postgres)\b"),
        ("mysql", r"(?i)\bmysql\b"),
        ("mongodb", r"(?i)\b(mongodb|mongo)\b"),
        ("redis", r"(?i)\bredis\b"),
        ("elasticsearch", r"(?i)\belastic\s?search\b"),
        ("kafka", r"(?i)\bkafka\b"),
        ("rabbitmq", r"(?i)\brabbitmq\b"),
        ("graphql", r"(?i)\bgraphql\b"),
        ("grpc", r"(?i)\bgrpc\b"),
        ("spark", r"(?i)\bspark\b"),
        ("airflow", r"(?i)\bairflow\b"),
        ("snowflake", r"(?i)\bsnowflake\b"),
    ];
    table
        .iter()
        .map(|(name, pattern)| (*name, Regex::new(pattern).expect("static tech pattern")))
        .collect()
});

/// Returns the top `max_keywords` tokens by descending frequency, ties broken
/// by first appearance. Tokens of length ≤ 2 and stop words are discarded.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    // token -> (count, first-seen index)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut next_index = 0usize;

    for token in tokenize(text) {
        if token.len() <= 2 || STOP_WORDS.contains(token.as_str()) {
            continue;
        }
        let entry = counts.entry(token).or_insert_with(|| {
            let idx = next_index;
            next_index += 1;
            (0, idx)
        });
        entry.0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .take(max_keywords)
        .map(|(token, _)| token)
        .collect()
}

/// Case-insensitive substring match against the skill dictionary.
/// Output preserves dictionary casing and dictionary order.
pub fn extract_skills(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let haystack = text.to_lowercase();
    SKILL_DICTIONARY
        .iter()
        .filter(|skill| haystack.contains(&skill.to_lowercase()))
        .map(|skill| skill.to_string())
        .collect()
}

/// Applies the ordered technology patterns and returns canonical lowercase
/// names, de-duplicated in pattern order.
pub fn extract_tech_stack(text: &str) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack = Vec::new();
    for (name, pattern) in TECH_PATTERNS.iter() {
        if pattern.is_match(text) && seen.insert(name) {
            stack.push((*name).to_string());
        }
    }
    stack
}

/// Convenience aggregate of the three extraction passes.
pub fn extract(text: &str) -> ExtractedTerms {
    ExtractedTerms {
        keywords: extract_keywords(text, DEFAULT_MAX_KEYWORDS),
        skills: extract_skills(text),
        tech_stack: extract_tech_stack(text),
    }
}

/// Lowercases, maps non-alphanumerics to whitespace, and splits.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>()
        .into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_yields_no_keywords() {
        assert!(extract_keywords("", DEFAULT_MAX_KEYWORDS).is_empty());
    }

    #[test]
    fn test_stop_words_and_short_tokens_excluded() {
        let keywords = extract_keywords("the and for ab x rust rust", 20);
        assert_eq!(keywords, vec!["rust"]);
    }

    #[test]
    fn test_keywords_ranked_by_frequency() {
        let keywords = extract_keywords("kafka kafka kafka postgres postgres rust", 20);
        assert_eq!(keywords, vec!["kafka", "postgres", "rust"]);
    }

    #[test]
    fn test_keyword_ties_broken_by_first_seen() {
        let keywords = extract_keywords("zookeeper kafka zookeeper kafka", 20);
        assert_eq!(keywords, vec!["zookeeper", "kafka"]);
    }

    #[test]
    fn test_max_keywords_cap_respected() {
        let text = "alpha beta gamma delta epsilon zeta";
        let keywords = extract_keywords(text, 3);
        assert_eq!(keywords.len(), 3);
    }

    #[test]
    fn test_punctuation_split_to_whitespace() {
        let keywords = extract_keywords("rust/tokio,sqlx;rust", 20);
        assert_eq!(keywords, vec!["rust", "tokio", "sqlx"]);
    }

    #[test]
    fn test_skills_preserve_dictionary_casing() {
        let skills = extract_skills("we need postgresql and typescript experience");
        assert!(skills.contains(&"PostgreSQL".to_string()));
        assert!(skills.contains(&"TypeScript".to_string()));
    }

    #[test]
    fn test_skills_empty_text() {
        assert!(extract_skills("").is_empty());
    }

    #[test]
    fn test_tech_stack_canonicalizes_k8s() {
        let stack = extract_tech_stack("Deployed services on k8s with Docker");
        assert!(stack.contains(&"kubernetes".to_string()));
        assert!(stack.contains(&"docker".to_string()));
    }

    #[test]
    fn test_tech_stack_java_does_not_match_javascript() {
        let stack = extract_tech_stack("Frontend in JavaScript");
        assert!(stack.contains(&"javascript".to_string()));
        assert!(!stack.contains(&"java".to_string()));
    }

    #[test]
    fn test_tech_stack_deduplicates_aliases() {
        let stack = extract_tech_stack("kubernetes and also k8s and more kubernetes");
        assert_eq!(
            stack.iter().filter(|t| *t == "kubernetes").count(),
            1,
            "aliases must collapse to one canonical entry"
        );
    }

    #[test]
    fn test_tech_stack_postgres_alias() {
        let stack = extract_tech_stack("postgres in prod");
        assert_eq!(stack, vec!["postgresql"]);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let text = "Senior Rust engineer: Kafka, k8s, PostgreSQL. Rust required.";
        assert_eq!(
            serde_json::to_string(&extract(text)).unwrap(),
            serde_json::to_string(&extract(text)).unwrap()
        );
    }

    #[test]
    fn test_search_terms_dedup_case_insensitive() {
        let terms = ExtractedTerms {
            keywords: vec!["rust".to_string(), "kafka".to_string()],
            skills: vec!["Rust".to_string()],
            tech_stack: vec!["kafka".to_string()],
        };
        let merged = terms.search_terms();
        assert_eq!(merged, vec!["Rust".to_string(), "kafka".to_string()]);
    }
}
