//! Topic intent classification.
//!
//! Ordered keyword rules; the first rule that matches decides the category.

use crate::types::QueryType;
use regex::Regex;
use std::sync::LazyLock;

static RECOMMENDATION_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(best|top|which)\b",
        r"^what(?:'s| is| are) the best\b",
        r"\b(vs\.?|versus)\s",
        r"\balternatives? (to|for)\b",
        r"\brecommend(ed|ations?)?\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid classifier pattern"))
    .collect()
});

static NEWS_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(news|updates?|launch(es|ed)?|latest|announce(s|d|ment)?|released?)\b")
        .expect("valid classifier pattern")
});

static HOWTO_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(prompts?|prompting|techniques?|how (to|do i|can i)|tutorials?|guide)\b")
        .expect("valid classifier pattern")
});

/// Classify a free-text topic into an intent category.
pub fn classify(topic: &str) -> QueryType {
    let text = topic.trim().to_lowercase();

    if RECOMMENDATION_RULES.iter().any(|rule| rule.is_match(&text)) {
        QueryType::Recommendations
    } else if NEWS_RULE.is_match(&text) {
        QueryType::News
    } else if HOWTO_RULE.is_match(&text) {
        QueryType::HowTo
    } else {
        QueryType::General
    }
}
