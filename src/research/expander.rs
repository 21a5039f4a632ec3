//! Query expansion: the original topic first, then category-specific variants.

use crate::types::QueryType;

/// Build 2–3 search queries for `topic`. `year` is the current calendar year.
pub fn expand(topic: &str, query_type: QueryType, year: i32) -> Vec<String> {
    let topic = topic.trim();
    let variants: Vec<String> = match query_type {
        QueryType::Recommendations => vec![
            format!("{} recommendations", topic),
            format!("{} {}", topic, year),
        ],
        QueryType::News => vec![format!("{} {}", topic, year)],
        QueryType::HowTo => vec![format!("{} examples", topic), format!("{} tips", topic)],
        QueryType::General => vec![format!("{} {}", topic, year)],
    };

    let mut queries = vec![topic.to_string()];
    for variant in variants {
        // skip variants that merely repeat a word already in the topic
        if !queries
            .iter()
            .any(|q| q.eq_ignore_ascii_case(&variant) || contains_suffix_word(topic, &variant))
        {
            queries.push(variant);
        }
    }

    // always at least two queries, even when every variant was redundant
    if queries.len() < 2 {
        queries.push(format!("{} discussion", topic));
    }
    queries.truncate(3);
    queries
}

/// True when the word appended by `variant` already appears in `topic`.
fn contains_suffix_word(topic: &str, variant: &str) -> bool {
    let added = variant.rsplit(' ').next().unwrap_or_default().to_lowercase();
    topic
        .to_lowercase()
        .split_whitespace()
        .any(|word| word == added)
}
