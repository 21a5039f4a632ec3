//! Phase-1 entity extraction.
//!
//! Frequency analysis over Reddit and Hacker News results that produces the
//! drill-down targets for phase 2: subreddits to search inside, X handles to
//! narrow the social search to, and salient title terms.

use crate::types::{ExtractedEntities, Post};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Entities kept per category.
pub const MAX_ENTITIES: usize = 5;

/// Key terms must appear at least this often across titles.
pub const MIN_TERM_FREQUENCY: usize = 2;

static SUBREDDIT_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_/])/?r/([A-Za-z0-9][A-Za-z0-9_]{1,20})\b")
        .expect("valid subreddit pattern")
});

static HANDLE_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_@.])@([A-Za-z0-9_]{2,15})\b").expect("valid handle pattern")
});

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "your", "you", "are", "was", "were",
    "what", "when", "where", "which", "while", "who", "why", "how", "have", "has", "had", "not",
    "but", "can", "will", "just", "about", "into", "than", "then", "them", "they", "their",
    "there", "these", "those", "been", "being", "does", "doing", "did", "its", "our", "out",
    "over", "some", "such", "very", "more", "most", "other", "only", "also", "any", "all",
    "after", "before", "again", "here", "would", "could", "should", "like", "using", "use",
    "used", "make", "made", "need", "want", "best", "good", "anyone", "else", "really",
    "thing", "things", "question", "help", "year", "years", "today", "new", "now", "get",
];

/// Generic or celebrity accounts that never make useful drill-down targets.
pub const HANDLE_DENYLIST: &[&str] = &[
    "elonmusk", "x", "twitter", "youtube", "google", "openai", "reddit", "github",
    "verified", "support", "premium", "nytimes", "cnn", "bbcworld", "potus", "whitehouse",
    "gmail", "example", "everyone", "here",
];

/// Count occurrences while remembering first-seen order for tie breaks.
#[derive(Default)]
struct Tally {
    counts: HashMap<String, (usize, usize, String)>,
    next_index: usize,
}

impl Tally {
    /// Record `value` under a case-insensitive key, keeping its first spelling.
    fn add(&mut self, value: &str) {
        let key = value.to_lowercase();
        let index = self.next_index;
        let entry = self
            .counts
            .entry(key)
            .or_insert_with(|| (0, index, value.to_string()));
        if entry.0 == 0 {
            self.next_index += 1;
        }
        entry.0 += 1;
    }

    fn top(self, limit: usize, min_count: usize) -> Vec<String> {
        let mut entries: Vec<(usize, usize, String)> = self
            .counts
            .into_values()
            .filter(|(count, _, _)| *count >= min_count)
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        entries
            .into_iter()
            .take(limit)
            .map(|(_, _, value)| value)
            .collect()
    }
}

/// Extract communities, key terms and handles from phase-1 results.
pub fn extract_entities(reddit: &[Post], hacker_news: &[Post]) -> ExtractedEntities {
    let mut communities = Tally::default();
    let mut terms = Tally::default();
    let mut handles = Tally::default();

    for post in reddit.iter().chain(hacker_news) {
        if let Some(community) = post.community.as_deref() {
            let name = community.trim().trim_start_matches("r/");
            if !name.is_empty() {
                communities.add(name);
            }
        }

        let text = format!("{}\n{}", post.title, post.body.as_deref().unwrap_or_default());
        for name in subreddit_mentions(&text) {
            communities.add(&name);
        }
        for handle in handle_mentions(&text) {
            handles.add(&handle);
        }

        for word in title_words(&post.title) {
            terms.add(&word);
        }
    }

    ExtractedEntities {
        communities: communities.top(MAX_ENTITIES, 1),
        key_terms: terms.top(MAX_ENTITIES, MIN_TERM_FREQUENCY),
        handles: handles.top(MAX_ENTITIES, 1),
    }
}

/// Subreddit names referenced inline as `r/name`.
pub fn subreddit_mentions(text: &str) -> Vec<String> {
    SUBREDDIT_MENTION
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// `@handle` mentions, excluding the denylist.
pub fn handle_mentions(text: &str) -> Vec<String> {
    HANDLE_MENTION
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .filter(|handle| !is_denied_handle(handle))
        .collect()
}

pub fn is_denied_handle(handle: &str) -> bool {
    let handle = handle.trim_start_matches('@').to_lowercase();
    HANDLE_DENYLIST.contains(&handle.as_str())
}

/// Lowercased title words longer than three characters, minus stopwords.
fn title_words(title: &str) -> Vec<String> {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|word| word.chars().count() > 3)
        .filter(|word| !STOPWORDS.contains(word))
        .filter(|word| !word.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceKind;
    use chrono::Utc;

    fn reddit(title: &str, community: &str, body: &str) -> Post {
        Post::new(
            SourceKind::Reddit,
            title,
            format!("https://www.reddit.com/r/{}/{}", community, title.len()),
            Utc::now(),
        )
        .with_community(community)
        .with_body(body)
    }

    fn hn(title: &str) -> Post {
        Post::new(SourceKind::HackerNews, title, "https://news.ycombinator.com", Utc::now())
    }

    #[test]
    fn test_communities_ranked_by_frequency() {
        let posts = vec![
            reddit("CRM question", "startups", ""),
            reddit("CRM pricing", "smallbusiness", "cross-posted from r/SaaS"),
            reddit("Another CRM", "startups", "see also r/SaaS and r/startups"),
            reddit("Pipeline tools", "sales", ""),
        ];

        let entities = extract_entities(&posts, &[]);

        assert_eq!(
            entities.communities,
            vec!["startups", "SaaS", "smallbusiness", "sales"]
        );
    }

    #[test]
    fn test_ties_broken_by_first_seen() {
        let posts = vec![
            reddit("a", "zeta", ""),
            reddit("b", "alpha", ""),
            reddit("c", "mid", ""),
        ];
        assert_eq!(
            extract_entities(&posts, &[]).communities,
            vec!["zeta", "alpha", "mid"]
        );
    }

    #[test]
    fn test_communities_capped_at_five() {
        let posts: Vec<Post> = (0..8)
            .map(|i| reddit(&format!("t{}", i), &format!("sub{}", i), ""))
            .collect();
        assert_eq!(extract_entities(&posts, &[]).communities.len(), MAX_ENTITIES);
    }

    #[test]
    fn test_key_terms_need_two_mentions_and_skip_stopwords() {
        let hn_posts = vec![
            hn("Pipedrive review: pricing after two years"),
            hn("HubSpot pricing changes, again"),
            hn("Why we moved from HubSpot to Pipedrive"),
            hn("Open source CRM with great pricing"),
        ];

        let entities = extract_entities(&[], &hn_posts);

        // pricing x3, then pipedrive and hubspot x2 in first-seen order
        assert_eq!(entities.key_terms, vec!["pricing", "pipedrive", "hubspot"]);
        assert!(!entities.key_terms.iter().any(|t| t == "with" || t == "from"));
    }

    #[test]
    fn test_handles_exclude_denylist() {
        let posts = vec![
            reddit("Thread by @karpathy", "MachineLearning", "cc @elonmusk @OpenAI"),
            reddit("Quoting @karpathy again", "LocalLLaMA", "and @simonw"),
            reddit("email me at someone@example.com", "x", ""),
        ];

        let entities = extract_entities(&posts, &[]);

        assert_eq!(entities.handles, vec!["karpathy", "simonw"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_entities(&[], &[]).is_empty());
    }

    #[test]
    fn test_subreddit_mentions_ignore_urls() {
        assert_eq!(
            subreddit_mentions("check r/rust and /r/programming"),
            vec!["rust", "programming"]
        );
        assert!(subreddit_mentions("https://example.com/r/notasub").is_empty());
    }
}
