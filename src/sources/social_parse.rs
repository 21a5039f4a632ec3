//! Best-effort extraction of X posts from free-form model output.
//!
//! The social search model answers in prose: usually a numbered list with one
//! post per item, each mentioning the author, some engagement numbers, and a
//! status link. Citations returned alongside the text are authoritative for
//! URLs; anything cited but not described in the text becomes a minimal post.

use crate::types::{Post, SourceKind};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

const TITLE_CHARS: usize = 200;

static ITEM_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d{1,2}[.)]|[-*•])\s+").expect("valid item pattern"));

static STATUS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:www\.|mobile\.)?(?:x|twitter)\.com/([A-Za-z0-9_]{1,15})/status/(\d+)")
        .expect("valid status url pattern")
});

static ANY_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(?https?://\S+\)?").expect("valid url pattern"));

static HANDLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_@.])@([A-Za-z0-9_]{1,15})\b").expect("valid handle pattern")
});

static LIKES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?\s*[km]?)\s*(?:likes?|favou?rites?|hearts?)\b")
        .expect("valid likes pattern")
});

static REPLIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?\s*[km]?)\s*(?:replies|reply|comments?)\b")
        .expect("valid replies pattern")
});

static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("valid date pattern"));

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["“]([^"”]{8,})["”]"#).expect("valid quote pattern"));

/// Parse `1.2K`, `3,400`, `2M` and plain integers.
pub fn parse_count(raw: &str) -> Option<i64> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace() && *c != ',').collect();
    let lower = cleaned.to_lowercase();
    let (digits, factor) = match lower.chars().last()? {
        'k' => (&lower[..lower.len() - 1], 1_000.0),
        'm' => (&lower[..lower.len() - 1], 1_000_000.0),
        _ => (lower.as_str(), 1.0),
    };
    let value: f64 = digits.parse().ok()?;
    Some((value * factor).round() as i64)
}

/// Canonical form of a status link, so text and citations compare equal.
fn canonical_status(handle: &str, id: &str) -> String {
    format!("https://x.com/{}/status/{}", handle, id)
}

/// Split model text into one chunk per list item.
fn split_items(text: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if ITEM_START.is_match(line) && !current.trim().is_empty() {
            items.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        items.push(current);
    }
    items
}

fn extract_title(item: &str) -> Option<String> {
    if let Some(quoted) = QUOTED.captures(item).and_then(|c| c.get(1)) {
        return crate::types::excerpt(quoted.as_str(), TITLE_CHARS);
    }

    item.lines()
        .map(|line| ITEM_START.replace(line, ""))
        .map(|line| ANY_URL.replace_all(&line, "").to_string())
        .map(|line| {
            line.trim_matches(|c: char| c.is_whitespace() || "-–|:*".contains(c))
                .to_string()
        })
        .find(|line| line.chars().any(char::is_alphabetic))
        .and_then(|line| crate::types::excerpt(&line, TITLE_CHARS))
}

fn parse_date(item: &str) -> Option<DateTime<Utc>> {
    let raw = DATE.captures(item)?.get(1)?.as_str();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(12, 0, 0)?.and_utc())
}

fn capture_count(pattern: &Regex, item: &str) -> i64 {
    pattern
        .captures(item)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_count(m.as_str()))
        .unwrap_or(0)
}

fn parse_item(item: &str, citations: &[String], used: &HashSet<String>, now: DateTime<Utc>) -> Option<Post> {
    let handle = HANDLE
        .captures(item)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let url = match STATUS_URL.captures(item) {
        Some(caps) => canonical_status(&caps[1], &caps[2]),
        // fall back to an unused citation by the same author
        None => {
            let handle = handle.as_deref()?.to_lowercase();
            citations.iter().find(|c| {
                !used.contains(*c)
                    && STATUS_URL
                        .captures(c)
                        .is_some_and(|caps| caps[1].to_lowercase() == handle)
            })?.clone()
        }
    };

    let author = handle.or_else(|| STATUS_URL.captures(&url).map(|caps| caps[1].to_string()))?;
    let title = extract_title(item).unwrap_or_else(|| format!("Post by @{}", author));
    let body = ANY_URL.replace_all(item, "");

    Some(
        Post::new(SourceKind::X, title, url, parse_date(item).unwrap_or(now))
            .with_community(format!("@{}", author))
            .with_engagement(capture_count(&LIKES, item), capture_count(&REPLIES, item))
            .with_body(body.trim()),
    )
}

/// Turn free-form social search output and its citations into posts.
///
/// Items without a resolvable status link are dropped. Citations not matched
/// by any item become minimal posts with zero engagement. Output contains no
/// duplicate URLs.
pub fn parse_social_posts(text: &str, citations: &[String], now: DateTime<Utc>) -> Vec<Post> {
    let citations: Vec<String> = citations
        .iter()
        .filter_map(|c| STATUS_URL.captures(c).map(|caps| canonical_status(&caps[1], &caps[2])))
        .collect();

    let mut used: HashSet<String> = HashSet::new();
    let mut posts = Vec::new();
    for item in split_items(text) {
        if let Some(post) = parse_item(&item, &citations, &used, now) {
            if used.insert(post.url.clone()) {
                posts.push(post);
            }
        }
    }

    for url in citations {
        if used.contains(&url) {
            continue;
        }
        if let Some(caps) = STATUS_URL.captures(&url) {
            let author = caps[1].to_string();
            posts.push(
                Post::new(SourceKind::X, format!("Post by @{}", author), url.clone(), now)
                    .with_community(format!("@{}", author)),
            );
        }
        used.insert(url);
    }

    posts
}
