//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod mocks;

use serde_json::{json, Value};
use trendscout::TrendscoutConfig;

/// Configuration pointing every connector at `base` with short timeouts.
pub fn config_for(base: &str) -> TrendscoutConfig {
    let mut config = TrendscoutConfig::default();
    config.reddit.base_url = base.to_string();
    config.reddit.timeout_secs = 2;
    config.hacker_news.base_url = base.to_string();
    config.hacker_news.timeout_secs = 2;
    config.youtube.base_url = base.to_string();
    config.youtube.timeout_secs = 2;
    config.web.base_url = base.to_string();
    config.web.fallback_url = base.to_string();
    config.web.timeout_secs = 2;
    config.web.fallback_timeout_secs = 2;
    config.x.base_url = base.to_string();
    config.x.timeout_secs = 2;
    config.synthesis.base_url = base.to_string();
    config.research.deadline_secs = 20;
    config
}

/// Unix timestamp `days` ago.
pub fn days_ago(days: i64) -> i64 {
    (chrono::Utc::now() - chrono::Duration::days(days)).timestamp()
}

/// A Reddit search listing.
pub fn reddit_listing(posts: Vec<Value>) -> Value {
    json!({
        "kind": "Listing",
        "data": {
            "children": posts
                .into_iter()
                .map(|p| json!({"kind": "t3", "data": p}))
                .collect::<Vec<_>>()
        }
    })
}

/// One raw Reddit submission, permalink `/r/{subreddit}/comments/{id}/thread/`.
pub fn reddit_post(
    title: &str,
    subreddit: &str,
    id: &str,
    score: i64,
    comments: i64,
    selftext: &str,
) -> Value {
    json!({
        "title": title,
        "permalink": format!("/r/{}/comments/{}/thread/", subreddit, id),
        "subreddit": subreddit,
        "score": score,
        "num_comments": comments,
        "created_utc": days_ago(2) as f64,
        "selftext": selftext,
        "upvote_ratio": 0.9
    })
}

/// Reddit's two-listing thread response.
pub fn reddit_thread(score: i64, comments: i64, selftext: &str, replies: &[(&str, i64)]) -> Value {
    json!([
        {
            "kind": "Listing",
            "data": {"children": [{"kind": "t3", "data": {
                "title": "thread",
                "permalink": "/r/x/comments/x/thread/",
                "subreddit": "x",
                "score": score,
                "num_comments": comments,
                "created_utc": days_ago(2) as f64,
                "selftext": selftext,
                "upvote_ratio": 0.97
            }}]}
        },
        {
            "kind": "Listing",
            "data": {"children": replies
                .iter()
                .map(|(body, score)| json!({"kind": "t1", "data": {
                    "author": "someone",
                    "body": body,
                    "score": score
                }}))
                .collect::<Vec<_>>()}
        }
    ])
}

/// One Algolia story hit from yesterday.
pub fn hn_hit(id: &str, title: &str, url: &str, points: i64, comments: i64) -> Value {
    json!({
        "objectID": id,
        "title": title,
        "url": url,
        "points": points,
        "num_comments": comments,
        "created_at_i": days_ago(1)
    })
}
