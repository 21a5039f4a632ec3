//! Every connector degrades to an empty list on upstream failure.

mod common;

use rstest::rstest;
use std::sync::Arc;
use std::time::{Duration, Instant};
use trendscout::sources::{
    self, hacker_news::HackerNewsConnector, reddit::RedditConnector, web::WebConnector,
    x::XConnector, youtube::YouTubeConnector, Connector, SearchRequest, SearchScope,
};
use trendscout::types::QueryType;
use trendscout::{RecencyPolicy, SourceKind};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A connector of `kind` with every credential present and a one-second timeout.
fn connector(kind: SourceKind, base: &str) -> Arc<dyn Connector> {
    let mut config = common::config_for(base);
    config.reddit.timeout_secs = 1;
    config.hacker_news.timeout_secs = 1;
    config.youtube.timeout_secs = 1;
    config.web.timeout_secs = 1;
    config.web.fallback_timeout_secs = 1;
    config.x.timeout_secs = 1;
    let policy = RecencyPolicy::default();
    let key = Some("test-key".to_string());

    match kind {
        SourceKind::Reddit => Arc::new(RedditConnector::new(&config.reddit, policy)),
        SourceKind::HackerNews => Arc::new(HackerNewsConnector::new(&config.hacker_news, policy)),
        SourceKind::YouTube => Arc::new(YouTubeConnector::new(&config.youtube, key, policy)),
        SourceKind::Web => Arc::new(WebConnector::new(&config.web, key)),
        SourceKind::X => Arc::new(XConnector::new(&config.x, key, policy)),
    }
}

fn request() -> SearchRequest {
    SearchRequest::new(
        "best CRM for startups",
        QueryType::Recommendations,
        vec!["best CRM for startups".into(), "CRM recommendations".into()],
    )
}

#[rstest]
#[case::reddit(SourceKind::Reddit)]
#[case::hacker_news(SourceKind::HackerNews)]
#[case::youtube(SourceKind::YouTube)]
#[case::web(SourceKind::Web)]
#[case::x(SourceKind::X)]
#[tokio::test]
async fn test_server_error_yields_empty(#[case] kind: SourceKind) {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1..)
        .mount(&server)
        .await;

    let connector = connector(kind, &server.uri());
    assert_eq!(connector.kind(), kind);

    let posts = sources::search(connector.as_ref(), &request()).await;

    assert!(posts.is_empty());
}

#[rstest]
#[case::reddit(SourceKind::Reddit)]
#[case::hacker_news(SourceKind::HackerNews)]
#[case::youtube(SourceKind::YouTube)]
#[case::web(SourceKind::Web)]
#[case::x(SourceKind::X)]
#[tokio::test]
async fn test_slow_upstream_yields_empty_within_budget(#[case] kind: SourceKind) {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let connector = connector(kind, &server.uri());
    let started = Instant::now();

    let posts = sources::search(connector.as_ref(), &request()).await;

    assert!(posts.is_empty());
    assert!(
        started.elapsed() <= connector.budget() + Duration::from_millis(500),
        "{} took {:?}",
        kind,
        started.elapsed()
    );
}

#[rstest]
#[case::reddit(SourceKind::Reddit)]
#[case::hacker_news(SourceKind::HackerNews)]
#[case::youtube(SourceKind::YouTube)]
#[case::web(SourceKind::Web)]
#[case::x(SourceKind::X)]
#[tokio::test]
async fn test_malformed_payload_yields_empty(#[case] kind: SourceKind) {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let posts = sources::search(connector(kind, &server.uri()).as_ref(), &request()).await;

    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_missing_credentials_make_no_requests() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let config = common::config_for(&server.uri());
    let policy = RecencyPolicy::default();
    let youtube = YouTubeConnector::new(&config.youtube, None, policy.clone());
    let x = XConnector::new(&config.x, None, policy);

    assert!(sources::search(&youtube, &request()).await.is_empty());
    assert!(sources::search(&x, &request()).await.is_empty());
}

#[tokio::test]
async fn test_drill_down_scopes_ignored_by_broad_only_sources() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let communities = request().with_scope(SearchScope::Communities(vec!["startups".into()]));
    let handles = request().with_scope(SearchScope::Handles(vec!["levelsio".into()]));

    for kind in [SourceKind::HackerNews, SourceKind::YouTube, SourceKind::Web] {
        let connector = connector(kind, &server.uri());
        assert!(sources::search(connector.as_ref(), &communities).await.is_empty());
        assert!(sources::search(connector.as_ref(), &handles).await.is_empty());
    }
    let reddit = connector(SourceKind::Reddit, &server.uri());
    assert!(sources::search(reddit.as_ref(), &handles).await.is_empty());
    let x = connector(SourceKind::X, &server.uri());
    assert!(sources::search(x.as_ref(), &communities).await.is_empty());
}
