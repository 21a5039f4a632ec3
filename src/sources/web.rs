//! General web search.
//!
//! The primary path asks an OpenAI model with the `web_search` tool for a JSON
//! list of results, falling back to its URL citations when the answer is not
//! valid JSON. When that path is unavailable (no key), fails, or finds
//! nothing, the DuckDuckGo HTML results page is scraped instead, one request
//! per expanded query.
//!
//! Reddit and Hacker News links are excluded here since dedicated connectors
//! cover them.

use crate::sources::{
    ensure_success, http_client, responses_search, strip_code_blocks, Connector, SearchRequest,
    SearchScope,
};
use crate::types::{Post, Result, SourceKind};
use crate::utils::toml_config::WebConfig;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Domains covered by other connectors.
pub const EXCLUDED_DOMAINS: &[&str] = &["reddit.com", "redd.it", "news.ycombinator.com", "ycombinator.com"];

const FALLBACK_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct WebResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default, alias = "description")]
    snippet: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

/// True when `url` belongs to an excluded domain or is not http(s).
pub fn is_excluded(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return true;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return true;
    }
    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    EXCLUDED_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
}

fn parse_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(12, 0, 0)?.and_utc())
}

/// Follow DuckDuckGo's `/l/?uddg=` redirect links to the real target.
pub fn resolve_result_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let parsed = Url::parse(&absolute).ok()?;
    let is_redirect = parsed
        .host_str()
        .is_some_and(|h| h.ends_with("duckduckgo.com"))
        && parsed.path().starts_with("/l/");
    if is_redirect {
        return parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, target)| target.into_owned());
    }
    Some(parsed.to_string())
}

/// Extract results from a DuckDuckGo HTML results page.
pub fn parse_results_page(html: &str, now: DateTime<Utc>) -> Vec<Post> {
    let document = Html::parse_document(html);
    let (Ok(result), Ok(link), Ok(snippet)) = (
        Selector::parse(".result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    document
        .select(&result)
        .filter_map(|element| {
            let anchor = element.select(&link).next()?;
            let url = resolve_result_link(anchor.value().attr("href")?)?;
            let title = anchor.text().collect::<String>().trim().to_string();
            if title.is_empty() || is_excluded(&url) {
                return None;
            }
            let body = element
                .select(&snippet)
                .next()
                .map(|s| s.text().collect::<String>())
                .unwrap_or_default();
            Some(Post::new(SourceKind::Web, title, url, now).with_body(&body))
        })
        .collect()
}

pub struct WebConnector {
    http: reqwest::Client,
    scrape_http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
    fallback_url: String,
    fallback_timeout: Duration,
    max_results: usize,
}

impl WebConnector {
    pub fn new(config: &WebConfig, api_key: Option<String>) -> Self {
        Self {
            http: http_client(concat!("trendscout/", env!("CARGO_PKG_VERSION"))),
            scrape_http: http_client(FALLBACK_USER_AGENT),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            fallback_url: config.fallback_url.trim_end_matches('/').to_string(),
            fallback_timeout: Duration::from_secs(config.fallback_timeout_secs),
            max_results: config.max_results,
        }
    }

    fn prompt(&self, topic: &str) -> String {
        format!(
            "Search the web for the most relevant and recent pages about \"{topic}\" and return \
             10 to {max} results. Do not include any result from these domains: {excluded}.\n\
             Respond with only a JSON array, no prose. Each element must be an object with \
             \"title\", \"url\", \"snippet\" (one or two sentences) and \"date\" (YYYY-MM-DD, or \
             null if unknown).",
            topic = topic,
            max = self.max_results,
            excluded = EXCLUDED_DOMAINS.join(", "),
        )
    }

    async fn model_search(&self, api_key: &str, topic: &str) -> Result<Vec<Post>> {
        let body = json!({
            "model": self.model,
            "tools": [{"type": "web_search"}],
            "input": self.prompt(topic),
        });
        let output = responses_search(&self.http, &self.base_url, api_key, &body, self.timeout).await?;
        let now = Utc::now();

        let parsed: Option<Vec<WebResult>> = serde_json::from_str(strip_code_blocks(&output.text)).ok();
        let posts = match parsed {
            Some(results) => results
                .into_iter()
                .filter(|r| !r.url.trim().is_empty())
                .map(|r| {
                    let title = if r.title.trim().is_empty() { r.url.clone() } else { r.title };
                    let created_at = parse_date(r.date.as_deref()).unwrap_or(now);
                    Post::new(SourceKind::Web, title.trim(), r.url.trim(), created_at)
                        .with_body(r.snippet.as_deref().unwrap_or_default())
                })
                .collect(),
            None => {
                debug!("web search answer was not a JSON array, using citations");
                output
                    .citations
                    .into_iter()
                    .map(|c| {
                        let title = c.title.unwrap_or_else(|| c.url.clone());
                        Post::new(SourceKind::Web, title, c.url, now)
                    })
                    .collect()
            }
        };
        Ok(posts)
    }

    async fn scrape_one(&self, query: &str) -> Result<Vec<Post>> {
        let response = self
            .scrape_http
            .get(format!("{}/html/", self.fallback_url))
            .query(&[("q", query)])
            .timeout(self.fallback_timeout)
            .send()
            .await?;
        let html = ensure_success(response).await?.text().await?;
        Ok(parse_results_page(&html, Utc::now()))
    }

    async fn scrape(&self, queries: &[String]) -> Vec<Post> {
        let pages = join_all(queries.iter().map(|q| self.scrape_one(q))).await;
        pages
            .into_iter()
            .zip(queries)
            .flat_map(|(page, query)| match page {
                Ok(posts) => posts,
                Err(e) => {
                    debug!(query = %query, error = %e, "results page fetch failed");
                    Vec::new()
                }
            })
            .collect()
    }

    fn finish(&self, posts: Vec<Post>) -> Vec<Post> {
        let mut seen = HashSet::new();
        posts
            .into_iter()
            .filter(|p| !is_excluded(&p.url))
            .filter(|p| seen.insert(p.url.trim_end_matches('/').to_lowercase()))
            .take(self.max_results)
            .collect()
    }
}

#[async_trait]
impl Connector for WebConnector {
    fn kind(&self) -> SourceKind {
        SourceKind::Web
    }

    fn budget(&self) -> Duration {
        self.timeout + self.fallback_timeout + Duration::from_secs(2)
    }

    async fn fetch(&self, request: &SearchRequest) -> Result<Vec<Post>> {
        if !matches!(request.scope, SearchScope::Broad) {
            return Ok(Vec::new());
        }

        if let Some(api_key) = self.api_key.as_deref() {
            match self.model_search(api_key, &request.topic).await {
                Ok(posts) => {
                    let posts = self.finish(posts);
                    if !posts.is_empty() {
                        return Ok(posts);
                    }
                    debug!("model web search returned nothing, scraping results page");
                }
                Err(e) => warn!(error = %e, "model web search failed, scraping results page"),
            }
        }

        Ok(self.finish(self.scrape(&request.queries).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QueryType;
    use rstest::rstest;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS_PAGE: &str = r#"
        <html><body>
          <div class="result results_links">
            <h2><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fblog.example.com%2Fcrm-guide&rut=abc">CRM guide</a></h2>
            <a class="result__snippet">How small teams pick a CRM.</a>
          </div>
          <div class="result">
            <h2><a class="result__a" href="https://www.reddit.com/r/sales/comments/1/x/">Reddit thread</a></h2>
          </div>
          <div class="result">
            <h2><a class="result__a" href="https://news.example.org/crm">CRM market news</a></h2>
          </div>
        </body></html>
    "#;

    fn connector(model_base: &str, fallback: &str, key: Option<&str>) -> WebConnector {
        let config = WebConfig {
            base_url: model_base.to_string(),
            fallback_url: fallback.to_string(),
            timeout_secs: 2,
            fallback_timeout_secs: 2,
            ..Default::default()
        };
        WebConnector::new(&config, key.map(String::from))
    }

    #[rstest]
    #[case("https://www.reddit.com/r/x", true)]
    #[case("https://old.reddit.com/r/x", true)]
    #[case("https://news.ycombinator.com/item?id=1", true)]
    #[case("https://notreddit.com/page", false)]
    #[case("https://example.com/a", false)]
    #[case("ftp://example.com/a", true)]
    fn test_is_excluded(#[case] url: &str, #[case] excluded: bool) {
        assert_eq!(is_excluded(url), excluded);
    }

    #[test]
    fn test_parse_results_page() {
        let posts = parse_results_page(RESULTS_PAGE, Utc::now());

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].url, "https://blog.example.com/crm-guide");
        assert_eq!(posts[0].title, "CRM guide");
        assert_eq!(posts[0].body.as_deref(), Some("How small teams pick a CRM."));
        assert_eq!(posts[1].url, "https://news.example.org/crm");
        assert!(posts[1].body.is_none());
    }

    #[tokio::test]
    async fn test_model_search_parses_json_answer() {
        let server = MockServer::start().await;
        let answer = "```json\n[\
            {\"title\": \"CRM pricing compared\", \"url\": \"https://example.com/pricing\", \"snippet\": \"Per-seat costs\", \"date\": \"2026-10-01\"},\
            {\"title\": \"Thread\", \"url\": \"https://www.reddit.com/r/crm/comments/1/a/\", \"snippet\": null, \"date\": null}\
        ]\n```";
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": [{"type": "message", "content": [{"type": "output_text", "text": answer, "annotations": []}]}]
            })))
            .mount(&server)
            .await;

        let request = SearchRequest::new("crm", QueryType::General, vec![]);
        let posts = connector(&server.uri(), "http://127.0.0.1:9", Some("k"))
            .fetch(&request)
            .await
            .unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].url, "https://example.com/pricing");
        assert_eq!(posts[0].body.as_deref(), Some("Per-seat costs"));
        assert_eq!(posts[0].created_at.format("%Y-%m-%d").to_string(), "2026-10-01");
    }

    #[tokio::test]
    async fn test_prose_answer_uses_citations() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": [{"type": "message", "content": [{
                    "type": "output_text",
                    "text": "Here is what I found about CRMs.",
                    "annotations": [{"type": "url_citation", "url": "https://example.com/a", "title": "A"}]
                }]}]
            })))
            .mount(&server)
            .await;

        let request = SearchRequest::new("crm", QueryType::General, vec![]);
        let posts = connector(&server.uri(), "http://127.0.0.1:9", Some("k"))
            .fetch(&request)
            .await
            .unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "A");
    }

    #[tokio::test]
    async fn test_without_key_scrapes_every_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .expect(2)
            .mount(&server)
            .await;

        let request = SearchRequest::new(
            "crm",
            QueryType::General,
            vec!["crm".into(), "crm 2026".into()],
        );
        let posts = connector("http://127.0.0.1:9", &server.uri(), None)
            .fetch(&request)
            .await
            .unwrap();

        // both pages return the same links
        assert_eq!(posts.len(), 2);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_scrape() {
        let model = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&model)
            .await;
        let html = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "crm"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&html)
            .await;

        let request = SearchRequest::new("crm", QueryType::General, vec![]);
        let posts = connector(&model.uri(), &html.uri(), Some("k"))
            .fetch(&request)
            .await
            .unwrap();
        assert_eq!(posts.len(), 2);
    }
}
