use crate::{
    llm::{LLMClient, ModelParams, OpenAIClient},
    research::{
        classifier::classify,
        enrichment::{Enricher, ThreadSource},
        entities::extract_entities,
        expander::expand,
        ranking::{merge_and_rank, rank_at, RecencyPolicy},
        synthesizer::{fallback_brief, synthesize, Synthesis, SynthesisInput},
    },
    sources::{
        self, hacker_news::HackerNewsConnector, reddit::RedditConnector, web::WebConnector,
        x::XConnector, youtube::YouTubeConnector, Connector, SearchRequest, SearchScope,
    },
    types::{AppError, Post, ResearchRequest, ResearchResult, ResearchStats, Result, SourceKind},
    utils::toml_config::{
        Credentials, ResearchSettings, SynthesisConfig, TrendscoutConfig, MAX_DEADLINE_SECS,
    },
};
use chrono::{Datelike, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Posts gathered so far, grouped by source.
type Gathered = BTreeMap<SourceKind, Vec<Post>>;

/// Runs the four-phase research pipeline.
///
/// 1. Broad search on every source concurrently
/// 2. Drill-down into the communities and handles found in phase 1
/// 3. Enrichment of the top Reddit threads
/// 4. Merge, rank, and synthesize
///
/// The whole run is raced against an outer deadline. When it fires, the
/// remaining phases are skipped and whatever completed is ranked and formatted
/// without the model.
pub struct ResearchCoordinator {
    settings: ResearchSettings,
    policy: RecencyPolicy,
    synthesis: SynthesisConfig,
    connectors: BTreeMap<SourceKind, Arc<dyn Connector>>,
    threads: Arc<dyn ThreadSource>,
    llm: Option<Arc<dyn LLMClient>>,
}

impl ResearchCoordinator {
    /// Build the production pipeline from configuration and resolved credentials.
    pub fn new(config: &TrendscoutConfig, credentials: Credentials) -> Self {
        let policy = config.recency.clone();
        let reddit = Arc::new(RedditConnector::new(&config.reddit, policy.clone()));

        let connectors: Vec<Arc<dyn Connector>> = vec![
            reddit.clone(),
            Arc::new(HackerNewsConnector::new(&config.hacker_news, policy.clone())),
            Arc::new(YouTubeConnector::new(
                &config.youtube,
                credentials.youtube.clone(),
                policy.clone(),
            )),
            Arc::new(WebConnector::new(&config.web, credentials.web_search.clone())),
            Arc::new(XConnector::new(
                &config.x,
                credentials.x_search.clone(),
                policy.clone(),
            )),
        ];

        let llm = credentials
            .synthesis
            .as_deref()
            .map(|key| synthesis_client(&config.synthesis, key));

        Self {
            settings: config.research.clone(),
            policy,
            synthesis: config.synthesis.clone(),
            connectors: connectors.into_iter().map(|c| (c.kind(), c)).collect(),
            threads: reddit,
            llm,
        }
    }

    /// Replace the connector for `connector.kind()`.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connectors.insert(connector.kind(), connector);
        self
    }

    pub fn with_thread_source(mut self, threads: Arc<dyn ThreadSource>) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn LLMClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn without_llm(mut self) -> Self {
        self.llm = None;
        self
    }

    pub fn settings(&self) -> &ResearchSettings {
        &self.settings
    }

    /// Execute deep research on a topic.
    ///
    /// Fails only on a blank topic or when no source returned anything.
    #[instrument(skip_all, fields(topic = %request.topic, run_id = tracing::field::Empty))]
    pub async fn research(&self, request: &ResearchRequest) -> Result<ResearchResult> {
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(AppError::InvalidInput("topic must not be empty".to_string()));
        }

        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        let budget = request
            .deadline_secs
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs.min(MAX_DEADLINE_SECS)))
            .unwrap_or_else(|| self.settings.deadline());
        let deadline = Instant::now() + budget;

        let query_type = classify(topic);
        let queries = expand(topic, query_type, Utc::now().year());
        info!(%query_type, ?queries, deadline_secs = budget.as_secs(), "research started");

        let base = SearchRequest::new(topic, query_type, queries.clone());
        let mut timings = BTreeMap::new();
        let mut gathered = Gathered::new();

        // Phase 1: broad fan-out
        let started = Instant::now();
        let phase1: Vec<(Arc<dyn Connector>, SearchRequest)> = SourceKind::ALL
            .iter()
            .filter_map(|kind| self.connectors.get(kind))
            .map(|c| (c.clone(), base.clone()))
            .collect();
        let mut timed_out = self.fan_out(phase1, deadline, &mut gathered).await;
        record(&mut timings, "search", started);
        info!(
            posts = gathered.values().map(Vec::len).sum::<usize>(),
            timed_out, "phase 1 complete"
        );

        let empty = Vec::new();
        let entities = extract_entities(
            gathered.get(&SourceKind::Reddit).unwrap_or(&empty),
            gathered.get(&SourceKind::HackerNews).unwrap_or(&empty),
        );

        // Phase 2: drill-down on discovered entities
        if !timed_out {
            let started = Instant::now();
            let mut phase2 = Vec::new();
            let communities: Vec<String> = entities
                .communities
                .iter()
                .take(self.settings.phase2_community_limit)
                .cloned()
                .collect();
            if !communities.is_empty() {
                if let Some(reddit) = self.connectors.get(&SourceKind::Reddit) {
                    phase2.push((
                        reddit.clone(),
                        base.clone().with_scope(SearchScope::Communities(communities)),
                    ));
                }
            }
            if !entities.handles.is_empty() {
                if let Some(x) = self.connectors.get(&SourceKind::X) {
                    phase2.push((
                        x.clone(),
                        base.clone()
                            .with_scope(SearchScope::Handles(entities.handles.clone())),
                    ));
                }
            }

            if phase2.is_empty() {
                info!("no drill-down targets, skipping phase 2");
            } else {
                let before = gathered.values().map(Vec::len).sum::<usize>();
                timed_out = self.fan_out(phase2, deadline, &mut gathered).await;
                info!(
                    added = gathered.values().map(Vec::len).sum::<usize>() - before,
                    timed_out, "phase 2 complete"
                );
            }
            record(&mut timings, "drill_down", started);
        }

        // Phase 3: enrich the strongest Reddit threads
        let mut enriched = Vec::new();
        let mut enriched_count = 0;
        if !timed_out {
            let started = Instant::now();
            let candidates: Vec<Post> = rank_at(
                gathered.get(&SourceKind::Reddit).cloned().unwrap_or_default(),
                &self.policy,
                Utc::now(),
            )
            .into_iter()
            .take(self.settings.enrichment_limit)
            .collect();

            if !candidates.is_empty() {
                let outcome = Enricher::new(self.threads.as_ref(), self.settings.enrichment_batch_size)
                    .enrich(candidates, Some(deadline))
                    .await;
                timed_out = outcome.interrupted;
                enriched_count = outcome.enriched;
                enriched = outcome.posts;
            }
            record(&mut timings, "enrichment", started);
        }

        // Phase 4: merge enriched-before-raw, rank, synthesize
        let started = Instant::now();
        let raw: Vec<Post> = gathered.into_values().flatten().collect();
        let mut ranked = merge_and_rank(enriched, raw, &self.policy, Utc::now());
        if ranked.is_empty() {
            warn!("no posts found on any source");
            return Err(AppError::NoResults(topic.to_string()));
        }
        ranked.truncate(self.settings.max_sources);

        let mut stats = ResearchStats::tally(&ranked);
        stats.run_id = run_id;
        stats.queries = queries;
        stats.entities = entities;
        stats.enriched_count = enriched_count;

        let top = &ranked[..ranked.len().min(self.settings.synthesis_posts)];
        let synthesis = if timed_out {
            Synthesis {
                brief: fallback_brief(topic, top),
                by_model: false,
            }
        } else {
            let request_llm = request
                .model_credential
                .as_deref()
                .filter(|key| !key.trim().is_empty())
                .map(|key| synthesis_client(&self.synthesis, key));
            let llm = request_llm.or_else(|| self.llm.clone());
            let input = SynthesisInput {
                topic,
                query_type,
                persona: request.persona.as_deref(),
                posts: top,
                stats: &stats,
            };
            match tokio::time::timeout_at(deadline, synthesize(llm.as_deref(), input)).await {
                Ok(synthesis) => synthesis,
                Err(_) => {
                    warn!("synthesis interrupted by deadline, using fallback formatter");
                    timed_out = true;
                    Synthesis {
                        brief: fallback_brief(topic, top),
                        by_model: false,
                    }
                }
            }
        };
        record(&mut timings, "synthesis", started);

        stats.phase_timings_ms = timings;
        stats.synthesized_by_model = synthesis.by_model;
        stats.timed_out = timed_out;

        info!(
            sources = ranked.len(),
            enriched = stats.enriched_count,
            by_model = synthesis.by_model,
            timed_out,
            "research finished"
        );

        Ok(ResearchResult {
            topic: topic.to_string(),
            query_type,
            brief: synthesis.brief,
            sources: ranked,
            stats,
        })
    }

    /// Run searches concurrently until all finish or `deadline` passes.
    ///
    /// Returns true when the deadline cut the fan-out short. Results from
    /// searches that finished in time are kept either way.
    async fn fan_out(
        &self,
        searches: Vec<(Arc<dyn Connector>, SearchRequest)>,
        deadline: Instant,
        gathered: &mut Gathered,
    ) -> bool {
        let mut set = JoinSet::new();
        for (connector, request) in searches {
            set.spawn(async move {
                let posts = sources::search(connector.as_ref(), &request).await;
                (connector.kind(), posts)
            });
        }

        loop {
            match tokio::time::timeout_at(deadline, set.join_next()).await {
                Ok(Some(Ok((kind, posts)))) => gathered.entry(kind).or_default().extend(posts),
                Ok(Some(Err(e))) => warn!(error = %e, "search task failed"),
                Ok(None) => return false,
                Err(_) => {
                    warn!(pending = set.len(), "deadline reached, abandoning pending searches");
                    set.abort_all();
                    return true;
                }
            }
        }
    }
}

fn synthesis_client(config: &SynthesisConfig, api_key: &str) -> Arc<dyn LLMClient> {
    Arc::new(
        OpenAIClient::new(api_key.to_string(), config.base_url.clone(), config.model.clone())
            .with_params(ModelParams {
                temperature: Some(config.temperature),
                max_tokens: Some(config.max_tokens),
            })
            .with_timeout(Duration::from_secs(config.timeout_secs)),
    )
}

fn record(timings: &mut BTreeMap<String, u64>, phase: &str, started: Instant) {
    timings.insert(phase.to_string(), started.elapsed().as_millis() as u64);
}
