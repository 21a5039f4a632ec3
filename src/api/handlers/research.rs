use crate::{
    types::{ResearchRequest, ResearchResult, Result},
    AppState,
};
use axum::{extract::State, Json};
use tracing::info;

/// Perform deep research on a topic
///
/// Body: `{"topic": "...", "persona": "...", "deadlineSecs": 30}`. Only
/// `topic` is required. `deadlineSecs` can shorten the run but never extends
/// it past the server's `research.deadline_secs`. The synthesis credential
/// always comes from the server configuration.
pub async fn deep_research(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<Json<ResearchResult>> {
    let limit = state.config.research.deadline_secs;
    let request = ResearchRequest {
        deadline_secs: payload.deadline_secs.map(|secs| secs.min(limit)),
        model_credential: None,
        ..payload
    };

    let result = state.coordinator.research(&request).await?;

    info!(
        topic = %result.topic,
        sources = result.sources.len(),
        timed_out = result.stats.timed_out,
        "research request served"
    );

    Ok(Json(result))
}
