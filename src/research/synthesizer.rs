//! Brief synthesis from ranked sources.
//!
//! With a model available the synthesizer sends one system + user prompt pair
//! and returns the model's markdown. Without one, or when the call fails, it
//! formats the top sources deterministically. That path cannot fail.

use crate::llm::LLMClient;
use crate::types::{Post, QueryType, ResearchStats, SourceKind};
use std::fmt::Write;
use tracing::{info, warn};

/// Posts listed by the fallback formatter.
pub const FALLBACK_POSTS: usize = 10;

/// Section headings every model brief must contain, in order.
pub const BRIEF_SECTIONS: [&str; 5] = [
    "Key Themes",
    "Sentiment",
    "Top Posts",
    "Notable Phrasings & Angles",
    "Content Ideas",
];

/// What the synthesizer produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub brief: String,
    /// False when the deterministic formatter was used
    pub by_model: bool,
}

/// Everything the prompts are built from.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    pub topic: &'a str,
    pub query_type: QueryType,
    pub persona: Option<&'a str>,
    pub posts: &'a [Post],
    pub stats: &'a ResearchStats,
}

fn emphasis(query_type: QueryType) -> &'static str {
    match query_type {
        QueryType::Recommendations => {
            "The reader is choosing between options. Compare the options people mention, \
             weigh their trade-offs as reported by users, and end Key Themes with a clear verdict."
        }
        QueryType::News => {
            "The reader wants to know what happened. Organize Key Themes as a timeline of \
             developments, most recent first, and separate confirmed facts from speculation."
        }
        QueryType::HowTo => {
            "The reader wants to do this themselves. Favor concrete, copy-ready techniques, \
             prompts and steps over commentary, quoting them exactly where the sources do."
        }
        QueryType::General => {
            "Give a broad survey of how people are discussing the topic: the main camps, \
             the recurring questions, and where opinion is shifting."
        }
    }
}

/// System prompt, varied by query type and optional audience.
pub fn system_prompt(query_type: QueryType, persona: Option<&str>) -> String {
    let mut prompt = format!(
        "You are a research analyst who turns raw community discussion into a concise brief.\n\n\
         {}\n\n\
         Write markdown with exactly these five sections as level-2 headings, in order:\n\
         1. {} - the 3-6 dominant themes\n\
         2. {} - overall tone with a percentage estimate (positive / neutral / negative)\n\
         3. {} - the most important posts and why they matter\n\
         4. {} - memorable wording, hooks and contrarian takes worth reusing\n\
         5. {} - actionable content ideas grounded in the sources\n\n\
         Cite the numbered sources for every claim, like [3] or [1][7]. \
         Do not invent sources or statistics.",
        emphasis(query_type),
        BRIEF_SECTIONS[0],
        BRIEF_SECTIONS[1],
        BRIEF_SECTIONS[2],
        BRIEF_SECTIONS[3],
        BRIEF_SECTIONS[4],
    );
    if let Some(persona) = persona.map(str::trim).filter(|p| !p.is_empty()) {
        let _ = write!(prompt, "\n\nWrite for this audience: {}.", persona);
    }
    prompt
}

/// User prompt enumerating every source with its index.
pub fn user_prompt(topic: &str, posts: &[Post], stats: &ResearchStats) -> String {
    let mut prompt = format!("Topic: {}\n\n", topic);

    if !stats.per_source_counts.is_empty() {
        prompt.push_str("Sources searched:\n");
        for (source, count) in &stats.per_source_counts {
            let engagement = stats
                .per_source_engagement_totals
                .get(source)
                .copied()
                .unwrap_or(0);
            let _ = writeln!(
                prompt,
                "- {}: {} posts, {} total engagement",
                source, count, engagement
            );
        }
        prompt.push('\n');
    }

    prompt.push_str("Posts, ranked by engagement and recency:\n");
    for (i, post) in posts.iter().enumerate() {
        let community = post
            .community
            .as_deref()
            .map(|c| format!(" in {}", community_label(post.source, c)))
            .unwrap_or_default();
        let _ = writeln!(
            prompt,
            "\n[{}] {}\n    {}{} | score {} | {} comments | {}\n    {}",
            i + 1,
            post.title,
            post.source,
            community,
            post.engagement_score,
            post.comment_count,
            post.created_at.format("%Y-%m-%d"),
            post.url,
        );
        if let Some(body) = &post.body {
            let _ = writeln!(prompt, "    Excerpt: {}", body.replace('\n', " "));
        }
        if let Some(insights) = &post.comment_insights {
            for insight in insights {
                let _ = writeln!(prompt, "    Comment: {}", insight);
            }
        }
    }
    prompt
}

fn community_label(source: SourceKind, community: &str) -> String {
    match source {
        SourceKind::Reddit => format!("r/{}", community),
        _ => community.to_string(),
    }
}

/// Ranked list of the top sources without narrative. Never empty.
pub fn fallback_brief(topic: &str, posts: &[Post]) -> String {
    let mut brief = format!("# Research: {}\n\n", topic.trim());

    if posts.is_empty() {
        brief.push_str("No sources were found for this topic.\n");
        return brief;
    }

    brief.push_str("_Ranked sources only, no narrative synthesis was available._\n\n## Top Sources\n\n");
    for (i, post) in posts.iter().take(FALLBACK_POSTS).enumerate() {
        let community = post
            .community
            .as_deref()
            .map(|c| format!(", {}", community_label(post.source, c)))
            .unwrap_or_default();
        let _ = writeln!(
            brief,
            "{}. **{}** ({}{}) - score {}, {} comments\n   {}",
            i + 1,
            post.title,
            post.source,
            community,
            post.engagement_score,
            post.comment_count,
            post.url
        );
    }
    brief
}

/// Produce the brief. Falls back to [`fallback_brief`] on any model problem.
pub async fn synthesize(llm: Option<&dyn LLMClient>, input: SynthesisInput<'_>) -> Synthesis {
    let fallback = || Synthesis {
        brief: fallback_brief(input.topic, input.posts),
        by_model: false,
    };

    let Some(llm) = llm else {
        info!("no synthesis model configured, using fallback formatter");
        return fallback();
    };
    if input.posts.is_empty() {
        return fallback();
    }

    let system = system_prompt(input.query_type, input.persona);
    let user = user_prompt(input.topic, input.posts, input.stats);

    match llm.generate_with_system(&system, &user).await {
        Ok(brief) if !brief.trim().is_empty() => {
            info!(model = llm.model_name(), chars = brief.len(), "brief synthesized");
            Synthesis {
                brief,
                by_model: true,
            }
        }
        Ok(_) => {
            warn!(model = llm.model_name(), "model returned an empty brief, using fallback formatter");
            fallback()
        }
        Err(e) => {
            warn!(model = llm.model_name(), error = %e, "synthesis failed, using fallback formatter");
            fallback()
        }
    }
}
