//! Colored output helpers for CLI
//!
//! Consistent terminal output for the trendscout CLI. Every method has a
//! plain-text rendition used with `--no-color` or when output is piped.

use crate::types::{Post, ResearchResult, SourceKind};
use owo_colors::OwoColorize;

/// Width of the title column in the sources table
const TITLE_WIDTH: usize = 60;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the trendscout banner
    pub fn banner(&self) {
        if self.colored {
            println!(
                "\n   {} {}\n",
                "trendscout".bright_cyan().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            println!("\n   trendscout v{}\n", env!("CARGO_PKG_VERSION"));
        }
    }

    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a credential line without revealing its value
    pub fn credential(&self, name: &str, env_var: &str, present: bool) {
        let state = if present { "set" } else { "not set" };
        if self.colored {
            let marker = if present {
                "✓".green().bold().to_string()
            } else {
                "○".yellow().to_string()
            };
            println!(
                "    {} {} {}",
                marker,
                name.bright_white(),
                format!("({} {})", env_var, state).dimmed()
            );
        } else {
            println!("    [{}] {} ({})", state, name, env_var);
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print the markdown brief as-is
    pub fn brief(&self, markdown: &str) {
        println!("\n{}\n", markdown.trim_end());
    }

    /// Print the ranked sources as a table
    pub fn sources_table(&self, posts: &[Post]) {
        let header = format!(
            "{:>3}  {:<11} {:>7} {:>6}  {}",
            "#", "Source", "Score", "Cmts", "Title"
        );
        if self.colored {
            println!("    {}", header.bright_white().bold());
            println!("    {}", "─".repeat(TITLE_WIDTH + 33).dimmed());
        } else {
            println!("    {}", header);
            println!("    {}", "-".repeat(TITLE_WIDTH + 33));
        }

        for (i, post) in posts.iter().enumerate() {
            let title = truncate(&post.title, TITLE_WIDTH);
            let source = format!("{:<11}", post.source.label());
            let row_tail = format!(
                "{:>7} {:>6}  {}",
                post.engagement_score, post.comment_count, title
            );
            if self.colored {
                println!(
                    "    {:>3}  {} {}",
                    (i + 1).dimmed(),
                    colored_source(post.source, &source),
                    row_tail
                );
                println!("         {}", post.url.dimmed());
            } else {
                println!("    {:>3}  {} {}", i + 1, source, row_tail);
                println!("         {}", post.url);
            }
        }
    }

    /// Print per-source counts and run metadata
    pub fn stats(&self, result: &ResearchResult) {
        let stats = &result.stats;
        self.kv("Query type", &result.query_type.to_string());
        self.kv("Queries", &stats.queries.join(" | "));
        for source in SourceKind::ALL {
            let count = stats.per_source_counts.get(&source).copied().unwrap_or(0);
            let engagement = stats
                .per_source_engagement_totals
                .get(&source)
                .copied()
                .unwrap_or(0);
            self.kv(
                source.label(),
                &format!("{} posts, {} engagement", count, engagement),
            );
        }
        self.kv("Enriched", &stats.enriched_count.to_string());
        let timings = stats
            .phase_timings_ms
            .iter()
            .map(|(phase, ms)| format!("{} {}ms", phase, ms))
            .collect::<Vec<_>>()
            .join(", ");
        self.kv("Timings", &timings);
        if stats.timed_out {
            self.warning("Deadline reached, results are partial");
        }
        if !stats.synthesized_by_model {
            self.hint("Set the synthesis API key to get a model-written brief");
        }
    }
}

fn colored_source(source: SourceKind, padded: &str) -> String {
    match source {
        SourceKind::Reddit => padded.bright_red().to_string(),
        SourceKind::HackerNews => padded.yellow().to_string(),
        SourceKind::YouTube => padded.red().to_string(),
        SourceKind::Web => padded.blue().to_string(),
        SourceKind::X => padded.bright_white().to_string(),
    }
}

/// Cut `text` to `max` characters, marking the cut with an ellipsis
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}
