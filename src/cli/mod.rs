//! CLI module for trendscout
//!
//! Command-line parsing for the `trendscout` binary. Uses clap for argument
//! parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// trendscout - deep research across Reddit, Hacker News, YouTube, the web and X
#[derive(Parser, Debug)]
#[command(
    name = "trendscout",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "Deep-research pipeline for community and social trends",
    long_about = "Searches Reddit, Hacker News, YouTube, the web and X concurrently, drills into\n\
                  the communities and accounts it discovers, enriches the strongest threads,\n\
                  ranks everything by engagement and recency, and writes a brief.",
    after_help = "EXAMPLES:\n    \
                  trendscout research \"best CRM for startups\"\n    \
                  trendscout research \"latest news on OpenAI\" --json\n    \
                  trendscout research \"home espresso\" --persona \"coffee creators\"\n    \
                  trendscout serve                    # Start the HTTP API\n    \
                  trendscout config --validate        # Check trendscout.toml"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "trendscout.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a topic and print the brief with its ranked sources
    Research {
        /// Free-text topic, e.g. "best CRM for startups"
        topic: String,

        /// Audience the brief should be written for
        #[arg(short, long)]
        persona: Option<String>,

        /// Print the full result as JSON instead of formatted text
        #[arg(long)]
        json: bool,

        /// Outer deadline in seconds (overrides research.deadline_secs)
        #[arg(short, long)]
        deadline: Option<u64>,
    },

    /// Start the HTTP API server
    Serve {
        /// Override the configured host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file and exit
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
