use anyhow::Context;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trendscout::{
    api::routes::app,
    cli::{output::Output, Cli, Commands},
    AppState, ResearchCoordinator, ResearchRequest, TrendscoutConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let config = match TrendscoutConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output.error(&format!("Failed to load {}: {}", cli.config.display(), e));
            std::process::exit(2);
        }
    };

    init_tracing(&config.server.log_level, cli.verbose, cli.log_json)?;

    match cli.command {
        Commands::Research {
            topic,
            persona,
            json,
            deadline,
        } => run_research(&config, &output, topic, persona, json, deadline).await,
        Commands::Serve { host, port } => serve(config, &output, host, port).await,
        Commands::Config { validate } => show_config(&config, &cli.config, &output, validate),
    }
}

/// `RUST_LOG` wins over the configured level; `--verbose` wins over both.
fn init_tracing(log_level: &str, verbose: bool, json: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("trendscout=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(format!("trendscout={},tower_http=info", log_level)))
            .context("invalid log level")?
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

async fn run_research(
    config: &TrendscoutConfig,
    output: &Output,
    topic: String,
    persona: Option<String>,
    json: bool,
    deadline: Option<u64>,
) -> anyhow::Result<()> {
    let coordinator = ResearchCoordinator::new(config, config.credentials());
    let request = ResearchRequest {
        persona,
        deadline_secs: deadline,
        ..ResearchRequest::new(topic)
    };

    if !json {
        output.banner();
        output.info(&format!("Researching \"{}\"", request.topic.trim()));
    }

    let result = match coordinator.research(&request).await {
        Ok(result) => result,
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output.brief(&result.brief);
    output.header("Sources");
    output.sources_table(&result.sources);
    output.header("Run");
    output.stats(&result);
    Ok(())
}

async fn serve(
    config: TrendscoutConfig,
    output: &Output,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);

    let state = AppState::from_config(config);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    output.banner();
    output.success(&format!("Listening on http://{}", addr));
    output.kv("Research", &format!("POST http://{}/api/research", addr));
    output.kv("Health", &format!("GET  http://{}/health", addr));
    tracing::info!(%addr, "server started");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

fn show_config(
    config: &TrendscoutConfig,
    path: &Path,
    output: &Output,
    validate: bool,
) -> anyhow::Result<()> {
    if validate {
        return match config.validate() {
            Ok(()) => {
                output.success(&format!("{} is valid", path.display()));
                Ok(())
            }
            Err(e) => {
                output.error(&e.to_string());
                std::process::exit(2);
            }
        };
    }

    output.banner();
    output.header("Configuration");
    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };
    output.kv("File", &source);

    output.subheader("Server");
    output.kv("Address", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("Log level", &config.server.log_level);

    output.subheader("Research");
    let research = &config.research;
    output.kv("Deadline", &format!("{}s", research.deadline_secs));
    output.kv("Max sources", &research.max_sources.to_string());
    output.kv("Synthesis posts", &research.synthesis_posts.to_string());
    output.kv(
        "Enrichment",
        &format!(
            "top {} in batches of {}",
            research.enrichment_limit, research.enrichment_batch_size
        ),
    );
    output.kv("Recency window", &format!("{} days", config.recency.window_days));

    output.subheader("Credentials");
    let credentials = config.credentials();
    output.credential("YouTube", &config.youtube.api_key_env, credentials.youtube.is_some());
    output.credential("Web search", &config.web.api_key_env, credentials.web_search.is_some());
    output.credential("X search", &config.x.api_key_env, credentials.x_search.is_some());
    output.credential(
        "Synthesis",
        &config.synthesis.api_key_env,
        credentials.synthesis.is_some(),
    );

    if credentials.synthesis.is_none() {
        output.hint("Without a synthesis key the brief is a ranked list of sources");
    }
    Ok(())
}
