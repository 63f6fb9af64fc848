//! revdiff - commit diff service for GitHub repositories
//!
//! # Usage
//! ```bash
//! revdiff                                   # Serve on 127.0.0.1:8000
//! revdiff --port 9000 --batch-policy partial
//! revdiff --max-concurrency 16 --fetch-timeout-secs 10
//! ```
//!
//! Then `POST /diff` with `[{"repository": "owner/name", "revisions": ["main", "dev"]}]`.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use revdiff::diff::{BatchOrchestrator, BatchPolicy};
use revdiff::github::{DEFAULT_API_URL, GithubFetcher};
use revdiff::{AppState, build_app};

/// Compare commit histories of two revisions across GitHub repositories
#[derive(Parser)]
#[command(name = "revdiff")]
#[command(about = "Commit diff service for GitHub repositories", long_about = None)]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to run the server on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Commits requested per listing (single page only; upstream default when unset)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    per_page: Option<u8>,

    /// Fail any single upstream fetch that takes longer than this
    #[arg(long, value_name = "SECONDS")]
    fetch_timeout_secs: Option<u64>,

    /// Cap on simultaneous upstream fetches (unbounded when unset)
    #[arg(long)]
    max_concurrency: Option<NonZeroUsize>,

    /// What a failed fetch does to the rest of its batch
    #[arg(long, value_enum, default_value_t = BatchPolicy::AllOrNothing)]
    batch_policy: BatchPolicy,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,revdiff=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut fetcher = GithubFetcher::new(&cli.api_url).context("failed to build HTTP client")?;
    if let Some(per_page) = cli.per_page {
        fetcher = fetcher.with_per_page(per_page);
    }
    let upstream = fetcher.api_url().to_string();

    let mut orchestrator = BatchOrchestrator::new(Arc::new(fetcher));
    if let Some(limit) = cli.max_concurrency {
        orchestrator = orchestrator.with_max_concurrency(limit);
    }
    if let Some(secs) = cli.fetch_timeout_secs {
        orchestrator = orchestrator.with_fetch_timeout(Duration::from_secs(secs));
    }

    let app = build_app(AppState::new(orchestrator, cli.batch_policy, upstream.clone()));

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        %upstream,
        policy = ?cli.batch_policy,
        max_concurrency = ?cli.max_concurrency,
        fetch_timeout_secs = ?cli.fetch_timeout_secs,
        "revdiff listening"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("shutting down");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
