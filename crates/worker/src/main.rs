//! mitsu-sw entry point.
//!
//! Boots the offline cache worker on stdio: one request per line on stdin
//! (a path or absolute URL to fetch through the cache, or `search <query>`
//! for the anime search API), one result per line on stdout. Logging goes
//! to stderr to keep stdout clean for the line protocol.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use mitsu_client::fetch::{FetchRequest, resolve};
use mitsu_client::jikan::SearchRequest;
use mitsu_client::{FetchClient, FetchConfig, JikanClient, JikanConfig};
use mitsu_core::{AppConfig, CacheDb};
use mitsu_worker::{OfflineWorker, WorkerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, bucket = %config.cache_name, "starting mitsu-sw");

    let db = CacheDb::open(&config.db_path).await?;

    let fetch_client = FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    })?;

    let jikan = JikanClient::new(JikanConfig {
        base_url: config.jikan_base_url.clone(),
        user_agent: config.user_agent.clone(),
        ..Default::default()
    })?;

    let mut worker = OfflineWorker::new(WorkerConfig::from_app(&config)?, db, Arc::new(fetch_client));
    worker.install().await?;
    worker.activate().await?;

    serve(&worker, &jikan).await
}

/// Read requests line by line and reply on stdout.
async fn serve(worker: &OfflineWorker, jikan: &JikanClient) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = if let Some(query) = line.strip_prefix("search ") {
            run_search(jikan, query).await
        } else {
            run_fetch(worker, line).await
        };

        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}

async fn run_fetch(worker: &OfflineWorker, input: &str) -> String {
    let url = match resolve(&worker.config().origin, input) {
        Ok(url) => url,
        Err(e) => return format!("error: {}", e),
    };

    let req = FetchRequest::get(url);
    match worker.handle_fetch(&req).await {
        Ok(served) => format!(
            "{} {} {} bytes ({})",
            served.status(),
            req.url,
            served.body().len(),
            served.source()
        ),
        Err(e) => format!("error: {}", e),
    }
}

async fn run_search(jikan: &JikanClient, query: &str) -> String {
    match jikan.search(SearchRequest::query(query)).await {
        Ok(response) if response.data.is_empty() => "no results".to_string(),
        Ok(response) => response
            .data
            .iter()
            .map(|anime| {
                let score = anime
                    .score
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                format!("{}\t{}\t{}", anime.mal_id, anime.title, score)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Err(e) => format!("error: {}", e),
    }
}
