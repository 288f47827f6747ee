//! Command handlers for the CLI.
//!
//! Output goes to the writer passed in by `main` (stdout); diagnostics go
//! through `tracing` to stderr.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context as _;
use chrono::SecondsFormat;
use trailscrape_core::{render_fragment, AppConfig, ExtractionStatus};
use trailscrape_scraper::{
    parse_ids, BrowserOptions, ChromiumFetcher, ExtractSettings, ProfileExtractor, ProgressEvent,
    RefreshOrchestrator,
};
use trailscrape_store::ProfileStore;

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<ProfileStore>> {
    let store = ProfileStore::open(&config.store_path)
        .await
        .with_context(|| format!("opening store {}", config.store_path.display()))?;
    Ok(Arc::new(store))
}

/// Scrape `raw_ids` against a freshly launched browser.
///
/// # Errors
///
/// Returns an error if no id is given, the store cannot be opened or the
/// browser cannot be launched. Per-id extraction failures are reported in the
/// progress stream and logged, not propagated.
pub(crate) async fn run_refresh(
    config: &AppConfig,
    raw_ids: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let ids = parse_ids(Some(raw_ids))
        .ok_or_else(|| anyhow::anyhow!("no ids given; example: --ids jdoe,foobar"))?;

    let store = open_store(config).await?;
    let fetcher = Arc::new(
        ChromiumFetcher::launch(&BrowserOptions::from_app_config(config))
            .await
            .context("launching browser")?,
    );
    let extractor = Arc::new(ProfileExtractor::new(
        fetcher.clone(),
        store,
        ExtractSettings::from_app_config(config),
    ));
    let orchestrator = RefreshOrchestrator::new(extractor);

    let degraded = stream_batch(&orchestrator, ids, out).await;
    drop(orchestrator);
    ChromiumFetcher::shutdown_shared(fetcher).await;

    let degraded = degraded?;
    if degraded > 0 {
        tracing::warn!(degraded, "some profiles were not fully extracted");
    }
    Ok(())
}

/// Runs one batch, copying its progress lines to `out` as they arrive.
///
/// Returns how many ids did not extract completely. Waits for the batch task
/// to end, so the refresh gate is free on return.
pub(crate) async fn stream_batch(
    orchestrator: &RefreshOrchestrator,
    ids: Vec<String>,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let mut run = orchestrator.start(ids)?;

    let mut degraded = 0;
    while let Some(event) = run.progress.recv().await {
        if let ProgressEvent::Finished { status, .. } = &event {
            if *status != ExtractionStatus::Complete {
                degraded += 1;
            }
        }
        write!(out, "{}", event.render())?;
        out.flush()?;
    }
    writeln!(out)?;

    run.task.await.context("refresh batch ended abnormally")?;
    Ok(degraded)
}

pub(crate) async fn run_show(
    config: &AppConfig,
    id: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    write_fragment(&*open_store(config).await?, id, out).await
}

/// Writes the fragment for `id`, or nothing if it was never refreshed.
pub(crate) async fn write_fragment(
    store: &ProfileStore,
    id: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match store.get(id).await {
        Some(entry) => writeln!(out, "{}", render_fragment(&entry.record))?,
        None => tracing::info!(id, "no cached profile"),
    }
    Ok(())
}

pub(crate) async fn run_list(config: &AppConfig, out: &mut impl Write) -> anyhow::Result<()> {
    write_listing(&*open_store(config).await?, out).await
}

/// One tab-separated line per cached id: id, status, refresh time, error.
pub(crate) async fn write_listing(store: &ProfileStore, out: &mut impl Write) -> anyhow::Result<()> {
    for id in store.ids().await {
        let Some(entry) = store.get(&id).await else {
            continue;
        };
        let refreshed_at = entry.refreshed_at.map_or_else(
            || "-".to_string(),
            |at| at.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        write!(out, "{id}\t{}\t{refreshed_at}", entry.status)?;
        if let Some(error) = &entry.error {
            write!(out, "\t{error}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;
