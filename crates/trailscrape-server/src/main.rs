mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use trailscrape_scraper::{
    BrowserOptions, ChromiumFetcher, ExtractSettings, ProfileExtractor, RefreshOrchestrator,
};
use trailscrape_store::ProfileStore;

use crate::api::{build_app, AppState, HttpLimits, PortVisibility};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = trailscrape_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store = Arc::new(ProfileStore::open(&config.store_path).await?);
    let fetcher = Arc::new(ChromiumFetcher::launch(&BrowserOptions::from_app_config(&config)).await?);
    let extractor = Arc::new(ProfileExtractor::new(
        fetcher.clone(),
        Arc::clone(&store),
        ExtractSettings::from_app_config(&config),
    ));
    let orchestrator = Arc::new(RefreshOrchestrator::new(extractor));

    let mut scheduler = scheduler::build_scheduler(
        Arc::clone(&orchestrator),
        config.refresh_schedule.as_ref(),
    )
    .await?;

    let state = AppState {
        store,
        orchestrator,
        visibility: Arc::new(PortVisibility::from_app_config(&config)),
    };
    let app = build_app(state, HttpLimits::from_app_config(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "the app is available");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "scheduler did not stop cleanly");
    }
    ChromiumFetcher::shutdown_shared(fetcher).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
