//! Background job scheduler.
//!
//! Registers the optional scheduled refresh. Scheduled and on-demand batches
//! share one refresh gate, so a tick that lands during a running batch is
//! skipped rather than queued.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use trailscrape_core::{ExtractionStatus, RefreshSchedule};
use trailscrape_scraper::{ProgressEvent, RefreshOrchestrator};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression is rejected, or the scheduler fails to start.
pub async fn build_scheduler(
    orchestrator: Arc<RefreshOrchestrator>,
    schedule: Option<&RefreshSchedule>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    if let Some(schedule) = schedule {
        register_refresh_job(&scheduler, orchestrator, schedule).await?;
    } else {
        tracing::debug!("scheduler: no refresh schedule configured");
    }

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_refresh_job(
    scheduler: &JobScheduler,
    orchestrator: Arc<RefreshOrchestrator>,
    schedule: &RefreshSchedule,
) -> Result<(), JobSchedulerError> {
    let ids = Arc::new(schedule.ids.clone());

    let job = Job::new_async(schedule.cron.as_str(), move |_uuid, _lock| {
        let orchestrator = Arc::clone(&orchestrator);
        let ids = Arc::clone(&ids);

        Box::pin(async move {
            run_scheduled_refresh(&orchestrator, &ids).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %schedule.cron, ids = schedule.ids.len(), "scheduler: refresh job registered");
    Ok(())
}

/// What a single scheduled tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledRun {
    /// Another batch held the gate.
    Skipped,
    Completed { refreshed: usize, degraded: usize },
}

/// Runs one scheduled batch to completion, or skips it if the gate is taken.
pub async fn run_scheduled_refresh(
    orchestrator: &RefreshOrchestrator,
    ids: &[String],
) -> ScheduledRun {
    let Ok(mut run) = orchestrator.start(ids.to_vec()) else {
        tracing::info!("scheduler: refresh already in progress; skipping tick");
        return ScheduledRun::Skipped;
    };

    tracing::info!(ids = ids.len(), "scheduler: starting refresh run");
    let mut refreshed = 0;
    let mut degraded = 0;
    while let Some(event) = run.progress.recv().await {
        if let ProgressEvent::Finished { status, .. } = event {
            refreshed += 1;
            if status != ExtractionStatus::Complete {
                degraded += 1;
            }
        }
    }
    if let Err(e) = run.task.await {
        tracing::error!(error = %e, "scheduler: refresh task ended abnormally");
    }
    tracing::info!(refreshed, degraded, "scheduler: refresh run complete");
    ScheduledRun::Completed {
        refreshed,
        degraded,
    }
}
