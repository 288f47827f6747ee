//! Batch refresh: admission gate, sequential extraction, progress stream.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use trailscrape_core::ExtractionStatus;

use crate::extract::ProfileExtractor;

const START_MARKER: &str = "============================== start ==============================";
const END_MARKER: &str = "============================== end ==============================";

/// Progress channel depth. The batch task never waits on a slow reader for
/// longer than it takes to fill this many lines.
const PROGRESS_BUFFER: usize = 64;

/// Single-slot admission gate: at most one batch runs per process.
#[derive(Debug, Clone)]
pub struct RefreshGate {
    slot: Arc<Semaphore>,
}

/// Proof of admission. The slot is released when this is dropped, including
/// during unwinding.
#[derive(Debug)]
pub struct RefreshPermit {
    _permit: OwnedSemaphorePermit,
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
        }
    }
}

impl RefreshGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the slot if it is free. Never waits.
    #[must_use]
    pub fn try_acquire(&self) -> Option<RefreshPermit> {
        Arc::clone(&self.slot)
            .try_acquire_owned()
            .ok()
            .map(|permit| RefreshPermit { _permit: permit })
    }

    /// Reads the slot without taking it.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Refresh request is already in progress")]
pub struct RefreshBusy;

/// One step of a running batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started,
    Scraping { id: String },
    Finished { id: String, status: ExtractionStatus },
    Ended,
}

impl ProgressEvent {
    /// Plain-text rendering streamed to refresh callers.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            ProgressEvent::Started => format!("{START_MARKER}\n"),
            ProgressEvent::Scraping { id } => format!("Scraping {id}"),
            ProgressEvent::Finished { status, .. } => match status {
                ExtractionStatus::Complete => " ✅\n".to_string(),
                ExtractionStatus::Partial => " ⚠️ partial\n".to_string(),
                ExtractionStatus::Failed => " ❌ failed\n".to_string(),
            },
            ProgressEvent::Ended => format!("\n{END_MARKER}"),
        }
    }
}

/// Splits a comma-separated identifier list, dropping blanks.
///
/// Returns `None` when the list is missing or contains no identifier.
#[must_use]
pub fn parse_ids(raw: Option<&str>) -> Option<Vec<String>> {
    let ids: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    (!ids.is_empty()).then_some(ids)
}

/// A running batch.
#[derive(Debug)]
pub struct RefreshRun {
    /// Progress lines in order. Closed when the batch task ends.
    pub progress: mpsc::Receiver<ProgressEvent>,
    /// Resolves once the batch task is gone. Dropping it detaches the batch.
    pub task: JoinHandle<()>,
}

/// Runs refresh batches one at a time against a shared extractor.
pub struct RefreshOrchestrator {
    extractor: Arc<ProfileExtractor>,
    gate: RefreshGate,
}

impl RefreshOrchestrator {
    #[must_use]
    pub fn new(extractor: Arc<ProfileExtractor>) -> Self {
        Self {
            extractor,
            gate: RefreshGate::new(),
        }
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Starts a batch in the background and returns its progress stream and
    /// task handle.
    ///
    /// Identifiers are extracted strictly in order; each one finishes before
    /// the next begins. The batch runs to the end even if the receiver is
    /// dropped. The gate is held by the batch task until the last id is
    /// stored, so it is already free when [`ProgressEvent::Ended`] arrives. An
    /// abnormal exit releases it as the task unwinds.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshBusy`] without starting anything if another batch is
    /// still running.
    pub fn start(&self, ids: Vec<String>) -> Result<RefreshRun, RefreshBusy> {
        let permit = self.gate.try_acquire().ok_or(RefreshBusy)?;
        let (tx, rx) = mpsc::channel(PROGRESS_BUFFER);
        let extractor = Arc::clone(&self.extractor);

        tracing::info!(count = ids.len(), "refresh batch started");
        let task = tokio::spawn(run_batch(extractor, ids, permit, tx));
        Ok(RefreshRun { progress: rx, task })
    }
}

async fn run_batch(
    extractor: Arc<ProfileExtractor>,
    ids: Vec<String>,
    permit: RefreshPermit,
    progress: mpsc::Sender<ProgressEvent>,
) {
    let emit = |event: ProgressEvent| {
        let progress = progress.clone();
        async move {
            // A departed reader does not stop the batch.
            let _ = progress.send(event).await;
        }
    };

    emit(ProgressEvent::Started).await;
    for id in ids {
        emit(ProgressEvent::Scraping { id: id.clone() }).await;
        let status = extractor.extract(&id).await;
        tracing::info!(id = %id, %status, "profile refreshed");
        emit(ProgressEvent::Finished { id, status }).await;
    }
    drop(permit);
    emit(ProgressEvent::Ended).await;
    tracing::info!("refresh batch finished");
}

#[cfg(test)]
#[path = "refresh_test.rs"]
mod tests;
