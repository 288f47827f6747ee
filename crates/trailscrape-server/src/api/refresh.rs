//! `GET /refresh?ids=a,b`: runs a batch and streams its progress.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tokio::sync::mpsc;
use trailscrape_scraper::{parse_ids, ProgressEvent, RefreshBusy};

use super::AppState;

pub const USAGE: &str =
    "You should pass the list of trailblazer ids as url param \n example ?ids=jdoe,foobar";

#[derive(Debug, Deserialize)]
pub(super) struct RefreshParams {
    ids: Option<String>,
}

/// Informational outcomes are plain text with status 200; only an admitted
/// batch gets the streaming body.
pub(super) async fn refresh(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Response {
    if state.orchestrator.is_busy() {
        return RefreshBusy.to_string().into_response();
    }
    let Some(ids) = parse_ids(params.ids.as_deref()) else {
        return USAGE.into_response();
    };

    match state.orchestrator.start(ids) {
        // The batch outlives the connection; its task handle is not needed here.
        Ok(run) => (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            Body::from_stream(progress_stream(run.progress)),
        )
            .into_response(),
        Err(busy) => busy.to_string().into_response(),
    }
}

fn progress_stream(
    progress: mpsc::Receiver<ProgressEvent>,
) -> impl futures::Stream<Item = Result<String, Infallible>> {
    futures::stream::unfold(progress, |mut progress| async move {
        let event = progress.recv().await?;
        Some((Ok(event.render()), progress))
    })
}
