//! `GET /get/{id}` and `GET /{id}`: cached profile as an XML fragment.

use axum::{
    extract::{Path, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
};
use trailscrape_core::render_fragment;

use super::AppState;

pub const XML_CONTENT_TYPE: &str = "application/xml";
pub const EXTRACTION_STATUS_HEADER: &str = "x-extraction-status";

/// Serves the last stored extraction for `id`.
///
/// A never-refreshed id yields an empty body. Either way the status is 200;
/// how the stored record was obtained is reported in `x-extraction-status`.
pub(super) async fn lookup(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(entry) = state.store.get(&id).await else {
        tracing::debug!(id = %id, "lookup miss");
        return ([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], "").into_response();
    };

    tracing::debug!(id = %id, status = %entry.status, "lookup hit");
    (
        [
            (header::CONTENT_TYPE, XML_CONTENT_TYPE),
            (
                HeaderName::from_static(EXTRACTION_STATUS_HEADER),
                entry.status.as_str(),
            ),
        ],
        render_fragment(&entry.record),
    )
        .into_response()
}
