mod lookup;
mod refresh;
mod welcome;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method},
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::{limit::GlobalConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use trailscrape_scraper::RefreshOrchestrator;
use trailscrape_store::ProfileStore;

pub use welcome::PortVisibility;

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ProfileStore>,
    pub orchestrator: Arc<RefreshOrchestrator>,
    pub visibility: Arc<PortVisibility>,
}

/// Transport limits applied to every route.
#[derive(Debug, Clone, Copy)]
pub struct HttpLimits {
    /// Ceiling for producing the response head. A refresh stream that has
    /// already started is not cut off, and the batch behind it keeps running.
    pub request_timeout: Duration,
    pub max_concurrent_requests: usize,
}

impl HttpLimits {
    #[must_use]
    pub fn from_app_config(config: &trailscrape_core::AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_concurrent_requests: config.max_concurrent_requests,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ResponseMeta {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    cached_profiles: usize,
    refresh_in_progress: bool,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
        .expose_headers([
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(lookup::EXTRACTION_STATUS_HEADER),
        ])
}

/// Builds the router.
///
/// Static routes win over the `/{id}` catch-all, so `/refresh` and `/health`
/// are never treated as profile identifiers.
pub fn build_app(state: AppState, limits: HttpLimits) -> Router {
    Router::new()
        .route("/", get(welcome::welcome))
        .route("/health", get(health))
        .route("/refresh", get(refresh::refresh))
        .route("/get/{id}", get(lookup::lookup))
        .route("/{id}", get(lookup::lookup))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(GlobalConcurrencyLimitLayer::new(
                    limits.max_concurrent_requests,
                ))
                .layer(TimeoutLayer::new(limits.request_timeout)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            cached_profiles: state.store.len().await,
            refresh_in_progress: state.orchestrator.is_busy(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
