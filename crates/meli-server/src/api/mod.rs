mod auth;
mod search;

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use meli_core::AppConfig;
use meli_scraper::{ErrorKind, RefreshTokenProvider, ScraperError, SearchFailure, Searcher};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::ResultCache;
use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub searcher: Arc<Searcher<RefreshTokenProvider>>,
    pub cache: ResultCache,
}

impl AppState {
    /// # Errors
    ///
    /// Returns [`ScraperError::Configuration`] if the HTTP client cannot be
    /// built from `config`.
    pub fn from_config(config: Arc<AppConfig>) -> Result<Self, ScraperError> {
        let searcher = Searcher::from_config(&config)?;
        let cache = ResultCache::new(Duration::from_secs(config.cache_ttl_secs));
        Ok(Self {
            config,
            searcher: Arc::new(searcher),
            cache,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

/// Failure envelope: `{ ok: false, error, code, status?, url?, detail?, meta }`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    ok: bool,
    #[serde(flatten)]
    failure: SearchFailure,
    meta: ResponseMeta,
}

impl ApiError {
    pub fn new(request_id: String, failure: SearchFailure) -> Self {
        Self {
            ok: false,
            failure,
            meta: ResponseMeta::new(request_id),
        }
    }

    pub fn from_scraper(request_id: String, error: &ScraperError) -> Self {
        Self::new(request_id, error.failure())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.failure.code {
            "bad_input" => StatusCode::BAD_REQUEST,
            "upstream_blocked" => StatusCode::SERVICE_UNAVAILABLE,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            "no_data" => StatusCode::NOT_FOUND,
            "transport_error" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Builds a failure payload for errors raised by the server itself.
pub(super) fn local_failure(kind: ErrorKind, message: impl Into<String>) -> SearchFailure {
    SearchFailure {
        error: message.into(),
        code: kind.as_str(),
        status: None,
        url: None,
        detail: None,
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let search_routes = Router::new()
        .route("/api/v1/search", get(search::search))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ));

    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/auth/start", get(auth::start))
        .route("/api/auth/callback", get(auth::callback));

    Router::new()
        .merge(public_routes)
        .merge(search_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    tracing::debug!(request_id = %req_id.0, "health check");
    Json(HealthData { status: "ok" })
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(60, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
