//! OAuth authorization-code flow used to obtain a refresh token for the
//! official search API.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    Extension, Json,
};
use rand::{distr::Alphanumeric, Rng};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use meli_scraper::{exchange_authorization_code, ErrorKind};

use super::{local_failure, ApiError, AppState, ResponseMeta};
use crate::middleware::RequestId;

const STATE_LEN: usize = 24;

#[derive(Debug, Deserialize)]
pub(super) struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CallbackResponse {
    ok: bool,
    refresh_token: Option<String>,
    user_id: Option<u64>,
    state: Option<String>,
    meta: ResponseMeta,
}

fn random_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

fn missing_setting(request_id: &str, var: &str) -> ApiError {
    ApiError::new(
        request_id.to_owned(),
        local_failure(
            ErrorKind::Configuration,
            format!("missing required environment variable: {var}"),
        ),
    )
}

pub(super) async fn start(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Redirect, ApiError> {
    let config = &state.config;
    let client_id = config
        .client_id
        .as_deref()
        .ok_or_else(|| missing_setting(&req_id.0, "MELI_CLIENT_ID"))?;
    let redirect_uri = config
        .redirect_uri
        .as_deref()
        .ok_or_else(|| missing_setting(&req_id.0, "MELI_REDIRECT_URI"))?;

    let base = format!("{}/authorization", config.auth_base_url.trim_end_matches('/'));
    let url = Url::parse_with_params(
        &base,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("state", random_state().as_str()),
        ],
    )
    .map_err(|e| {
        ApiError::new(
            req_id.0.clone(),
            local_failure(
                ErrorKind::Configuration,
                format!("invalid MELI_AUTH_BASE_URL: {e}"),
            ),
        )
    })?;

    tracing::info!(request_id = %req_id.0, "redirecting to authorization page");
    Ok(Redirect::to(url.as_str()))
}

pub(super) async fn callback(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, ApiError> {
    let config = &state.config;
    let client_id = config
        .client_id
        .as_deref()
        .ok_or_else(|| missing_setting(&req_id.0, "MELI_CLIENT_ID"))?;
    let client_secret = config
        .client_secret
        .as_deref()
        .ok_or_else(|| missing_setting(&req_id.0, "MELI_CLIENT_SECRET"))?;
    let redirect_uri = config
        .redirect_uri
        .as_deref()
        .ok_or_else(|| missing_setting(&req_id.0, "MELI_REDIRECT_URI"))?;

    let code = params
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                local_failure(ErrorKind::BadInput, "missing authorization code"),
            )
        })?;

    let token = exchange_authorization_code(
        state.searcher.client(),
        &config.api_base_url,
        client_id,
        client_secret,
        code,
        redirect_uri,
    )
    .await
    .map_err(|e| {
        tracing::warn!(request_id = %req_id.0, error = %e, "authorization code exchange failed");
        ApiError::from_scraper(req_id.0.clone(), &e)
    })?;

    tracing::info!(
        request_id = %req_id.0,
        user_id = ?token.user_id,
        "authorization code exchanged"
    );
    Ok(Json(CallbackResponse {
        ok: true,
        refresh_token: token.refresh_token,
        user_id: token.user_id,
        state: params.state,
        meta: ResponseMeta::new(req_id.0),
    }))
}
