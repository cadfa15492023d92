//! Bearer credentials for the official search API.

use std::future::Future;

use meli_core::{AppConfig, OAuthCredentials};
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::client::MarketClient;
use crate::error::{excerpt, ScraperError};

/// Produces a bearer credential for one query, or fails.
///
/// The orchestrator treats every failure as a configuration error for the
/// query, whatever its cause.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> impl Future<Output = Result<String, ScraperError>> + Send;
}

/// Token endpoint response for both the refresh and authorization-code grants.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Mints an access token per query from the configured refresh token.
pub struct RefreshTokenProvider {
    client: MarketClient,
    token_url: String,
    /// `Err` holds the reason the OAuth settings are unusable.
    credentials: Result<OAuthCredentials, String>,
}

impl RefreshTokenProvider {
    /// Reads OAuth settings from `config`. Missing settings do not fail
    /// here; they fail each query that needs a token.
    #[must_use]
    pub fn from_config(client: MarketClient, config: &AppConfig) -> Self {
        Self {
            client,
            token_url: token_url(&config.api_base_url),
            credentials: config.oauth_credentials().map_err(|e| e.to_string()),
        }
    }
}

impl CredentialProvider for RefreshTokenProvider {
    async fn bearer_token(&self) -> Result<String, ScraperError> {
        let creds = self
            .credentials
            .as_ref()
            .map_err(|reason| ScraperError::Configuration {
                reason: reason.clone(),
            })?;

        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("refresh_token", creds.refresh_token.as_str()),
        ];
        let token = request_token(&self.client, &self.token_url, &form)
            .await
            .map_err(|e| ScraperError::Configuration {
                reason: format!("access token refresh failed: {e}"),
            })?;

        tracing::debug!(expires_in = token.expires_in, "refreshed API access token");
        Ok(token.access_token)
    }
}

/// A bearer credential the caller already holds.
#[derive(Clone)]
pub struct StaticToken(pub String);

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken([redacted])")
    }
}

impl CredentialProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String, ScraperError> {
        if self.0.trim().is_empty() {
            return Err(ScraperError::Configuration {
                reason: "empty bearer token".to_owned(),
            });
        }
        Ok(self.0.clone())
    }
}

/// Exchanges an OAuth authorization code for tokens.
///
/// # Errors
///
/// - [`ScraperError::Upstream`]: the token endpoint rejected the code.
/// - [`ScraperError::Transport`]: the endpoint was unreachable.
/// - [`ScraperError::Deserialize`]: the response was not a token document.
pub async fn exchange_authorization_code(
    client: &MarketClient,
    api_base_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenResponse, ScraperError> {
    let form = [
        ("grant_type", "authorization_code"),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("code", code),
        ("redirect_uri", redirect_uri),
    ];
    request_token(client, &token_url(api_base_url), &form).await
}

fn token_url(api_base_url: &str) -> String {
    format!("{}/oauth/token", api_base_url.trim_end_matches('/'))
}

async fn request_token(
    client: &MarketClient,
    url: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, ScraperError> {
    let transport = |source| ScraperError::Transport {
        url: url.to_owned(),
        source,
    };

    let response = client
        .client
        .post(url)
        .header(ACCEPT, "application/json")
        .form(form)
        .send()
        .await
        .map_err(transport)?;

    let status = response.status();
    let body = response.text().await.map_err(transport)?;

    if !status.is_success() {
        return Err(ScraperError::Upstream {
            status: status.as_u16(),
            url: url.to_owned(),
            excerpt: excerpt(&body),
        });
    }

    serde_json::from_str(&body).map_err(|source| ScraperError::Deserialize {
        context: "OAuth token response".to_owned(),
        url: url.to_owned(),
        status: status.as_u16(),
        source,
    })
}
