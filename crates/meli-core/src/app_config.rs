use std::net::SocketAddr;

use crate::query::SourceKind;
use crate::ConfigError;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub site_id: String,
    pub api_base_url: String,
    pub listing_base_url: String,
    pub auth_base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub redirect_uri: Option<String>,
    pub default_source: SourceKind,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub inter_page_delay_ms: u64,
    pub cache_ttl_secs: u64,
}

/// Client credentials plus a long-lived refresh token, enough to mint bearer
/// tokens for the official search API.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .finish()
    }
}

impl AppConfig {
    /// Returns the refresh-grant credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] naming the first OAuth variable
    /// that is not set.
    pub fn oauth_credentials(&self) -> Result<OAuthCredentials, ConfigError> {
        let need = |value: &Option<String>, var: &str| {
            value
                .clone()
                .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
        };
        Ok(OAuthCredentials {
            client_id: need(&self.client_id, "MELI_CLIENT_ID")?,
            client_secret: need(&self.client_secret, "MELI_CLIENT_SECRET")?,
            refresh_token: need(&self.refresh_token, "MELI_REFRESH_TOKEN")?,
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("site_id", &self.site_id)
            .field("api_base_url", &self.api_base_url)
            .field("listing_base_url", &self.listing_base_url)
            .field("auth_base_url", &self.auth_base_url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("default_source", &self.default_source)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("inter_page_delay_ms", &self.inter_page_delay_ms)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .finish()
    }
}
