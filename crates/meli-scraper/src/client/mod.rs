//! HTTP access to rendered listing pages and the official search API.

mod api;

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA};
use reqwest::Client;

use crate::error::ScraperError;

/// Raw response of one page fetch. Non-success statuses are returned, not
/// raised: the orchestrator decides what they mean after classification.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    pub body: String,
}

impl FetchedPage {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Shared HTTP client carrying a desktop-browser request profile.
///
/// Redirects are followed and every request asks intermediaries not to
/// serve cached copies.
#[derive(Debug, Clone)]
pub struct MarketClient {
    pub(crate) client: Client,
}

impl MarketClient {
    /// Builds the client with the given per-request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Configuration`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(|e| ScraperError::Configuration {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Fetches one rendered listing page.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Transport`] when the request cannot be sent or
    /// the body cannot be read. HTTP error statuses are not errors here.
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, ScraperError> {
        let transport = |source| ScraperError::Transport {
            url: url.to_owned(),
            source,
        };

        let response = self
            .client
            .get(url)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "es-AR,es;q=0.9,en;q=0.8")
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(transport)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(transport)?;

        tracing::debug!(url, status, bytes = body.len(), "fetched listing page");
        Ok(FetchedPage {
            status,
            url: final_url,
            body,
        })
    }
}
