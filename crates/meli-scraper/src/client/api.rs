//! Authenticated JSON requests against the official search API.

use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::error::{excerpt, ScraperError};

use super::MarketClient;

impl MarketClient {
    /// Fetches one page of the search API with a bearer credential.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Transport`]: request or body read failed.
    /// - [`ScraperError::Upstream`]: non-2xx status, with a body excerpt.
    /// - [`ScraperError::Deserialize`]: the body is not JSON.
    pub async fn fetch_api_json(&self, url: &str, bearer: &str) -> Result<Value, ScraperError> {
        let transport = |source| ScraperError::Transport {
            url: url.to_owned(),
            source,
        };

        let response = self
            .client
            .get(url)
            .bearer_auth(bearer)
            .header(ACCEPT, "application/json")
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
            context: "search API page".to_owned(),
            url: url.to_owned(),
            status: status.as_u16(),
            source,
        })
    }
}
