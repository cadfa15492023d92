//! Per-query pagination, extraction, merge and ranking.
//!
//! Pages are fetched one at a time: whether another page is needed depends
//! on what the previous one yielded. Each page goes through fetch, classify,
//! extract and merge; the loop stops on an empty page, a short page, or once
//! the cap's worth of distinct records has been collected.

use std::time::Duration;

use meli_core::{AppConfig, Product, ResultCap, SourceKind};
use serde_json::Value;

use crate::aggregate::Aggregator;
use crate::cards::extract_cards;
use crate::classify::{classify, PageClass};
use crate::client::MarketClient;
use crate::credentials::{CredentialProvider, RefreshTokenProvider};
use crate::embedded::{extract_embedded, products_from_items};
use crate::error::{excerpt, ScraperError};
use crate::pagination::{api_search_url, listing_url, PagePlan};
use crate::rank::rank_products;

/// One search as asked for by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchRequest {
    pub query: String,
    pub cap: ResultCap,
    pub source: SourceKind,
}

/// Ranked result of a successful search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The trimmed query that was searched.
    pub query: String,
    pub source: SourceKind,
    pub cap: ResultCap,
    pub products: Vec<Product>,
    pub pages_fetched: usize,
}

/// Endpoints and pacing for the search pipeline.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub listing_base_url: String,
    pub api_base_url: String,
    pub site_id: String,
    pub inter_page_delay: Duration,
}

impl SearchSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            listing_base_url: config.listing_base_url.clone(),
            api_base_url: config.api_base_url.clone(),
            site_id: config.site_id.clone(),
            inter_page_delay: Duration::from_millis(config.inter_page_delay_ms),
        }
    }
}

/// Products extracted from one page, and where they came from.
struct PageYield {
    url: String,
    products: Vec<Product>,
}

/// Runs searches against one data source at a time.
pub struct Searcher<P> {
    client: MarketClient,
    credentials: P,
    settings: SearchSettings,
}

impl Searcher<RefreshTokenProvider> {
    /// Builds a searcher from application config, using the refresh-token
    /// grant for the official API.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Configuration`] if the HTTP client cannot be
    /// built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let client = MarketClient::new(config.request_timeout_secs, &config.user_agent)?;
        let credentials = RefreshTokenProvider::from_config(client.clone(), config);
        Ok(Self::new(client, credentials, SearchSettings::from_config(config)))
    }
}

impl<P: CredentialProvider> Searcher<P> {
    #[must_use]
    pub fn new(client: MarketClient, credentials: P, settings: SearchSettings) -> Self {
        Self {
            client,
            credentials,
            settings,
        }
    }

    #[must_use]
    pub fn client(&self) -> &MarketClient {
        &self.client
    }

    #[must_use]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Runs one search to completion.
    ///
    /// # Errors
    ///
    /// Exactly one classified failure: [`ScraperError::BadInput`] for an
    /// empty query, [`ScraperError::Configuration`] when no credential can be
    /// produced for the API source, [`ScraperError::Blocked`] on an anti-bot
    /// page, [`ScraperError::Upstream`] on an error status without records,
    /// [`ScraperError::Transport`] on a network failure, and
    /// [`ScraperError::NoData`] when every page came back empty.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, ScraperError> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(ScraperError::BadInput {
                reason: "query must not be empty".to_owned(),
            });
        }

        let plan = PagePlan::for_source(request.source, request.cap);
        let limit = request.cap.limit();

        let bearer = match request.source {
            SourceKind::OfficialApi => Some(self.bearer_token().await?),
            SourceKind::HtmlScrape | SourceKind::HtmlScrapeEmbedded => None,
        };

        let mut aggregate = Aggregator::new();
        let mut pages_fetched = 0;
        let mut last_url = None;

        for page in 0..plan.max_pages {
            if page > 0 && !self.settings.inter_page_delay.is_zero() {
                tokio::time::sleep(self.settings.inter_page_delay).await;
            }

            let offset = plan.offset(page);
            let page_yield = match bearer.as_deref() {
                Some(token) => self.api_page(query, plan, offset, token).await?,
                None => self.listing_page(query, offset, request.source).await?,
            };
            pages_fetched += 1;

            let extracted = page_yield.products.len();
            aggregate.insert_page(page_yield.products);
            tracing::debug!(
                page,
                offset,
                url = %page_yield.url,
                extracted,
                distinct = aggregate.len(),
                "merged result page"
            );
            last_url = Some(page_yield.url);

            if extracted == 0 || aggregate.len() >= limit || extracted < plan.page_size {
                break;
            }
        }

        if aggregate.is_empty() {
            return Err(ScraperError::NoData {
                query: query.to_owned(),
                pages: pages_fetched,
                url: last_url,
            });
        }

        let products = rank_products(aggregate.into_products(), request.cap);
        tracing::info!(
            query,
            source = %request.source,
            cap = %request.cap,
            pages = pages_fetched,
            returned = products.len(),
            "search complete"
        );

        Ok(SearchOutcome {
            query: query.to_owned(),
            source: request.source,
            cap: request.cap,
            products,
            pages_fetched,
        })
    }

    /// Every credential failure is a configuration failure for the query.
    async fn bearer_token(&self) -> Result<String, ScraperError> {
        self.credentials.bearer_token().await.map_err(|e| match e {
            ScraperError::Configuration { .. } => e,
            other => ScraperError::Configuration {
                reason: other.to_string(),
            },
        })
    }

    async fn listing_page(
        &self,
        query: &str,
        offset: usize,
        source: SourceKind,
    ) -> Result<PageYield, ScraperError> {
        let url = listing_url(&self.settings.listing_base_url, query, offset)?;
        let page = self.client.fetch_page(&url).await?;

        let class = classify(page.status, &page.body);
        match class {
            PageClass::HardBlock { signature } => {
                return Err(ScraperError::Blocked {
                    status: page.status,
                    url: page.url,
                    signature,
                    excerpt: excerpt(&page.body),
                });
            }
            PageClass::Indeterminate if !page.is_success() => {
                return Err(ScraperError::Upstream {
                    status: page.status,
                    url: page.url,
                    excerpt: excerpt(&page.body),
                });
            }
            PageClass::ListingPresent | PageClass::Indeterminate => {}
        }

        let mut products = extract_cards(&page.body, &page.url);
        if products.is_empty() && source.uses_embedded_state() {
            products = extract_embedded(&page.body, &page.url);
            tracing::debug!(
                url = %page.url,
                extracted = products.len(),
                "card markup empty, tried embedded state"
            );
        }

        if products.is_empty() && !page.is_success() {
            return Err(ScraperError::Upstream {
                status: page.status,
                url: page.url,
                excerpt: excerpt(&page.body),
            });
        }

        Ok(PageYield {
            url: page.url,
            products,
        })
    }

    async fn api_page(
        &self,
        query: &str,
        plan: PagePlan,
        offset: usize,
        bearer: &str,
    ) -> Result<PageYield, ScraperError> {
        let url = api_search_url(
            &self.settings.api_base_url,
            &self.settings.site_id,
            query,
            plan.page_size,
            offset,
        )?;
        let body = self.client.fetch_api_json(&url, bearer).await?;

        let items = body
            .get("results")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let products = products_from_items(items, &self.settings.listing_base_url);

        Ok(PageYield { url, products })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticToken;

    fn searcher() -> Searcher<StaticToken> {
        let client = MarketClient::new(5, "meli-test/0.1").expect("client");
        let settings = SearchSettings {
            listing_base_url: "http://127.0.0.1:9".to_owned(),
            api_base_url: "http://127.0.0.1:9".to_owned(),
            site_id: "MLA".to_owned(),
            inter_page_delay: Duration::ZERO,
        };
        Searcher::new(client, StaticToken(String::new()), settings)
    }

    #[tokio::test]
    async fn blank_query_is_bad_input_without_fetching() {
        let request = SearchRequest {
            query: "   ".to_owned(),
            cap: ResultCap::Twenty,
            source: SourceKind::HtmlScrape,
        };
        let err = searcher().search(&request).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BadInput);
    }

    #[tokio::test]
    async fn credential_failure_is_configuration_error() {
        let request = SearchRequest {
            query: "mouse".to_owned(),
            cap: ResultCap::Twenty,
            source: SourceKind::OfficialApi,
        };
        let err = searcher().search(&request).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }
}
