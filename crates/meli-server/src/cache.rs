//! Short-lived cache of successful search outcomes.
//!
//! Only successes are stored, so a blocked or empty upstream answer is always
//! the result of a fresh fetch.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use meli_core::{ResultCap, SourceKind};
use meli_scraper::SearchOutcome;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    cap: ResultCap,
    source: SourceKind,
}

impl CacheKey {
    /// Queries differing only in case or surrounding whitespace share a key.
    #[must_use]
    pub fn new(query: &str, cap: ResultCap, source: SourceKind) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            cap,
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResultCache {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<CacheKey, (Instant, Arc<SearchOutcome>)>>>,
}

impl ResultCache {
    /// A zero `ttl` disables caching.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Arc<SearchOutcome>> {
        if self.ttl.is_zero() {
            return None;
        }
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, outcome)| Arc::clone(outcome))
    }

    /// Stores `outcome` and evicts every expired entry.
    pub async fn insert(&self, key: CacheKey, outcome: Arc<SearchOutcome>) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
        entries.insert(key, (Instant::now(), outcome));
    }
}
