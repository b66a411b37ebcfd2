//!
//! src/service.rs  Andrew Belles  Oct 16th, 2026
//!
//! Explicit service object tying fetch, parse cascade and result cache
//! together for one lookup at a time (or many concurrently)
//!

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

use crate::cache::{CacheStats, ResultCache};
use crate::config::AppConfig;
use crate::errors::ScraperError;
use crate::fetch::{FetchClient, PageFetcher};
use crate::logging;
use crate::parse::CascadeParser;
use crate::types::{PageContext, Track, TrackKey};

pub struct TrackService {
    fetcher: Arc<dyn PageFetcher>,
    parser: CascadeParser,
    cache: Arc<ResultCache>
}

impl TrackService {
    pub fn new(cfg: &AppConfig) -> Result<Self, ScraperError> {
        let fetcher = FetchClient::new(&cfg.http)?;
        Ok( Self::with_parts(
            Arc::new(fetcher),
            CascadeParser::new(),
            Arc::new(ResultCache::new(&cfg.cache))
        ) )
    }

    pub fn with_parts(
        fetcher: Arc<dyn PageFetcher>,
        parser: CascadeParser,
        cache: Arc<ResultCache>
    ) -> Self {
        let strategies: Vec<String> = parser.strategies()
            .iter()
            .map(|s| format!("{}:{}", s.priority(), s.name()))
            .collect();
        info!(strategies = ?strategies, "service.start");
        Self { fetcher, parser, cache }
    }

    pub fn cache(&self) -> Arc<ResultCache> {
        self.cache.clone()
    }

    pub fn parser(&self) -> &CascadeParser {
        &self.parser
    }

    /// Cached track for `key`, fetching and parsing `url` on a miss.
    /// Errors are reported at their severity before being returned
    pub async fn lookup(&self, url: &str, key: &TrackKey, cancel: &CancellationToken) ->
        Result<Track, ScraperError> {
        let result = self.lookup_inner(url, key, cancel).await;
        if let Err(e) = &result {
            logging::report(e, "lookup.failed");
        }
        result
    }

    async fn lookup_inner(&self, url: &str, key: &TrackKey, cancel: &CancellationToken) ->
        Result<Track, ScraperError> {
        let url = page_url(url)?;
        let page = PageContext { source_url: url.to_string(), key: key.clone() };

        self.cache.get_or_compute(&key.cache_key(), || async {
            let html = self.fetcher.fetch(&url, cancel).await?;
            let outcome = self.parser.parse(&html, &page)?;
            Ok(outcome.track)
        }).await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Final cache statistics; the cache is released with the service
    pub async fn shutdown(self) -> CacheStats {
        let stats = self.cache.stats().await;
        info!(
            hits = stats.hits,
            misses = stats.misses,
            size = stats.size,
            hit_rate = stats.hit_rate(),
            "service.shutdown"
        );
        stats
    }
}

/// Absolute http(s) url with a host
fn page_url(raw: &str) -> Result<Url, ScraperError> {
    let url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ScraperError::Validation(format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ScraperError::Validation(format!("url {raw} has no host")));
    }
    Ok(url)
}
