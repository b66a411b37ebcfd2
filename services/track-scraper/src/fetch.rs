//!
//! src/fetch.rs  Andrew Belles  Oct 16th, 2026
//!
//! Defines methods for hitting track pages and returning unparsed
//! html, handling retries, backoff, header diversification, and
//! cancellation
//!

use std::time::Duration;

use async_trait::async_trait;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use reqwest::{Client, header, redirect, RequestBuilder, StatusCode};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::config::{HttpConfig, RetryConfig};
use crate::errors::{NetworkErrorKind, ScraperError};

/// Browser identities rotated per request
pub const USER_AGENTS: [&str; 6] = [
    // Chrome Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Firefox macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Safari macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    // Edge Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

/// Client building functionality
fn client_helper(http: &HttpConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(http.timeout)
        .connect_timeout(http.connect_timeout)
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Some(http.pool_idle_timeout))
        .redirect(redirect::Policy::limited(http.max_redirects as usize))
        .cookie_store(true)
}

pub fn is_chrome_family(user_agent: &str) -> bool {
    user_agent.contains("Chrome") || user_agent.contains("Edg/")
}

pub fn pick_user_agent<R: Rng>(rng: &mut R) -> &'static str {
    USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())]
}

/// Header set a real browser would send when navigating to a page
pub fn browser_headers(user_agent: &'static str) -> header::HeaderMap {
    use header::HeaderValue;

    let mut h = header::HeaderMap::new();
    h.insert(header::USER_AGENT, HeaderValue::from_static(user_agent));
    h.insert(header::ACCEPT, HeaderValue::from_static(
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
    ));
    h.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static(
        "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7"
    ));
    h.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    h.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    h.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    h.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));

    if is_chrome_family(user_agent) {
        h.insert("sec-fetch-dest", HeaderValue::from_static("document"));
        h.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
        h.insert("sec-fetch-site", HeaderValue::from_static("none"));
        h.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    }
    h
}

/// Un-jittered delay in seconds before retry `n` (0-indexed)
pub fn backoff_delay(policy: &RetryConfig, n: u32) -> f64 {
    let exp = policy.base_delay * policy.multiplier.powi(n.min(i32::MAX as u32) as i32);
    exp.min(policy.max_delay)
}

/// Backoff for retry `n` drawn uniformly from delay * [1 - jitter, 1 + jitter]
pub fn jittered_delay<R: Rng>(policy: &RetryConfig, n: u32, rng: &mut R) -> Duration {
    let delay = backoff_delay(policy, n);
    let low  = delay * (1.0 - policy.jitter);
    let high = delay * (1.0 + policy.jitter);
    let secs = if high > low { rng.gen_range(low..=high) } else { delay };
    Duration::from_secs_f64(secs.max(0.0))
}

/// Numeric Retry-After (seconds). HTTP-date values are ignored; hints too
/// large for a Duration saturate to Duration::MAX
pub fn parse_retry_after(headers: &header::HeaderMap) -> Option<Duration> {
    let raw = headers.get(header::RETRY_AFTER)?.to_str().ok()?;
    let secs = raw.trim().parse::<f64>().ok()?;
    if !(secs.is_finite() && secs >= 0.0) {
        return None;
    }
    Some( Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX) )
}

/// How a single failed attempt should be treated
#[derive(Debug, Clone)]
pub enum Failure {
    Retryable { error: ScraperError, retry_after: Option<Duration> },
    Terminal(ScraperError)
}

#[derive(Debug, Clone)]
pub enum Transition {
    Retry(Duration),
    GiveUp(ScraperError)
}

///
/// Mutable state of one in-flight fetch. Created per call, never shared
///
#[derive(Debug, Default)]
pub struct AttemptState {
    pub attempt_number: u32,
    pub last_error: Option<ScraperError>,
    pub next_delay: Option<Duration>
}

impl AttemptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the state on a failed attempt. A Retry-After hint wins
    /// over the computed backoff when it is longer; a hint above
    /// `max_retry_after` gives up with the error that carried it
    pub fn on_failure<R: Rng>(
        &mut self,
        policy: &RetryConfig,
        failure: Failure,
        rng: &mut R
    ) -> Transition {
        match failure {
            Failure::Terminal(error) => {
                self.last_error = Some(error.clone());
                self.next_delay = None;
                Transition::GiveUp(error)
            },
            Failure::Retryable { error, retry_after } => {
                self.last_error = Some(error.clone());
                if self.attempt_number >= policy.max_retries {
                    self.next_delay = None;
                    return Transition::GiveUp(error);
                }

                if retry_after.is_some_and(|hint| hint.as_secs_f64() > policy.max_retry_after) {
                    self.next_delay = None;
                    return Transition::GiveUp(error);
                }

                let backoff = jittered_delay(policy, self.attempt_number, rng);
                let delay = match retry_after {
                    Some(hint) => backoff.max(hint),
                    None => backoff
                };
                self.attempt_number += 1;
                self.next_delay = Some(delay);
                Transition::Retry(delay)
            }
        }
    }
}

fn classify_status(
    status: StatusCode,
    headers: &header::HeaderMap,
    policy: &RetryConfig
) -> Failure {
    let code = status.as_u16();
    let error = ScraperError::http(code);
    if policy.retryable_statuses.contains(&code) {
        let retry_after = if code == 429 { parse_retry_after(headers) } else { None };
        Failure::Retryable { error, retry_after }
    } else {
        Failure::Terminal(error)
    }
}

/// Flattens an error and its sources into one line
fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}

fn classify_transport(e: &reqwest::Error) -> Failure {
    let detail = error_chain(e);
    let lowered = detail.to_ascii_lowercase();

    let retryable = |kind| Failure::Retryable {
        error: ScraperError::network(kind, detail.clone()),
        retry_after: None
    };

    if e.is_timeout() {
        if e.is_connect() {
            return retryable(NetworkErrorKind::ConnectTimeout);
        }
        return retryable(NetworkErrorKind::ReadTimeout);
    }
    if lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("ssl") {
        return Failure::Terminal(ScraperError::network(NetworkErrorKind::Tls, detail.clone()));
    }
    if e.is_connect() {
        return retryable(NetworkErrorKind::Connect);
    }
    if e.is_request() || e.is_body() || e.is_decode() {
        return retryable(NetworkErrorKind::RemoteProtocol);
    }
    Failure::Terminal(ScraperError::network(NetworkErrorKind::Other, detail.clone()))
}

/// Anything able to turn a page url into a raw document
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, cancel: &CancellationToken)
        -> Result<String, ScraperError>;
}

#[derive(Clone, Debug)]
pub struct FetchClient {
    pub http: Client,
    pub retry: RetryConfig
}

impl FetchClient {
    pub fn new(http_config: &HttpConfig) -> Result<Self, ScraperError> {
        http_config.retry.validate()?;
        let http = client_helper(http_config)
            .build()
            .map_err(|e| ScraperError::Config(format!("build client: {e}")))?;
        Ok( Self { http, retry: http_config.retry.clone() } )
    }

    async fn attempt(&self, request: RequestBuilder) -> Result<String, Failure> {
        let response = request.send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        if status.is_success() {
            return response.text().await.map_err(|e| classify_transport(&e));
        }
        Err(classify_status(status, response.headers(), &self.retry))
    }

    /// GET `url` until it succeeds, fails terminally, or the retry budget
    /// is spent. Every wait races `cancel`
    pub async fn fetch_page(&self, url: &Url, cancel: &CancellationToken) ->
        Result<String, ScraperError> {
        let mut rng = SmallRng::from_entropy();
        let mut state = AttemptState::new();

        loop {
            let user_agent = pick_user_agent(&mut rng);
            let request = self.http
                .get(url.clone())
                .headers(browser_headers(user_agent));

            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(ScraperError::Cancelled),
                r = self.attempt(request) => r
            };

            let failure = match outcome {
                Ok(body) => {
                    info!(
                        url = %url, attempt = state.attempt_number + 1,
                        bytes = body.len(), "fetch.ok"
                    );
                    return Ok(body);
                },
                Err(f) => f
            };

            match state.on_failure(&self.retry, failure, &mut rng) {
                Transition::GiveUp(error) => return Err(error),
                Transition::Retry(delay) => {
                    warn!(
                        url = %url,
                        attempt = state.attempt_number,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = ?state.last_error,
                        "fetch.retry"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(ScraperError::Cancelled),
                        _ = sleep(delay) => {}
                    }
                }
            }
        }
    }
}

#[async_trait]
impl PageFetcher for FetchClient {
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) ->
        Result<String, ScraperError> {
        self.fetch_page(url, cancel).await
    }
}
