//!
//! src/config.rs  Andrew Belles  Oct 16th, 2026
//!
//! Configuration for the http client, retry policy, result cache and
//! logger. Values come from the environment (and .env) with defaults
//!

use std::time;
use crate::errors::ScraperError;

/// Constants for HTTP Config
pub const HTTP_TIMEOUT: u64 = 10000;
pub const HTTP_CONNECT_TIMEOUT: u64 = 5000;
pub const HTTP_POOL_MAX_IDLE: usize = 16;
pub const HTTP_POOL_IDLE_TIMEOUT: u64 = 90000;
pub const HTTP_MAX_REDIRECTS: u8 = 10;

pub const RETRY_MAX_RETRIES: u32 = 2;
pub const RETRY_BASE_DELAY: f64 = 1.0;
pub const RETRY_MULTIPLIER: f64 = 2.0;
pub const RETRY_MAX_DELAY: f64 = 60.0;
pub const RETRY_JITTER: f64 = 0.10;
pub const RETRY_AFTER_MAX: f64 = 300.0;
pub const RETRY_DELAY_LIMIT: f64 = 86_400.0;
pub const RETRYABLE_STATUSES: [u16; 4] = [429, 502, 503, 504];

pub const CACHE_MAX_SIZE: usize = 1000;
pub const CACHE_TTL: u64 = 3600;
pub const CACHE_TTL_LIMIT: u64 = 365 * 86_400;

/// Reads an env var, falling back to default if unset or unparsable
fn env_or<T: std::str::FromStr>(s: &str, default: T) -> T {
    match std::env::var(s) {
        Ok(v) => {
            match v.trim().parse::<T>() {
                Ok(value) => value,
                _ => default
            }
        },
        Err(_) => default
    }
}

///
/// Retry/backoff policy applied by the fetch client
///
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,      // shared budget across retryable categories
    pub base_delay: f64,       // seconds
    pub multiplier: f64,
    pub max_delay: f64,        // seconds, caps the exponential term
    pub jitter: f64,           // symmetric fraction, 0.10 = +-10%
    pub max_retry_after: f64,  // seconds, longer 429 hints are terminal
    pub retryable_statuses: Vec<u16>
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: RETRY_MAX_RETRIES,
            base_delay: RETRY_BASE_DELAY,
            multiplier: RETRY_MULTIPLIER,
            max_delay: RETRY_MAX_DELAY,
            jitter: RETRY_JITTER,
            max_retry_after: RETRY_AFTER_MAX,
            retryable_statuses: RETRYABLE_STATUSES.to_vec()
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), ScraperError> {
        if !(self.base_delay >= 0.0 && self.base_delay.is_finite()) {
            return Err(ScraperError::Config(
                format!("RETRY_BASE_DELAY_SECONDS must be >= 0 (got {})", self.base_delay)
            ));
        }
        if !(self.multiplier >= 1.0 && self.multiplier.is_finite()) {
            return Err(ScraperError::Config(
                format!("RETRY_MULTIPLIER must be >= 1 (got {})", self.multiplier)
            ));
        }
        if !(0.0..=RETRY_DELAY_LIMIT).contains(&self.base_delay) {
            return Err(ScraperError::Config(
                format!("RETRY_BASE_DELAY_SECONDS must be <= {RETRY_DELAY_LIMIT} (got {})",
                    self.base_delay)
            ));
        }
        if !(0.0..=RETRY_DELAY_LIMIT).contains(&self.max_delay) {
            return Err(ScraperError::Config(
                format!("RETRY_MAX_DELAY_SECONDS must be in [0, {RETRY_DELAY_LIMIT}] (got {})",
                    self.max_delay)
            ));
        }
        if !(0.0..=RETRY_DELAY_LIMIT).contains(&self.max_retry_after) {
            return Err(ScraperError::Config(
                format!("RETRY_AFTER_MAX_SECONDS must be in [0, {RETRY_DELAY_LIMIT}] (got {})",
                    self.max_retry_after)
            ));
        }
        if !(0.0..1.0).contains(&self.jitter) {
            return Err(ScraperError::Config(
                format!("RETRY_JITTER_FRACTION must be in [0, 1) (got {})", self.jitter)
            ));
        }
        Ok(())
    }
}

fn build_retry() -> Result<RetryConfig, ScraperError> {
    let retry = RetryConfig {
        max_retries: env_or("MAX_RETRIES", RETRY_MAX_RETRIES),
        base_delay:  env_or("RETRY_BASE_DELAY_SECONDS", RETRY_BASE_DELAY),
        multiplier:  env_or("RETRY_MULTIPLIER", RETRY_MULTIPLIER),
        max_delay:   env_or("RETRY_MAX_DELAY_SECONDS", RETRY_MAX_DELAY),
        jitter:      env_or("RETRY_JITTER_FRACTION", RETRY_JITTER),
        max_retry_after: env_or("RETRY_AFTER_MAX_SECONDS", RETRY_AFTER_MAX),
        retryable_statuses: RETRYABLE_STATUSES.to_vec()
    };
    retry.validate()?;
    Ok(retry)
}

///
/// Configuration for Http timeouts, pooling, retries
///
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: time::Duration,
    pub connect_timeout: time::Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: time::Duration,
    pub max_redirects: u8,
    pub retry: RetryConfig
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: time::Duration::from_millis(HTTP_TIMEOUT),
            connect_timeout: time::Duration::from_millis(HTTP_CONNECT_TIMEOUT),
            pool_max_idle_per_host: HTTP_POOL_MAX_IDLE,
            pool_idle_timeout: time::Duration::from_millis(HTTP_POOL_IDLE_TIMEOUT),
            max_redirects: HTTP_MAX_REDIRECTS,
            retry: RetryConfig::default()
        }
    }
}

fn build_http() -> Result<HttpConfig, ScraperError> {
    let timeout = env_or("REQUEST_TIMEOUT_MS", HTTP_TIMEOUT);
    let connect_timeout = env_or("CONNECT_TIMEOUT_MS", HTTP_CONNECT_TIMEOUT);
    if timeout == 0 || connect_timeout == 0 {
        return Err(ScraperError::Config("request timeouts must be non-zero".to_string()));
    }

    Ok( HttpConfig {
        timeout: time::Duration::from_millis(timeout),
        connect_timeout: time::Duration::from_millis(connect_timeout),
        retry: build_retry()?,
        ..HttpConfig::default()
    })
}

///
/// Configuration for the in-memory result cache
///
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_size: usize,
    pub ttl: time::Duration
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: CACHE_MAX_SIZE,
            ttl: time::Duration::from_secs(CACHE_TTL)
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ScraperError> {
        if self.max_size == 0 {
            return Err(ScraperError::Config("CACHE_MAX_SIZE must be > 0".to_string()));
        }
        if self.ttl.as_secs() > CACHE_TTL_LIMIT {
            return Err(ScraperError::Config(
                format!("CACHE_TTL_SECONDS must be <= {CACHE_TTL_LIMIT} (got {})", self.ttl.as_secs())
            ));
        }
        Ok(())
    }
}

fn build_cache() -> Result<CacheConfig, ScraperError> {
    let cache = CacheConfig {
        max_size: env_or("CACHE_MAX_SIZE", CACHE_MAX_SIZE),
        ttl: time::Duration::from_secs(env_or("CACHE_TTL_SECONDS", CACHE_TTL))
    };
    cache.validate()?;
    Ok(cache)
}

///
/// Configuration for Logger
///

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter_directives: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub include_file_line: bool,
    pub include_target: bool
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter_directives: "info,track_scraper=debug,reqwest=warn".to_string(),
            format: LogFormat::Json,
            with_ansi: true,
            include_file_line: true,
            include_target: true
        }
    }
}

fn build_logging() -> LoggingConfig {
    let format = match std::env::var("LOG_FORMAT").ok().as_deref().map(str::trim) {
        Some(f) if f.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
        _ => LogFormat::Json
    };
    LoggingConfig { format, ..LoggingConfig::default() }
}

///
/// AppConfig which holds everything the service needs at start
///
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig
}

///
/// Return all environment variables to caller at program start.
///
pub fn load_config() -> Result<AppConfig, ScraperError> {
    dotenvy::dotenv().ok();

    let http    = build_http()?;
    let cache   = build_cache()?;
    let logging = build_logging();

    Ok( AppConfig { http, cache, logging } )
}
