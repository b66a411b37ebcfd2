//!
//! src/lib.rs  Andrew Belles  Oct 16th, 2026
//!
//! Track page scraper: resilient page fetch, a cascade of metadata
//! parsers, and a ttl cache of results behind one service object
//!

pub mod artists;
pub mod cache;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod logging;
pub mod parse;
pub mod service;
pub mod types;

pub use artists::format_artists;
pub use cache::{CacheStats, ResultCache};
pub use config::{load_config, AppConfig};
pub use errors::{ScraperError, Severity};
pub use fetch::{FetchClient, PageFetcher};
pub use parse::{CascadeParser, ParseOutcome, Strategy};
pub use service::TrackService;
pub use types::{ParseAttempt, Track, TrackKey};
