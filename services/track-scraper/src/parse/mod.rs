//!
//! src/parse/mod.rs  Andrew Belles  Oct 16th, 2026
//!
//! Cascade of independent extraction strategies run against one
//! fetched document. The first strategy producing a valid Track wins;
//! later strategies are not consulted to fill gaps
//!

mod markup;
mod social;
mod structured;

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info};

use crate::artists::normalize_artists;
use crate::errors::ScraperError;
use crate::types::{PageContext, ParseAttempt, Track};

pub use structured::parse_iso_duration;
pub use markup::parse_clock_duration;

/// Why a single strategy could not produce a Track
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    #[error("not present: {0}")]
    NotPresent(&'static str),
    #[error("invalid json: {0}")]
    InvalidJson(String),
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("empty field: {0}")]
    EmptyField(&'static str),
    #[error("invalid track: {0}")]
    Invalid(String)
}

/// Fields a strategy recovered before provenance is attached
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub title: String,
    pub artists: Vec<String>,
    pub duration_seconds: Option<u32>,
    pub cover_url: Option<String>,
    pub album_title: Option<String>,
    pub audio_url: Option<String>
}

impl Extracted {
    fn into_track(self, page: &PageContext) -> Result<Track, StrategyError> {
        let track = Track {
            title: self.title.trim().to_string(),
            artists: normalize_artists(&self.artists),
            duration_seconds: self.duration_seconds.filter(|&s| s > 0),
            cover_url: self.cover_url,
            album_title: self.album_title,
            audio_url: self.audio_url,
            source_url: page.source_url.clone(),
            track_id: page.key.track_id.clone(),
            album_id: page.key.album_id.clone(),
            fetched_at: Utc::now()
        };
        track.validate().map_err(StrategyError::Invalid)?;
        Ok(track)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    StructuredData,
    SocialMetadata,
    MarkupHeuristic
}

impl Strategy {
    /// Default cascade, highest priority first
    pub const CASCADE: [Strategy; 3] = [
        Strategy::StructuredData,
        Strategy::SocialMetadata,
        Strategy::MarkupHeuristic
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::StructuredData  => "structured_data",
            Strategy::SocialMetadata  => "social_metadata",
            Strategy::MarkupHeuristic => "markup_heuristic"
        }
    }

    /// Lower runs first
    pub fn priority(self) -> u8 {
        match self {
            Strategy::StructuredData  => 1,
            Strategy::SocialMetadata  => 2,
            Strategy::MarkupHeuristic => 3
        }
    }

    pub fn extract(self, doc: &Html) -> Result<Extracted, StrategyError> {
        match self {
            Strategy::StructuredData  => structured::extract(doc),
            Strategy::SocialMetadata  => social::extract(doc),
            Strategy::MarkupHeuristic => markup::extract(doc)
        }
    }
}

/// Successful cascade result. `attempts` holds the failures that
/// preceded the winning strategy
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub track: Track,
    pub strategy: Strategy,
    pub attempts: Vec<ParseAttempt>
}

#[derive(Debug, Clone)]
pub struct CascadeParser {
    strategies: Vec<Strategy>
}

impl Default for CascadeParser {
    fn default() -> Self {
        Self { strategies: Strategy::CASCADE.to_vec() }
    }
}

impl CascadeParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom subset; always run in priority order, duplicates dropped
    pub fn with_strategies(mut strategies: Vec<Strategy>) -> Self {
        strategies.sort_by_key(|s| s.priority());
        strategies.dedup();
        Self { strategies }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn parse(&self, html: &str, page: &PageContext) -> Result<ParseOutcome, ScraperError> {
        let doc = Html::parse_document(html);
        self.parse_document(&doc, page)
    }

    pub fn parse_document(&self, doc: &Html, page: &PageContext) ->
        Result<ParseOutcome, ScraperError> {
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for &strategy in &self.strategies {
            let result = strategy.extract(doc)
                .and_then(|raw| raw.into_track(page));
            match result {
                Ok(track) => {
                    info!(
                        strategy = strategy.name(),
                        failed_before = attempts.len(),
                        key = %page.key.cache_key(),
                        "parse.ok"
                    );
                    return Ok( ParseOutcome { track, strategy, attempts } );
                },
                Err(e) => {
                    debug!(strategy = strategy.name(), error = %e, "parse.strategy.failed");
                    attempts.push(ParseAttempt::failed(strategy.name(), e.to_string()));
                }
            }
        }

        Err(ScraperError::Parsing { attempts })
    }
}

/// Parses a selector known at compile time
fn css(selector: &str) -> Result<Selector, StrategyError> {
    Selector::parse(selector)
        .map_err(|_| StrategyError::Invalid(format!("bad selector {selector}")))
}

/// Visible text of an element with whitespace collapsed
fn element_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// "//cdn/x.jpg" -> "https://cdn/x.jpg"
fn absolutize(url: &str) -> String {
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string()
    }
}
