//!
//! src/types.rs  Andrew Belles  Oct 16th, 2026
//!
//! Track entity produced by the pipeline, the composite identifier
//! used to key the cache, and per-strategy parse diagnostics
//!

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artists::format_artists;
use crate::errors::ScraperError;

/// Composite identifier of a track page: album id + track id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackKey {
    pub album_id: String,
    pub track_id: String
}

impl TrackKey {
    pub fn new(album_id: &str, track_id: &str) -> Result<Self, ScraperError> {
        let album_id = album_id.trim();
        let track_id = track_id.trim();
        if album_id.is_empty() || track_id.is_empty() {
            return Err(ScraperError::Validation(
                format!("empty key component (album={album_id:?}, track={track_id:?})")
            ));
        }
        if album_id.contains(':') || track_id.contains(':') {
            return Err(ScraperError::Validation(
                format!("key component contains ':' (album={album_id:?}, track={track_id:?})")
            ));
        }
        Ok( Self { album_id: album_id.to_string(), track_id: track_id.to_string() } )
    }

    /// "<album_id>:<track_id>"
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.album_id, self.track_id)
    }
}

/// Page a document was fetched from, handed to the parser so the
/// resulting Track can carry its provenance
#[derive(Debug, Clone)]
pub struct PageContext {
    pub source_url: String,
    pub key: TrackKey
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub artists: Vec<String>,
    pub duration_seconds: Option<u32>,
    pub cover_url: Option<String>,
    pub album_title: Option<String>,
    pub audio_url: Option<String>,
    pub source_url: String,
    pub track_id: String,
    pub album_id: String,
    pub fetched_at: DateTime<Utc>
}

impl Track {
    /// Non-empty title and at least one non-empty artist
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("empty field: title".to_string());
        }
        if self.artists.is_empty() {
            return Err("missing field: artists".to_string());
        }
        if self.artists.iter().any(|a| a.trim().is_empty()) {
            return Err("empty field: artists".to_string());
        }
        if self.duration_seconds == Some(0) {
            return Err("invalid duration: 0".to_string());
        }
        Ok(())
    }

    /// Artists joined for display ("A feat. B, C")
    pub fn artist_display(&self) -> String {
        format_artists(&self.artists).unwrap_or_default()
    }

    /// Duration as m:ss, if known
    pub fn duration_display(&self) -> Option<String> {
        self.duration_seconds.map(|s| format!("{}:{:02}", s / 60, s % 60))
    }
}

/// Outcome of one strategy against one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseAttempt {
    pub strategy_name: String,
    pub succeeded: bool,
    pub error_detail: Option<String>
}

impl ParseAttempt {
    pub fn failed(strategy_name: &str, detail: impl Into<String>) -> Self {
        Self {
            strategy_name: strategy_name.to_string(),
            succeeded: false,
            error_detail: Some(detail.into())
        }
    }
}
