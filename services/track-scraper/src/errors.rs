//!
//! src/errors.rs  Andrew Belles  Oct 16th, 2026
//!
//! Defines the error taxonomy surfaced by the fetch/parse/cache pipeline
//! and the severity each error should be logged at
//!
//!

use thiserror::Error;

use crate::types::ParseAttempt;

/// Log severity a caller should attach to an event. `Critical` has no
/// tracing counterpart and is emitted as ERROR with a `critical` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical
}

/// Classification of terminal HTTP statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    BadRequest,
    Forbidden,
    NotFound,
    Gone,
    RateLimited,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
    Server
}

impl HttpErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => HttpErrorKind::BadRequest,
            403 => HttpErrorKind::Forbidden,
            404 => HttpErrorKind::NotFound,
            410 => HttpErrorKind::Gone,
            429 => HttpErrorKind::RateLimited,
            502 => HttpErrorKind::BadGateway,
            503 => HttpErrorKind::ServiceUnavailable,
            504 => HttpErrorKind::GatewayTimeout,
            _   => HttpErrorKind::Server
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpErrorKind::BadRequest         => "bad_request",
            HttpErrorKind::Forbidden          => "forbidden",
            HttpErrorKind::NotFound           => "not_found",
            HttpErrorKind::Gone               => "gone",
            HttpErrorKind::RateLimited        => "rate_limited",
            HttpErrorKind::BadGateway         => "bad_gateway",
            HttpErrorKind::ServiceUnavailable => "service_unavailable",
            HttpErrorKind::GatewayTimeout     => "gateway_timeout",
            HttpErrorKind::Server             => "server"
        }
    }
}

/// Classification of transport level failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    ConnectTimeout,
    ReadTimeout,
    Connect,
    Tls,
    RemoteProtocol,
    Other
}

impl NetworkErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkErrorKind::ConnectTimeout => "connect_timeout",
            NetworkErrorKind::ReadTimeout    => "read_timeout",
            NetworkErrorKind::Connect        => "connect",
            NetworkErrorKind::Tls            => "tls",
            NetworkErrorKind::RemoteProtocol => "remote_protocol",
            NetworkErrorKind::Other          => "other"
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ScraperError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("http error: status {status} ({})", .kind.as_str())]
    Http { status: u16, kind: HttpErrorKind },
    #[error("network error ({}): {detail}", .kind.as_str())]
    Network { kind: NetworkErrorKind, detail: String },
    #[error("parse error: all {} strategies failed", .attempts.len())]
    Parsing { attempts: Vec<ParseAttempt> },
    #[error("config error: {0}")]
    Config(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("internal error: {0}")]
    Internal(String)
}

impl ScraperError {
    pub fn http(status: u16) -> Self {
        ScraperError::Http { status, kind: HttpErrorKind::from_status(status) }
    }

    pub fn network(kind: NetworkErrorKind, detail: impl Into<String>) -> Self {
        ScraperError::Network { kind, detail: detail.into() }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ScraperError::Validation(_) => Severity::Debug,
            ScraperError::Cancelled     => Severity::Info,
            ScraperError::Http { .. }
            | ScraperError::Network { .. }
            | ScraperError::Parsing { .. } => Severity::Error,
            ScraperError::Config(_)
            | ScraperError::Internal(_) => Severity::Critical
        }
    }

    /// Short machine readable label used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            ScraperError::Validation(_)    => "validation",
            ScraperError::Http { .. }      => "http",
            ScraperError::Network { .. }   => "network",
            ScraperError::Parsing { .. }   => "parsing",
            ScraperError::Config(_)        => "config",
            ScraperError::Cancelled        => "cancelled",
            ScraperError::Internal(_)      => "internal"
        }
    }
}

impl From<url::ParseError> for ScraperError {
    fn from(e: url::ParseError) -> Self { ScraperError::Validation(e.to_string()) }
}

impl From<serde_json::Error> for ScraperError {
    fn from(e: serde_json::Error) -> Self { ScraperError::Internal(e.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(HttpErrorKind::from_status(404), HttpErrorKind::NotFound);
        assert_eq!(HttpErrorKind::from_status(410), HttpErrorKind::Gone);
        assert_eq!(HttpErrorKind::from_status(418), HttpErrorKind::Server);
        assert_eq!(HttpErrorKind::from_status(500), HttpErrorKind::Server);
    }

    #[test]
    fn severities_follow_error_class() {
        assert_eq!(ScraperError::Validation("x".into()).severity(), Severity::Debug);
        assert_eq!(ScraperError::http(403).severity(), Severity::Error);
        assert_eq!(
            ScraperError::network(NetworkErrorKind::Tls, "handshake").severity(),
            Severity::Error
        );
        assert_eq!(ScraperError::Internal("x".into()).severity(), Severity::Critical);
        assert!(Severity::Critical > Severity::Warning);
    }
}
