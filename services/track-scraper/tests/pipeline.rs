//!
//! tests/pipeline.rs  Andrew Belles  Oct 16th, 2026
//!
//! End to end lookups against a local mock server
//!

use std::time::Duration;

use httpmock::prelude::*;
use tokio_util::sync::CancellationToken;

use track_scraper::config::{AppConfig, CacheConfig, HttpConfig, RetryConfig};
use track_scraper::errors::HttpErrorKind;
use track_scraper::{ScraperError, TrackKey, TrackService};

const JSON_LD_PAGE: &str = r#"<!doctype html>
<html><head>
<script type="application/ld+json">
{"@context":"https://schema.org","@type":"MusicRecording",
 "name":"Кукла колдуна",
 "byArtist":[{"@type":"MusicGroup","name":"Король и Шут"}],
 "duration":"PT3M25S",
 "inAlbum":{"@type":"MusicAlbum","name":"Акустический альбом"}}
</script>
</head><body></body></html>"#;

const MARKUP_ONLY_PAGE: &str = r#"<html><body>
<h1 class="track__title">Beggin'</h1>
<div class="d-track__artists"><a>Måneskin</a><a>Frankie Valli</a></div>
<span class="d-track__duration">3:31</span>
</body></html>"#;

fn config(max_retries: u32) -> AppConfig {
    AppConfig {
        http: HttpConfig {
            timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_millis(500),
            retry: RetryConfig {
                max_retries,
                base_delay: 0.01,
                max_delay: 0.05,
                ..RetryConfig::default()
            },
            ..HttpConfig::default()
        },
        cache: CacheConfig { max_size: 16, ttl: Duration::from_secs(3600) },
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn lookup_parses_and_caches() {
    let server = MockServer::start_async().await;
    let page = server.mock_async(|when, then| {
        when.method(GET)
            .path("/album/1/track/2")
            .header_exists("user-agent")
            .header_exists("accept-language");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(JSON_LD_PAGE);
    }).await;

    let service = TrackService::new(&config(2)).unwrap();
    let key = TrackKey::new("1", "2").unwrap();
    let cancel = CancellationToken::new();
    let url = server.url("/album/1/track/2");

    let first = service.lookup(&url, &key, &cancel).await.unwrap();
    assert_eq!(first.title, "Кукла колдуна");
    assert_eq!(first.artist_display(), "Король и Шут");
    assert_eq!(first.duration_seconds, Some(205));
    assert_eq!(first.album_title.as_deref(), Some("Акустический альбом"));
    assert_eq!((first.album_id.as_str(), first.track_id.as_str()), ("1", "2"));

    let second = service.lookup(&url, &key, &cancel).await.unwrap();
    assert_eq!(first, second);
    page.assert_hits_async(1).await;

    let stats = service.shutdown().await;
    assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
    assert_eq!(stats.hit_rate(), 0.5);
}

#[tokio::test]
async fn markup_fallback_formats_featured_artist() {
    let server = MockServer::start_async().await;
    server.mock_async(|when, then| {
        when.method(GET).path("/album/7/track/8");
        then.status(200).body(MARKUP_ONLY_PAGE);
    }).await;

    let service = TrackService::new(&config(0)).unwrap();
    let track = service.lookup(
        &server.url("/album/7/track/8"),
        &TrackKey::new("7", "8").unwrap(),
        &CancellationToken::new()
    ).await.unwrap();

    assert_eq!(track.title, "Beggin'");
    assert_eq!(track.artist_display(), "Måneskin feat. Frankie Valli");
    assert_eq!(track.duration_display().as_deref(), Some("3:31"));
}

#[tokio::test]
async fn exhausted_retries_are_not_cached() {
    let server = MockServer::start_async().await;
    let down = server.mock_async(|when, then| {
        when.method(GET).path("/album/1/track/3");
        then.status(503);
    }).await;

    let service = TrackService::new(&config(2)).unwrap();
    let key = TrackKey::new("1", "3").unwrap();
    let url = server.url("/album/1/track/3");
    let cancel = CancellationToken::new();

    let err = service.lookup(&url, &key, &cancel).await.unwrap_err();
    match err {
        ScraperError::Http { status, kind } => {
            assert_eq!(status, 503);
            assert_eq!(kind, HttpErrorKind::ServiceUnavailable);
        },
        other => panic!("expected http error, got {other:?}")
    }
    down.assert_hits_async(3).await;

    // the failure was not stored, so the next lookup goes back to the network
    let _ = service.lookup(&url, &key, &cancel).await.unwrap_err();
    down.assert_hits_async(6).await;
    assert_eq!(service.cache().stats().await.size, 0);
}

#[tokio::test]
async fn not_found_is_terminal() {
    let server = MockServer::start_async().await;
    let missing = server.mock_async(|when, then| {
        when.method(GET).path("/album/1/track/404");
        then.status(404);
    }).await;

    let service = TrackService::new(&config(2)).unwrap();
    let err = service.lookup(
        &server.url("/album/1/track/404"),
        &TrackKey::new("1", "404").unwrap(),
        &CancellationToken::new()
    ).await.unwrap_err();

    assert!(matches!(err, ScraperError::Http { status: 404, kind: HttpErrorKind::NotFound }));
    missing.assert_hits_async(1).await;
}

#[tokio::test]
async fn parse_failure_lists_each_strategy() {
    let server = MockServer::start_async().await;
    server.mock_async(|when, then| {
        when.method(GET).path("/album/1/track/5");
        then.status(200).body("<html><body><form id=\"captcha\"></form></body></html>");
    }).await;

    let service = TrackService::new(&config(0)).unwrap();
    let err = service.lookup(
        &server.url("/album/1/track/5"),
        &TrackKey::new("1", "5").unwrap(),
        &CancellationToken::new()
    ).await.unwrap_err();

    let ScraperError::Parsing { attempts } = err else {
        panic!("expected parsing error, got {err:?}");
    };
    let names: Vec<_> = attempts.iter().map(|a| a.strategy_name.as_str()).collect();
    assert_eq!(names, ["structured_data", "social_metadata", "markup_heuristic"]);
    assert!(attempts.iter().all(|a| !a.succeeded));
}

#[tokio::test]
async fn cancelled_lookup_leaves_cache_empty() {
    let server = MockServer::start_async().await;
    server.mock_async(|when, then| {
        when.method(GET).path("/album/1/track/6");
        then.status(200).delay(Duration::from_secs(5)).body(JSON_LD_PAGE);
    }).await;

    let service = TrackService::new(&config(2)).unwrap();
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let err = service.lookup(
        &server.url("/album/1/track/6"),
        &TrackKey::new("1", "6").unwrap(),
        &cancel
    ).await.unwrap_err();

    assert!(matches!(err, ScraperError::Cancelled));
    assert_eq!(service.cache().stats().await.size, 0);
}
