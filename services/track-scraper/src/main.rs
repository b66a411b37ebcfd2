//!
//! src/main.rs  Andrew Belles  Oct 16th, 2026
//!
//! Looks up a single track page and prints the parsed track as json
//!
//! usage: track-scraper <url> <albumId> <trackId>
//!

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use track_scraper::{load_config, logging, ScraperError, TrackKey, TrackService};

fn usage() -> ScraperError {
    ScraperError::Validation("usage: track-scraper <url> <albumId> <trackId>".to_string())
}

#[tokio::main]
async fn main() -> Result<(), ScraperError> {
    let mut args = std::env::args().skip(1);
    let (url, album_id, track_id) = match (args.next(), args.next(), args.next()) {
        (Some(u), Some(a), Some(t)) => (u, a, t),
        _ => return Err(usage())
    };

    let cfgs = load_config()?;
    let _guard = logging::init_logging(&cfgs.logging)?;

    info!(
        service = "track-scraper",
        version = %env!("CARGO_PKG_VERSION"),
        "starting"
    );

    let key = TrackKey::new(&album_id, &track_id)?;
    let service = TrackService::new(&cfgs)?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    let trigger = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(msg = "cancelling lookup", "scraper.signal");
            shutdown.cancel();
        }
    });

    let result = service.lookup(&url, &key, &cancel).await;
    trigger.abort();

    let outcome = match result {
        Ok(track) => {
            println!("{}", serde_json::to_string_pretty(&track)?);
            Ok(())
        },
        Err(e) => Err(e)
    };

    service.shutdown().await;
    info!("scraper.exit");
    outcome
}
