//!
//! src/parse/social.rs  Andrew Belles  Oct 16th, 2026
//!
//! Social metadata strategy: flat Open Graph / music:* preview tags
//!

use scraper::Html;

use super::{absolutize, css, non_empty, Extracted, StrategyError};

/// Separators between track and artist in og:title ("Track — Artist")
const TITLE_SEPARATORS: [&str; 3] = [" — ", " – ", " - "];

/// Every non-empty content value of meta tags keyed by `key`, whether the
/// page uses property= or name=
fn meta_values(doc: &Html, key: &str) -> Result<Vec<String>, StrategyError> {
    let metas = css("meta")?;
    Ok( doc.select(&metas)
        .filter(|m| {
            let el = m.value();
            el.attr("property") == Some(key) || el.attr("name") == Some(key)
        })
        .filter_map(|m| m.value().attr("content").and_then(non_empty))
        .collect() )
}

fn meta_first(doc: &Html, key: &str) -> Result<Option<String>, StrategyError> {
    Ok( meta_values(doc, key)?.into_iter().next() )
}

fn is_link(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://") || value.starts_with("//")
}

fn split_title(title: &str) -> Option<(String, String)> {
    TITLE_SEPARATORS.iter().find_map(|sep| {
        let (track, artist) = title.split_once(sep)?;
        Some( (non_empty(track)?, non_empty(artist)?) )
    })
}

pub(super) fn extract(doc: &Html) -> Result<Extracted, StrategyError> {
    let raw_title = meta_first(doc, "og:title")?
        .ok_or(StrategyError::NotPresent("og:title"))?;

    // music:musician is usually a profile link; only plain names count
    let mut explicit = meta_values(doc, "og:audio:artist")?;
    explicit.extend(meta_values(doc, "music:musician")?.into_iter().filter(|v| !is_link(v)));

    let (title, artists) = match split_title(&raw_title) {
        Some((track, artist)) if explicit.is_empty() => (track, vec![artist]),
        Some((track, artist)) if explicit.iter().any(|a| artist.contains(a.as_str())) => {
            (track, explicit)
        },
        _ => (raw_title.clone(), explicit)
    };

    if artists.is_empty() {
        return Err(StrategyError::MissingField("og:audio:artist"));
    }

    let duration_seconds = meta_first(doc, "music:duration")?
        .and_then(|d| d.parse::<u32>().ok());

    let cover_url = meta_first(doc, "og:image")?.map(|u| absolutize(&u));

    let audio_url = match meta_first(doc, "og:audio")? {
        Some(url) => Some(url),
        None => meta_first(doc, "og:audio:url")?
    }.map(|u| absolutize(&u));

    let album_title = meta_first(doc, "music:album")?
        .filter(|a| !is_link(a));

    Ok( Extracted { title, artists, duration_seconds, cover_url, album_title, audio_url } )
}
