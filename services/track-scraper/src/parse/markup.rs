//!
//! src/parse/markup.rs  Andrew Belles  Oct 16th, 2026
//!
//! Markup heuristic strategy: css selectors over the rendered page,
//! several per field since the site's class names drift between redesigns
//!

use scraper::Html;

use super::{absolutize, element_text, non_empty, Extracted, StrategyError};

const TITLE_SELECTORS: &[&str] = &[
    "h1.track__title",
    ".d-track__title",
    "[data-testid=\"track-title\"]",
    ".track-heading__title",
    "h1.page-track__title",
];

const ARTIST_SELECTORS: &[&str] = &[
    ".d-track__artists a",
    ".track__artists a",
    "[data-testid=\"track-artist\"]",
    ".page-track__artists a",
    "a.deco-link.track__artists-item",
];

const DURATION_SELECTORS: &[&str] = &[
    ".d-track__duration",
    ".track__duration",
    "[data-testid=\"track-duration\"]",
    ".page-track__duration",
];

const ALBUM_SELECTORS: &[&str] = &[
    ".d-track__album a",
    ".track__album a",
    "[data-testid=\"track-album\"]",
];

const COVER_SELECTORS: &[&str] = &[
    "img.entity-cover__image",
    "[data-testid=\"track-cover\"] img",
    ".d-track__cover img",
    ".page-track__cover img",
];

/// Text of the first element matched by the first selector that yields any
fn first_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter()
        .filter_map(|s| scraper::Selector::parse(s).ok())
        .find_map(|sel| {
            doc.select(&sel)
                .map(|el| element_text(&el))
                .find_map(|t| non_empty(&t))
        })
}

/// Texts of all elements matched by the first selector that yields any
fn all_texts(doc: &Html, selectors: &[&str]) -> Vec<String> {
    for sel in selectors.iter().filter_map(|s| scraper::Selector::parse(s).ok()) {
        let texts: Vec<String> = doc.select(&sel)
            .filter_map(|el| non_empty(&element_text(&el)))
            .collect();
        if !texts.is_empty() {
            return texts;
        }
    }
    Vec::new()
}

fn first_image(doc: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter()
        .filter_map(|s| scraper::Selector::parse(s).ok())
        .find_map(|sel| {
            doc.select(&sel).find_map(|el| {
                let img = el.value();
                img.attr("src")
                    .and_then(non_empty)
                    .or_else(|| img.attr("srcset")
                        .and_then(|set| set.split_whitespace().next())
                        .and_then(non_empty))
            })
        })
        .map(|u| absolutize(&u))
}

/// "3:45" or "1:02:30" to seconds
pub fn parse_clock_duration(raw: &str) -> Option<u32> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }
    let mut total: u32 = 0;
    for (i, part) in parts.iter().enumerate() {
        let value: u32 = part.trim().parse().ok()?;
        if i > 0 && value >= 60 {
            return None;
        }
        total = total.checked_mul(60)?.checked_add(value)?;
    }
    Some(total)
}

pub(super) fn extract(doc: &Html) -> Result<Extracted, StrategyError> {
    let title = first_text(doc, TITLE_SELECTORS)
        .ok_or(StrategyError::MissingField("title"))?;

    let artists = all_texts(doc, ARTIST_SELECTORS);
    if artists.is_empty() {
        return Err(StrategyError::MissingField("artist"));
    }

    let duration_seconds = first_text(doc, DURATION_SELECTORS)
        .and_then(|d| parse_clock_duration(&d));
    let album_title = first_text(doc, ALBUM_SELECTORS);
    let cover_url = first_image(doc, COVER_SELECTORS);

    Ok( Extracted { title, artists, duration_seconds, cover_url, album_title, audio_url: None } )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_durations() {
        assert_eq!(parse_clock_duration("3:45"), Some(225));
        assert_eq!(parse_clock_duration(" 1:02:30 "), Some(3750));
        assert_eq!(parse_clock_duration("0:07"), Some(7));
        assert_eq!(parse_clock_duration("3:75"), None);
        assert_eq!(parse_clock_duration("—"), None);
        assert_eq!(parse_clock_duration("225"), None);
    }

    #[test]
    fn falls_back_across_selectors() {
        let html = r#"<html><body>
            <div class="page-track">
              <span data-testid="track-title">  Новый
                 трек </span>
              <div class="page-track__artists"><a>Miyagi</a>, <a>Эндшпиль</a></div>
              <span class="track__duration">3:05</span>
              <div class="track__album"><a>Hajime</a></div>
              <img class="entity-cover__image" srcset="//avatars.yandex.net/200x200 1x, //x 2x">
            </div></body></html>"#;
        let got = extract(&Html::parse_document(html)).unwrap();
        assert_eq!(got.title, "Новый трек");
        assert_eq!(got.artists, vec!["Miyagi", "Эндшпиль"]);
        assert_eq!(got.duration_seconds, Some(185));
        assert_eq!(got.album_title.as_deref(), Some("Hajime"));
        assert_eq!(got.cover_url.as_deref(), Some("https://avatars.yandex.net/200x200"));
    }

    #[test]
    fn blank_first_match_does_not_stop_search() {
        let html = r#"<h1 class="track__title">   </h1>
            <div class="d-track__title">Real</div>
            <div class="track__artists"><a>X</a></div>"#;
        let got = extract(&Html::parse_document(html)).unwrap();
        assert_eq!(got.title, "Real");
    }

    #[test]
    fn missing_title_or_artist_fails() {
        let no_title = Html::parse_document(r#"<div class="track__artists"><a>X</a></div>"#);
        assert_eq!(extract(&no_title), Err(StrategyError::MissingField("title")));

        let no_artist = Html::parse_document(r#"<h1 class="track__title">T</h1>"#);
        assert_eq!(extract(&no_artist), Err(StrategyError::MissingField("artist")));
    }
}
