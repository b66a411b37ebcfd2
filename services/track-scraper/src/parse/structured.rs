//!
//! src/parse/structured.rs  Andrew Belles  Oct 16th, 2026
//!
//! Structured data strategy: schema.org MusicRecording embedded as
//! application/ld+json
//!

use scraper::Html;
use serde_json::{Map, Value};

use super::{absolutize, css, non_empty, Extracted, StrategyError};

const RECORDING_TYPE: &str = "MusicRecording";

pub(super) fn extract(doc: &Html) -> Result<Extracted, StrategyError> {
    let scripts = css(r#"script[type="application/ld+json"]"#)?;

    let mut last_err = StrategyError::NotPresent("application/ld+json");
    for script in doc.select(&scripts) {
        let raw: String = script.text().collect();
        let value: Value = match serde_json::from_str(raw.trim()) {
            Ok(v) => v,
            Err(e) => {
                last_err = StrategyError::InvalidJson(e.to_string());
                continue;
            }
        };

        match find_recording(&value) {
            Some(node) => return from_recording(node),
            None => last_err = StrategyError::SchemaMismatch(
                format!("@type {} is not {RECORDING_TYPE}", describe_type(&value))
            )
        }
    }
    Err(last_err)
}

fn is_recording(node: &Map<String, Value>) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == RECORDING_TYPE,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(RECORDING_TYPE)),
        _ => false
    }
}

/// Top-level node, array member, or @graph member typed as a recording
fn find_recording(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Object(map) => {
            if is_recording(map) {
                return Some(map);
            }
            map.get("@graph").and_then(find_recording)
        },
        Value::Array(items) => items.iter().find_map(find_recording),
        _ => None
    }
}

fn describe_type(value: &Value) -> String {
    match value {
        Value::Object(map) => match map.get("@type") {
            Some(Value::String(t)) => t.clone(),
            Some(other) => other.to_string(),
            None => "<none>".to_string()
        },
        Value::Array(_) => "<array>".to_string(),
        _ => "<scalar>".to_string()
    }
}

fn from_recording(node: &Map<String, Value>) -> Result<Extracted, StrategyError> {
    let title = match node.get("name") {
        None | Some(Value::Null) => return Err(StrategyError::MissingField("name")),
        Some(Value::String(s)) => non_empty(s).ok_or(StrategyError::EmptyField("name"))?,
        Some(_) => return Err(StrategyError::SchemaMismatch("name is not a string".to_string()))
    };

    let artists = node.get("byArtist").map(artist_names).unwrap_or_default();
    if artists.is_empty() {
        return Err(StrategyError::MissingField("byArtist"));
    }

    let duration_seconds = node.get("duration")
        .and_then(Value::as_str)
        .and_then(parse_iso_duration);

    let cover_url = node.get("image")
        .and_then(image_url)
        .or_else(|| node.get("thumbnailUrl").and_then(image_url))
        .map(|u| absolutize(&u));

    let album_title = match node.get("inAlbum") {
        Some(Value::Object(album)) => album.get("name").and_then(Value::as_str).and_then(non_empty),
        Some(Value::Array(albums)) => albums.iter()
            .find_map(|a| a.get("name").and_then(Value::as_str).and_then(non_empty)),
        _ => None
    };

    let audio_url = node.get("audio")
        .and_then(|a| a.get("contentUrl").or(Some(a)))
        .and_then(Value::as_str)
        .and_then(non_empty);

    Ok( Extracted { title, artists, duration_seconds, cover_url, album_title, audio_url } )
}

/// byArtist may be a single object, a list of objects, or plain strings
fn artist_names(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => non_empty(s).into_iter().collect(),
        Value::Object(map) => map.get("name")
            .and_then(Value::as_str)
            .and_then(non_empty)
            .into_iter()
            .collect(),
        Value::Array(items) => items.iter().flat_map(artist_names).collect(),
        _ => Vec::new()
    }
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Object(map) => map.get("url")
            .or_else(|| map.get("contentUrl"))
            .and_then(Value::as_str)
            .and_then(non_empty),
        Value::Array(items) => items.iter().find_map(image_url),
        _ => None
    }
}

/// ISO-8601 duration ("PT3M45S", "PT1H2M30S", "P0DT45S") to whole seconds.
/// Years and months are rejected since they have no fixed length
pub fn parse_iso_duration(raw: &str) -> Option<u32> {
    let rest = raw.trim().strip_prefix('P')?;
    let (date, time) = rest.split_once('T').unwrap_or((rest, ""));

    const DATE_UNITS: [(char, f64); 2] = [('W', 604_800.0), ('D', 86_400.0)];
    const TIME_UNITS: [(char, f64); 3] = [('H', 3_600.0), ('M', 60.0), ('S', 1.0)];

    let mut total = 0.0_f64;
    let mut seen = false;
    for (part, units) in [(date, &DATE_UNITS[..]), (time, &TIME_UNITS[..])] {
        let mut number = String::new();
        for c in part.chars() {
            if c.is_ascii_digit() || c == '.' || c == ',' {
                number.push(if c == ',' { '.' } else { c });
                continue;
            }
            let (_, scale) = units.iter().find(|(unit, _)| *unit == c)?;
            let value: f64 = number.parse().ok()?;
            total += value * scale;
            number.clear();
            seen = true;
        }
        if !number.is_empty() {
            return None;
        }
    }

    if !seen || !total.is_finite() || total > u32::MAX as f64 {
        return None;
    }
    Some(total.floor() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(body: &str) -> Result<Extracted, StrategyError> {
        let html = format!(
            r#"<html><head><script type="application/ld+json">{body}</script></head></html>"#
        );
        extract(&Html::parse_document(&html))
    }

    #[test]
    fn iso_durations() {
        assert_eq!(parse_iso_duration("PT3M45S"), Some(225));
        assert_eq!(parse_iso_duration("PT1H2M30S"), Some(3750));
        assert_eq!(parse_iso_duration("PT45S"), Some(45));
        assert_eq!(parse_iso_duration("PT3M45.7S"), Some(225));
        assert_eq!(parse_iso_duration("P0DT0H4M0S"), Some(240));
        assert_eq!(parse_iso_duration("P1M"), None);
        assert_eq!(parse_iso_duration("PT"), None);
        assert_eq!(parse_iso_duration("3:45"), None);
        assert_eq!(parse_iso_duration("PT3X"), None);
    }

    #[test]
    fn single_artist_object() {
        let got = run(r#"{"@type":"MusicRecording","name":"Группа крови",
            "byArtist":{"@type":"MusicGroup","name":"Кино"},"duration":"PT4M46S"}"#).unwrap();
        assert_eq!(got.title, "Группа крови");
        assert_eq!(got.artists, vec!["Кино"]);
        assert_eq!(got.duration_seconds, Some(286));
    }

    #[test]
    fn graph_container_and_image_object() {
        let got = run(r#"{"@context":"https://schema.org","@graph":[
            {"@type":"WebPage","name":"page"},
            {"@type":["MusicRecording"],"name":"Track","byArtist":"Solo",
             "image":{"@type":"ImageObject","url":"//avatars.yandex.net/c.jpg"}}]}"#).unwrap();
        assert_eq!(got.title, "Track");
        assert_eq!(got.artists, vec!["Solo"]);
        assert_eq!(got.cover_url.as_deref(), Some("https://avatars.yandex.net/c.jpg"));
    }

    #[test]
    fn failure_kinds() {
        let empty = Html::parse_document("<html></html>");
        assert_eq!(extract(&empty), Err(StrategyError::NotPresent("application/ld+json")));

        assert!(matches!(run("{not json"), Err(StrategyError::InvalidJson(_))));
        assert!(matches!(run(r#"{"@type":"MusicAlbum"}"#), Err(StrategyError::SchemaMismatch(_))));
        assert_eq!(
            run(r#"{"@type":"MusicRecording","byArtist":{"name":"A"}}"#),
            Err(StrategyError::MissingField("name"))
        );
        assert_eq!(
            run(r#"{"@type":"MusicRecording","name":"  ","byArtist":{"name":"A"}}"#),
            Err(StrategyError::EmptyField("name"))
        );
        assert_eq!(
            run(r#"{"@type":"MusicRecording","name":"T","byArtist":[]}"#),
            Err(StrategyError::MissingField("byArtist"))
        );
    }

    #[test]
    fn later_block_can_hold_the_recording() {
        let html = r#"<script type="application/ld+json">{"@type":"Organization"}</script>
            <script type="application/ld+json">{"@type":"MusicRecording","name":"T",
                "byArtist":[{"name":"A"},{"name":"B"}]}</script>"#;
        let got = extract(&Html::parse_document(html)).unwrap();
        assert_eq!(got.artists, vec!["A", "B"]);
    }
}
