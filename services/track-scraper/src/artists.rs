//!
//! src/artists.rs  Andrew Belles  Oct 16th, 2026
//!
//! Artist name normalization: collapsing an ordered list of names
//! into a single display string
//!

/// Formats artists as "First", "First feat. Second" or
/// "First feat. Second, Third, ...". Returns None for an empty list
pub fn format_artists<S: AsRef<str>>(names: &[S]) -> Option<String> {
    match names {
        [] => None,
        [only] => Some(only.as_ref().to_string()),
        [first, rest @ ..] => {
            let featured = rest.iter()
                .map(|n| n.as_ref())
                .collect::<Vec<_>>()
                .join(", ");
            Some(format!("{} feat. {featured}", first.as_ref()))
        }
    }
}

/// Trims names, drops blanks and repeats while keeping first-seen order
pub fn normalize_artists<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>
{
    let mut out: Vec<String> = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() || out.iter().any(|seen| seen == name) {
            continue;
        }
        out.push(name.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_by_count() {
        assert_eq!(format_artists(&["A"]).as_deref(), Some("A"));
        assert_eq!(format_artists(&["A", "B"]).as_deref(), Some("A feat. B"));
        assert_eq!(format_artists(&["A", "B", "C"]).as_deref(), Some("A feat. B, C"));
        assert_eq!(
            format_artists(&["A", "B", "C", "D"]).as_deref(),
            Some("A feat. B, C, D")
        );
    }

    #[test]
    fn empty_list_has_no_display() {
        let empty: [&str; 0] = [];
        assert_eq!(format_artists(&empty), None);
    }

    #[test]
    fn normalize_keeps_order() {
        let names = normalize_artists(["  Miyagi ", "", "Эндшпиль", "Miyagi"]);
        assert_eq!(names, vec!["Miyagi".to_string(), "Эндшпиль".to_string()]);
    }
}
