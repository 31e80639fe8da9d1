//! Text normalization shared by all extractors.

/// Collapse runs of whitespace (including non-breaking spaces) to single
/// spaces and trim the ends.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a display name into `(first, rest)`.
///
/// The first whitespace token is the first name; every remaining token,
/// joined by single spaces, is the last name.
pub fn split_name(full: &str) -> (String, String) {
    let mut tokens = full.split_whitespace();
    let first = tokens.next().unwrap_or_default().to_string();
    let rest = tokens.collect::<Vec<_>>().join(" ");
    (first, rest)
}

/// Comma-separated parts, each trimmed. Empty parts are kept so positions
/// stay stable.
pub fn comma_parts(text: &str) -> Vec<&str> {
    text.split(',').map(str::trim).collect()
}

/// A person or company location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub state: String,
    pub country: String,
}

impl Location {
    /// Positional parse: `city, state, country`.
    ///
    /// With only two parts the second is used for both state and country.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::default();
        }

        let parts = comma_parts(text);
        let at = |i: usize| parts.get(i).copied().unwrap_or_default();
        let country = if at(2).is_empty() { at(1) } else { at(2) };

        Self { city: at(0).to_string(), state: at(1).to_string(), country: country.to_string() }
    }
}
