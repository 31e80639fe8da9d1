//! URL canonicalization and host helpers.
//!
//! Input lists are hand-maintained, so URLs arrive with stray whitespace,
//! missing schemes and mixed-case hosts. Everything that fetches or
//! dispatches on a URL goes through [`canonicalize`] first.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL string.
///
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match Url::parse(trimmed) {
        Ok(url) if !is_host_port(&url, trimmed) => url,
        _ if trimmed.contains("://") => Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?,
        _ => Url::parse(&format!("https://{trimmed}")).map_err(|e| UrlError::InvalidUrl(e.to_string()))?,
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// `example.com:8080/x` parses with `example.com` as its scheme; a digit
/// after the colon marks it as a schemeless host and port instead.
fn is_host_port(url: &Url, input: &str) -> bool {
    input
        .get(url.scheme().len() + 1..)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

/// Lowercased host of `input`, or `None` if it does not parse as a web URL.
pub fn host_of(input: &str) -> Option<String> {
    canonicalize(input).ok()?.host_str().map(str::to_string)
}

/// `host` equals `domain` or is a subdomain of it.
pub fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.strip_suffix(domain).is_some_and(|prefix| prefix.ends_with('.'))
}

/// Host with a leading `www.` removed.
pub fn bare_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
