//! URL list files.
//!
//! One URL per line. Blank lines and lines starting with `#` are skipped;
//! order and duplicates are kept.

use std::io::ErrorKind;
use std::path::Path;

use dossier_core::{ConfigError, Error};

pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and parse a URL list file.
///
/// # Errors
///
/// A missing or unreadable file, or a file with no URLs, is a configuration
/// error.
pub async fn load_url_list(path: &Path) -> Result<Vec<String>, Error> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::Missing {
            field: "urls".into(),
            hint: format!("{} does not exist", path.display()),
        },
        _ => ConfigError::LoadFailed(format!("{}: {e}", path.display())),
    })?;

    let urls = parse_url_list(&text);
    if urls.is_empty() {
        let reason = format!("{} lists no URLs", path.display());
        return Err(ConfigError::Invalid { field: "urls".into(), reason }.into());
    }

    tracing::debug!(path = %path.display(), count = urls.len(), "loaded URL list");
    Ok(urls)
}
