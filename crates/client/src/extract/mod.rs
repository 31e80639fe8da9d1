//! Profile extraction.
//!
//! Turns a [`PageSnapshot`] into a [`ProfileRecord`]. Extraction is a pure
//! function of the snapshot: it never touches the network and never fails
//! for a missing field; unresolved fields are the empty sentinel.
//!
//! ### Pipeline
//! - [`select_extractor`] picks a site-specific extractor or the generic one
//!   from the requested URL's host.
//! - Each field is an ordered cascade of rules ([`cascade`]); the first
//!   non-blank result wins.
//! - The generic extractor consults merged JSON-LD person/organization data
//!   ([`structured`]) before any selector.

pub mod cascade;
pub mod dispatch;
pub mod document;
pub mod generic;
pub mod linkedin;
pub mod links;
pub mod normalize;
pub mod structured;

pub use dispatch::{ExtractorVariant, Site, select_extractor};
pub use document::Document;
pub use generic::GenericExtractor;
pub use linkedin::LinkedInExtractor;
pub use links::{SOCIAL_DOMAINS, company_website, is_social_host};
pub use normalize::{Location, split_name};

use chrono::{DateTime, Utc};
use dossier_core::{Error, ProfileRecord};

use crate::page::PageSnapshot;

/// A field extractor for one family of pages.
pub trait Extractor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Build a record from a snapshot. `scraped_at` becomes the record's
    /// provenance timestamp.
    fn extract(&self, page: &PageSnapshot, scraped_at: DateTime<Utc>) -> Result<ProfileRecord, Error>;
}

/// Parse the snapshot's HTML; a blank document cannot be extracted.
pub(crate) fn parse_snapshot(page: &PageSnapshot) -> Result<Document, Error> {
    if page.html.trim().is_empty() {
        return Err(Error::ExtractFailed(format!("empty document for {}", page.url)));
    }
    Ok(Document::parse(&page.html))
}

/// Dispatch on the requested URL and extract.
pub fn extract_profile(page: &PageSnapshot, scraped_at: DateTime<Utc>) -> Result<ProfileRecord, Error> {
    let extractor = select_extractor(&page.url).extractor();
    tracing::debug!(url = %page.url, extractor = extractor.name(), "extracting profile");
    extractor.extract(page, scraped_at)
}
