//! Page acquisition and profile extraction for dossier.
//!
//! This crate provides the page fetcher boundary (headless browser and
//! plain HTTP), URL canonicalization, and the field-extraction engine that
//! turns a page snapshot into a [`dossier_core::ProfileRecord`].

pub mod extract;
pub mod fetch;
pub mod page;
#[cfg(feature = "render")]
pub mod render;

pub use extract::{
    Document, Extractor, ExtractorVariant, GenericExtractor, LinkedInExtractor, Site, extract_profile,
    select_extractor,
};
pub use fetch::{FetchClient, FetchConfig, canonicalize};
pub use page::{FetchOptions, PageFetcher, PageSnapshot};
#[cfg(feature = "render")]
pub use render::HeadlessRenderer;
