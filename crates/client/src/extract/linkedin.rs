//! Extractor for LinkedIn profile pages.

use chrono::{DateTime, Utc};
use dossier_core::record::timestamp;
use dossier_core::{Error, ProfileRecord};

use super::cascade::{PageContext, Pick, Rule, cascade};
use super::normalize::{Location, split_name};
use super::structured::StructuredData;
use super::{Extractor, parse_snapshot};
use crate::page::PageSnapshot;

const DISPLAY_NAME: &[Rule] = &[Rule::text(".text-heading-xlarge"), Rule::text("h1")];

const HEADLINE: &[Rule] = &[
    Rule::text(".text-body-medium.break-words"),
    Rule::text(".pv-text-details__left-panel h2"),
];

const COMPANY_NAME: &[Rule] = &[
    Rule::text(r#"a[data-field="experience_company_name"]"#),
    Rule::text(".pv-entity__company-summary-info h3"),
];

const PHOTO_URL: &[Rule] = &[
    Rule::attr(".pv-top-card-profile-picture__image", "src").pick(Pick::Absolute),
    Rule::attr(".profile-photo-edit__preview", "src").pick(Pick::Absolute),
];

const INDUSTRY: &[Rule] = &[Rule::text(".text-body-small.t-black--light.mt2")];

const LOCATION: &[Rule] = &[
    Rule::text(".text-body-small.inline.t-black--light.break-words"),
    Rule::text(".pv-text-details__left-panel .t-black--light.t-normal"),
];

/// Profile top-card layout. Fields the layout does not expose stay at the
/// sentinel.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedInExtractor;

impl Extractor for LinkedInExtractor {
    fn name(&self) -> &'static str {
        "linkedin"
    }

    fn extract(&self, page: &PageSnapshot, scraped_at: DateTime<Utc>) -> Result<ProfileRecord, Error> {
        let doc = parse_snapshot(page)?;
        let structured = StructuredData::new();
        let cx = PageContext { doc: &doc, structured: &structured, final_url: &page.final_url };

        let full_name = cascade(&cx, DISPLAY_NAME);
        let (first_name, last_name) = split_name(&full_name);
        let headline = cascade(&cx, HEADLINE);
        let location = Location::parse(&cascade(&cx, LOCATION));

        Ok(ProfileRecord {
            first_name,
            last_name,
            full_name,
            job_title: headline.clone(),
            headline,
            company_name: cascade(&cx, COMPANY_NAME),
            linkedin_profile: page.final_url.to_string(),
            photo_url: cascade(&cx, PHOTO_URL),
            industry: cascade(&cx, INDUSTRY),
            city: location.city,
            state: location.state,
            country: location.country,
            url: page.final_url.to_string(),
            scraped_at: timestamp(&scraped_at),
            ..ProfileRecord::default()
        })
    }
}
