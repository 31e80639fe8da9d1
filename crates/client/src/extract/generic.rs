//! Extractor for pages with no known layout.
//!
//! Each field tries structured data first, then selector patterns from the
//! most specific (microdata attributes, dedicated class names) to the most
//! generic (class fragments, bare headings), then a derived fallback from a
//! coarser heading or the page title.

use chrono::{DateTime, Utc};
use dossier_core::record::timestamp;
use dossier_core::{Departments, Error, ProfileRecord};

use super::cascade::{PageContext, Pick, Rule, cascade, collect_texts};
use super::links::company_website;
use super::structured::merge_blocks;
use super::{Extractor, parse_snapshot};
use crate::page::PageSnapshot;

const FIRST_NAME: &[Rule] = &[
    Rule::structured(&["givenName"]),
    Rule::text(r#"[itemprop="givenName"]"#),
    Rule::text(".first-name"),
    Rule::text(r#"[class*="first"]"#),
    Rule::text(".given-name"),
    Rule::text(".fname"),
    Rule::text("h1").pick(Pick::FirstWord),
    Rule::text(".name").pick(Pick::FirstWord),
];

const LAST_NAME: &[Rule] = &[
    Rule::structured(&["familyName"]),
    Rule::text(r#"[itemprop="familyName"]"#),
    Rule::text(".last-name"),
    Rule::text(r#"[class*="last"]"#),
    Rule::text(".family-name"),
    Rule::text(".lname"),
    Rule::text("h1").pick(Pick::RestWords),
    Rule::text(".name").pick(Pick::RestWords),
];

const FULL_NAME: &[Rule] = &[
    Rule::structured(&["name"]),
    Rule::text(r#"[itemprop="name"]"#),
    Rule::text("h1"),
    Rule::text(".full-name"),
    Rule::text(".name"),
    Rule::text(".person-name"),
    Rule::text(".contact-name"),
    Rule::title().pick(Pick::Part(" - ", 0)),
];

const EMAIL: &[Rule] = &[
    Rule::structured(&["email"]).pick(Pick::Email),
    Rule::text(r#"[href^="mailto:"]"#).pick(Pick::Email),
    Rule::text(".email").pick(Pick::Email),
    Rule::text(r#"[class*="email"]"#).pick(Pick::Email),
    Rule::text(r#"[itemprop="email"]"#).pick(Pick::Email),
    Rule::attr(r#"[href^="mailto:"]"#, "href").pick(Pick::Email),
];

const MOBILE_NUMBER: &[Rule] = &[
    Rule::structured(&["telephone"]).pick(Pick::Phone),
    Rule::text(r#"[itemprop="telephone"]"#).pick(Pick::Phone),
    Rule::text(".phone").pick(Pick::Phone),
    Rule::text(".mobile").pick(Pick::Phone),
    Rule::text(r#"[class*="phone"]"#).pick(Pick::Phone),
    Rule::text(r#"[href^="tel:"]"#).pick(Pick::Phone),
    Rule::attr(r#"[href^="tel:"]"#, "href").pick(Pick::Phone),
];

const LINKEDIN_PROFILE: &[Rule] = &[
    Rule::attr(r#"[href*="linkedin.com/in"]"#, "href"),
    Rule::attr(".linkedin", "href"),
    Rule::attr(r#"a[title*="LinkedIn"]"#, "href"),
];

const PHOTO_URL: &[Rule] = &[
    Rule::structured(&["image"]).pick(Pick::Absolute),
    Rule::attr(r#"[itemprop="image"]"#, "src").pick(Pick::Absolute),
    Rule::attr(r#"[itemprop="image"]"#, "content").pick(Pick::Absolute),
    Rule::attr(".profile-photo", "src").pick(Pick::Absolute),
    Rule::attr(".avatar", "src").pick(Pick::Absolute),
    Rule::attr(r#"[class*="photo"]"#, "src").pick(Pick::Absolute),
    Rule::attr(r#"img[alt*="profile"]"#, "src").pick(Pick::Absolute),
    Rule::attr(r#"img[alt*="photo"]"#, "src").pick(Pick::Absolute),
];

const PERSON_ID: &[Rule] = &[
    Rule::attr("[data-person-id]", "data-person-id"),
    Rule::attr("[data-id]", "data-id"),
    Rule::attr("[data-contact-id]", "data-contact-id"),
];

const JOB_TITLE: &[Rule] = &[
    Rule::structured(&["jobTitle"]),
    Rule::text(r#"[itemprop="jobTitle"]"#),
    Rule::text(".job-title"),
    Rule::text(".title"),
    Rule::text(".position"),
    Rule::text(r#"[class*="title"]"#),
    Rule::text(".role"),
    Rule::text(".designation"),
    Rule::text("h2").pick(Pick::Part(" at ", 0)),
];

const HEADLINE: &[Rule] = &[
    Rule::text(".headline"),
    Rule::text(".tagline"),
    Rule::text(".description"),
    Rule::text(r#"[class*="headline"]"#),
    Rule::text(".bio"),
    Rule::text(".summary"),
    Rule::attr(r#"meta[name="description"]"#, "content"),
];

const SENIORITY: &[Rule] = &[
    Rule::text(".seniority"),
    Rule::text(".level"),
    Rule::text(r#"[class*="senior"]"#),
    Rule::text(r#"[class*="level"]"#),
    Rule::text(".rank"),
];

const INDUSTRY: &[Rule] = &[
    Rule::text(".industry"),
    Rule::text(r#"[class*="industry"]"#),
    Rule::text(".sector"),
    Rule::text(".vertical"),
    Rule::attr(r#"meta[name="industry"]"#, "content"),
];

const DEPARTMENT: &[&str] = &[".department", r#"[class*="dept"]"#, ".team", ".division", ".group"];

const COMPANY_NAME: &[Rule] = &[
    Rule::structured(&["worksFor"]),
    Rule::structured(&["employer"]),
    Rule::text(".company-name"),
    Rule::text(".company"),
    Rule::text(r#"[class*="company"]"#),
    Rule::text(".organization"),
    Rule::text(".employer"),
    Rule::text("h2").pick(Pick::Part(" at ", 1)),
];

const COMPANY_ID: &[Rule] = &[
    Rule::attr("[data-company-id]", "data-company-id"),
    Rule::attr("[data-org-id]", "data-org-id"),
    Rule::attr("[data-organization-id]", "data-organization-id"),
];

const COMPANY_WEBSITE: &[Rule] = &[Rule::custom(company_website)];

const COMPANY_LINKEDIN: &[Rule] = &[
    Rule::attr(r#"[href*="linkedin.com/company"]"#, "href"),
    Rule::attr(".company-linkedin", "href"),
    Rule::attr(r#"a[title*="Company LinkedIn"]"#, "href"),
];

const COMPANY_SIZE: &[Rule] = &[
    Rule::text(".company-size"),
    Rule::text(r#"[class*="size"]"#),
    Rule::text(".employees"),
    Rule::text(".employee-count"),
];

const COMPANY_PHONE_NUMBER: &[Rule] = &[
    Rule::text(".company-phone"),
    Rule::text(r#"[class*="company-phone"]"#),
    Rule::text(".office-phone"),
];

const CITY: &[Rule] = &[
    Rule::structured(&["address", "addressLocality"]),
    Rule::text(r#"[itemprop="addressLocality"]"#),
    Rule::text(".city"),
    Rule::text(".locality"),
    Rule::text(r#"[class*="city"]"#),
    Rule::text(".location").pick(Pick::Part(",", 0)),
    Rule::text(".address").pick(Pick::Part(",", 0)),
];

const STATE: &[Rule] = &[
    Rule::structured(&["address", "addressRegion"]),
    Rule::text(r#"[itemprop="addressRegion"]"#),
    Rule::text(".state"),
    Rule::text(".region"),
    Rule::text(r#"[class*="state"]"#),
    Rule::text(".location").pick(Pick::Part(",", 1)),
    Rule::text(".address").pick(Pick::Part(",", 1)),
];

const COUNTRY: &[Rule] = &[
    Rule::structured(&["address", "addressCountry"]),
    Rule::text(r#"[itemprop="addressCountry"]"#),
    Rule::text(".country"),
    Rule::text(r#"[class*="country"]"#),
    Rule::text(".location").pick(Pick::LastPart),
    Rule::text(".address").pick(Pick::LastPart),
];

const COMPANY_LOCATION: &str = r#"[class*="company-location"]"#;

const COMPANY_CITY: &[Rule] = &[
    Rule::text(".company-city"),
    Rule::text(COMPANY_LOCATION).pick(Pick::Part(",", 0)),
    Rule::text(".office-city"),
];

const COMPANY_STATE: &[Rule] = &[
    Rule::text(".company-state"),
    Rule::text(COMPANY_LOCATION).pick(Pick::Part(",", 1)),
    Rule::text(".office-state"),
];

const COMPANY_COUNTRY: &[Rule] = &[
    Rule::text(".company-country"),
    Rule::text(COMPANY_LOCATION).pick(Pick::LastPart),
    Rule::text(".office-country"),
];

/// Structured data, then selector cascades, then derived fallbacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericExtractor;

impl Extractor for GenericExtractor {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn extract(&self, page: &PageSnapshot, scraped_at: DateTime<Utc>) -> Result<ProfileRecord, Error> {
        let doc = parse_snapshot(page)?;
        let structured = merge_blocks(doc.json_ld_blocks());
        let cx = PageContext { doc: &doc, structured: &structured, final_url: &page.final_url };

        Ok(ProfileRecord {
            first_name: cascade(&cx, FIRST_NAME),
            last_name: cascade(&cx, LAST_NAME),
            full_name: cascade(&cx, FULL_NAME),
            person_id: cascade(&cx, PERSON_ID),
            email: cascade(&cx, EMAIL),
            mobile_number: cascade(&cx, MOBILE_NUMBER),
            linkedin_profile: cascade(&cx, LINKEDIN_PROFILE),
            photo_url: cascade(&cx, PHOTO_URL),
            job_title: cascade(&cx, JOB_TITLE),
            headline: cascade(&cx, HEADLINE),
            seniority: cascade(&cx, SENIORITY),
            industry: cascade(&cx, INDUSTRY),
            department: Departments::from_values(collect_texts(&cx, DEPARTMENT)),
            company_name: cascade(&cx, COMPANY_NAME),
            company_id: cascade(&cx, COMPANY_ID),
            company_website: cascade(&cx, COMPANY_WEBSITE),
            company_linkedin: cascade(&cx, COMPANY_LINKEDIN),
            company_size: cascade(&cx, COMPANY_SIZE),
            company_phone_number: cascade(&cx, COMPANY_PHONE_NUMBER),
            city: cascade(&cx, CITY),
            state: cascade(&cx, STATE),
            country: cascade(&cx, COUNTRY),
            company_city: cascade(&cx, COMPANY_CITY),
            company_state: cascade(&cx, COMPANY_STATE),
            company_country: cascade(&cx, COMPANY_COUNTRY),
            url: page.final_url.to_string(),
            scraped_at: timestamp(&scraped_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use url::Url;

    fn snapshot(html: &str) -> PageSnapshot {
        PageSnapshot {
            url: "https://people.test/jane".into(),
            final_url: Url::parse("https://people.test/team/jane").unwrap(),
            html: html.into(),
            fetch_ms: 12,
        }
    }

    fn extract(html: &str) -> ProfileRecord {
        let at = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
        GenericExtractor.extract(&snapshot(html), at).unwrap()
    }

    #[test]
    fn test_microdata_profile() {
        let record = extract(
            r#"<html><head><title>Jane Doe - People</title></head><body>
                <div data-person-id="p-42">
                  <span itemprop="givenName">Jane</span>
                  <span itemprop="familyName">Doe</span>
                  <span itemprop="jobTitle">Head of Platform</span>
                  <a href="mailto:jane@acme.test">jane@acme.test</a>
                  <a href="tel:+1-555-0100">Call</a>
                  <a href="https://www.linkedin.com/in/janedoe">LinkedIn</a>
                  <a href="https://www.linkedin.com/company/acme">Acme on LinkedIn</a>
                  <a href="https://acme.test">Acme</a>
                  <p class="location">Austin, TX, USA</p>
                  <span class="department">Engineering</span>
                  <span class="department">Platform</span>
                  <span class="department">Ignored</span>
                  <img class="avatar" src="/img/jane.jpg">
                </div>
            </body></html>"#,
        );

        assert_eq!(record.first_name, "Jane");
        assert_eq!(record.last_name, "Doe");
        assert_eq!(record.full_name, "Jane Doe");
        assert_eq!(record.person_id, "p-42");
        assert_eq!(record.job_title, "Head of Platform");
        assert_eq!(record.email, "jane@acme.test");
        assert_eq!(record.mobile_number, "+1-555-0100");
        assert_eq!(record.linkedin_profile, "https://www.linkedin.com/in/janedoe");
        assert_eq!(record.company_linkedin, "https://www.linkedin.com/company/acme");
        assert_eq!(record.company_website, "https://acme.test/");
        assert_eq!(record.photo_url, "https://people.test/img/jane.jpg");
        assert_eq!((record.city.as_str(), record.state.as_str(), record.country.as_str()), ("Austin", "TX", "USA"));
        assert_eq!(&record.department[0], "Engineering");
        assert_eq!(&record.department[1], "Platform");
        assert_eq!(record.url, "https://people.test/team/jane");
        assert_eq!(record.scraped_at, "2025-01-20T00:00:00.000Z");
    }

    #[test]
    fn test_structured_data_wins_and_malformed_block_is_skipped() {
        let record = extract(
            r#"<html><head>
                <script type="application/ld+json">{ not json </script>
                <script type="application/ld+json">{
                    "@context": "https://schema.org",
                    "@type": "Person",
                    "name": "Jane Mary Doe",
                    "givenName": "Jane",
                    "familyName": "Mary Doe",
                    "email": "mailto:jane@acme.test",
                    "jobTitle": "CTO",
                    "worksFor": {"@type": "Organization", "name": "Acme"},
                    "address": {"addressLocality": "Austin", "addressRegion": "TX", "addressCountry": "US"}
                }</script>
            </head><body><h1>Somebody Else</h1></body></html>"#,
        );

        assert_eq!(record.full_name, "Jane Mary Doe");
        assert_eq!(record.first_name, "Jane");
        assert_eq!(record.last_name, "Mary Doe");
        assert_eq!(record.email, "jane@acme.test");
        assert_eq!(record.job_title, "CTO");
        assert_eq!(record.company_name, "Acme");
        assert_eq!((record.city.as_str(), record.state.as_str(), record.country.as_str()), ("Austin", "TX", "US"));
    }

    #[test]
    fn test_derived_fallbacks() {
        let record = extract(
            r#"<html><head><title>Jane Mary Doe - Speakers - DevConf</title></head>
               <body><h2>Staff Engineer at Acme</h2></body></html>"#,
        );

        assert_eq!(record.full_name, "Jane Mary Doe");
        assert_eq!(record.job_title, "Staff Engineer");
        assert_eq!(record.company_name, "Acme");
    }

    #[test]
    fn test_bare_page_is_all_sentinels() {
        let record = extract("<html><body><p>Nothing to see.</p></body></html>");
        let expected = ProfileRecord {
            url: "https://people.test/team/jane".into(),
            scraped_at: "2025-01-20T00:00:00.000Z".into(),
            ..ProfileRecord::default()
        };
        assert_eq!(record, expected);
    }

    #[test]
    fn test_company_location_parts() {
        let record = extract(r#"<div class="company-location">Seattle, WA, United States</div>"#);
        assert_eq!(record.company_city, "Seattle");
        assert_eq!(record.company_state, "WA");
        assert_eq!(record.company_country, "United States");
    }

    #[test]
    fn test_dedicated_company_location_fields_read_whole() {
        let record = extract(
            r#"<div class="company-city">Washington, D.C.</div>
               <div class="company-state">Maryland</div>
               <div class="company-country">Korea, Republic of</div>
               <div class="company-location">Seattle, WA, United States</div>"#,
        );
        assert_eq!(record.company_city, "Washington, D.C.");
        assert_eq!(record.company_state, "Maryland");
        assert_eq!(record.company_country, "Korea, Republic of");
    }

    #[test]
    fn test_meta_fallbacks() {
        let record = extract(
            r#"<html><head>
                <meta name="description" content="Builds storage engines.">
                <meta name="industry" content="Software">
               </head><body></body></html>"#,
        );
        assert_eq!(record.headline, "Builds storage engines.");
        assert_eq!(record.industry, "Software");
    }

    #[test]
    fn test_empty_document_fails() {
        let at = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
        let err = GenericExtractor.extract(&snapshot("   "), at).unwrap_err();
        assert!(matches!(err, Error::ExtractFailed(_)));
    }
}
