//! Choosing an extractor for a URL.
//!
//! Known sites are matched on the lowercased host, in table order; anything
//! else goes to the generic extractor. Adding a site means one [`Site`]
//! variant, one extractor and one row in `KNOWN_SITES`.

use super::Extractor;
use super::generic::GenericExtractor;
use super::linkedin::LinkedInExtractor;
use crate::fetch::{host_matches, host_of};

/// Sites with a dedicated extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    LinkedIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorVariant {
    Specialized(Site),
    Generic,
}

type HostPredicate = fn(&str) -> bool;

fn is_linkedin(host: &str) -> bool {
    host_matches(host, "linkedin.com")
}

/// Host predicates must not overlap.
const KNOWN_SITES: &[(HostPredicate, Site)] = &[(is_linkedin, Site::LinkedIn)];

/// Pick the extractor variant for `url`. Never fails: URLs that do not
/// parse, or whose host is unknown, get the generic extractor.
pub fn select_extractor(url: &str) -> ExtractorVariant {
    let Some(host) = host_of(url) else {
        return ExtractorVariant::Generic;
    };

    KNOWN_SITES
        .iter()
        .find(|(matches, _)| matches(&host))
        .map(|(_, site)| ExtractorVariant::Specialized(*site))
        .unwrap_or(ExtractorVariant::Generic)
}

static GENERIC: GenericExtractor = GenericExtractor;
static LINKEDIN: LinkedInExtractor = LinkedInExtractor;

impl ExtractorVariant {
    pub fn extractor(self) -> &'static dyn Extractor {
        match self {
            ExtractorVariant::Specialized(Site::LinkedIn) => &LINKEDIN,
            ExtractorVariant::Generic => &GENERIC,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linkedin_hosts() {
        for url in [
            "https://www.linkedin.com/in/janedoe",
            "https://LINKEDIN.com/in/janedoe",
            "uk.linkedin.com/in/janedoe",
        ] {
            assert_eq!(select_extractor(url), ExtractorVariant::Specialized(Site::LinkedIn), "{url}");
        }
    }

    #[test]
    fn test_everything_else_is_generic() {
        for url in [
            "https://acme.test/team/jane",
            "https://notlinkedin.com/in/jane",
            "https://example.com/?ref=linkedin.com",
            "",
            "::::",
            "ftp://linkedin.com/in/x",
            "mailto:jane@linkedin.com",
        ] {
            assert_eq!(select_extractor(url), ExtractorVariant::Generic, "{url}");
        }
    }

    #[test]
    fn test_variant_names() {
        assert_eq!(ExtractorVariant::Generic.extractor().name(), "generic");
        assert_eq!(ExtractorVariant::Specialized(Site::LinkedIn).extractor().name(), "linkedin");
    }
}
