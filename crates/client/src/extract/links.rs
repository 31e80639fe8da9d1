//! Link harvesting and company-website detection.

use std::collections::HashSet;

use url::Url;

use super::cascade::PageContext;
use super::document::Document;
use crate::fetch::{bare_host, host_matches};

/// Social and professional-network domains. A link to one of these is a
/// profile, never a company's own site.
pub const SOCIAL_DOMAINS: &[&str] = &[
    "linkedin.com",
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "youtube.com",
    "tiktok.com",
];

pub fn is_social_host(host: &str) -> bool {
    SOCIAL_DOMAINS.iter().any(|domain| host_matches(host, domain))
}

/// Resolve an `href` against the page URL, keeping only web links.
fn resolve_web(base: &Url, href: &str) -> Option<Url> {
    let url = base.join(href.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Every distinct web link on the page, resolved, in document order.
pub fn web_links(doc: &Document, base: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    doc.attrs("a[href]", "href")
        .iter()
        .filter_map(|href| resolve_web(base, href))
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

fn is_external_site(url: &Url, page_host: &str) -> bool {
    match url.host_str() {
        Some(host) => !is_social_host(host) && bare_host(host) != bare_host(page_host),
        None => false,
    }
}

/// The company's own website.
///
/// Links explicitly marked as a website come first; failing those, the
/// first link that leaves both the page's host and the social networks.
/// Relative links resolve onto the page's host and so never qualify.
pub fn company_website(cx: &PageContext<'_>) -> Option<String> {
    const MARKED: &[&str] = &[
        ".company-website[href]",
        ".company-website a[href]",
        ".website[href]",
        ".website a[href]",
    ];

    let marked = MARKED
        .iter()
        .flat_map(|css| cx.doc.attrs(css, "href"))
        .filter_map(|href| resolve_web(cx.final_url, &href))
        .find(|url| url.host_str().is_some_and(|host| !is_social_host(host)));
    if let Some(url) = marked {
        return Some(url.to_string());
    }

    let page_host = cx.final_url.host_str().unwrap_or_default();
    web_links(cx.doc, cx.final_url)
        .into_iter()
        .find(|url| is_external_site(url, page_host))
        .map(|url| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::structured::StructuredData;

    fn website(html: &str, page: &str) -> Option<String> {
        let doc = Document::parse(html);
        let structured = StructuredData::new();
        let final_url = Url::parse(page).unwrap();
        company_website(&PageContext { doc: &doc, structured: &structured, final_url: &final_url })
    }

    #[test]
    fn test_is_social_host() {
        assert!(is_social_host("www.linkedin.com"));
        assert!(is_social_host("x.com"));
        assert!(is_social_host("m.facebook.com"));
        assert!(!is_social_host("acme.test"));
        assert!(!is_social_host("box.com"));
    }

    #[test]
    fn test_web_links_resolve_and_dedup() {
        let doc = Document::parse(
            r#"<a href="/about">About</a><a href="https://acme.test/about">Again</a>
               <a href="mailto:a@b.test">Mail</a><a href="javascript:void(0)">JS</a>"#,
        );
        let base = Url::parse("https://acme.test/team/").unwrap();
        let links = web_links(&doc, &base);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://acme.test/about");
    }

    #[test]
    fn test_skips_social_links() {
        let html = r#"
            <a href="https://www.linkedin.com/in/jane">LinkedIn</a>
            <a href="https://twitter.com/jane">Twitter</a>
            <a href="https://www.instagram.com/jane">Instagram</a>
            <a href="https://janedoe.dev">Site</a>"#;
        assert_eq!(website(html, "https://people.test/jane").as_deref(), Some("https://janedoe.dev/"));
    }

    #[test]
    fn test_skips_same_host_and_relative() {
        let html = r#"
            <a href="/contact">Contact</a>
            <a href="https://www.people.test/privacy">Privacy</a>
            <a href="https://acme.test">Acme</a>"#;
        assert_eq!(website(html, "https://people.test/jane").as_deref(), Some("https://acme.test/"));
    }

    #[test]
    fn test_marked_website_wins() {
        let html = r#"
            <a href="https://blog.test">Blog</a>
            <p class="company-website"><a href="/go/acme">acme.test</a></p>"#;
        assert_eq!(website(html, "https://people.test/jane").as_deref(), Some("https://people.test/go/acme"));
    }

    #[test]
    fn test_marked_social_link_ignored() {
        let html = r#"<a class="website" href="https://facebook.com/acme">FB</a>"#;
        assert_eq!(website(html, "https://people.test/jane"), None);
    }
}
