//! Fallback cascades.
//!
//! A field is described by an ordered slice of [`Rule`]s. Each rule reads a
//! raw value from one [`Source`] and post-processes it with a [`Pick`]; the
//! first rule producing non-blank text wins. If none does, the field is the
//! empty sentinel.

use url::Url;

use super::document::Document;
use super::normalize::{clean_text, comma_parts};
use super::structured::{StructuredData, lookup};

/// Everything a rule may read.
pub struct PageContext<'a> {
    pub doc: &'a Document,
    pub structured: &'a StructuredData,
    pub final_url: &'a Url,
}

/// Where a rule reads its raw value from.
#[derive(Clone, Copy)]
pub enum Source {
    /// Path into the merged structured data.
    Structured(&'static [&'static str]),
    /// Text of the first matching element.
    Text(&'static str),
    /// Attribute of the first matching element.
    Attr(&'static str, &'static str),
    /// The document title.
    Title,
    Custom(fn(&PageContext<'_>) -> Option<String>),
}

/// Post-processing applied to a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    Whole,
    /// The `n`th piece when split on the delimiter.
    Part(&'static str, usize),
    /// The last comma-separated part.
    LastPart,
    FirstWord,
    /// Every word after the first.
    RestWords,
    /// Drop a `mailto:` scheme and any query; must contain `@`.
    Email,
    /// Drop a `tel:` scheme; must contain a digit.
    Phone,
    /// Resolve against the page URL.
    Absolute,
}

impl Pick {
    fn apply(self, raw: &str, cx: &PageContext<'_>) -> Option<String> {
        let picked = match self {
            Pick::Whole => raw.to_string(),
            Pick::Part(",", index) => comma_parts(raw).get(index)?.to_string(),
            Pick::Part(delim, index) => raw.split(delim).nth(index)?.to_string(),
            Pick::LastPart => comma_parts(raw).last()?.to_string(),
            Pick::FirstWord => raw.split_whitespace().next()?.to_string(),
            Pick::RestWords => raw.split_whitespace().skip(1).collect::<Vec<_>>().join(" "),
            Pick::Email => {
                let addr = strip_scheme(raw, "mailto:");
                let addr = addr.split('?').next().unwrap_or(addr);
                if !addr.contains('@') {
                    return None;
                }
                addr.to_string()
            }
            Pick::Phone => {
                let number = strip_scheme(raw, "tel:");
                if !number.chars().any(|c| c.is_ascii_digit()) {
                    return None;
                }
                number.to_string()
            }
            Pick::Absolute => cx.final_url.join(raw.trim()).ok()?.to_string(),
        };

        let picked = clean_text(&picked);
        (!picked.is_empty()).then_some(picked)
    }
}

fn strip_scheme<'a>(raw: &'a str, scheme: &str) -> &'a str {
    let raw = raw.trim();
    match raw.get(..scheme.len()) {
        Some(head) if head.eq_ignore_ascii_case(scheme) => &raw[scheme.len()..],
        _ => raw,
    }
}

/// One resolution strategy for a field.
#[derive(Clone, Copy)]
pub struct Rule {
    source: Source,
    pick: Pick,
}

impl Rule {
    pub const fn structured(path: &'static [&'static str]) -> Self {
        Self { source: Source::Structured(path), pick: Pick::Whole }
    }

    pub const fn text(css: &'static str) -> Self {
        Self { source: Source::Text(css), pick: Pick::Whole }
    }

    pub const fn attr(css: &'static str, name: &'static str) -> Self {
        Self { source: Source::Attr(css, name), pick: Pick::Whole }
    }

    pub const fn title() -> Self {
        Self { source: Source::Title, pick: Pick::Whole }
    }

    pub const fn custom(f: fn(&PageContext<'_>) -> Option<String>) -> Self {
        Self { source: Source::Custom(f), pick: Pick::Whole }
    }

    pub const fn pick(self, pick: Pick) -> Self {
        Self { source: self.source, pick }
    }

    /// Evaluate this rule alone.
    pub fn resolve(&self, cx: &PageContext<'_>) -> Option<String> {
        let raw = match self.source {
            Source::Structured(path) => lookup(cx.structured, path),
            Source::Text(css) => cx.doc.text(css),
            Source::Attr(css, name) => cx.doc.attr(css, name),
            Source::Title => cx.doc.title(),
            Source::Custom(f) => f(cx),
        }?;
        self.pick.apply(&raw, cx)
    }
}

/// First non-blank result of `rules`, else the empty sentinel.
pub fn cascade(cx: &PageContext<'_>, rules: &[Rule]) -> String {
    rules.iter().find_map(|rule| rule.resolve(cx)).unwrap_or_default()
}

/// Multi-valued cascade: the texts of the first selector that matches
/// anything, in document order.
pub fn collect_texts(cx: &PageContext<'_>, selectors: &[&str]) -> Vec<String> {
    selectors
        .iter()
        .map(|css| cx.doc.texts(css))
        .find(|texts| !texts.is_empty())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::structured::merge_blocks;

    fn with_page<T>(html: &str, f: impl FnOnce(&PageContext<'_>) -> T) -> T {
        let doc = Document::parse(html);
        let structured = merge_blocks(doc.json_ld_blocks());
        let final_url = Url::parse("https://acme.test/people/jane").unwrap();
        f(&PageContext { doc: &doc, structured: &structured, final_url: &final_url })
    }

    #[test]
    fn test_first_non_blank_wins() {
        let html = r#"<h1> </h1><div class="name">Jane Doe</div><div class="full-name">Other</div>"#;
        with_page(html, |cx| {
            let rules = [Rule::text("h1"), Rule::text(".name"), Rule::text(".full-name")];
            assert_eq!(cascade(cx, &rules), "Jane Doe");
        });
    }

    #[test]
    fn test_all_empty_gives_sentinel() {
        with_page("<p>nothing here</p>", |cx| {
            let rules = [Rule::structured(&["email"]), Rule::text(".email"), Rule::attr("a", "href")];
            assert_eq!(cascade(cx, &rules), "");
        });
    }

    #[test]
    fn test_structured_before_selectors() {
        let html = r#"
            <script type="application/ld+json">{"@type":"Person","jobTitle":"CTO"}</script>
            <span class="job-title">Engineer</span>"#;
        with_page(html, |cx| {
            assert_eq!(cascade(cx, &[Rule::structured(&["jobTitle"]), Rule::text(".job-title")]), "CTO");
        });
    }

    #[test]
    fn test_picks() {
        let html = r#"
            <title>Jane Doe - Acme Corp - Team</title>
            <h2>Staff Engineer at Acme</h2>
            <a href="MAILTO:jane@acme.test?subject=hi">Email me</a>
            <a class="tel" href="tel:+1-555-0100">Call</a>
            <img class="avatar" src="/img/jane.png">
            <p class="location">Austin, TX, USA</p>"#;
        with_page(html, |cx| {
            assert_eq!(cascade(cx, &[Rule::title().pick(Pick::Part(" - ", 0))]), "Jane Doe");
            assert_eq!(cascade(cx, &[Rule::text("h2").pick(Pick::Part(" at ", 0))]), "Staff Engineer");
            assert_eq!(cascade(cx, &[Rule::text("h2").pick(Pick::Part(" at ", 1))]), "Acme");
            assert_eq!(cascade(cx, &[Rule::attr(r#"[href^="MAILTO:"]"#, "href").pick(Pick::Email)]), "jane@acme.test");
            assert_eq!(cascade(cx, &[Rule::attr(".tel", "href").pick(Pick::Phone)]), "+1-555-0100");
            assert_eq!(
                cascade(cx, &[Rule::attr(".avatar", "src").pick(Pick::Absolute)]),
                "https://acme.test/img/jane.png"
            );
            assert_eq!(cascade(cx, &[Rule::text(".location").pick(Pick::Part(",", 1))]), "TX");
            assert_eq!(cascade(cx, &[Rule::text(".location").pick(Pick::LastPart)]), "USA");
        });
    }

    #[test]
    fn test_contact_picks_reject_link_labels() {
        let html = r#"<a href="mailto:jane@acme.test">Email me</a><a href="tel:+15550100">Call</a>"#;
        with_page(html, |cx| {
            let email = [
                Rule::text(r#"[href^="mailto:"]"#).pick(Pick::Email),
                Rule::attr(r#"[href^="mailto:"]"#, "href").pick(Pick::Email),
            ];
            assert_eq!(cascade(cx, &email), "jane@acme.test");
            let phone = [
                Rule::text(r#"[href^="tel:"]"#).pick(Pick::Phone),
                Rule::attr(r#"[href^="tel:"]"#, "href").pick(Pick::Phone),
            ];
            assert_eq!(cascade(cx, &phone), "+15550100");
        });
    }

    #[test]
    fn test_missing_part_falls_through() {
        let html = r#"<h2>Engineer</h2><span class="company">Acme</span>"#;
        with_page(html, |cx| {
            let rules = [Rule::text("h2").pick(Pick::Part(" at ", 1)), Rule::text(".company")];
            assert_eq!(cascade(cx, &rules), "Acme");
        });
    }

    #[test]
    fn test_custom_rule() {
        fn host(cx: &PageContext<'_>) -> Option<String> {
            cx.final_url.host_str().map(str::to_string)
        }
        with_page("", |cx| assert_eq!(cascade(cx, &[Rule::custom(host)]), "acme.test"));
    }

    #[test]
    fn test_collect_texts_first_matching_selector() {
        let html = r#"<span class="team">Platform</span><span class="team">Infra</span>
            <span class="division">Ops</span>"#;
        with_page(html, |cx| {
            assert_eq!(collect_texts(cx, &[".department", ".team", ".division"]), vec!["Platform", "Infra"]);
            assert!(collect_texts(cx, &[".department"]).is_empty());
        });
    }
}
