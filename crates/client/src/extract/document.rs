//! Queryable view over a page snapshot's HTML.
//!
//! Every read is infallible from the caller's side: a selector that fails to
//! parse is logged and behaves as if it matched nothing, so one bad pattern
//! cannot fail a whole record.

use scraper::{ElementRef, Html, Selector};

use super::normalize::clean_text;

/// Parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    fn selector(css: &str) -> Option<Selector> {
        match Selector::parse(css) {
            Ok(selector) => Some(selector),
            Err(e) => {
                tracing::debug!(selector = css, "skipping unparseable selector: {e}");
                None
            }
        }
    }

    fn select<'a>(&'a self, css: &str) -> Vec<ElementRef<'a>> {
        match Self::selector(css) {
            Some(selector) => self.html.select(&selector).collect(),
            None => Vec::new(),
        }
    }

    /// Visible text of an element with whitespace collapsed.
    fn element_text(element: &ElementRef<'_>) -> String {
        clean_text(&element.text().collect::<Vec<_>>().join(" "))
    }

    /// Text of the first element, in document order, whose text is not blank.
    pub fn text(&self, css: &str) -> Option<String> {
        self.select(css)
            .iter()
            .map(Self::element_text)
            .find(|text| !text.is_empty())
    }

    /// Non-blank texts of every matching element, in document order.
    pub fn texts(&self, css: &str) -> Vec<String> {
        self.select(css)
            .iter()
            .map(Self::element_text)
            .filter(|text| !text.is_empty())
            .collect()
    }

    /// Attribute of the first element, in document order, that carries a
    /// non-blank value for it.
    pub fn attr(&self, css: &str, name: &str) -> Option<String> {
        self.select(css)
            .iter()
            .filter_map(|element| element.value().attr(name))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Every non-blank value of `name` on matching elements.
    pub fn attrs(&self, css: &str, name: &str) -> Vec<String> {
        self.select(css)
            .iter()
            .filter_map(|element| element.value().attr(name))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The `<title>` text.
    pub fn title(&self) -> Option<String> {
        self.text("title")
    }

    /// Raw bodies of every `application/ld+json` script.
    pub fn json_ld_blocks(&self) -> Vec<String> {
        self.select(r#"script[type="application/ld+json"]"#)
            .iter()
            .map(|script| script.text().collect::<String>())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head>
            <title>Jane Doe - Acme</title>
            <meta name="description" content="  Engineer at Acme ">
            <script type="application/ld+json">{"@type":"Person"}</script>
          </head>
          <body>
            <h1>
              Jane
              <span>Doe</span>
            </h1>
            <div class="team"> </div>
            <div class="team">Platform</div>
            <div class="team">Infra</div>
            <a href="">empty</a>
            <a href="mailto:jane@acme.test">mail</a>
          </body>
        </html>
    "#;

    #[test]
    fn test_text_collapses_whitespace() {
        let doc = Document::parse(PAGE);
        assert_eq!(doc.text("h1").as_deref(), Some("Jane Doe"));
        assert_eq!(doc.title().as_deref(), Some("Jane Doe - Acme"));
    }

    #[test]
    fn test_text_skips_blank_matches() {
        let doc = Document::parse(PAGE);
        assert_eq!(doc.text(".team").as_deref(), Some("Platform"));
        assert_eq!(doc.texts(".team"), vec!["Platform", "Infra"]);
    }

    #[test]
    fn test_attr_first_non_blank() {
        let doc = Document::parse(PAGE);
        assert_eq!(doc.attr("a[href]", "href").as_deref(), Some("mailto:jane@acme.test"));
        assert_eq!(doc.attr(r#"meta[name="description"]"#, "content").as_deref(), Some("Engineer at Acme"));
        assert_eq!(doc.attr("img", "src"), None);
    }

    #[test]
    fn test_bad_selector_matches_nothing() {
        let doc = Document::parse(PAGE);
        assert_eq!(doc.text("h1[[["), None);
        assert!(doc.texts(":::").is_empty());
    }

    #[test]
    fn test_json_ld_blocks() {
        let doc = Document::parse(PAGE);
        assert_eq!(doc.json_ld_blocks(), vec![r#"{"@type":"Person"}"#]);
    }
}
