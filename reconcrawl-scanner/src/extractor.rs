use scraper::{Html, Selector};
use std::collections::BTreeSet;
use tracing::debug;
use url::Url;

/// Only the first anchors of a page are considered, bounding fan-out.
pub const MAX_LINKS_PER_PAGE: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Absolute URLs in document order, fragment stripped.
    pub links: Vec<String>,
    pub parameters: BTreeSet<String>,
}

pub struct LinkExtractor;

impl LinkExtractor {
    /// Pulls links and parameter names out of a page. Malformed markup
    /// yields whatever html5ever recovers, never an error.
    pub fn extract(base_url: &str, html: &str) -> ExtractedPage {
        let document = Html::parse_document(html);
        let base = Url::parse(base_url).ok();

        let mut page = ExtractedPage {
            links: Vec::new(),
            parameters: query_parameter_names(base_url).into_iter().collect(),
        };

        if let (Some(base), Ok(link_selector)) = (base.as_ref(), Selector::parse("a[href]")) {
            for element in document.select(&link_selector).take(MAX_LINKS_PER_PAGE) {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                if href.trim().is_empty() {
                    continue;
                }
                match resolve_url(base, href) {
                    Some(absolute) => page.links.push(absolute),
                    None => debug!("Could not resolve href {:?} against {}", href, base),
                }
            }
        }

        if let Ok(field_selector) =
            Selector::parse("form input[name], form select[name], form textarea[name]")
        {
            for element in document.select(&field_selector) {
                if let Some(name) = element.value().attr("name")
                    && !name.is_empty()
                {
                    page.parameters.insert(name.to_string());
                }
            }
        }

        page
    }
}

/// Resolves `href` against `base`, dropping the fragment.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let mut resolved = base.join(href.trim()).ok()?;
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

/// Parameter keys of a URL's query string: every `key=value` pair
/// contributes `key`. Pairs without `=` and empty keys are ignored.
pub fn query_parameter_names(url: &str) -> Vec<String> {
    let Ok(parsed) = Url::parse(url) else {
        return Vec::new();
    };
    let Some(query) = parsed.query() else {
        return Vec::new();
    };

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, _)| key)
        .filter(|key| !key.is_empty())
        .map(|key| key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/dir/page";

    #[test]
    fn test_resolves_relative_and_absolute_links() {
        let html = r#"<html><body>
            <a href="/root">Root</a>
            <a href="sibling">Sibling</a>
            <a href="../up">Up</a>
            <a href="https://other.org/x">Other</a>
        </body></html>"#;

        let page = LinkExtractor::extract(BASE, html);
        assert_eq!(
            page.links,
            vec![
                "https://example.com/root",
                "https://example.com/dir/sibling",
                "https://example.com/up",
                "https://other.org/x",
            ]
        );
    }

    #[test]
    fn test_fragments_are_stripped() {
        let html = r##"<a href="/a#top">A</a><a href="#section">Self</a>"##;
        let page = LinkExtractor::extract(BASE, html);
        assert_eq!(
            page.links,
            vec!["https://example.com/a", "https://example.com/dir/page"]
        );
    }

    #[test]
    fn test_link_cap_applies_in_document_order() {
        let mut html = String::from("<html><body>");
        for i in 0..30 {
            html.push_str(&format!(r#"<a href="/p{}">{}</a>"#, i, i));
        }
        html.push_str("</body></html>");

        let page = LinkExtractor::extract(BASE, &html);
        assert_eq!(page.links.len(), MAX_LINKS_PER_PAGE);
        assert_eq!(page.links[0], "https://example.com/p0");
        assert_eq!(page.links[19], "https://example.com/p19");
    }

    #[test]
    fn test_empty_hrefs_are_skipped() {
        let html = r#"<a href="">empty</a><a href="   ">blank</a><a href="/ok">ok</a><a>none</a>"#;
        let page = LinkExtractor::extract(BASE, html);
        assert_eq!(page.links, vec!["https://example.com/ok"]);
    }

    #[test]
    fn test_non_http_hrefs_still_resolve() {
        // Scheme filtering belongs to UrlFilter
        let html = r#"<a href="mailto:a@example.com">mail</a>"#;
        let page = LinkExtractor::extract(BASE, html);
        assert_eq!(page.links, vec!["mailto:a@example.com"]);
    }

    #[test]
    fn test_form_field_names() {
        let html = r#"<form action="/search">
            <input type="text" name="q">
            <input type="hidden" name="page" value="1">
            <select name="sort"><option>asc</option></select>
            <textarea name="comment"></textarea>
            <input type="submit">
            <input name="">
        </form>
        <input name="outside">"#;

        let page = LinkExtractor::extract(BASE, html);
        let expected: BTreeSet<String> = ["q", "page", "sort", "comment"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(page.parameters, expected);
    }

    #[test]
    fn test_base_url_query_contributes_parameters() {
        let page = LinkExtractor::extract("https://example.com/list?id=5&sort=desc", "<p></p>");
        assert!(page.parameters.contains("id"));
        assert!(page.parameters.contains("sort"));
        assert_eq!(page.parameters.len(), 2);
    }

    #[test]
    fn test_query_parameter_names() {
        assert_eq!(
            query_parameter_names("https://example.com/?id=5&sort=desc"),
            vec!["id", "sort"]
        );
        assert_eq!(
            query_parameter_names("https://example.com/?flag&x=1&=orphan"),
            vec!["x"]
        );
        assert!(query_parameter_names("https://example.com/").is_empty());
        assert!(query_parameter_names("not a url").is_empty());
    }

    #[test]
    fn test_malformed_html_never_fails() {
        let html = r#"<html><body><a href="/one">one<div><form><input name="x"<a href="/two""#;
        let page = LinkExtractor::extract(BASE, html);
        assert!(page.links.contains(&"https://example.com/one".to_string()));

        let page = LinkExtractor::extract(BASE, "");
        assert!(page.links.is_empty());
        assert!(page.parameters.is_empty());

        let page = LinkExtractor::extract(BASE, "\u{0}\u{fffd}<<<>>>");
        assert!(page.links.is_empty());
    }

    #[test]
    fn test_unparseable_base_yields_no_links() {
        let page = LinkExtractor::extract("not a url", r#"<a href="/x">x</a>"#);
        assert!(page.links.is_empty());
    }
}
