use crate::error::LinkError;
use crate::scope::{Origin, is_crawlable_scheme, strip_fragment};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::trace;
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector is valid"));

/// Raw `href` values of every anchor in the document, in document order.
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Resolves `href` against the page it was found on and drops the fragment.
pub fn resolve_link(page: &Url, href: &str) -> Result<Url, LinkError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(LinkError::Empty);
    }

    let resolved = page.join(href)?;

    if !is_crawlable_scheme(resolved.scheme()) {
        return Err(LinkError::UnsupportedScheme(resolved.scheme().to_string()));
    }
    if resolved.host_str().is_none_or(str::is_empty) {
        return Err(LinkError::MissingHost);
    }

    Ok(strip_fragment(resolved))
}

/// Resolves `href` and keeps it only if it stays on `origin`.
pub fn resolve_in_scope(page: &Url, href: &str, origin: &Origin) -> Result<Url, LinkError> {
    let url = resolve_link(page, href)?;
    if origin.contains(&url) {
        Ok(url)
    } else {
        Err(LinkError::OffOrigin)
    }
}

/// In-scope links of an HTML page, deduplicated, in first-seen order.
pub fn same_origin_links(html: &str, page: &Url, origin: &Origin) -> Vec<Url> {
    let mut links: Vec<Url> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for href in extract_hrefs(html) {
        match resolve_in_scope(page, &href, origin) {
            Ok(url) => {
                if seen.insert(url.as_str().to_string()) {
                    links.push(url);
                }
            }
            Err(e) => trace!("Skipping href {:?} on {}: {}", href, page, e),
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://example.com/blog/post").unwrap()
    }

    fn origin() -> Origin {
        Origin::of(&page()).unwrap()
    }

    #[test]
    fn test_extract_hrefs_in_document_order() {
        let html = r#"<html><body>
            <a href="/one">1</a>
            <a name="anchor-without-href">x</a>
            <p><a href="two">2</a></p>
            <link href="/style.css" rel="stylesheet">
        </body></html>"#;
        assert_eq!(extract_hrefs(html), vec!["/one", "two"]);
    }

    #[test]
    fn test_extract_hrefs_tolerates_broken_markup() {
        // The parser reopens the unclosed anchor inside the div
        let html = r#"<a href="/ok">ok<div><a href='/also-ok'>unclosed"#;
        assert_eq!(extract_hrefs(html), vec!["/ok", "/ok", "/also-ok"]);

        let links: Vec<String> = same_origin_links(html, &page(), &origin())
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/ok".to_string(),
                "https://example.com/also-ok".to_string(),
            ]
        );
    }

    #[test]
    fn test_resolve_relative_link() {
        let url = resolve_link(&page(), "other").unwrap();
        assert_eq!(url.as_str(), "https://example.com/blog/other");
    }

    #[test]
    fn test_resolve_root_relative_link() {
        let url = resolve_link(&page(), "/about").unwrap();
        assert_eq!(url.as_str(), "https://example.com/about");
    }

    #[test]
    fn test_resolve_strips_fragment() {
        let url = resolve_link(&page(), "https://example.com/about#team").unwrap();
        assert_eq!(url.as_str(), "https://example.com/about");
    }

    #[test]
    fn test_pure_fragment_resolves_to_page() {
        let url = resolve_link(&page(), "#comments").unwrap();
        assert_eq!(url, page());
    }

    #[test]
    fn test_resolve_keeps_query() {
        let url = resolve_link(&page(), "/search?q=rust&page=2").unwrap();
        assert_eq!(url.as_str(), "https://example.com/search?q=rust&page=2");
    }

    #[test]
    fn test_skip_non_http_schemes() {
        for href in [
            "mailto:test@example.com",
            "javascript:void(0)",
            "tel:+15551234",
            "data:text/html,hi",
            "ftp://example.com/file",
        ] {
            assert!(
                matches!(
                    resolve_link(&page(), href),
                    Err(LinkError::UnsupportedScheme(_))
                ),
                "{} should be rejected",
                href
            );
        }
    }

    #[test]
    fn test_skip_empty_href() {
        assert_eq!(resolve_link(&page(), "   "), Err(LinkError::Empty));
    }

    #[test]
    fn test_skip_malformed_href() {
        assert!(matches!(
            resolve_link(&page(), "http://[::1"),
            Err(LinkError::Malformed(_))
        ));
    }

    #[test]
    fn test_off_origin_link() {
        assert_eq!(
            resolve_in_scope(&page(), "https://other.com/", &origin()),
            Err(LinkError::OffOrigin)
        );
    }

    #[test]
    fn test_same_origin_links_filters_and_dedups() {
        let html = r#"<html><body>
            <a href="/about">About</a>
            <a href="https://example.com/about#team">Team</a>
            <a href="https://other.com/">Elsewhere</a>
            <a href="mailto:hi@example.com">Mail</a>
            <a href="http://[::1">Broken</a>
            <a href="contact">Contact</a>
        </body></html>"#;

        let links: Vec<String> = same_origin_links(html, &page(), &origin())
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(
            links,
            vec![
                "https://example.com/about".to_string(),
                "https://example.com/blog/contact".to_string(),
            ]
        );
    }

    #[test]
    fn test_same_origin_links_many_repeated_anchors() {
        let html: String = (0..5000)
            .map(|i| format!(r#"<a href="/tag/{}">t</a>"#, i % 10))
            .collect();

        let links = same_origin_links(&html, &page(), &origin());

        assert_eq!(links.len(), 10);
        assert_eq!(links[0].as_str(), "https://example.com/tag/0");
        assert_eq!(links[9].as_str(), "https://example.com/tag/9");
    }
}
