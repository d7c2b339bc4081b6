//! HTML parsing: link extraction, titles and visible text
//!
//! Links are reduced to site-relative paths so the crawl frontier and the
//! pages table both work in one canonical form.

use crate::url::is_non_html_extension;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts same-site links from a page as site-relative paths
///
/// Anchors are resolved against the page URL, then kept only when the
/// absolute form starts with the site URL (compared case-insensitively).
/// Anchor hrefs containing `#` and links to non-HTML resources are dropped.
///
/// # Arguments
///
/// * `html` - The page body
/// * `page_url` - Absolute URL of the page the body came from
/// * `site_url` - Site root (scheme + host, no trailing slash)
///
/// # Returns
///
/// Deduplicated site-relative paths, each starting with `/`
pub fn extract_links(html: &str, page_url: &Url, site_url: &str) -> HashSet<String> {
    let document = Html::parse_document(html);
    let mut links = HashSet::new();

    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return links,
    };

    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };

        if href.is_empty() || href.contains('#') {
            continue;
        }

        let absolute = match page_url.join(href) {
            Ok(url) => url.to_string(),
            Err(_) => continue,
        };

        if is_non_html_extension(&absolute) {
            continue;
        }

        if let Some(path) = site_relative_path(&absolute, site_url) {
            links.insert(path);
        }
    }

    links
}

/// Strips the site prefix off an absolute URL, keeping only in-site paths
fn site_relative_path(absolute: &str, site_url: &str) -> Option<String> {
    if absolute.len() < site_url.len() {
        return None;
    }
    let (prefix, rest) = absolute.split_at(site_url.len());
    if !prefix.eq_ignore_ascii_case(site_url) {
        return None;
    }
    if !rest.starts_with('/') {
        return None;
    }
    Some(rest.to_string())
}

/// Extracts the page title, or an empty string when there is none
pub fn extract_title(html: &str) -> String {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("title") {
        Ok(s) => s,
        Err(_) => return String::new(),
    };

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Extracts the visible text of a page with whitespace collapsed
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let fragments: Vec<&str> = document
        .root_element()
        .text()
        .flat_map(|chunk| chunk.split_whitespace())
        .collect();
    fragments.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://www.example.ru/news").unwrap()
    }

    const SITE: &str = "https://www.example.ru";

    #[test]
    fn test_extract_relative_link() {
        let html = r#"<html><body><a href="/about">About</a></body></html>"#;
        let links = extract_links(html, &page_url(), SITE);
        assert_eq!(links.len(), 1);
        assert!(links.contains("/about"));
    }

    #[test]
    fn test_extract_absolute_same_site_link() {
        let html = r#"<html><body><a href="https://www.example.ru/contacts">C</a></body></html>"#;
        let links = extract_links(html, &page_url(), SITE);
        assert!(links.contains("/contacts"));
    }

    #[test]
    fn test_site_prefix_match_is_case_insensitive() {
        let html = r#"<html><body><a href="https://WWW.EXAMPLE.RU/about">A</a></body></html>"#;
        let links = extract_links(html, &page_url(), SITE);
        assert!(links.contains("/about"));
    }

    #[test]
    fn test_skip_foreign_site_link() {
        let html = r#"<html><body><a href="https://other.ru/page">Other</a></body></html>"#;
        let links = extract_links(html, &page_url(), SITE);
        assert!(links.is_empty());
    }

    #[test]
    fn test_skip_host_prefix_lookalike() {
        let html =
            r#"<html><body><a href="https://www.example.ru.evil.com/x">Evil</a></body></html>"#;
        let links = extract_links(html, &page_url(), SITE);
        assert!(links.is_empty());
    }

    #[test]
    fn test_skip_fragment_links() {
        let html = r##"<html><body>
            <a href="#top">Top</a>
            <a href="/about#team">Team</a>
        </body></html>"##;
        let links = extract_links(html, &page_url(), SITE);
        assert!(links.is_empty());
    }

    #[test]
    fn test_skip_non_html_resources() {
        let html = r#"<html><body>
            <a href="/report.pdf">PDF</a>
            <a href="/photo.JPG">Photo</a>
            <a href="/gallery">Gallery</a>
        </body></html>"#;
        let links = extract_links(html, &page_url(), SITE);
        assert_eq!(links.len(), 1);
        assert!(links.contains("/gallery"));
    }

    #[test]
    fn test_links_are_deduplicated() {
        let html = r#"<html><body>
            <a href="/about">One</a>
            <a href="https://www.example.ru/about">Two</a>
        </body></html>"#;
        let links = extract_links(html, &page_url(), SITE);
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_relative_link_resolves_against_page() {
        let page = Url::parse("https://www.example.ru/news/").unwrap();
        let html = r#"<html><body><a href="2024/item">Item</a></body></html>"#;
        let links = extract_links(html, &page, SITE);
        assert!(links.contains("/news/2024/item"));
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Главная  </title></head><body></body></html>"#;
        assert_eq!(extract_title(html), "Главная");
    }

    #[test]
    fn test_extract_title_missing() {
        assert_eq!(extract_title("<html><body></body></html>"), "");
    }

    #[test]
    fn test_extract_text_collapses_whitespace() {
        let html = "<html><body><p>Старый   город</p>\n<p>у моря</p></body></html>";
        assert_eq!(extract_text(html), "Старый город у моря");
    }

    #[test]
    fn test_extract_text_skips_markup() {
        let html = r#"<html><body><div><b>Леопард</b> в <a href="/x">заповеднике</a></div></body></html>"#;
        assert_eq!(extract_text(html), "Леопард в заповеднике");
    }
}
