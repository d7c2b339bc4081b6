//! Site-URL helpers
//!
//! Sites are configured as scheme + host with no trailing slash
//! (e.g. "https://www.example.ru"); pages are addressed by site-relative
//! paths with a leading slash. These helpers validate configured site
//! addresses and filter out links that are very unlikely to be HTML.

/// Link suffixes that almost certainly do not point at an HTML page
const NON_HTML_EXTENSIONS: [&str; 5] = [".pdf", ".jpg", ".jpeg", ".png", ".webp"];

/// Checks whether `url` is a bare site address: scheme + host, no path,
/// no trailing slash (e.g. "http://www.site.ru")
pub fn is_site_url_only(url: &str) -> bool {
    let rest = match strip_scheme(url) {
        Some(rest) => rest,
        None => return false,
    };
    !rest.is_empty() && !rest.contains('/')
}

/// Checks whether the link points at a file extension that is very unlikely
/// to be an HTML page
pub fn is_non_html_extension(link: &str) -> bool {
    let lower = link.to_lowercase();
    NON_HTML_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn strip_scheme(url: &str) -> Option<&str> {
    url.strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_site_url() {
        assert!(is_site_url_only("http://www.site.ru"));
        assert!(is_site_url_only("https://site.ru"));
    }

    #[test]
    fn test_site_url_with_slash_is_not_bare() {
        assert!(!is_site_url_only("http://www.site.ru/"));
        assert!(!is_site_url_only("http://www.site.ru/about"));
    }

    #[test]
    fn test_non_http_scheme_is_not_site_url() {
        assert!(!is_site_url_only("ftp://www.site.ru"));
        assert!(!is_site_url_only("www.site.ru"));
        assert!(!is_site_url_only(""));
    }

    #[test]
    fn test_non_html_extensions() {
        assert!(is_non_html_extension("/files/report.pdf"));
        assert!(is_non_html_extension("/IMG/photo.JPEG"));
        assert!(is_non_html_extension("/pic.webp"));
        assert!(!is_non_html_extension("/news/article"));
        assert!(!is_non_html_extension("/index.html"));
    }
}
