//! Scope and content checks applied before a URL is claimed for fetching.
//!
//! The domain check is a substring test on the authority, not an exact or
//! suffix match: `notexample.com.evil.com` passes for `example.com`. Keep it
//! that way unless the scoping policy itself changes.

use url::Url;

/// Extensions that never lead to HTML pages.
pub const SKIPPED_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".doc", ".docx", ".xls", ".xlsx", ".zip", ".tar",
    ".gz",
];

/// Why a URL was turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Unparseable,
    Scheme(String),
    OutOfScope(String),
    Extension,
}

pub struct UrlFilter;

impl UrlFilter {
    pub fn is_valid(url: &str, host: &str) -> bool {
        Self::check(url, host).is_ok()
    }

    pub fn check(url: &str, host: &str) -> Result<(), Rejection> {
        let parsed = Url::parse(url).map_err(|_| Rejection::Unparseable)?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(Rejection::Scheme(other.to_string())),
        }

        let authority = authority(&parsed);
        if authority.is_empty() || !authority.contains(&host.to_lowercase()) {
            return Err(Rejection::OutOfScope(authority));
        }

        let path = parsed.path().to_lowercase();
        if SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return Err(Rejection::Extension);
        }

        Ok(())
    }
}

/// `host[:port]` of a parsed URL; the port only appears when it is not the
/// scheme default.
pub fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(UrlFilter::is_valid("https://example.com/", "example.com"));
        assert!(UrlFilter::is_valid("http://example.com/login", "example.com"));
    }

    #[test]
    fn test_rejects_other_schemes() {
        for url in [
            "ftp://example.com/file",
            "mailto:admin@example.com",
            "javascript:alert(1)",
            "file:///etc/passwd",
            "ws://example.com/socket",
        ] {
            assert!(!UrlFilter::is_valid(url, "example.com"), "{} should be rejected", url);
        }
        assert_eq!(
            UrlFilter::check("ftp://example.com/", "example.com"),
            Err(Rejection::Scheme("ftp".to_string()))
        );
    }

    #[test]
    fn test_rejects_scheme_less_strings() {
        assert_eq!(
            UrlFilter::check("example.com/page", "example.com"),
            Err(Rejection::Unparseable)
        );
        assert_eq!(UrlFilter::check("", "example.com"), Err(Rejection::Unparseable));
        assert_eq!(
            UrlFilter::check("//example.com/page", "example.com"),
            Err(Rejection::Unparseable)
        );
    }

    #[test]
    fn test_subdomains_pass_containment() {
        assert!(UrlFilter::is_valid("https://api.example.com/v1", "example.com"));
        assert!(UrlFilter::is_valid("https://EXAMPLE.com/", "example.com"));
    }

    #[test]
    fn test_loose_containment_is_preserved() {
        assert!(UrlFilter::is_valid(
            "https://notexample.com.evil.com/",
            "example.com"
        ));
    }

    #[test]
    fn test_rejects_other_domains() {
        assert_eq!(
            UrlFilter::check("https://other.org/", "example.com"),
            Err(Rejection::OutOfScope("other.org".to_string()))
        );
    }

    #[test]
    fn test_port_is_part_of_authority() {
        assert!(UrlFilter::is_valid("http://127.0.0.1:8080/a", "127.0.0.1:8080"));
        assert!(!UrlFilter::is_valid("http://127.0.0.1:9090/a", "127.0.0.1:8080"));
        // Default ports are elided by the parser
        assert!(!UrlFilter::is_valid("http://example.com:80/", "example.com:80"));
    }

    #[test]
    fn test_rejects_binary_extensions() {
        for ext in SKIPPED_EXTENSIONS {
            let url = format!("https://example.com/files/doc{}", ext);
            assert_eq!(UrlFilter::check(&url, "example.com"), Err(Rejection::Extension));
        }
        assert!(!UrlFilter::is_valid("https://example.com/PHOTO.JPG", "example.com"));
    }

    #[test]
    fn test_extension_check_uses_path_only() {
        assert!(!UrlFilter::is_valid("https://example.com/report.pdf?x=1", "example.com"));
        assert!(UrlFilter::is_valid("https://example.com/view?file=report.pdf", "example.com"));
        assert!(UrlFilter::is_valid("https://example.com/archive.tar.html", "example.com"));
    }

    #[test]
    fn test_is_pure() {
        let inputs = [
            ("https://example.com/a", "example.com"),
            ("gopher://example.com", "example.com"),
            ("https://x.org/", "example.com"),
        ];
        for (url, host) in inputs {
            let first = UrlFilter::check(url, host);
            for _ in 0..5 {
                assert_eq!(UrlFilter::check(url, host), first);
            }
        }
    }
}
