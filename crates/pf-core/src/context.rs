//! Per-lookup URL projections
//!
//! A [`DecisionContext`] is derived once per lookup and holds every view of
//! the URL and host the compiled buckets are tested against. All projections
//! borrow from the input; only a host or authority with uppercase letters
//! is copied.

use std::borrow::Cow;

use crate::url::{
    authority_len, extract_host, host_span, is_ipv4, server_prefix_len, split_scheme,
    strip_query, walk_host_suffixes, HostSuffixIter,
};

/// Read-only projections of one (URL, host) pair.
#[derive(Debug, Clone)]
pub struct DecisionContext<'a> {
    /// The URL exactly as given
    pub url: &'a str,
    /// Leading scheme without `:` (empty if absent)
    pub scheme: &'a str,
    /// URL after `scheme:` and up to two slashes
    pub url_no_scheme: &'a str,
    /// Everything after the authority, `/` for a stripped https URL
    pub url_path_only: &'a str,
    /// `url_no_scheme` cut at the first `?` or `#`, authority lowercased
    pub url_no_query: Cow<'a, str>,
    /// `url_no_scheme` without the leading subdomain labels
    pub url_no_server: &'a str,
    /// `url_no_server` cut at the first `?` or `#`, authority lowercased
    pub url_no_server_no_query: Cow<'a, str>,
    /// Lowercased host
    pub host: Cow<'a, str>,
    pub host_is_ipv4: bool,
    host_no_server_start: usize,
}

impl<'a> DecisionContext<'a> {
    /// Derive the projections. An empty `host` is taken from the URL.
    pub fn new(url: &'a str, host: &'a str) -> Self {
        let (scheme, url_no_scheme) = split_scheme(url);
        let url_path_only = &url_no_scheme[authority_len(url_no_scheme)..];
        let url_no_query = lowercase_authority(strip_query(url_no_scheme));

        let raw_host = if host.is_empty() {
            extract_host(url).unwrap_or("")
        } else {
            host
        };
        let host: Cow<'a, str> = if raw_host.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(raw_host.to_ascii_lowercase())
        } else {
            Cow::Borrowed(raw_host)
        };
        let host_is_ipv4 = is_ipv4(&host);
        let host_no_server_start = if host_is_ipv4 {
            0
        } else {
            server_prefix_len(&host)
        };

        // Subdomain labels are only cut from the URL when the host sits at
        // the very start of the authority (no userinfo).
        let (url_host_start, url_host_end) = host_span(url_no_scheme);
        let url_no_server = if url_host_start == 0 && !is_ipv4(&url_no_scheme[..url_host_end]) {
            &url_no_scheme[server_prefix_len(&url_no_scheme[..url_host_end])..]
        } else {
            url_no_scheme
        };
        let url_no_server_no_query = lowercase_authority(strip_query(url_no_server));

        Self {
            url,
            scheme,
            url_no_scheme,
            url_path_only,
            url_no_query,
            url_no_server,
            url_no_server_no_query,
            host,
            host_is_ipv4,
            host_no_server_start,
        }
    }

    /// Host with the leading subdomain labels removed (last two kept).
    pub fn host_no_server(&self) -> &str {
        &self.host[self.host_no_server_start..]
    }

    pub fn is_http(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("http")
    }

    pub fn is_https(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("https")
    }

    /// An https URL whose path has been hidden by the browser.
    pub fn is_path_stripped(&self) -> bool {
        self.is_https() && self.url_path_only == "/"
    }

    /// Host suffixes from the full host down to its last label. An IPv4
    /// literal yields only itself.
    pub fn host_suffixes(&self) -> HostSuffixIter<'_> {
        if self.host_is_ipv4 {
            HostSuffixIter::single(&self.host)
        } else {
            walk_host_suffixes(&self.host)
        }
    }
}

/// Exact host-path entries carry a lowercased host and the path as written.
fn lowercase_authority(url_no_scheme: &str) -> Cow<'_, str> {
    let (authority, path) = url_no_scheme.split_at(authority_len(url_no_scheme));
    if authority.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(format!("{}{}", authority.to_ascii_lowercase(), path))
    } else {
        Cow::Borrowed(url_no_scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url_projections() {
        let ctx =
            DecisionContext::new("https://a.b.example.com:8443/p/q.js?x=1#f", "a.b.example.com");
        assert_eq!(ctx.scheme, "https");
        assert_eq!(ctx.url_no_scheme, "a.b.example.com:8443/p/q.js?x=1#f");
        assert_eq!(ctx.url_path_only, "/p/q.js?x=1#f");
        assert_eq!(ctx.url_no_query, "a.b.example.com:8443/p/q.js");
        assert_eq!(ctx.url_no_server, "example.com:8443/p/q.js?x=1#f");
        assert_eq!(ctx.url_no_server_no_query, "example.com:8443/p/q.js");
        assert_eq!(ctx.host, "a.b.example.com");
        assert_eq!(ctx.host_no_server(), "example.com");
        assert!(!ctx.host_is_ipv4);
        assert!(!ctx.is_path_stripped());
    }

    #[test]
    fn test_path_stripped_https() {
        let ctx = DecisionContext::new("https://ads.example.com/", "ads.example.com");
        assert!(ctx.is_https());
        assert!(ctx.is_path_stripped());

        let ctx = DecisionContext::new("http://ads.example.com/", "ads.example.com");
        assert!(!ctx.is_path_stripped());
    }

    #[test]
    fn test_host_derived_and_lowercased() {
        let ctx = DecisionContext::new("http://WWW.Example.COM/x", "");
        assert_eq!(ctx.host, "www.example.com");
        assert_eq!(ctx.host_no_server(), "example.com");

        let ctx = DecisionContext::new("http://x.com/", "Ads.X.com");
        assert_eq!(ctx.host, "ads.x.com");
    }

    #[test]
    fn test_query_free_projections_lowercase_authority_only() {
        let ctx = DecisionContext::new("http://WWW.Example.com/Ads/X.js?Q=1", "");
        assert_eq!(ctx.url_no_query, "www.example.com/Ads/X.js");
        assert_eq!(ctx.url_no_server_no_query, "example.com/Ads/X.js");
        assert_eq!(ctx.url_no_scheme, "WWW.Example.com/Ads/X.js?Q=1");

        let ctx = DecisionContext::new("http://example.com/ads/x.js", "");
        assert!(matches!(ctx.url_no_query, Cow::Borrowed(_)));
    }

    #[test]
    fn test_ipv4_host_keeps_server() {
        let ctx = DecisionContext::new("http://10.1.2.3/ad.gif", "10.1.2.3");
        assert!(ctx.host_is_ipv4);
        assert_eq!(ctx.host_no_server(), "10.1.2.3");
        assert_eq!(ctx.url_no_server, "10.1.2.3/ad.gif");
        assert_eq!(ctx.host_suffixes().collect::<Vec<_>>(), vec!["10.1.2.3"]);
    }

    #[test]
    fn test_host_suffixes() {
        let ctx = DecisionContext::new("http://x.ads.example.com/", "");
        let suffixes: Vec<&str> = ctx.host_suffixes().collect();
        assert_eq!(suffixes, vec!["x.ads.example.com", "ads.example.com", "example.com", "com"]);
    }
}
