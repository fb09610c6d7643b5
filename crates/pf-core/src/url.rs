//! Fast URL slicing utilities for the hot path
//!
//! These functions avoid allocations and work directly on string slices.
//! They follow the loose shapes a proxy auto-config lookup receives rather
//! than full RFC 3986 parsing.

use std::net::Ipv4Addr;

// =============================================================================
// Scheme
// =============================================================================

const MAX_SCHEME_LEN: usize = 15;

#[inline]
fn is_scheme_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'*' || b == b'+' || b == b'-'
}

/// Split a URL into its scheme and the remainder after `scheme:` and up to
/// two slashes. Returns an empty scheme when none is present.
#[inline]
pub fn split_scheme(url: &str) -> (&str, &str) {
    let bytes = url.as_bytes();
    let scheme_len = bytes.iter().take_while(|&&b| is_scheme_byte(b)).count();

    if !(2..=MAX_SCHEME_LEN).contains(&scheme_len) || bytes.get(scheme_len) != Some(&b':') {
        return ("", url);
    }

    let mut rest = scheme_len + 1;
    for _ in 0..2 {
        if bytes.get(rest) == Some(&b'/') {
            rest += 1;
        }
    }

    (&url[..scheme_len], &url[rest..])
}

// =============================================================================
// Authority and Host
// =============================================================================

/// Length of the authority (userinfo, host and port) at the start of a
/// scheme-less URL.
#[inline]
pub fn authority_len(url_no_scheme: &str) -> usize {
    url_no_scheme
        .bytes()
        .position(|b| b == b'/' || b == b'?' || b == b'#')
        .unwrap_or(url_no_scheme.len())
}

/// Start and end of the hostname inside a scheme-less URL.
#[inline]
pub fn host_span(url_no_scheme: &str) -> (usize, usize) {
    let authority = &url_no_scheme[..authority_len(url_no_scheme)];
    let host_start = authority.rfind('@').map_or(0, |at| at + 1);
    let host_end = authority[host_start..]
        .find(':')
        .map_or(authority.len(), |colon| host_start + colon);
    (host_start, host_end)
}

/// Fast host extraction without allocations.
/// Returns a slice into the input URL.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let (_, rest) = split_scheme(url);
    let (start, end) = host_span(rest);
    if start == end {
        None
    } else {
        Some(&rest[start..end])
    }
}

/// Cut a URL (or any projection of one) at its query or fragment.
#[inline]
pub fn strip_query(url: &str) -> &str {
    match url.find(['?', '#']) {
        Some(pos) => &url[..pos],
        None => url,
    }
}

/// Whether a host is a dotted-quad IPv4 literal.
#[inline]
pub fn is_ipv4(host: &str) -> bool {
    host.parse::<Ipv4Addr>().is_ok()
}

/// Offset at which the last two labels of a host begin, i.e. the length of
/// the "server" prefix (`ads.` in `ads.example.com`). Zero when the host has
/// two labels or fewer.
#[inline]
pub fn server_prefix_len(host: &str) -> usize {
    let trimmed = host.trim_end_matches('.');
    let last_dot = match trimmed.rfind('.') {
        Some(pos) => pos,
        None => return 0,
    };
    match trimmed[..last_dot].rfind('.') {
        Some(pos) => pos + 1,
        None => 0,
    }
}

// =============================================================================
// Host Suffixes
// =============================================================================

/// Iterator for suffix-walking a host from the full name to its last label.
pub struct HostSuffixIter<'a> {
    current: Option<&'a str>,
    parents: bool,
}

impl<'a> HostSuffixIter<'a> {
    pub fn new(host: &'a str) -> Self {
        let host = host.trim_end_matches('.');
        Self {
            current: if host.is_empty() { None } else { Some(host) },
            parents: true,
        }
    }

    /// An iterator yielding `host` alone, for hosts that have no parents.
    pub fn single(host: &'a str) -> Self {
        Self {
            parents: false,
            ..Self::new(host)
        }
    }
}

impl<'a> Iterator for HostSuffixIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.current?;

        // Move to parent
        self.current = match result.find('.').filter(|_| self.parents) {
            Some(idx) if idx < result.len() - 1 => Some(&result[idx + 1..]),
            _ => None,
        };

        Some(result)
    }
}

/// Walk host suffixes from most specific to least specific.
pub fn walk_host_suffixes(host: &str) -> HostSuffixIter<'_> {
    HostSuffixIter::new(host)
}
