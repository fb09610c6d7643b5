//! Rule Classifier
//!
//! Routes a normalized rule into exactly one bucket based on its anchor
//! and wildcard shape. First match wins:
//!
//! 1. `/regex/` is a raw pattern.
//! 2. Leading and trailing `*` runs are redundant and removed.
//! 3. `||` or `|scheme://` anchored rules are stripped of the anchor and
//!    then sorted into host-only, host-path or generic anchored shapes.
//! 4. Everything else is an unanchored URL fragment.

use pf_core::{BucketId, Category, OptionFlags, Polarity};

use crate::config::Policy;
use crate::normalizer::{is_raw_pattern, NormalizedRule};

/// A rule assigned to its bucket, with the pattern as the bucket stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRule {
    pub bucket: BucketId,
    pub pattern: String,
    pub options: OptionFlags,
    pub ordinal: usize,
    /// Configured to be compiled ahead of everything else
    pub pinned: bool,
}

const MAX_SCHEME_ANCHOR_LEN: usize = 15;
const MAX_TLD_LEN: usize = 24;

pub struct Classifier<'p> {
    policy: &'p Policy,
}

impl<'p> Classifier<'p> {
    pub fn new(policy: &'p Policy) -> Self {
        Self { policy }
    }

    pub fn classify(&self, rule: NormalizedRule) -> ClassifiedRule {
        let polarity = if rule.is_exception {
            Polarity::Good
        } else {
            Polarity::Bad
        };
        let (category, pattern) = self.categorize(&rule.pattern);

        ClassifiedRule {
            bucket: BucketId::new(category, polarity),
            pattern,
            options: rule.options,
            ordinal: rule.ordinal,
            pinned: false,
        }
    }

    fn categorize(&self, pattern: &str) -> (Category, String) {
        if is_raw_pattern(pattern) {
            return (Category::RawPattern, pattern[1..pattern.len() - 1].to_string());
        }

        let pattern = pattern.trim_matches('*');

        let anchored = pattern
            .strip_prefix("||")
            .or_else(|| strip_scheme_anchor(pattern));
        let Some(rest) = anchored else {
            return (Category::UrlFragment, pattern.to_string());
        };

        if let Some(host) = host_only(rest) {
            return if host.contains(['*', '|', '^', '@']) {
                (Category::DomainPattern, host.to_string())
            } else {
                (Category::DomainExact, host.to_ascii_lowercase())
            };
        }

        let (body, end_anchored) = match rest.strip_suffix('|') {
            Some(body) => (body, true),
            None => (rest, false),
        };

        if is_host_path(body) {
            let path = body.strip_suffix('?').unwrap_or(body);
            let exact = !path.contains(['*', '^', '@'])
                && (end_anchored || path.ends_with('/') || self.has_path_extension(path));

            return if exact {
                (Category::HostPathExact, lowercase_host(path))
            } else if end_anchored {
                (Category::HostPathPattern, format!("{path}|"))
            } else {
                (Category::HostPathPattern, path.to_string())
            };
        }

        (Category::DomainGenericPattern, rest.to_string())
    }

    fn has_path_extension(&self, path: &str) -> bool {
        self.policy
            .path_extensions
            .as_ref()
            .is_some_and(|re| re.is_match(path))
    }
}

// =============================================================================
// Shape Tests
// =============================================================================

#[inline]
fn is_label_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '*' || c == '-'
}

#[inline]
fn is_tld_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '*' || c == '-'
}

#[inline]
fn is_path_char(c: char) -> bool {
    is_label_char(c) || matches!(c, '~' | '%' | '.' | '/' | '^')
}

/// Strip `|scheme://`, `|://` or `scheme://` from the start of a rule.
fn strip_scheme_anchor(pattern: &str) -> Option<&str> {
    let rest = pattern.strip_prefix('|').unwrap_or(pattern);
    let scheme_len = rest
        .char_indices()
        .find(|&(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | '*' | '+' | '-')))
        .map_or(rest.len(), |(i, _)| i);

    if rest[..scheme_len].chars().count() > MAX_SCHEME_ANCHOR_LEN {
        return None;
    }
    rest[scheme_len..].strip_prefix("://")
}

/// `(label.)+tld` with an optional trailing dot.
fn is_host(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    let Some((labels, tld)) = host.rsplit_once('.') else {
        return false;
    };

    !labels.is_empty()
        && labels
            .split('.')
            .all(|label| !label.is_empty() && label.chars().all(is_label_char))
        && (1..=MAX_TLD_LEN).contains(&tld.len())
        && tld.chars().all(is_tld_char)
}

/// A host optionally followed by exactly one of `/`, `^` or `?`. Returns
/// the host.
fn host_only(rest: &str) -> Option<&str> {
    let host = rest
        .strip_suffix(['/', '^', '?'])
        .unwrap_or(rest);
    is_host(host).then_some(host)
}

/// A host followed by path characters and an optional trailing `?`.
fn is_host_path(body: &str) -> bool {
    let body = body.strip_suffix('?').unwrap_or(body);
    if !body.chars().all(is_path_char) {
        return false;
    }

    // Some dot must close a run of non-empty labels and be followed by a
    // one-character tld plus at least one more path character.
    let mut label_start = 0;
    for (i, c) in body.char_indices() {
        if c == '.' {
            if i == label_start {
                return false;
            }
            let mut after = body[i + 1..].chars();
            if after.next().is_some_and(is_tld_char) && after.next().is_some() {
                return true;
            }
            label_start = i + 1;
        } else if !is_label_char(c) {
            return false;
        }
    }
    false
}

/// Lowercase the host part (up to the first `/`) of a host-path rule.
fn lowercase_host(path: &str) -> String {
    let split = path.find('/').unwrap_or(path.len());
    let mut out = path[..split].to_ascii_lowercase();
    out.push_str(&path[split..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;

    fn classify(pattern: &str, is_exception: bool) -> ClassifiedRule {
        let policy = CompilerConfig::default().policy().unwrap();
        Classifier::new(&policy).classify(NormalizedRule {
            pattern: pattern.to_string(),
            options: OptionFlags::empty(),
            is_exception,
            ordinal: 0,
        })
    }

    fn category(pattern: &str) -> (Category, String) {
        let rule = classify(pattern, false);
        (rule.bucket.category, rule.pattern)
    }

    #[test]
    fn domain_anchored_hosts() {
        assert_eq!(
            category("||ads.example.com^"),
            (Category::DomainExact, "ads.example.com".to_string())
        );
        assert_eq!(
            category("||Ads.Example.COM/"),
            (Category::DomainExact, "ads.example.com".to_string())
        );
        assert_eq!(
            category("|https://tracker.net"),
            (Category::DomainExact, "tracker.net".to_string())
        );
        assert_eq!(
            category("||a.*.com^"),
            (Category::DomainPattern, "a.*.com".to_string())
        );
    }

    #[test]
    fn raw_patterns_win_over_anchors() {
        assert_eq!(
            category(r"/banner\d+\.gif/"),
            (Category::RawPattern, r"banner\d+\.gif".to_string())
        );
        assert_eq!(
            category("/||ads.example.com^/"),
            (Category::RawPattern, "||ads.example.com^".to_string())
        );
    }

    #[test]
    fn host_path_shapes() {
        assert_eq!(
            category("||example.com/ads/banner.gif"),
            (Category::HostPathExact, "example.com/ads/banner.gif".to_string())
        );
        assert_eq!(
            category("||Example.com/Ads/"),
            (Category::HostPathExact, "example.com/Ads/".to_string())
        );
        assert_eq!(
            category("||example.com/ads/serve|"),
            (Category::HostPathExact, "example.com/ads/serve".to_string())
        );
        assert_eq!(
            category("||example.com/ads/serve"),
            (Category::HostPathPattern, "example.com/ads/serve".to_string())
        );
        assert_eq!(
            category("||example.com/*/banner^"),
            (Category::HostPathPattern, "example.com/*/banner^".to_string())
        );
        assert_eq!(
            category("||example.com/a*b.js|"),
            (Category::HostPathPattern, "example.com/a*b.js|".to_string())
        );
    }

    #[test]
    fn irregular_anchored_rules_are_generic() {
        assert_eq!(
            category("||example.com/ads?id=*&x=1"),
            (Category::DomainGenericPattern, "example.com/ads?id=*&x=1".to_string())
        );
        assert_eq!(
            category("||localhost/ads"),
            (Category::DomainGenericPattern, "localhost/ads".to_string())
        );
    }

    #[test]
    fn unanchored_rules_are_fragments() {
        assert_eq!(
            category("*/banner/*"),
            (Category::UrlFragment, "/banner/".to_string())
        );
        assert_eq!(
            category("-ad-300x250."),
            (Category::UrlFragment, "-ad-300x250.".to_string())
        );
    }

    #[test]
    fn polarity_follows_exception_flag() {
        assert_eq!(classify("||a.com^", true).bucket.polarity, Polarity::Good);
        assert_eq!(classify("||a.com^", false).bucket.polarity, Polarity::Bad);
    }

    #[test]
    fn scheme_anchor_shapes() {
        assert_eq!(strip_scheme_anchor("|http://a.com"), Some("a.com"));
        assert_eq!(strip_scheme_anchor("http://a.com"), Some("a.com"));
        assert_eq!(strip_scheme_anchor("|://a.com"), Some("a.com"));
        assert_eq!(strip_scheme_anchor("|a.com"), None);
        assert_eq!(strip_scheme_anchor("/ads/"), None);
    }
}
