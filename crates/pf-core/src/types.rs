//! Core type definitions for pacfilter
//!
//! These types name the compiled buckets and are shared by the compiler
//! and the decision engine.

use std::fmt;

// =============================================================================
// Decision
// =============================================================================

/// Terminal outcome of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Pass the request through
    Allow,
    /// Send the request to the blackhole
    Block,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("ALLOW"),
            Self::Block => f.write_str("BLOCK"),
        }
    }
}

// =============================================================================
// Polarity and Category
// =============================================================================

/// Whether a rule forces ALLOW (exception) or BLOCK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Polarity {
    /// Exception rule (@@...)
    Good,
    /// Block rule
    Bad,
}

impl Polarity {
    pub const ALL: [Polarity; 2] = [Polarity::Good, Polarity::Bad];

    pub fn name(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Bad => "bad",
        }
    }

    /// The decision a match in a bucket of this polarity produces.
    pub fn decision(self) -> Decision {
        match self {
            Self::Good => Decision::Allow,
            Self::Bad => Decision::Block,
        }
    }
}

/// Matching strategy a rule is compiled into.
///
/// The declaration order is the evaluation order used by the decision
/// engine for full-path lookups: exact sets before alternations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// `||a.b^` - host membership
    DomainExact,
    /// `||a.b/c.js` - host and path membership
    HostPathExact,
    /// `||a.*.b^` - host alternation
    DomainPattern,
    /// `||a.b/*/c` - host and path alternation
    HostPathPattern,
    /// `||a.b/c?d=*` - anchored alternation over host, path and query
    DomainGenericPattern,
    /// `/banner/*/img^` - unanchored alternation over the full URL
    UrlFragment,
    /// `/regex/` - raw regular expressions over the full URL
    RawPattern,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::DomainExact,
        Category::HostPathExact,
        Category::DomainPattern,
        Category::HostPathPattern,
        Category::DomainGenericPattern,
        Category::UrlFragment,
        Category::RawPattern,
    ];

    /// Exact categories compile into hash sets, the rest into alternations.
    pub fn is_exact(self) -> bool {
        matches!(self, Self::DomainExact | Self::HostPathExact)
    }

    /// Patterns in these categories had a domain or scheme anchor stripped
    /// and must match from the start of the projected string.
    pub fn is_domain_anchored(self) -> bool {
        matches!(
            self,
            Self::DomainPattern | Self::HostPathPattern | Self::DomainGenericPattern
        )
    }

    /// Categories consulted when an https URL arrives with its path stripped.
    pub fn is_host_only(self) -> bool {
        matches!(self, Self::DomainExact | Self::DomainPattern)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::DomainExact => "domain_exact",
            Self::HostPathExact => "host_path_exact",
            Self::DomainPattern => "domain_pattern",
            Self::HostPathPattern => "host_path_pattern",
            Self::DomainGenericPattern => "domain_generic_pattern",
            Self::UrlFragment => "url_fragment",
            Self::RawPattern => "raw_pattern",
        }
    }
}

// =============================================================================
// Bucket Identifiers
// =============================================================================

/// Number of (category, polarity) buckets in a compiled rule base.
pub const BUCKET_COUNT: usize = Category::ALL.len() * Polarity::ALL.len();

/// One of the 14 compiled rule collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketId {
    pub category: Category,
    pub polarity: Polarity,
}

impl BucketId {
    pub const fn new(category: Category, polarity: Polarity) -> Self {
        Self { category, polarity }
    }

    /// Dense index in `0..BUCKET_COUNT`; good buckets come first.
    pub fn index(self) -> usize {
        let polarity = match self.polarity {
            Polarity::Good => 0,
            Polarity::Bad => 1,
        };
        polarity * Category::ALL.len() + self.category as usize
    }

    /// All buckets in index order.
    pub fn all() -> impl Iterator<Item = BucketId> {
        Polarity::ALL.into_iter().flat_map(|polarity| {
            Category::ALL
                .into_iter()
                .map(move |category| BucketId::new(category, polarity))
        })
    }

    /// Stable name used in reports and exports, e.g. `bad_domain_exact`.
    pub fn name(self) -> String {
        format!("{}_{}", self.polarity.name(), self.category.name())
    }

    /// Inverse of [`BucketId::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().find(|id| id.name() == name)
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.polarity.name(), self.category.name())
    }
}

// =============================================================================
// Rule Options
// =============================================================================

bitflags::bitflags! {
    /// Option tokens recognized after `$` in a rule.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OptionFlags: u32 {
        const THIRD_PARTY = 1 << 0;
        const DOMAIN = 1 << 1;
        const SCRIPT = 1 << 2;
        const IMAGE = 1 << 3;
        const STYLESHEET = 1 << 4;
        const OBJECT = 1 << 5;
        const OBJECT_SUBREQUEST = 1 << 6;
        const XMLHTTPREQUEST = 1 << 7;
        const SUBDOCUMENT = 1 << 8;
        const PING = 1 << 9;
        const WEBSOCKET = 1 << 10;
        const WEBRTC = 1 << 11;
        const DOCUMENT = 1 << 12;
        const ELEMHIDE = 1 << 13;
        const GENERICHIDE = 1 << 14;
        const GENERICBLOCK = 1 << 15;
        const OTHER = 1 << 16;
        const SITEKEY = 1 << 17;
        const MATCH_CASE = 1 << 18;
        const COLLAPSE = 1 << 19;
        const DONOTTRACK = 1 << 20;
        const POPUP = 1 << 21;
        const MEDIA = 1 << 22;
        const FONT = 1 << 23;
    }
}

impl OptionFlags {
    /// Parse one option name. `~` negation and `=value` must already be
    /// stripped; matching is case-insensitive.
    pub fn parse_option(name: &str) -> Option<Self> {
        let flag = match name.to_ascii_lowercase().as_str() {
            "third-party" => Self::THIRD_PARTY,
            "domain" => Self::DOMAIN,
            "script" => Self::SCRIPT,
            "image" => Self::IMAGE,
            "stylesheet" => Self::STYLESHEET,
            "object" => Self::OBJECT,
            "object-subrequest" => Self::OBJECT_SUBREQUEST,
            "xmlhttprequest" => Self::XMLHTTPREQUEST,
            "subdocument" => Self::SUBDOCUMENT,
            "ping" => Self::PING,
            "websocket" => Self::WEBSOCKET,
            "webrtc" => Self::WEBRTC,
            "document" => Self::DOCUMENT,
            "elemhide" => Self::ELEMHIDE,
            "generichide" => Self::GENERICHIDE,
            "genericblock" => Self::GENERICBLOCK,
            "other" => Self::OTHER,
            "sitekey" => Self::SITEKEY,
            "match-case" => Self::MATCH_CASE,
            "collapse" => Self::COLLAPSE,
            "donottrack" => Self::DONOTTRACK,
            "popup" => Self::POPUP,
            "media" => Self::MEDIA,
            "font" => Self::FONT,
            _ => return None,
        };
        Some(flag)
    }

    /// Parse a list of option names into one mask, returning the first
    /// unrecognized name on failure.
    pub fn parse_options<'a, I>(names: I) -> Result<Self, &'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut flags = Self::empty();
        for name in names {
            flags |= Self::parse_option(name).ok_or(name)?;
        }
        Ok(flags)
    }
}
