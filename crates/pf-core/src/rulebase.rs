//! Compiled rule base
//!
//! The artifact produced by the compiler and consumed by the decision
//! engine: 14 buckets, each an exact-membership set or a single compiled
//! alternation, plus the good-domain exception set. Built once, immutable
//! afterwards.

use std::collections::HashSet;

use crate::alternation::{split_alternatives, SplitMatcher};
use crate::types::{BucketId, Category, BUCKET_COUNT};

/// Regex source of an alternation that has no rules. Downstream consumers
/// get a pattern that only matches the empty string.
pub const EMPTY_ALTERNATION: &str = "^$";

/// Opening of every joined alternation; the source ends with `)`.
const ALTERNATION_PREFIX: &str = "(?i)(?:";

/// Error type for rule base construction.
#[derive(Debug, thiserror::Error)]
pub enum RuleBaseError {
    #[error("Invalid alternation: {0}")]
    InvalidPattern(#[source] Box<fancy_regex::Error>),
    #[error("Alternation source does not split into {0} rules")]
    MalformedSource(usize),
    #[error("Bucket {0} has the wrong kind for its category")]
    KindMismatch(BucketId),
    #[error("Bucket {0} given more than once")]
    DuplicateBucket(BucketId),
}

// =============================================================================
// Exact Sets
// =============================================================================

/// Ordered-unique set of literal strings.
#[derive(Debug, Clone, Default)]
pub struct ExactSet {
    entries: Vec<String>,
    index: HashSet<String>,
}

impl ExactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, keeping first-seen order. Returns false for a
    /// duplicate.
    pub fn insert(&mut self, entry: impl Into<String>) -> bool {
        let entry = entry.into();
        if self.index.contains(&entry) {
            return false;
        }
        self.index.insert(entry.clone());
        self.entries.push(entry);
        true
    }

    #[inline]
    pub fn contains(&self, value: &str) -> bool {
        self.index.contains(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl<S: Into<String>> FromIterator<S> for ExactSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}

// =============================================================================
// Pattern Alternations
// =============================================================================

/// Source patterns plus the alternation combining their fragments.
#[derive(Debug, Clone)]
pub struct PatternAlternation {
    sources: Vec<String>,
    regex_source: String,
    matcher: Option<SplitMatcher>,
}

impl PatternAlternation {
    /// An alternation with no rules; never matches.
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
            regex_source: EMPTY_ALTERNATION.to_string(),
            matcher: None,
        }
    }

    /// Join compiled fragments into one case-insensitive alternation.
    /// `sources[i]` is the rule `fragments[i]` was compiled from.
    pub fn compile<S: AsRef<str>>(
        sources: Vec<String>,
        fragments: &[S],
    ) -> Result<Self, RuleBaseError> {
        if fragments.is_empty() {
            return Ok(Self::empty());
        }

        let fragments: Vec<&str> = fragments.iter().map(AsRef::as_ref).collect();
        let matcher = SplitMatcher::build(&fragments)?;

        Ok(Self {
            sources,
            regex_source: format!("{ALTERNATION_PREFIX}{})", fragments.join("|")),
            matcher: Some(matcher),
        })
    }

    /// Rebuild an alternation from an already joined regex source.
    pub fn from_source(sources: Vec<String>, regex_source: String) -> Result<Self, RuleBaseError> {
        if sources.is_empty() {
            return Ok(Self::empty());
        }

        let fragments = regex_source
            .strip_prefix(ALTERNATION_PREFIX)
            .and_then(|body| body.strip_suffix(')'))
            .map(split_alternatives)
            .filter(|fragments| fragments.len() == sources.len())
            .ok_or_else(|| RuleBaseError::MalformedSource(sources.len()))?;
        let matcher = SplitMatcher::build(&fragments)?;

        Ok(Self {
            sources,
            regex_source,
            matcher: Some(matcher),
        })
    }

    /// Test the alternation against `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|matcher| matcher.is_match(text))
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn regex_source(&self) -> &str {
        &self.regex_source
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

// =============================================================================
// Buckets
// =============================================================================

/// One compiled (category, polarity) collection.
#[derive(Debug, Clone)]
pub enum CompiledBucket {
    Exact(ExactSet),
    Pattern(PatternAlternation),
}

impl CompiledBucket {
    /// Empty bucket of the right kind for `category`.
    pub fn empty_for(category: Category) -> Self {
        if category.is_exact() {
            Self::Exact(ExactSet::new())
        } else {
            Self::Pattern(PatternAlternation::empty())
        }
    }

    /// The "has rules" flag; empty buckets are skipped at lookup time.
    #[inline]
    pub fn non_empty(&self) -> bool {
        !self.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Exact(set) => set.len(),
            Self::Pattern(alt) => alt.len(),
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }

    /// Source rules in bucket order.
    pub fn rules(&self) -> &[String] {
        match self {
            Self::Exact(set) => set.entries(),
            Self::Pattern(alt) => alt.sources(),
        }
    }

    /// Membership test for exact buckets, alternation test otherwise.
    #[inline]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Exact(set) => set.contains(text),
            Self::Pattern(alt) => alt.is_match(text),
        }
    }
}

// =============================================================================
// Rule Base
// =============================================================================

/// All 14 buckets plus the good-domain exceptions.
#[derive(Debug, Clone)]
pub struct CompiledRuleBase {
    buckets: Vec<CompiledBucket>,
    good_domain_exceptions: ExactSet,
}

impl CompiledRuleBase {
    /// A rule base with every bucket empty.
    pub fn empty() -> Self {
        Self {
            buckets: BucketId::all()
                .map(|id| CompiledBucket::empty_for(id.category))
                .collect(),
            good_domain_exceptions: ExactSet::new(),
        }
    }

    /// Assemble a rule base. Buckets not listed are left empty.
    pub fn new<I>(buckets: I, good_domain_exceptions: ExactSet) -> Result<Self, RuleBaseError>
    where
        I: IntoIterator<Item = (BucketId, CompiledBucket)>,
    {
        let mut slots: Vec<Option<CompiledBucket>> = (0..BUCKET_COUNT).map(|_| None).collect();

        for (id, bucket) in buckets {
            if bucket.is_exact() != id.category.is_exact() {
                return Err(RuleBaseError::KindMismatch(id));
            }
            let slot = &mut slots[id.index()];
            if slot.is_some() {
                return Err(RuleBaseError::DuplicateBucket(id));
            }
            *slot = Some(bucket);
        }

        let buckets = BucketId::all()
            .zip(slots)
            .map(|(id, slot)| slot.unwrap_or_else(|| CompiledBucket::empty_for(id.category)))
            .collect();

        Ok(Self {
            buckets,
            good_domain_exceptions,
        })
    }

    #[inline]
    pub fn bucket(&self, id: BucketId) -> &CompiledBucket {
        &self.buckets[id.index()]
    }

    /// Buckets in index order.
    pub fn buckets(&self) -> impl Iterator<Item = (BucketId, &CompiledBucket)> {
        BucketId::all().zip(self.buckets.iter())
    }

    pub fn good_domain_exceptions(&self) -> &ExactSet {
        &self.good_domain_exceptions
    }

    /// Total rules across all buckets.
    pub fn rule_count(&self) -> usize {
        self.buckets.iter().map(CompiledBucket::len).sum()
    }
}

impl Default for CompiledRuleBase {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Polarity;

    #[test]
    fn test_exact_set_keeps_first_seen_order() {
        let set: ExactSet = ["b.com", "a.com", "b.com", "c.com"].into_iter().collect();
        assert_eq!(set.entries(), &["b.com", "a.com", "c.com"]);
        assert!(set.contains("a.com"));
        assert!(!set.contains("d.com"));
    }

    #[test]
    fn test_empty_alternation_never_matches() {
        let alt = PatternAlternation::empty();
        assert!(!alt.is_match(""));
        assert!(!alt.is_match("anything"));
        assert_eq!(alt.regex_source(), EMPTY_ALTERNATION);
    }

    #[test]
    fn test_alternation_is_case_insensitive() {
        let alt = PatternAlternation::compile(
            vec!["banner".to_string(), "ad".to_string()],
            &[r"banner", r"^ad\."],
        )
        .unwrap();
        assert_eq!(alt.regex_source(), r"(?i)(?:banner|^ad\.)");
        assert!(alt.is_match("http://x.com/BANNER.gif"));
        assert!(alt.is_match("AD.example.com"));
        assert!(!alt.is_match("example.com/ad."));
    }

    #[test]
    fn test_invalid_alternation_is_an_error() {
        let result = PatternAlternation::compile(vec!["(".to_string()], &["("]);
        assert!(matches!(result, Err(RuleBaseError::InvalidPattern(_))));
    }

    #[test]
    fn test_rule_base_fills_missing_buckets() {
        let id = BucketId::new(Category::DomainExact, Polarity::Bad);
        let set: ExactSet = ["ads.example.com"].into_iter().collect();
        let base =
            CompiledRuleBase::new([(id, CompiledBucket::Exact(set))], ExactSet::new()).unwrap();

        assert!(base.bucket(id).non_empty());
        assert!(base.bucket(id).matches("ads.example.com"));
        assert_eq!(base.rule_count(), 1);
        for (other, bucket) in base.buckets() {
            if other != id {
                assert!(bucket.is_empty());
                assert_eq!(bucket.is_exact(), other.category.is_exact());
            }
        }
    }

    #[test]
    fn test_rule_base_rejects_wrong_kind_and_duplicates() {
        let id = BucketId::new(Category::UrlFragment, Polarity::Good);
        let wrong = CompiledRuleBase::new(
            [(id, CompiledBucket::Exact(ExactSet::new()))],
            ExactSet::new(),
        );
        assert!(matches!(wrong, Err(RuleBaseError::KindMismatch(_))));

        let twice = CompiledRuleBase::new(
            [
                (id, CompiledBucket::Pattern(PatternAlternation::empty())),
                (id, CompiledBucket::Pattern(PatternAlternation::empty())),
            ],
            ExactSet::new(),
        );
        assert!(matches!(twice, Err(RuleBaseError::DuplicateBucket(_))));
    }

    #[test]
    fn test_rule_base_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledRuleBase>();
    }
}
