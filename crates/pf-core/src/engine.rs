//! Decision Engine
//!
//! This is the hot path - every lookup goes through here.
//! The engine only reads the compiled rule base: no allocations beyond an
//! occasional lowercased host, no locks, no persisted state.

use crate::context::DecisionContext;
use crate::rulebase::{CompiledBucket, CompiledRuleBase};
use crate::types::{BucketId, Category, Decision, Polarity};

// =============================================================================
// Pre-filter
// =============================================================================

/// A stage consulted before any bucket, e.g. network-range allow and deny
/// lists. Returning `Some` ends the lookup.
pub trait PreFilter {
    fn check(&self, ctx: &DecisionContext<'_>) -> Option<Decision>;
}

/// Pre-filter that never decides.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPreFilter;

impl PreFilter for NoPreFilter {
    #[inline]
    fn check(&self, _ctx: &DecisionContext<'_>) -> Option<Decision> {
        None
    }
}

// =============================================================================
// Match Result
// =============================================================================

/// What produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// Host is listed as a good-domain exception
    GoodDomainException,
    /// The pre-filter decided
    PreFilter,
    /// A rule in this bucket matched
    Bucket(BucketId),
    /// Nothing matched
    Default,
}

/// Decision plus the check that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub decision: Decision,
    pub source: MatchSource,
}

impl MatchResult {
    const DEFAULT: MatchResult = MatchResult {
        decision: Decision::Allow,
        source: MatchSource::Default,
    };

    fn from_bucket(id: BucketId) -> Self {
        Self {
            decision: id.polarity.decision(),
            source: MatchSource::Bucket(id),
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Buckets consulted for an https URL whose path was stripped.
const HOST_ONLY_ORDER: [Category; 2] = [Category::DomainExact, Category::DomainPattern];

/// The decision engine.
pub struct DecisionEngine<'a, P: PreFilter = NoPreFilter> {
    rulebase: &'a CompiledRuleBase,
    prefilter: P,
}

impl<'a> DecisionEngine<'a, NoPreFilter> {
    /// Create a new engine over the given rule base.
    pub fn new(rulebase: &'a CompiledRuleBase) -> Self {
        Self {
            rulebase,
            prefilter: NoPreFilter,
        }
    }
}

impl<'a, P: PreFilter> DecisionEngine<'a, P> {
    /// Create an engine with a pre-filter stage.
    pub fn with_prefilter(rulebase: &'a CompiledRuleBase, prefilter: P) -> Self {
        Self {
            rulebase,
            prefilter,
        }
    }

    pub fn rulebase(&self) -> &'a CompiledRuleBase {
        self.rulebase
    }

    /// Classify a (URL, host) pair. An empty host is taken from the URL.
    pub fn decide(&self, url: &str, host: &str) -> Decision {
        self.evaluate(url, host).decision
    }

    /// Classify a (URL, host) pair and report which check decided.
    pub fn evaluate(&self, url: &str, host: &str) -> MatchResult {
        let ctx = DecisionContext::new(url, host);
        self.evaluate_context(&ctx)
    }

    /// Run the decision procedure on precomputed projections.
    pub fn evaluate_context(&self, ctx: &DecisionContext<'_>) -> MatchResult {
        // Explicit override
        if self.rulebase.good_domain_exceptions().contains(&ctx.host) {
            return MatchResult {
                decision: Decision::Block,
                source: MatchSource::GoodDomainException,
            };
        }

        if let Some(decision) = self.prefilter.check(ctx) {
            return MatchResult {
                decision,
                source: MatchSource::PreFilter,
            };
        }

        // The browser hides everything past the authority; only host
        // buckets carry information.
        if ctx.is_path_stripped() {
            return self
                .first_match(ctx, &HOST_ONLY_ORDER)
                .map_or(MatchResult::DEFAULT, MatchResult::from_bucket);
        }

        if ctx.is_http() || ctx.is_https() {
            return self
                .first_match(ctx, &Category::ALL)
                .map_or(MatchResult::DEFAULT, MatchResult::from_bucket);
        }

        MatchResult::DEFAULT
    }

    /// Walk the good group, then the bad group, in category order.
    fn first_match(&self, ctx: &DecisionContext<'_>, order: &[Category]) -> Option<BucketId> {
        Polarity::ALL.into_iter().find_map(|polarity| {
            order
                .iter()
                .map(|&category| BucketId::new(category, polarity))
                .find(|&id| self.bucket_matches(id, ctx))
        })
    }

    #[inline]
    fn bucket_matches(&self, id: BucketId, ctx: &DecisionContext<'_>) -> bool {
        let bucket = self.rulebase.bucket(id);
        if !bucket.non_empty() {
            return false;
        }

        match id.category {
            Category::DomainExact => ctx.host_suffixes().any(|suffix| bucket.matches(suffix)),
            Category::HostPathExact | Category::HostPathPattern => {
                matches_either(bucket, &ctx.url_no_server_no_query, &ctx.url_no_query)
            }
            Category::DomainPattern => matches_either(bucket, ctx.host_no_server(), &ctx.host),
            Category::DomainGenericPattern => {
                matches_either(bucket, ctx.url_no_server, ctx.url_no_scheme)
            }
            Category::UrlFragment | Category::RawPattern => bucket.matches(ctx.url),
        }
    }
}

#[inline]
fn matches_either(bucket: &CompiledBucket, first: &str, second: &str) -> bool {
    bucket.matches(first) || (second != first && bucket.matches(second))
}
