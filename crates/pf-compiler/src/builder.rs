//! Rule Set Builder
//!
//! Owns the 14 bucket accumulators for one compile pass. Rule sources are
//! normalized, classified and filtered as they are added; [`RuleSetBuilder::build`]
//! then de-duplicates, ranks, truncates and compiles every bucket into a
//! [`CompiledRuleBase`].

use pf_core::{
    BucketId, Category, CompiledBucket, CompiledRuleBase, ExactSet, PatternAlternation,
    RuleBaseError, BUCKET_COUNT,
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::classifier::{ClassifiedRule, Classifier};
use crate::config::{CompilerConfig, Policy};
use crate::content_filter::ContentFilter;
use crate::error::CompileError;
use crate::normalizer::{raw_rules, NormalizedRule, Normalizer, RawRule};
use crate::optimizer::{apply_wildcard_budget, dedup_rules, total_wildcards, truncate_rules};
use crate::pattern::{compile_rule, validate_raw, WildcardIndex};
use crate::ranking::{FileOrder, RuleRanker};
use crate::report::{BucketReport, BuildReport, DropReason, DropStats};

pub struct RuleSetBuilder {
    policy: Policy,
    ranker: Box<dyn RuleRanker>,
    buckets: Vec<Vec<ClassifiedRule>>,
    drops: DropStats,
    sources: usize,
}

impl RuleSetBuilder {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            ranker: Box::new(FileOrder),
            buckets: vec![Vec::new(); BUCKET_COUNT],
            drops: DropStats::default(),
            sources: 0,
        }
    }

    pub fn from_config(config: &CompilerConfig) -> Result<Self, CompileError> {
        Ok(Self::new(config.policy()?))
    }

    /// Replace the default file-order ranking.
    pub fn with_ranker(mut self, ranker: impl RuleRanker + 'static) -> Self {
        self.ranker = Box::new(ranker);
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn drops(&self) -> &DropStats {
        &self.drops
    }

    /// Add every line of one rule source. Commented-out section state
    /// does not carry over between sources.
    pub fn add_source(&mut self, source: &str) -> &mut Self {
        let mut normalizer = Normalizer::new(&self.policy);
        let rules: Vec<NormalizedRule> = raw_rules(source)
            .filter_map(|raw| normalizer.normalize(raw))
            .collect();
        normalizer.finish_source();
        self.drops.merge(normalizer.stats());
        self.sources += 1;

        for rule in rules {
            self.push(rule);
        }
        self
    }

    /// Classify one normalized rule and admit it to its bucket.
    pub fn push(&mut self, rule: NormalizedRule) {
        let rule = Classifier::new(&self.policy).classify(rule);
        match self.admit(&rule) {
            Ok(()) => self.buckets[rule.bucket.index()].push(rule),
            Err(reason) => {
                log::debug!("Dropped {} rule {:?} ({})", rule.bucket, rule.pattern, reason);
                self.drops.record(reason);
            }
        }
    }

    fn admit(&self, rule: &ClassifiedRule) -> Result<(), DropReason> {
        ContentFilter::new(&self.policy).check(rule)?;
        if rule.bucket.category == Category::RawPattern {
            validate_raw(&rule.pattern)?;
        }
        Ok(())
    }

    /// Configured pinned rules, grouped by bucket.
    fn pinned_rules(&self) -> Vec<Vec<ClassifiedRule>> {
        let mut normalizer = Normalizer::new(&self.policy);
        let classifier = Classifier::new(&self.policy);
        let mut pinned = vec![Vec::new(); BUCKET_COUNT];

        for (ordinal, text) in self.policy.pinned_rules.iter().enumerate() {
            let Some(rule) = normalizer.normalize(RawRule { text, ordinal }) else {
                log::warn!("Pinned rule {:?} is not a network rule, skipped", text);
                continue;
            };
            let mut rule = classifier.classify(rule);
            if rule.bucket.category == Category::RawPattern {
                if let Err(reason) = validate_raw(&rule.pattern) {
                    log::warn!("Pinned rule {:?} skipped ({})", text, reason);
                    continue;
                }
            }
            rule.pinned = true;
            pinned[rule.bucket.index()].push(rule);
        }
        pinned
    }

    /// Compile every bucket into the final rule base.
    pub fn build(self) -> Result<(CompiledRuleBase, BuildReport), CompileError> {
        let pinned = self.pinned_rules();
        let jobs: Vec<BucketJob> = BucketId::all()
            .zip(self.buckets)
            .zip(pinned)
            .map(|((id, rules), pinned)| BucketJob { id, rules, pinned })
            .collect();

        let policy = &self.policy;
        let ranker = &*self.ranker;
        let built = build_buckets(policy, ranker, jobs);

        let mut report = BuildReport {
            sources: self.sources,
            drops: self.drops,
            buckets: Vec::with_capacity(BUCKET_COUNT),
        };
        let mut compiled = Vec::with_capacity(BUCKET_COUNT);
        for result in built {
            let (id, bucket, bucket_report) = result?;
            if bucket_report.final_count > 0 {
                log::info!("{}: {} rules", id, bucket_report.final_count);
            }
            compiled.push((id, bucket));
            report.buckets.push(bucket_report);
        }

        let exceptions: ExactSet = policy.good_domain_exceptions.iter().cloned().collect();
        let rulebase = CompiledRuleBase::new(compiled, exceptions)?;
        Ok((rulebase, report))
    }
}

/// Compile a set of rule sources with one configuration.
pub fn compile_sources<S: AsRef<str>>(
    config: &CompilerConfig,
    sources: &[S],
) -> Result<(CompiledRuleBase, BuildReport), CompileError> {
    let mut builder = RuleSetBuilder::from_config(config)?;
    for source in sources {
        builder.add_source(source.as_ref());
    }
    builder.build()
}

// =============================================================================
// Bucket Compilation
// =============================================================================

struct BucketJob {
    id: BucketId,
    rules: Vec<ClassifiedRule>,
    pinned: Vec<ClassifiedRule>,
}

type BuiltBucket = Result<(BucketId, CompiledBucket, BucketReport), RuleBaseError>;

/// One worker per bucket keeps each alternation's wildcard indices
/// contiguous.
#[cfg(feature = "parallel")]
fn build_buckets(
    policy: &Policy,
    ranker: &dyn RuleRanker,
    jobs: Vec<BucketJob>,
) -> Vec<BuiltBucket> {
    jobs.into_par_iter()
        .map(|job| build_bucket(policy, ranker, job))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn build_buckets(
    policy: &Policy,
    ranker: &dyn RuleRanker,
    jobs: Vec<BucketJob>,
) -> Vec<BuiltBucket> {
    jobs.into_iter()
        .map(|job| build_bucket(policy, ranker, job))
        .collect()
}

fn build_bucket(policy: &Policy, ranker: &dyn RuleRanker, job: BucketJob) -> BuiltBucket {
    let BucketJob { id, rules, pinned } = job;
    let category = id.category;
    let mut report = BucketReport::new(id);
    report.admitted = rules.len() + pinned.len();

    let rules = dedup_rules(rules);
    let ranked = if rules.is_empty() {
        rules
    } else {
        ranker.rank(id, rules)
    };
    let mut rules = dedup_rules(pinned.into_iter().chain(ranked).collect());
    report.unique = rules.len();

    if !category.is_exact() {
        report.wildcard_dropped = apply_wildcard_budget(
            category,
            &mut rules,
            policy.max_wildcards,
            &policy.wildcard_preferences,
        );
        if report.wildcard_dropped > 0 {
            log::warn!(
                "{}: wildcard budget of {} reached, dropped {} rules",
                id,
                policy.max_wildcards.unwrap_or_default(),
                report.wildcard_dropped
            );
        }
    }

    let max = policy.max_rules(category.is_exact());
    report.truncated = truncate_rules(&mut rules, max);
    if report.truncated > 0 {
        log::warn!(
            "{}: truncated from {} to {} rules",
            id,
            rules.len() + report.truncated,
            rules.len()
        );
    }

    let bucket = if category.is_exact() {
        report.final_count = rules.len();
        CompiledBucket::Exact(rules.into_iter().map(|rule| rule.pattern).collect())
    } else {
        let (alternation, dropped, wildcards) = compile_alternation(id, rules)?;
        report.compile_dropped = dropped;
        report.final_count = alternation.len();
        report.wildcards = wildcards;
        CompiledBucket::Pattern(alternation)
    };

    Ok((id, bucket, report))
}

/// Compile the rules of a pattern bucket with a fresh wildcard index.
fn compile_fragments(
    category: Category,
    rules: &[ClassifiedRule],
) -> (Vec<String>, Vec<String>, usize) {
    let mut index = WildcardIndex::new();
    let mut sources = Vec::with_capacity(rules.len());
    let mut fragments = Vec::with_capacity(rules.len());
    for rule in rules {
        fragments.push(compile_rule(category, &rule.pattern, &mut index));
        sources.push(rule.pattern.clone());
    }
    debug_assert_eq!(index.used(), total_wildcards(category, rules));
    (sources, fragments, index.used())
}

fn compiles_alone(category: Category, pattern: &str) -> bool {
    let fragment = compile_rule(category, pattern, &mut WildcardIndex::new());
    PatternAlternation::compile(vec![pattern.to_string()], &[fragment]).is_ok()
}

/// Compile an alternation. When the joined regex is rejected, rules that
/// fail on their own are dropped and the rest recompiled.
fn compile_alternation(
    id: BucketId,
    rules: Vec<ClassifiedRule>,
) -> Result<(PatternAlternation, usize, usize), RuleBaseError> {
    let category = id.category;
    let (sources, fragments, wildcards) = compile_fragments(category, &rules);

    match PatternAlternation::compile(sources, &fragments) {
        Ok(alternation) => Ok((alternation, 0, wildcards)),
        Err(err) => {
            log::warn!("{}: alternation rejected ({}), rebuilding without invalid rules", id, err);
            let before = rules.len();
            let valid: Vec<ClassifiedRule> = rules
                .into_iter()
                .filter(|rule| {
                    let ok = compiles_alone(category, &rule.pattern);
                    if !ok {
                        log::debug!("{}: dropped {:?}", id, rule.pattern);
                    }
                    ok
                })
                .collect();
            let dropped = before - valid.len();

            let (sources, fragments, wildcards) = compile_fragments(category, &valid);
            let alternation = PatternAlternation::compile(sources, &fragments)?;
            Ok((alternation, dropped, wildcards))
        }
    }
}
