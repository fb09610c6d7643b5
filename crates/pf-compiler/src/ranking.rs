//! Rule ranking
//!
//! A ranker reorders (and may shorten) the unique rules of one bucket
//! before truncation. Rules it puts first survive the size cap and the
//! wildcard budget. Rankers only change priority; correctness of the
//! compiled buckets never depends on them.

use pf_core::{BucketId, OptionFlags};
use regex::Regex;

use crate::classifier::ClassifiedRule;
use crate::config::Policy;

pub trait RuleRanker: Send + Sync {
    fn rank(&self, bucket: BucketId, rules: Vec<ClassifiedRule>) -> Vec<ClassifiedRule>;
}

impl<F> RuleRanker for F
where
    F: Fn(BucketId, Vec<ClassifiedRule>) -> Vec<ClassifiedRule> + Send + Sync,
{
    fn rank(&self, bucket: BucketId, rules: Vec<ClassifiedRule>) -> Vec<ClassifiedRule> {
        self(bucket, rules)
    }
}

/// Keep source order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileOrder;

impl RuleRanker for FileOrder {
    fn rank(&self, _bucket: BucketId, rules: Vec<ClassifiedRule>) -> Vec<ClassifiedRule> {
        rules
    }
}

/// Keyword-weighted bootstrap ranking.
///
/// Score: `1 + 1/len + keyword hits + 1` when a high-value option is
/// present. Shorter rules win ties between equally weighted rules, and
/// rules with identical scores keep their source order.
#[derive(Debug, Clone)]
pub struct KeywordRanker {
    keywords: Vec<Regex>,
    high_value_options: OptionFlags,
}

impl KeywordRanker {
    pub fn new(keywords: Vec<Regex>, high_value_options: OptionFlags) -> Self {
        Self {
            keywords,
            high_value_options,
        }
    }

    pub fn from_policy(policy: &Policy) -> Self {
        Self::new(policy.ranking_keywords.clone(), policy.high_value_options)
    }

    pub fn score(&self, rule: &ClassifiedRule) -> f64 {
        let hits: usize = self
            .keywords
            .iter()
            .map(|re| re.find_iter(&rule.pattern).count())
            .sum();
        let option_bonus = if rule.options.intersects(self.high_value_options) {
            1.0
        } else {
            0.0
        };

        1.0 + 1.0 / rule.pattern.len().max(1) as f64 + hits as f64 + option_bonus
    }
}

impl RuleRanker for KeywordRanker {
    fn rank(&self, _bucket: BucketId, rules: Vec<ClassifiedRule>) -> Vec<ClassifiedRule> {
        let mut scored: Vec<(f64, ClassifiedRule)> =
            rules.into_iter().map(|rule| (self.score(&rule), rule)).collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, rule)| rule).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use pf_core::{Category, Polarity};

    const BUCKET: BucketId = BucketId::new(Category::UrlFragment, Polarity::Bad);

    fn rule(pattern: &str, ordinal: usize) -> ClassifiedRule {
        ClassifiedRule {
            bucket: BUCKET,
            pattern: pattern.to_string(),
            options: OptionFlags::empty(),
            ordinal,
            pinned: false,
        }
    }

    fn patterns(rules: &[ClassifiedRule]) -> Vec<&str> {
        rules.iter().map(|r| r.pattern.as_str()).collect()
    }

    #[test]
    fn file_order_is_identity() {
        let rules = vec![rule("b", 0), rule("a", 1)];
        assert_eq!(FileOrder.rank(BUCKET, rules.clone()), rules);
    }

    #[test]
    fn keyword_hits_rank_first() {
        let policy = CompilerConfig::default().policy().unwrap();
        let ranker = KeywordRanker::from_policy(&policy);

        let ranked = ranker.rank(
            BUCKET,
            vec![rule("/qwerty/", 0), rule("/doubleclick/", 1), rule("/pixel-track/", 2)],
        );
        assert_eq!(ranked.last().unwrap().pattern, "/qwerty/");
        assert!(ranker.score(&ranked[0]) >= ranker.score(&ranked[1]));
    }

    #[test]
    fn high_value_options_add_a_point() {
        let ranker = KeywordRanker::new(Vec::new(), OptionFlags::POPUP);
        let plain = rule("abcd", 0);
        let mut popup = rule("abcd", 1);
        popup.options = OptionFlags::POPUP;

        assert_eq!(ranker.score(&plain), 1.25);
        assert_eq!(ranker.score(&popup), 2.25);
    }

    #[test]
    fn equal_scores_keep_source_order() {
        let ranker = KeywordRanker::new(Vec::new(), OptionFlags::empty());
        let ranked = ranker.rank(BUCKET, vec![rule("aa", 0), rule("bb", 1), rule("a", 2)]);
        assert_eq!(patterns(&ranked), vec!["a", "aa", "bb"]);
    }

    #[test]
    fn closures_are_rankers() {
        let reverse = |_: BucketId, mut rules: Vec<ClassifiedRule>| {
            rules.reverse();
            rules
        };
        let ranked = reverse.rank(BUCKET, vec![rule("a", 0), rule("b", 1)]);
        assert_eq!(patterns(&ranked), vec!["b", "a"]);
    }
}
