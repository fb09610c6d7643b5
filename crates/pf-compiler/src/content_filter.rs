//! Content Filter
//!
//! Second gate after classification. Bad rules only reach a bucket when
//! they match the keyword filter or carry a high-value option; exception
//! rules always pass so a missing exception never re-enables a block.

use pf_core::{Category, Polarity};

use crate::classifier::ClassifiedRule;
use crate::config::Policy;
use crate::report::DropReason;

pub struct ContentFilter<'p> {
    policy: &'p Policy,
}

impl<'p> ContentFilter<'p> {
    pub fn new(policy: &'p Policy) -> Self {
        Self { policy }
    }

    pub fn check(&self, rule: &ClassifiedRule) -> Result<(), DropReason> {
        if self.policy.drop_optioned_patterns
            && !rule.options.is_empty()
            && matches!(
                rule.bucket.category,
                Category::HostPathPattern | Category::UrlFragment
            )
        {
            return Err(DropReason::OptionedPattern);
        }

        if rule.bucket.polarity == Polarity::Good {
            return Ok(());
        }

        let admitted = rule.options.intersects(self.policy.high_value_options)
            || self
                .policy
                .content_filter
                .as_ref()
                .map_or(true, |re| re.is_match(&rule.pattern));

        if admitted {
            Ok(())
        } else {
            Err(DropReason::ContentFilter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use pf_core::{BucketId, OptionFlags};

    fn rule(
        category: Category,
        polarity: Polarity,
        pattern: &str,
        options: OptionFlags,
    ) -> ClassifiedRule {
        ClassifiedRule {
            bucket: BucketId::new(category, polarity),
            pattern: pattern.to_string(),
            options,
            ordinal: 0,
            pinned: false,
        }
    }

    #[test]
    fn bad_rules_need_a_keyword_or_high_value_option() {
        let policy = CompilerConfig::default().policy().unwrap();
        let filter = ContentFilter::new(&policy);

        let keyword = rule(
            Category::DomainExact,
            Polarity::Bad,
            "doubleclick.net",
            OptionFlags::empty(),
        );
        let plain = rule(Category::DomainExact, Polarity::Bad, "qwerty.org", OptionFlags::empty());
        let popup = rule(Category::DomainExact, Polarity::Bad, "qwerty.org", OptionFlags::POPUP);
        let raw = rule(Category::RawPattern, Polarity::Bad, r"qwerty\d", OptionFlags::empty());

        assert_eq!(filter.check(&keyword), Ok(()));
        assert_eq!(filter.check(&plain), Err(DropReason::ContentFilter));
        assert_eq!(filter.check(&popup), Ok(()));
        assert_eq!(filter.check(&raw), Err(DropReason::ContentFilter));
    }

    #[test]
    fn good_rules_are_never_keyword_filtered() {
        let policy = CompilerConfig::default().policy().unwrap();
        let filter = ContentFilter::new(&policy);
        let good = rule(Category::DomainExact, Polarity::Good, "qwerty.org", OptionFlags::empty());
        assert_eq!(filter.check(&good), Ok(()));
    }

    #[test]
    fn optioned_patterns_are_kept_out_of_expensive_buckets() {
        let policy = CompilerConfig::default().policy().unwrap();
        let filter = ContentFilter::new(&policy);

        for polarity in Polarity::ALL {
            let fragment = rule(Category::UrlFragment, polarity, "/ads/", OptionFlags::THIRD_PARTY);
            assert_eq!(filter.check(&fragment), Err(DropReason::OptionedPattern));
        }
        let exact = rule(
            Category::DomainExact,
            Polarity::Bad,
            "qwerty.org",
            OptionFlags::THIRD_PARTY,
        );
        assert_eq!(filter.check(&exact), Ok(()));

        let config = CompilerConfig {
            drop_optioned_patterns: false,
            ..CompilerConfig::default()
        };
        let policy = config.policy().unwrap();
        let fragment =
            rule(Category::UrlFragment, Polarity::Bad, "/ads/", OptionFlags::THIRD_PARTY);
        assert_eq!(ContentFilter::new(&policy).check(&fragment), Ok(()));
    }

    #[test]
    fn empty_keyword_list_admits_everything() {
        let config = CompilerConfig {
            content_keywords: Vec::new(),
            ..CompilerConfig::default()
        };
        let policy = config.policy().unwrap();
        let plain = rule(Category::DomainExact, Polarity::Bad, "qwerty.org", OptionFlags::empty());
        assert_eq!(ContentFilter::new(&policy).check(&plain), Ok(()));
    }
}
