//! Bucket optimizer
//!
//! De-duplication, size truncation and the per-alternation wildcard
//! budget. Every pass is stable: rules it keeps stay in their relative
//! order, and rules it drops always come from the low-priority tail.

use std::collections::HashSet;

use pf_core::Category;
use regex::Regex;

use crate::classifier::ClassifiedRule;
use crate::pattern::count_wildcards;

/// Drop repeated patterns, keeping the first occurrence.
pub fn dedup_rules(rules: Vec<ClassifiedRule>) -> Vec<ClassifiedRule> {
    let mut seen: HashSet<String> = HashSet::with_capacity(rules.len());
    rules
        .into_iter()
        .filter(|rule| seen.insert(rule.pattern.clone()))
        .collect()
}

/// Cut a bucket to `max` rules. Pinned rules are always kept and take
/// their room from the unpinned tail. Returns the number of rules dropped.
pub fn truncate_rules(rules: &mut Vec<ClassifiedRule>, max: Option<usize>) -> usize {
    let Some(max) = max else {
        return 0;
    };
    if rules.len() <= max {
        return 0;
    }

    let before = rules.len();
    let pinned = rules.iter().filter(|rule| rule.pinned).count();
    let mut room = max.saturating_sub(pinned);
    rules.retain(|rule| {
        if rule.pinned {
            true
        } else if room > 0 {
            room -= 1;
            true
        } else {
            false
        }
    });
    before - rules.len()
}

/// Rank key for wildcard rules: one flag per preference, set when the
/// preference does not match. Earlier preferences are more significant.
fn preference_key(preferences: &[Regex], pattern: &str) -> Vec<bool> {
    preferences.iter().map(|re| !re.is_match(pattern)).collect()
}

/// Order a pattern bucket for the wildcard budget and apply it.
///
/// Wildcard-free rules come first. Wildcard rules follow, pinned ones
/// first, then by `preferences`. Rules are admitted while the running
/// wildcard count stays within `budget`; the first rule that overflows it
/// and every rule after it are dropped. Returns the number of rules
/// dropped.
pub fn apply_wildcard_budget(
    category: Category,
    rules: &mut Vec<ClassifiedRule>,
    budget: Option<usize>,
    preferences: &[Regex],
) -> usize {
    let (plain, mut starred): (Vec<_>, Vec<_>) = rules
        .drain(..)
        .partition(|rule| count_wildcards(category, &rule.pattern) == 0);

    starred.sort_by_cached_key(|rule| (!rule.pinned, preference_key(preferences, &rule.pattern)));

    let mut dropped = 0;
    if let Some(budget) = budget {
        let mut total = 0;
        let keep = starred
            .iter()
            .position(|rule| {
                total += count_wildcards(category, &rule.pattern);
                total > budget
            })
            .unwrap_or(starred.len());
        dropped = starred.len() - keep;
        starred.truncate(keep);
    }

    rules.extend(plain);
    rules.extend(starred);
    dropped
}

/// Wildcard indices a bucket's alternation will use.
pub fn total_wildcards(category: Category, rules: &[ClassifiedRule]) -> usize {
    rules
        .iter()
        .map(|rule| count_wildcards(category, &rule.pattern))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::{BucketId, OptionFlags, Polarity};

    fn rule(pattern: &str, ordinal: usize) -> ClassifiedRule {
        ClassifiedRule {
            bucket: BucketId::new(Category::UrlFragment, Polarity::Bad),
            pattern: pattern.to_string(),
            options: OptionFlags::empty(),
            ordinal,
            pinned: false,
        }
    }

    fn pinned(pattern: &str) -> ClassifiedRule {
        ClassifiedRule {
            pinned: true,
            ..rule(pattern, 0)
        }
    }

    fn patterns(rules: &[ClassifiedRule]) -> Vec<&str> {
        rules.iter().map(|r| r.pattern.as_str()).collect()
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let rules = vec![rule("a", 0), rule("b", 1), rule("a", 2), rule("c", 3), rule("b", 4)];
        let deduped = dedup_rules(rules);
        assert_eq!(patterns(&deduped), vec!["a", "b", "c"]);
        assert_eq!(deduped[0].ordinal, 0);

        let again = dedup_rules(deduped.clone());
        assert_eq!(again, deduped);
    }

    #[test]
    fn test_truncate_keeps_head() {
        let mut rules = vec![rule("a", 0), rule("b", 1), rule("c", 2)];
        assert_eq!(truncate_rules(&mut rules, Some(2)), 1);
        assert_eq!(patterns(&rules), vec!["a", "b"]);

        assert_eq!(truncate_rules(&mut rules, None), 0);
        assert_eq!(truncate_rules(&mut rules, Some(5)), 0);
    }

    #[test]
    fn test_truncate_spares_pinned_rules() {
        let mut rules = vec![pinned("p1"), pinned("p2"), rule("a", 0), rule("b", 1)];
        assert_eq!(truncate_rules(&mut rules, Some(3)), 1);
        assert_eq!(patterns(&rules), vec!["p1", "p2", "a"]);

        assert_eq!(truncate_rules(&mut rules, Some(1)), 1);
        assert_eq!(patterns(&rules), vec!["p1", "p2"]);
    }

    #[test]
    fn test_wildcard_budget_drops_tail() {
        let mut rules = vec![
            rule("a*b", 0),
            rule("plain", 1),
            rule("c*d*e", 2),
            rule("f*g", 3),
        ];
        let dropped = apply_wildcard_budget(Category::UrlFragment, &mut rules, Some(2), &[]);

        assert_eq!(dropped, 2);
        assert_eq!(patterns(&rules), vec!["plain", "a*b"]);
        assert_eq!(total_wildcards(Category::UrlFragment, &rules), 1);
    }

    #[test]
    fn test_wildcard_budget_stops_at_first_overflow() {
        // `f*g` would still fit after `c*d*e` overflows, but everything past
        // the first overflow goes.
        let mut rules = vec![rule("a*b", 0), rule("c*d*e", 1), rule("f*g", 2)];
        apply_wildcard_budget(Category::UrlFragment, &mut rules, Some(2), &[]);
        assert_eq!(patterns(&rules), vec!["a*b"]);
    }

    #[test]
    fn test_wildcard_preferences_order_admission() {
        let preferences = vec![
            Regex::new("(?i)track").unwrap(),
            Regex::new("(?i)beacon").unwrap(),
        ];
        let mut rules = vec![
            rule("x*y", 0),
            rule("beacon*z", 1),
            rule("Track*beacon", 2),
            rule("track*q", 3),
        ];
        apply_wildcard_budget(Category::UrlFragment, &mut rules, None, &preferences);
        assert_eq!(patterns(&rules), vec!["Track*beacon", "track*q", "beacon*z", "x*y"]);

        apply_wildcard_budget(Category::UrlFragment, &mut rules, Some(2), &preferences);
        assert_eq!(patterns(&rules), vec!["Track*beacon", "track*q"]);
    }

    #[test]
    fn test_pinned_wildcards_go_first() {
        let mut rules = vec![rule("track*a", 0), pinned("p*q")];
        let preferences = vec![Regex::new("(?i)track").unwrap()];
        apply_wildcard_budget(Category::UrlFragment, &mut rules, Some(1), &preferences);
        assert_eq!(patterns(&rules), vec!["p*q"]);
    }

    #[test]
    fn test_raw_patterns_use_no_budget() {
        let mut rules = vec![rule(r"a.*b", 0), rule(r"c.*d", 1)];
        let dropped = apply_wildcard_budget(Category::RawPattern, &mut rules, Some(0), &[]);
        assert_eq!(dropped, 0);
        assert_eq!(rules.len(), 2);
    }
}
