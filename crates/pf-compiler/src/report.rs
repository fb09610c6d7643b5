//! Drop reasons and build statistics

use std::fmt;

use pf_core::BucketId;
use serde::Serialize;

/// Why a line did not reach a compiled bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// `! ...`
    Comment,
    /// `[Adblock Plus 2.0]`
    ConfigLine,
    /// Element hiding rule (`##`, `#@#`, `#?#`, `#$#`)
    Selector,
    /// Empty or wildcard-only line
    Blank,
    /// `http://` or `https://` with nothing after it
    EmptyUrl,
    /// Inside a commented-out section
    IgnoredSection,
    /// Carries an option the matcher does not model
    IgnoredOption,
    /// Carries an option outside the recognized vocabulary
    UnsupportedOption,
    /// Exception rule while exceptions are excluded
    ExceptionExcluded,
    /// Bad rule rejected by the content filter
    ContentFilter,
    /// Optioned rule kept out of an expensive alternation
    OptionedPattern,
    /// Raw regex that does not compile
    InvalidRawPattern,
    /// Raw regex with back-references
    RawBackreference,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Comment => "comment",
            Self::ConfigLine => "config line",
            Self::Selector => "selector",
            Self::Blank => "blank",
            Self::EmptyUrl => "empty url",
            Self::IgnoredSection => "ignored section",
            Self::IgnoredOption => "ignored option",
            Self::UnsupportedOption => "unsupported option",
            Self::ExceptionExcluded => "exception excluded",
            Self::ContentFilter => "content filter",
            Self::OptionedPattern => "optioned pattern",
            Self::InvalidRawPattern => "invalid raw pattern",
            Self::RawBackreference => "raw back-reference",
        };
        f.write_str(name)
    }
}

/// Per-reason line counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DropStats {
    pub lines: usize,
    pub accepted: usize,
    pub comments: usize,
    pub config_lines: usize,
    pub selectors: usize,
    pub blank: usize,
    pub empty_urls: usize,
    pub ignored_sections: usize,
    pub ignored_options: usize,
    pub unsupported_options: usize,
    pub dropped_exceptions: usize,
    pub content_filtered: usize,
    pub optioned_patterns: usize,
    pub invalid_raw_patterns: usize,
    pub raw_backreferences: usize,
}

impl DropStats {
    pub fn record(&mut self, reason: DropReason) {
        let counter = match reason {
            DropReason::Comment => &mut self.comments,
            DropReason::ConfigLine => &mut self.config_lines,
            DropReason::Selector => &mut self.selectors,
            DropReason::Blank => &mut self.blank,
            DropReason::EmptyUrl => &mut self.empty_urls,
            DropReason::IgnoredSection => &mut self.ignored_sections,
            DropReason::IgnoredOption => &mut self.ignored_options,
            DropReason::UnsupportedOption => &mut self.unsupported_options,
            DropReason::ExceptionExcluded => &mut self.dropped_exceptions,
            DropReason::ContentFilter => &mut self.content_filtered,
            DropReason::OptionedPattern => &mut self.optioned_patterns,
            DropReason::InvalidRawPattern => &mut self.invalid_raw_patterns,
            DropReason::RawBackreference => &mut self.raw_backreferences,
        };
        *counter += 1;
    }

    pub fn merge(&mut self, other: &DropStats) {
        self.lines += other.lines;
        self.accepted += other.accepted;
        self.comments += other.comments;
        self.config_lines += other.config_lines;
        self.selectors += other.selectors;
        self.blank += other.blank;
        self.empty_urls += other.empty_urls;
        self.ignored_sections += other.ignored_sections;
        self.ignored_options += other.ignored_options;
        self.unsupported_options += other.unsupported_options;
        self.dropped_exceptions += other.dropped_exceptions;
        self.content_filtered += other.content_filtered;
        self.optioned_patterns += other.optioned_patterns;
        self.invalid_raw_patterns += other.invalid_raw_patterns;
        self.raw_backreferences += other.raw_backreferences;
    }
}

/// What happened to one bucket during a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BucketReport {
    pub bucket: String,
    /// Rules classified into the bucket, duplicates included
    pub admitted: usize,
    /// Rules left after de-duplication
    pub unique: usize,
    /// Rules cut by the size cap
    pub truncated: usize,
    /// Rules cut by the wildcard budget
    pub wildcard_dropped: usize,
    /// Rules that failed to compile into the alternation
    pub compile_dropped: usize,
    pub final_count: usize,
    /// Wildcard indices used by the alternation
    pub wildcards: usize,
}

impl BucketReport {
    pub fn new(id: BucketId) -> Self {
        Self {
            bucket: id.name(),
            ..Self::default()
        }
    }
}

/// Statistics for a whole compile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub sources: usize,
    pub drops: DropStats,
    pub buckets: Vec<BucketReport>,
}

impl BuildReport {
    pub fn bucket(&self, id: BucketId) -> Option<&BucketReport> {
        let name = id.name();
        self.buckets.iter().find(|b| b.bucket == name)
    }

    pub fn total_rules(&self) -> usize {
        self.buckets.iter().map(|b| b.final_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_merges_drop_counts() {
        let mut a = DropStats::default();
        a.record(DropReason::Comment);
        a.record(DropReason::Comment);
        a.record(DropReason::ContentFilter);

        let mut b = DropStats::default();
        b.record(DropReason::Comment);
        b.lines = 4;

        a.merge(&b);
        assert_eq!(a.comments, 3);
        assert_eq!(a.content_filtered, 1);
        assert_eq!(a.lines, 4);
    }
}
