//! Compiler configuration
//!
//! [`CompilerConfig`] is the serializable form loaded from JSON. [`Policy`]
//! is the validated form the pipeline stages read, with every keyword list
//! compiled once.

use std::fs;
use std::path::Path;

use pf_core::OptionFlags;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::ConfigError;

/// Compiler settings. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Per exact bucket cap (`None` = unlimited)
    pub max_exact_rules: Option<usize>,
    /// Per pattern bucket cap
    pub max_pattern_rules: Option<usize>,
    /// Per alternation wildcard budget
    pub max_wildcards: Option<usize>,
    /// Keep `@@` exception rules
    pub include_exceptions: bool,
    /// Keep optioned rules out of host-path and URL fragment alternations
    pub drop_optioned_patterns: bool,
    pub ignored_options: Vec<String>,
    pub high_value_options: Vec<String>,
    pub content_keywords: Vec<String>,
    pub ranking_keywords: Vec<String>,
    pub wildcard_preferences: Vec<String>,
    pub ignored_sections: Vec<String>,
    pub path_extensions: Vec<String>,
    /// Rule lines compiled ahead of everything else in their bucket
    pub pinned_rules: Vec<String>,
    /// Hosts forced to BLOCK
    pub good_domain_exceptions: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_exact_rules: Some(3999),
            max_pattern_rules: Some(3999),
            max_wildcards: Some(999),
            include_exceptions: true,
            drop_optioned_patterns: true,
            ignored_options: defaults::strings(defaults::IGNORED_OPTIONS),
            high_value_options: defaults::strings(defaults::HIGH_VALUE_OPTIONS),
            content_keywords: defaults::content_keywords(),
            ranking_keywords: defaults::strings(defaults::RANKING_KEYWORDS),
            wildcard_preferences: defaults::strings(defaults::WILDCARD_PREFERENCES),
            ignored_sections: defaults::strings(defaults::IGNORED_SECTIONS),
            path_extensions: defaults::strings(defaults::PATH_EXTENSIONS),
            pinned_rules: defaults::strings(defaults::PINNED_RULES),
            good_domain_exceptions: defaults::strings(defaults::GOOD_DOMAIN_EXCEPTIONS),
        }
    }
}

impl CompilerConfig {
    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the config and compile its keyword lists.
    pub fn policy(&self) -> Result<Policy, ConfigError> {
        Policy::new(self)
    }
}

// =============================================================================
// Policy
// =============================================================================

/// Validated configuration shared by the pipeline stages.
#[derive(Debug, Clone)]
pub struct Policy {
    pub max_exact_rules: Option<usize>,
    pub max_pattern_rules: Option<usize>,
    pub max_wildcards: Option<usize>,
    pub include_exceptions: bool,
    pub drop_optioned_patterns: bool,
    pub ignored_options: OptionFlags,
    pub high_value_options: OptionFlags,
    /// `None` admits every rule
    pub content_filter: Option<Regex>,
    pub ranking_keywords: Vec<Regex>,
    /// Most significant first
    pub wildcard_preferences: Vec<Regex>,
    /// `None` never opens an ignored section
    pub ignored_sections: Option<Regex>,
    pub path_extensions: Option<Regex>,
    pub pinned_rules: Vec<String>,
    pub good_domain_exceptions: Vec<String>,
}

impl Policy {
    pub fn new(config: &CompilerConfig) -> Result<Self, ConfigError> {
        let content_filter = match join_alternation("content_keywords", &config.content_keywords)? {
            Some(alternation) => {
                Some(build_regex("content_keywords", &format!("(?i){alternation}"))?)
            }
            None => None,
        };

        let escaped_sections: Vec<String> =
            config.ignored_sections.iter().map(|s| regex::escape(s)).collect();
        let ignored_sections = match join_alternation("ignored_sections", &escaped_sections)? {
            Some(alternation) => Some(build_regex("ignored_sections", &alternation)?),
            None => None,
        };

        let path_extensions = match join_alternation("path_extensions", &config.path_extensions)? {
            Some(alternation) => {
                Some(build_regex("path_extensions", &format!(r"(?i)\.{alternation}$"))?)
            }
            None => None,
        };

        Ok(Self {
            max_exact_rules: config.max_exact_rules,
            max_pattern_rules: config.max_pattern_rules,
            max_wildcards: config.max_wildcards,
            include_exceptions: config.include_exceptions,
            drop_optioned_patterns: config.drop_optioned_patterns,
            ignored_options: parse_options("ignored_options", &config.ignored_options)?,
            high_value_options: parse_options("high_value_options", &config.high_value_options)?,
            content_filter,
            ranking_keywords: build_case_insensitive("ranking_keywords", &config.ranking_keywords)?,
            wildcard_preferences: build_case_insensitive(
                "wildcard_preferences",
                &config.wildcard_preferences,
            )?,
            ignored_sections,
            path_extensions,
            pinned_rules: config.pinned_rules.clone(),
            good_domain_exceptions: config
                .good_domain_exceptions
                .iter()
                .map(|host| host.trim().to_ascii_lowercase())
                .filter(|host| !host.is_empty())
                .collect(),
        })
    }

    /// Size cap for a bucket of the given kind.
    pub fn max_rules(&self, exact: bool) -> Option<usize> {
        if exact {
            self.max_exact_rules
        } else {
            self.max_pattern_rules
        }
    }
}

fn build_regex(field: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::Regex {
        field,
        pattern: pattern.to_string(),
        source: Box::new(source),
    })
}

fn build_case_insensitive(
    field: &'static str,
    patterns: &[String],
) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| build_regex(field, &format!("(?i){pattern}")))
        .collect()
}

/// Validate each entry alone, then join them. Empty lists give `None`.
fn join_alternation(
    field: &'static str,
    patterns: &[String],
) -> Result<Option<String>, ConfigError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    for pattern in patterns {
        build_regex(field, pattern)?;
    }
    Ok(Some(format!("(?:{})", patterns.join("|"))))
}

fn parse_options(field: &'static str, names: &[String]) -> Result<OptionFlags, ConfigError> {
    OptionFlags::parse_options(names.iter().map(String::as_str)).map_err(|name| {
        ConfigError::UnknownOption {
            field,
            name: name.to_string(),
        }
    })
}
