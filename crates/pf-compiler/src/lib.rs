//! pacfilter Rule Compiler
//!
//! This crate compiles EasyList-style filter rules into the 14-bucket
//! [`CompiledRuleBase`](pf_core::CompiledRuleBase) consumed by the decision
//! engine.
//!
//! # Pipeline
//!
//! - `normalizer`: comments, selectors, `@@` and `$options`
//! - `classifier`: one bucket per rule
//! - `content_filter`: keyword gate for block rules
//! - `pattern`: EasyList patterns to alternation-safe regex fragments
//! - `ranking`: pluggable priority order
//! - `optimizer`: de-duplication, size caps, wildcard budget
//! - `builder`: owns the buckets and assembles the rule base

pub mod builder;
pub mod classifier;
pub mod config;
pub mod content_filter;
pub mod defaults;
pub mod error;
pub mod normalizer;
pub mod optimizer;
pub mod pattern;
pub mod ranking;
pub mod report;

pub use builder::{compile_sources, RuleSetBuilder};
pub use classifier::{ClassifiedRule, Classifier};
pub use config::{CompilerConfig, Policy};
pub use error::{CompileError, ConfigError};
pub use normalizer::{NormalizedRule, Normalizer, RawRule, SectionState};
pub use ranking::{FileOrder, KeywordRanker, RuleRanker};
pub use report::{BucketReport, BuildReport, DropReason, DropStats};
