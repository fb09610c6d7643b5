//! pacfilter Core Library
//!
//! This crate provides the runtime half of pacfilter: the compiled rule base
//! and the decision engine that classifies a (URL, host) pair as ALLOW or
//! BLOCK.
//!
//! # Architecture
//!
//! The compiler partitions filter rules into 14 buckets (7 categories times
//! good/bad polarity). Exact buckets are hash sets, pattern buckets are one
//! compiled alternation each. The engine evaluates the buckets in a fixed
//! order: exceptions as a whole group before any block bucket, exact sets
//! before alternations.
//!
//! # Modules
//!
//! - `types`: Shared type definitions
//! - `url`: Fast URL slicing without allocations
//! - `context`: Per-lookup URL and host projections
//! - `rulebase`: Compiled buckets and the rule base
//! - `alternation`: Linear and backtracking halves of a pattern bucket
//! - `snapshot`: Serializable export format
//! - `engine`: Core decision procedure

mod alternation;
pub mod context;
pub mod engine;
pub mod rulebase;
pub mod snapshot;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use context::DecisionContext;
pub use engine::{DecisionEngine, MatchResult, MatchSource, NoPreFilter, PreFilter};
pub use rulebase::{
    CompiledBucket, CompiledRuleBase, ExactSet, PatternAlternation, RuleBaseError,
};
pub use snapshot::{BucketExport, BucketKind, RuleBaseExport, SnapshotError, EXPORT_VERSION};
pub use types::{BucketId, Category, Decision, OptionFlags, Polarity, BUCKET_COUNT};
