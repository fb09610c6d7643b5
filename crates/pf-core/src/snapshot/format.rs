//! Rule base export format v1
//!
//! A JSON document listing every bucket with its rules, its "has rules"
//! flag and, for pattern buckets, the joined alternation source. This is
//! the whole contract a downstream consumer needs to embed the rule base in
//! another runtime.

use serde::{Deserialize, Serialize};

/// Current format version
pub const EXPORT_VERSION: u32 = 1;

/// Storage strategy of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    /// Hash-set membership
    Exact,
    /// One compiled alternation
    Pattern,
}

/// One exported bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketExport {
    /// Stable bucket name, e.g. `bad_domain_exact`
    pub name: String,
    pub kind: BucketKind,
    pub has_rules: bool,
    /// Source rules in bucket order
    pub rules: Vec<String>,
    /// Alternation source for pattern buckets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

/// The full exported rule base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBaseExport {
    pub version: u32,
    pub buckets: Vec<BucketExport>,
    #[serde(default)]
    pub good_domain_exceptions: Vec<String>,
}
