//! Rule base export and import

use std::collections::HashSet;

use super::format::*;
use crate::rulebase::{
    CompiledBucket, CompiledRuleBase, ExactSet, PatternAlternation, RuleBaseError,
};
use crate::types::BucketId;

/// Error type for snapshot loading.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u32),
    #[error("Unknown bucket: {0}")]
    UnknownBucket(String),
    #[error("Duplicate bucket: {0}")]
    DuplicateBucket(String),
    #[error("Bucket {0} has the wrong kind for its category")]
    KindMismatch(String),
    #[error("Pattern bucket {0} has no regex")]
    MissingRegex(String),
    #[error("Invalid rule base: {0}")]
    RuleBase(#[from] RuleBaseError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompiledRuleBase {
    /// Export every bucket, in index order.
    pub fn export(&self) -> RuleBaseExport {
        let buckets = self
            .buckets()
            .map(|(id, bucket)| BucketExport {
                name: id.name(),
                kind: if bucket.is_exact() {
                    BucketKind::Exact
                } else {
                    BucketKind::Pattern
                },
                has_rules: bucket.non_empty(),
                rules: bucket.rules().to_vec(),
                regex: match bucket {
                    CompiledBucket::Exact(_) => None,
                    CompiledBucket::Pattern(alt) => Some(alt.regex_source().to_string()),
                },
            })
            .collect();

        RuleBaseExport {
            version: EXPORT_VERSION,
            buckets,
            good_domain_exceptions: self.good_domain_exceptions().entries().to_vec(),
        }
    }

    /// Rebuild a rule base from an export. Pattern buckets are recompiled
    /// from their stored regex source.
    pub fn from_export(export: RuleBaseExport) -> Result<Self, SnapshotError> {
        if export.version != EXPORT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(export.version));
        }

        let mut seen = HashSet::new();
        let mut buckets = Vec::with_capacity(export.buckets.len());

        for bucket in export.buckets {
            let id = BucketId::from_name(&bucket.name)
                .ok_or_else(|| SnapshotError::UnknownBucket(bucket.name.clone()))?;
            if !seen.insert(id) {
                return Err(SnapshotError::DuplicateBucket(bucket.name));
            }
            if (bucket.kind == BucketKind::Exact) != id.category.is_exact() {
                return Err(SnapshotError::KindMismatch(bucket.name));
            }

            let compiled = match bucket.kind {
                BucketKind::Exact => CompiledBucket::Exact(bucket.rules.into_iter().collect()),
                BucketKind::Pattern => {
                    let regex = bucket
                        .regex
                        .ok_or_else(|| SnapshotError::MissingRegex(bucket.name.clone()))?;
                    CompiledBucket::Pattern(PatternAlternation::from_source(bucket.rules, regex)?)
                }
            };
            buckets.push((id, compiled));
        }

        let exceptions: ExactSet = export.good_domain_exceptions.into_iter().collect();
        Ok(CompiledRuleBase::new(buckets, exceptions)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    /// Load from JSON produced by [`CompiledRuleBase::to_json`].
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let export: RuleBaseExport = serde_json::from_str(json)?;
        Self::from_export(export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Polarity};

    fn sample() -> CompiledRuleBase {
        let exact = BucketId::new(Category::DomainExact, Polarity::Bad);
        let pattern = BucketId::new(Category::UrlFragment, Polarity::Bad);
        let alt =
            PatternAlternation::compile(vec!["/banner/".to_string()], &[r"/banner/"]).unwrap();
        CompiledRuleBase::new(
            [
                (exact, CompiledBucket::Exact(["ads.example.com"].into_iter().collect())),
                (pattern, CompiledBucket::Pattern(alt)),
            ],
            ["iad.example.com"].into_iter().collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_export_lists_every_bucket() {
        let export = sample().export();
        assert_eq!(export.version, EXPORT_VERSION);
        assert_eq!(export.buckets.len(), crate::types::BUCKET_COUNT);

        let fragment = export
            .buckets
            .iter()
            .find(|b| b.name == "bad_url_fragment")
            .unwrap();
        assert_eq!(fragment.kind, BucketKind::Pattern);
        assert!(fragment.has_rules);
        assert_eq!(fragment.regex.as_deref(), Some("(?i)(?:/banner/)"));

        let empty = export
            .buckets
            .iter()
            .find(|b| b.name == "good_raw_pattern")
            .unwrap();
        assert!(!empty.has_rules);
        assert_eq!(empty.regex.as_deref(), Some("^$"));

        assert_eq!(export.good_domain_exceptions, vec!["iad.example.com"]);
    }

    #[test]
    fn test_json_reload_preserves_matching() {
        let json = sample().to_json().unwrap();
        let loaded = CompiledRuleBase::from_json(&json).unwrap();

        let fragment = loaded.bucket(BucketId::new(Category::UrlFragment, Polarity::Bad));
        assert!(fragment.matches("http://x.com/banner/1.gif"));
        assert!(loaded
            .bucket(BucketId::new(Category::DomainExact, Polarity::Bad))
            .matches("ads.example.com"));
        assert!(loaded.good_domain_exceptions().contains("iad.example.com"));
        assert_eq!(loaded.export(), sample().export());
    }

    #[test]
    fn test_rejects_bad_exports() {
        let mut export = sample().export();
        export.version = 7;
        assert!(matches!(
            CompiledRuleBase::from_export(export),
            Err(SnapshotError::UnsupportedVersion(7))
        ));

        let mut export = sample().export();
        export.buckets[0].name = "good_everything".to_string();
        assert!(matches!(
            CompiledRuleBase::from_export(export),
            Err(SnapshotError::UnknownBucket(_))
        ));

        let mut export = sample().export();
        let first = export.buckets[0].clone();
        export.buckets.push(first);
        assert!(matches!(
            CompiledRuleBase::from_export(export),
            Err(SnapshotError::DuplicateBucket(_))
        ));

        let mut export = sample().export();
        export.buckets[0].kind = BucketKind::Pattern;
        assert!(matches!(
            CompiledRuleBase::from_export(export),
            Err(SnapshotError::KindMismatch(_))
        ));

        assert!(matches!(
            CompiledRuleBase::from_json("{not json"),
            Err(SnapshotError::Json(_))
        ));
    }
}
