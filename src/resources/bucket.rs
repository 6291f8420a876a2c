//! Object storage bucket resource
//!
//! Naming rule: 3-63 characters of lowercase letters, digits, `.` and `-`,
//! starting and ending with a letter or digit.

use infra_draft_core::{
    FieldSpec, Identity, Keyed, List, Merge, Operation, ReplaceList, ResourceSchema, Scalar,
    ValidationError,
};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use super::{group_operations, Built, Resource, ResourceKind, StepError};
use crate::registry::{BuiltResource, Registry};

fn bucket_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").expect("bucket name pattern is valid")
    })
}

/// Server-side encryption mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encryption {
    S3Managed,
    Kms,
    None,
}

impl fmt::Display for Encryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encryption::S3Managed => write!(f, "s3_managed"),
            Encryption::Kms => write!(f, "kms"),
            Encryption::None => write!(f, "none"),
        }
    }
}

/// Expire objects under `prefix` after `expire_days`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleRule {
    #[serde(default)]
    pub prefix: String,
    pub expire_days: u32,
}

pub struct Bucket;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketFields {
    pub versioned: Scalar<bool>,
    pub encryption: Scalar<Encryption>,
    pub kms_key: Scalar<String>,
    pub public_read: Scalar<bool>,
    pub lifecycle_rules: List<LifecycleRule>,
    pub cors_origins: ReplaceList<String>,
    pub tags: Keyed<String, String>,
}

impl Merge for BucketFields {
    fn merge(self, later: Self) -> Self {
        Self {
            versioned: self.versioned.merge(later.versioned),
            encryption: self.encryption.merge(later.encryption),
            kms_key: self.kms_key.merge(later.kms_key),
            public_read: self.public_read.merge(later.public_read),
            lifecycle_rules: self.lifecycle_rules.merge(later.lifecycle_rules),
            cors_origins: self.cors_origins.merge(later.cors_origins),
            tags: self.tags.merge(later.tags),
        }
    }
}

#[derive(Debug, Clone)]
pub enum BucketScalar {
    Versioned(bool),
    Encryption(Encryption),
    KmsKey(String),
    PublicRead(bool),
    /// Replaces any earlier origin list
    CorsOrigins(Vec<String>),
}

#[derive(Debug, Clone)]
pub enum BucketList {
    LifecycleRules(Vec<LifecycleRule>),
    Tags(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketConfig {
    pub name: String,
    pub versioned: bool,
    pub encryption: Encryption,
    pub kms_key: Option<String>,
    pub public_read: bool,
    pub lifecycle_rules: Vec<LifecycleRule>,
    pub cors_origins: Vec<String>,
    pub tags: BTreeMap<String, String>,
}

impl ResourceSchema for Bucket {
    const KIND: &'static str = "bucket";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::optional("versioned", "false", "Keep every object version"),
        FieldSpec::optional("encryption", "s3_managed", "s3_managed | kms | none"),
        FieldSpec::optional_unset("kms_key", "Key id; required when encryption = kms"),
        FieldSpec::optional("public_read", "false", "Allow anonymous reads"),
        FieldSpec::list("lifecycle_rules", "Expiration rules ({ prefix, expire_days })"),
        FieldSpec::replace_list("cors_origins", "Allowed CORS origins; later list replaces"),
        FieldSpec::keyed("tags", "Key/value tags; later value wins per key"),
    ];

    type Fields = BucketFields;
    type Scalar = BucketScalar;
    type List = BucketList;
    type Config = BucketConfig;
    type Handle = String;

    fn set_scalar(fields: &mut BucketFields, op: BucketScalar) {
        match op {
            BucketScalar::Versioned(v) => fields.versioned.set(v),
            BucketScalar::Encryption(e) => fields.encryption.set(e),
            BucketScalar::KmsKey(k) => fields.kms_key.set(k),
            BucketScalar::PublicRead(p) => fields.public_read.set(p),
            BucketScalar::CorsOrigins(origins) => fields.cors_origins.replace(origins),
        }
    }

    fn append_list(fields: &mut BucketFields, op: BucketList) {
        match op {
            BucketList::LifecycleRules(rules) => fields.lifecycle_rules.extend(rules),
            BucketList::Tags(tags) => fields.tags.extend(tags),
        }
    }

    fn resolve(identity: &Identity, fields: &BucketFields) -> Result<BucketConfig, ValidationError> {
        if !bucket_name_pattern().is_match(identity.as_str()) {
            return Err(ValidationError::invalid(
                "name",
                format!(
                    "'{}' must be 3-63 lowercase letters, digits, '.' or '-'",
                    identity
                ),
            ));
        }

        let encryption = fields.encryption.get_or(Encryption::S3Managed);
        let kms_key = match encryption {
            Encryption::Kms => Some(fields.kms_key.require("kms_key")?.clone()),
            _ => fields.kms_key.get().cloned(),
        };

        Ok(BucketConfig {
            name: identity.to_string(),
            versioned: fields.versioned.get_or(false),
            encryption,
            kms_key,
            public_read: fields.public_read.get_or(false),
            lifecycle_rules: fields.lifecycle_rules.to_vec(),
            cors_origins: fields.cors_origins.items().to_vec(),
            tags: fields.tags.entries().clone(),
        })
    }

    fn check(config: &BucketConfig) -> Result<(), ValidationError> {
        if config.kms_key.is_some() && config.encryption != Encryption::Kms {
            return Err(ValidationError::combination(format!(
                "kms_key requires encryption = kms (found {})",
                config.encryption
            )));
        }
        if config.public_read && config.encryption == Encryption::Kms {
            return Err(ValidationError::combination(
                "public_read buckets cannot use kms encryption",
            ));
        }
        if let Some(rule) = config.lifecycle_rules.iter().find(|r| r.expire_days == 0) {
            return Err(ValidationError::invalid(
                "lifecycle_rules",
                format!("rule for prefix '{}' must expire after at least one day", rule.prefix),
            ));
        }
        Ok(())
    }
}

/// Manifest step for a bucket
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketStep {
    pub versioned: Option<bool>,
    pub encryption: Option<Encryption>,
    pub kms_key: Option<String>,
    pub public_read: Option<bool>,
    pub lifecycle_rules: Option<Vec<LifecycleRule>>,
    pub cors_origins: Option<Vec<String>>,
    pub tags: Option<BTreeMap<String, String>>,
    pub group: Option<Vec<BucketStep>>,
}

impl Resource for Bucket {
    const RESOURCE_KIND: ResourceKind = ResourceKind::Bucket;

    type Step = BucketStep;

    fn operations(step: BucketStep, registry: &Registry) -> Result<Vec<Operation<Bucket>>, StepError> {
        let mut ops = Vec::new();
        if let Some(v) = step.versioned {
            ops.push(Operation::set(BucketScalar::Versioned(v)));
        }
        if let Some(e) = step.encryption {
            ops.push(Operation::set(BucketScalar::Encryption(e)));
        }
        if let Some(k) = step.kms_key {
            ops.push(Operation::set(BucketScalar::KmsKey(k)));
        }
        if let Some(p) = step.public_read {
            ops.push(Operation::set(BucketScalar::PublicRead(p)));
        }
        if let Some(origins) = step.cors_origins {
            ops.push(Operation::set(BucketScalar::CorsOrigins(origins)));
        }
        if let Some(rules) = step.lifecycle_rules {
            ops.push(Operation::append(BucketList::LifecycleRules(rules)));
        }
        if let Some(tags) = step.tags {
            ops.push(Operation::append(BucketList::Tags(tags.into_iter().collect())));
        }
        ops.extend(group_operations::<Bucket>(step.group, registry)?);
        Ok(ops)
    }

    fn synthesize(identity: &Identity, config: &BucketConfig) -> Value {
        let lifecycle: Vec<Value> = config
            .lifecycle_rules
            .iter()
            .map(|rule| json!({ "prefix": rule.prefix, "expirationDays": rule.expire_days }))
            .collect();

        json!({
            "bucketName": identity.as_str(),
            "versioned": config.versioned,
            "encryption": config.encryption,
            "encryptionKey": config.kms_key,
            "publicReadAccess": config.public_read,
            "lifecycleRules": lifecycle,
            "cors": { "allowedOrigins": config.cors_origins },
            "tags": config.tags,
        })
    }

    fn into_built(built: Built<Bucket>) -> BuiltResource {
        BuiltResource::Bucket(built)
    }

    fn from_built(resource: &BuiltResource) -> Option<&Built<Bucket>> {
        match resource {
            BuiltResource::Bucket(bucket) => Some(bucket),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infra_draft_core::Draft;

    fn bucket(name: &str) -> Draft<Bucket> {
        Draft::create(name)
    }

    #[test]
    fn test_defaults() {
        let config = bucket("assets").resolve().unwrap();
        assert!(!config.versioned);
        assert_eq!(config.encryption, Encryption::S3Managed);
        assert_eq!(config.kms_key, None);
        assert!(!config.public_read);
    }

    #[test]
    fn test_name_rule() {
        for bad in ["ab", "Assets", "-assets", "assets-", "my_bucket"] {
            let err = bucket(bad).resolve().unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidValue { field: "name", .. }),
                "{} should be rejected",
                bad
            );
        }
        assert!(bucket("my.assets-01").resolve().is_ok());
    }

    #[test]
    fn test_kms_requires_key() {
        let err = bucket("assets")
            .set(BucketScalar::Encryption(Encryption::Kms))
            .resolve()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingRequiredField { field: "kms_key" });

        let config = bucket("assets")
            .set(BucketScalar::Encryption(Encryption::Kms))
            .set(BucketScalar::KmsKey("key-1".to_string()))
            .resolve()
            .unwrap();
        assert_eq!(config.kms_key.as_deref(), Some("key-1"));
    }

    #[test]
    fn test_key_without_kms_is_invalid_combination() {
        let err = bucket("assets")
            .set(BucketScalar::KmsKey("key-1".to_string()))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFieldCombination { .. }));
    }

    #[test]
    fn test_public_read_with_kms_rejected() {
        let err = bucket("assets")
            .set(BucketScalar::Encryption(Encryption::Kms))
            .set(BucketScalar::KmsKey("key-1".to_string()))
            .set(BucketScalar::PublicRead(true))
            .resolve()
            .unwrap_err();
        assert!(err.to_string().contains("public_read"));
    }

    #[test]
    fn test_lifecycle_rules_accumulate() {
        let rule = |prefix: &str| LifecycleRule {
            prefix: prefix.to_string(),
            expire_days: 30,
        };
        let config = bucket("assets")
            .append(BucketList::LifecycleRules(vec![rule("logs/")]))
            .append(BucketList::LifecycleRules(vec![rule("tmp/")]))
            .resolve()
            .unwrap();
        assert_eq!(config.lifecycle_rules, vec![rule("logs/"), rule("tmp/")]);
    }

    #[test]
    fn test_zero_day_lifecycle_rejected() {
        let err = bucket("assets")
            .append(BucketList::LifecycleRules(vec![LifecycleRule {
                prefix: "logs/".to_string(),
                expire_days: 0,
            }]))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { field: "lifecycle_rules", .. }));
    }

    #[test]
    fn test_cors_origins_replace() {
        let config = bucket("assets")
            .set(BucketScalar::CorsOrigins(vec!["https://a.example".to_string()]))
            .set(BucketScalar::CorsOrigins(vec!["https://b.example".to_string()]))
            .resolve()
            .unwrap();
        assert_eq!(config.cors_origins, vec!["https://b.example"]);
    }

    #[test]
    fn test_tags_merge_by_key() {
        let tag = |k: &str, v: &str| (k.to_string(), v.to_string());
        let config = bucket("assets")
            .append(BucketList::Tags(vec![tag("team", "infra"), tag("env", "dev")]))
            .append(BucketList::Tags(vec![tag("env", "prod")]))
            .resolve()
            .unwrap();
        assert_eq!(config.tags.get("env").map(String::as_str), Some("prod"));
        assert_eq!(config.tags.len(), 2);
    }

    #[test]
    fn test_synthesize() {
        let built = bucket("assets")
            .set(BucketScalar::Versioned(true))
            .finalize(Bucket::synthesize)
            .unwrap();
        assert_eq!(built.target()["bucketName"], "assets");
        assert_eq!(built.target()["versioned"], true);
        assert_eq!(built.target()["encryption"], "s3_managed");
    }
}
