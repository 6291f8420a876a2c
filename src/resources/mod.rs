//! Resource builders
//!
//! Each resource type parameterizes the generic draft core with its fields,
//! defaults and rules, plus the pieces the manifest needs: a step format
//! and a conversion into the target record handed to the external SDK.

mod bucket;
mod ingress;
mod job;
mod queue;

use infra_draft_core::{FieldSpec, Finalized, Identity, Operation, ResourceSchema};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::registry::{BuiltResource, Registry};

pub use bucket::{Bucket, BucketConfig, BucketFields, BucketList, BucketScalar, BucketStep, Encryption, LifecycleRule};
pub use ingress::{IngressConfig, IngressFields, IngressList, IngressRule, IngressScalar, IngressStep, Ports, Protocol};
pub use job::{Job, JobConfig, JobFields, JobList, JobScalar, JobStep};
pub use queue::{DeadLetter, Queue, QueueConfig, QueueFields, QueueList, QueueScalar, QueueStep};

/// A finalized resource whose target is a JSON record.
pub type Built<R> = Finalized<R, Value>;

/// Resource kinds known to the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Job,
    Bucket,
    Queue,
    IngressRule,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Job,
        ResourceKind::Bucket,
        ResourceKind::Queue,
        ResourceKind::IngressRule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Job => Job::KIND,
            ResourceKind::Bucket => Bucket::KIND,
            ResourceKind::Queue => Queue::KIND,
            ResourceKind::IngressRule => IngressRule::KIND,
        }
    }

    /// Declared fields, excluding the identity
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            ResourceKind::Job => Job::FIELDS,
            ResourceKind::Bucket => Bucket::FIELDS,
            ResourceKind::Queue => Queue::FIELDS,
            ResourceKind::IngressRule => IngressRule::FIELDS,
        }
    }

    /// Suffix used in logical ids, e.g. `Queue` in `OrdersQueue`
    pub fn type_suffix(&self) -> &'static str {
        match self {
            ResourceKind::Job => "Job",
            ResourceKind::Bucket => "Bucket",
            ResourceKind::Queue => "Queue",
            ResourceKind::IngressRule => "IngressRule",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| StepError::Invalid(format!("unknown resource kind '{}'", s)))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure turning a manifest step into operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("unknown reference to {kind} '{name}'")]
    UnknownReference { kind: ResourceKind, name: String },

    #[error("{0}")]
    Invalid(String),
}

/// A resource type the manifest can build.
pub trait Resource: ResourceSchema<Handle = String> {
    const RESOURCE_KIND: ResourceKind;

    /// One manifest op table
    type Step: DeserializeOwned;

    /// Expand a step into operations; references resolve against `registry`.
    fn operations(step: Self::Step, registry: &Registry) -> Result<Vec<Operation<Self>>, StepError>;

    /// Convert a resolved configuration into the target record.
    fn synthesize(identity: &Identity, config: &Self::Config) -> Value;

    /// Resources this configuration refers to.
    fn references(_config: &Self::Config) -> Vec<(ResourceKind, String)> {
        Vec::new()
    }

    fn into_built(built: Built<Self>) -> BuiltResource;

    fn from_built(resource: &BuiltResource) -> Option<&Built<Self>>;
}

/// Expand an optional nested group of steps into a single `Nested` operation.
pub(crate) fn group_operations<R: Resource>(
    group: Option<Vec<R::Step>>,
    registry: &Registry,
) -> Result<Option<Operation<R>>, StepError> {
    let Some(steps) = group else {
        return Ok(None);
    };
    let mut ops = Vec::new();
    for step in steps {
        ops.extend(R::operations(step, registry)?);
    }
    Ok(Some(Operation::Nested(ops)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_match_schemas() {
        for kind in ResourceKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("ingress_rule".parse::<ResourceKind>().unwrap(), ResourceKind::IngressRule);
        assert!("database".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_every_kind_declares_fields() {
        for kind in ResourceKind::ALL {
            assert!(!kind.fields().is_empty(), "{} has no fields", kind);
        }
    }

    #[test]
    fn test_fields_without_default_report_none() {
        let default_of = |kind: ResourceKind, name: &str| {
            kind.fields()
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.class.default_value())
        };
        assert_eq!(default_of(ResourceKind::Bucket, "kms_key"), Some(None));
        assert_eq!(default_of(ResourceKind::Queue, "dead_letter"), Some(None));
        assert_eq!(default_of(ResourceKind::Job, "retries"), Some(Some("3")));

        for kind in ResourceKind::ALL {
            for field in kind.fields() {
                assert_ne!(field.class.default_value(), Some("-"), "{}.{}", kind, field.name);
            }
        }
    }
}
