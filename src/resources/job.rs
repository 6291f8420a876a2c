//! Batch job resource

use infra_draft_core::{
    FieldSpec, Identity, List, Merge, Operation, ResourceSchema, Scalar, ValidationError,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{group_operations, Built, Resource, ResourceKind, StepError};
use crate::registry::{BuiltResource, Registry};

/// Default retry attempts
pub const DEFAULT_RETRIES: u32 = 3;

/// Default timeout (10 minutes)
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 600;

/// Upper bound for `timeout_seconds` (24 hours)
pub const MAX_TIMEOUT_SECONDS: u64 = 86_400;

pub struct Job;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFields {
    pub retries: Scalar<u32>,
    pub timeout_seconds: Scalar<u64>,
    pub tags: List<String>,
}

impl Merge for JobFields {
    fn merge(self, later: Self) -> Self {
        Self {
            retries: self.retries.merge(later.retries),
            timeout_seconds: self.timeout_seconds.merge(later.timeout_seconds),
            tags: self.tags.merge(later.tags),
        }
    }
}

#[derive(Debug, Clone)]
pub enum JobScalar {
    Retries(u32),
    TimeoutSeconds(u64),
}

#[derive(Debug, Clone)]
pub enum JobList {
    Tags(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub name: String,
    pub retries: u32,
    pub timeout_seconds: u64,
    pub tags: Vec<String>,
}

impl ResourceSchema for Job {
    const KIND: &'static str = "job";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::optional("retries", "3", "Retry attempts after the first failure"),
        FieldSpec::optional("timeout_seconds", "600", "Run timeout, in (0, 86400]"),
        FieldSpec::list("tags", "Labels attached to every run"),
    ];

    type Fields = JobFields;
    type Scalar = JobScalar;
    type List = JobList;
    type Config = JobConfig;
    type Handle = String;

    fn set_scalar(fields: &mut JobFields, op: JobScalar) {
        match op {
            JobScalar::Retries(n) => fields.retries.set(n),
            JobScalar::TimeoutSeconds(s) => fields.timeout_seconds.set(s),
        }
    }

    fn append_list(fields: &mut JobFields, op: JobList) {
        match op {
            JobList::Tags(tags) => fields.tags.extend(tags),
        }
    }

    fn resolve(identity: &Identity, fields: &JobFields) -> Result<JobConfig, ValidationError> {
        Ok(JobConfig {
            name: identity.to_string(),
            retries: fields.retries.get_or(DEFAULT_RETRIES),
            timeout_seconds: fields.timeout_seconds.get_or(DEFAULT_TIMEOUT_SECONDS),
            tags: fields.tags.to_vec(),
        })
    }

    fn check(config: &JobConfig) -> Result<(), ValidationError> {
        if config.timeout_seconds == 0 || config.timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(ValidationError::invalid(
                "timeout_seconds",
                format!("must be in (0, {}]", MAX_TIMEOUT_SECONDS),
            ));
        }
        Ok(())
    }
}

/// Manifest step for a job
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobStep {
    pub retries: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub tags: Option<Vec<String>>,
    pub group: Option<Vec<JobStep>>,
}

impl Resource for Job {
    const RESOURCE_KIND: ResourceKind = ResourceKind::Job;

    type Step = JobStep;

    fn operations(step: JobStep, registry: &Registry) -> Result<Vec<Operation<Job>>, StepError> {
        let mut ops = Vec::new();
        if let Some(n) = step.retries {
            ops.push(Operation::set(JobScalar::Retries(n)));
        }
        if let Some(s) = step.timeout_seconds {
            ops.push(Operation::set(JobScalar::TimeoutSeconds(s)));
        }
        if let Some(tags) = step.tags {
            ops.push(Operation::append(JobList::Tags(tags)));
        }
        ops.extend(group_operations::<Job>(step.group, registry)?);
        Ok(ops)
    }

    fn synthesize(identity: &Identity, config: &JobConfig) -> Value {
        json!({
            "jobName": identity.as_str(),
            "retryAttempts": config.retries,
            "timeoutSeconds": config.timeout_seconds,
            "tags": config.tags,
        })
    }

    fn into_built(built: Built<Job>) -> BuiltResource {
        BuiltResource::Job(built)
    }

    fn from_built(resource: &BuiltResource) -> Option<&Built<Job>> {
        match resource {
            BuiltResource::Job(job) => Some(job),
            _ => None,
        }
    }
}
