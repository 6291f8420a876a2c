//! Job resource used across the core integration tests.
//!
//! One required field (`name`, the identity), one optional scalar
//! (`retries`, default 3), one accumulating list (`tags`) and one
//! replace-list (`schedules`).

#![allow(dead_code)]

use infra_draft_core::{
    Draft, FieldSpec, Identity, List, Merge, Operation, ReplaceList, ResourceSchema, Scalar,
    ValidationError,
};

pub struct Job;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFields {
    pub retries: Scalar<u32>,
    pub queue: Scalar<String>,
    pub tags: List<String>,
    pub schedules: ReplaceList<String>,
}

impl Merge for JobFields {
    fn merge(self, later: Self) -> Self {
        Self {
            retries: self.retries.merge(later.retries),
            queue: self.queue.merge(later.queue),
            tags: self.tags.merge(later.tags),
            schedules: self.schedules.merge(later.schedules),
        }
    }
}

#[derive(Debug, Clone)]
pub enum JobScalar {
    Retries(u32),
    Queue(String),
    Schedules(Vec<String>),
}

#[derive(Debug, Clone)]
pub enum JobList {
    Tags(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub name: String,
    pub retries: u32,
    pub queue: String,
    pub tags: Vec<String>,
    pub schedules: Vec<String>,
}

impl ResourceSchema for Job {
    const KIND: &'static str = "job";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::optional("retries", "3", "retry attempts"),
        FieldSpec::optional("queue", "default", "queue the job runs on"),
        FieldSpec::list("tags", "labels"),
        FieldSpec::replace_list("schedules", "cron expressions"),
    ];

    type Fields = JobFields;
    type Scalar = JobScalar;
    type List = JobList;
    type Config = JobConfig;
    type Handle = String;

    fn set_scalar(fields: &mut JobFields, op: JobScalar) {
        match op {
            JobScalar::Retries(n) => fields.retries.set(n),
            JobScalar::Queue(q) => fields.queue.set(q),
            JobScalar::Schedules(s) => fields.schedules.replace(s),
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
            retries: fields.retries.get_or(3),
            queue: fields.queue.get_or("default".to_string()),
            tags: fields.tags.to_vec(),
            schedules: fields.schedules.items().to_vec(),
        })
    }
}

/// Deploy job: `queue` is required, and `retries = 0` may not be combined
/// with the `critical` tag.
pub struct Deploy;

impl ResourceSchema for Deploy {
    const KIND: &'static str = "deploy";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("queue", "queue the deploy runs on"),
        FieldSpec::optional("retries", "3", "retry attempts"),
        FieldSpec::list("tags", "labels"),
    ];

    type Fields = JobFields;
    type Scalar = JobScalar;
    type List = JobList;
    type Config = JobConfig;
    type Handle = String;

    fn set_scalar(fields: &mut JobFields, op: JobScalar) {
        Job::set_scalar(fields, op)
    }

    fn append_list(fields: &mut JobFields, op: JobList) {
        Job::append_list(fields, op)
    }

    fn resolve(identity: &Identity, fields: &JobFields) -> Result<JobConfig, ValidationError> {
        let queue = fields.queue.require("queue")?;
        Ok(JobConfig {
            name: identity.to_string(),
            retries: fields.retries.get_or(3),
            queue: queue.clone(),
            tags: fields.tags.to_vec(),
            schedules: Vec::new(),
        })
    }

    fn check(config: &JobConfig) -> Result<(), ValidationError> {
        if config.retries == 0 && config.tags.iter().any(|t| t == "critical") {
            return Err(ValidationError::combination(
                "critical deploys must allow at least one retry",
            ));
        }
        Ok(())
    }
}

pub fn tags(items: &[&str]) -> Operation<Job> {
    Operation::append(JobList::Tags(items.iter().map(|s| s.to_string()).collect()))
}

pub fn retries(n: u32) -> Operation<Job> {
    Operation::set(JobScalar::Retries(n))
}

pub fn job(name: &str) -> Draft<Job> {
    Draft::create(name)
}
