//! Message queue resource
//!
//! A queue may name an earlier queue as its dead-letter target. The target
//! is passed in as a finalized resource, never as a draft.

use infra_draft_core::{
    FieldSpec, Identity, Keyed, Merge, Operation, ResourceSchema, Scalar, ValidationError,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{group_operations, Built, Resource, ResourceKind, StepError};
use crate::registry::{BuiltResource, Registry};

/// Default visibility timeout in seconds
pub const DEFAULT_VISIBILITY_TIMEOUT_SECONDS: u32 = 30;

/// Default retention in seconds (4 days)
pub const DEFAULT_RETENTION_SECONDS: u32 = 345_600;

const MAX_VISIBILITY_TIMEOUT_SECONDS: u32 = 43_200;
const MIN_RETENTION_SECONDS: u32 = 60;
const MAX_RETENTION_SECONDS: u32 = 1_209_600;
const MAX_RECEIVE_COUNT: u32 = 1_000;

const FIFO_SUFFIX: &str = ".fifo";

pub struct Queue;

/// Dead-letter target: an already finalized queue
#[derive(Debug, Clone, PartialEq)]
pub struct DeadLetter {
    pub queue: Built<Queue>,
    pub max_receive_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueFields {
    pub fifo: Scalar<bool>,
    pub visibility_timeout_seconds: Scalar<u32>,
    pub retention_seconds: Scalar<u32>,
    pub dead_letter: Scalar<DeadLetter>,
    pub tags: Keyed<String, String>,
}

impl Merge for QueueFields {
    fn merge(self, later: Self) -> Self {
        Self {
            fifo: self.fifo.merge(later.fifo),
            visibility_timeout_seconds: self
                .visibility_timeout_seconds
                .merge(later.visibility_timeout_seconds),
            retention_seconds: self.retention_seconds.merge(later.retention_seconds),
            dead_letter: self.dead_letter.merge(later.dead_letter),
            tags: self.tags.merge(later.tags),
        }
    }
}

#[derive(Debug, Clone)]
pub enum QueueScalar {
    Fifo(bool),
    VisibilityTimeoutSeconds(u32),
    RetentionSeconds(u32),
    DeadLetter(DeadLetter),
}

#[derive(Debug, Clone)]
pub enum QueueList {
    Tags(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueConfig {
    pub name: String,
    pub fifo: bool,
    pub visibility_timeout_seconds: u32,
    pub retention_seconds: u32,
    pub dead_letter: Option<DeadLetter>,
    pub tags: BTreeMap<String, String>,
}

impl ResourceSchema for Queue {
    const KIND: &'static str = "queue";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::optional("fifo", "false", "First-in-first-out; name must end in .fifo"),
        FieldSpec::optional("visibility_timeout_seconds", "30", "In [0, 43200]"),
        FieldSpec::optional("retention_seconds", "345600", "In [60, 1209600]"),
        FieldSpec::optional_unset("dead_letter", "{ queue, max_receive_count }; queue must be declared earlier"),
        FieldSpec::keyed("tags", "Key/value tags; later value wins per key"),
    ];

    type Fields = QueueFields;
    type Scalar = QueueScalar;
    type List = QueueList;
    type Config = QueueConfig;
    type Handle = String;

    fn set_scalar(fields: &mut QueueFields, op: QueueScalar) {
        match op {
            QueueScalar::Fifo(f) => fields.fifo.set(f),
            QueueScalar::VisibilityTimeoutSeconds(s) => fields.visibility_timeout_seconds.set(s),
            QueueScalar::RetentionSeconds(s) => fields.retention_seconds.set(s),
            QueueScalar::DeadLetter(d) => fields.dead_letter.set(d),
        }
    }

    fn append_list(fields: &mut QueueFields, op: QueueList) {
        match op {
            QueueList::Tags(tags) => fields.tags.extend(tags),
        }
    }

    fn resolve(identity: &Identity, fields: &QueueFields) -> Result<QueueConfig, ValidationError> {
        Ok(QueueConfig {
            name: identity.to_string(),
            fifo: fields.fifo.get_or(false),
            visibility_timeout_seconds: fields
                .visibility_timeout_seconds
                .get_or(DEFAULT_VISIBILITY_TIMEOUT_SECONDS),
            retention_seconds: fields.retention_seconds.get_or(DEFAULT_RETENTION_SECONDS),
            dead_letter: fields.dead_letter.get().cloned(),
            tags: fields.tags.entries().clone(),
        })
    }

    fn check(config: &QueueConfig) -> Result<(), ValidationError> {
        let fifo_name = config.name.ends_with(FIFO_SUFFIX);
        if config.fifo && !fifo_name {
            return Err(ValidationError::combination(format!(
                "fifo queue '{}' must have a name ending in {}",
                config.name, FIFO_SUFFIX
            )));
        }
        if !config.fifo && fifo_name {
            return Err(ValidationError::combination(format!(
                "queue '{}' ends in {} but fifo is not enabled",
                config.name, FIFO_SUFFIX
            )));
        }

        if config.visibility_timeout_seconds > MAX_VISIBILITY_TIMEOUT_SECONDS {
            return Err(ValidationError::invalid(
                "visibility_timeout_seconds",
                format!("must be in [0, {}]", MAX_VISIBILITY_TIMEOUT_SECONDS),
            ));
        }
        if !(MIN_RETENTION_SECONDS..=MAX_RETENTION_SECONDS).contains(&config.retention_seconds) {
            return Err(ValidationError::invalid(
                "retention_seconds",
                format!("must be in [{}, {}]", MIN_RETENTION_SECONDS, MAX_RETENTION_SECONDS),
            ));
        }

        if let Some(dead_letter) = &config.dead_letter {
            if !(1..=MAX_RECEIVE_COUNT).contains(&dead_letter.max_receive_count) {
                return Err(ValidationError::invalid(
                    "dead_letter",
                    format!("max_receive_count must be in [1, {}]", MAX_RECEIVE_COUNT),
                ));
            }
            if dead_letter.queue.config().fifo != config.fifo {
                return Err(ValidationError::combination(format!(
                    "dead-letter queue '{}' must match the fifo setting of '{}'",
                    dead_letter.queue.identity(),
                    config.name
                )));
            }
        }
        Ok(())
    }
}

/// Manifest form of a dead-letter target
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeadLetterStep {
    pub queue: String,
    pub max_receive_count: u32,
}

/// Manifest step for a queue
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueStep {
    pub fifo: Option<bool>,
    pub visibility_timeout_seconds: Option<u32>,
    pub retention_seconds: Option<u32>,
    pub dead_letter: Option<DeadLetterStep>,
    pub tags: Option<BTreeMap<String, String>>,
    pub group: Option<Vec<QueueStep>>,
}

impl Resource for Queue {
    const RESOURCE_KIND: ResourceKind = ResourceKind::Queue;

    type Step = QueueStep;

    fn operations(step: QueueStep, registry: &Registry) -> Result<Vec<Operation<Queue>>, StepError> {
        let mut ops = Vec::new();
        if let Some(f) = step.fifo {
            ops.push(Operation::set(QueueScalar::Fifo(f)));
        }
        if let Some(s) = step.visibility_timeout_seconds {
            ops.push(Operation::set(QueueScalar::VisibilityTimeoutSeconds(s)));
        }
        if let Some(s) = step.retention_seconds {
            ops.push(Operation::set(QueueScalar::RetentionSeconds(s)));
        }
        if let Some(dead_letter) = step.dead_letter {
            let queue = registry.lookup::<Queue>(&dead_letter.queue)?;
            ops.push(Operation::set(QueueScalar::DeadLetter(DeadLetter {
                queue,
                max_receive_count: dead_letter.max_receive_count,
            })));
        }
        if let Some(tags) = step.tags {
            ops.push(Operation::append(QueueList::Tags(tags.into_iter().collect())));
        }
        ops.extend(group_operations::<Queue>(step.group, registry)?);
        Ok(ops)
    }

    fn synthesize(identity: &Identity, config: &QueueConfig) -> Value {
        let redrive = config.dead_letter.as_ref().map(|d| {
            json!({
                "queue": d.queue.identity().as_str(),
                "maxReceiveCount": d.max_receive_count,
            })
        });

        json!({
            "queueName": identity.as_str(),
            "fifo": config.fifo,
            "visibilityTimeoutSeconds": config.visibility_timeout_seconds,
            "retentionPeriodSeconds": config.retention_seconds,
            "deadLetterQueue": redrive,
            "tags": config.tags,
        })
    }

    fn references(config: &QueueConfig) -> Vec<(ResourceKind, String)> {
        config
            .dead_letter
            .iter()
            .map(|d| (ResourceKind::Queue, d.queue.identity().to_string()))
            .collect()
    }

    fn into_built(built: Built<Queue>) -> BuiltResource {
        BuiltResource::Queue(built)
    }

    fn from_built(resource: &BuiltResource) -> Option<&Built<Queue>> {
        match resource {
            BuiltResource::Queue(queue) => Some(queue),
            _ => None,
        }
    }
}
