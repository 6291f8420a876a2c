//! Registry of finalized resources
//!
//! Holds resources in the order they were built and resolves references by
//! `(kind, name)`. References only ever see finished resources.

use infra_draft_core::HandleError;
use serde_json::Value;
use std::collections::HashMap;

use crate::resources::{Bucket, Built, IngressRule, Job, Queue, Resource, ResourceKind, StepError};

/// A finalized resource of any kind
#[derive(Debug, Clone)]
pub enum BuiltResource {
    Job(Built<Job>),
    Bucket(Built<Bucket>),
    Queue(Built<Queue>),
    IngressRule(Built<IngressRule>),
}

impl BuiltResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            BuiltResource::Job(_) => ResourceKind::Job,
            BuiltResource::Bucket(_) => ResourceKind::Bucket,
            BuiltResource::Queue(_) => ResourceKind::Queue,
            BuiltResource::IngressRule(_) => ResourceKind::IngressRule,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            BuiltResource::Job(r) => r.identity().as_str(),
            BuiltResource::Bucket(r) => r.identity().as_str(),
            BuiltResource::Queue(r) => r.identity().as_str(),
            BuiltResource::IngressRule(r) => r.identity().as_str(),
        }
    }

    /// Target record produced at finalize
    pub fn target(&self) -> &Value {
        match self {
            BuiltResource::Job(r) => r.target(),
            BuiltResource::Bucket(r) => r.target(),
            BuiltResource::Queue(r) => r.target(),
            BuiltResource::IngressRule(r) => r.target(),
        }
    }

    /// Logical ids of the resources this one refers to
    pub fn depends_on(&self) -> Vec<String> {
        let refs = match self {
            BuiltResource::Job(r) => Job::references(r.config()),
            BuiltResource::Bucket(r) => Bucket::references(r.config()),
            BuiltResource::Queue(r) => Queue::references(r.config()),
            BuiltResource::IngressRule(r) => IngressRule::references(r.config()),
        };
        refs.into_iter()
            .map(|(kind, name)| logical_id(kind, &name))
            .collect()
    }

    pub fn logical_id(&self) -> String {
        logical_id(self.kind(), self.name())
    }

    pub fn materialize(&self, handle: String) -> Result<(), HandleError> {
        match self {
            BuiltResource::Job(r) => r.materialize(handle),
            BuiltResource::Bucket(r) => r.materialize(handle),
            BuiltResource::Queue(r) => r.materialize(handle),
            BuiltResource::IngressRule(r) => r.materialize(handle),
        }
    }

    pub fn handle(&self) -> Result<&String, HandleError> {
        match self {
            BuiltResource::Job(r) => r.handle(),
            BuiltResource::Bucket(r) => r.handle(),
            BuiltResource::Queue(r) => r.handle(),
            BuiltResource::IngressRule(r) => r.handle(),
        }
    }

    pub fn is_materialized(&self) -> bool {
        match self {
            BuiltResource::Job(r) => r.is_materialized(),
            BuiltResource::Bucket(r) => r.is_materialized(),
            BuiltResource::Queue(r) => r.is_materialized(),
            BuiltResource::IngressRule(r) => r.is_materialized(),
        }
    }
}

/// Logical id: PascalCase name followed by the kind, e.g. `OrdersDlqQueue`.
pub fn logical_id(kind: ResourceKind, name: &str) -> String {
    let mut id = String::with_capacity(name.len() + kind.type_suffix().len());
    for word in name.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            id.push(first.to_ascii_uppercase());
            id.extend(chars);
        }
    }
    id.push_str(kind.type_suffix());
    id
}

/// Error inserting into the registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate {kind} '{name}'")]
    DuplicateResource { kind: ResourceKind, name: String },

    #[error("{kind} '{name}' has logical id '{logical_id}', already used by {existing_kind} '{existing_name}'")]
    DuplicateLogicalId {
        kind: ResourceKind,
        name: String,
        logical_id: String,
        existing_kind: ResourceKind,
        existing_name: String,
    },
}

/// Finalized resources in build order
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<BuiltResource>,
    index: HashMap<(ResourceKind, String), usize>,
    logical_ids: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource. Both `(kind, name)` and the logical id must be unused.
    pub fn insert(&mut self, resource: BuiltResource) -> Result<(), RegistryError> {
        let key = (resource.kind(), resource.name().to_string());
        if self.index.contains_key(&key) {
            return Err(RegistryError::DuplicateResource {
                kind: key.0,
                name: key.1,
            });
        }
        let logical_id = resource.logical_id();
        if let Some(&i) = self.logical_ids.get(&logical_id) {
            let existing = &self.entries[i];
            return Err(RegistryError::DuplicateLogicalId {
                kind: key.0,
                name: key.1,
                logical_id,
                existing_kind: existing.kind(),
                existing_name: existing.name().to_string(),
            });
        }
        self.index.insert(key, self.entries.len());
        self.logical_ids.insert(logical_id, self.entries.len());
        self.entries.push(resource);
        Ok(())
    }

    pub fn get(&self, kind: ResourceKind, name: &str) -> Option<&BuiltResource> {
        self.index
            .get(&(kind, name.to_string()))
            .map(|&i| &self.entries[i])
    }

    /// Typed reference to an earlier resource
    pub fn lookup<R: Resource>(&self, name: &str) -> Result<Built<R>, StepError> {
        self.get(R::RESOURCE_KIND, name)
            .and_then(R::from_built)
            .cloned()
            .ok_or_else(|| StepError::UnknownReference {
                kind: R::RESOURCE_KIND,
                name: name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuiltResource> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fill every handle slot with the resource's logical id.
    ///
    /// Fails with `DoubleMaterialization` if any slot was already written.
    pub fn assign_logical_ids(&self) -> Result<(), HandleError> {
        for resource in &self.entries {
            resource.materialize(resource.logical_id())?;
        }
        tracing::debug!(count = self.entries.len(), "assigned logical ids");
        Ok(())
    }
}
