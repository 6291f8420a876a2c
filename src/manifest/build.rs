//! Building manifest resources through the generic draft core

use infra_draft_core::{Draft, Operation};

use super::{Manifest, ManifestError, ResourceEntry};
use crate::registry::{BuiltResource, Registry};
use crate::resources::{Bucket, Built, IngressRule, Job, Queue, Resource, ResourceKind, StepError};

/// Build every resource in declaration order.
pub fn build_all(manifest: &Manifest) -> Result<Registry, ManifestError> {
    let mut registry = Registry::new();

    for entry in &manifest.resources {
        let defaults = manifest.defaults_for(entry.kind);
        let built = match entry.kind {
            ResourceKind::Job => build_entry::<Job>(entry, defaults, &registry)?,
            ResourceKind::Bucket => build_entry::<Bucket>(entry, defaults, &registry)?,
            ResourceKind::Queue => build_entry::<Queue>(entry, defaults, &registry)?,
            ResourceKind::IngressRule => build_entry::<IngressRule>(entry, defaults, &registry)?,
        };
        registry.insert(built)?;
    }

    tracing::debug!(count = registry.len(), "manifest built");
    Ok(registry)
}

/// Build one resource: the defaults draft combined with the resource draft,
/// then finalized.
fn build_entry<R: Resource>(
    entry: &ResourceEntry,
    defaults: Option<&toml::Value>,
    registry: &Registry,
) -> Result<BuiltResource, ManifestError> {
    let base = match defaults {
        Some(step) => Draft::<R>::create("").apply_all(step_operations::<R>(step, entry, registry)?),
        None => Draft::<R>::create(""),
    };

    let mut ops = Vec::new();
    for step in &entry.ops {
        ops.extend(step_operations::<R>(step, entry, registry)?);
    }
    let draft = Draft::<R>::create(entry.name.as_str()).apply_all(ops);

    tracing::debug!(kind = %entry.kind, name = %entry.name, steps = entry.ops.len(), "building resource");

    let built: Built<R> = base
        .combine(&draft)
        .finalize(R::synthesize)
        .map_err(|source| ManifestError::Validation {
            kind: entry.kind,
            name: entry.name.clone(),
            source,
        })?;
    Ok(R::into_built(built))
}

fn step_operations<R: Resource>(
    step: &toml::Value,
    entry: &ResourceEntry,
    registry: &Registry,
) -> Result<Vec<Operation<R>>, ManifestError> {
    let parsed: R::Step = step
        .clone()
        .try_into::<R::Step>()
        .map_err(|e| ManifestError::InvalidStep {
            kind: entry.kind,
            name: entry.name.clone(),
            reason: e.to_string(),
        })?;

    R::operations(parsed, registry).map_err(|e| match e {
        StepError::UnknownReference { kind, name } => ManifestError::UnknownReference {
            kind: entry.kind,
            name: entry.name.clone(),
            target_kind: kind,
            target: name,
        },
        StepError::Invalid(reason) => ManifestError::InvalidStep {
            kind: entry.kind,
            name: entry.name.clone(),
            reason,
        },
    })
}
