//! Infra Draft - layered resource configuration
//!
//! This crate builds infrastructure resource records (jobs, buckets, queues,
//! ingress rules) from TOML manifests. Every resource goes through the
//! immutable draft core: defaults and steps become operations, drafts are
//! combined, and a single finalize validates and produces the target record.

pub mod manifest;
pub mod registry;
pub mod resources;

pub use infra_draft_core::{
    Draft, Finalized, HandleError, HandleSlot, Identity, Operation, ResourceSchema, ValidationError,
};
pub use manifest::{build_all, Manifest, ManifestError, Plan, PlannedResource};
pub use registry::{logical_id, BuiltResource, Registry, RegistryError};
pub use resources::{Built, Resource, ResourceKind};
