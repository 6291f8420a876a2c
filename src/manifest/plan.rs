//! Plan artifact with provenance
//!
//! The plan captures every finalized resource of a manifest plus where the
//! manifest came from (path and digest of the raw bytes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use super::{build_all, Manifest, ManifestError};
use crate::registry::Registry;
use crate::resources::ResourceKind;

/// Schema version for plans
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "infra-draft/plan@1";

/// Manifest the plan was built from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestSource {
    /// File path (None when built from an in-memory manifest)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw manifest bytes
    pub digest: String,
}

/// One finalized resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedResource {
    pub kind: ResourceKind,
    pub name: String,
    pub logical_id: String,

    /// Record handed to the provisioning SDK
    pub target: Value,

    /// Materialized handle, if one was assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,

    /// Logical ids of referenced resources
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// Plan for a whole manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// Unique id of this plan
    pub plan_id: String,

    /// When this plan was computed
    pub created_at: DateTime<Utc>,

    pub source: ManifestSource,

    /// Resources in build order
    pub resources: Vec<PlannedResource>,
}

impl Plan {
    /// Build a plan from a manifest file.
    ///
    /// With `logical_ids`, every resource's handle is materialized with its
    /// logical id before the plan is recorded.
    pub fn build(path: &Path, logical_ids: bool) -> Result<Self, ManifestError> {
        let bytes = fs::read(path)?;
        let digest = digest(&bytes);

        let manifest = Manifest::from_bytes(bytes)?;
        let source = ManifestSource {
            path: Some(path.to_string_lossy().to_string()),
            digest,
        };
        Self::from_manifest(&manifest, source, logical_ids)
    }

    /// Build a plan from manifest text that did not come from a file
    pub fn from_contents(contents: &str, logical_ids: bool) -> Result<Self, ManifestError> {
        let manifest = Manifest::parse(contents)?;
        let source = ManifestSource {
            path: None,
            digest: digest(contents.as_bytes()),
        };
        Self::from_manifest(&manifest, source, logical_ids)
    }

    /// Build a plan from an already parsed manifest
    pub fn from_manifest(
        manifest: &Manifest,
        source: ManifestSource,
        logical_ids: bool,
    ) -> Result<Self, ManifestError> {
        let registry = build_all(manifest)?;
        if logical_ids {
            registry.assign_logical_ids()?;
        }
        Self::from_registry(&registry, source)
    }

    /// Record the resources of a registry
    pub fn from_registry(registry: &Registry, source: ManifestSource) -> Result<Self, ManifestError> {
        let mut resources = Vec::with_capacity(registry.len());
        for resource in registry.iter() {
            let handle = if resource.is_materialized() {
                Some(resource.handle()?.clone())
            } else {
                None
            };
            resources.push(PlannedResource {
                kind: resource.kind(),
                name: resource.name().to_string(),
                logical_id: resource.logical_id(),
                target: resource.target().clone(),
                handle,
                depends_on: resource.depends_on(),
            });
        }

        let plan = Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            plan_id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            source,
            resources,
        };
        tracing::debug!(plan_id = %plan.plan_id, resources = plan.resources.len(), "plan recorded");
        Ok(plan)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> Result<(), ManifestError> {
        let json = self.to_json()?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Find a resource by kind and name
    pub fn get(&self, kind: ResourceKind, name: &str) -> Option<&PlannedResource> {
        self.resources
            .iter()
            .find(|r| r.kind == kind && r.name == name)
    }
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const QUEUES: &str = r#"
[[resource]]
kind = "queue"
name = "orders-dlq"

[[resource]]
kind = "queue"
name = "orders"
ops = [{ dead_letter = { queue = "orders-dlq", max_receive_count = 5 } }]
"#;

    #[test]
    fn test_build_from_file() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "{}", QUEUES).unwrap();

        let plan = Plan::build(temp.path(), false).unwrap();

        assert_eq!(plan.schema_version, SCHEMA_VERSION);
        assert_eq!(plan.schema_id, SCHEMA_ID);
        assert_eq!(plan.resources.len(), 2);
        assert_eq!(plan.source.digest, digest(QUEUES.as_bytes()));
        assert_eq!(plan.source.digest.len(), 64);
        assert!(plan.source.path.is_some());
    }

    #[test]
    fn test_depends_on() {
        let plan = Plan::from_contents(QUEUES, false).unwrap();

        let orders = plan.get(ResourceKind::Queue, "orders").unwrap();
        assert_eq!(orders.logical_id, "OrdersQueue");
        assert_eq!(orders.depends_on, vec!["OrdersDlqQueue"]);

        let dlq = plan.get(ResourceKind::Queue, "orders-dlq").unwrap();
        assert!(dlq.depends_on.is_empty());
    }

    #[test]
    fn test_handles_only_with_logical_ids() {
        let plan = Plan::from_contents(QUEUES, false).unwrap();
        assert!(plan.resources.iter().all(|r| r.handle.is_none()));

        let plan = Plan::from_contents(QUEUES, true).unwrap();
        let orders = plan.get(ResourceKind::Queue, "orders").unwrap();
        assert_eq!(orders.handle.as_deref(), Some("OrdersQueue"));
    }

    #[test]
    fn test_json_shape() {
        let plan = Plan::from_contents(QUEUES, false).unwrap();
        let json: Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();

        assert_eq!(json["schema_id"], SCHEMA_ID);
        assert_eq!(json["resources"][0]["kind"], "queue");
        assert!(json["resources"][0].get("handle").is_none());
        assert!(json["source"].get("path").is_none());
    }

    #[test]
    fn test_write_to_file() {
        let plan = Plan::from_contents(QUEUES, true).unwrap();
        let out = NamedTempFile::new().unwrap();
        plan.write_to_file(out.path()).unwrap();

        let written: Plan = serde_json::from_str(&fs::read_to_string(out.path()).unwrap()).unwrap();
        assert_eq!(written.plan_id, plan.plan_id);
        assert_eq!(written.resources, plan.resources);
    }

    #[test]
    fn test_plan_ids_are_unique() {
        let a = Plan::from_contents(QUEUES, false).unwrap();
        let b = Plan::from_contents(QUEUES, false).unwrap();
        assert_ne!(a.plan_id, b.plan_id);
        assert_eq!(a.source.digest, b.source.digest);
    }

    #[test]
    fn test_write_to_missing_directory() {
        let plan = Plan::from_contents(QUEUES, false).unwrap();
        let result = plan.write_to_file(Path::new("/nonexistent/dir/plan.json"));
        assert!(matches!(result, Err(ManifestError::Io(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Plan::build(Path::new("/nonexistent/manifest.toml"), false);
        assert!(matches!(result, Err(ManifestError::Io(_))));
    }
}
