//! Resource manifests
//!
//! A manifest lists resources as ordered op tables (steps). Resources are
//! built in declaration order with two layers:
//! 1. Per-kind defaults (`[defaults.<kind>]`)
//! 2. The resource's own steps
//!
//! Scalars: later layer wins. Lists: defaults first, then the resource's.

mod build;
mod plan;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use infra_draft_core::{HandleError, ValidationError};

use crate::registry::RegistryError;
use crate::resources::ResourceKind;

pub use build::build_all;
pub use plan::{ManifestSource, Plan, PlannedResource, SCHEMA_ID, SCHEMA_VERSION};

/// Manifest schema versions this build understands
pub const MANIFEST_VERSION: u32 = 1;

/// Manifest file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Default step per kind name, applied underneath every resource of that kind
    #[serde(default)]
    pub defaults: BTreeMap<String, toml::Value>,

    /// Resources in build order
    #[serde(default, rename = "resource")]
    pub resources: Vec<ResourceEntry>,
}

fn default_schema_version() -> u32 {
    MANIFEST_VERSION
}

/// A single resource entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceEntry {
    pub kind: ResourceKind,

    /// Identity of the resource
    #[serde(default)]
    pub name: String,

    /// Steps, applied in order
    #[serde(default)]
    pub ops: Vec<toml::Value>,
}

/// Errors that can occur when loading or building a manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Manifest is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Unknown resource kind in defaults: '{0}'")]
    UnknownKind(String),

    #[error("Unsupported manifest schema_version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("{kind} '{name}': invalid step: {reason}")]
    InvalidStep {
        kind: ResourceKind,
        name: String,
        reason: String,
    },

    #[error("{kind} '{name}': unknown reference to {target_kind} '{target}'")]
    UnknownReference {
        kind: ResourceKind,
        name: String,
        target_kind: ResourceKind,
        target: String,
    },

    #[error("{kind} '{name}': {source}")]
    Validation {
        kind: ResourceKind,
        name: String,
        source: ValidationError,
    },

    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Handle(#[from] HandleError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Manifest {
    /// Load and parse a manifest file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        Self::from_bytes(fs::read(path)?)
    }

    /// Parse raw manifest bytes; they must be UTF-8
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ManifestError> {
        let contents = String::from_utf8(bytes)?;
        Self::parse(&contents)
    }

    /// Parse a manifest from a TOML string
    pub fn parse(contents: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = toml::from_str(contents)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<(), ManifestError> {
        if self.schema_version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                found: self.schema_version,
                expected: MANIFEST_VERSION,
            });
        }
        for kind in self.defaults.keys() {
            kind.parse::<ResourceKind>()
                .map_err(|_| ManifestError::UnknownKind(kind.clone()))?;
        }
        Ok(())
    }

    /// Default step for a kind, if the manifest declares one
    pub fn defaults_for(&self, kind: ResourceKind) -> Option<&toml::Value> {
        self.defaults.get(kind.as_str())
    }

    /// Number of resources per kind
    pub fn count_by_kind(&self) -> BTreeMap<ResourceKind, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.resources {
            *counts.entry(entry.kind).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal() {
        let manifest = Manifest::parse(
            r#"
            [[resource]]
            kind = "job"
            name = "nightly"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.schema_version, MANIFEST_VERSION);
        assert_eq!(manifest.resources.len(), 1);
        assert_eq!(manifest.resources[0].kind, ResourceKind::Job);
        assert!(manifest.resources[0].ops.is_empty());
    }

    #[test]
    fn test_parse_defaults_and_ops() {
        let manifest = Manifest::parse(
            r#"
            [defaults.bucket]
            versioned = true

            [[resource]]
            kind = "bucket"
            name = "assets"
            ops = [{ public_read = true }, { tags = { team = "web" } }]

            [[resource]]
            kind = "ingress_rule"
            name = "https"
            ops = [{ peer = "0.0.0.0/0", ports = 443 }]
            "#,
        )
        .unwrap();

        assert!(manifest.defaults_for(ResourceKind::Bucket).is_some());
        assert!(manifest.defaults_for(ResourceKind::Queue).is_none());
        assert_eq!(manifest.resources[0].ops.len(), 2);
        assert_eq!(manifest.count_by_kind()[&ResourceKind::IngressRule], 1);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result = Manifest::parse(
            r#"
            [[resource]]
            kind = "database"
            name = "db"
            "#,
        );
        assert!(matches!(result, Err(ManifestError::Parse(_))));
    }

    #[test]
    fn test_unknown_defaults_kind_rejected() {
        let result = Manifest::parse(
            r#"
            [defaults.database]
            engine = "postgres"
            "#,
        );
        assert!(matches!(result, Err(ManifestError::UnknownKind(kind)) if kind == "database"));
    }

    #[test]
    fn test_from_file_rejects_invalid_utf8() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        temp.write_all(&[0xff, 0xfe, b'\n']).unwrap();

        let result = Manifest::from_file(temp.path());
        assert!(matches!(result, Err(ManifestError::Encoding(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let result = Manifest::parse("schema_version = 2");
        assert!(matches!(
            result,
            Err(ManifestError::UnsupportedVersion { found: 2, expected: 1 })
        ));
    }
}
