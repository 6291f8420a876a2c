//! Resource schema: what a resource type declares to get a builder.

use std::fmt;

use crate::draft::Identity;
use crate::error::ValidationError;
use crate::field::Merge;

/// How a field takes part in merging and finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// Scalar that must be set before finalize
    Required,
    /// Scalar that may stay unset; `default` is substituted at finalize
    /// when one is documented
    Optional { default: Option<&'static str> },
    /// Accumulating list (append)
    List,
    /// List declared last-wins (replace)
    ReplaceList,
    /// Map merged by key
    Keyed,
}

impl FieldClass {
    /// Short name used in listings
    pub fn label(&self) -> &'static str {
        match self {
            FieldClass::Required => "required",
            FieldClass::Optional { .. } => "optional",
            FieldClass::List => "list",
            FieldClass::ReplaceList => "replace-list",
            FieldClass::Keyed => "keyed",
        }
    }

    pub fn default_value(&self) -> Option<&'static str> {
        match self {
            FieldClass::Optional { default } => *default,
            _ => None,
        }
    }
}

/// Declared field of a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub class: FieldClass,
    pub summary: &'static str,
}

impl FieldSpec {
    pub const fn required(name: &'static str, summary: &'static str) -> Self {
        Self {
            name,
            class: FieldClass::Required,
            summary,
        }
    }

    pub const fn optional(name: &'static str, default: &'static str, summary: &'static str) -> Self {
        Self {
            name,
            class: FieldClass::Optional { default: Some(default) },
            summary,
        }
    }

    /// Optional field with no default; absent from the config when unset
    pub const fn optional_unset(name: &'static str, summary: &'static str) -> Self {
        Self {
            name,
            class: FieldClass::Optional { default: None },
            summary,
        }
    }

    pub const fn list(name: &'static str, summary: &'static str) -> Self {
        Self {
            name,
            class: FieldClass::List,
            summary,
        }
    }

    pub const fn replace_list(name: &'static str, summary: &'static str) -> Self {
        Self {
            name,
            class: FieldClass::ReplaceList,
            summary,
        }
    }

    pub const fn keyed(name: &'static str, summary: &'static str) -> Self {
        Self {
            name,
            class: FieldClass::Keyed,
            summary,
        }
    }
}

/// A resource type, parameterizing the generic `Draft`.
///
/// Implementors supply the empty field record (`Fields::default()`), the
/// closed sets of scalar assignments and list contributions, and the rules
/// that turn a complete draft into a resolved `Config`. Merge behaviour
/// comes from the field slot types, not from the implementor.
pub trait ResourceSchema: Sized + 'static {
    /// Resource type name, e.g. `"bucket"`
    const KIND: &'static str;

    /// Name of the identity field, reported when the identity is empty
    const IDENTITY_FIELD: &'static str = "name";

    /// Declared fields, excluding the identity
    const FIELDS: &'static [FieldSpec];

    /// Typed field record; `Default` is the empty draft
    type Fields: Merge + Default + Clone + PartialEq + fmt::Debug;

    /// Scalar assignments, one variant per scalar field
    type Scalar: Clone + fmt::Debug;

    /// List contributions, one variant per accumulating field
    type List: Clone + fmt::Debug;

    /// Fully resolved configuration, defaults substituted
    type Config: Clone + PartialEq + fmt::Debug;

    /// Reference to the externally materialized object
    type Handle: Clone + fmt::Debug;

    fn set_scalar(fields: &mut Self::Fields, op: Self::Scalar);

    fn append_list(fields: &mut Self::Fields, op: Self::List);

    /// Check required fields and substitute defaults.
    fn resolve(identity: &Identity, fields: &Self::Fields) -> Result<Self::Config, ValidationError>;

    /// Semantic checks over the resolved configuration.
    fn check(_config: &Self::Config) -> Result<(), ValidationError> {
        Ok(())
    }
}
