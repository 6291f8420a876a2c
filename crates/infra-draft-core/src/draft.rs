//! Draft configurations
//!
//! A `Draft` is an immutable value: `apply` and `combine` return new drafts
//! and leave their inputs untouched. `finalize` takes the draft by value, so
//! a draft lineage yields at most one resource unless the caller clones it
//! first.

use serde::Serialize;
use std::fmt;

use crate::error::ValidationError;
use crate::field::Merge;
use crate::finalized::Finalized;
use crate::operation::Operation;
use crate::schema::ResourceSchema;

/// Required identity of a draft (its name).
///
/// The core only checks non-emptiness; naming rules belong to resource types.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identity {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Everything specified so far for one resource.
pub struct Draft<S: ResourceSchema> {
    identity: Identity,
    fields: S::Fields,
}

impl<S: ResourceSchema> Draft<S> {
    /// Initial draft: all scalars unset, all lists empty. Never fails.
    pub fn create(identity: impl Into<Identity>) -> Self {
        Self {
            identity: identity.into(),
            fields: S::Fields::default(),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn fields(&self) -> &S::Fields {
        &self.fields
    }

    /// New draft with `op` folded in (program order).
    pub fn apply(&self, op: Operation<S>) -> Self {
        let mut fields = self.fields.clone();
        op.apply_to(&mut fields);
        Self {
            identity: self.identity.clone(),
            fields,
        }
    }

    /// New draft with every operation folded in, left to right.
    pub fn apply_all(&self, ops: impl IntoIterator<Item = Operation<S>>) -> Self {
        let mut fields = self.fields.clone();
        for op in ops {
            op.apply_to(&mut fields);
        }
        Self {
            identity: self.identity.clone(),
            fields,
        }
    }

    pub fn set(&self, op: S::Scalar) -> Self {
        self.apply(Operation::SetScalar(op))
    }

    pub fn append(&self, op: S::List) -> Self {
        self.apply(Operation::AppendList(op))
    }

    /// Merge a draft built independently, treating `later` as applied after
    /// `self`: set scalars in `later` win, lists concatenate.
    ///
    /// The identity follows the same rule, with the empty name as unset.
    pub fn combine(&self, later: &Draft<S>) -> Self {
        let identity = if later.identity.is_empty() {
            self.identity.clone()
        } else {
            later.identity.clone()
        };
        tracing::trace!(kind = S::KIND, identity = %identity, "combining drafts");
        Self {
            identity,
            fields: self.fields.clone().merge(later.fields.clone()),
        }
    }

    /// Run every validation `finalize` runs, without consuming the draft.
    pub fn resolve(&self) -> Result<S::Config, ValidationError> {
        if self.identity.is_empty() {
            return Err(ValidationError::missing(S::IDENTITY_FIELD));
        }
        let config = S::resolve(&self.identity, &self.fields)?;
        S::check(&config)?;
        Ok(config)
    }

    /// Validate, substitute defaults and convert, consuming the draft.
    ///
    /// `convert` maps the resolved configuration into whatever the external
    /// system consumes; it runs only once validation has passed.
    pub fn finalize<P, F>(self, convert: F) -> Result<Finalized<S, P>, ValidationError>
    where
        F: FnOnce(&Identity, &S::Config) -> P,
    {
        let config = self.resolve()?;
        let target = convert(&self.identity, &config);
        tracing::debug!(kind = S::KIND, identity = %self.identity, "draft finalized");
        Ok(Finalized::new(self.identity, config, target))
    }
}

impl<S: ResourceSchema> Clone for Draft<S> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            fields: self.fields.clone(),
        }
    }
}

impl<S: ResourceSchema> PartialEq for Draft<S> {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity && self.fields == other.fields
    }
}

impl<S: ResourceSchema> fmt::Debug for Draft<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Draft")
            .field("kind", &S::KIND)
            .field("identity", &self.identity)
            .field("fields", &self.fields)
            .finish()
    }
}
