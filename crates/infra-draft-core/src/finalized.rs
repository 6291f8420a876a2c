//! Finalized resources
//!
//! A finalized resource is frozen: identity, resolved configuration and the
//! converted target are read-only. The only mutable part is the write-once
//! handle slot filled by whatever process materializes the external object.
//! Clones share the same slot, so a resource passed to other builders sees
//! the handle once it is written.

use std::fmt;
use std::sync::Arc;

use crate::draft::Identity;
use crate::error::HandleError;
use crate::handle::HandleSlot;
use crate::schema::ResourceSchema;

struct Inner<S: ResourceSchema, P> {
    identity: Identity,
    config: S::Config,
    target: P,
    handle: HandleSlot<S::Handle>,
}

/// Output of `Draft::finalize`. Cheap to clone.
pub struct Finalized<S: ResourceSchema, P> {
    inner: Arc<Inner<S, P>>,
}

impl<S: ResourceSchema, P> Finalized<S, P> {
    pub(crate) fn new(identity: Identity, config: S::Config, target: P) -> Self {
        let handle = HandleSlot::new(format!("{}/{}", S::KIND, identity));
        Self {
            inner: Arc::new(Inner {
                identity,
                config,
                target,
                handle,
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        S::KIND
    }

    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    pub fn config(&self) -> &S::Config {
        &self.inner.config
    }

    /// The converted representation produced at finalize.
    pub fn target(&self) -> &P {
        &self.inner.target
    }

    /// Record the materialized external object. Succeeds exactly once.
    pub fn materialize(&self, handle: S::Handle) -> Result<(), HandleError> {
        self.inner.handle.materialize(handle)
    }

    /// The materialized handle; an error if it was never written.
    pub fn handle(&self) -> Result<&S::Handle, HandleError> {
        self.inner.handle.get()
    }

    pub fn is_materialized(&self) -> bool {
        self.inner.handle.is_materialized()
    }

    /// Whether both values are clones of the same finalized resource.
    pub fn same_resource(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S: ResourceSchema, P> Clone for Finalized<S, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Structural equality over identity, configuration and target. The handle
/// slot is runtime state and does not take part.
impl<S: ResourceSchema, P: PartialEq> PartialEq for Finalized<S, P> {
    fn eq(&self, other: &Self) -> bool {
        self.same_resource(other)
            || (self.inner.identity == other.inner.identity
                && self.inner.config == other.inner.config
                && self.inner.target == other.inner.target)
    }
}

impl<S: ResourceSchema, P: fmt::Debug> fmt::Debug for Finalized<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finalized")
            .field("kind", &S::KIND)
            .field("identity", &self.inner.identity)
            .field("config", &self.inner.config)
            .field("target", &self.inner.target)
            .field("handle", &self.inner.handle)
            .finish()
    }
}
