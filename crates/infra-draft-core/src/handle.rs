//! Write-once materialized handle slot.

use std::fmt;
use std::sync::OnceLock;

use crate::error::HandleError;

/// Slot for the reference to an externally materialized object.
///
/// Starts empty. The first `materialize` wins through a single atomic set;
/// any later write is rejected with `DoubleMaterialization`, and reads before
/// the first write fail with `UseBeforeMaterialization`.
pub struct HandleSlot<H> {
    resource: String,
    cell: OnceLock<H>,
}

impl<H> HandleSlot<H> {
    /// Empty slot; `resource` labels errors (e.g. `"queue/orders"`).
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            cell: OnceLock::new(),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn materialize(&self, handle: H) -> Result<(), HandleError> {
        self.cell
            .set(handle)
            .map_err(|_| HandleError::DoubleMaterialization {
                resource: self.resource.clone(),
            })?;
        tracing::debug!(resource = %self.resource, "handle materialized");
        Ok(())
    }

    pub fn get(&self) -> Result<&H, HandleError> {
        self.cell
            .get()
            .ok_or_else(|| HandleError::UseBeforeMaterialization {
                resource: self.resource.clone(),
            })
    }

    pub fn is_materialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<H: fmt::Debug> fmt::Debug for HandleSlot<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleSlot")
            .field("resource", &self.resource)
            .field("handle", &self.cell.get())
            .finish()
    }
}
