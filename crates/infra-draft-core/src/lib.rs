//! Draft configuration core
//!
//! Generic builder for resource configuration records:
//! - Drafts are immutable; every operation produces a new draft
//! - Scalars: last write wins
//! - Lists: append in application order (REPLACE only when declared)
//! - `finalize` is the single validation boundary and consumes the draft

pub mod draft;
pub mod error;
pub mod field;
pub mod finalized;
pub mod handle;
pub mod operation;
pub mod schema;

pub use draft::{Draft, Identity};
pub use error::{HandleError, ValidationError};
pub use field::{Keyed, List, Merge, ReplaceList, Scalar};
pub use finalized::Finalized;
pub use handle::HandleSlot;
pub use operation::Operation;
pub use schema::{FieldClass, FieldSpec, ResourceSchema};
