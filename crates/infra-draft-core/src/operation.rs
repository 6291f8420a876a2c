//! Operations: the closed set of draft refinements.

use std::fmt;

use crate::schema::ResourceSchema;

/// One refinement of a draft.
///
/// Scalar assignments overwrite, list contributions append, and nested
/// operations apply their children in order. Applying `Nested(ops)` is the
/// same as applying each of `ops` in sequence, so grouping never changes
/// the result.
pub enum Operation<S: ResourceSchema> {
    SetScalar(S::Scalar),
    AppendList(S::List),
    Nested(Vec<Operation<S>>),
}

impl<S: ResourceSchema> Operation<S> {
    pub fn set(op: S::Scalar) -> Self {
        Self::SetScalar(op)
    }

    pub fn append(op: S::List) -> Self {
        Self::AppendList(op)
    }

    pub fn nested(ops: impl IntoIterator<Item = Operation<S>>) -> Self {
        Self::Nested(ops.into_iter().collect())
    }

    /// Fold this operation into a field record.
    pub fn apply_to(self, fields: &mut S::Fields) {
        match self {
            Operation::SetScalar(op) => S::set_scalar(fields, op),
            Operation::AppendList(op) => S::append_list(fields, op),
            Operation::Nested(ops) => {
                for op in ops {
                    op.apply_to(fields);
                }
            }
        }
    }

    /// Number of leaf operations.
    pub fn leaf_count(&self) -> usize {
        match self {
            Operation::SetScalar(_) | Operation::AppendList(_) => 1,
            Operation::Nested(ops) => ops.iter().map(Operation::leaf_count).sum(),
        }
    }
}

impl<S: ResourceSchema> Clone for Operation<S> {
    fn clone(&self) -> Self {
        match self {
            Operation::SetScalar(op) => Operation::SetScalar(op.clone()),
            Operation::AppendList(op) => Operation::AppendList(op.clone()),
            Operation::Nested(ops) => Operation::Nested(ops.clone()),
        }
    }
}

impl<S: ResourceSchema> fmt::Debug for Operation<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SetScalar(op) => f.debug_tuple("SetScalar").field(op).finish(),
            Operation::AppendList(op) => f.debug_tuple("AppendList").field(op).finish(),
            Operation::Nested(ops) => f.debug_tuple("Nested").field(ops).finish(),
        }
    }
}
