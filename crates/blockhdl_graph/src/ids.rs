//! Opaque ID newtypes for graph entities.

use crate::define_id;

define_id!(
    /// Opaque, copyable ID for a block in a [`BlockGraph`](crate::BlockGraph).
    ///
    /// IDs are assigned in model order, so ordered sets of `BlockId` iterate
    /// blocks in the order the model description lists them.
    BlockId
);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.as_raw())
    }
}
