//! Argument checks shared by every store operation.

use crate::{BatchOp, Key, StoreError, StoreResult};

/// Reject empty keys.
pub fn check_key(key: &Key) -> StoreResult<()> {
    match key {
        Key::Text(s) if s.is_empty() => {
            Err(StoreError::InvalidKey("key cannot be an empty String"))
        }
        Key::Binary(b) if b.is_empty() => {
            Err(StoreError::InvalidKey("key cannot be an empty Buffer"))
        }
        _ => Ok(()),
    }
}

/// Check every operation of a batch before any of it is applied.
pub fn check_batch(ops: &[BatchOp]) -> StoreResult<()> {
    ops.iter().try_for_each(|op| check_key(op.key()))
}
