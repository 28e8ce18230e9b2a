//! Backend contract
//!
//! The raw key/value primitives a storage engine runs its transaction
//! algorithm on top of.

use crate::error::Result;

/// One write inside a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: String, value: String },
    Delete { key: String },
}

/// Primitive key/value store
///
/// Implementations are the local in-process map and the remote client.
/// Every failure must surface as an `Err`; an unreachable store is never
/// reported as an absent key.
pub trait KvBackend: Send {
    /// Current value of `key`, `None` if absent
    fn get(&mut self, key: &str) -> Result<Option<String>>;

    /// Store `value` at `key`
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` (absent keys are not an error)
    fn delete(&mut self, key: &str) -> Result<()>;

    /// Enumerate every key, in no particular order
    fn keys(&mut self) -> Result<Vec<String>>;

    /// Every key/value pair
    ///
    /// The default enumerates keys then fetches each value individually.
    /// There is no read consistency across the walk: keys removed between
    /// enumeration and fetch are skipped.
    fn scan(&mut self) -> Result<Vec<(String, String)>> {
        let keys = self.keys()?;
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get(&key)? {
                entries.push((key, value));
            }
        }
        Ok(entries)
    }

    /// Apply `ops` as one unit where the store supports it
    ///
    /// The default applies them in order and stops at the first failure.
    fn apply_batch(&mut self, ops: Vec<BatchOp>) -> Result<()> {
        for op in ops {
            match op {
                BatchOp::Put { key, value } => self.set(&key, &value)?,
                BatchOp::Delete { key } => self.delete(&key)?,
            }
        }
        Ok(())
    }
}
