//! MemTable implementation
//!
//! BTreeMap-based table with RwLock for concurrency.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::engine::{BatchOp, KvBackend};
use crate::error::Result;

/// In-memory key/value table
///
/// Safe to share across threads (the server hands an `Arc<MemTable>` to
/// every connection). Batches are applied under a single write lock, so
/// readers never observe a half-applied batch.
#[derive(Debug, Default)]
pub struct MemTable {
    data: RwLock<BTreeMap<String, String>>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.read().get(key).cloned()
    }

    /// Put a key-value pair (write lock)
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.write().insert(key.into(), value.into());
    }

    /// Delete a key (write lock)
    ///
    /// Returns true if the key existed
    pub fn delete(&self, key: &str) -> bool {
        self.data.write().remove(key).is_some()
    }

    /// Apply every op under one write lock
    pub fn apply(&self, ops: Vec<BatchOp>) {
        let mut data = self.data.write();
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    data.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
    }

    /// All keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    /// All entries in sorted key order
    pub fn entries(&self) -> Vec<(String, String)> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl KvBackend for MemTable {
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        Ok(MemTable::get(self, key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.put(key, value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        MemTable::delete(self, key);
        Ok(())
    }

    fn keys(&mut self) -> Result<Vec<String>> {
        Ok(MemTable::keys(self))
    }

    fn scan(&mut self) -> Result<Vec<(String, String)>> {
        Ok(self.entries())
    }

    fn apply_batch(&mut self, ops: Vec<BatchOp>) -> Result<()> {
        self.apply(ops);
        Ok(())
    }
}
