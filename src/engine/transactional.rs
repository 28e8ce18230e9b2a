//! Transactional engine
//!
//! The undo-log algorithm, written once and run over any `KvBackend`.

use crate::error::Result;

use super::{KvBackend, Output, StorageEngine, TransactionStack};

/// Storage engine with nested transactions over a backend `B`
///
/// ## Transaction Model
///
/// - **BEGIN** pushes an empty frame
/// - **Writes** (set/unset) first record the key's current value into the
///   innermost frame, then mutate the backend; changes are live immediately
/// - **ROLLBACK** applies the innermost frame's records as one batch, then
///   pops it
/// - **COMMIT** pops the innermost frame without applying it. Its records
///   are discarded, not merged into the enclosing frame, so an outer
///   rollback never reverts writes recorded only in a committed inner frame
pub struct Engine<B> {
    /// Backing key/value store
    backend: B,

    /// Open transactions, innermost last
    transactions: TransactionStack,
}

impl<B: KvBackend> Engine<B> {
    /// Create an engine with no open transaction
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            transactions: TransactionStack::new(),
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn transactions(&self) -> &TransactionStack {
        &self.transactions
    }
}

impl<B: KvBackend> StorageEngine for Engine<B> {
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.transactions.is_active() {
            let previous = self.backend.get(key)?;
            self.transactions.record(key, previous);
        }
        self.backend.set(key, value)
    }

    fn get(&mut self, key: &str) -> Result<Output> {
        Ok(match self.backend.get(key)? {
            Some(value) => Output::Value(value),
            None => Output::Null,
        })
    }

    fn unset(&mut self, key: &str) -> Result<()> {
        let previous = match self.backend.get(key)? {
            Some(value) => value,
            None => return Ok(()),
        };

        self.transactions.record(key, Some(previous));
        self.backend.delete(key)
    }

    fn counts(&mut self, value: &str) -> Result<Output> {
        let count = self
            .backend
            .scan()?
            .iter()
            .filter(|(_, v)| v == value)
            .count();
        Ok(Output::Count(count))
    }

    fn find(&mut self, value: &str) -> Result<Output> {
        let mut keys: Vec<String> = self
            .backend
            .scan()?
            .into_iter()
            .filter(|(_, v)| v == value)
            .map(|(k, _)| k)
            .collect();

        if keys.is_empty() {
            return Ok(Output::Null);
        }

        keys.sort();
        Ok(Output::Value(keys.join(" ")))
    }

    fn begin(&mut self) {
        self.transactions.push();
        tracing::debug!("BEGIN (depth {})", self.transactions.depth());
    }

    fn rollback(&mut self) -> Result<Option<Output>> {
        let batch = match self.transactions.top() {
            Some(frame) => frame.undo_batch(),
            None => return Ok(Some(Output::NoTransaction)),
        };

        tracing::debug!(
            "ROLLBACK (depth {}, {} key(s) restored)",
            self.transactions.depth(),
            batch.len()
        );

        // Pop only once the batch landed, so a failed restore can be retried
        if !batch.is_empty() {
            self.backend.apply_batch(batch)?;
        }
        self.transactions.pop();

        Ok(None)
    }

    fn commit(&mut self) -> Option<Output> {
        match self.transactions.pop() {
            Some(frame) => {
                tracing::debug!(
                    "COMMIT (depth {}, {} undo record(s) discarded)",
                    self.transactions.depth() + 1,
                    frame.len()
                );
                None
            }
            None => Some(Output::NoTransaction),
        }
    }

    fn transaction_depth(&self) -> usize {
        self.transactions.depth()
    }
}
