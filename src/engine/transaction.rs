//! Transaction stack
//!
//! Each open transaction owns an undo log (a frame). Frames nest LIFO.

use std::collections::HashMap;

use super::BatchOp;

/// Undo log of one transaction scope
///
/// Maps a key to the value it held immediately before the most recent
/// write in this frame; `None` means the key did not exist. A later write
/// to the same key replaces the earlier record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Frame {
    undo: HashMap<String, Option<String>>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the value `key` held before the write about to happen
    pub fn record(&mut self, key: &str, previous: Option<String>) {
        self.undo.insert(key.to_string(), previous);
    }

    /// Recorded previous value for `key`
    ///
    /// Outer `None`: key untouched in this frame.
    /// Inner `None`: key was absent before the write.
    pub fn previous(&self, key: &str) -> Option<&Option<String>> {
        self.undo.get(key)
    }

    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    /// Writes that restore every recorded key
    pub fn undo_batch(&self) -> Vec<BatchOp> {
        self.undo
            .iter()
            .map(|(key, previous)| match previous {
                Some(value) => BatchOp::Put {
                    key: key.clone(),
                    value: value.clone(),
                },
                None => BatchOp::Delete { key: key.clone() },
            })
            .collect()
    }
}

/// LIFO stack of open transactions
#[derive(Debug, Default)]
pub struct TransactionStack {
    frames: Vec<Frame>,
}

impl TransactionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new transaction (depth is unbounded)
    pub fn push(&mut self) {
        self.frames.push(Frame::new());
    }

    /// Close the innermost transaction
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Innermost frame
    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Record into the innermost frame; no-op outside a transaction
    pub fn record(&mut self, key: &str, previous: Option<String>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.record(key, previous);
        }
    }

    pub fn is_active(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
