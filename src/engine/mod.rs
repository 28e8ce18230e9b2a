//! Engine Module
//!
//! The storage engine contract and its transactional implementation.
//!
//! ## Responsibilities
//! - Execute each verb against a backing store
//! - Maintain the transaction stack (one undo log per open transaction)
//! - Produce the result line for verbs that have one
//!
//! ## Backends
//! - `LocalEngine`: in-process `MemTable`
//! - `RemoteEngine`: remote key/value service via `RemoteStore`
//!
//! Both run the same `Engine<B>` algorithm and agree on every output.

mod backend;
mod transaction;
mod transactional;

pub use backend::{BatchOp, KvBackend};
pub use transaction::{Frame, TransactionStack};
pub use transactional::Engine;

use std::fmt;

use crate::command::UNKNOWN_COMMAND;
use crate::error::Result;
use crate::memtable::MemTable;
use crate::network::RemoteStore;

/// Engine over the in-process map
pub type LocalEngine = Engine<MemTable>;

/// Engine over the remote key/value service
pub type RemoteEngine = Engine<RemoteStore>;

/// A result line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// A stored value, or space-joined keys for FIND
    Value(String),

    /// Absent key / no FIND match
    Null,

    /// COUNTS result
    Count(usize),

    /// ROLLBACK/COMMIT with no open transaction
    NoTransaction,

    /// Unrecognized verb or malformed arguments
    UnknownCommand,
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Value(value) => f.write_str(value),
            Output::Null => f.write_str("NULL"),
            Output::Count(count) => write!(f, "{}", count),
            Output::NoTransaction => f.write_str("NO TRANSACTION"),
            Output::UnknownCommand => f.write_str(UNKNOWN_COMMAND),
        }
    }
}

/// A typed storage operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Set { key: String, value: String },
    Get { key: String },
    Unset { key: String },
    Counts { value: String },
    Find { value: String },
    Begin,
    Rollback,
    Commit,
}

/// Operation contract shared by every backend
pub trait StorageEngine: Send {
    /// Store `value` at `key`, recording the prior state if a transaction is open
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Value at `key` or `NULL`
    fn get(&mut self, key: &str) -> Result<Output>;

    /// Remove `key`; absent keys are left alone and not recorded
    fn unset(&mut self, key: &str) -> Result<()>;

    /// Number of keys whose value equals `value`
    fn counts(&mut self, value: &str) -> Result<Output>;

    /// Keys whose value equals `value`, sorted and space-joined, or `NULL`
    fn find(&mut self, value: &str) -> Result<Output>;

    /// Open a nested transaction
    fn begin(&mut self);

    /// Undo and close the innermost transaction
    fn rollback(&mut self) -> Result<Option<Output>>;

    /// Keep the innermost transaction's changes and close it
    fn commit(&mut self) -> Option<Output>;

    /// Number of open transactions
    fn transaction_depth(&self) -> usize;

    /// Execute an operation
    ///
    /// Routes operations to the appropriate handler
    fn execute(&mut self, operation: Operation) -> Result<Option<Output>> {
        match operation {
            Operation::Set { key, value } => {
                self.set(&key, &value)?;
                Ok(None)
            }
            Operation::Get { key } => self.get(&key).map(Some),
            Operation::Unset { key } => {
                self.unset(&key)?;
                Ok(None)
            }
            Operation::Counts { value } => self.counts(&value).map(Some),
            Operation::Find { value } => self.find(&value).map(Some),
            Operation::Begin => {
                self.begin();
                Ok(None)
            }
            Operation::Rollback => self.rollback(),
            Operation::Commit => Ok(self.commit()),
        }
    }
}
