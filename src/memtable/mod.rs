//! MemTable Module
//!
//! In-memory key/value map.
//!
//! ## Responsibilities
//! - Backing store of the local engine
//! - Backing store hosted by the remote server
//! - Single-writer/multi-reader access pattern
//! - Atomic batch application
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in RwLock:
//! - Ordered keys, so enumeration is deterministic
//! - Simple and correct first, optimize later

mod table;

pub use table::MemTable;
