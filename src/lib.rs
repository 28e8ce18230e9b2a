//! # nestkv
//!
//! A line-oriented key-value store with:
//! - A fixed verb set (SET, GET, UNSET, COUNTS, FIND, BEGIN, ROLLBACK, COMMIT, END)
//! - Nested transactions backed by per-transaction undo logs
//! - Interchangeable storage: in-process map or remote TCP store
//! - A synchronous publish/subscribe bus between input, storage and output
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Session / Console                           │
//! │        (publishes INPUT, collects OUTPUT/SHUTDOWN)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  EventBus
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Dispatcher                                │
//! │        (grammar → verb events → engine operations)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Engine<B: KvBackend>                         │
//! │              (transaction stack / undo log)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐      ┌─────────────┐
//!   │  MemTable   │          │ RemoteStore │─TCP─▶│   Server    │
//!   │  (local)    │          │  (client)   │      │ (MemTable)  │
//!   └─────────────┘          └─────────────┘      └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod bus;
pub mod command;
pub mod engine;
pub mod memtable;
pub mod protocol;
pub mod network;
pub mod dispatcher;
pub mod session;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{NestError, Result};
pub use config::{BackendKind, Config};
pub use engine::{Engine, LocalEngine, Output, RemoteEngine, StorageEngine};
pub use session::Session;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of nestkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
