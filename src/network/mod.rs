//! Network Module
//!
//! TCP server and client for the remote store.
//!
//! ## Architecture
//! - Server: single acceptor thread, worker thread pool for connections,
//!   commands applied to a shared `MemTable`
//! - Client: `RemoteStore`, the backend of the remote engine

mod server;
mod connection;
mod client;

pub use server::Server;
pub use connection::Connection;
pub use client::RemoteStore;
