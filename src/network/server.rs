//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, TrySendError};

use crate::config::Config;
use crate::error::{NestError, Result};
use crate::memtable::MemTable;
use crate::protocol::{write_response, Response};

use super::Connection;

/// How long the accept loop sleeps when no client is waiting
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// TCP server hosting a shared `MemTable`
///
/// ## Threading
/// - One acceptor loop (the thread calling `run`)
/// - `config.workers` worker threads, each serving one connection at a time
/// - Accepted connections queue in a bounded channel of
///   `config.max_connections`; clients arriving when it is full are
///   rejected with an ERROR response
pub struct Server {
    config: Config,
    table: Arc<MemTable>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, table: Arc<MemTable>) -> Result<Self> {
        if config.workers == 0 {
            return Err(NestError::Config("workers must be at least 1".to_string()));
        }
        if config.max_connections == 0 {
            return Err(NestError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        let listener = TcpListener::bind(&config.listen_addr)?;
        // Non-blocking accept so the loop can observe shutdown
        listener.set_nonblocking(true)?;

        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            table,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// The table this server serves
    pub fn table(&self) -> &Arc<MemTable> {
        &self.table
    }

    /// Start the server (blocking until `shutdown` is called)
    pub fn run(&self) -> Result<()> {
        let (tx, rx) = channel::bounded::<TcpStream>(self.config.max_connections);

        let workers: Vec<_> = (0..self.config.workers)
            .map(|id| {
                let rx = rx.clone();
                let table = Arc::clone(&self.table);
                let shutdown = Arc::clone(&self.shutdown);
                let config = self.config.clone();
                thread::Builder::new()
                    .name(format!("nestkv-worker-{}", id))
                    .spawn(move || worker_loop(rx, table, shutdown, config))
            })
            .collect::<std::io::Result<_>>()?;

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::trace!("Accepted connection from {}", addr);
                    stream.set_nonblocking(false)?;
                    match tx.try_send(stream) {
                        Ok(()) => {}
                        Err(TrySendError::Full(mut stream)) => {
                            tracing::warn!("Rejecting {}: too many connections", addr);
                            let _ = write_response(&mut stream, &Response::error("too many connections"));
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            return Err(NestError::Network("worker pool is gone".to_string()));
                        }
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) => tracing::warn!("Accept failed: {}", e),
            }
        }

        tracing::info!(
            "Shutting down with {} key(s) in the store, waiting for {} worker(s)",
            self.table.len(),
            workers.len()
        );

        // Closing the channel ends every worker loop once its queue drains
        drop(tx);
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Shared flag that triggers shutdown when set
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }
}

fn worker_loop(rx: Receiver<TcpStream>, table: Arc<MemTable>, shutdown: Arc<AtomicBool>, config: Config) {
    for stream in rx.iter() {
        let result = Connection::new(stream, Arc::clone(&table), Arc::clone(&shutdown)).and_then(|mut conn| {
            conn.set_timeouts(config.read_timeout(), config.write_timeout())?;
            conn.handle()
        });

        if let Err(e) = result {
            tracing::warn!("Connection ended with error: {}", e);
        }
    }
}
