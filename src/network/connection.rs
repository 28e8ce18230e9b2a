//! Connection Handler
//!
//! Handles individual client connections of the store server.

use std::io::{BufRead, BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{NestError, Result};
use crate::memtable::MemTable;
use crate::protocol::{encode_key_list, read_command, write_response, Command, Response};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Table served to every client
    table: Arc<MemTable>,

    /// Set when the server is shutting down
    shutdown: Arc<AtomicBool>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, table: Arc<MemTable>, shutdown: Arc<AtomicBool>) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            table,
            shutdown,
            peer_addr,
        })
    }

    /// Configure connection timeouts
    ///
    /// The read timeout doubles as the idle tick on which the connection
    /// notices a server shutdown.
    pub fn set_timeouts(&mut self, read: Option<Duration>, write: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(read)?;
        self.writer.get_ref().set_write_timeout(write)?;
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends responses.
    /// Returns when the client disconnects, the server shuts down, or an
    /// error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            // Wait for the first byte of the next frame without consuming it
            match self.reader.fill_buf() {
                Ok(buf) if buf.is_empty() => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Ok(_) => {}
                Err(ref e) if is_timeout(e) => {
                    if self.shutdown.load(Ordering::Relaxed) {
                        tracing::debug!("Closing idle client {} for shutdown", self.peer_addr);
                        return Ok(());
                    }
                    continue;
                }
                Err(ref e) if is_disconnect(e) => {
                    tracing::debug!("Connection reset by client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }

            // Read next command
            let command = match read_command(&mut self.reader) {
                Ok(cmd) => cmd,
                Err(NestError::Io(ref e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    tracing::debug!("Client {} disconnected mid-frame", self.peer_addr);
                    return Ok(());
                }
                Err(NestError::Io(ref e)) if is_disconnect(e) => {
                    tracing::debug!("Connection lost to client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // Send error response if possible
                    let _ = self.send_response(Response::error(&e.to_string()));
                    return Err(e);
                }
            };

            tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);

            // Execute command
            let response = self.execute_command(command);

            // Send response
            if let Err(e) = self.send_response(response) {
                // If the client disconnected before we could send the response,
                // log and exit gracefully rather than treating it as a server error.
                if let NestError::Io(ref io_err) = e {
                    if is_disconnect(io_err) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Execute a command against the shared table
    fn execute_command(&self, command: Command) -> Response {
        match command {
            Command::Get { key } => match self.table.get(&key) {
                Some(value) => Response::ok(Some(value.into_bytes())),
                None => Response::not_found(),
            },
            Command::Set { key, value } => {
                self.table.put(key, value);
                Response::ok(None)
            }
            Command::Delete { key } => {
                self.table.delete(&key);
                Response::ok(None)
            }
            Command::Ping => Response::ok(Some(b"PONG".to_vec())),
            Command::Keys => Response::ok(Some(encode_key_list(&self.table.keys()))),
            Command::Batch { ops } => {
                tracing::debug!("Applying batch of {} op(s) from {}", ops.len(), self.peer_addr);
                self.table.apply(ops);
                Response::ok(None)
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Read timeout (Windows reports TimedOut instead of WouldBlock)
fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn is_disconnect(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
    )
}
