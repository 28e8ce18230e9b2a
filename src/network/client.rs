//! Remote store client
//!
//! Blocking client for the store server, used as the remote engine backend.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::config::Config;
use crate::engine::{BatchOp, KvBackend};
use crate::error::{NestError, Result};
use crate::protocol::{decode_key_list, read_response, write_command, Command, Response, Status};

/// Both halves of one server connection
struct Wire {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

/// Connection to a remote key/value store
///
/// Every call is one blocking round trip. I/O failures, timeouts and ERROR
/// responses all surface as `Err`; there are no retries.
///
/// A round trip that fails partway may leave a reply in flight, so the
/// connection is dropped and every later call fails with
/// `NestError::Network`.
pub struct RemoteStore {
    wire: Option<Wire>,
    addr: String,
}

impl RemoteStore {
    /// Connect to `config.remote_addr` and verify the server answers PING
    pub fn connect(config: &Config) -> Result<Self> {
        let stream = open_stream(config)?;

        stream.set_nodelay(true)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        let read_stream = stream.try_clone()?;
        let mut store = Self {
            wire: Some(Wire {
                reader: BufReader::new(read_stream),
                writer: BufWriter::new(stream),
            }),
            addr: config.remote_addr.clone(),
        };

        store.ping()?;
        tracing::debug!("Connected to remote store at {}", store.addr);

        Ok(store)
    }

    /// Health check
    pub fn ping(&mut self) -> Result<()> {
        let response = self.request(&Command::Ping)?;
        match response.payload_bytes() {
            b"PONG" => Ok(()),
            other => Err(NestError::Protocol(format!(
                "unexpected PING reply: {:?}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    /// Address this client is connected to
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// False once a failed round trip has dropped the connection
    pub fn is_connected(&self) -> bool {
        self.wire.is_some()
    }

    /// Send one command and read its response
    fn request(&mut self, command: &Command) -> Result<Response> {
        tracing::trace!("-> {}: {:?}", self.addr, command.command_type());

        let wire = match self.wire.as_mut() {
            Some(wire) => wire,
            None => {
                return Err(NestError::Network(format!(
                    "connection to {} was dropped after a failed request",
                    self.addr
                )))
            }
        };

        let result = write_command(&mut wire.writer, command).and_then(|()| read_response(&mut wire.reader));
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Dropping connection to {}: {}", self.addr, e);
                self.wire = None;
                return Err(e);
            }
        };

        match response.status {
            Status::Error => Err(NestError::Remote(
                String::from_utf8_lossy(response.payload_bytes()).into_owned(),
            )),
            _ => Ok(response),
        }
    }

    /// Send a command that must answer OK
    fn request_ok(&mut self, command: &Command) -> Result<Response> {
        let response = self.request(command)?;
        if response.status != Status::Ok {
            return Err(NestError::Protocol(format!(
                "{:?}: unexpected status {:?}",
                command.command_type(),
                response.status
            )));
        }
        Ok(response)
    }
}

fn open_stream(config: &Config) -> Result<TcpStream> {
    let timeout = match config.connect_timeout() {
        Some(timeout) => timeout,
        None => return Ok(TcpStream::connect(&config.remote_addr)?),
    };

    let mut last_err = None;
    for addr in config.remote_addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(match last_err {
        Some(e) => e.into(),
        None => NestError::Config(format!(
            "remote address {} did not resolve",
            config.remote_addr
        )),
    })
}

impl KvBackend for RemoteStore {
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        let response = self.request(&Command::Get {
            key: key.to_string(),
        })?;

        match response.status {
            Status::NotFound => Ok(None),
            _ => {
                let value = response.payload.unwrap_or_default();
                String::from_utf8(value)
                    .map(Some)
                    .map_err(|_| NestError::Protocol(format!("value of {} is not UTF-8", key)))
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.request_ok(&Command::Set {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.request_ok(&Command::Delete {
            key: key.to_string(),
        })?;
        Ok(())
    }

    fn keys(&mut self) -> Result<Vec<String>> {
        let response = self.request_ok(&Command::Keys)?;
        decode_key_list(response.payload_bytes())
    }

    fn apply_batch(&mut self, ops: Vec<BatchOp>) -> Result<()> {
        self.request_ok(&Command::Batch { ops })?;
        Ok(())
    }
}
