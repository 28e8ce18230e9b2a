//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - GET:    key_len (4 bytes) + key
//! - SET:    key_len (4 bytes) + key + value
//! - DELETE: key_len (4 bytes) + key
//! - PING:   empty
//! - KEYS:   empty
//! - BATCH:  count (4 bytes) + ops
//!   - put:    0x01 + key_len (4) + key + value_len (4) + value
//!   - delete: 0x02 + key_len (4) + key
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! A KEYS response payload is count (4 bytes) + (key_len (4) + key)*.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::engine::BatchOp;
use crate::error::{NestError, Result};
use super::{Command, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

const BATCH_PUT: u8 = 0x01;
const BATCH_DELETE: u8 = 0x02;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let mut payload = BytesMut::new();

    match command {
        Command::Get { key } | Command::Delete { key } => put_string(&mut payload, key),
        Command::Set { key, value } => {
            put_string(&mut payload, key);
            payload.put_slice(value.as_bytes());
        }
        Command::Ping | Command::Keys => {}
        Command::Batch { ops } => {
            payload.put_u32(ops.len() as u32);
            for op in ops {
                match op {
                    BatchOp::Put { key, value } => {
                        payload.put_u8(BATCH_PUT);
                        put_string(&mut payload, key);
                        put_string(&mut payload, value);
                    }
                    BatchOp::Delete { key } => {
                        payload.put_u8(BATCH_DELETE);
                        put_string(&mut payload, key);
                    }
                }
            }
        }
    }

    frame(command.command_type() as u8, &payload)
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, mut payload) = split_frame(bytes, "command")?;

    // Parse command based on type
    let command = match cmd_type {
        0x01 => Command::Get {
            key: get_string(&mut payload, "GET key")?,
        },
        0x02 => {
            let key = get_string(&mut payload, "SET key")?;
            let value = take_rest(&mut payload, "SET value")?;
            Command::Set { key, value }
        }
        0x03 => Command::Delete {
            key: get_string(&mut payload, "DELETE key")?,
        },
        0x04 => Command::Ping,
        0x05 => Command::Keys,
        0x06 => Command::Batch {
            ops: decode_batch(&mut payload)?,
        },
        _ => {
            return Err(NestError::Protocol(format!(
                "Unknown command type: 0x{:02x}",
                cmd_type
            )))
        }
    };

    if payload.has_remaining() {
        return Err(NestError::Protocol(format!(
            "{:?} command: unexpected trailing {} bytes",
            command.command_type(),
            payload.remaining()
        )));
    }

    Ok(command)
}

/// Decode BATCH command payload
fn decode_batch(payload: &mut &[u8]) -> Result<Vec<BatchOp>> {
    if payload.remaining() < 4 {
        return Err(NestError::Protocol(
            "BATCH command: missing op count".to_string(),
        ));
    }

    let count = payload.get_u32() as usize;
    // Each op takes at least 5 bytes, don't trust the count for allocation
    let mut ops = Vec::with_capacity(count.min(payload.remaining() / 5));

    for index in 0..count {
        if !payload.has_remaining() {
            return Err(NestError::Protocol(format!(
                "BATCH command: expected {} ops, got {}",
                count, index
            )));
        }

        let op = match payload.get_u8() {
            BATCH_PUT => {
                let key = get_string(payload, "BATCH put key")?;
                let value = get_string(payload, "BATCH put value")?;
                BatchOp::Put { key, value }
            }
            BATCH_DELETE => BatchOp::Delete {
                key: get_string(payload, "BATCH delete key")?,
            },
            tag => {
                return Err(NestError::Protocol(format!(
                    "BATCH command: unknown op tag 0x{:02x}",
                    tag
                )))
            }
        };
        ops.push(op);
    }

    Ok(ops)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    frame(response.status as u8, response.payload_bytes())
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    // Parse status
    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::NotFound,
        0x02 => Status::Error,
        _ => {
            return Err(NestError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    // Extract payload
    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

/// Encode a KEYS response payload
pub fn encode_key_list(keys: &[String]) -> Vec<u8> {
    let mut payload = BytesMut::new();
    payload.put_u32(keys.len() as u32);
    for key in keys {
        put_string(&mut payload, key);
    }
    payload.to_vec()
}

/// Decode a KEYS response payload
pub fn decode_key_list(mut payload: &[u8]) -> Result<Vec<String>> {
    if payload.remaining() < 4 {
        return Err(NestError::Protocol(
            "KEYS response: missing key count".to_string(),
        ));
    }

    let count = payload.get_u32() as usize;
    let mut keys = Vec::with_capacity(count.min(payload.remaining() / 4));
    for _ in 0..count {
        keys.push(get_string(&mut payload, "KEYS response key")?);
    }

    if payload.has_remaining() {
        return Err(NestError::Protocol(format!(
            "KEYS response: unexpected trailing {} bytes",
            payload.remaining()
        )));
    }

    Ok(keys)
}

// =============================================================================
// Framing helpers
// =============================================================================

fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(tag);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message.to_vec()
}

/// Validate the header and return (tag, payload)
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(NestError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let tag = bytes[0];
    let payload_len = payload_len(&bytes[1..HEADER_SIZE])?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(NestError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((tag, &bytes[HEADER_SIZE..total_len]))
}

/// Parse and validate the 4-byte length field
fn payload_len(mut len_bytes: &[u8]) -> Result<usize> {
    let payload_len = len_bytes.get_u32();
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(NestError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(payload_len as usize)
}

fn put_string(buf: &mut BytesMut, s: &str) {
    buf.put_u32(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

/// Read a length-prefixed UTF-8 string
fn get_string(buf: &mut &[u8], what: &str) -> Result<String> {
    if buf.remaining() < 4 {
        return Err(NestError::Protocol(format!("{}: missing length", what)));
    }

    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(NestError::Protocol(format!(
            "{}: incomplete (expected {}, got {})",
            what,
            len,
            buf.remaining()
        )));
    }

    take_utf8(buf, len, what)
}

/// Consume the rest of the buffer as a UTF-8 string
fn take_rest(buf: &mut &[u8], what: &str) -> Result<String> {
    let len = buf.remaining();
    take_utf8(buf, len, what)
}

fn take_utf8(buf: &mut &[u8], len: usize, what: &str) -> Result<String> {
    let bytes = buf.copy_to_bytes(len);
    String::from_utf8(bytes.to_vec())
        .map_err(|_| NestError::Protocol(format!("{}: not valid UTF-8", what)))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    // Read header first
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = payload_len(&header[1..])?;

    // Read payload directly behind the header
    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }

    Ok(message)
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    decode_command(&read_frame(reader)?)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    decode_response(&read_frame(reader)?)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
