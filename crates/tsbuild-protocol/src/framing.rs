//! Length-delimited framing.
//!
//! Each frame is a 4-byte little-endian length prefix followed by that
//! many bytes of UTF-8 JSON. Both requests and responses use the same
//! framing; the payload type is fixed by direction.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ProtocolError;

/// Maximum accepted frame size (16 MB). A request larger than this is
/// rejected rather than buffered.
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Read one framed value from the reader.
///
/// A clean EOF before the first length byte yields an error for which
/// [`ProtocolError::is_eof`] returns true; the caller treats that as
/// end of the request stream, not a failure.
pub fn read_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T, ProtocolError> {
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        let n = reader.read(&mut len_buf[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Err(ProtocolError::eof());
            }
            return Err(ProtocolError::truncated());
        }
        filled += n;
    }

    let len = u32::from_le_bytes(len_buf);
    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::frame_too_large(len as u64, MAX_FRAME_SIZE as u64));
    }

    let mut body = vec![0u8; len as usize];
    reader
        .read_exact(&mut body)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ProtocolError::truncated(),
            _ => ProtocolError::from(e),
        })?;

    serde_json::from_slice(&body)
        .map_err(|e| ProtocolError::invalid_request(format!("invalid JSON: {}", e)))
}

/// Write one framed value to the writer and flush it.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<(), ProtocolError> {
    let body = serde_json::to_vec(value)
        .map_err(|e| ProtocolError::invalid_request(format!("encode failed: {}", e)))?;
    let len = body.len() as u32;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&body)?;
    writer.flush()?;
    Ok(())
}
