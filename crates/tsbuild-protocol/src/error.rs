//! Protocol-level errors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable error codes for protocol failures.
///
/// These are reported in responses when a request cannot be decoded at
/// all; build failures are reported through `WorkResponse::exit_code`
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolErrorKind {
    /// Malformed frame or JSON, or missing required fields.
    InvalidRequest,
    /// Frame length exceeds the allowed maximum.
    FrameTooLarge,
    /// The input stream ended mid-frame.
    TruncatedFrame,
    /// Underlying I/O failure on the worker's streams.
    Io,
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "INVALID_REQUEST"),
            Self::FrameTooLarge => write!(f, "FRAME_TOO_LARGE"),
            Self::TruncatedFrame => write!(f, "TRUNCATED_FRAME"),
            Self::Io => write!(f, "IO"),
        }
    }
}

/// A failure to read or write a protocol frame.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ProtocolError {
    pub kind: ProtocolErrorKind,
    pub message: String,
}

impl ProtocolError {
    pub fn new(kind: ProtocolErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProtocolErrorKind::InvalidRequest, message)
    }

    pub fn frame_too_large(size: u64, max: u64) -> Self {
        Self::new(
            ProtocolErrorKind::FrameTooLarge,
            format!("frame of {} bytes exceeds maximum {}", size, max),
        )
    }

    pub fn truncated() -> Self {
        Self::new(
            ProtocolErrorKind::TruncatedFrame,
            "input ended before the frame was complete",
        )
    }

    /// True when the stream is cleanly closed and the loop should stop.
    pub fn is_eof(&self) -> bool {
        self.kind == ProtocolErrorKind::Io && self.message == "eof"
    }

    pub(crate) fn eof() -> Self {
        Self::new(ProtocolErrorKind::Io, "eof")
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ProtocolErrorKind::Io, e.to_string())
    }
}
