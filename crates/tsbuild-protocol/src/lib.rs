//! tsbuild worker protocol
//!
//! Defines the request/response envelopes and the length-delimited
//! framing used between a persistent tsbuild worker and the process
//! that drives it over the worker's standard streams.

pub mod error;
pub mod framing;
pub mod request;
pub mod response;

pub use error::ProtocolError;
pub use framing::{read_frame, write_frame, MAX_FRAME_SIZE};
pub use request::WorkRequest;
pub use response::WorkResponse;

/// Argument that switches the worker into persistent mode.
pub const PERSISTENT_WORKER_FLAG: &str = "--persistent_worker";

/// Detect persistent-worker mode from an argument vector.
///
/// The flag may appear anywhere in the vector; all other arguments are
/// forwarded to individual requests.
pub fn run_as_worker(args: &[String]) -> bool {
    args.iter().any(|a| a == PERSISTENT_WORKER_FLAG)
}
