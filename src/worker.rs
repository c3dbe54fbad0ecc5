//! Worker entry points.
//!
//! A worker owns the process-lifetime caches and serves builds in one
//! of two modes: a single-shot run that compiles once and exits, or a
//! persistent loop reading length-delimited requests from stdin and
//! writing one response per request to stdout. In persistent mode all
//! diagnostic output is captured into the response; nothing may leak
//! onto stdout, which belongs to the framed protocol.

use std::io::{self, Read, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};

use tsbuild_protocol::error::ProtocolErrorKind;
use tsbuild_protocol::{read_frame, write_frame, ProtocolError, WorkRequest, WorkResponse};

use crate::build::{run_one_build, BuildError, Caches};
use crate::emit::{DefaultEmitter, Emitter};
use crate::pipeline::PassRegistry;

/// Environment variable enabling debug logging on stderr.
const DEBUG_ENV: &str = "TSBUILD_DEBUG";

/// Log a debug line to stderr when `TSBUILD_DEBUG` is set. stderr is
/// safe in both modes; the framed protocol only owns stdout.
pub(crate) fn debug(msg: &str) {
    if std::env::var_os(DEBUG_ENV).is_some() {
        eprintln!("[debug] {}", msg);
    }
}

/// Resident set size in bytes, where the platform exposes it.
#[cfg(target_os = "linux")]
fn rss_bytes() -> Option<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(resident_pages * 4096)
}

#[cfg(not(target_os = "linux"))]
fn rss_bytes() -> Option<u64> {
    None
}

pub struct Worker {
    caches: Caches,
    registry: PassRegistry,
    emitter: Box<dyn Emitter>,
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

impl Worker {
    pub fn new() -> Self {
        Self {
            caches: Caches::new(),
            registry: PassRegistry::new(),
            emitter: Box::new(DefaultEmitter::new()),
        }
    }

    pub fn with_registry(mut self, registry: PassRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_emitter(mut self, emitter: Box<dyn Emitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Run one build from the argument vector, diagnostics to stderr.
    /// Returns the process exit code.
    pub fn run_single(&mut self, args: &[String]) -> i32 {
        let mut err = io::stderr();
        let Worker { caches, registry, emitter } = self;
        match run_one_build(caches, registry, emitter.as_ref(), args, None, &mut err) {
            Ok(()) => 0,
            Err(BuildError::Diagnostics { .. }) => 1,
            Err(e) => {
                eprintln!("error: {}", e);
                1
            }
        }
    }

    /// Serve requests from stdin until it closes.
    pub fn run_loop(&mut self) -> Result<(), ProtocolError> {
        self.run_loop_with_io(&mut io::stdin().lock(), &mut io::stdout().lock())
    }

    /// Serve requests with custom I/O (for testing).
    pub fn run_loop_with_io<R: Read, W: Write>(
        &mut self,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<(), ProtocolError> {
        loop {
            let request = match read_frame::<_, WorkRequest>(reader) {
                Ok(req) => req,
                Err(e) if e.is_eof() => return Ok(()),
                Err(e)
                    if matches!(
                        e.kind,
                        ProtocolErrorKind::InvalidRequest | ProtocolErrorKind::FrameTooLarge
                    ) =>
                {
                    // A bad request fails that request, not the worker.
                    write_frame(writer, &WorkResponse::failure(e.to_string()))?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let response = self.handle_request(&request);
            write_frame(writer, &response)?;
            self.snapshot_memory();
        }
    }

    /// Execute one request, capturing all build output.
    pub fn handle_request(&mut self, request: &WorkRequest) -> WorkResponse {
        let mut output = Vec::new();
        let args: Vec<String> = request
            .arguments
            .iter()
            .filter(|a| a.as_str() != tsbuild_protocol::PERSISTENT_WORKER_FLAG)
            .cloned()
            .collect();
        let inputs = request.has_inputs().then_some(&request.inputs);

        let Worker { caches, registry, emitter } = self;
        // An internal invariant violation is request-fatal, never
        // worker-fatal: the loop answers with a failure and stays up.
        let result = catch_unwind(AssertUnwindSafe(|| {
            run_one_build(caches, registry, emitter.as_ref(), &args, inputs, &mut output)
        }));

        let mut text = String::from_utf8_lossy(&output).into_owned();
        match result {
            Ok(Ok(())) => WorkResponse::success(text),
            Ok(Err(BuildError::Diagnostics { .. })) => WorkResponse::failure(text),
            Ok(Err(e)) => {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(&format!("error: {}\n", e));
                WorkResponse::failure(text)
            }
            Err(_) => WorkResponse::failure("internal error: build panicked".to_string()),
        }
    }

    fn snapshot_memory(&self) {
        debug(&format!(
            "[worker] rss: {}, file cache: {} bytes in {} record(s)",
            match rss_bytes() {
                Some(b) => format!("{} bytes", b),
                None => "unavailable".to_string(),
            },
            self.caches.files.used_bytes(),
            self.caches.files.len(),
        ));
    }
}
