//! tsbuild entry point.
//!
//! Invoked either once per build (argument: path to a build
//! configuration file, optionally prefixed with `@`) or as a
//! persistent worker (`--persistent_worker`), in which case requests
//! arrive length-delimited on stdin and responses leave on stdout.

use std::process::ExitCode;

use tsbuild::Worker;
use tsbuild_protocol::run_as_worker;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: tsbuild [@]<config.json> | tsbuild --persistent_worker");
        return ExitCode::FAILURE;
    }

    let mut worker = Worker::new();
    if run_as_worker(&args) {
        match worker.run_loop() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("worker protocol error: {}", e);
                ExitCode::FAILURE
            }
        }
    } else {
        match worker.run_single(&args) {
            0 => ExitCode::SUCCESS,
            _ => ExitCode::FAILURE,
        }
    }
}
