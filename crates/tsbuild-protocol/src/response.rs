//! Work response envelope.

use serde::{Deserialize, Serialize};

/// Result of one build request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkResponse {
    /// 0 on success, 1 on any failure (bad arguments, configuration
    /// error, or one or more diagnostics).
    pub exit_code: i32,
    /// Captured diagnostic and log text for this request.
    pub output: String,
}

impl WorkResponse {
    pub fn success(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self { exit_code: 1, output: output.into() }
    }

    pub fn ok(&self) -> bool {
        self.exit_code == 0
    }
}
