//! Work request envelope.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One build request to a persistent worker.
///
/// `arguments` carries the same argument vector a single-shot
/// invocation would receive (typically one path to a build
/// configuration file, possibly with a leading run of `@`).
/// `inputs` maps input file paths to content digests and lets the
/// worker prove cached file records fresh without re-reading disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkRequest {
    pub arguments: Vec<String>,
    /// Input path -> hex content digest. Empty for callers that cannot
    /// supply digests; the worker then falls back to uncached loading.
    #[serde(default)]
    pub inputs: HashMap<String, String>,
}

impl WorkRequest {
    pub fn new(arguments: Vec<String>) -> Self {
        Self { arguments, inputs: HashMap::new() }
    }

    pub fn with_inputs(mut self, inputs: HashMap<String, String>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Whether the caller supplied a freshness proof for its inputs.
    pub fn has_inputs(&self) -> bool {
        !self.inputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_default_to_empty() {
        let req: WorkRequest =
            serde_json::from_str(r#"{"arguments":["@cfg.json"]}"#).unwrap();
        assert_eq!(req.arguments, vec!["@cfg.json"]);
        assert!(!req.has_inputs());
    }

    #[test]
    fn round_trips_with_inputs() {
        let mut inputs = HashMap::new();
        inputs.insert("/root/a.ts".to_string(), "abc123".to_string());
        let req = WorkRequest::new(vec!["cfg.json".into()]).with_inputs(inputs);
        let json = serde_json::to_string(&req).unwrap();
        let back: WorkRequest = serde_json::from_str(&json).unwrap();
        assert!(back.has_inputs());
        assert_eq!(back.inputs["/root/a.ts"], "abc123");
    }
}
