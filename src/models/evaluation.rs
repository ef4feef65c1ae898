use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/go`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Code and commands, one command per line.
    pub code: String,
}

/// Outcome of one request: whether every line succeeded, and the
/// accumulated transcript.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationResult {
    pub status: bool,
    pub message: String,
}

impl EvaluationResult {
    pub fn new(status: bool, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}
