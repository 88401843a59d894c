use thiserror::Error;

use crate::domain::rules::RuleViolation;

/// The unified error surface for every engine in the pipeline.
///
/// Engines never let a panic or an infrastructure error escape to a caller;
/// every failure path funnels through one of these variants so the CLI and
/// any future HTTP layer can render a human-readable reason without ever
/// exposing the underlying stack (see spec §7).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0:?}")]
    Validation(Vec<RuleViolation>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("failed to parse rule ingest payload: {0}")]
    RuleIngest(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Structured, non-raising result shape for operations the spec defines as
/// "returns a list of {severity, message}" rather than an exception.
///
/// `data` is `None` whenever `errors` is non-empty: a MANDATORY violation
/// always blocks the write, per §7.
#[derive(Debug, Clone)]
pub struct PipelineOutcome<T> {
    pub data: Option<T>,
    pub warnings: Vec<RuleViolation>,
    pub errors: Vec<RuleViolation>,
}

impl<T> PipelineOutcome<T> {
    pub fn ok(data: T) -> Self {
        Self { data: Some(data), warnings: Vec::new(), errors: Vec::new() }
    }

    pub fn ok_with_warnings(data: T, warnings: Vec<RuleViolation>) -> Self {
        Self { data: Some(data), warnings, errors: Vec::new() }
    }

    pub fn blocked(errors: Vec<RuleViolation>) -> Self {
        Self { data: None, warnings: Vec::new(), errors }
    }

    pub fn is_success(&self) -> bool {
        self.data.is_some() && self.errors.is_empty()
    }
}
