//! The `ERR_*` taxonomy every caller-facing tool ultimately surfaces
//! through. Each variant carries the structured payload spec.md describes
//! so an error message can state what was requested, which rule failed,
//! and a remediation hint -- never just "not found".

use std::path::PathBuf;

use ambit_risk::ChangeImpact;
use thiserror::Error;

use crate::validator::ValidationDiagnostics;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("'{0}' is not a valid path")]
    PathInvalid(String),

    #[error("'{path}' is outside the allowed sandbox: {detail}")]
    PathOutsideSandbox { path: String, detail: String },

    #[error("'{0}' does not exist")]
    NotFound(PathBuf),

    #[error("'{0}' is a directory, not a file")]
    IsDirectory(PathBuf),

    #[error("io error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "could not locate the text to replace in '{path}' under any tolerated normalization \
         ({} line(s) of old_text; likely cause: {likely_cause})",
        diagnostics.old_text_line_count
    )]
    EditNotFound {
        path: PathBuf,
        diagnostics: ValidationDiagnostics,
        likely_cause: String,
    },

    #[error(
        "'{path}' contains {occurrences} occurrences of the requested text but a unique match \
         was required; re-issue with replace_all or a disambiguating occurrence index"
    )]
    EditMultipleMatches { path: PathBuf, occurrences: usize },

    #[error(
        "occurrence index {requested} requested for '{path}' but only {available} occurrence(s) \
         are present"
    )]
    EditOccurrenceOutOfRange {
        path: PathBuf,
        requested: i64,
        available: usize,
    },

    #[error(
        "edit to '{path}' blocked: {} -- rerun analyze_edit for detail or re-issue with force: true",
        impact.warning()
    )]
    BlockedRisk { path: PathBuf, impact: ChangeImpact },

    #[error(
        "batch blocked: aggregate impact across its edit ops is {} -- re-issue with force: true",
        impact.warning()
    )]
    BatchBlockedRisk { impact: ChangeImpact },

    #[error("backup of '{}' could not be created: {detail}", paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    BackupFailed { paths: Vec<PathBuf>, detail: String },

    #[error("batch operation aborted at step {failed_step} ({op}): {detail}{}", if *rolled_back { " (rolled back)" } else { "" })]
    BatchFailed {
        failed_step: usize,
        op: String,
        detail: String,
        rolled_back: bool,
    },

    #[error("pipeline definition invalid: {0}")]
    PipelineInvalid(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl From<ambit_sandbox::SandboxError> for CoreError {
    fn from(e: ambit_sandbox::SandboxError) -> Self {
        match e {
            ambit_sandbox::SandboxError::InvalidPath(p) => CoreError::PathInvalid(p),
            ambit_sandbox::SandboxError::OutsideSandbox { path, detail } => {
                CoreError::PathOutsideSandbox { path, detail }
            }
            ambit_sandbox::SandboxError::InvalidRoot(p) => {
                CoreError::PathInvalid(p.display().to_string())
            }
        }
    }
}
