//! Per-step and whole-pipeline result types.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

/// The result of one step: which fields are populated depends on the
/// action (`files_matched` for `search`, `counts` for `count_occurrences`,
/// `edits_applied` for `edit`/`multi_edit`/`regex_transform`, `content` for
/// `read_ranges`).
#[derive(Debug, Clone, Serialize, Default)]
pub struct StepResult {
    pub id: String,
    pub success: bool,
    pub files_matched: Vec<PathBuf>,
    pub counts: HashMap<PathBuf, usize>,
    pub edits_applied: HashMap<PathBuf, usize>,
    pub content: Option<String>,
    pub error: Option<String>,
}

impl StepResult {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Every file this step's result names, used to grow the pipeline's
    /// running "files touched" total.
    pub fn touched_files(&self) -> Vec<PathBuf> {
        let mut out = self.files_matched.clone();
        out.extend(self.counts.keys().cloned());
        out.extend(self.edits_applied.keys().cloned());
        out.sort();
        out.dedup();
        out
    }
}

/// The full report of running a pipeline to completion (or to its first
/// `stop_on_error` failure).
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub name: String,
    pub steps: Vec<StepResult>,
    pub failed_step: Option<String>,
    pub rolled_back: bool,
    pub backup_ids: Vec<String>,
    pub dry_run: bool,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.failed_step.is_none()
    }
}
