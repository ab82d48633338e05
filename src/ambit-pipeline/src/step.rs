//! The step vocabulary a pipeline executes, and the pipeline definition
//! itself: a named, ordered list of steps where a step may reference an
//! earlier step's result as its working set.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One `(old_text, new_text)` pair within a `multi_edit` step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPair {
    pub old_text: String,
    pub new_text: String,
}

/// The action a step performs. `path`/`from` are optional on actions that
/// can instead draw their targets from `input_from`'s working set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    Search {
        root: PathBuf,
        pattern: String,
        #[serde(default)]
        include_content: bool,
    },
    ReadRanges {
        #[serde(default)]
        path: Option<PathBuf>,
        start_line: usize,
        end_line: usize,
    },
    Edit {
        #[serde(default)]
        path: Option<PathBuf>,
        old_text: String,
        new_text: String,
        #[serde(default)]
        replace_all: bool,
    },
    MultiEdit {
        #[serde(default)]
        path: Option<PathBuf>,
        edits: Vec<EditPair>,
    },
    CountOccurrences {
        #[serde(default)]
        path: Option<PathBuf>,
        pattern: String,
        #[serde(default)]
        regex: bool,
    },
    RegexTransform {
        pattern: String,
        replacement: String,
    },
    Copy {
        #[serde(default)]
        from: Option<PathBuf>,
        to: PathBuf,
    },
    Rename {
        from: PathBuf,
        to: PathBuf,
    },
    Delete {
        #[serde(default)]
        path: Option<PathBuf>,
    },
}

impl StepAction {
    pub fn name(&self) -> &'static str {
        match self {
            StepAction::Search { .. } => "search",
            StepAction::ReadRanges { .. } => "read_ranges",
            StepAction::Edit { .. } => "edit",
            StepAction::MultiEdit { .. } => "multi_edit",
            StepAction::CountOccurrences { .. } => "count_occurrences",
            StepAction::RegexTransform { .. } => "regex_transform",
            StepAction::Copy { .. } => "copy",
            StepAction::Rename { .. } => "rename",
            StepAction::Delete { .. } => "delete",
        }
    }

    /// Whether this action mutates the filesystem (and so needs a backup
    /// and risk check before it runs).
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            StepAction::Edit { .. }
                | StepAction::MultiEdit { .. }
                | StepAction::RegexTransform { .. }
                | StepAction::Copy { .. }
                | StepAction::Rename { .. }
                | StepAction::Delete { .. }
        )
    }
}

/// One named step in a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStep {
    pub id: String,
    #[serde(flatten)]
    pub action: StepAction,
    #[serde(default)]
    pub input_from: Option<String>,
}

/// A named pipeline: an ordered list of steps plus execution flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    pub steps: Vec<PipelineStep>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_true")]
    pub stop_on_error: bool,
    #[serde(default)]
    pub force: bool,
}

fn default_true() -> bool {
    true
}

pub const MAX_STEPS: usize = 20;
pub const MAX_FILES_TOUCHED: usize = 100;
