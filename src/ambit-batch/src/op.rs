//! The operation vocabulary a batch executes: `write`, `edit`, `move`,
//! `copy`, `delete`, `create_dir`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchOp {
    Write {
        path: PathBuf,
        content: String,
    },
    Edit {
        path: PathBuf,
        old_text: String,
        new_text: String,
        #[serde(default)]
        replace_all: bool,
    },
    Move {
        from: PathBuf,
        to: PathBuf,
        #[serde(default)]
        overwrite: bool,
    },
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[serde(default)]
        overwrite: bool,
    },
    Delete {
        path: PathBuf,
        #[serde(default)]
        recursive: bool,
    },
    CreateDir {
        path: PathBuf,
    },
}

impl BatchOp {
    pub fn description(&self) -> String {
        match self {
            BatchOp::Write { path, .. } => format!("write {}", path.display()),
            BatchOp::Edit { path, .. } => format!("edit {}", path.display()),
            BatchOp::Move { from, to, .. } => format!("move {} -> {}", from.display(), to.display()),
            BatchOp::Copy { from, to, .. } => format!("copy {} -> {}", from.display(), to.display()),
            BatchOp::Delete { path, .. } => format!("delete {}", path.display()),
            BatchOp::CreateDir { path } => format!("create_dir {}", path.display()),
        }
    }

    /// Every path this op reads from or authorizes against the sandbox.
    pub fn source_paths(&self) -> Vec<&PathBuf> {
        match self {
            BatchOp::Write { path, .. } => vec![path],
            BatchOp::Edit { path, .. } => vec![path],
            BatchOp::Move { from, to, .. } => vec![from, to],
            BatchOp::Copy { from, to, .. } => vec![from, to],
            BatchOp::Delete { path, .. } => vec![path],
            BatchOp::CreateDir { path } => vec![path],
        }
    }
}

/// Flags controlling how a batch is validated and executed.
#[derive(Debug, Clone, Copy)]
pub struct BatchFlags {
    pub atomic: bool,
    pub create_backup: bool,
    pub validate_only: bool,
    pub force: bool,
}

impl Default for BatchFlags {
    fn default() -> Self {
        Self {
            atomic: true,
            create_backup: true,
            validate_only: false,
            force: false,
        }
    }
}
