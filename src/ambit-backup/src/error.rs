//! Backup manager error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup id '{0}' is not well-formed (expected YYYYMMDD-HHMMSS-<16 hex chars>)")]
    InvalidId(String),

    #[error("backup '{0}' not found")]
    NotFound(String),

    #[error("file '{0}' is not tracked by backup '{1}'")]
    FileNotInBackup { path: PathBuf, backup_id: String },

    #[error("integrity check failed for '{path}': recorded sha256 {expected}, stored bytes hash to {actual}")]
    IntegrityMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("backup creation failed: {detail} (safety backup, if any, is '{partial_id:?}')")]
    CreateFailed {
        detail: String,
        partial_id: Option<String>,
    },

    #[error("restore failed: {detail}; current state was preserved in safety backup '{safety_backup_id}'")]
    RestoreFailed {
        detail: String,
        safety_backup_id: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    ReadIo(#[from] ambit_io::IoError),
}
