//! Persistent backup store: create, list, get, compare, and restore
//! content-hashed snapshots of files before a destructive edit touches them.

mod error;
mod manager;
mod sanitize;
mod types;

pub use error::BackupError;
pub use manager::{default_backup_root, BackupManager, DEFAULT_MAX_AGE_DAYS, DEFAULT_MAX_COUNT};
pub use sanitize::{generate_id, validate_id};
pub use types::{
    BackupEntry, BackupSummary, CleanupReport, CompareReport, FileBackupEntry, ListFilter,
    RestoreReport, RestoredFile,
};
