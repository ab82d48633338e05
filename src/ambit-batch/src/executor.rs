//! Batch Executor (C10): validates a list of operations up front, snapshots
//! the files they touch, then executes them in order -- atomically rolling
//! back to the snapshot on the first failure, or continuing and reporting
//! per-op status when `atomic` is disabled.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ambit_backup::BackupManager;
use ambit_cache::ContentCache;
use ambit_edit::{CoreError, MatchMode, ReplaceError};
use ambit_risk::{ChangeImpact, RiskLevel, RiskThresholds};
use ambit_sandbox::Boundary;
use tracing::{info, warn};

use crate::op::{BatchFlags, BatchOp};
use crate::report::{BatchReport, OpOutcome, OpValidation, ValidationReport};

fn io_error(path: &Path, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn wrapped_io_error(path: &Path, source: ambit_io::IoError) -> CoreError {
    io_error(path, std::io::Error::other(source))
}

fn map_replace_error(path: &Path, err: ReplaceError) -> CoreError {
    match err {
        ReplaceError::NotFound => CoreError::EditNotFound {
            path: path.to_path_buf(),
            diagnostics: ambit_edit::ValidationDiagnostics {
                old_text_line_count: 0,
                exact_matches: 0,
                normalized_matches: 0,
                file_line_ending_kind: ambit_edit::LineEnding::Lf,
                error_detail: Some("old_text no longer present at execution time".to_string()),
            },
            likely_cause: "file changed earlier in this batch".to_string(),
        },
        ReplaceError::MultipleMatches(occurrences) => CoreError::EditMultipleMatches {
            path: path.to_path_buf(),
            occurrences,
        },
        ReplaceError::NthOutOfRange { requested, available } => CoreError::EditOccurrenceOutOfRange {
            path: path.to_path_buf(),
            requested,
            available,
        },
    }
}

pub struct BatchExecutor {
    boundary: Arc<Boundary>,
    content_cache: Arc<ContentCache>,
    backup_manager: Arc<BackupManager>,
    risk_thresholds: RiskThresholds,
}

impl BatchExecutor {
    pub fn new(
        boundary: Arc<Boundary>,
        content_cache: Arc<ContentCache>,
        backup_manager: Arc<BackupManager>,
    ) -> Self {
        Self {
            boundary,
            content_cache,
            backup_manager,
            risk_thresholds: RiskThresholds::default(),
        }
    }

    pub fn with_risk_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.risk_thresholds = thresholds;
        self
    }

    async fn read_text(&self, path: &Path) -> Result<String, CoreError> {
        let (bytes, _mode) = ambit_io::read_file(path, &ambit_io::IoThresholds::default())
            .await
            .map_err(|e| wrapped_io_error(path, e))?;
        String::from_utf8(bytes).map_err(|e| io_error(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    /// Validation pass: authorize and check the precondition of every op,
    /// aggregating risk across `edit` ops.
    pub async fn validate(&self, ops: &[BatchOp]) -> Result<ValidationReport, CoreError> {
        let mut op_reports = Vec::with_capacity(ops.len());
        let mut aggregate_occurrences = 0usize;
        let mut aggregate_change_percent = 0.0f64;
        let mut impact_summary: Option<ChangeImpact> = None;

        for (index, op) in ops.iter().enumerate() {
            let description = op.description();
            match self.validate_one(op).await {
                Ok(Some(impact)) => {
                    aggregate_occurrences += impact.occurrences;
                    aggregate_change_percent = aggregate_change_percent.max(impact.change_percentage);
                    impact_summary = Some(match impact_summary.take() {
                        Some(prev) if prev.change_percentage >= impact.change_percentage => prev,
                        _ => impact,
                    });
                    op_reports.push(OpValidation { index, description, ok: true, error: None });
                }
                Ok(None) => op_reports.push(OpValidation { index, description, ok: true, error: None }),
                Err(e) => op_reports.push(OpValidation {
                    index,
                    description,
                    ok: false,
                    error: Some(e.to_string()),
                }),
            }
        }

        let would_block = aggregate_change_percent >= self.risk_thresholds.high_change_percent
            || aggregate_occurrences >= self.risk_thresholds.high_occurrences;

        Ok(ValidationReport {
            ops: op_reports,
            aggregate_occurrences,
            aggregate_change_percent,
            would_block,
            impact_summary,
        })
    }

    async fn validate_one(&self, op: &BatchOp) -> Result<Option<ChangeImpact>, CoreError> {
        match op {
            BatchOp::Write { path, .. } => {
                self.boundary.validate(path)?;
                Ok(None)
            }
            BatchOp::Edit { path, old_text, new_text, .. } => {
                let canonical = self.boundary.validate(path)?;
                let content = self.read_text(&canonical).await?;
                let impact = ambit_risk::assess(&content, old_text, new_text, &self.risk_thresholds);
                let validation = ambit_edit::validate(&content, old_text);
                if !validation.can_proceed {
                    return Err(CoreError::EditNotFound {
                        path: canonical,
                        likely_cause: validation
                            .diagnostics
                            .error_detail
                            .clone()
                            .unwrap_or_else(|| "old_text not found".to_string()),
                        diagnostics: validation.diagnostics,
                    });
                }
                Ok(Some(impact))
            }
            BatchOp::Move { from, to, .. } | BatchOp::Copy { from, to, .. } => {
                let canonical_from = self.boundary.validate(from)?;
                self.boundary.validate(to)?;
                if tokio::fs::try_exists(&canonical_from).await.unwrap_or(false) {
                    Ok(None)
                } else {
                    Err(CoreError::NotFound(canonical_from))
                }
            }
            BatchOp::Delete { path, .. } => {
                let canonical = self.boundary.validate(path)?;
                if tokio::fs::try_exists(&canonical).await.unwrap_or(false) {
                    Ok(None)
                } else {
                    Err(CoreError::NotFound(canonical))
                }
            }
            BatchOp::CreateDir { path } => {
                self.boundary.validate(path)?;
                Ok(None)
            }
        }
    }

    /// Every path, canonicalized, that already exists on disk before the
    /// batch runs and that an op will read from or potentially overwrite.
    async fn touched_existing_paths(&self, ops: &[BatchOp]) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for op in ops {
            let candidates: Vec<&PathBuf> = match op {
                BatchOp::Write { path, .. } => vec![path],
                BatchOp::Edit { path, .. } => vec![path],
                BatchOp::Move { from, to, overwrite } | BatchOp::Copy { from, to, overwrite } => {
                    if *overwrite {
                        vec![from, to]
                    } else {
                        vec![from]
                    }
                }
                BatchOp::Delete { path, .. } => vec![path],
                BatchOp::CreateDir { .. } => vec![],
            };
            for candidate in candidates {
                let Ok(canonical) = self.boundary.validate(candidate) else {
                    continue;
                };
                if !seen.insert(canonical.clone()) {
                    continue;
                }
                if tokio::fs::try_exists(&canonical).await.unwrap_or(false) {
                    out.push(canonical);
                } else {
                    seen.remove(&canonical);
                }
            }
        }
        out
    }

    async fn remove_created(&self, created_paths: &[PathBuf]) {
        for path in created_paths {
            let is_dir = tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false);
            let result = if is_dir {
                tokio::fs::remove_dir_all(path).await
            } else {
                tokio::fs::remove_file(path).await
            };
            if let Err(e) = result {
                warn!(path = %path.display(), error = %e, "failed to remove path created during rolled-back batch");
            }
            self.content_cache.invalidate(path);
        }
    }

    async fn apply_op(
        &self,
        op: &BatchOp,
        pre_existing: &[PathBuf],
        created_paths: &mut Vec<PathBuf>,
    ) -> Result<(), CoreError> {
        match op {
            BatchOp::Write { path, content } => {
                let canonical = self.boundary.validate(path)?;
                let existed_before = pre_existing.contains(&canonical);
                ambit_io::atomic_write(&canonical, content.as_bytes())
                    .await
                    .map_err(|e| wrapped_io_error(&canonical, e))?;
                self.content_cache.invalidate(&canonical);
                if !existed_before {
                    created_paths.push(canonical);
                }
                Ok(())
            }
            BatchOp::Edit { path, old_text, new_text, replace_all } => {
                let canonical = self.boundary.validate(path)?;
                let content = self.read_text(&canonical).await?;
                let mode = if *replace_all { MatchMode::All } else { MatchMode::Unique };
                let outcome = ambit_edit::apply_replacement(&content, old_text, new_text, mode)
                    .map_err(|e| map_replace_error(&canonical, e))?;
                ambit_io::atomic_write(&canonical, outcome.content.as_bytes())
                    .await
                    .map_err(|e| wrapped_io_error(&canonical, e))?;
                self.content_cache.invalidate(&canonical);
                Ok(())
            }
            BatchOp::Move { from, to, overwrite } => {
                let canonical_from = self.boundary.validate(from)?;
                let canonical_to = self.boundary.validate(to)?;
                if !overwrite && tokio::fs::try_exists(&canonical_to).await.unwrap_or(false) {
                    return Err(CoreError::PathInvalid(format!(
                        "destination already exists: {}",
                        canonical_to.display()
                    )));
                }
                let existed_before = pre_existing.contains(&canonical_to);
                if let Some(parent) = canonical_to.parent() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| io_error(&canonical_to, e))?;
                }
                tokio::fs::rename(&canonical_from, &canonical_to)
                    .await
                    .map_err(|e| io_error(&canonical_from, e))?;
                self.content_cache.invalidate(&canonical_from);
                self.content_cache.invalidate(&canonical_to);
                if !existed_before {
                    created_paths.push(canonical_to);
                }
                Ok(())
            }
            BatchOp::Copy { from, to, overwrite } => {
                let canonical_from = self.boundary.validate(from)?;
                let canonical_to = self.boundary.validate(to)?;
                if !overwrite && tokio::fs::try_exists(&canonical_to).await.unwrap_or(false) {
                    return Err(CoreError::PathInvalid(format!(
                        "destination already exists: {}",
                        canonical_to.display()
                    )));
                }
                let existed_before = pre_existing.contains(&canonical_to);
                ambit_io::copy_file(&canonical_from, &canonical_to)
                    .await
                    .map_err(|e| wrapped_io_error(&canonical_to, e))?;
                self.content_cache.invalidate(&canonical_to);
                if !existed_before {
                    created_paths.push(canonical_to);
                }
                Ok(())
            }
            BatchOp::Delete { path, recursive } => {
                let canonical = self.boundary.validate(path)?;
                let metadata = tokio::fs::metadata(&canonical)
                    .await
                    .map_err(|_| CoreError::NotFound(canonical.clone()))?;
                if metadata.is_dir() {
                    if *recursive {
                        tokio::fs::remove_dir_all(&canonical).await.map_err(|e| io_error(&canonical, e))?;
                    } else {
                        tokio::fs::remove_dir(&canonical).await.map_err(|e| io_error(&canonical, e))?;
                    }
                } else {
                    tokio::fs::remove_file(&canonical).await.map_err(|e| io_error(&canonical, e))?;
                }
                self.content_cache.invalidate(&canonical);
                Ok(())
            }
            BatchOp::CreateDir { path } => {
                let canonical = self.boundary.validate(path)?;
                let existed_before = tokio::fs::try_exists(&canonical).await.unwrap_or(false);
                tokio::fs::create_dir_all(&canonical).await.map_err(|e| io_error(&canonical, e))?;
                if !existed_before {
                    created_paths.push(canonical);
                }
                Ok(())
            }
        }
    }

    /// Run `ops` under `flags`. Returns `Ok` with a full report for
    /// `validate_only` runs, successful executions, and non-atomic runs
    /// with partial failures; returns `Err` for a failed validation pass,
    /// a blocked aggregate risk, or an atomic run that rolled back.
    pub async fn execute(&self, ops: &[BatchOp], flags: BatchFlags) -> Result<BatchReport, CoreError> {
        let validation = self.validate(ops).await?;

        if flags.validate_only {
            return Ok(BatchReport::validation_only(validation));
        }

        if !validation.all_ok() {
            let first_bad = validation.ops.iter().find(|o| !o.ok).expect("all_ok is false");
            return Err(CoreError::BatchFailed {
                failed_step: first_bad.index,
                op: first_bad.description.clone(),
                detail: first_bad.error.clone().unwrap_or_default(),
                rolled_back: false,
            });
        }

        if validation.would_block && !flags.force {
            let impact = validation.impact_summary.clone().unwrap_or(ChangeImpact {
                total_lines: 0,
                occurrences: validation.aggregate_occurrences,
                change_percentage: validation.aggregate_change_percent,
                chars_changed: 0,
                risk_level: RiskLevel::High,
                is_risky: true,
                factors: vec![format!(
                    "aggregate across {} op(s): {} occurrence(s), {:.1}% max change",
                    ops.len(),
                    validation.aggregate_occurrences,
                    validation.aggregate_change_percent
                )],
            });
            return Err(CoreError::BatchBlockedRisk { impact });
        }

        let pre_existing = self.touched_existing_paths(ops).await;

        let backup_id = if flags.create_backup && !pre_existing.is_empty() {
            let entry = self
                .backup_manager
                .create(&pre_existing, "batch", &format!("{} op(s)", ops.len()))
                .await
                .map_err(|e| CoreError::BackupFailed {
                    paths: pre_existing.clone(),
                    detail: e.to_string(),
                })?;
            Some(entry.backup_id)
        } else {
            None
        };

        let mut results = Vec::with_capacity(ops.len());
        let mut created_paths: Vec<PathBuf> = Vec::new();
        let mut failed_index: Option<usize> = None;

        for (index, op) in ops.iter().enumerate() {
            let description = op.description();
            match self.apply_op(op, &pre_existing, &mut created_paths).await {
                Ok(()) => results.push(OpOutcome { index, description, success: true, error: None }),
                Err(e) => {
                    results.push(OpOutcome {
                        index,
                        description,
                        success: false,
                        error: Some(e.to_string()),
                    });
                    failed_index = Some(index);
                    if flags.atomic {
                        break;
                    }
                }
            }
        }

        if let (Some(index), true) = (failed_index, flags.atomic) {
            if let Some(id) = &backup_id {
                if let Err(e) = self.backup_manager.restore(id, None, false).await {
                    warn!(error = %e, "rollback restore failed");
                }
            }
            self.remove_created(&created_paths).await;

            let failed = &results[index];
            return Err(CoreError::BatchFailed {
                failed_step: index,
                op: failed.description.clone(),
                detail: failed.error.clone().unwrap_or_default(),
                rolled_back: true,
            });
        }

        let failed_count = results.iter().filter(|r| !r.success).count();
        let successful = results.len() - failed_count;
        info!(total = results.len(), successful, failed = failed_count, "batch complete");

        Ok(BatchReport {
            validation,
            total: results.len(),
            successful,
            failed: failed_count,
            results,
            backup_id,
            rolled_back: false,
            executed: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor_for(root: &Path) -> BatchExecutor {
        let boundary = Arc::new(Boundary::new(vec![root.to_path_buf()]).unwrap());
        let cache = Arc::new(ContentCache::default());
        let backups = Arc::new(BackupManager::with_defaults(root.join(".backups")));
        BatchExecutor::new(boundary, cache, backups)
    }

    #[tokio::test]
    async fn executes_write_then_edit_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        let executor = executor_for(tmp.path());

        let ops = vec![
            BatchOp::Write { path: file.clone(), content: "hello world".to_string() },
            BatchOp::Edit {
                path: file.clone(),
                old_text: "world".to_string(),
                new_text: "rust".to_string(),
                replace_all: false,
            },
        ];

        let report = executor.execute(&ops, BatchFlags::default()).await.unwrap();
        assert!(report.is_success());
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "hello rust");
    }

    #[tokio::test]
    async fn atomic_failure_rolls_back_to_pre_batch_state() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "original").await.unwrap();
        let executor = executor_for(tmp.path());

        let ops = vec![
            BatchOp::Write { path: file.clone(), content: "mutated".to_string() },
            BatchOp::Edit {
                path: file.clone(),
                old_text: "nonexistent".to_string(),
                new_text: "x".to_string(),
                replace_all: false,
            },
        ];

        let err = executor.execute(&ops, BatchFlags::default()).await.unwrap_err();
        assert!(matches!(err, CoreError::BatchFailed { rolled_back: true, .. }));
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "original");
    }

    #[tokio::test]
    async fn non_atomic_continues_and_reports_per_op_status() {
        let tmp = tempfile::tempdir().unwrap();
        let file_a = tmp.path().join("a.txt");
        let file_b = tmp.path().join("b.txt");
        tokio::fs::write(&file_a, "a").await.unwrap();
        let executor = executor_for(tmp.path());

        let flags = BatchFlags { atomic: false, ..BatchFlags::default() };
        let ops = vec![
            BatchOp::Delete { path: tmp.path().join("missing.txt"), recursive: false },
            BatchOp::Write { path: file_b.clone(), content: "b".to_string() },
        ];

        let err = executor.execute(&ops, flags).await.unwrap_err();
        // "missing.txt" fails the precondition check during validation, so
        // the whole batch is refused before any op runs.
        assert!(matches!(err, CoreError::BatchFailed { rolled_back: false, .. }));
        assert!(!file_b.exists());
    }

    #[tokio::test]
    async fn validate_only_reports_without_mutating() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        let executor = executor_for(tmp.path());

        let flags = BatchFlags { validate_only: true, ..BatchFlags::default() };
        let ops = vec![BatchOp::Write { path: file.clone(), content: "hi".to_string() }];
        let report = executor.execute(&ops, flags).await.unwrap();
        assert!(!report.executed);
        assert!(!file.exists());
    }
}
