//! Edit Pipeline (C8): orchestrates the sandbox boundary, content cache,
//! risk assessment, safety validator, and backup manager into a single
//! `(path, old_text, new_text, force)` edit with an atomic write.
//!
//! Conceptually a six-state machine per edit:
//!
//! ```text
//! NORMALIZED -> LOADED -> RISK_CHECKED -> VALIDATED -> BACKED_UP -> WRITTEN
//! ```
//!
//! Any step can instead terminate at `FAILED(kind)`; there is no state in
//! which a partial write has happened.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use ambit_backup::BackupManager;
use ambit_cache::ContentCache;
use ambit_io::IoThresholds;
use ambit_risk::{ChangeImpact, RiskThresholds};
use ambit_sandbox::Boundary;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::locks;
use crate::replace::{self, MatchMode, ReplaceTier};
use crate::telemetry::{EditKind, EditTelemetry};
use crate::validator;

/// Above this size (in bytes), an edit is counted as a full rewrite rather
/// than a targeted edit, regardless of how much of the file it touched.
const FULL_REWRITE_BYTES: usize = 1024;

/// Outcome of a single successful edit.
#[derive(Debug, Clone, Serialize)]
pub struct EditOutcome {
    pub replacement_count: usize,
    pub lines_affected: usize,
    pub backup_id: String,
    pub match_confidence: f64,
}

/// Outcome of a single in-order edit within a `multi_edit` call.
#[derive(Debug, Clone, Serialize)]
pub struct MultiEditStepOutcome {
    pub old_text: String,
    pub replacement_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MultiEditOutcome {
    pub backup_id: String,
    pub steps: Vec<MultiEditStepOutcome>,
    pub total_replacements: usize,
}

fn confidence_for(tier: ReplaceTier) -> f64 {
    match tier {
        ReplaceTier::Raw => 1.0,
        ReplaceTier::LineEndingNormalized => 0.95,
        ReplaceTier::WhitespaceTolerant => 0.8,
    }
}

fn edit_kind(old_text: &str, new_text: &str) -> EditKind {
    let span = old_text.len().max(new_text.len());
    if span > FULL_REWRITE_BYTES {
        EditKind::FullRewrite
    } else {
        EditKind::Targeted
    }
}

fn map_replace_error(path: &Path, err: replace::ReplaceError) -> CoreError {
    match err {
        replace::ReplaceError::NotFound => {
            // Should not normally happen: the validator already confirmed a
            // match exists. Surfaced as EditMultipleMatches(0) would be
            // misleading, so report it through the same "not found" shape
            // the validator uses, with no further diagnostics available.
            CoreError::EditNotFound {
                path: path.to_path_buf(),
                diagnostics: validator::ValidationDiagnostics {
                    old_text_line_count: 0,
                    exact_matches: 0,
                    normalized_matches: 0,
                    file_line_ending_kind: crate::lineending::LineEnding::Lf,
                    error_detail: Some("old_text no longer present at replacement time".to_string()),
                },
                likely_cause: "file changed between validation and replacement".to_string(),
            }
        }
        replace::ReplaceError::MultipleMatches(occurrences) => CoreError::EditMultipleMatches {
            path: path.to_path_buf(),
            occurrences,
        },
        replace::ReplaceError::NthOutOfRange { requested, available } => {
            CoreError::EditOccurrenceOutOfRange {
                path: path.to_path_buf(),
                requested,
                available,
            }
        }
    }
}

/// Orchestrates a single edit end to end.
pub struct EditPipeline {
    boundary: Arc<Boundary>,
    content_cache: Arc<ContentCache>,
    io_thresholds: IoThresholds,
    risk_thresholds: RiskThresholds,
    backup_manager: Arc<BackupManager>,
    telemetry: Arc<EditTelemetry>,
}

impl EditPipeline {
    pub fn new(
        boundary: Arc<Boundary>,
        content_cache: Arc<ContentCache>,
        backup_manager: Arc<BackupManager>,
    ) -> Self {
        Self {
            boundary,
            content_cache,
            io_thresholds: IoThresholds::default(),
            risk_thresholds: RiskThresholds::default(),
            backup_manager,
            telemetry: Arc::new(EditTelemetry::new()),
        }
    }

    pub fn telemetry(&self) -> Arc<EditTelemetry> {
        Arc::clone(&self.telemetry)
    }

    pub fn with_risk_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.risk_thresholds = thresholds;
        self
    }

    pub fn with_io_thresholds(mut self, thresholds: IoThresholds) -> Self {
        self.io_thresholds = thresholds;
        self
    }

    /// Normalize and authorize `path`, then load its content -- the
    /// NORMALIZED and LOADED states shared by every operation below.
    async fn load(&self, path: &Path) -> Result<(PathBuf, String, SystemTime), CoreError> {
        let canonical = self.boundary.validate(path)?;

        let metadata = tokio::fs::metadata(&canonical)
            .await
            .map_err(|_| CoreError::NotFound(canonical.clone()))?;
        if metadata.is_dir() {
            return Err(CoreError::IsDirectory(canonical));
        }
        let mtime = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        if let Some(cached) = self.content_cache.get(&canonical, mtime) {
            let content = String::from_utf8(cached.to_vec()).map_err(|e| CoreError::Io {
                path: canonical.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            })?;
            return Ok((canonical, content, mtime));
        }

        let (bytes, _mode) = ambit_io::read_file(&canonical, &self.io_thresholds)
            .await
            .map_err(|e| CoreError::Io {
                path: canonical.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?;
        self.content_cache.put(canonical.clone(), Arc::from(bytes.as_slice()), mtime);
        let content = String::from_utf8(bytes).map_err(|e| CoreError::Io {
            path: canonical.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        Ok((canonical, content, mtime))
    }

    /// Dry-run: compute the `ChangeImpact` of replacing every occurrence of
    /// `old_text` with `new_text` in `path`, without touching the file.
    pub async fn analyze(
        &self,
        path: &Path,
        old_text: &str,
        new_text: &str,
    ) -> Result<ChangeImpact, CoreError> {
        let (_canonical, content, _mtime) = self.load(path).await?;
        Ok(ambit_risk::assess(&content, old_text, new_text, &self.risk_thresholds))
    }

    /// Perform a single `(old_text, new_text)` edit, honoring `replace_all`
    /// (replace every occurrence) vs. unique-match (exactly one occurrence
    /// required) semantics.
    pub async fn edit(
        &self,
        path: &Path,
        old_text: &str,
        new_text: &str,
        force: bool,
        replace_all: bool,
    ) -> Result<EditOutcome, CoreError> {
        let lock = locks::lock_for(path);
        let _guard = lock.lock().await;

        let (canonical, content, _mtime) = self.load(path).await?;

        let impact = ambit_risk::assess(&content, old_text, new_text, &self.risk_thresholds);
        if impact.is_risky && !force {
            return Err(CoreError::BlockedRisk {
                path: canonical,
                impact,
            });
        }

        let validation = validator::validate(&content, old_text);
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

        let backup = self
            .backup_manager
            .create(&[canonical.clone()], "edit", &impact.warning())
            .await
            .map_err(|e| CoreError::BackupFailed {
                paths: vec![canonical.clone()],
                detail: e.to_string(),
            })?;

        let mode = if replace_all { MatchMode::All } else { MatchMode::Unique };
        let outcome = replace::apply(&content, old_text, new_text, mode)
            .map_err(|e| map_replace_error(&canonical, e))?;

        ambit_io::atomic_write(&canonical, outcome.content.as_bytes())
            .await
            .map_err(|e| CoreError::Io {
                path: canonical.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?;
        self.content_cache.invalidate(&canonical);

        self.telemetry
            .record(edit_kind(old_text, new_text), outcome.content.len() as u64);

        let lines_affected = outcome.replacement_count * old_text.lines().count().max(1);
        info!(path = %canonical.display(), replacements = outcome.replacement_count, backup_id = %backup.backup_id, "edit applied");

        Ok(EditOutcome {
            replacement_count: outcome.replacement_count,
            lines_affected,
            backup_id: backup.backup_id,
            match_confidence: confidence_for(outcome.tier),
        })
    }

    /// `replace_nth_occurrence`: replace exactly the `occurrence`-th match
    /// of `pattern` (`1..N` counts from the start, `-1` is the last match,
    /// `-2` the second-to-last, and so on).
    pub async fn replace_nth_occurrence(
        &self,
        path: &Path,
        pattern: &str,
        new_text: &str,
        occurrence: i64,
        force: bool,
    ) -> Result<EditOutcome, CoreError> {
        let lock = locks::lock_for(path);
        let _guard = lock.lock().await;

        let (canonical, content, _mtime) = self.load(path).await?;

        let impact = ambit_risk::assess(&content, pattern, new_text, &self.risk_thresholds);
        if impact.is_risky && !force {
            return Err(CoreError::BlockedRisk {
                path: canonical,
                impact,
            });
        }

        let validation = validator::validate(&content, pattern);
        if !validation.can_proceed {
            return Err(CoreError::EditNotFound {
                path: canonical,
                likely_cause: validation
                    .diagnostics
                    .error_detail
                    .clone()
                    .unwrap_or_else(|| "pattern not found".to_string()),
                diagnostics: validation.diagnostics,
            });
        }

        let backup = self
            .backup_manager
            .create(&[canonical.clone()], "replace_nth_occurrence", &impact.warning())
            .await
            .map_err(|e| CoreError::BackupFailed {
                paths: vec![canonical.clone()],
                detail: e.to_string(),
            })?;

        let outcome = replace::apply(&content, pattern, new_text, MatchMode::Nth(occurrence))
            .map_err(|e| map_replace_error(&canonical, e))?;

        ambit_io::atomic_write(&canonical, outcome.content.as_bytes())
            .await
            .map_err(|e| CoreError::Io {
                path: canonical.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?;
        self.content_cache.invalidate(&canonical);
        self.telemetry
            .record(edit_kind(pattern, new_text), outcome.content.len() as u64);

        Ok(EditOutcome {
            replacement_count: outcome.replacement_count,
            lines_affected: pattern.lines().count().max(1),
            backup_id: backup.backup_id,
            match_confidence: confidence_for(outcome.tier),
        })
    }

    /// Apply an ordered list of `(old_text, new_text)` edits to one file:
    /// loads once, applies every edit in memory, writes once, and creates
    /// a single backup. Stops at the first edit that cannot be applied and
    /// restores the pre-edit in-memory snapshot -- the file on disk is left
    /// untouched and the backup already created on disk is not rolled back.
    pub async fn multi_edit(
        &self,
        path: &Path,
        edits: &[(String, String)],
        force: bool,
    ) -> Result<MultiEditOutcome, CoreError> {
        let lock = locks::lock_for(path);
        let _guard = lock.lock().await;

        let (canonical, original_content, _mtime) = self.load(path).await?;

        let mut aggregate_occurrences = 0usize;
        let mut worst_change_percent = 0.0f64;
        for (old_text, new_text) in edits {
            let impact = ambit_risk::assess(&original_content, old_text, new_text, &self.risk_thresholds);
            aggregate_occurrences += impact.occurrences;
            worst_change_percent = worst_change_percent.max(impact.change_percentage);
        }
        let aggregate_risky = worst_change_percent >= self.risk_thresholds.high_change_percent
            || aggregate_occurrences >= self.risk_thresholds.high_occurrences;
        if aggregate_risky && !force {
            let impact = ChangeImpact {
                total_lines: original_content.lines().count(),
                occurrences: aggregate_occurrences,
                change_percentage: worst_change_percent,
                chars_changed: 0,
                risk_level: ambit_risk::RiskLevel::High,
                is_risky: true,
                factors: vec![format!(
                    "aggregate across {} edit(s): {} occurrence(s), {:.1}% max change",
                    edits.len(),
                    aggregate_occurrences,
                    worst_change_percent
                )],
            };
            return Err(CoreError::BlockedRisk {
                path: canonical,
                impact,
            });
        }

        let backup = self
            .backup_manager
            .create(&[canonical.clone()], "multi_edit", &format!("{} edit(s)", edits.len()))
            .await
            .map_err(|e| CoreError::BackupFailed {
                paths: vec![canonical.clone()],
                detail: e.to_string(),
            })?;

        let mut working = original_content.clone();
        let mut steps = Vec::with_capacity(edits.len());
        let mut total_replacements = 0usize;

        for (old_text, new_text) in edits {
            let validation = validator::validate(&working, old_text);
            if !validation.can_proceed {
                debug!(path = %canonical.display(), "multi_edit stopped: old_text not found, restoring in-memory snapshot");
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

            let outcome = match replace::apply(&working, old_text, new_text, MatchMode::Unique) {
                Ok(o) => o,
                Err(e) => return Err(map_replace_error(&canonical, e)),
            };
            working = outcome.content;
            total_replacements += outcome.replacement_count;
            steps.push(MultiEditStepOutcome {
                old_text: old_text.clone(),
                replacement_count: outcome.replacement_count,
            });
        }

        ambit_io::atomic_write(&canonical, working.as_bytes())
            .await
            .map_err(|e| CoreError::Io {
                path: canonical.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?;
        self.content_cache.invalidate(&canonical);
        self.telemetry.record(EditKind::Targeted, working.len() as u64);

        Ok(MultiEditOutcome {
            backup_id: backup.backup_id,
            steps,
            total_replacements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline_for(root: &Path) -> EditPipeline {
        let boundary = Arc::new(Boundary::new(vec![root.to_path_buf()]).unwrap());
        let cache = Arc::new(ContentCache::default());
        let backups = Arc::new(BackupManager::with_defaults(root.join(".backups")));
        EditPipeline::new(boundary, cache, backups)
    }

    #[tokio::test]
    async fn edit_replaces_unique_occurrence_and_creates_backup() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "let x = 1;\n").await.unwrap();

        let pipeline = pipeline_for(tmp.path());
        let outcome = pipeline.edit(&file, "x", "y", false, false).await.unwrap();
        assert_eq!(outcome.replacement_count, 1);
        assert!(!outcome.backup_id.is_empty());
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "let y = 1;\n");
    }

    #[tokio::test]
    async fn edit_rejects_ambiguous_match_without_replace_all() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "a a a\n").await.unwrap();

        let pipeline = pipeline_for(tmp.path());
        let err = pipeline.edit(&file, "a", "b", false, false).await.unwrap_err();
        assert!(matches!(err, CoreError::EditMultipleMatches { occurrences: 3, .. }));
    }

    #[tokio::test]
    async fn edit_not_found_carries_diagnostics() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "hello\n").await.unwrap();

        let pipeline = pipeline_for(tmp.path());
        let err = pipeline.edit(&file, "absent", "x", false, false).await.unwrap_err();
        assert!(matches!(err, CoreError::EditNotFound { .. }));
    }

    #[tokio::test]
    async fn multi_edit_applies_in_order_and_writes_once() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "foo bar\n").await.unwrap();

        let pipeline = pipeline_for(tmp.path());
        let edits = vec![
            ("foo".to_string(), "FOO".to_string()),
            ("bar".to_string(), "BAR".to_string()),
        ];
        let outcome = pipeline.multi_edit(&file, &edits, false).await.unwrap();
        assert_eq!(outcome.total_replacements, 2);
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "FOO BAR\n");
    }

    #[tokio::test]
    async fn multi_edit_stops_on_missing_pattern_and_leaves_file_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "foo bar\n").await.unwrap();

        let pipeline = pipeline_for(tmp.path());
        let edits = vec![
            ("foo".to_string(), "FOO".to_string()),
            ("nonexistent".to_string(), "X".to_string()),
        ];
        let err = pipeline.multi_edit(&file, &edits, false).await.unwrap_err();
        assert!(matches!(err, CoreError::EditNotFound { .. }));
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "foo bar\n");
    }

    #[tokio::test]
    async fn analyze_does_not_mutate_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "hello world\n").await.unwrap();

        let pipeline = pipeline_for(tmp.path());
        let impact = pipeline.analyze(&file, "hello", "goodbye").await.unwrap();
        assert_eq!(impact.occurrences, 1);
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "hello world\n");
    }

    #[tokio::test]
    async fn replace_nth_occurrence_picks_the_requested_index() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "a a a\n").await.unwrap();

        let pipeline = pipeline_for(tmp.path());
        let outcome = pipeline
            .replace_nth_occurrence(&file, "a", "Z", -1, false)
            .await
            .unwrap();
        assert_eq!(outcome.replacement_count, 1);
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "a a Z\n");
    }
}
