//! Pipeline Executor (C11): runs a validated [`Pipeline`]'s steps in
//! order, letting later steps draw their working set from an earlier
//! step's result, aggregating risk before any destructive step, and
//! rolling back from backup snapshots when `stop_on_error` halts the run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ambit_backup::BackupManager;
use ambit_cache::{ContentCache, RegexCache};
use ambit_edit::{CoreError, EditPipeline};
use ambit_risk::{ChangeImpact, RiskLevel, RiskThresholds};
use ambit_sandbox::Boundary;
use ambit_search::{Cancellation, ContentSearchOptions, SearchConfig};
use tracing::{info, warn};

use crate::result::{PipelineReport, StepResult};
use crate::step::{Pipeline, StepAction, MAX_FILES_TOUCHED};
use crate::validate;

fn io_error(path: &Path, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn wrap_io_error(path: &Path, source: ambit_io::IoError) -> CoreError {
    io_error(path, std::io::Error::new(std::io::ErrorKind::Other, source))
}

async fn read_text(path: &Path) -> Result<String, CoreError> {
    let (bytes, _mode) = ambit_io::read_file(path, &ambit_io::IoThresholds::default())
        .await
        .map_err(|e| wrap_io_error(path, e))?;
    String::from_utf8(bytes)
        .map_err(|e| io_error(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Approximate [`ChangeImpact`] of a regex substitution, since
/// [`ambit_risk::assess`] is keyed on a literal `old`/`new` pair rather
/// than a pattern; this reimplements the same percent/occurrence formula
/// over the regex's own match spans.
fn assess_regex(content: &str, regex: &regex::Regex, replacement: &str, thresholds: &RiskThresholds) -> ChangeImpact {
    let matches: Vec<_> = regex.find_iter(content).collect();
    let occurrences = matches.len();
    let chars_changed: u64 = matches
        .iter()
        .map(|m| (replacement.len() as i64 - m.len() as i64).unsigned_abs())
        .sum();

    let file_len = content.len().max(1) as f64;
    let change_percentage = (chars_changed as f64 / file_len) * 100.0;

    let mut factors = Vec::new();
    let mut level = RiskLevel::Low;
    if change_percentage >= thresholds.critical_change_percent {
        level = RiskLevel::Critical;
        factors.push(format!("regex change affects {change_percentage:.1}% of the file"));
    } else if change_percentage >= thresholds.high_change_percent || occurrences >= thresholds.high_occurrences {
        level = RiskLevel::High;
        factors.push(format!(
            "regex change affects {change_percentage:.1}% of the file across {occurrences} match(es)"
        ));
    } else if change_percentage >= thresholds.medium_change_percent || occurrences >= thresholds.medium_occurrences {
        level = RiskLevel::Medium;
    }

    ChangeImpact {
        total_lines: content.lines().count(),
        occurrences,
        change_percentage,
        chars_changed,
        risk_level: level,
        is_risky: matches!(level, RiskLevel::High | RiskLevel::Critical),
        factors,
    }
}

pub struct PipelineExecutor {
    boundary: Arc<Boundary>,
    content_cache: Arc<ContentCache>,
    regex_cache: RegexCache,
    backup_manager: Arc<BackupManager>,
    edit_pipeline: EditPipeline,
    risk_thresholds: RiskThresholds,
    search_config: SearchConfig,
}

impl PipelineExecutor {
    pub fn new(boundary: Arc<Boundary>, content_cache: Arc<ContentCache>, backup_manager: Arc<BackupManager>) -> Self {
        let edit_pipeline = EditPipeline::new(
            Arc::clone(&boundary),
            Arc::clone(&content_cache),
            Arc::clone(&backup_manager),
        );
        Self {
            boundary,
            content_cache,
            regex_cache: RegexCache::default(),
            backup_manager,
            edit_pipeline,
            risk_thresholds: RiskThresholds::default(),
            search_config: SearchConfig::default(),
        }
    }

    pub fn with_risk_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.edit_pipeline = self.edit_pipeline.with_risk_thresholds(thresholds);
        self.risk_thresholds = thresholds;
        self
    }

    /// Run `pipeline` to completion, or to its first failing step when
    /// `stop_on_error` is set.
    pub async fn execute(&self, pipeline: &Pipeline) -> Result<PipelineReport, CoreError> {
        validate::validate(pipeline)?;

        let mut results: Vec<StepResult> = Vec::with_capacity(pipeline.steps.len());
        let mut touched: HashSet<PathBuf> = HashSet::new();
        let mut snapshots: Vec<String> = Vec::new();
        let mut failed_step: Option<String> = None;

        for step in &pipeline.steps {
            let working_set = step
                .input_from
                .as_ref()
                .and_then(|id| results.iter().find(|r| &r.id == id))
                .map(StepResult::touched_files);

            let outcome = self
                .run_step(&step.action, &step.id, working_set.as_deref(), pipeline, &mut touched, &mut snapshots)
                .await;

            match outcome {
                Ok(result) => results.push(result),
                Err(e) => {
                    results.push(StepResult::failed(step.id.clone(), e.to_string()));
                    failed_step = Some(step.id.clone());
                    if pipeline.stop_on_error {
                        break;
                    }
                }
            }
        }

        let rolled_back = if failed_step.is_some() && pipeline.stop_on_error && !pipeline.dry_run && !snapshots.is_empty() {
            self.rollback(&snapshots).await
        } else {
            false
        };

        info!(
            pipeline = %pipeline.name,
            steps = results.len(),
            failed = failed_step.is_some(),
            rolled_back,
            "pipeline complete"
        );

        Ok(PipelineReport {
            name: pipeline.name.clone(),
            steps: results,
            failed_step,
            rolled_back,
            backup_ids: snapshots,
            dry_run: pipeline.dry_run,
        })
    }

    async fn rollback(&self, backup_ids: &[String]) -> bool {
        let mut all_ok = true;
        for id in backup_ids.iter().rev() {
            if let Err(e) = self.backup_manager.restore(id, None, false).await {
                warn!(backup_id = %id, error = %e, "pipeline rollback restore failed");
                all_ok = false;
            }
        }
        all_ok
    }

    fn resolve_targets(&self, explicit: Option<&Path>, working_set: Option<&[PathBuf]>) -> Result<Vec<PathBuf>, CoreError> {
        if let Some(path) = explicit {
            return Ok(vec![path.to_path_buf()]);
        }
        if let Some(files) = working_set {
            return Ok(files.to_vec());
        }
        Err(CoreError::PipelineInvalid(
            "step has no explicit path and no input_from working set to draw one from".to_string(),
        ))
    }

    fn check_file_budget(&self, touched: &mut HashSet<PathBuf>, candidates: &[PathBuf]) -> Result<(), CoreError> {
        let mut grown = touched.clone();
        grown.extend(candidates.iter().cloned());
        if grown.len() > MAX_FILES_TOUCHED {
            return Err(CoreError::PipelineInvalid(format!(
                "pipeline would touch {} files, exceeding the cap of {MAX_FILES_TOUCHED}",
                grown.len()
            )));
        }
        *touched = grown;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_step(
        &self,
        action: &StepAction,
        id: &str,
        working_set: Option<&[PathBuf]>,
        pipeline: &Pipeline,
        touched: &mut HashSet<PathBuf>,
        snapshots: &mut Vec<String>,
    ) -> Result<StepResult, CoreError> {
        match action {
            StepAction::Search { root, pattern, include_content } => {
                let canonical_root = self.boundary.validate(root)?;
                let cancel = Cancellation::new();
                let mut files: Vec<PathBuf> = if *include_content {
                    ambit_search::search_content(
                        &canonical_root,
                        pattern,
                        &self.search_config,
                        &ContentSearchOptions::default(),
                        &self.regex_cache,
                        &cancel,
                    )
                    .map_err(|e| CoreError::PipelineInvalid(e.to_string()))?
                    .into_iter()
                    .map(|m| m.file)
                    .collect()
                } else {
                    ambit_search::search_filenames(&canonical_root, pattern, &self.search_config, &cancel)
                        .into_iter()
                        .map(|m| m.path)
                        .collect()
                };
                files.sort();
                files.dedup();
                self.check_file_budget(touched, &files)?;

                let mut result = StepResult::ok(id);
                result.files_matched = files;
                Ok(result)
            }

            StepAction::ReadRanges { path, start_line, end_line } => {
                let targets = self.resolve_targets(path.as_deref(), working_set)?;
                self.check_file_budget(touched, &targets)?;
                let mut combined = String::new();
                let mut canonical_targets = Vec::with_capacity(targets.len());
                for target in &targets {
                    let canonical = self.boundary.validate(target)?;
                    let lines = ambit_io::read_line_range(&canonical, *start_line, *end_line)
                        .await
                        .map_err(|e| wrap_io_error(&canonical, e))?;
                    combined.push_str(&format!("--- {} ---\n", canonical.display()));
                    combined.push_str(&lines.join("\n"));
                    combined.push('\n');
                    canonical_targets.push(canonical);
                }
                let mut result = StepResult::ok(id);
                result.files_matched = canonical_targets;
                result.content = Some(combined);
                Ok(result)
            }

            StepAction::CountOccurrences { path, pattern, regex } => {
                let targets = self.resolve_targets(path.as_deref(), working_set)?;
                self.check_file_budget(touched, &targets)?;
                let mut result = StepResult::ok(id);
                for target in &targets {
                    let canonical = self.boundary.validate(target)?;
                    let content = read_text(&canonical).await?;
                    let count = if *regex {
                        let re = self
                            .regex_cache
                            .get_or_compile(pattern)
                            .map_err(|e| CoreError::PipelineInvalid(e.to_string()))?;
                        re.find_iter(&content).count()
                    } else {
                        content.matches(pattern.as_str()).count()
                    };
                    result.counts.insert(canonical, count);
                }
                result.files_matched = result.counts.keys().cloned().collect();
                Ok(result)
            }

            StepAction::Edit { path, old_text, new_text, replace_all } => {
                let targets = self.resolve_targets(path.as_deref(), working_set)?;
                self.check_file_budget(touched, &targets)?;
                let mut result = StepResult::ok(id);
                for target in &targets {
                    let canonical = self.boundary.validate(target)?;
                    if pipeline.dry_run {
                        let content = read_text(&canonical).await?;
                        let impact = ambit_risk::assess(&content, old_text, new_text, &self.risk_thresholds);
                        result.edits_applied.insert(canonical.clone(), impact.occurrences);
                        result.files_matched.push(canonical);
                        continue;
                    }
                    let outcome = self
                        .edit_pipeline
                        .edit(&canonical, old_text, new_text, pipeline.force, *replace_all)
                        .await?;
                    result.edits_applied.insert(canonical.clone(), outcome.replacement_count);
                    result.files_matched.push(canonical);
                    snapshots.push(outcome.backup_id);
                }
                Ok(result)
            }

            StepAction::MultiEdit { path, edits } => {
                let targets = self.resolve_targets(path.as_deref(), working_set)?;
                self.check_file_budget(touched, &targets)?;
                let pairs: Vec<(String, String)> = edits.iter().map(|e| (e.old_text.clone(), e.new_text.clone())).collect();
                let mut result = StepResult::ok(id);
                for target in &targets {
                    let canonical = self.boundary.validate(target)?;
                    if pipeline.dry_run {
                        let content = read_text(&canonical).await?;
                        let total: usize = pairs
                            .iter()
                            .map(|(old, new)| ambit_risk::assess(&content, old, new, &self.risk_thresholds).occurrences)
                            .sum();
                        result.edits_applied.insert(canonical.clone(), total);
                        result.files_matched.push(canonical);
                        continue;
                    }
                    let outcome = self.edit_pipeline.multi_edit(&canonical, &pairs, pipeline.force).await?;
                    result.edits_applied.insert(canonical.clone(), outcome.total_replacements);
                    result.files_matched.push(canonical);
                    snapshots.push(outcome.backup_id);
                }
                Ok(result)
            }

            StepAction::RegexTransform { pattern, replacement } => {
                let targets = working_set
                    .map(<[PathBuf]>::to_vec)
                    .ok_or_else(|| CoreError::PipelineInvalid("regex_transform requires input_from".to_string()))?;
                self.check_file_budget(touched, &targets)?;
                let regex = self
                    .regex_cache
                    .get_or_compile(pattern)
                    .map_err(|e| CoreError::PipelineInvalid(e.to_string()))?;

                let mut result = StepResult::ok(id);
                for target in &targets {
                    let canonical = self.boundary.validate(target)?;
                    let content = read_text(&canonical).await?;
                    let impact = assess_regex(&content, &regex, replacement, &self.risk_thresholds);
                    if impact.is_risky && !pipeline.force {
                        return Err(CoreError::BlockedRisk { path: canonical, impact });
                    }
                    let occurrences = regex.find_iter(&content).count();

                    if pipeline.dry_run {
                        result.edits_applied.insert(canonical.clone(), occurrences);
                        result.files_matched.push(canonical);
                        continue;
                    }

                    let backup = self
                        .backup_manager
                        .create(&[canonical.clone()], "regex_transform", &impact.warning())
                        .await
                        .map_err(|e| CoreError::BackupFailed {
                            paths: vec![canonical.clone()],
                            detail: e.to_string(),
                        })?;
                    let rewritten = regex.replace_all(&content, replacement.as_str()).into_owned();
                    ambit_io::atomic_write(&canonical, rewritten.as_bytes())
                        .await
                        .map_err(|e| wrap_io_error(&canonical, e))?;
                    self.content_cache.invalidate(&canonical);

                    result.edits_applied.insert(canonical.clone(), occurrences);
                    result.files_matched.push(canonical);
                    snapshots.push(backup.backup_id);
                }
                Ok(result)
            }

            StepAction::Copy { from, to } => {
                let sources = self.resolve_targets(from.as_deref(), working_set)?;
                self.check_file_budget(touched, &sources)?;
                let mut result = StepResult::ok(id);
                for source in &sources {
                    let canonical_from = self.boundary.validate(source)?;
                    let dest = if sources.len() > 1 {
                        to.join(canonical_from.file_name().unwrap_or_default())
                    } else {
                        to.clone()
                    };
                    let canonical_to = self.boundary.validate(&dest)?;
                    if !pipeline.dry_run {
                        ambit_io::copy_file(&canonical_from, &canonical_to)
                            .await
                            .map_err(|e| wrap_io_error(&canonical_to, e))?;
                        self.content_cache.invalidate(&canonical_to);
                    }
                    result.edits_applied.insert(canonical_to, 1);
                }
                result.files_matched = sources;
                Ok(result)
            }

            StepAction::Rename { from, to } => {
                let canonical_from = self.boundary.validate(from)?;
                let canonical_to = self.boundary.validate(to)?;
                self.check_file_budget(touched, &[canonical_from.clone()])?;
                if !pipeline.dry_run {
                    tokio::fs::rename(&canonical_from, &canonical_to)
                        .await
                        .map_err(|e| io_error(&canonical_from, e))?;
                    self.content_cache.invalidate(&canonical_from);
                    self.content_cache.invalidate(&canonical_to);
                }
                let mut result = StepResult::ok(id);
                result.files_matched = vec![canonical_to];
                Ok(result)
            }

            StepAction::Delete { path } => {
                let targets = self.resolve_targets(path.as_deref(), working_set)?;
                self.check_file_budget(touched, &targets)?;
                let mut result = StepResult::ok(id);
                for target in &targets {
                    let canonical = self.boundary.validate(target)?;
                    if !pipeline.dry_run {
                        let backup = self
                            .backup_manager
                            .create(&[canonical.clone()], "pipeline_delete", "delete step")
                            .await
                            .map_err(|e| CoreError::BackupFailed {
                                paths: vec![canonical.clone()],
                                detail: e.to_string(),
                            })?;
                        tokio::fs::remove_file(&canonical)
                            .await
                            .map_err(|e| io_error(&canonical, e))?;
                        self.content_cache.invalidate(&canonical);
                        snapshots.push(backup.backup_id);
                    }
                    result.edits_applied.insert(canonical.clone(), 1);
                    result.files_matched.push(canonical);
                }
                Ok(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{EditPair, PipelineStep};

    fn executor_for(root: &Path) -> PipelineExecutor {
        let boundary = Arc::new(Boundary::new(vec![root.to_path_buf()]).unwrap());
        let cache = Arc::new(ContentCache::default());
        let backups = Arc::new(BackupManager::with_defaults(root.join(".backups")));
        PipelineExecutor::new(boundary, cache, backups)
    }

    #[tokio::test]
    async fn search_then_count_shares_working_set() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(tmp.path().join("a.rs"), "foo foo\n").await.unwrap();
        tokio::fs::write(tmp.path().join("b.rs"), "bar\n").await.unwrap();
        let executor = executor_for(tmp.path());

        let pipeline = Pipeline {
            name: "p".to_string(),
            steps: vec![
                PipelineStep {
                    id: "s1".to_string(),
                    action: StepAction::Search {
                        root: tmp.path().to_path_buf(),
                        pattern: "a".to_string(),
                        include_content: false,
                    },
                    input_from: None,
                },
                PipelineStep {
                    id: "s2".to_string(),
                    action: StepAction::CountOccurrences {
                        path: None,
                        pattern: "foo".to_string(),
                        regex: false,
                    },
                    input_from: Some("s1".to_string()),
                },
            ],
            dry_run: false,
            stop_on_error: true,
            force: false,
        };

        let report = executor.execute(&pipeline).await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.steps[1].counts.values().next().copied(), Some(2));
    }

    #[tokio::test]
    async fn edit_step_creates_backup_and_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "let x = 1;\n").await.unwrap();
        let executor = executor_for(tmp.path());

        let pipeline = Pipeline {
            name: "p".to_string(),
            steps: vec![PipelineStep {
                id: "edit1".to_string(),
                action: StepAction::Edit {
                    path: Some(file.clone()),
                    old_text: "x".to_string(),
                    new_text: "y".to_string(),
                    replace_all: false,
                },
                input_from: None,
            }],
            dry_run: false,
            stop_on_error: true,
            force: false,
        };

        let report = executor.execute(&pipeline).await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.backup_ids.len(), 1);
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "let y = 1;\n");
    }

    #[tokio::test]
    async fn failed_step_rolls_back_prior_edit() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "alpha beta\n").await.unwrap();
        let executor = executor_for(tmp.path());

        let pipeline = Pipeline {
            name: "p".to_string(),
            steps: vec![
                PipelineStep {
                    id: "edit1".to_string(),
                    action: StepAction::Edit {
                        path: Some(file.clone()),
                        old_text: "alpha".to_string(),
                        new_text: "ALPHA".to_string(),
                        replace_all: false,
                    },
                    input_from: None,
                },
                PipelineStep {
                    id: "edit2".to_string(),
                    action: StepAction::Edit {
                        path: Some(file.clone()),
                        old_text: "not-present".to_string(),
                        new_text: "x".to_string(),
                        replace_all: false,
                    },
                    input_from: None,
                },
            ],
            dry_run: false,
            stop_on_error: true,
            force: false,
        };

        let report = executor.execute(&pipeline).await.unwrap();
        assert!(!report.is_success());
        assert!(report.rolled_back);
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "alpha beta\n");
    }

    #[tokio::test]
    async fn dry_run_leaves_file_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "let x = 1;\n").await.unwrap();
        let executor = executor_for(tmp.path());

        let pipeline = Pipeline {
            name: "p".to_string(),
            steps: vec![PipelineStep {
                id: "edit1".to_string(),
                action: StepAction::Edit {
                    path: Some(file.clone()),
                    old_text: "x".to_string(),
                    new_text: "y".to_string(),
                    replace_all: false,
                },
                input_from: None,
            }],
            dry_run: true,
            stop_on_error: true,
            force: false,
        };

        let report = executor.execute(&pipeline).await.unwrap();
        assert!(report.is_success());
        assert!(report.backup_ids.is_empty());
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "let x = 1;\n");
    }

    #[tokio::test]
    async fn multi_edit_step_applies_both_pairs() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "foo bar\n").await.unwrap();
        let executor = executor_for(tmp.path());

        let pipeline = Pipeline {
            name: "p".to_string(),
            steps: vec![PipelineStep {
                id: "m1".to_string(),
                action: StepAction::MultiEdit {
                    path: Some(file.clone()),
                    edits: vec![
                        EditPair {
                            old_text: "foo".to_string(),
                            new_text: "FOO".to_string(),
                        },
                        EditPair {
                            old_text: "bar".to_string(),
                            new_text: "BAR".to_string(),
                        },
                    ],
                },
                input_from: None,
            }],
            dry_run: false,
            stop_on_error: true,
            force: false,
        };

        let report = executor.execute(&pipeline).await.unwrap();
        assert!(report.is_success());
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "FOO BAR\n");
    }
}
