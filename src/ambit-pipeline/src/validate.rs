//! Static validation of a pipeline definition: id syntax, duplicate ids,
//! backward-only `input_from` references, per-action required parameters,
//! and the step-count cap.

use std::collections::HashSet;

use ambit_edit::CoreError;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::step::{Pipeline, StepAction, MAX_STEPS};

static ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

fn invalid(detail: impl Into<String>) -> CoreError {
    CoreError::PipelineInvalid(detail.into())
}

fn check_required_params(action: &StepAction) -> Result<(), CoreError> {
    match action {
        StepAction::Search { pattern, .. } if pattern.is_empty() => {
            Err(invalid("search step requires a non-empty pattern"))
        }
        StepAction::Edit { old_text, .. } if old_text.is_empty() => {
            Err(invalid("edit step requires non-empty old_text"))
        }
        StepAction::MultiEdit { edits, .. } if edits.is_empty() => {
            Err(invalid("multi_edit step requires at least one edit pair"))
        }
        StepAction::CountOccurrences { pattern, .. } if pattern.is_empty() => {
            Err(invalid("count_occurrences step requires a non-empty pattern"))
        }
        StepAction::RegexTransform { pattern, .. } if pattern.is_empty() => {
            Err(invalid("regex_transform step requires a non-empty pattern"))
        }
        StepAction::ReadRanges { start_line, end_line, .. } if start_line > end_line => {
            Err(invalid("read_ranges step requires start_line <= end_line"))
        }
        _ => Ok(()),
    }
}

/// Validate `pipeline` against spec.md's pipeline-definition rules.
/// Dynamic bounds (total files touched) are enforced by the executor as
/// working sets accumulate, since they depend on search results.
pub fn validate(pipeline: &Pipeline) -> Result<(), CoreError> {
    if pipeline.steps.is_empty() {
        return Err(invalid("pipeline must contain at least one step"));
    }
    if pipeline.steps.len() > MAX_STEPS {
        return Err(invalid(format!(
            "pipeline has {} steps, exceeding the cap of {MAX_STEPS}",
            pipeline.steps.len()
        )));
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for (index, step) in pipeline.steps.iter().enumerate() {
        if !ID_PATTERN.is_match(&step.id) {
            return Err(invalid(format!(
                "step id '{}' must match [A-Za-z0-9_-]+",
                step.id
            )));
        }
        if !seen_ids.insert(step.id.as_str()) {
            return Err(invalid(format!("duplicate step id '{}'", step.id)));
        }

        if let Some(reference) = &step.input_from {
            let earlier = pipeline.steps[..index]
                .iter()
                .position(|s| &s.id == reference);
            match earlier {
                None => {
                    let is_later = pipeline.steps[index + 1..].iter().any(|s| &s.id == reference);
                    if is_later {
                        return Err(invalid(format!(
                            "step '{}' references '{}', which appears later (forward references are not allowed)",
                            step.id, reference
                        )));
                    }
                    return Err(invalid(format!(
                        "step '{}' references unknown step '{}'",
                        step.id, reference
                    )));
                }
                Some(_) => {}
            }
        }

        check_required_params(&step.action)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{PipelineStep, StepAction};
    use std::path::PathBuf;

    fn search_step(id: &str) -> PipelineStep {
        PipelineStep {
            id: id.to_string(),
            action: StepAction::Search {
                root: PathBuf::from("/tmp"),
                pattern: "foo".to_string(),
                include_content: false,
            },
            input_from: None,
        }
    }

    #[test]
    fn rejects_forward_reference() {
        let pipeline = Pipeline {
            name: "p".to_string(),
            steps: vec![
                PipelineStep {
                    id: "s1".to_string(),
                    input_from: Some("s2".to_string()),
                    ..search_step("s1")
                },
                search_step("s2"),
            ],
            dry_run: false,
            stop_on_error: true,
            force: false,
        };
        let err = validate(&pipeline).unwrap_err();
        assert!(err.to_string().contains("forward"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let pipeline = Pipeline {
            name: "p".to_string(),
            steps: vec![search_step("s1"), search_step("s1")],
            dry_run: false,
            stop_on_error: true,
            force: false,
        };
        assert!(validate(&pipeline).is_err());
    }

    #[test]
    fn rejects_malformed_id() {
        let pipeline = Pipeline {
            name: "p".to_string(),
            steps: vec![search_step("bad id!")],
            dry_run: false,
            stop_on_error: true,
            force: false,
        };
        assert!(validate(&pipeline).is_err());
    }

    #[test]
    fn accepts_backward_reference() {
        let pipeline = Pipeline {
            name: "p".to_string(),
            steps: vec![
                search_step("s1"),
                PipelineStep {
                    id: "s2".to_string(),
                    input_from: Some("s1".to_string()),
                    ..search_step("s2")
                },
            ],
            dry_run: false,
            stop_on_error: true,
            force: false,
        };
        assert!(validate(&pipeline).is_ok());
    }
}
