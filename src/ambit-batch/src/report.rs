//! Result types for the validation and execution passes.

use std::path::PathBuf;

use ambit_risk::ChangeImpact;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct OpValidation {
    pub index: usize,
    pub description: String,
    pub ok: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub ops: Vec<OpValidation>,
    pub aggregate_occurrences: usize,
    pub aggregate_change_percent: f64,
    pub would_block: bool,
    pub impact_summary: Option<ChangeImpact>,
}

impl ValidationReport {
    pub fn all_ok(&self) -> bool {
        self.ops.iter().all(|o| o.ok)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OpOutcome {
    pub index: usize,
    pub description: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub validation: ValidationReport,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<OpOutcome>,
    pub backup_id: Option<String>,
    pub rolled_back: bool,
    pub executed: bool,
}

impl BatchReport {
    pub fn validation_only(validation: ValidationReport) -> Self {
        Self {
            validation,
            total: 0,
            successful: 0,
            failed: 0,
            results: Vec::new(),
            backup_id: None,
            rolled_back: false,
            executed: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.executed && self.failed == 0
    }
}
