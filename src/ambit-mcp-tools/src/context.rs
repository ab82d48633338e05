//! Shared, process-lifetime handles every tool handler is built against:
//! one sandbox boundary, one content cache, one backup store, and the
//! higher-level pipelines (edit/batch/pipeline) layered over them.

use std::sync::Arc;

use ambit_backup::BackupManager;
use ambit_batch::BatchExecutor;
use ambit_cache::{ContentCache, RegexCache};
use ambit_edit::EditPipeline;
use ambit_io::IoThresholds;
use ambit_pipeline::PipelineExecutor;
use ambit_risk::RiskThresholds;
use ambit_sandbox::Boundary;
use ambit_search::SearchConfig;

/// Response-size bounds honored by the search and backup-listing tools.
#[derive(Debug, Clone, Copy)]
pub struct ResponseLimits {
    pub max_search_results: usize,
    pub max_list_items: usize,
}

impl Default for ResponseLimits {
    fn default() -> Self {
        Self {
            max_search_results: 200,
            max_list_items: 100,
        }
    }
}

pub struct ToolContext {
    pub boundary: Arc<Boundary>,
    pub content_cache: Arc<ContentCache>,
    pub regex_cache: RegexCache,
    pub backup_manager: Arc<BackupManager>,
    pub edit_pipeline: EditPipeline,
    pub batch_executor: BatchExecutor,
    pub pipeline_executor: PipelineExecutor,
    pub search_config: SearchConfig,
    pub risk_thresholds: RiskThresholds,
    pub io_thresholds: IoThresholds,
    pub limits: ResponseLimits,
}

impl ToolContext {
    pub fn new(
        boundary: Arc<Boundary>,
        content_cache: Arc<ContentCache>,
        backup_manager: Arc<BackupManager>,
    ) -> Self {
        let edit_pipeline = EditPipeline::new(
            Arc::clone(&boundary),
            Arc::clone(&content_cache),
            Arc::clone(&backup_manager),
        );
        let batch_executor = BatchExecutor::new(
            Arc::clone(&boundary),
            Arc::clone(&content_cache),
            Arc::clone(&backup_manager),
        );
        let pipeline_executor = PipelineExecutor::new(
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
            batch_executor,
            pipeline_executor,
            search_config: SearchConfig::default(),
            risk_thresholds: RiskThresholds::default(),
            io_thresholds: IoThresholds::default(),
            limits: ResponseLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ResponseLimits) -> Self {
        self.limits = limits;
        self
    }
}
