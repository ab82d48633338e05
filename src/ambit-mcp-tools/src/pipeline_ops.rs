//! `execute_pipeline` -- the Pipeline Executor (C11) surfaced as a tool: a
//! named, ordered list of search/read/edit/transform/copy/rename/delete
//! steps where a later step can draw its working set from an earlier one.

use std::sync::Arc;

use ambit_mcp_server::ToolHandler;
use ambit_mcp_types::{CallToolResult, PropertySchema, Tool, ToolInputSchema};
use ambit_pipeline::Pipeline;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::args;
use crate::context::ToolContext;

pub struct ExecutePipelineTool {
    ctx: Arc<ToolContext>,
}

impl ExecutePipelineTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for ExecutePipelineTool {
    fn tool(&self) -> Tool {
        Tool::new(
            "execute_pipeline",
            "Run a named, ordered list of search/read/edit/transform/copy/rename/delete steps, optionally chaining each step's working set from an earlier one",
        )
        .with_schema(
            ToolInputSchema::object()
                .property("name", PropertySchema::string().description("Pipeline name, surfaced in the report"))
                .property(
                    "steps",
                    PropertySchema::array(PropertySchema::object())
                        .description("Ordered steps, each an 'id' plus an 'action' tag (search, read_ranges, edit, multi_edit, count_occurrences, regex_transform, copy, rename, delete) and an optional 'input_from' referencing an earlier step's id"),
                )
                .property("dry_run", PropertySchema::boolean().description("Validate and report without mutating anything"))
                .property("stop_on_error", PropertySchema::boolean().description("Stop at the first failing step instead of continuing (default true)"))
                .property("force", PropertySchema::boolean().description("Proceed even if a step's change is classified HIGH/CRITICAL risk"))
                .required(vec!["name", "steps"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let pipeline: Pipeline = args::require_object(&arguments)?;
        let report = self.ctx.pipeline_executor.execute(&pipeline).await?;
        Ok(CallToolResult::text(serde_json::to_string_pretty(&report)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambit_backup::BackupManager;
    use ambit_cache::ContentCache;
    use ambit_sandbox::Boundary;
    use serde_json::json;

    fn ctx_for(root: &std::path::Path) -> Arc<ToolContext> {
        let boundary = Arc::new(Boundary::new(vec![root.to_path_buf()]).unwrap());
        let cache = Arc::new(ContentCache::default());
        let backups = Arc::new(BackupManager::with_defaults(root.join(".backups")));
        Arc::new(ToolContext::new(boundary, cache, backups))
    }

    #[tokio::test]
    async fn pipeline_edits_via_chained_search() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.rs");
        tokio::fs::write(&file, "let x = 1;\n").await.unwrap();

        let tool = ExecutePipelineTool::new(ctx_for(tmp.path()));
        let result = tool
            .execute(json!({
                "name": "bump-x",
                "steps": [
                    {"id": "find", "action": "search", "root": tmp.path(), "pattern": "x = 1"},
                    {"id": "fix", "action": "edit", "old_text": "x = 1", "new_text": "x = 2", "input_from": "find"},
                ],
            }))
            .await
            .unwrap();
        let text = result.content[0].as_text().unwrap();
        assert!(text.contains("\"name\": \"bump-x\""));
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "let x = 2;\n");
    }

    #[tokio::test]
    async fn dry_run_does_not_mutate() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.rs");
        tokio::fs::write(&file, "let x = 1;\n").await.unwrap();

        let tool = ExecutePipelineTool::new(ctx_for(tmp.path()));
        tool.execute(json!({
            "name": "dry",
            "dry_run": true,
            "steps": [
                {"id": "fix", "action": "edit", "path": file, "old_text": "x = 1", "new_text": "x = 2"},
            ],
        }))
        .await
        .unwrap();
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "let x = 1;\n");
    }
}
