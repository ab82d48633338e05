//! `batch_operations` -- the Batch Executor (C10) surfaced as a single tool
//! that validates a list of heterogeneous operations, then executes them
//! atomically unless told otherwise.

use std::sync::Arc;

use ambit_batch::{BatchFlags, BatchOp};
use ambit_mcp_server::ToolHandler;
use ambit_mcp_types::{CallToolResult, PropertySchema, Tool, ToolInputSchema};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::args;
use crate::context::ToolContext;

#[derive(Debug, Deserialize)]
struct BatchFlagsArg {
    #[serde(default = "default_true")]
    atomic: bool,
    #[serde(default = "default_true")]
    create_backup: bool,
    #[serde(default)]
    validate_only: bool,
    #[serde(default)]
    force: bool,
}

fn default_true() -> bool {
    true
}

impl From<BatchFlagsArg> for BatchFlags {
    fn from(f: BatchFlagsArg) -> Self {
        BatchFlags {
            atomic: f.atomic,
            create_backup: f.create_backup,
            validate_only: f.validate_only,
            force: f.force,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    ops: Vec<BatchOp>,
    #[serde(default)]
    flags: Option<BatchFlagsArg>,
}

pub struct BatchOperationsTool {
    ctx: Arc<ToolContext>,
}

impl BatchOperationsTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for BatchOperationsTool {
    fn tool(&self) -> Tool {
        Tool::new(
            "batch_operations",
            "Validate then execute an ordered list of write/edit/move/copy/delete/create_dir operations as one unit",
        )
        .with_schema(
            ToolInputSchema::object()
                .property(
                    "ops",
                    PropertySchema::array(PropertySchema::object())
                        .description("Ordered operations, each tagged by its 'type' field (write, edit, move, copy, delete, create_dir)"),
                )
                .property(
                    "flags",
                    PropertySchema::object()
                        .property("atomic", PropertySchema::boolean())
                        .property("create_backup", PropertySchema::boolean())
                        .property("validate_only", PropertySchema::boolean())
                        .property("force", PropertySchema::boolean())
                        .description("Execution flags; defaults to atomic, backed-up, non-dry-run, non-forced"),
                )
                .required(vec!["ops"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let request: BatchRequest = args::require_object(&arguments)?;
        let flags: BatchFlags = request.flags.map(Into::into).unwrap_or_default();

        let validation = self.ctx.batch_executor.validate(&request.ops).await?;
        if flags.validate_only {
            let report = ambit_batch::BatchReport::validation_only(validation);
            return Ok(CallToolResult::text(serde_json::to_string_pretty(&report)?));
        }

        let report = self.ctx.batch_executor.execute(&request.ops, flags).await?;
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
    async fn batch_writes_two_files() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.txt");
        let b = tmp.path().join("b.txt");

        let tool = BatchOperationsTool::new(ctx_for(tmp.path()));
        let result = tool
            .execute(json!({
                "ops": [
                    {"type": "write", "path": a, "content": "one"},
                    {"type": "write", "path": b, "content": "two"},
                ],
            }))
            .await
            .unwrap();
        let text = result.content[0].as_text().unwrap();
        assert!(text.contains("\"executed\": true"));
        assert_eq!(tokio::fs::read_to_string(&a).await.unwrap(), "one");
        assert_eq!(tokio::fs::read_to_string(&b).await.unwrap(), "two");
    }

    #[tokio::test]
    async fn validate_only_does_not_write() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.txt");

        let tool = BatchOperationsTool::new(ctx_for(tmp.path()));
        tool.execute(json!({
            "ops": [{"type": "write", "path": a, "content": "one"}],
            "flags": {"validate_only": true},
        }))
        .await
        .unwrap();
        assert!(!a.exists());
    }
}
