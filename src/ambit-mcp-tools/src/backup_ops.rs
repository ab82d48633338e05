//! `list_backups`, `get_backup_info`, `compare_with_backup`,
//! `restore_backup`, `cleanup_backups` -- the persistent Backup Store (C9)
//! surfaced as tools.

use std::path::PathBuf;
use std::sync::Arc;

use ambit_backup::ListFilter;
use ambit_mcp_server::ToolHandler;
use ambit_mcp_types::{CallToolResult, PropertySchema, Tool, ToolInputSchema};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::args;
use crate::context::ToolContext;

pub struct ListBackupsTool {
    ctx: Arc<ToolContext>,
}

impl ListBackupsTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for ListBackupsTool {
    fn tool(&self) -> Tool {
        Tool::new("list_backups", "List recorded backups, newest first, optionally filtered").with_schema(
            ToolInputSchema::object()
                .property("operation", PropertySchema::string().description("Only backups recorded under this operation name"))
                .property("path_substring", PropertySchema::string().description("Only backups containing a file path matching this substring"))
                .property("max_age_hours", PropertySchema::integer().description("Only backups newer than this many hours").min(0.0)),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let filter = ListFilter {
            operation: args::opt_str(&arguments, "operation").map(String::from),
            path_substring: args::opt_str(&arguments, "path_substring").map(String::from),
            max_age_hours: arguments.get("max_age_hours").and_then(Value::as_u64),
        };

        let mut summaries = self.ctx.backup_manager.list(&filter).await?;
        summaries.truncate(self.ctx.limits.max_list_items);
        Ok(CallToolResult::text(serde_json::to_string_pretty(&summaries)?))
    }
}

pub struct GetBackupInfoTool {
    ctx: Arc<ToolContext>,
}

impl GetBackupInfoTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for GetBackupInfoTool {
    fn tool(&self) -> Tool {
        Tool::new("get_backup_info", "Fetch the full metadata (every tracked file, size, hash) for one backup").with_schema(
            ToolInputSchema::object()
                .property("backup_id", PropertySchema::string().description("Backup identifier"))
                .required(vec!["backup_id"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let backup_id = args::require_str(&arguments, "backup_id")?;
        let entry = self.ctx.backup_manager.get(backup_id).await?;
        Ok(CallToolResult::text(serde_json::to_string_pretty(&entry)?))
    }
}

pub struct CompareWithBackupTool {
    ctx: Arc<ToolContext>,
}

impl CompareWithBackupTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for CompareWithBackupTool {
    fn tool(&self) -> Tool {
        Tool::new("compare_with_backup", "Unified diff and similarity between a backed-up file and its current on-disk state").with_schema(
            ToolInputSchema::object()
                .property("backup_id", PropertySchema::string().description("Backup identifier"))
                .property("path", PropertySchema::string().description("File within the backup to compare"))
                .required(vec!["backup_id", "path"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let backup_id = args::require_str(&arguments, "backup_id")?;
        let path = args::require_path(&arguments, "path")?;
        let report = self.ctx.backup_manager.compare(backup_id, &path).await?;
        Ok(CallToolResult::text(serde_json::to_string_pretty(&report)?))
    }
}

pub struct RestoreBackupTool {
    ctx: Arc<ToolContext>,
}

impl RestoreBackupTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for RestoreBackupTool {
    fn tool(&self) -> Tool {
        Tool::new(
            "restore_backup",
            "Restore one, several, or all files tracked by a backup, taking a safety backup of the current state first",
        )
        .with_schema(
            ToolInputSchema::object()
                .property("backup_id", PropertySchema::string().description("Backup identifier"))
                .property(
                    "files",
                    PropertySchema::array(PropertySchema::string()).description("Restore only these original paths; omit to restore every tracked file"),
                )
                .property("preview", PropertySchema::boolean().description("Report what would be restored without writing anything"))
                .required(vec!["backup_id"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let backup_id = args::require_str(&arguments, "backup_id")?;
        let preview = args::opt_bool(&arguments, "preview", false);
        let files: Option<Vec<PathBuf>> = arguments
            .get("files")
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()?;

        let report = self
            .ctx
            .backup_manager
            .restore(backup_id, files.as_deref(), preview)
            .await?;
        if !preview {
            for restored in &report.restored {
                self.ctx.content_cache.invalidate(&restored.path);
            }
        }
        Ok(CallToolResult::text(serde_json::to_string_pretty(&report)?))
    }
}

pub struct CleanupBackupsTool {
    ctx: Arc<ToolContext>,
}

impl CleanupBackupsTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for CleanupBackupsTool {
    fn tool(&self) -> Tool {
        Tool::new("cleanup_backups", "Remove backups past the age/count retention policy").with_schema(
            ToolInputSchema::object()
                .property("dry_run", PropertySchema::boolean().description("Report what would be removed without deleting anything")),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let dry_run = args::opt_bool(&arguments, "dry_run", false);
        let report = self.ctx.backup_manager.cleanup(dry_run).await?;
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
    async fn list_and_get_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "hello").await.unwrap();
        let ctx = ctx_for(tmp.path());

        let entry = ctx.backup_manager.create(&[file.clone()], "test", "unit-test").await.unwrap();

        let list_tool = ListBackupsTool::new(Arc::clone(&ctx));
        let list_result = list_tool.execute(json!({})).await.unwrap();
        assert!(list_result.content[0].as_text().unwrap().contains(&entry.backup_id));

        let info_tool = GetBackupInfoTool::new(ctx);
        let info_result = info_tool.execute(json!({"backup_id": entry.backup_id})).await.unwrap();
        assert!(info_result.content[0].as_text().unwrap().contains(&entry.backup_id));
    }

    #[tokio::test]
    async fn restore_brings_back_original_content() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "original").await.unwrap();
        let ctx = ctx_for(tmp.path());

        let entry = ctx.backup_manager.create(&[file.clone()], "test", "unit-test").await.unwrap();
        tokio::fs::write(&file, "modified").await.unwrap();

        let tool = RestoreBackupTool::new(ctx);
        tool.execute(json!({"backup_id": entry.backup_id})).await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "original");
    }

    #[tokio::test]
    async fn compare_reports_identical_after_restore() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "same").await.unwrap();
        let ctx = ctx_for(tmp.path());

        let entry = ctx.backup_manager.create(&[file.clone()], "test", "unit-test").await.unwrap();

        let tool = CompareWithBackupTool::new(ctx);
        let result = tool.execute(json!({"backup_id": entry.backup_id, "path": file})).await.unwrap();
        let parsed: Value = serde_json::from_str(result.content[0].as_text().unwrap()).unwrap();
        assert_eq!(parsed["identical"], true);
    }
}
