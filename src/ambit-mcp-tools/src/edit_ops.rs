//! `edit_file`, `multi_edit`, `replace_nth_occurrence`, `count_occurrences`,
//! `analyze_edit` -- the Edit Pipeline (C8) surfaced as tools.

use std::sync::Arc;

use ambit_mcp_server::ToolHandler;
use ambit_mcp_types::{CallToolResult, PropertySchema, Tool, ToolInputSchema};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::args;
use crate::context::ToolContext;

pub struct EditFileTool {
    ctx: Arc<ToolContext>,
}

impl EditFileTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for EditFileTool {
    fn tool(&self) -> Tool {
        Tool::new("edit_file", "Replace old_text with new_text in a file via the tiered edit pipeline").with_schema(
            ToolInputSchema::object()
                .property("path", PropertySchema::string().description("File to edit"))
                .property("old_text", PropertySchema::string().description("Text to locate"))
                .property("new_text", PropertySchema::string().description("Replacement text"))
                .property(
                    "replace_all",
                    PropertySchema::boolean().description("Replace every occurrence instead of requiring a unique match"),
                )
                .property(
                    "force",
                    PropertySchema::boolean().description("Proceed even if the change is classified HIGH/CRITICAL risk"),
                )
                .required(vec!["path", "old_text", "new_text"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let path = args::require_path(&arguments, "path")?;
        let old_text = args::require_str(&arguments, "old_text")?;
        let new_text = args::require_str(&arguments, "new_text")?;
        let replace_all = args::opt_bool(&arguments, "replace_all", false);
        let force = args::opt_bool(&arguments, "force", false);

        let outcome = self.ctx.edit_pipeline.edit(&path, old_text, new_text, force, replace_all).await?;
        Ok(CallToolResult::text(serde_json::to_string_pretty(&outcome)?))
    }
}

#[derive(Debug, Deserialize)]
struct EditPairArg {
    old_text: String,
    new_text: String,
}

pub struct MultiEditTool {
    ctx: Arc<ToolContext>,
}

impl MultiEditTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for MultiEditTool {
    fn tool(&self) -> Tool {
        Tool::new("multi_edit", "Apply an ordered list of old_text/new_text edits to one file as a single write").with_schema(
            ToolInputSchema::object()
                .property("path", PropertySchema::string().description("File to edit"))
                .property(
                    "edits",
                    PropertySchema::array(
                        PropertySchema::object()
                            .property("old_text", PropertySchema::string())
                            .property("new_text", PropertySchema::string())
                            .required(vec!["old_text", "new_text"]),
                    )
                    .description("Ordered (old_text, new_text) pairs"),
                )
                .property("force", PropertySchema::boolean().description("Proceed even if aggregate risk is HIGH/CRITICAL"))
                .required(vec!["path", "edits"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let path = args::require_path(&arguments, "path")?;
        let edits: Vec<EditPairArg> = args::require_array(&arguments, "edits")?;
        let force = args::opt_bool(&arguments, "force", false);

        let pairs: Vec<(String, String)> = edits.into_iter().map(|e| (e.old_text, e.new_text)).collect();
        let outcome = self.ctx.edit_pipeline.multi_edit(&path, &pairs, force).await?;
        Ok(CallToolResult::text(serde_json::to_string_pretty(&outcome)?))
    }
}

pub struct ReplaceNthOccurrenceTool {
    ctx: Arc<ToolContext>,
}

impl ReplaceNthOccurrenceTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for ReplaceNthOccurrenceTool {
    fn tool(&self) -> Tool {
        Tool::new(
            "replace_nth_occurrence",
            "Replace exactly the nth occurrence of pattern (1..N from the start, -1 the last, -2 the second-to-last, ...)",
        )
        .with_schema(
            ToolInputSchema::object()
                .property("path", PropertySchema::string().description("File to edit"))
                .property("pattern", PropertySchema::string().description("Literal text to locate"))
                .property("new_text", PropertySchema::string().description("Replacement text"))
                .property(
                    "occurrence",
                    PropertySchema::integer().description("1-indexed occurrence, or negative to count from the end"),
                )
                .property("force", PropertySchema::boolean().description("Proceed even if risk is HIGH/CRITICAL"))
                .required(vec!["path", "pattern", "new_text", "occurrence"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let path = args::require_path(&arguments, "path")?;
        let pattern = args::require_str(&arguments, "pattern")?;
        let new_text = args::require_str(&arguments, "new_text")?;
        let occurrence = args::require_i64(&arguments, "occurrence")?;
        let force = args::opt_bool(&arguments, "force", false);

        let outcome = self
            .ctx
            .edit_pipeline
            .replace_nth_occurrence(&path, pattern, new_text, occurrence, force)
            .await?;
        Ok(CallToolResult::text(serde_json::to_string_pretty(&outcome)?))
    }
}

pub struct CountOccurrencesTool {
    ctx: Arc<ToolContext>,
}

impl CountOccurrencesTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for CountOccurrencesTool {
    fn tool(&self) -> Tool {
        Tool::new("count_occurrences", "Count occurrences of a literal or regex pattern in a file").with_schema(
            ToolInputSchema::object()
                .property("path", PropertySchema::string().description("File to scan"))
                .property("pattern", PropertySchema::string().description("Pattern to count"))
                .property("regex", PropertySchema::boolean().description("Treat pattern as a regex instead of a literal"))
                .property("show_lines", PropertySchema::boolean().description("Include the 1-indexed line numbers of each match"))
                .required(vec!["path", "pattern"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let path = args::require_path(&arguments, "path")?;
        let pattern = args::require_str(&arguments, "pattern")?;
        let regex = args::opt_bool(&arguments, "regex", false);
        let show_lines = args::opt_bool(&arguments, "show_lines", false);

        let canonical = self.ctx.boundary.validate(&path)?;
        let (bytes, _mode) = ambit_io::read_file(&canonical, &self.ctx.io_thresholds).await?;
        let content = String::from_utf8(bytes)
            .map_err(|e| anyhow::anyhow!("'{}' is not valid UTF-8: {e}", canonical.display()))?;

        let (count, lines) = if regex {
            let re = self.ctx.regex_cache.get_or_compile(pattern)?;
            let count = re.find_iter(&content).count();
            let lines = show_lines.then(|| matching_line_numbers_regex(&content, &re));
            (count, lines)
        } else {
            let count = ambit_edit::count_all_tiers(&content, pattern);
            let lines = show_lines.then(|| matching_line_numbers_literal(&content, pattern));
            (count, lines)
        };

        Ok(CallToolResult::text(
            json!({ "count": count, "matching_lines": lines }).to_string(),
        ))
    }
}

fn matching_line_numbers_literal(content: &str, pattern: &str) -> Vec<usize> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| line.contains(pattern))
        .map(|(idx, _)| idx + 1)
        .collect()
}

fn matching_line_numbers_regex(content: &str, re: &regex::Regex) -> Vec<usize> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| re.is_match(line))
        .map(|(idx, _)| idx + 1)
        .collect()
}

pub struct AnalyzeEditTool {
    ctx: Arc<ToolContext>,
}

impl AnalyzeEditTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for AnalyzeEditTool {
    fn tool(&self) -> Tool {
        Tool::new("analyze_edit", "Dry-run an edit's change impact without mutating the file").with_schema(
            ToolInputSchema::object()
                .property("path", PropertySchema::string().description("File the edit would target"))
                .property("old_text", PropertySchema::string().description("Text that would be located"))
                .property("new_text", PropertySchema::string().description("Text it would be replaced with"))
                .required(vec!["path", "old_text", "new_text"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let path = args::require_path(&arguments, "path")?;
        let old_text = args::require_str(&arguments, "old_text")?;
        let new_text = args::require_str(&arguments, "new_text")?;

        let impact = self.ctx.edit_pipeline.analyze(&path, old_text, new_text).await?;
        Ok(CallToolResult::text(serde_json::to_string_pretty(&impact)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambit_backup::BackupManager;
    use ambit_cache::ContentCache;
    use ambit_sandbox::Boundary;

    fn ctx_for(root: &std::path::Path) -> Arc<ToolContext> {
        let boundary = Arc::new(Boundary::new(vec![root.to_path_buf()]).unwrap());
        let cache = Arc::new(ContentCache::default());
        let backups = Arc::new(BackupManager::with_defaults(root.join(".backups")));
        Arc::new(ToolContext::new(boundary, cache, backups))
    }

    #[tokio::test]
    async fn edit_file_applies_unique_replacement() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "let x = 1;\n").await.unwrap();

        let tool = EditFileTool::new(ctx_for(tmp.path()));
        let result = tool.execute(json!({"path": file, "old_text": "x", "new_text": "y"})).await.unwrap();
        assert!(!result.is_error());
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "let y = 1;\n");
    }

    #[tokio::test]
    async fn multi_edit_applies_both_pairs() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "foo bar\n").await.unwrap();

        let tool = MultiEditTool::new(ctx_for(tmp.path()));
        let result = tool
            .execute(json!({
                "path": file,
                "edits": [
                    {"old_text": "foo", "new_text": "FOO"},
                    {"old_text": "bar", "new_text": "BAR"},
                ]
            }))
            .await
            .unwrap();
        assert!(!result.is_error());
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "FOO BAR\n");
    }

    #[tokio::test]
    async fn count_occurrences_counts_literal_matches() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "a a a\n").await.unwrap();

        let tool = CountOccurrencesTool::new(ctx_for(tmp.path()));
        let result = tool.execute(json!({"path": file, "pattern": "a"})).await.unwrap();
        let parsed: Value = serde_json::from_str(result.content[0].as_text().unwrap()).unwrap();
        assert_eq!(parsed["count"], 3);
    }

    #[tokio::test]
    async fn analyze_edit_does_not_mutate() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "hello world\n").await.unwrap();

        let tool = AnalyzeEditTool::new(ctx_for(tmp.path()));
        tool.execute(json!({"path": file, "old_text": "hello", "new_text": "goodbye"})).await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "hello world\n");
    }

    #[tokio::test]
    async fn replace_nth_occurrence_picks_last() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "a a a\n").await.unwrap();

        let tool = ReplaceNthOccurrenceTool::new(ctx_for(tmp.path()));
        tool.execute(json!({"path": file, "pattern": "a", "new_text": "Z", "occurrence": -1}))
            .await
            .unwrap();
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "a a Z\n");
    }
}
