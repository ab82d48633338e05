//! `smart_search` and `advanced_text_search` -- the two-tier Search Engine
//! (C5) surfaced as tools, with coordinates a downstream edit tool can use
//! without re-reading the file.

use std::sync::Arc;

use ambit_mcp_server::ToolHandler;
use ambit_mcp_types::{CallToolResult, PropertySchema, Tool, ToolInputSchema};
use ambit_search::{Cancellation, ContentSearchOptions};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::args;
use crate::context::ToolContext;

pub struct SmartSearchTool {
    ctx: Arc<ToolContext>,
}

impl SmartSearchTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for SmartSearchTool {
    fn tool(&self) -> Tool {
        Tool::new(
            "smart_search",
            "Search a directory tree by fuzzy filename match, or by regex content match with line/char coordinates",
        )
        .with_schema(
            ToolInputSchema::object()
                .property("path", PropertySchema::string().description("Root directory to search under"))
                .property("pattern", PropertySchema::string().description("Fuzzy filename pattern, or regex when include_content is set"))
                .property(
                    "include_content",
                    PropertySchema::boolean().description("Search file contents by regex instead of filenames by fuzzy match"),
                )
                .property(
                    "file_types",
                    PropertySchema::array(PropertySchema::string()).description("Restrict results to these file extensions"),
                )
                .required(vec!["path", "pattern"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let root = args::require_path(&arguments, "path")?;
        let pattern = args::require_str(&arguments, "pattern")?;
        let include_content = args::opt_bool(&arguments, "include_content", false);
        let file_types: Option<Vec<String>> = arguments
            .get("file_types")
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()?;

        let canonical_root = self.ctx.boundary.validate(&root)?;
        let cancel = Cancellation::new();

        let body = if include_content {
            let mut matches = ambit_search::search_content(
                &canonical_root,
                pattern,
                &self.ctx.search_config,
                &ContentSearchOptions::default(),
                &self.ctx.regex_cache,
                &cancel,
            )?;
            if let Some(types) = &file_types {
                matches.retain(|m| extension_matches(&m.file, types));
            }
            matches.truncate(self.ctx.limits.max_search_results);
            json!({
                "matches": matches.iter().map(|m| json!({
                    "path": m.file,
                    "line": m.line_number,
                    "char_start": m.match_start,
                    "char_end": m.match_end,
                    "line_text": m.line_text,
                })).collect::<Vec<_>>(),
            })
        } else {
            let mut matches = ambit_search::search_filenames(&canonical_root, pattern, &self.ctx.search_config, &cancel);
            if let Some(types) = &file_types {
                matches.retain(|m| extension_matches(&m.path, types));
            }
            matches.truncate(self.ctx.limits.max_search_results);
            json!({
                "matches": matches.iter().map(|m| json!({ "path": m.path, "score": m.score })).collect::<Vec<_>>(),
            })
        };

        Ok(CallToolResult::text(body.to_string()))
    }
}

fn extension_matches(path: &std::path::Path, types: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| types.iter().any(|t| t.trim_start_matches('.').eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

pub struct AdvancedTextSearchTool {
    ctx: Arc<ToolContext>,
}

impl AdvancedTextSearchTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for AdvancedTextSearchTool {
    fn tool(&self) -> Tool {
        Tool::new(
            "advanced_text_search",
            "Regex content search with case sensitivity, whole-word, and surrounding-context control",
        )
        .with_schema(
            ToolInputSchema::object()
                .property("path", PropertySchema::string().description("Root directory to search under"))
                .property("pattern", PropertySchema::string().description("Regex pattern"))
                .property("case_sensitive", PropertySchema::boolean().description("Match case exactly (default: case-insensitive)"))
                .property("whole_word", PropertySchema::boolean().description("Require word boundaries around the match"))
                .property("include_context", PropertySchema::boolean().description("Include surrounding lines"))
                .property("context_lines", PropertySchema::integer().description("Lines of context on each side").min(0.0))
                .required(vec!["path", "pattern"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let root = args::require_path(&arguments, "path")?;
        let pattern = args::require_str(&arguments, "pattern")?;
        let case_sensitive = args::opt_bool(&arguments, "case_sensitive", false);
        let whole_word = args::opt_bool(&arguments, "whole_word", false);
        let include_context = args::opt_bool(&arguments, "include_context", false);
        let context_lines = if include_context { args::opt_usize(&arguments, "context_lines", 2) } else { 0 };

        let canonical_root = self.ctx.boundary.validate(&root)?;
        let cancel = Cancellation::new();
        let options = ContentSearchOptions {
            case_sensitive,
            whole_word,
            context_lines,
        };

        let mut matches = ambit_search::search_content(
            &canonical_root,
            pattern,
            &self.ctx.search_config,
            &options,
            &self.ctx.regex_cache,
            &cancel,
        )?;
        matches.truncate(self.ctx.limits.max_search_results);

        let body = json!({
            "matches": matches.iter().map(|m| json!({
                "path": m.file,
                "line": m.line_number,
                "char_start": m.match_start,
                "char_end": m.match_end,
                "line_text": m.line_text,
                "context_before": m.context_before,
                "context_after": m.context_after,
            })).collect::<Vec<_>>(),
        });
        Ok(CallToolResult::text(body.to_string()))
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
    async fn smart_search_finds_filename() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(tmp.path().join("main.rs"), "fn main() {}").await.unwrap();

        let tool = SmartSearchTool::new(ctx_for(tmp.path()));
        let result = tool.execute(json!({"path": tmp.path(), "pattern": "main"})).await.unwrap();
        let parsed: Value = serde_json::from_str(result.content[0].as_text().unwrap()).unwrap();
        assert!(!parsed["matches"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn smart_search_content_reports_coordinates() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(tmp.path().join("a.rs"), "let x = foo;\n").await.unwrap();

        let tool = SmartSearchTool::new(ctx_for(tmp.path()));
        let result = tool
            .execute(json!({"path": tmp.path(), "pattern": "foo", "include_content": true}))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(result.content[0].as_text().unwrap()).unwrap();
        let matches = parsed["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["line"], 1);
    }

    #[tokio::test]
    async fn advanced_text_search_honors_whole_word() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(tmp.path().join("a.rs"), "foobar foo\n").await.unwrap();

        let tool = AdvancedTextSearchTool::new(ctx_for(tmp.path()));
        let result = tool
            .execute(json!({"path": tmp.path(), "pattern": "foo", "whole_word": true}))
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(result.content[0].as_text().unwrap()).unwrap();
        assert_eq!(parsed["matches"].as_array().unwrap().len(), 1);
    }
}
