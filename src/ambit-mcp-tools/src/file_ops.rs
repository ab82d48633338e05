//! `read_file`, `read_file_range`, `write_file`, `read_base64`,
//! `write_base64` -- the plain-I/O tools layered directly over C1/C3.

use std::sync::Arc;

use ambit_mcp_server::ToolHandler;
use ambit_mcp_types::{CallToolResult, PropertySchema, Tool, ToolInputSchema};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};

use crate::args;
use crate::context::ToolContext;

async fn load_text(ctx: &ToolContext, path: &std::path::Path) -> Result<(std::path::PathBuf, String)> {
    let canonical = ctx.boundary.validate(path)?;
    let metadata = tokio::fs::metadata(&canonical)
        .await
        .map_err(|_| anyhow!("'{}' does not exist", canonical.display()))?;
    if metadata.is_dir() {
        bail!("'{}' is a directory, not a file", canonical.display());
    }
    let (bytes, _mode) = ambit_io::read_file(&canonical, &ctx.io_thresholds).await?;
    let content = String::from_utf8(bytes).map_err(|e| anyhow!("'{}' is not valid UTF-8: {e}", canonical.display()))?;
    Ok((canonical, content))
}

/// Slice `content` down to at most `max_lines` lines from the requested end.
fn excerpt(content: &str, max_lines: Option<usize>, mode: &str) -> Result<(String, bool)> {
    let Some(max_lines) = max_lines else {
        return Ok((content.to_string(), false));
    };
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() <= max_lines {
        return Ok((content.to_string(), false));
    }
    let selected: Vec<&str> = match mode {
        "head" | "all" => lines[..max_lines].to_vec(),
        "tail" => lines[lines.len() - max_lines..].to_vec(),
        other => bail!("unknown mode '{other}': expected one of head, tail, all"),
    };
    Ok((selected.join("\n"), true))
}

pub struct ReadFileTool {
    ctx: Arc<ToolContext>,
}

impl ReadFileTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for ReadFileTool {
    fn tool(&self) -> Tool {
        Tool::new("read_file", "Read a file's contents, optionally truncated to its head or tail").with_schema(
            ToolInputSchema::object()
                .property("path", PropertySchema::string().description("Path to read"))
                .property(
                    "max_lines",
                    PropertySchema::integer().description("Maximum number of lines to return").min(1.0),
                )
                .property(
                    "mode",
                    PropertySchema::string()
                        .description("Which end of the file max_lines keeps")
                        .enum_values(vec!["head", "tail", "all"]),
                )
                .required(vec!["path"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let path = args::require_path(&arguments, "path")?;
        let max_lines = arguments.get("max_lines").and_then(Value::as_u64).map(|n| n as usize);
        let mode = args::opt_str(&arguments, "mode").unwrap_or("all");

        let (canonical, content) = load_text(&self.ctx, &path).await?;
        let total_lines = content.lines().count();
        let (shown, truncated) = excerpt(&content, max_lines, mode)?;

        let mut text = shown;
        if truncated {
            text.push_str(&format!(
                "\n... truncated ({mode}, showing {} of {total_lines} lines) ...",
                max_lines.unwrap_or(total_lines)
            ));
        }
        let _ = &canonical;
        Ok(CallToolResult::text(text))
    }
}

pub struct ReadFileRangeTool {
    ctx: Arc<ToolContext>,
}

impl ReadFileRangeTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for ReadFileRangeTool {
    fn tool(&self) -> Tool {
        Tool::new("read_file_range", "Read an exact, 1-indexed inclusive line range from a file").with_schema(
            ToolInputSchema::object()
                .property("path", PropertySchema::string().description("Path to read"))
                .property("start_line", PropertySchema::integer().description("First line to return (1-indexed)").min(1.0))
                .property("end_line", PropertySchema::integer().description("Last line to return (inclusive)").min(1.0))
                .required(vec!["path", "start_line", "end_line"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let path = args::require_path(&arguments, "path")?;
        let start_line = args::require_usize(&arguments, "start_line")?;
        let end_line = args::require_usize(&arguments, "end_line")?;
        if start_line == 0 || end_line == 0 {
            bail!("start_line and end_line are 1-indexed; 0 is not a valid line number");
        }
        if start_line > end_line {
            bail!("start_line ({start_line}) must not exceed end_line ({end_line})");
        }

        let canonical = self.ctx.boundary.validate(&path)?;
        let lines = ambit_io::read_line_range(&canonical, start_line, end_line).await?;
        Ok(CallToolResult::text(lines.join("\n")))
    }
}

pub struct WriteFileTool {
    ctx: Arc<ToolContext>,
}

impl WriteFileTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for WriteFileTool {
    fn tool(&self) -> Tool {
        Tool::new("write_file", "Atomically write content to a file, creating parent directories as needed").with_schema(
            ToolInputSchema::object()
                .property("path", PropertySchema::string().description("Path to write"))
                .property("content", PropertySchema::string().description("Full content to write"))
                .required(vec!["path", "content"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let path = args::require_path(&arguments, "path")?;
        let content = args::require_str(&arguments, "content")?;

        let canonical = self.ctx.boundary.validate(&path)?;
        ambit_io::atomic_write(&canonical, content.as_bytes()).await?;
        self.ctx.content_cache.invalidate(&canonical);

        Ok(CallToolResult::text(format!(
            "wrote {} bytes to {}",
            content.len(),
            canonical.display()
        )))
    }
}

pub struct ReadBase64Tool {
    ctx: Arc<ToolContext>,
}

impl ReadBase64Tool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for ReadBase64Tool {
    fn tool(&self) -> Tool {
        Tool::new("read_base64", "Read a file's raw bytes, base64-encoded, for binary transport").with_schema(
            ToolInputSchema::object()
                .property("path", PropertySchema::string().description("Path to read"))
                .required(vec!["path"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let path = args::require_path(&arguments, "path")?;
        let canonical = self.ctx.boundary.validate(&path)?;
        let metadata = tokio::fs::metadata(&canonical)
            .await
            .map_err(|_| anyhow!("'{}' does not exist", canonical.display()))?;
        if metadata.is_dir() {
            bail!("'{}' is a directory, not a file", canonical.display());
        }
        let (bytes, _mode) = ambit_io::read_file(&canonical, &self.ctx.io_thresholds).await?;
        Ok(CallToolResult::text(json!({
            "path": canonical,
            "size": bytes.len(),
            "content_b64": BASE64.encode(&bytes),
        })
        .to_string()))
    }
}

pub struct WriteBase64Tool {
    ctx: Arc<ToolContext>,
}

impl WriteBase64Tool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ToolHandler for WriteBase64Tool {
    fn tool(&self) -> Tool {
        Tool::new("write_base64", "Write base64-encoded bytes to a file, for binary transport").with_schema(
            ToolInputSchema::object()
                .property("path", PropertySchema::string().description("Path to write"))
                .property("content_b64", PropertySchema::string().description("Base64-encoded bytes to write"))
                .required(vec!["path", "content_b64"]),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let path = args::require_path(&arguments, "path")?;
        let content_b64 = args::require_str(&arguments, "content_b64")?;
        let bytes = BASE64
            .decode(content_b64)
            .map_err(|e| anyhow!("content_b64 is not valid base64: {e}"))?;

        let canonical = self.ctx.boundary.validate(&path)?;
        ambit_io::atomic_write(&canonical, &bytes).await?;
        self.ctx.content_cache.invalidate(&canonical);

        Ok(CallToolResult::text(format!(
            "wrote {} bytes to {}",
            bytes.len(),
            canonical.display()
        )))
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
    async fn read_file_head_truncates() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "one\ntwo\nthree\nfour\n").await.unwrap();

        let tool = ReadFileTool::new(ctx_for(tmp.path()));
        let result = tool
            .execute(json!({"path": file, "max_lines": 2, "mode": "head"}))
            .await
            .unwrap();
        let text = result.content[0].as_text().unwrap();
        assert!(text.starts_with("one\ntwo"));
        assert!(text.contains("truncated"));
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("nested").join("a.txt");

        let ctx = ctx_for(tmp.path());
        WriteFileTool::new(Arc::clone(&ctx))
            .execute(json!({"path": file, "content": "hello"}))
            .await
            .unwrap();

        let result = ReadFileTool::new(ctx).execute(json!({"path": file})).await.unwrap();
        assert_eq!(result.content[0].as_text(), Some("hello"));
    }

    #[tokio::test]
    async fn base64_round_trips_binary_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.bin");
        let ctx = ctx_for(tmp.path());

        let encoded = BASE64.encode([0u8, 159, 1, 255]);
        WriteBase64Tool::new(Arc::clone(&ctx))
            .execute(json!({"path": file, "content_b64": encoded}))
            .await
            .unwrap();

        let result = ReadBase64Tool::new(ctx).execute(json!({"path": file})).await.unwrap();
        let text = result.content[0].as_text().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["content_b64"].as_str().unwrap(), encoded);
    }

    #[tokio::test]
    async fn read_file_range_returns_inclusive_window() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        tokio::fs::write(&file, "one\ntwo\nthree\nfour\nfive\n").await.unwrap();

        let tool = ReadFileRangeTool::new(ctx_for(tmp.path()));
        let result = tool
            .execute(json!({"path": file, "start_line": 2, "end_line": 4}))
            .await
            .unwrap();
        assert_eq!(result.content[0].as_text(), Some("two\nthree\nfour"));
    }
}
