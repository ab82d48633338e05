//! Wires the filesystem core crates (sandbox, tiered I/O, cache, search,
//! risk, edit pipeline, backup store, batch and pipeline executors) to the
//! MCP protocol layer as a fixed set of [`ToolHandler`] implementations.

mod args;
mod backup_ops;
mod batch_ops;
mod context;
mod edit_ops;
mod file_ops;
mod pipeline_ops;
mod search_ops;

use std::sync::Arc;

use ambit_mcp_server::ToolHandler;

pub use backup_ops::{CleanupBackupsTool, CompareWithBackupTool, GetBackupInfoTool, ListBackupsTool, RestoreBackupTool};
pub use batch_ops::BatchOperationsTool;
pub use context::{ResponseLimits, ToolContext};
pub use edit_ops::{AnalyzeEditTool, CountOccurrencesTool, EditFileTool, MultiEditTool, ReplaceNthOccurrenceTool};
pub use file_ops::{ReadBase64Tool, ReadFileRangeTool, ReadFileTool, WriteBase64Tool, WriteFileTool};
pub use pipeline_ops::ExecutePipelineTool;
pub use search_ops::{AdvancedTextSearchTool, SmartSearchTool};

/// Instantiate every tool handler over a shared [`ToolContext`], in the
/// order they are listed in the tool surface.
pub fn build_tool_handlers(ctx: Arc<ToolContext>) -> Vec<Arc<dyn ToolHandler>> {
    vec![
        Arc::new(ReadFileTool::new(Arc::clone(&ctx))),
        Arc::new(ReadFileRangeTool::new(Arc::clone(&ctx))),
        Arc::new(WriteFileTool::new(Arc::clone(&ctx))),
        Arc::new(ReadBase64Tool::new(Arc::clone(&ctx))),
        Arc::new(WriteBase64Tool::new(Arc::clone(&ctx))),
        Arc::new(EditFileTool::new(Arc::clone(&ctx))),
        Arc::new(MultiEditTool::new(Arc::clone(&ctx))),
        Arc::new(ReplaceNthOccurrenceTool::new(Arc::clone(&ctx))),
        Arc::new(CountOccurrencesTool::new(Arc::clone(&ctx))),
        Arc::new(AnalyzeEditTool::new(Arc::clone(&ctx))),
        Arc::new(SmartSearchTool::new(Arc::clone(&ctx))),
        Arc::new(AdvancedTextSearchTool::new(Arc::clone(&ctx))),
        Arc::new(BatchOperationsTool::new(Arc::clone(&ctx))),
        Arc::new(ExecutePipelineTool::new(Arc::clone(&ctx))),
        Arc::new(ListBackupsTool::new(Arc::clone(&ctx))),
        Arc::new(GetBackupInfoTool::new(Arc::clone(&ctx))),
        Arc::new(CompareWithBackupTool::new(Arc::clone(&ctx))),
        Arc::new(RestoreBackupTool::new(Arc::clone(&ctx))),
        Arc::new(CleanupBackupsTool::new(ctx)),
    ]
}
