//! ambit-fs: a stdio MCP entry point exposing the filesystem tool surface
//! to an AI coding assistant.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use ambit_backup::BackupManager;
use ambit_cache::ContentCache;
use ambit_mcp_server::McpServerBuilder;
use ambit_mcp_tools::ToolContext;
use ambit_sandbox::Boundary;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::Config;

/// MCP filesystem tool core.
#[derive(Parser)]
#[command(name = "ambit-fs")]
#[command(about = "Local filesystem MCP tool server")]
#[command(version)]
struct Args {
    /// TOML configuration file path.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sandbox root; repeatable. Overrides allowed_paths in the config file.
    #[arg(short = 'a', long = "allow")]
    allowed_paths: Vec<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit structured JSON logs instead of human-readable text.
    #[arg(long)]
    json_logs: bool,
}

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(&args.log_level, args.json_logs);

    let config = match Config::load(args.config.as_deref(), &args.allowed_paths) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    info!(roots = ?config.allowed_paths, backup_dir = %config.backup_dir.display(), "starting ambit-fs");

    let boundary = match Boundary::new(config.allowed_paths.clone()) {
        Ok(b) => Arc::new(b),
        Err(e) => {
            error!("invalid sandbox configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let content_cache = Arc::new(ContentCache::new(config.cache_size, ambit_cache::DEFAULT_ENTRY_LIMIT_BYTES));
    let backup_manager = Arc::new(BackupManager::new(
        config.backup_dir.clone(),
        config.backup_max_age_days,
        config.backup_max_count,
    ));

    let mut ctx = ToolContext::new(boundary, content_cache, backup_manager);
    ctx.risk_thresholds = config.risk_thresholds();
    ctx.io_thresholds = config.io_thresholds();
    ctx = ctx.with_limits(config.response_limits());
    let ctx = Arc::new(ctx);

    let mut builder = McpServerBuilder::new("ambit-fs", env!("CARGO_PKG_VERSION"))
        .with_tools_capability()
        .instructions(
            "Filesystem tools for reading, editing, searching, and batching changes to files \
             under the configured sandbox roots. Prefer analyze_edit before a risky edit; \
             every destructive operation is backed up and restorable.",
        );
    for handler in ambit_mcp_tools::build_tool_handlers(ctx) {
        builder = builder.tool_handler(handler);
    }

    if let Err(e) = builder.build_and_run_stdio().await {
        error!("server error: {e:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
