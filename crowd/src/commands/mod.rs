//! Command implementations for the CLI.

mod discovery;
mod execution;
mod progress_reporter;

use std::path::Path;

use anyhow::{Context, Result};
use crowd_core::Workspace;
use tokio::runtime::Runtime;

pub use discovery::{cmd_graph, cmd_list};
pub use execution::{cmd_publish, cmd_run};

fn load_workspace(root: &Path) -> Result<Workspace> {
    Workspace::load(root)
        .with_context(|| format!("Failed to load workspace at {}", root.display()))
}

fn create_runtime() -> Result<Runtime> {
    Runtime::new().map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))
}
