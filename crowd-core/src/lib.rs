//! Core library for crowd monorepo orchestration.

pub mod config;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod package;
pub mod process;
pub mod reporter;
pub mod scanner;
pub mod walker;
pub mod workspace;

pub use config::WorkspaceConfig;
pub use error::{Error, Result, TaskFailure};
pub use graph::{DependencyGraph, GraphNode};
pub use manifest::PackageManifest;
pub use package::Package;
pub use reporter::{NoopReporter, WalkReporter};
pub use scanner::Scanner;
pub use walker::{GraphResult, GraphWalker, TaskStatus, WalkReport};
pub use workspace::{RunSummary, Workspace};
