//! Error types and result aliases.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error in {}: {error}", .path.display())]
    Json {
        error: serde_json::Error,
        path: PathBuf,
    },

    #[error("TOML parse error in {context}: {error}")]
    Toml {
        error: toml::de::Error,
        context: String,
    },

    #[error("Invalid manifest {}: {message}", .path.display())]
    InvalidManifest { path: PathBuf, message: String },

    #[error("Duplicate package name {name}: declared in {} and {}", .first.display(), .second.display())]
    DuplicatePackage {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Package not found: {name}. Available packages: {available}")]
    PackageNotFound { name: String, available: String },

    #[error("dependency cycle detected: {}", .0.join(" -> "))]
    CycleDetected(Vec<String>),

    #[error("unknown cycle detected - this should never happen")]
    UnresolvedDependencies,

    #[error("Execution failed with exit code {code}; output:\n\n{stderr}")]
    Execution { code: i32, stderr: String },

    #[error("Script for package {package} failed with exit code {code}; output:\n\n{stderr}")]
    PackageScript {
        package: String,
        code: i32,
        stderr: String,
    },

    #[error("Task for package {package} failed: {message}")]
    Task { package: String, message: String },

    #[error("Task for package {} failed: {}", .last_failure.package, .last_failure.error)]
    GraphWalk {
        count: usize,
        last_failure: TaskFailure,
    },

    #[error("Error processing {count} packages; please check the result manually")]
    LinearWalk {
        count: usize,
        last_failure: TaskFailure,
    },

    #[error("Invalid version set in config: {version}")]
    InvalidVersion { version: String },
}

impl Error {
    /// Number of failed packages carried by an aggregate walk error.
    pub fn failure_count(&self) -> Option<usize> {
        match self {
            Error::GraphWalk { count, .. } | Error::LinearWalk { count, .. } => Some(*count),
            _ => None,
        }
    }

    /// The most recently observed package failure of an aggregate walk error.
    pub fn last_failure(&self) -> Option<&TaskFailure> {
        match self {
            Error::GraphWalk { last_failure, .. } | Error::LinearWalk { last_failure, .. } => {
                Some(last_failure)
            }
            _ => None,
        }
    }
}

/// A single package task that failed during a walk.
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub package: String,
    pub error: Arc<Error>,
}

pub type Result<T> = std::result::Result<T, Error>;
