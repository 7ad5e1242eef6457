//! Workspace configuration loaded from `crowd.toml`.

use std::path::{Path, PathBuf};

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "crowd.toml";

fn default_packages_dir() -> PathBuf {
    PathBuf::from("packages")
}

fn default_current_version() -> String {
    "0.0.0".to_string()
}

fn default_prerelease_dist_tag() -> String {
    "next".to_string()
}

fn default_script_runner() -> String {
    "npm".to_string()
}

fn default_scan_depth() -> usize {
    2
}

/// Workspace-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory scanned for package manifests, relative to the workspace root.
    #[serde(default = "default_packages_dir")]
    pub packages_dir: PathBuf,
    /// Version shared by every package of the workspace.
    #[serde(default = "default_current_version")]
    pub current_version: String,
    /// Dist tag passed to `publish` for prerelease versions.
    #[serde(default = "default_prerelease_dist_tag")]
    pub prerelease_dist_tag: String,
    /// Program used to run package scripts and to publish.
    #[serde(default = "default_script_runner")]
    pub script_runner: String,
    #[serde(default = "default_scan_depth")]
    pub scan_depth: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            packages_dir: default_packages_dir(),
            current_version: default_current_version(),
            prerelease_dist_tag: default_prerelease_dist_tag(),
            script_runner: default_script_runner(),
            scan_depth: default_scan_depth(),
        }
    }
}

impl WorkspaceConfig {
    pub fn parse(content: &str, context: &str) -> Result<Self> {
        toml::from_str(content).map_err(|error| Error::Toml {
            error,
            context: context.to_string(),
        })
    }

    /// Loads `crowd.toml` from `root`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content, &path.display().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no workspace config, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn packages_path(&self, root: &Path) -> PathBuf {
        if self.packages_dir.is_absolute() {
            self.packages_dir.clone()
        } else {
            root.join(&self.packages_dir)
        }
    }

    pub fn version(&self) -> Result<Version> {
        Version::parse(&self.current_version).map_err(|_| Error::InvalidVersion {
            version: self.current_version.clone(),
        })
    }

    /// Whether the current version carries a prerelease component.
    pub fn is_prerelease(&self) -> Result<bool> {
        Ok(!self.version()?.pre.is_empty())
    }
}
