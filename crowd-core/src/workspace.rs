//! Workspace-wide operations built on the dependency graph.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::config::WorkspaceConfig;
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::manifest::PackageManifest;
use crate::package::Package;
use crate::process::{exec_process, run_lifecycle};
use crate::reporter::WalkReporter;
use crate::scanner::Scanner;
use crate::walker::{GraphResult, GraphWalker};

/// Attaches the package to a failed process.
fn package_failure(package: &Package, error: Error) -> Error {
    match error {
        Error::Execution { code, stderr } => Error::PackageScript {
            package: package.name.clone(),
            code,
            stderr,
        },
        other => other,
    }
}

/// Counts of a run across all packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Packages the operation applied to.
    pub ran: usize,
    /// Packages left out up front.
    pub skipped: usize,
}

/// A monorepo: its configuration, its packages and the optional root manifest.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    config: WorkspaceConfig,
    packages: IndexMap<String, Package>,
    root_manifest: Option<PackageManifest>,
}

impl Workspace {
    /// Loads `crowd.toml`, the root `package.json` and every package below the
    /// configured packages directory.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let config = WorkspaceConfig::load(&root)?;
        let packages = Scanner::new(config.packages_path(&root))
            .with_max_depth(config.scan_depth)
            .scan_as_map()?;
        let root_manifest = PackageManifest::read_optional(&root)?;

        tracing::debug!(root = %root.display(), packages = packages.len(), "loaded workspace");

        Ok(Self::from_parts(root, config, packages, root_manifest))
    }

    pub fn from_parts(
        root: PathBuf,
        config: WorkspaceConfig,
        packages: IndexMap<String, Package>,
        root_manifest: Option<PackageManifest>,
    ) -> Self {
        Self {
            root,
            config,
            packages,
            root_manifest,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn packages(&self) -> &IndexMap<String, Package> {
        &self.packages
    }

    /// Builds a fresh dependency graph of the workspace packages.
    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::new(self.packages.clone())
    }

    /// Package names in registry order, or dependencies first when
    /// `toposort` is set.
    pub fn list_packages(&self, toposort: bool) -> Result<Vec<String>> {
        if !toposort {
            return Ok(self.packages.keys().cloned().collect());
        }
        self.graph().build_order()
    }

    /// Runs `script` in the workspace root if the root manifest declares it.
    ///
    /// Returns whether the script ran.
    pub async fn run_script_in_root<S>(&self, script: &str, args: &[S]) -> Result<bool>
    where
        S: AsRef<str> + Sync,
    {
        let declared = self
            .root_manifest
            .as_ref()
            .map(|manifest| manifest.has_script(script))
            .unwrap_or(false);
        if !declared {
            return Ok(false);
        }

        tracing::debug!(script, "running script in workspace root");
        run_lifecycle(&self.config.script_runner, &self.root, script, args).await?;
        Ok(true)
    }

    /// Runs `script` in every package that declares it, dependencies first.
    ///
    /// Packages without the script are reported as skipped and resolve as
    /// successful for their dependents. When no package declares the script
    /// nothing runs and the summary has `ran == 0`.
    ///
    /// # Errors
    ///
    /// Returns the cycle error before running anything if the packages depend
    /// on each other in a loop, or [`Error::GraphWalk`] once every package
    /// settled if at least one script failed.
    pub async fn run_script_in_all_packages<S>(
        &self,
        script: &str,
        args: &[S],
        reporter: &dyn WalkReporter,
    ) -> Result<RunSummary>
    where
        S: AsRef<str> + Sync,
    {
        let graph = self.graph();
        graph.check_cycles()?;

        let skip_packages = graph.filter(|package| !package.has_script(script));
        let summary = RunSummary {
            ran: graph.len() - skip_packages.len(),
            skipped: skip_packages.len(),
        };
        if summary.ran == 0 {
            return Ok(summary);
        }

        let skipped = GraphResult::skipped(Some("script not found".to_string()));
        for package in &skip_packages {
            reporter.task_finished(package, &skipped);
        }

        let runner = self.config.script_runner.as_str();
        GraphWalker::new(&graph)
            .with_skip(skip_packages.iter().map(|package| package.name.clone()))
            .on_task_failure(move |package, result| reporter.task_failed(package, result))
            .walk(move |package| async move {
                reporter.task_started(package);
                match run_lifecycle(runner, &package.path, script, args).await {
                    Ok(_) => {
                        let result = GraphResult::success();
                        reporter.task_finished(package, &result);
                        Ok(result)
                    }
                    Err(e) => Err(package_failure(package, e)),
                }
            })
            .await?;

        Ok(summary)
    }

    /// Runs `script` in every package, then in the workspace root.
    pub async fn run_script_in_all_packages_with_root<S>(
        &self,
        script: &str,
        args: &[S],
        reporter: &dyn WalkReporter,
    ) -> Result<RunSummary>
    where
        S: AsRef<str> + Sync,
    {
        let summary = self
            .run_script_in_all_packages(script, args, reporter)
            .await?;
        self.run_script_in_root(script, args).await?;
        Ok(summary)
    }

    /// Publishes every public package one at a time, dependencies first.
    ///
    /// Prerelease versions are published under the configured dist tag;
    /// `prerelease` overrides the detection from the current version. The
    /// root `prepare`, `prepublishOnly`, `publish` and `postpublish` scripts
    /// run around the packages.
    pub async fn publish_all_packages(
        &self,
        prerelease: Option<bool>,
        reporter: &dyn WalkReporter,
    ) -> Result<RunSummary> {
        let prerelease = match prerelease {
            Some(prerelease) => prerelease,
            None => self.config.is_prerelease()?,
        };

        let mut publish_args = vec!["publish"];
        if prerelease {
            publish_args.push("--tag");
            publish_args.push(self.config.prerelease_dist_tag.as_str());
        }

        let no_args: &[&str] = &[];
        self.run_script_in_root("prepare", no_args).await?;
        self.run_script_in_root("prepublishOnly", no_args).await?;

        let graph = self.graph();
        let private_packages = graph.filter(|package| package.private);
        let summary = RunSummary {
            ran: graph.len() - private_packages.len(),
            skipped: private_packages.len(),
        };

        let skipped = GraphResult::skipped(Some("private package".to_string()));
        for package in &private_packages {
            reporter.task_finished(package, &skipped);
        }

        let runner = self.config.script_runner.as_str();
        let publish_args = publish_args.as_slice();
        GraphWalker::new(&graph)
            .with_skip(private_packages.iter().map(|package| package.name.clone()))
            .on_task_failure(move |package, result| reporter.task_failed(package, result))
            .walk_linear(move |package| async move {
                reporter.task_started(package);
                match exec_process(runner, publish_args, &package.path).await {
                    Ok(_) => {
                        let result = GraphResult::success();
                        reporter.task_finished(package, &result);
                        Ok(result)
                    }
                    Err(e) => Err(package_failure(package, e)),
                }
            })
            .await?;

        self.run_script_in_root("publish", no_args).await?;
        self.run_script_in_root("postpublish", no_args).await?;
        Ok(summary)
    }
}
