//! Repository scanner for discovering packages.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::manifest::{PackageManifest, MANIFEST_FILE};
use crate::package::Package;

/// Scans a directory for packages.
///
/// Looks for `package.json` files below the packages directory and parses
/// them into `Package` structures. `node_modules` and hidden directories are
/// never entered.
pub struct Scanner {
    packages_dir: PathBuf,
    max_depth: usize,
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| name == "node_modules" || name.starts_with('.'))
            .unwrap_or(false)
}

impl Scanner {
    pub fn new(packages_dir: impl AsRef<Path>) -> Self {
        Self {
            packages_dir: packages_dir.as_ref().to_path_buf(),
            max_depth: 2,
        }
    }

    /// Sets how deep below the packages directory manifests are searched.
    ///
    /// A manifest of a direct child directory is at depth 2.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(2);
        self
    }

    pub fn packages_dir(&self) -> &Path {
        &self.packages_dir
    }

    /// Returns every package found, sorted by name.
    pub fn scan(&self) -> Result<Vec<Package>> {
        if !self.packages_dir.is_dir() {
            tracing::warn!(
                dir = %self.packages_dir.display(),
                "packages directory does not exist"
            );
            return Ok(Vec::new());
        }

        let manifest_files: Vec<PathBuf> = WalkDir::new(&self.packages_dir)
            .max_depth(self.max_depth)
            .into_iter()
            .filter_entry(|e| !is_ignored(e))
            .filter_map(|e| e.ok())
            // `<packages_dir>/package.json` sits at depth 1 and is not a package.
            .filter(|e| e.depth() > 1 && e.file_name() == MANIFEST_FILE)
            .map(|e| e.path().to_path_buf())
            .collect();

        tracing::debug!(count = manifest_files.len(), "found package manifests");

        let packages: Result<Vec<Package>> = manifest_files
            .into_par_iter()
            .map(|manifest_path| {
                let package_dir = manifest_path
                    .parent()
                    .map(Path::to_path_buf)
                    .ok_or_else(|| Error::InvalidManifest {
                        path: manifest_path.clone(),
                        message: "manifest has no parent directory".to_string(),
                    })?;
                PackageManifest::read(&package_dir)?.into_package(package_dir)
            })
            .collect();

        let mut packages = packages?;
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(packages)
    }

    /// Returns the package registry keyed by package name.
    ///
    /// # Errors
    ///
    /// Returns an error if two manifests declare the same name.
    pub fn scan_as_map(&self) -> Result<IndexMap<String, Package>> {
        let packages = self.scan()?;
        let mut map: IndexMap<String, Package> = IndexMap::with_capacity(packages.len());
        for package in packages {
            if let Some(existing) = map.get(&package.name) {
                return Err(Error::DuplicatePackage {
                    name: package.name.clone(),
                    first: existing.path.clone(),
                    second: package.path,
                });
            }
            map.insert(package.name.clone(), package);
        }
        Ok(map)
    }
}
