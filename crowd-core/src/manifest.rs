//! `package.json` parsing.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::package::Package;

pub const MANIFEST_FILE: &str = "package.json";

/// The subset of a `package.json` manifest that crowd reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub scripts: IndexMap<String, String>,
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub peer_dependencies: IndexMap<String, String>,
}

impl PackageManifest {
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(content).map_err(|error| Error::Json {
            error,
            path: path.to_path_buf(),
        })
    }

    /// Reads the manifest inside `dir`.
    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content, &path)
    }

    /// Like [`PackageManifest::read`], but `Ok(None)` if the file does not exist.
    pub fn read_optional(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content, &path).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Names from `dependencies` then `devDependencies`, without duplicates.
    ///
    /// Peer dependencies are not part of the combined set.
    pub fn combined_dependencies(&self) -> SmallVec<[String; 4]> {
        let mut combined: SmallVec<[String; 4]> = SmallVec::new();
        for name in self
            .dependencies
            .keys()
            .chain(self.dev_dependencies.keys())
        {
            if !combined.contains(name) {
                combined.push(name.clone());
            }
        }
        combined
    }

    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    /// Converts the manifest into a [`Package`] rooted at `dir`.
    pub fn into_package(self, dir: PathBuf) -> Result<Package> {
        let deps = self.combined_dependencies();
        let name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                return Err(Error::InvalidManifest {
                    path: dir.join(MANIFEST_FILE),
                    message: "missing \"name\" field".to_string(),
                })
            }
        };

        Ok(Package {
            name,
            path: dir,
            version: self.version,
            deps,
            scripts: self.scripts,
            private: self.private,
        })
    }
}
