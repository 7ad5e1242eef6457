//! Package data model.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Represents a package in the monorepo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub path: PathBuf,
    pub version: Option<String>,
    /// Combined dependency names, internal and external alike.
    #[serde(
        deserialize_with = "deserialize_deps",
        serialize_with = "serialize_deps"
    )]
    pub deps: SmallVec<[String; 4]>,
    #[serde(default)]
    pub scripts: IndexMap<String, String>,
    #[serde(default)]
    pub private: bool,
}

fn deserialize_deps<'de, D>(deserializer: D) -> Result<SmallVec<[String; 4]>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let vec: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(SmallVec::from_vec(vec))
}

fn serialize_deps<S>(deps: &SmallVec<[String; 4]>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let vec: Vec<&String> = deps.iter().collect();
    vec.serialize(serializer)
}

impl Package {
    pub fn new(name: String, path: PathBuf, deps: Vec<String>) -> Self {
        Self {
            name,
            path,
            version: None,
            deps: SmallVec::from_vec(deps),
            scripts: IndexMap::new(),
            private: false,
        }
    }

    pub fn with_script(mut self, name: impl Into<String>, command: impl Into<String>) -> Self {
        self.scripts.insert(name.into(), command.into());
        self
    }

    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    #[inline]
    pub fn get_script(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).map(String::as_str)
    }

    #[inline]
    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }
}
