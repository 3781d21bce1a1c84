//! The universe of metadata types known to a project, and its on-disk cache.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::domain::model::{TypeSet, WILDCARD};

const CONFIG_DIR: &str = ".config";
const CATALOG_FILE: &str = "metadata.json";
const CACHE_FILE: &str = "package.json";

/// Describe-metadata catalog persisted at `.config/metadata.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub metadata_objects: Vec<MetadataObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataObject {
    pub xml_name: String,
    #[serde(default)]
    pub child_xml_names: ChildXmlNames,
    #[serde(default)]
    pub directory_name: Option<String>,
    #[serde(default)]
    pub in_folder: bool,
}

/// `childXmlNames` is either a single name or a list of names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildXmlNames {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl ChildXmlNames {
    pub fn names(&self) -> &[String] {
        match self {
            Self::None => &[],
            Self::One(name) => std::slice::from_ref(name),
            Self::Many(names) => names,
        }
    }
}

impl Catalog {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read metadata catalog {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid metadata catalog in {}", path.display()))
    }
}

/// Every parent and child type, each selecting all of its members.
///
/// A child type listed under several parents is simply written again; all entries are `*` so
/// the last write is indistinguishable from the first.
pub fn build_universe(catalog: &Catalog) -> TypeSet {
    let mut universe = TypeSet::new();
    for object in &catalog.metadata_objects {
        universe.insert_type(object.xml_name.as_str(), [WILDCARD]);
        for child in object.child_xml_names.names() {
            universe.insert_type(child.as_str(), [WILDCARD]);
        }
    }
    universe
}

/// Cached universe at `.config/package.json`, rebuilt from the catalog on reload.
#[derive(Debug, Clone)]
pub struct UniverseCache {
    catalog_path: PathBuf,
    cache_path: PathBuf,
}

impl UniverseCache {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        let config_dir = workspace.as_ref().join(CONFIG_DIR);
        Self {
            catalog_path: config_dir.join(CATALOG_FILE),
            cache_path: config_dir.join(CACHE_FILE),
        }
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Reload and build commands are only available once the catalog exists.
    pub fn is_available(&self) -> bool {
        self.catalog_path.is_file()
    }

    /// Rebuild the universe from the catalog and persist it.
    pub fn reload(&self) -> Result<TypeSet> {
        if !self.is_available() {
            bail!(
                "metadata catalog not found at {}",
                self.catalog_path.display()
            );
        }
        let catalog = Catalog::from_file(&self.catalog_path)?;
        let universe = build_universe(&catalog);

        if let Some(dir) = self.cache_path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create cache directory {}", dir.display()))?;
        }
        let data =
            serde_json::to_string_pretty(&universe).context("failed to serialize universe")?;
        fs::write(&self.cache_path, data).with_context(|| {
            format!("failed to write universe cache {}", self.cache_path.display())
        })?;

        tracing::info!(types = universe.len(), path = %self.cache_path.display(), "universe reloaded");
        Ok(universe)
    }

    /// Read the cached universe, if any.
    pub fn load(&self) -> Result<Option<TypeSet>> {
        if !self.cache_path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.cache_path).with_context(|| {
            format!("failed to read universe cache {}", self.cache_path.display())
        })?;
        let universe = serde_json::from_str(&data)
            .with_context(|| format!("invalid universe cache in {}", self.cache_path.display()))?;
        Ok(Some(universe))
    }

    /// Cached universe, reloading from the catalog when no cache exists yet.
    pub fn load_or_reload(&self) -> Result<TypeSet> {
        match self.load()? {
            Some(universe) => Ok(universe),
            None => {
                tracing::debug!("universe cache missing, reloading");
                self.reload()
            }
        }
    }
}
