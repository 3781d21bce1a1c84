//! Selection state persisted per editing target.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::model::TypeSet;

const SESSION_DIR: &str = ".pkgxml";
const SESSION_FILE: &str = "session.json";

/// Selection and cursor for one target manifest.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub selection: TypeSet,
    /// Listing index highlighted when the panel was last open.
    #[serde(default)]
    pub selected_index: usize,
}

/// Persists snapshots keyed by target to `.pkgxml/session.json`.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
    path: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let path = root.join(SESSION_DIR).join(SESSION_FILE);
        Self { root, path }
    }

    /// Location of the persisted session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot stored for `target`, if any.
    pub fn load(&self, target: &str) -> Result<Option<SessionSnapshot>> {
        Ok(self.load_all()?.remove(target))
    }

    /// Replace the snapshot for `target`, keeping every other target's entry.
    pub fn save(&self, target: &str, snapshot: &SessionSnapshot) -> Result<()> {
        let mut all = self.load_all()?;
        all.insert(target.to_owned(), snapshot.clone());

        let dir = self.path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create session directory {}", dir.display()))?;

        let data =
            serde_json::to_string_pretty(&all).context("failed to serialize session snapshot")?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write session file to {}", self.path.display()))?;
        tracing::debug!(%target, path = %self.path.display(), "session saved");
        Ok(())
    }

    fn load_all(&self) -> Result<BTreeMap<String, SessionSnapshot>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read session file at {}", self.path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid session data in {}", self.path.display()))
    }
}

/// Session key for a manifest path.
pub fn target_key(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(member: &str, index: usize) -> SessionSnapshot {
        let mut selection = TypeSet::new();
        selection.insert_type("ApexClass", [member]);
        SessionSnapshot {
            selection,
            selected_index: index,
        }
    }

    #[test]
    fn missing_file_loads_nothing() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let store = SessionStore::new(temp.path());
        assert_eq!(store.load("package.xml")?, None);
        Ok(())
    }

    #[test]
    fn targets_are_kept_apart() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let store = SessionStore::new(temp.path());

        store.save("a/package.xml", &snapshot("Foo", 1))?;
        store.save("b/package.xml", &snapshot("Bar", 3))?;
        store.save("a/package.xml", &snapshot("Baz", 2))?;

        assert_eq!(store.load("a/package.xml")?, Some(snapshot("Baz", 2)));
        assert_eq!(store.load("b/package.xml")?, Some(snapshot("Bar", 3)));
        assert!(store.path().starts_with(temp.path().join(SESSION_DIR)));
        Ok(())
    }

    #[test]
    fn missing_index_defaults_to_zero() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let store = SessionStore::new(temp.path());
        fs::create_dir_all(temp.path().join(SESSION_DIR))?;
        fs::write(
            store.path(),
            r#"{"package.xml": {"selection": {"ApexPage": ["Home"]}}}"#,
        )?;

        let loaded = store.load("package.xml")?.unwrap();
        assert_eq!(loaded.selected_index, 0);
        assert!(loaded.selection.contains_member("ApexPage", "Home"));
        Ok(())
    }
}
