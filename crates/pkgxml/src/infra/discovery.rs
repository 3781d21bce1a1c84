//! Locating candidate manifest files under directory roots.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::infra::config::Config;

const MANIFEST_SUFFIX: &str = ".xml";
const SIDECAR_SUFFIX: &str = "-meta.xml";

/// Walks directory roots and yields every `.xml` file that is not a `-meta.xml` sidecar.
///
/// Each root is traversed depth-first with entries sorted by file name, so the order is stable
/// between runs.
#[derive(Debug, Clone)]
pub struct ManifestDiscovery {
    exclude: Arc<GlobSet>,
}

impl ManifestDiscovery {
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_excludes(&config.discovery.exclude)
    }

    pub fn with_excludes(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            for expanded in expand_dir_pattern(pattern) {
                let glob = Glob::new(&expanded)
                    .with_context(|| format!("invalid discovery exclude pattern '{pattern}'"))?;
                builder.add(glob);
            }
        }
        let exclude = builder
            .build()
            .context("failed to build discovery exclude matcher")?;
        Ok(Self {
            exclude: Arc::new(exclude),
        })
    }

    /// Candidate manifests under every root, roots visited in the given order.
    pub fn discover(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for root in roots {
            found.extend(self.discover_root(root)?);
        }
        Ok(found)
    }

    fn discover_root(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            bail!("{} is not a directory", root.display());
        }

        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        let base = root.to_path_buf();
        let exclude = Arc::clone(&self.exclude);
        builder.filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let rel = entry.path().strip_prefix(&base).unwrap_or(entry.path());
            !exclude.is_match(rel)
        });

        let mut files = Vec::new();
        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, root = %root.display(), "discovery error");
                    continue;
                }
            };
            let is_file = entry.file_type().is_some_and(|kind| kind.is_file());
            if is_file && is_manifest_candidate(entry.path()) {
                files.push(entry.into_path());
            }
        }

        tracing::debug!(root = %root.display(), count = files.len(), "discovered manifests");
        Ok(files)
    }
}

/// `.xml` files qualify unless they are `-meta.xml` sidecars.
pub fn is_manifest_candidate(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(MANIFEST_SUFFIX) && !name.ends_with(SIDECAR_SUFFIX))
}

fn expand_dir_pattern(raw: &str) -> Vec<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    vec![
        trimmed.to_owned(),
        format!("{trimmed}/**"),
        format!("**/{trimmed}"),
        format!("**/{trimmed}/**"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|path| {
                path.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn yields_xml_files_but_not_meta_sidecars() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("src/classes"))?;
        fs::write(root.join("package.xml"), "<Package/>")?;
        fs::write(root.join("src/classes/Foo.cls"), "public class Foo {}")?;
        fs::write(root.join("src/classes/Foo.cls-meta.xml"), "<ApexClass/>")?;
        fs::write(root.join("src/destructiveChanges.xml"), "<Package/>")?;

        let discovery = ManifestDiscovery::with_excludes(&[])?;
        let files = discovery.discover(&[root.to_path_buf()])?;

        assert_eq!(
            relative(root, &files),
            ["package.xml", "src/destructiveChanges.xml"]
        );
        Ok(())
    }

    #[test]
    fn traversal_order_is_sorted_and_stable() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        for name in ["c.xml", "a.xml", "b.xml"] {
            fs::write(root.join(name), "<Package/>")?;
        }

        let discovery = ManifestDiscovery::with_excludes(&[])?;
        let first = discovery.discover(&[root.to_path_buf()])?;
        let second = discovery.discover(&[root.to_path_buf()])?;

        assert_eq!(relative(root, &first), ["a.xml", "b.xml", "c.xml"]);
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn respects_exclude_patterns() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("node_modules/pkg"))?;
        fs::write(root.join("node_modules/pkg/package.xml"), "<Package/>")?;
        fs::write(root.join("package.xml"), "<Package/>")?;

        let discovery = ManifestDiscovery::with_excludes(&["node_modules/".to_owned()])?;
        let files = discovery.discover(&[root.to_path_buf()])?;

        assert_eq!(relative(root, &files), ["package.xml"]);
        Ok(())
    }

    #[test]
    fn missing_root_is_an_error() {
        let discovery = ManifestDiscovery::with_excludes(&[]).unwrap();
        assert!(
            discovery
                .discover(&[PathBuf::from("/definitely/not/here")])
                .is_err()
        );
    }
}
