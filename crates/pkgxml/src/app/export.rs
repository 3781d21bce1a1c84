//! Writing rendered manifests to disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::render::ManifestRenderer;
use crate::domain::model::{ApiVersion, TypeSet, WILDCARD};
use crate::infra::prompt::{Prompter, prompt_output_path};

/// File name used for a combined manifest when the user keeps the suggested path.
pub const COMBINED_FILE_NAME: &str = "combined package.xml";
pub const PACKAGE_FILE_NAME: &str = "package.xml";

const OVERWRITE_MESSAGE: &str = "Package.xml already exists, override?";

/// Result of [`create_default_manifest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(PathBuf),
    /// The file existed and the user declined to overwrite it.
    Cancelled(PathBuf),
}

/// Write manifest text, creating parent directories as needed.
pub fn write_manifest(path: &Path, xml: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, xml)
        .with_context(|| format!("failed to write manifest to {}", path.display()))?;
    tracing::info!(path = %path.display(), "manifest written");
    Ok(())
}

/// Ask where a combined manifest should go and write it there.
///
/// `suggested` pre-fills the prompt; it defaults to `combined package.xml` in the first root.
/// Returns `None` when the user abandons the path prompt.
pub fn export_combined<P: Prompter + ?Sized>(
    xml: &str,
    suggested: &Path,
    prompter: &mut P,
) -> Result<Option<PathBuf>> {
    let default = suggested.display().to_string();
    let Some(answer) = prompt_output_path(prompter, "Input package.xml path", &default, |_| true)?
    else {
        tracing::info!("no output path given, combined manifest discarded");
        return Ok(None);
    };

    let path = PathBuf::from(answer);
    write_manifest(&path, xml)?;
    Ok(Some(path))
}

/// Default location for a combined manifest.
pub fn default_combined_path(roots: &[PathBuf]) -> PathBuf {
    roots
        .first()
        .map(|root| root.join(COMBINED_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(COMBINED_FILE_NAME))
}

/// Create `<dir>/package.xml` retrieving every Apex class.
///
/// An existing file is only replaced when `force` is set or the user confirms.
pub fn create_default_manifest<P: Prompter + ?Sized>(
    dir: &Path,
    version: ApiVersion,
    renderer: &ManifestRenderer,
    prompter: &mut P,
    force: bool,
) -> Result<CreateOutcome> {
    let path = dir.join(PACKAGE_FILE_NAME);
    if path.is_file() && !force && !prompter.confirm(OVERWRITE_MESSAGE)? {
        return Ok(CreateOutcome::Cancelled(path));
    }

    let mut types = TypeSet::new();
    types.insert_type("ApexClass", [WILDCARD]);
    let xml = renderer.render(&types, version)?;
    write_manifest(&path, &xml)?;
    Ok(CreateOutcome::Created(path))
}
