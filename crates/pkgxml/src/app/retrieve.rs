//! Planning a retrieve of the components listed in a manifest.
//!
//! The retrieval itself is done by an external tool; this module only produces the request it
//! consumes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::app::manifest::read_manifest;
use crate::domain::model::{ApiVersion, TypeSet};
use crate::infra::prompt::{Prompter, prompt_output_path};

const EXTRACT_LABEL: &str = "Input ExtractedTo Path";

/// Request handed to the retrieval tool as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrieveRequest {
    pub types: TypeSet,
    pub extract_to: PathBuf,
    pub api_version: ApiVersion,
}

/// `<manifest dir>/<project>-<manifest stem>-<YYYYmmddHHMM>`.
pub fn default_extract_to(
    manifest_path: &Path,
    project_name: &str,
    now: OffsetDateTime,
) -> Result<PathBuf> {
    let stem = manifest_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let timestamp = now.format(format_description!(
        "[year][month][day][hour][minute]"
    ))?;
    let dir = manifest_path.parent().unwrap_or_else(|| Path::new(""));
    Ok(dir.join(format!("{project_name}-{stem}-{timestamp}")))
}

/// Read the manifest and ask where the retrieved components should be extracted.
///
/// Unlike combining, a manifest that fails to parse is an error. Returns `None` when the user
/// gives up on the extract path, which must be absolute.
pub fn plan_retrieve<P: Prompter + ?Sized>(
    manifest_path: &Path,
    project_name: &str,
    api_version: ApiVersion,
    prompter: &mut P,
    now: OffsetDateTime,
) -> Result<Option<RetrieveRequest>> {
    let types = read_manifest(manifest_path)?
        .with_context(|| format!("cannot retrieve {}", manifest_path.display()))?;

    let default = default_extract_to(manifest_path, project_name, now)?;
    let Some(extract_to) = prompt_output_path(
        prompter,
        EXTRACT_LABEL,
        &default.display().to_string(),
        |value| Path::new(value).is_absolute(),
    )?
    else {
        tracing::info!("retrieve cancelled");
        return Ok(None);
    };

    Ok(Some(RetrieveRequest {
        types,
        extract_to: PathBuf::from(extract_to),
        api_version,
    }))
}

/// Build a request for an extract directory chosen up front.
pub fn request_with_extract_to(
    manifest_path: &Path,
    extract_to: &Path,
    api_version: ApiVersion,
) -> Result<RetrieveRequest> {
    if !extract_to.is_absolute() {
        bail!("extract path must be absolute: {}", extract_to.display());
    }
    let types = read_manifest(manifest_path)?
        .with_context(|| format!("cannot retrieve {}", manifest_path.display()))?;
    Ok(RetrieveRequest {
        types,
        extract_to: extract_to.to_path_buf(),
        api_version,
    })
}

/// Local time when the offset is known, UTC otherwise.
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
