//! Combining every manifest found under a set of directories into one.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::app::manifest::read_manifest;
use crate::domain::errors::ManifestError;
use crate::domain::model::TypeSet;
use crate::infra::discovery::ManifestDiscovery;
use crate::infra::prompt::Prompter;

/// Why a candidate file did not contribute to the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Not well-formed XML; the user chose to skip it.
    Malformed(ManifestError),
    /// Well-formed, but not a package manifest.
    InvalidShape(ManifestError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedManifest {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Accumulated result of a successful combine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombineReport {
    pub types: TypeSet,
    /// Files that contributed, in processing order.
    pub merged: Vec<PathBuf>,
    pub skipped: Vec<SkippedManifest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombineOutcome {
    Combined(CombineReport),
    /// No manifest contributed any type.
    Empty(CombineReport),
    /// The user stopped at a malformed manifest; nothing should be written.
    Aborted { path: PathBuf },
}

/// Walks manifests under directory roots and merges them into one [`TypeSet`].
pub struct Combiner<'p, P: Prompter + ?Sized> {
    discovery: ManifestDiscovery,
    prompter: &'p mut P,
}

impl<'p, P: Prompter + ?Sized> Combiner<'p, P> {
    pub fn new(discovery: ManifestDiscovery, prompter: &'p mut P) -> Self {
        Self {
            discovery,
            prompter,
        }
    }

    /// Discover and combine manifests under `roots`.
    pub fn combine(&mut self, roots: &[PathBuf]) -> Result<CombineOutcome> {
        let candidates = self.discovery.discover(roots)?;
        self.combine_files(&candidates)
    }

    /// Combine an explicit, ordered list of manifest files.
    ///
    /// Malformed files ask the user whether to skip them; declining aborts the whole operation.
    /// Files that are not package manifests are skipped silently.
    pub fn combine_files(&mut self, files: &[PathBuf]) -> Result<CombineOutcome> {
        let mut report = CombineReport::default();

        for path in files {
            match read_manifest(path)? {
                Ok(types) => {
                    report.types.merge_from(&types);
                    report.merged.push(path.clone());
                }
                Err(err) if err.is_malformed() => {
                    if !self.skip_malformed(path, &err)? {
                        tracing::info!(path = %path.display(), "combine aborted");
                        return Ok(CombineOutcome::Aborted { path: path.clone() });
                    }
                    report.skipped.push(SkippedManifest {
                        path: path.clone(),
                        reason: SkipReason::Malformed(err),
                    });
                }
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "not a valid package.xml");
                    report.skipped.push(SkippedManifest {
                        path: path.clone(),
                        reason: SkipReason::InvalidShape(err),
                    });
                }
            }
        }

        tracing::debug!(
            merged = report.merged.len(),
            skipped = report.skipped.len(),
            types = report.types.len(),
            "combine finished"
        );

        if report.types.is_empty() {
            Ok(CombineOutcome::Empty(report))
        } else {
            Ok(CombineOutcome::Combined(report))
        }
    }

    fn skip_malformed(&mut self, path: &Path, err: &ManifestError) -> Result<bool> {
        let message = format!("{} parse error: {err}. Skip?", path.display());
        tracing::error!(path = %path.display(), error = %err, "manifest parse error");
        self.prompter.confirm(&message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::infra::prompt::{Answer, ScriptedPrompter};

    const FOO: &str = r#"<Package><types><members>Foo</members><name>ApexClass</name></types></Package>"#;
    const BAR_BAZ: &str = r#"<Package>
        <types><members>Bar</members><name>ApexClass</name></types>
        <types><members>Baz</members><name>ApexTrigger</name></types>
    </Package>"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn discovery() -> ManifestDiscovery {
        ManifestDiscovery::with_excludes(&[]).unwrap()
    }

    #[test]
    fn merges_members_across_manifests() -> Result<()> {
        let temp = tempfile::tempdir()?;
        write(temp.path(), "a.xml", FOO);
        write(temp.path(), "b.xml", BAR_BAZ);

        let mut prompter = ScriptedPrompter::default();
        let outcome = Combiner::new(discovery(), &mut prompter).combine(&[temp.path().to_path_buf()])?;

        let CombineOutcome::Combined(report) = outcome else {
            panic!("expected combined outcome");
        };
        let classes: Vec<_> = report.types.members("ApexClass").unwrap().iter().collect();
        assert_eq!(classes, ["Bar", "Foo"]);
        assert!(report.types.contains_member("ApexTrigger", "Baz"));
        assert_eq!(report.merged.len(), 2);
        assert!(prompter.asked().is_empty());
        Ok(())
    }

    #[test]
    fn abort_on_malformed_stops_everything() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let files = vec![
            write(temp.path(), "1.xml", FOO),
            write(temp.path(), "2.xml", "<Package><types>"),
            write(temp.path(), "3.xml", BAR_BAZ),
        ];

        let mut prompter = ScriptedPrompter::new([Answer::Confirm(false)]);
        let outcome = Combiner::new(discovery(), &mut prompter).combine_files(&files)?;

        assert_eq!(
            outcome,
            CombineOutcome::Aborted {
                path: files[1].clone()
            }
        );
        assert!(prompter.asked()[0].contains("2.xml parse error"));
        Ok(())
    }

    #[test]
    fn skip_on_malformed_continues() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let files = vec![
            write(temp.path(), "1.xml", "<Package"),
            write(temp.path(), "2.xml", FOO),
        ];

        let mut prompter = ScriptedPrompter::new([Answer::Confirm(true)]);
        let outcome = Combiner::new(discovery(), &mut prompter).combine_files(&files)?;

        let CombineOutcome::Combined(report) = outcome else {
            panic!("expected combined outcome");
        };
        assert_eq!(report.merged, [files[1].clone()]);
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::Malformed(_)
        ));
        Ok(())
    }

    #[test]
    fn invalid_shapes_are_skipped_without_asking() -> Result<()> {
        let temp = tempfile::tempdir()?;
        write(temp.path(), "layout.xml", "<Layout><layoutSections/></Layout>");
        write(
            temp.path(),
            "partial.xml",
            "<Package><types><members>Foo</members></types></Package>",
        );

        let mut prompter = ScriptedPrompter::default();
        let outcome = Combiner::new(discovery(), &mut prompter).combine(&[temp.path().to_path_buf()])?;

        let CombineOutcome::Empty(report) = outcome else {
            panic!("expected empty outcome");
        };
        assert_eq!(report.skipped.len(), 2);
        assert!(prompter.asked().is_empty());
        Ok(())
    }
}
