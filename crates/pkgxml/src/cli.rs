//! Command line surface of the `pkgxml` binary.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::combine::{CombineOutcome, Combiner};
use crate::app::export::{
    CreateOutcome, PACKAGE_FILE_NAME, create_default_manifest, default_combined_path,
    export_combined, write_manifest,
};
use crate::app::render::ManifestRenderer;
use crate::app::retrieve::{local_now, plan_retrieve, request_with_extract_to};
use crate::app::session::SessionStore;
use crate::app::universe::UniverseCache;
use crate::domain::model::ApiVersion;
use crate::infra::config::Config;
use crate::infra::discovery::ManifestDiscovery;
use crate::infra::logging;
use crate::infra::prompt::{AssumeYes, Prompter, TerminalPrompter};
use crate::ui::app::UiApp;

#[derive(Debug, Parser)]
#[command(name = "pkgxml")]
#[command(about = "Combine, build, and edit Salesforce package.xml manifests", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Answer yes to every confirmation and accept every suggested path
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Project root holding the `.config` caches
    #[arg(long, global = true, value_name = "PATH")]
    pub workspace: Option<PathBuf>,

    /// API version written into generated manifests, e.g. 52 or 52.0
    #[arg(long, global = true, value_name = "N")]
    pub api_version: Option<ApiVersion>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge every package.xml found under the given directories
    Combine(CombineArgs),
    /// Create a package.xml retrieving all Apex classes
    Create(CreateArgs),
    /// Rebuild the metadata universe from the describe catalog
    Reload,
    /// Select types and members interactively
    Build(BuildArgs),
    /// Print a retrieve request for a package.xml as JSON
    Retrieve(RetrieveArgs),
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct CombineArgs {
    #[arg(required = true, value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Write here instead of asking for a path
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Overwrite an existing package.xml without asking
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Manifest written by the `w` key; defaults to `<workspace>/package.xml`
    #[arg(long, value_name = "PATH")]
    pub target: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RetrieveArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Absolute extract directory; asked for when omitted
    #[arg(long, value_name = "PATH")]
    pub extract_to: Option<PathBuf>,
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        if let Commands::Completions { shell } = self.command {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "pkgxml", &mut io::stdout());
            return Ok(());
        }

        let config = Config::load(self.global.workspace.as_deref())?;
        logging::init(self.global.debug || config.project.debug_mode);
        tracing::debug!(?config, "configuration loaded");

        let mut prompter: Box<dyn Prompter> = if self.global.yes {
            Box::new(AssumeYes)
        } else {
            Box::new(TerminalPrompter)
        };
        let runtime = Runtime {
            version: self.global.api_version.unwrap_or(config.api_version()),
            config,
        };

        match self.command {
            Commands::Combine(args) => combine(&runtime, args, prompter.as_mut()),
            Commands::Create(args) => create(&runtime, args, prompter.as_mut()),
            Commands::Reload => reload(&runtime),
            Commands::Build(args) => build(&runtime, args),
            Commands::Retrieve(args) => retrieve(&runtime, args, prompter.as_mut()),
            Commands::Completions { .. } => Ok(()),
        }
    }
}

struct Runtime {
    config: Config,
    version: ApiVersion,
}

fn combine(runtime: &Runtime, args: CombineArgs, prompter: &mut dyn Prompter) -> Result<()> {
    for dir in &args.dirs {
        if !dir.is_dir() {
            bail!("not a directory: {}", dir.display());
        }
    }

    let discovery = ManifestDiscovery::from_config(&runtime.config)?;
    let outcome = Combiner::new(discovery, prompter).combine(&args.dirs)?;
    let report = match outcome {
        CombineOutcome::Combined(report) => report,
        CombineOutcome::Empty(_) => {
            println!("No available package.xml to combine");
            return Ok(());
        }
        CombineOutcome::Aborted { path } => {
            println!("Combine aborted at {}", path.display());
            return Ok(());
        }
    };

    for skipped in &report.skipped {
        tracing::info!(path = %skipped.path.display(), "skipped");
    }

    let xml = ManifestRenderer::new()?.render(&report.types, runtime.version)?;
    let written = match args.output {
        Some(path) => {
            write_manifest(&path, &xml)?;
            Some(path)
        }
        None => export_combined(&xml, &default_combined_path(&args.dirs), prompter)?,
    };

    if let Some(path) = written {
        println!(
            "Combined {} manifests into {}",
            report.merged.len(),
            path.display()
        );
    }
    Ok(())
}

fn create(runtime: &Runtime, args: CreateArgs, prompter: &mut dyn Prompter) -> Result<()> {
    if !args.dir.is_dir() {
        bail!("not a directory: {}", args.dir.display());
    }

    let renderer = ManifestRenderer::new()?;
    match create_default_manifest(&args.dir, runtime.version, &renderer, prompter, args.force)? {
        CreateOutcome::Created(path) => println!("Created {}", path.display()),
        CreateOutcome::Cancelled(path) => println!("Kept existing {}", path.display()),
    }
    Ok(())
}

fn reload(runtime: &Runtime) -> Result<()> {
    let cache = UniverseCache::new(runtime.config.workspace()?);
    let universe = cache.reload()?;
    println!(
        "Reloaded {} metadata types into {}",
        universe.len(),
        cache.cache_path().display()
    );
    Ok(())
}

fn build(runtime: &Runtime, args: BuildArgs) -> Result<()> {
    let workspace = runtime.config.workspace()?;
    let cache = UniverseCache::new(&workspace);
    if !cache.is_available() {
        bail!(
            "metadata catalog not found at {}",
            cache.catalog_path().display()
        );
    }
    let universe = cache.load_or_reload()?;
    let target = args
        .target
        .unwrap_or_else(|| workspace.join(PACKAGE_FILE_NAME));

    let mut app = UiApp::new(
        universe,
        target,
        SessionStore::new(&workspace),
        ManifestRenderer::new()?,
        runtime.version,
    )?;
    app.run()
}

fn retrieve(runtime: &Runtime, args: RetrieveArgs, prompter: &mut dyn Prompter) -> Result<()> {
    let request = match args.extract_to {
        Some(extract_to) => Some(request_with_extract_to(
            &args.file,
            &absolute(&extract_to)?,
            runtime.version,
        )?),
        None => plan_retrieve(
            &args.file,
            &runtime.config.project.default_project_name,
            runtime.version,
            prompter,
            local_now(),
        )?,
    };

    if let Some(request) = request {
        let json =
            serde_json::to_string_pretty(&request).context("failed to serialize request")?;
        println!("{json}");
    }
    Ok(())
}

/// Paths given on the command line are resolved against the current directory.
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("unable to determine working directory")?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pkgxml",
            "combine",
            "a",
            "b",
            "--yes",
            "--api-version",
            "58.0",
        ])
        .unwrap();
        assert!(cli.global.yes);
        assert_eq!(cli.global.api_version, Some(ApiVersion::new(58)));
        let Commands::Combine(args) = cli.command else {
            panic!("expected combine");
        };
        assert_eq!(args.dirs, [PathBuf::from("a"), PathBuf::from("b")]);
    }

    #[test]
    fn combine_requires_a_directory() {
        assert!(Cli::try_parse_from(["pkgxml", "combine"]).is_err());
    }

    #[test]
    fn create_takes_exactly_one_directory() {
        assert!(Cli::try_parse_from(["pkgxml", "create", "a", "b"]).is_err());
    }
}
