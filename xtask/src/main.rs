use anyhow::{Context, Result};
use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::Command;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest with default configuration
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// List pending insta snapshots, optionally accepting them
    Snapshots {
        #[arg(long)]
        accept: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::Snapshots { accept } => review_snapshots(accept)?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo nextest run failed");
    }
    Ok(())
}

fn review_snapshots(accept: bool) -> Result<()> {
    let metadata = MetadataCommand::new()
        .no_deps()
        .exec()
        .context("failed to read cargo metadata")?;
    let root = PathBuf::from(metadata.workspace_root);

    let pending: Vec<PathBuf> = WalkDir::new(&root)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != "target")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".snap.new"))
        .map(|entry| entry.into_path())
        .collect();

    if pending.is_empty() {
        println!("no pending snapshots");
        return Ok(());
    }
    for path in &pending {
        println!("pending: {}", path.strip_prefix(&root).unwrap_or(path).display());
    }

    if accept {
        let status = Command::new("cargo")
            .args(["insta", "accept"])
            .current_dir(&root)
            .status()?;
        if !status.success() {
            anyhow::bail!("cargo insta accept failed");
        }
    }
    Ok(())
}
