use clap::Parser;

fn main() -> anyhow::Result<()> {
    pkgxml::cli::Cli::parse().execute()
}
