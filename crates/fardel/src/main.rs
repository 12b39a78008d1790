use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use fardel::{config::Config, orchestrator};

#[derive(Debug, Parser)]
#[command(name = "fardel", version, about = "Bundle a JavaScript module graph into one script")]
struct Cli {
    /// Entry module that starts graph discovery
    entry: PathBuf,

    /// Write the bundle here instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to a fardel.toml configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Abort after discovering this many assets (guards against cyclic
    /// dependency chains, which otherwise never terminate)
    #[arg(long)]
    max_assets: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Decrease log verbosity (-q errors only, -qq silent)
    #[arg(short, long, action = clap::ArgAction::Count)]
    quiet: u8,
}

/// Map -v/-q counts onto a filter level, starting from Warn
fn log_level(verbose: u8, quiet: u8) -> log::LevelFilter {
    match (verbose, quiet) {
        (_, 1) => log::LevelFilter::Error,
        (_, 2..) => log::LevelFilter::Off,
        (0, _) => log::LevelFilter::Warn,
        (1, _) => log::LevelFilter::Info,
        (2, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    env_logger::Builder::from_default_env()
        .filter_level(log_level(verbose, quiet))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    // Command-line flags win over file values
    if cli.output.is_some() {
        config.output = cli.output;
    }
    if cli.max_assets.is_some() {
        config.max_assets = cli.max_assets;
    }

    orchestrator::bundle_to_sink(&cli.entry, &config)
}
