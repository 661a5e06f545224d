use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use notary::config::DEFAULT_CONFIG_FILE;
use notary::{
    Backend, CommandBuilder, DmgBuilder, NotaryConfig, NotaryError, Notarizer, SystemRunner,
    UnimplementedBuilder,
};

// Every failure is propagated here. `main` is the only place that decides
// the process exit code: -1 for a rejected notarization, 1 for anything else.

#[derive(Parser)]
#[command(name = "notary")]
#[command(version, about = "Notarize, staple and re-sign a macOS disk image")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Notarization tool to drive (overrides [notarization] backend)
    #[arg(long, value_parser = parse_backend)]
    backend: Option<Backend>,

    /// Seconds between altool status checks
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Status checks before giving up, 0 to poll forever
    #[arg(long)]
    max_polls: Option<u32>,

    /// Echo each external command before running it
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Show the loaded configuration and exit
    #[arg(long)]
    show: bool,
}

fn parse_backend(value: &str) -> std::result::Result<Backend, String> {
    value.parse().map_err(|e: NotaryError| e.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        notary::error!("{e:#}");
        let code = e
            .downcast_ref::<NotaryError>()
            .map_or(notary::error::EXIT_FAILURE, NotaryError::exit_code);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli.config).await?;

    if let Some(backend) = cli.backend {
        config.notarization.backend = backend;
    }
    if let Some(interval) = cli.poll_interval {
        config.notarization.poll_interval_secs = interval;
    }
    if let Some(max_polls) = cli.max_polls {
        config.notarization.max_polls = max_polls;
    }

    if cli.show {
        println!("{}", config.summary());
        return Ok(());
    }

    let runner = SystemRunner::new().verbose(cli.verbose);
    match config.build.clone() {
        Some(build) => run_workflow(config, runner, CommandBuilder::new(runner, build.command)).await,
        None => {
            notary::warn!(
                "No [build] command in {}; the disk image cannot be built",
                cli.config.display()
            );
            run_workflow(config, runner, UnimplementedBuilder).await
        }
    }
}

async fn load_config(path: &Path) -> Result<NotaryConfig> {
    NotaryConfig::load(path)
        .await
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

async fn run_workflow<B: DmgBuilder>(
    config: NotaryConfig,
    runner: SystemRunner,
    builder: B,
) -> Result<()> {
    Notarizer::new(config, runner, builder).run().await?;
    Ok(())
}
