use anyhow::{Context, Result};
use clap::Parser;
use fuzzstat::{Cli, Config, Orchestrator, Reporter, RscriptProvider, TargetCollection, TerminalReporter};
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Log to stderr so reports on stdout stay clean. `RUST_LOG` overrides the level.
fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    // Load config and apply CLI overrides
    let mut config = Config::load_or_default(Path::new(&cli.config))?;
    cli.apply_to_config(&mut config);
    debug!("Configuration: {:?}", config);

    let data = TargetCollection::load(&cli.data)
        .with_context(|| format!("Failed to load coverage data from {}", cli.data.display()))?;

    let provider = RscriptProvider::from_config(&config.provider);
    let orchestrator = Orchestrator::new(&provider, &config);
    let run = orchestrator
        .run(&data, cli.mode())
        .context("Failed to compare fuzzers")?;

    let reporter = if config.report.colors {
        TerminalReporter::new()
    } else {
        TerminalReporter::without_colors()
    };
    reporter.report(&run)?;

    Ok(())
}
