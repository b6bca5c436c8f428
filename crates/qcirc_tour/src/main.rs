//! qcirc tour binary
//!
//! Set `RUST_LOG=info` (or `debug`) to see backend and transpiler logs.

use anyhow::{Context, Result};
use clap::Parser;
use qcirc_tour::{Cli, Tour};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.to_config().context("invalid configuration")?;
    log::info!("{}", config);

    let mut tour = Tour::new(config).context("could not start the tour")?;
    let sections = tour.config().selected_sections();
    let mut reports = Vec::with_capacity(sections.len());

    for section in sections {
        let report = tour
            .run_section(section)
            .with_context(|| format!("section {} ({}) failed", section.number(), section))?;
        println!("{}", report);
        reports.push(report);
    }

    if let Some(path) = &cli.json_out {
        let json = serde_json::to_string_pretty(&reports).context("could not encode reports")?;
        std::fs::write(path, json)
            .with_context(|| format!("could not write {}", path.display()))?;
        println!("Reports written to {}", path.display());
    }

    Ok(())
}
