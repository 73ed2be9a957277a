// src/main.rs

use anyhow::Result;
use clap::Parser;
use packwright::PackageFormat;
use tracing::error;

mod cli;
mod commands;

use cli::Cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("packwright version {}", env!("CARGO_PKG_VERSION"));
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let formats = selected_formats(cli);
    let created = commands::cmd_build(
        &cli.conf,
        &cli.output,
        &formats,
        cli.version.as_deref(),
        cli.revision.as_deref(),
        cli.source_date_epoch,
    )?;
    for path in created {
        println!("{}", path.display());
    }
    Ok(())
}

/// Formats in build order: RPM first, then DEB
fn selected_formats(cli: &Cli) -> Vec<PackageFormat> {
    let mut formats = Vec::new();
    if cli.rpm {
        formats.push(PackageFormat::Rpm);
    }
    if cli.deb {
        formats.push(PackageFormat::Deb);
    }
    formats
}
