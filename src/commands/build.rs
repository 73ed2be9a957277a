// src/commands/build.rs

//! Package building from `pkg.config.json`

use anyhow::{Context, Result};
use packwright::config::{self, PackageConfig};
use packwright::{BuildOptions, PackageFormat};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Build every requested format from the config at `conf`
pub fn cmd_build(
    conf: &Path,
    output: &Path,
    formats: &[PackageFormat],
    version: Option<&str>,
    revision: Option<&str>,
    timestamp: Option<u64>,
) -> Result<Vec<PathBuf>> {
    if formats.is_empty() {
        anyhow::bail!("must specify either --deb or --rpm");
    }

    let mut cfg = PackageConfig::load(conf)
        .with_context(|| format!("Failed to load config file '{}'", conf.display()))?;
    cfg.apply_overrides(version, revision);

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory '{}'", output.display()))?;

    let mut options = BuildOptions::new(output);
    if let Some(ts) = timestamp {
        options = options.with_timestamp(ts);
    }

    let builder = cfg
        .to_builder(&config::base_dir(conf), options)
        .context("Failed to prepare package build")?;

    builder
        .validate(formats)
        .context("Invalid package manifest")?;

    let mut created = Vec::new();
    for format in formats {
        info!("Creating {}...", format);
        let path = builder
            .build(*format)
            .with_context(|| format!("Failed to create {}", format))?;
        info!("Created: '{}'", path.display());
        created.push(path);
    }
    Ok(created)
}
