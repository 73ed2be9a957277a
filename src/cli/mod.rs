// src/cli/mod.rs
//! CLI definitions for packwright
//!
//! The command implementation lives in the `commands` module.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "packwright")]
#[command(author = "Packwright Contributors")]
#[command(about = "Build .deb and .rpm packages from a JSON package description", long_about = None)]
// `--version` overrides the package version, so clap's own flag is off
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Build a Debian package
    #[arg(long)]
    pub deb: bool,

    /// Build an RPM package
    #[arg(long)]
    pub rpm: bool,

    /// Package config file
    #[arg(long, value_name = "FILE", default_value = "pkg.config.json")]
    pub conf: PathBuf,

    /// Directory the packages are written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Override the package version
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Override the package revision
    #[arg(long, value_name = "REVISION")]
    pub revision: Option<String>,

    /// Build timestamp used for reproducible output
    #[arg(long, value_name = "SECONDS", env = "SOURCE_DATE_EPOCH")]
    pub source_date_epoch: Option<u64>,
}
