// src/packages/mod.rs

//! Package container assembly
//!
//! Each output format implements [`Assembler`]: it takes a finished data
//! payload plus the manifest and scripts, and writes one package file into
//! an output directory. Files are written to a temporary sibling and renamed
//! into place, so a failed build never leaves a partial package behind.

pub mod control;
pub mod deb;
pub mod rpm;

pub use control::{ControlMetadataFormatter, DepOp, Dependency};
pub use deb::DebianAssembler;
pub use rpm::RpmAssembler;

use crate::archive::PayloadArchiver;
use crate::error::{Error, Result};
use crate::manifest::{LifecycleScripts, PackageManifest};
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};
use tracing::debug;

/// Permissions of a finished package file
const PACKAGE_FILE_MODE: u32 = 0o644;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum PackageFormat {
    Deb,
    Rpm,
}

impl PackageFormat {
    /// File extension of the package file
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Deb => "deb",
            Self::Rpm => "rpm",
        }
    }

    /// Check that `manifest` can be written in this format
    pub fn validate(&self, manifest: &PackageManifest) -> Result<()> {
        let formatter = ControlMetadataFormatter::new(manifest)?;
        match self {
            Self::Deb => Ok(()),
            Self::Rpm => formatter.check_rpm_identity(),
        }
    }

    pub fn assembler(&self) -> Box<dyn Assembler> {
        match self {
            Self::Deb => Box::new(DebianAssembler),
            Self::Rpm => Box::new(RpmAssembler),
        }
    }
}

/// Everything an assembler needs, borrowed from the build facade
#[derive(Debug, Clone, Copy)]
pub struct AssemblyInput<'a> {
    pub manifest: &'a PackageManifest,
    /// Data payload; finished by the assembler in its own container format
    pub data: &'a PayloadArchiver,
    pub scripts: &'a LifecycleScripts,
    /// Build time in seconds since the epoch
    pub timestamp: u64,
}

/// Writes one package format
pub trait Assembler {
    fn format(&self) -> PackageFormat;

    /// Assemble the package into `output_dir`, returning the written path
    fn assemble(&self, input: &AssemblyInput<'_>, output_dir: &Path) -> Result<PathBuf>;
}

/// Write `bytes` to `output_dir/file_name` atomically
pub(crate) fn write_package(output_dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = output_dir.join(file_name);
    let mut tmp = tempfile::Builder::new()
        .prefix(".packwright-")
        .tempfile_in(output_dir)
        .map_err(|e| Error::file(output_dir, e))?;

    tmp.write_all(bytes).map_err(|e| Error::file(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::file(tmp.path(), e))?;
    fs::set_permissions(tmp.path(), fs::Permissions::from_mode(PACKAGE_FILE_MODE))
        .map_err(|e| Error::file(tmp.path(), e))?;

    tmp.persist(&path).map_err(|e| Error::file(&path, e.error))?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}
