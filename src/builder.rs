// src/builder.rs
//! Package build facade
//!
//! [`PackageBuilder`] records the caller's file-tree operations and replays
//! them into a fresh [`PayloadArchiver`] on every build, then hands the
//! result to the assembler for the requested format. It is the only place
//! that attaches a [`BuildStage`] to errors.

use crate::archive::PayloadArchiver;
use crate::error::{Error, Result};
use crate::manifest::{LifecycleScripts, PackageManifest};
use crate::packages::{AssemblyInput, PackageFormat};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// The step of a build an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Validate,
    AddFile,
    AddFolder,
    AddEmptyFolder,
    Assemble,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validate => write!(f, "validating manifest"),
            Self::AddFile => write!(f, "adding file"),
            Self::AddFolder => write!(f, "adding folder"),
            Self::AddEmptyFolder => write!(f, "adding empty folder"),
            Self::Assemble => write!(f, "assembling package"),
        }
    }
}

/// One recorded file-tree operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeOp {
    File { source: PathBuf, target: String },
    Folder { root: PathBuf, prefix: String },
    EmptyFolder { target: String },
}

impl TreeOp {
    fn stage(&self) -> BuildStage {
        match self {
            Self::File { .. } => BuildStage::AddFile,
            Self::Folder { .. } => BuildStage::AddFolder,
            Self::EmptyFolder { .. } => BuildStage::AddEmptyFolder,
        }
    }

    fn apply(&self, archiver: &mut PayloadArchiver) -> Result<()> {
        match self {
            Self::File { source, target } => archiver.add_file(source, target),
            Self::Folder { root, prefix } => archiver.add_folder(root, prefix),
            Self::EmptyFolder { target } => archiver.add_empty_folder(target),
        }
    }
}

/// Per-build settings passed explicitly instead of global state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Directory the package file is written into; must exist
    pub output_dir: PathBuf,
    /// Build time in seconds since the epoch
    pub timestamp: u64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            timestamp: now(),
        }
    }
}

impl BuildOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Fix the build time, for reproducible output
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn in_stage(stage: BuildStage) -> impl FnOnce(Error) -> Error {
    move |source| Error::Stage {
        stage,
        source: Box::new(source),
    }
}

/// Builds packages from a manifest and recorded tree operations
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    manifest: PackageManifest,
    scripts: LifecycleScripts,
    ops: Vec<TreeOp>,
    options: BuildOptions,
}

impl PackageBuilder {
    pub fn new(manifest: PackageManifest, options: BuildOptions) -> Self {
        Self {
            manifest,
            scripts: LifecycleScripts::default(),
            ops: Vec::new(),
            options,
        }
    }

    /// Set lifecycle scripts and conffiles
    pub fn with_scripts(mut self, scripts: LifecycleScripts) -> Self {
        self.scripts = scripts;
        self
    }

    pub fn manifest(&self) -> &PackageManifest {
        &self.manifest
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn operations(&self) -> &[TreeOp] {
        &self.ops
    }

    /// Record a single file
    pub fn add_file(&mut self, source: impl AsRef<Path>, target: impl Into<String>) -> &mut Self {
        self.ops.push(TreeOp::File {
            source: source.as_ref().to_path_buf(),
            target: target.into(),
        });
        self
    }

    /// Record a recursive folder add
    pub fn add_folder(&mut self, root: impl AsRef<Path>, prefix: impl Into<String>) -> &mut Self {
        self.ops.push(TreeOp::Folder {
            root: root.as_ref().to_path_buf(),
            prefix: prefix.into(),
        });
        self
    }

    /// Record an empty directory
    pub fn add_empty_folder(&mut self, target: impl Into<String>) -> &mut Self {
        self.ops.push(TreeOp::EmptyFolder {
            target: target.into(),
        });
        self
    }

    pub fn add_operation(&mut self, op: TreeOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    /// Replay every recorded operation into a new data archiver
    fn payload(&self) -> Result<PayloadArchiver> {
        let mut archiver = PayloadArchiver::new(self.manifest.compression, self.options.timestamp);
        for op in &self.ops {
            op.apply(&mut archiver).map_err(in_stage(op.stage()))?;
        }
        debug!(
            "Payload has {} members, {} ledger entries",
            archiver.members().len(),
            archiver.ledger().len()
        );
        Ok(archiver)
    }

    /// Check the manifest against every format about to be built
    pub fn validate(&self, formats: &[PackageFormat]) -> Result<()> {
        for format in formats {
            format
                .validate(&self.manifest)
                .map_err(in_stage(BuildStage::Validate))?;
        }
        Ok(())
    }

    /// Build one package, returning the written path
    ///
    /// The manifest is validated before any file is read.
    pub fn build(&self, format: PackageFormat) -> Result<PathBuf> {
        self.validate(&[format])?;

        info!(
            "Building {} package {} {}",
            format,
            self.manifest.name,
            self.manifest.full_version()
        );
        let data = self.payload()?;

        let input = AssemblyInput {
            manifest: &self.manifest,
            data: &data,
            scripts: &self.scripts,
            timestamp: self.options.timestamp,
        };
        format
            .assembler()
            .assemble(&input, &self.options.output_dir)
            .map_err(in_stage(BuildStage::Assemble))
    }

    /// Build each format in turn, stopping at the first failure
    ///
    /// All formats are validated before the first one is built.
    pub fn build_all(&self, formats: &[PackageFormat]) -> Result<Vec<PathBuf>> {
        self.validate(formats)?;
        formats.iter().map(|format| self.build(*format)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    const TS: u64 = 1_704_067_200;

    #[test]
    fn test_empty_name_fails_before_io() {
        let out = TempDir::new().unwrap();
        let mut builder = PackageBuilder::new(
            PackageManifest::new("", "1.0"),
            BuildOptions::new(out.path()).with_timestamp(TS),
        );
        builder.add_file("/nonexistent/source", "/usr/bin/x");

        let err = builder.build(PackageFormat::Deb).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.stage(), Some(BuildStage::Validate));
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_source_reports_stage() {
        let out = TempDir::new().unwrap();
        let mut builder = PackageBuilder::new(
            PackageManifest::new("demo", "1.0"),
            BuildOptions::new(out.path()).with_timestamp(TS),
        );
        builder.add_file("/nonexistent/packwright/README", "/usr/share/demo/README");

        let err = builder.build(PackageFormat::Rpm).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.stage(), Some(BuildStage::AddFile));
        let msg = err.to_string();
        assert!(msg.starts_with("adding file failed"));
        assert!(msg.contains("/nonexistent/packwright/README"));
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_rpm_version_checked_before_sources_are_read() {
        let out = TempDir::new().unwrap();
        let mut builder = PackageBuilder::new(
            PackageManifest::new("demo", "1.0-rc1"),
            BuildOptions::new(out.path()).with_timestamp(TS),
        );
        builder.add_file("/nonexistent/packwright/README", "/usr/share/demo/README");

        let err = builder.build(PackageFormat::Rpm).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.stage(), Some(BuildStage::Validate));
        assert!(!err.to_string().contains("/nonexistent"));

        // The deb that would have been built first is not written either
        let err = builder
            .build_all(&[PackageFormat::Deb, PackageFormat::Rpm])
            .unwrap_err();
        assert_eq!(err.stage(), Some(BuildStage::Validate));
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_build_all_formats() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let readme = src.path().join("README");
        fs::write(&readme, "hello\n").unwrap();

        let mut builder = PackageBuilder::new(
            PackageManifest::new("demo", "1.0"),
            BuildOptions::new(out.path()).with_timestamp(TS),
        );
        builder
            .add_file(&readme, "/usr/share/demo/README")
            .add_empty_folder("/var/log/demo");
        assert_eq!(builder.operations().len(), 2);

        let paths = builder
            .build_all(&[PackageFormat::Deb, PackageFormat::Rpm])
            .unwrap();
        assert_eq!(paths[0], out.path().join("demo_1.0_amd64.deb"));
        assert_eq!(paths[1], out.path().join("demo_1.0_amd64.rpm"));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(BuildStage::Validate.to_string(), "validating manifest");
        assert_eq!(BuildStage::Assemble.to_string(), "assembling package");
    }
}
