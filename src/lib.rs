// src/lib.rs

//! Packwright package builder
//!
//! Assembles Debian `.deb` and RPM `.rpm` packages from a manifest and a
//! set of file-tree operations.
//!
//! # Architecture
//!
//! - `archive`: ordered payload members, checksum ledger, tar/cpio output
//! - `packages`: per-format assemblers behind the `Assembler` trait
//! - `builder`: the facade that validates, replays operations and dispatches
//! - `config`: `pkg.config.json` loading
//!
//! Output is reproducible: the same manifest, operations and build
//! timestamp always produce the same bytes.
//!
//! ```no_run
//! use packwright::{BuildOptions, PackageBuilder, PackageFormat, PackageManifest};
//!
//! let mut manifest = PackageManifest::new("demo", "1.0");
//! manifest.revision = Some("2".to_string());
//!
//! let mut builder = PackageBuilder::new(manifest, BuildOptions::new("dist"));
//! builder.add_file("README", "/usr/share/demo/README");
//! let path = builder.build(PackageFormat::Deb)?;
//! assert!(path.ends_with("demo_1.0-2_amd64.deb"));
//! # Ok::<(), packwright::Error>(())
//! ```

pub mod archive;
pub mod builder;
pub mod compression;
pub mod config;
mod error;
pub mod hash;
pub mod manifest;
pub mod packages;

pub use archive::{ChecksumLedger, PayloadArchiver};
pub use builder::{BuildOptions, BuildStage, PackageBuilder, TreeOp};
pub use compression::CompressionFormat;
pub use config::PackageConfig;
pub use error::{Error, ErrorKind, Result};
pub use hash::HashAlgorithm;
pub use manifest::{Architecture, LifecycleScripts, PackageManifest};
pub use packages::{Assembler, PackageFormat};
