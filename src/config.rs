// src/config.rs
//! `pkg.config.json` loading
//!
//! The config file describes one package: metadata, a folder map
//! (source -> install prefix, an empty prefix meaning "create this empty
//! directory"), a file map (source -> install path), and paths of the
//! maintainer scripts and conffiles listing. Relative source paths are
//! resolved against the directory holding the config file.
//!
//! ```json
//! {
//!   "name": "demo",
//!   "version": "1.0",
//!   "arch": "amd64",
//!   "compression": "xz",
//!   "folders": { "assets": "/usr/share/demo", "/var/log/demo": "" },
//!   "files": { "build/demo": "/usr/bin/demo" },
//!   "scripts": { "post_inst": "scripts/postinst" },
//!   "conffiles": "conffiles"
//! }
//! ```

use crate::builder::{BuildOptions, PackageBuilder, TreeOp};
use crate::compression::CompressionFormat;
use crate::error::{Error, Result};
use crate::manifest::{Architecture, LifecycleScripts, PackageManifest};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use tracing::{debug, info};

/// Paths of the maintainer scripts, relative to the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScriptPaths {
    pub pre_inst: String,
    pub post_inst: String,
    pub pre_uninst: String,
    pub post_uninst: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    pub name: String,
    pub version: String,
    pub revision: String,
    pub arch: String,
    pub compression: String,
    pub description: String,
    pub homepage: String,
    pub depends: String,
    pub section: String,
    pub maintainer: String,
    pub license: String,
    /// Source folder -> install prefix; empty prefix creates the key as an empty directory
    pub folders: BTreeMap<String, String>,
    /// Source file -> install path
    pub files: BTreeMap<String, String>,
    pub scripts: ScriptPaths,
    /// Path of a file listing conffiles, one per line
    pub conffiles: String,
}

/// Directory that relative paths in `config_path` are resolved against
pub fn base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

impl PackageConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| Error::file(path, e))?;
        Self::parse(&data)
            .map_err(|e| Error::validation(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Replace version and revision with non-empty command line values
    pub fn apply_overrides(&mut self, version: Option<&str>, revision: Option<&str>) {
        if let Some(version) = version.filter(|v| !v.is_empty()) {
            info!("Setting version to {}", version);
            self.version = version.to_string();
        }
        if let Some(revision) = revision.filter(|r| !r.is_empty()) {
            info!("Setting revision to {}", revision);
            self.revision = revision.to_string();
        }
    }

    /// Resolve into a manifest; unknown architecture or codec names are rejected
    pub fn to_manifest(&self) -> Result<PackageManifest> {
        let arch = if self.arch.is_empty() {
            Architecture::default()
        } else {
            self.arch
                .parse::<Architecture>()
                .map_err(|_| {
                    let known: Vec<String> = Architecture::iter().map(|a| a.to_string()).collect();
                    Error::validation(format!(
                        "unknown architecture '{}', expected one of: {}",
                        self.arch,
                        known.join(", ")
                    ))
                })?
        };
        let compression = if self.compression.is_empty() {
            CompressionFormat::default()
        } else {
            self.compression.parse::<CompressionFormat>().map_err(|_| {
                Error::validation(format!("unknown compression '{}'", self.compression))
            })?
        };

        let manifest = PackageManifest {
            name: self.name.clone(),
            version: self.version.clone(),
            revision: Some(self.revision.clone()).filter(|r| !r.is_empty()),
            arch,
            compression,
            description: self.description.clone(),
            homepage: self.homepage.clone(),
            depends: self.depends.clone(),
            section: self.section.clone(),
            maintainer: self.maintainer.clone(),
            license: self.license.clone(),
        };
        Ok(manifest)
    }

    /// Read script and conffiles paths into memory
    pub fn load_scripts(&self, base_dir: &Path) -> Result<LifecycleScripts> {
        let load = |path: &str| -> Result<String> {
            if path.is_empty() {
                return Ok(String::new());
            }
            let full = resolve(base_dir, path);
            let body = fs::read_to_string(&full).map_err(|e| Error::file(&full, e))?;
            debug!("Loaded file '{}' ({} bytes)", full.display(), body.len());
            Ok(body)
        };

        Ok(LifecycleScripts {
            pre_install: load(&self.scripts.pre_inst)?,
            post_install: load(&self.scripts.post_inst)?,
            pre_remove: load(&self.scripts.pre_uninst)?,
            post_remove: load(&self.scripts.post_uninst)?,
            conffiles: load(&self.conffiles)?,
        })
    }

    /// Folder and file operations in a stable replay order
    ///
    /// Folders come first, sorted by prefix then source; then files, sorted
    /// by target then source.
    pub fn tree_operations(&self, base_dir: &Path) -> Vec<TreeOp> {
        let mut folders: Vec<(&String, &String)> = self.folders.iter().collect();
        folders.sort_by(|a, b| (a.1, a.0).cmp(&(b.1, b.0)));
        let mut files: Vec<(&String, &String)> = self.files.iter().collect();
        files.sort_by(|a, b| (a.1, a.0).cmp(&(b.1, b.0)));

        let folder_ops = folders.into_iter().map(|(source, prefix)| {
            if prefix.is_empty() {
                TreeOp::EmptyFolder {
                    target: source.clone(),
                }
            } else {
                TreeOp::Folder {
                    root: resolve(base_dir, source),
                    prefix: prefix.clone(),
                }
            }
        });
        let file_ops = files.into_iter().map(|(source, target)| TreeOp::File {
            source: resolve(base_dir, source),
            target: target.clone(),
        });
        folder_ops.chain(file_ops).collect()
    }

    /// Manifest, scripts and operations wired into a builder
    pub fn to_builder(&self, base_dir: &Path, options: BuildOptions) -> Result<PackageBuilder> {
        let manifest = self.to_manifest()?;
        let scripts = self.load_scripts(base_dir)?;
        let mut builder = PackageBuilder::new(manifest, options).with_scripts(scripts);
        for op in self.tree_operations(base_dir) {
            builder.add_operation(op);
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    const CONFIG: &str = r#"{
        "name": "demo",
        "version": "1.0",
        "revision": "2",
        "arch": "arm64",
        "compression": "zstd",
        "folders": { "assets": "/usr/share/demo", "/var/log/demo": "" },
        "files": { "bin/z": "/usr/bin/z", "bin/a": "/usr/bin/a" },
        "scripts": { "post_inst": "postinst" }
    }"#;

    #[test]
    fn test_parse_and_manifest() {
        let config = PackageConfig::parse(CONFIG).unwrap();
        let manifest = config.to_manifest().unwrap();
        assert_eq!(manifest.arch, Architecture::Arm64);
        assert_eq!(manifest.compression, CompressionFormat::Zstd);
        assert_eq!(manifest.full_version(), "1.0-2");
        assert_eq!(manifest.license, "");
    }

    #[test]
    fn test_defaults_for_empty_fields() {
        let config = PackageConfig::parse(r#"{"name": "demo", "version": "1"}"#).unwrap();
        let manifest = config.to_manifest().unwrap();
        assert_eq!(manifest.arch, Architecture::Amd64);
        assert_eq!(manifest.compression, CompressionFormat::Gzip);
        assert_eq!(manifest.revision, None);
    }

    #[test]
    fn test_unknown_values_rejected() {
        let config = PackageConfig {
            arch: "s390x".to_string(),
            ..Default::default()
        };
        let err = config.to_manifest().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("amd64, ia64"));

        let config = PackageConfig {
            compression: "lzma".to_string(),
            ..Default::default()
        };
        assert!(config.to_manifest().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = PackageConfig::parse(CONFIG).unwrap();
        config.apply_overrides(Some("2.0"), Some(""));
        assert_eq!(config.version, "2.0");
        assert_eq!(config.revision, "2");
        config.apply_overrides(None, Some("7"));
        assert_eq!(config.revision, "7");
    }

    #[test]
    fn test_tree_operations_order() {
        let config = PackageConfig::parse(CONFIG).unwrap();
        let base = Path::new("/srv/pkg");
        let ops = config.tree_operations(base);
        assert_eq!(
            ops,
            vec![
                TreeOp::EmptyFolder {
                    target: "/var/log/demo".to_string()
                },
                TreeOp::Folder {
                    root: PathBuf::from("/srv/pkg/assets"),
                    prefix: "/usr/share/demo".to_string()
                },
                TreeOp::File {
                    source: PathBuf::from("/srv/pkg/bin/a"),
                    target: "/usr/bin/a".to_string()
                },
                TreeOp::File {
                    source: PathBuf::from("/srv/pkg/bin/z"),
                    target: "/usr/bin/z".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_load_scripts_relative_to_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("postinst"), "#!/bin/sh\n").unwrap();
        let config = PackageConfig::parse(CONFIG).unwrap();

        let scripts = config.load_scripts(dir.path()).unwrap();
        assert_eq!(scripts.post_install, "#!/bin/sh\n");
        assert!(scripts.pre_install.is_empty());
        assert!(scripts.conffiles.is_empty());
    }

    #[test]
    fn test_missing_script_is_io_error() {
        let dir = TempDir::new().unwrap();
        let config = PackageConfig::parse(CONFIG).unwrap();
        let err = config.load_scripts(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_load_reports_bad_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pkg.config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = PackageConfig::load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("pkg.config.json"));
    }

    #[test]
    fn test_base_dir() {
        assert_eq!(base_dir(Path::new("pkg.config.json")), PathBuf::from("."));
        assert_eq!(base_dir(Path::new("/srv/pkg/pkg.config.json")), PathBuf::from("/srv/pkg"));
    }
}
