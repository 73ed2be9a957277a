// src/manifest.rs
//! Package manifest
//!
//! The fully-resolved description of one package: identity, metadata,
//! codec selection and lifecycle scripts. Loading from disk lives in
//! [`crate::config`]; this module only holds the resolved values and their
//! validation rules.

use crate::compression::CompressionFormat;
use crate::error::{Error, Result};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Target architecture, named with Debian port names
///
/// See <https://www.debian.org/ports/>.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Architecture {
    #[default]
    Amd64,
    Ia64,
    I386,
    X32,
    Mipsel,
    Mips64el,
    Armel,
    Armhf,
    Arm64,
    Sparc,
    Sparc64,
}

impl Architecture {
    /// Debian architecture string
    pub fn deb_name(&self) -> &str {
        self.as_ref()
    }

    /// RPM architecture string
    pub fn rpm_name(&self) -> &'static str {
        match self {
            Self::Amd64 => "x86_64",
            Self::Ia64 => "ia64",
            Self::I386 => "i386",
            Self::X32 => "x32",
            Self::Mipsel => "mipsel",
            Self::Mips64el => "mips64el",
            Self::Armel => "armv5tel",
            Self::Armhf => "armv7hl",
            Self::Arm64 => "aarch64",
            Self::Sparc => "sparc",
            Self::Sparc64 => "sparc64",
        }
    }

    /// Architecture number stored in the RPM lead (`arch_canon` in rpmrc)
    pub fn rpm_lead_number(&self) -> u16 {
        match self {
            Self::Amd64 | Self::I386 | Self::X32 => 1,
            Self::Sparc64 => 2,
            Self::Sparc => 3,
            Self::Ia64 => 9,
            Self::Mipsel | Self::Mips64el => 11,
            Self::Armel | Self::Armhf => 12,
            Self::Arm64 => 19,
        }
    }
}

/// Maintainer scripts and conffiles listing, already loaded into memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleScripts {
    pub pre_install: String,
    pub post_install: String,
    pub pre_remove: String,
    pub post_remove: String,
    /// Newline-separated absolute paths of user-editable files
    pub conffiles: String,
}

impl LifecycleScripts {
    /// Paths listed in `conffiles`, trimmed, blank lines skipped
    pub fn conffile_paths(&self) -> impl Iterator<Item = &str> {
        self.conffiles
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    /// Appended to the version as `version-revision` when present
    pub revision: Option<String>,
    pub arch: Architecture,
    pub compression: CompressionFormat,
    pub description: String,
    pub homepage: String,
    /// Whitespace-separated dependency tokens
    pub depends: String,
    pub section: String,
    pub maintainer: String,
    /// RPM LICENSE tag
    pub license: String,
}

impl PackageManifest {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// Reject manifests that cannot name an archive or would corrupt the
    /// line-based control file
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("package name cannot be empty"));
        }
        if self.name.contains('/') {
            return Err(Error::validation(format!(
                "package name '{}' must not contain '/'",
                self.name
            )));
        }
        if self.version.trim().is_empty() {
            return Err(Error::validation("package version cannot be empty"));
        }

        check_no_whitespace("name", &self.name)?;
        check_no_whitespace("version", &self.version)?;
        if let Some(revision) = &self.revision {
            check_no_whitespace("revision", revision)?;
        }
        for (field, value) in [
            ("maintainer", &self.maintainer),
            ("section", &self.section),
            ("homepage", &self.homepage),
            ("license", &self.license),
        ] {
            check_no_control(field, value, &[])?;
        }
        // Folded into continuation lines / split into tokens
        check_no_control("description", &self.description, &['\n', '\t'])?;
        check_no_control("depends", &self.depends, &['\n', '\t'])?;

        if self.compression == CompressionFormat::None {
            return Err(Error::validation(
                "compression must be one of gzip, xz, zstd",
            ));
        }
        Ok(())
    }

    /// `version-revision`, or just `version` without a revision
    pub fn full_version(&self) -> String {
        match self.revision.as_deref() {
            Some(rev) if !rev.is_empty() => format!("{}-{}", self.version, rev),
            _ => self.version.clone(),
        }
    }

    /// `{name}_{version}_{arch}.{extension}`
    pub fn file_name(&self, extension: &str) -> String {
        format!(
            "{}_{}_{}.{}",
            self.name,
            self.full_version(),
            self.arch.deb_name(),
            extension
        )
    }
}

fn check_no_whitespace(field: &str, value: &str) -> Result<()> {
    if value.chars().any(char::is_whitespace) {
        return Err(Error::validation(format!(
            "package {} '{}' must not contain whitespace",
            field,
            value.escape_debug()
        )));
    }
    check_no_control(field, value, &[])
}

fn check_no_control(field: &str, value: &str, allowed: &[char]) -> Result<()> {
    match value.chars().find(|c| c.is_control() && !allowed.contains(c)) {
        Some(c) => Err(Error::validation(format!(
            "package {} must not contain control character {:?}",
            field, c
        ))),
        None => Ok(()),
    }
}
