// src/packages/control.rs
//! Package metadata rendering
//!
//! Turns a [`PackageManifest`] into the metadata each format stores:
//! - DEB: the `control` file, `Key: Value` lines in canonical order
//! - RPM: typed tag/value entries for the main header
//!
//! Dependency strings are whitespace-separated tokens. A parenthesised
//! version constraint stays attached to the name before it, so
//! `libc6 (>= 2.31) adduser` is two tokens.

use crate::error::{Error, Result};
use crate::manifest::PackageManifest;
use crate::packages::rpm::header::{Header, TagValue};
use crate::packages::rpm::tags::{Tag, RPMSENSE_EQUAL, RPMSENSE_GREATER, RPMSENSE_LESS};

/// License recorded when the manifest names none
const DEFAULT_LICENSE: &str = "Unspecified";
/// RPM group recorded when the manifest has no section
const DEFAULT_GROUP: &str = "Unspecified";
/// RPM OS tag value
const RPM_OS: &str = "linux";
/// RPM release used when the manifest has no revision
const DEFAULT_RELEASE: &str = "1";

/// Version comparison in a dependency constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepOp {
    Less,
    LessEq,
    Eq,
    GreaterEq,
    Greater,
}

impl DepOp {
    /// Parse a leading operator, returning it with the remaining text
    fn split(constraint: &str) -> Option<(Self, &str)> {
        // Longest operators first
        const OPS: [(&str, DepOp); 7] = [
            (">=", DepOp::GreaterEq),
            ("<=", DepOp::LessEq),
            (">>", DepOp::Greater),
            ("<<", DepOp::Less),
            ("=", DepOp::Eq),
            (">", DepOp::Greater),
            ("<", DepOp::Less),
        ];
        OPS.iter()
            .find_map(|(text, op)| constraint.strip_prefix(text).map(|rest| (*op, rest)))
    }

    /// RPMSENSE_* comparison bits
    pub fn rpm_flags(&self) -> u32 {
        match self {
            Self::Less => RPMSENSE_LESS,
            Self::LessEq => RPMSENSE_LESS | RPMSENSE_EQUAL,
            Self::Eq => RPMSENSE_EQUAL,
            Self::GreaterEq => RPMSENSE_GREATER | RPMSENSE_EQUAL,
            Self::Greater => RPMSENSE_GREATER,
        }
    }
}

/// One dependency token, split into name and optional constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub constraint: Option<(DepOp, String)>,
}

impl Dependency {
    pub fn parse(token: &str) -> Self {
        let Some(open) = token.find('(') else {
            return Self {
                name: token.trim().to_string(),
                constraint: None,
            };
        };

        let name = token[..open].trim().to_string();
        let inner = token[open + 1..].trim_end().trim_end_matches(')').trim();
        let constraint = match DepOp::split(inner) {
            Some((op, version)) if !version.trim().is_empty() => {
                Some((op, version.trim().to_string()))
            }
            Some(_) => None,
            // Bare version means exact match
            None if !inner.is_empty() => Some((DepOp::Eq, inner.to_string())),
            None => None,
        };
        Self { name, constraint }
    }

    pub fn rpm_flags(&self) -> u32 {
        self.constraint.as_ref().map_or(0, |(op, _)| op.rpm_flags())
    }

    pub fn version(&self) -> &str {
        self.constraint.as_ref().map_or("", |(_, v)| v.as_str())
    }
}

/// Split a dependency string into tokens
///
/// ```
/// use packwright::packages::control::split_dependencies;
///
/// assert_eq!(
///     split_dependencies("libc6 (>= 2.31), adduser"),
///     vec!["libc6 (>= 2.31)", "adduser"]
/// );
/// ```
pub fn split_dependencies(depends: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut depth = 0usize;

    for word in depends.split_whitespace() {
        let continues = depth > 0 || word.starts_with('(');
        match tokens.last_mut() {
            Some(last) if continues => {
                last.push(' ');
                last.push_str(word);
            }
            _ => tokens.push(word.to_string()),
        }
        depth += word.matches('(').count();
        depth = depth.saturating_sub(word.matches(')').count());
    }

    tokens
        .into_iter()
        .map(|t| t.trim_matches(',').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Renders manifest fields into format-specific metadata
pub struct ControlMetadataFormatter<'a> {
    manifest: &'a PackageManifest,
}

impl<'a> ControlMetadataFormatter<'a> {
    /// Validates the manifest before any formatting happens
    pub fn new(manifest: &'a PackageManifest) -> Result<Self> {
        manifest.validate()?;
        Ok(Self { manifest })
    }

    pub fn dependencies(&self) -> Vec<Dependency> {
        split_dependencies(&self.manifest.depends)
            .iter()
            .map(|token| Dependency::parse(token))
            .collect()
    }

    /// Render the DEB `control` file
    pub fn debian_control(&self, installed_size: Option<u64>) -> String {
        let m = self.manifest;
        let mut fields: Vec<(&str, String)> = vec![
            ("Package", m.name.clone()),
            ("Version", m.full_version()),
            ("Architecture", m.arch.deb_name().to_string()),
        ];

        if !m.maintainer.is_empty() {
            fields.push(("Maintainer", m.maintainer.clone()));
        }
        if let Some(size) = installed_size {
            fields.push(("Installed-Size", size.to_string()));
        }
        let depends = split_dependencies(&m.depends);
        if !depends.is_empty() {
            fields.push(("Depends", depends.join(", ")));
        }
        if !m.section.is_empty() {
            fields.push(("Section", m.section.clone()));
        }
        if !m.description.trim().is_empty() {
            fields.push(("Description", fold_description(&m.description)));
        }
        if !m.homepage.is_empty() {
            fields.push(("Homepage", m.homepage.clone()));
        }

        let mut out = String::new();
        for (key, value) in fields {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(&value);
            out.push('\n');
        }
        out.push('\n');
        out
    }

    /// Release for the RPM header: the revision, or `1`
    pub fn rpm_release(&self) -> &str {
        match self.manifest.revision.as_deref() {
            Some(rev) if !rev.is_empty() => rev,
            _ => DEFAULT_RELEASE,
        }
    }

    /// RPM uses `-` to separate name, version and release
    pub fn check_rpm_identity(&self) -> Result<()> {
        let release = self.rpm_release();
        if self.manifest.version.contains('-') || release.contains('-') {
            return Err(Error::validation(format!(
                "RPM version '{}' and release '{}' must not contain '-'",
                self.manifest.version, release
            )));
        }
        Ok(())
    }

    /// Identity and descriptive tags of the RPM main header
    ///
    /// File, payload and script tags are added by the assembler.
    pub fn rpm_header(&self) -> Result<Header> {
        self.check_rpm_identity()?;
        let m = self.manifest;
        let release = self.rpm_release();

        let mut header = Header::new(Tag::HeaderImmutable);
        header.insert(Tag::HeaderI18nTable, TagValue::StringArray(vec!["C".to_string()]))?;
        header.insert(Tag::Name, TagValue::String(m.name.clone()))?;
        header.insert(Tag::Version, TagValue::String(m.version.clone()))?;
        header.insert(Tag::Release, TagValue::String(release.to_string()))?;
        header.insert(Tag::Summary, TagValue::I18nString(vec![m.name.clone()]))?;
        if !m.description.trim().is_empty() {
            header.insert(Tag::Description, TagValue::I18nString(vec![m.description.clone()]))?;
        }
        let license = if m.license.is_empty() {
            DEFAULT_LICENSE
        } else {
            m.license.as_str()
        };
        header.insert(Tag::License, TagValue::String(license.to_string()))?;
        if !m.maintainer.is_empty() {
            header.insert(Tag::Packager, TagValue::String(m.maintainer.clone()))?;
        }
        let group = if m.section.is_empty() {
            DEFAULT_GROUP
        } else {
            m.section.as_str()
        };
        header.insert(Tag::Group, TagValue::I18nString(vec![group.to_string()]))?;
        if !m.homepage.is_empty() {
            header.insert(Tag::Url, TagValue::String(m.homepage.clone()))?;
        }
        header.insert(Tag::Os, TagValue::String(RPM_OS.to_string()))?;
        header.insert(Tag::Arch, TagValue::String(m.arch.rpm_name().to_string()))?;

        // The package provides itself at its exact version
        header.insert(Tag::ProvideName, TagValue::StringArray(vec![m.name.clone()]))?;
        header.insert(Tag::ProvideFlags, TagValue::Int32(vec![RPMSENSE_EQUAL]))?;
        header.insert(
            Tag::ProvideVersion,
            TagValue::StringArray(vec![format!("{}-{}", m.version, release)]),
        )?;

        Ok(header)
    }
}

/// Fold a free-form description into DEB continuation lines
fn fold_description(description: &str) -> String {
    let mut lines = description.trim_end().lines();
    let mut out = lines.next().unwrap_or_default().trim().to_string();
    for line in lines {
        out.push('\n');
        if line.trim().is_empty() {
            out.push_str(" .");
        } else {
            out.push(' ');
            out.push_str(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Architecture;

    fn demo_manifest() -> PackageManifest {
        let mut manifest = PackageManifest::new("demo", "1.0");
        manifest.revision = Some("2".to_string());
        manifest.arch = Architecture::Amd64;
        manifest
    }

    #[test]
    fn test_debian_control_field_order() {
        let mut manifest = demo_manifest();
        manifest.maintainer = "Demo Team <demo@example.org>".to_string();
        manifest.depends = "libc6 (>= 2.31) adduser".to_string();
        manifest.section = "utils".to_string();
        manifest.description = "Demo tool".to_string();
        manifest.homepage = "https://example.org/demo".to_string();

        let formatter = ControlMetadataFormatter::new(&manifest).unwrap();
        let control = formatter.debian_control(Some(4));
        assert_eq!(
            control,
            "Package: demo\n\
             Version: 1.0-2\n\
             Architecture: amd64\n\
             Maintainer: Demo Team <demo@example.org>\n\
             Installed-Size: 4\n\
             Depends: libc6 (>= 2.31), adduser\n\
             Section: utils\n\
             Description: Demo tool\n\
             Homepage: https://example.org/demo\n\
             \n"
        );
    }

    #[test]
    fn test_debian_control_skips_empty_fields() {
        let manifest = demo_manifest();
        let control = ControlMetadataFormatter::new(&manifest)
            .unwrap()
            .debian_control(None);
        assert_eq!(control, "Package: demo\nVersion: 1.0-2\nArchitecture: amd64\n\n");
    }

    #[test]
    fn test_empty_name_rejected_before_formatting() {
        let manifest = PackageManifest::new("", "1.0");
        assert!(ControlMetadataFormatter::new(&manifest).is_err());
    }

    #[test]
    fn test_fold_description() {
        assert_eq!(
            fold_description("Short summary\nLonger text.\n\nSecond paragraph.\n"),
            "Short summary\n Longer text.\n .\n Second paragraph."
        );
    }

    #[test]
    fn test_split_dependencies() {
        assert_eq!(split_dependencies("a b  c"), vec!["a", "b", "c"]);
        assert_eq!(
            split_dependencies("libc6 (>= 2.31) libssl3(>=3.0)"),
            vec!["libc6 (>= 2.31)", "libssl3(>=3.0)"]
        );
        assert_eq!(split_dependencies("a, b,"), vec!["a", "b"]);
        assert!(split_dependencies("   ").is_empty());
    }

    #[test]
    fn test_parse_dependency() {
        let dep = Dependency::parse("libc6 (>= 2.31)");
        assert_eq!(dep.name, "libc6");
        assert_eq!(dep.constraint, Some((DepOp::GreaterEq, "2.31".to_string())));
        assert_eq!(dep.rpm_flags(), RPMSENSE_GREATER | RPMSENSE_EQUAL);

        let dep = Dependency::parse("foo (<< 2)");
        assert_eq!(dep.constraint, Some((DepOp::Less, "2".to_string())));

        let dep = Dependency::parse("bar");
        assert_eq!(dep.name, "bar");
        assert_eq!(dep.rpm_flags(), 0);
        assert_eq!(dep.version(), "");

        let dep = Dependency::parse("baz (1.2)");
        assert_eq!(dep.constraint, Some((DepOp::Eq, "1.2".to_string())));
    }

    #[test]
    fn test_rpm_release_defaults_to_one() {
        let manifest = PackageManifest::new("demo", "1.0");
        let formatter = ControlMetadataFormatter::new(&manifest).unwrap();
        assert_eq!(formatter.rpm_release(), "1");
        assert_eq!(
            ControlMetadataFormatter::new(&demo_manifest()).unwrap().rpm_release(),
            "2"
        );
    }

    #[test]
    fn test_rpm_header_identity_tags() {
        let manifest = demo_manifest();
        let header = ControlMetadataFormatter::new(&manifest)
            .unwrap()
            .rpm_header()
            .unwrap();

        assert_eq!(header.get(Tag::Name), Some(&TagValue::String("demo".to_string())));
        assert_eq!(header.get(Tag::Version), Some(&TagValue::String("1.0".to_string())));
        assert_eq!(header.get(Tag::Release), Some(&TagValue::String("2".to_string())));
        assert_eq!(header.get(Tag::Arch), Some(&TagValue::String("x86_64".to_string())));
        assert_eq!(
            header.get(Tag::License),
            Some(&TagValue::String("Unspecified".to_string()))
        );
        assert!(header.get(Tag::Url).is_none());
    }

    #[test]
    fn test_rpm_header_rejects_dash_in_version() {
        let manifest = PackageManifest::new("demo", "1.0-rc1");
        let formatter = ControlMetadataFormatter::new(&manifest).unwrap();
        assert!(formatter.rpm_header().is_err());
    }
}
