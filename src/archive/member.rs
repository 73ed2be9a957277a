// src/archive/member.rs

use crate::error::{Error, Result};

/// Unix file type bits for a regular file
pub const S_IFREG: u32 = 0o100000;
/// Unix file type bits for a directory
pub const S_IFDIR: u32 = 0o040000;
/// Permission and special bits
const PERMISSION_MASK: u32 = 0o7777;

/// Name used for the archive root directory
pub const ROOT_NAME: &str = ".";
/// Root directory name in dot-relative archives
pub const DOT_ROOT_NAME: &str = "./";

/// How target paths become member names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemberNaming {
    /// Leading `/` and `./` are stripped: `/usr/bin/tool` -> `usr/bin/tool`
    #[default]
    Normalized,
    /// A leading `./` is kept as written: `./control` stays `./control`,
    /// `postinst` stays `postinst`. Used for DEB control archives.
    DotRelative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    File,
    Directory,
}

/// A single entry written into a container (ar, tar, or cpio)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Archive-relative name, forward-slash separated, no leading `/`
    pub name: String,
    pub kind: MemberKind,
    /// Permission bits (without file type bits)
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    /// Modification time, seconds since the epoch
    pub mtime: u64,
    pub content: Vec<u8>,
}

impl ArchiveMember {
    /// A regular file owned by root
    pub fn file(name: impl Into<String>, content: Vec<u8>, mode: u32, mtime: u64) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::File,
            mode: mode & PERMISSION_MASK,
            uid: 0,
            gid: 0,
            mtime,
            content,
        }
    }

    /// A directory owned by root
    pub fn directory(name: impl Into<String>, mode: u32, mtime: u64) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Directory,
            mode: mode & PERMISSION_MASK,
            uid: 0,
            gid: 0,
            mtime,
            content: Vec::new(),
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_dir(&self) -> bool {
        self.kind == MemberKind::Directory
    }

    /// Full `st_mode` including the file type bits
    pub fn st_mode(&self) -> u32 {
        let type_bits = match self.kind {
            MemberKind::File => S_IFREG,
            MemberKind::Directory => S_IFDIR,
        };
        type_bits | self.mode
    }

    /// Installed path: the member name rooted at `/`
    pub fn install_path(&self) -> String {
        if self.name == ROOT_NAME {
            "/".to_string()
        } else {
            format!("/{}", self.name)
        }
    }
}

/// Normalize a target path into an archive-relative member name
///
/// Backslashes become forward slashes; empty, `.` and leading `/`
/// components are dropped. An empty result names the archive root (`.`).
/// Parent references are rejected so nothing can escape the package tree.
///
/// ```
/// use packwright::archive::normalize_target;
///
/// assert_eq!(normalize_target("/usr/share/demo/README").unwrap(), "usr/share/demo/README");
/// assert_eq!(normalize_target("./control").unwrap(), "control");
/// assert_eq!(normalize_target("./").unwrap(), ".");
/// ```
pub fn normalize_target(path: &str) -> Result<String> {
    let unified = path.replace('\\', "/");
    let mut parts = Vec::new();

    for part in unified.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                return Err(Error::validation(format!(
                    "target path '{}' must not contain '..'",
                    path
                )));
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        Ok(ROOT_NAME.to_string())
    } else {
        Ok(parts.join("/"))
    }
}

/// Member name for `target` under the given naming
pub fn member_name(target: &str, naming: MemberNaming) -> Result<String> {
    let name = normalize_target(target)?;
    let dot_relative = target.starts_with("./") || target == ".";
    match naming {
        MemberNaming::DotRelative if dot_relative && name == ROOT_NAME => Ok(DOT_ROOT_NAME.to_string()),
        MemberNaming::DotRelative if dot_relative => Ok(format!("./{}", name)),
        _ => Ok(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target("/var/log/demo").unwrap(), "var/log/demo");
        assert_eq!(normalize_target("var//log/./demo/").unwrap(), "var/log/demo");
        assert_eq!(normalize_target("usr\\bin\\tool").unwrap(), "usr/bin/tool");
        assert_eq!(normalize_target("").unwrap(), ".");
        assert!(normalize_target("/usr/../etc/passwd").is_err());
    }

    #[test]
    fn test_member_name_dot_relative() {
        let naming = MemberNaming::DotRelative;
        assert_eq!(member_name("./control", naming).unwrap(), "./control");
        assert_eq!(member_name("./", naming).unwrap(), "./");
        assert_eq!(member_name("postinst", naming).unwrap(), "postinst");
        assert!(member_name("./../control", naming).is_err());

        assert_eq!(member_name("./control", MemberNaming::Normalized).unwrap(), "control");
    }

    #[test]
    fn test_st_mode_includes_type_bits() {
        let file = ArchiveMember::file("usr/bin/tool", vec![], 0o100755, 0);
        assert_eq!(file.mode, 0o755);
        assert_eq!(file.st_mode(), 0o100755);

        let dir = ArchiveMember::directory("var/log/demo", 0o755, 0);
        assert_eq!(dir.st_mode(), 0o040755);
        assert!(dir.is_dir());
    }

    #[test]
    fn test_install_path() {
        let file = ArchiveMember::file("usr/share/demo/README", vec![], 0o644, 0);
        assert_eq!(file.install_path(), "/usr/share/demo/README");
        let root = ArchiveMember::directory(ROOT_NAME, 0o755, 0);
        assert_eq!(root.install_path(), "/");
    }
}
