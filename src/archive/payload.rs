// src/archive/payload.rs
//! Payload archiver
//!
//! Collects files and directories in add order and serializes them into a
//! single compressed tree archive: tar for DEB sub-archives, newc cpio for
//! RPM payloads. Every file added is also recorded in the archiver's own
//! [`ChecksumLedger`].

use crate::archive::cpio::{CpioEntry, CpioWriter};
use crate::archive::ledger::ChecksumLedger;
use crate::archive::member::{member_name, ArchiveMember, MemberKind, MemberNaming, ROOT_NAME};
use crate::compression::{self, CompressionFormat};
use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tracing::debug;
use walkdir::WalkDir;

/// Default mode for directories the archiver creates itself
const DIR_MODE: u32 = 0o755;
/// Owner name written into tar headers
const ROOT_OWNER: &str = "root";

/// A finished, compressed archive
#[derive(Debug, Clone)]
pub struct Payload {
    /// Compressed archive bytes
    pub data: Vec<u8>,
    /// Size of the serialized archive before compression
    pub uncompressed_size: u64,
    pub codec: CompressionFormat,
    /// Codec-specific member name suffix, e.g. `.tar.xz`
    pub suffix: String,
}

impl Payload {
    /// Container member name for this payload, e.g. `data` -> `data.tar.gz`
    pub fn member_name(&self, stem: &str) -> String {
        format!("{}{}", stem, self.suffix)
    }
}

#[derive(Debug, Clone)]
pub struct PayloadArchiver {
    codec: CompressionFormat,
    /// Upper bound for member mtimes; also the mtime of synthetic members
    timestamp: u64,
    naming: MemberNaming,
    members: Vec<ArchiveMember>,
    /// Member name -> position in `members`
    index: HashMap<String, usize>,
    ledger: ChecksumLedger,
}

impl PayloadArchiver {
    pub fn new(codec: CompressionFormat, timestamp: u64) -> Self {
        Self {
            codec,
            timestamp,
            naming: MemberNaming::Normalized,
            members: Vec::new(),
            index: HashMap::new(),
            ledger: ChecksumLedger::new(HashAlgorithm::Md5),
        }
    }

    /// Select how target paths become member names
    pub fn with_naming(mut self, naming: MemberNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn codec(&self) -> CompressionFormat {
        self.codec
    }

    pub fn ledger(&self) -> &ChecksumLedger {
        &self.ledger
    }

    /// Members in archive order (last add wins, first slot kept)
    pub fn members(&self) -> &[ArchiveMember] {
        &self.members
    }

    /// Total size of all file contents in bytes
    pub fn installed_size(&self) -> u64 {
        self.members.iter().map(ArchiveMember::size).sum()
    }

    /// Add a file from disk under `target`
    pub fn add_file(&mut self, source: &Path, target: &str) -> Result<()> {
        let name = member_name(target, self.naming)?;
        let metadata = fs::metadata(source).map_err(|e| Error::file(source, e))?;
        if !metadata.is_file() {
            return Err(Error::file(
                source,
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
        let content = fs::read(source).map_err(|e| Error::file(source, e))?;

        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0)
            .min(self.timestamp);

        debug!("Adding file '{}' -> '{}'", source.display(), name);
        self.ledger.record(&name, &content);
        self.insert(ArchiveMember::file(
            name,
            content,
            metadata.permissions().mode(),
            mtime,
        ));
        Ok(())
    }

    /// Add in-memory content under `target`
    pub fn add_bytes(&mut self, content: &[u8], target: &str, mode: u32) -> Result<()> {
        let name = member_name(target, self.naming)?;
        self.ledger.record(&name, content);
        self.insert(ArchiveMember::file(name, content.to_vec(), mode, self.timestamp));
        Ok(())
    }

    /// Add a directory entry; no ledger entry is recorded
    pub fn add_empty_folder(&mut self, target: &str) -> Result<()> {
        let name = member_name(target, self.naming)?;
        debug!("Adding directory '{}'", name);
        self.insert(ArchiveMember::directory(name, DIR_MODE, self.timestamp));
        Ok(())
    }

    /// Recursively add every regular file below `root`
    ///
    /// Targets are `prefix` joined with the path relative to the *parent* of
    /// `root`, so `add_folder("assets", "/usr/share/demo")` places
    /// `assets/logo.png` at `/usr/share/demo/assets/logo.png`. Directories are
    /// only recorded when they are empty.
    pub fn add_folder(&mut self, root: &Path, prefix: &str) -> Result<()> {
        let base = root.parent().unwrap_or_else(|| Path::new(""));

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                Error::file(path, e.into())
            })?;
            let path = entry.path();
            let relative = path
                .strip_prefix(base)
                .map_err(|_| Error::format(format!("'{}' is outside '{}'", path.display(), base.display())))?;
            let target = format!(
                "{}/{}",
                prefix.trim_end_matches('/'),
                relative.to_string_lossy()
            );

            if entry.file_type().is_file() {
                self.add_file(path, &target)?;
            } else if entry.file_type().is_dir() && is_empty_dir(path)? {
                self.add_empty_folder(&target)?;
            }
        }
        Ok(())
    }

    fn insert(&mut self, member: ArchiveMember) {
        match self.index.get(&member.name) {
            Some(&slot) => {
                debug!("Replacing earlier member '{}'", member.name);
                self.members[slot] = member;
            }
            None => {
                self.index.insert(member.name.clone(), self.members.len());
                self.members.push(member);
            }
        }
    }

    /// Serialize all members as tar in insertion order and compress
    pub fn finish(&self) -> Result<Payload> {
        let tar = self.write_tar()?;
        self.compress(tar, self.codec.tar_suffix().to_string())
    }

    /// Members for an RPM payload: sorted by name, archive root excluded
    pub fn sorted_members(&self) -> Vec<&ArchiveMember> {
        let mut members: Vec<&ArchiveMember> = self
            .members
            .iter()
            .filter(|m| m.name != ROOT_NAME)
            .collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        members
    }

    /// Serialize [`Self::sorted_members`] as newc cpio and compress
    ///
    /// Entry names carry a `./` prefix and inode numbers count up from 1 in
    /// the same order, matching the RPM header's file arrays.
    pub fn finish_cpio(&self) -> Result<Payload> {
        let mut writer = CpioWriter::new(Vec::new());
        for (i, member) in self.sorted_members().into_iter().enumerate() {
            let entry = CpioEntry {
                name: format!("./{}", member.name),
                size: member.size(),
                mode: member.st_mode(),
                mtime: member.mtime,
                uid: member.uid,
                gid: member.gid,
                ino: i as u32 + 1,
                nlink: if member.is_dir() { 2 } else { 1 },
            };
            writer.append(&entry, &member.content)?;
        }
        let cpio = writer.finish()?;
        self.compress(cpio, format!(".cpio{}", self.codec.extension()))
    }

    fn compress(&self, raw: Vec<u8>, suffix: String) -> Result<Payload> {
        let data = compression::compress(&raw, self.codec)?;
        Ok(Payload {
            data,
            uncompressed_size: raw.len() as u64,
            codec: self.codec,
            suffix,
        })
    }

    fn write_tar(&self) -> Result<Vec<u8>> {
        let mut archive = tar::Builder::new(Vec::new());

        for member in &self.members {
            let mut header = tar::Header::new_gnu();
            header.set_mode(member.mode);
            header.set_uid(member.uid as u64);
            header.set_gid(member.gid as u64);
            header.set_username(ROOT_OWNER)?;
            header.set_groupname(ROOT_OWNER)?;
            header.set_mtime(member.mtime);
            header.set_size(member.size());

            match member.kind {
                MemberKind::Directory => header.set_entry_type(tar::EntryType::Directory),
                MemberKind::File => header.set_entry_type(tar::EntryType::Regular),
            }

            if member.name.starts_with("./") {
                // append_data would strip the leading `./`
                set_raw_name(&mut header, &member.name)?;
                header.set_cksum();
                archive.append(&header, member.content.as_slice())?;
            } else {
                archive.append_data(&mut header, &member.name, member.content.as_slice())?;
            }
        }

        Ok(archive.into_inner()?)
    }
}

/// Write `name` into the header's name field as-is
fn set_raw_name(header: &mut tar::Header, name: &str) -> Result<()> {
    let slot = &mut header.as_old_mut().name;
    if name.len() >= slot.len() {
        return Err(Error::format(format!("member name '{}' is too long", name)));
    }
    slot.fill(0);
    slot[..name.len()].copy_from_slice(name.as_bytes());
    Ok(())
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| Error::file(path, e))?;
    Ok(entries.next().is_none())
}
