// src/packages/rpm/mod.rs

//! RPM binary package assembly
//!
//! File layout:
//! - 96-byte lead
//! - signature header (region tag 62), padded to an 8-byte boundary
//! - main header (region tag 63)
//! - compressed newc cpio payload
//!
//! The signature header carries digests over the main header and payload,
//! so the main header is fully serialized before the signature is built.

pub mod header;
pub mod lead;
pub mod tags;

use self::header::{Header, TagValue};
use self::lead::Lead;
use self::tags::*;
use super::{write_package, Assembler, AssemblyInput, ControlMetadataFormatter, PackageFormat};
use crate::archive::{ArchiveMember, Payload};
use crate::compression::CompressionFormat;
use crate::error::{Error, Result};
use crate::hash::{sha256_hex, HashAlgorithm};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Build host recorded in every header; a fixed value keeps output reproducible
const BUILD_HOST: &str = "localhost";
const FILE_OWNER: &str = "root";
/// Digest for file contents and the payload
const FILE_DIGEST: HashAlgorithm = HashAlgorithm::Sha256;

/// Tags rpm refuses to install without
const REQUIRED_TAGS: [Tag; 6] = [
    Tag::Name,
    Tag::Version,
    Tag::Release,
    Tag::Os,
    Tag::Arch,
    Tag::PayloadFormat,
];

/// Assembles `.rpm` packages
#[derive(Debug, Clone, Copy, Default)]
pub struct RpmAssembler;

/// Feature requirements rpm expects for how this package is laid out
fn rpmlib_requirements(has_files: bool, codec: CompressionFormat) -> Vec<(&'static str, &'static str)> {
    let mut reqs = Vec::new();
    if has_files {
        reqs.push(("rpmlib(CompressedFileNames)", "3.0.4-1"));
        reqs.push(("rpmlib(FileDigests)", "4.6.0-1"));
    }
    reqs.push(("rpmlib(PayloadFilesHavePrefix)", "4.0-1"));
    match codec {
        CompressionFormat::Xz => reqs.push(("rpmlib(PayloadIsXz)", "5.2-1")),
        CompressionFormat::Zstd => reqs.push(("rpmlib(PayloadIsZstd)", "5.4.18-1")),
        CompressionFormat::Gzip | CompressionFormat::None => {}
    }
    reqs
}

fn int32(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::format(format!("{} {} does not fit in 32 bits", what, value)))
}

/// Split `/usr/bin/tool` into (`/usr/bin/`, `tool`)
fn split_install_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..=i], &path[i + 1..]),
        None => ("/", path),
    }
}

impl RpmAssembler {
    fn add_requirements(&self, header: &mut Header, input: &AssemblyInput<'_>, formatter: &ControlMetadataFormatter<'_>) -> Result<()> {
        let mut names = Vec::new();
        let mut flags = Vec::new();
        let mut versions = Vec::new();

        for dep in formatter.dependencies() {
            flags.push(dep.rpm_flags());
            versions.push(dep.version().to_string());
            names.push(dep.name);
        }

        let has_files = !input.data.sorted_members().is_empty();
        for (name, version) in rpmlib_requirements(has_files, input.data.codec()) {
            names.push(name.to_string());
            flags.push(RPMSENSE_RPMLIB | RPMSENSE_LESS | RPMSENSE_EQUAL);
            versions.push(version.to_string());
        }

        header.insert(Tag::RequireName, TagValue::StringArray(names))?;
        header.insert(Tag::RequireFlags, TagValue::Int32(flags))?;
        header.insert(Tag::RequireVersion, TagValue::StringArray(versions))?;
        Ok(())
    }

    fn add_scripts(&self, header: &mut Header, input: &AssemblyInput<'_>) -> Result<()> {
        let scripts = input.scripts;
        for (tag, prog, body) in [
            (Tag::PreIn, Tag::PreInProg, &scripts.pre_install),
            (Tag::PostIn, Tag::PostInProg, &scripts.post_install),
            (Tag::PreUn, Tag::PreUnProg, &scripts.pre_remove),
            (Tag::PostUn, Tag::PostUnProg, &scripts.post_remove),
        ] {
            if !body.is_empty() {
                header.insert(tag, TagValue::String(body.clone()))?;
                header.insert(prog, TagValue::String(SCRIPT_INTERPRETER.to_string()))?;
            }
        }
        Ok(())
    }

    /// Per-file arrays, in the same order as the cpio payload
    fn add_files(&self, header: &mut Header, members: &[&ArchiveMember], conffiles: &HashSet<&str>) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }

        let mut sizes = Vec::new();
        let mut modes = Vec::new();
        let mut mtimes = Vec::new();
        let mut digests = Vec::new();
        let mut file_flags = Vec::new();
        let mut inodes = Vec::new();
        let mut basenames = Vec::new();
        let mut dirnames: Vec<String> = Vec::new();
        let mut dir_indexes = Vec::new();

        for (i, member) in members.iter().enumerate() {
            let path = member.install_path();
            let (dir, base) = split_install_path(&path);
            let dir_index = match dirnames.iter().position(|d| d == dir) {
                Some(index) => index,
                None => {
                    dirnames.push(dir.to_string());
                    dirnames.len() - 1
                }
            };

            sizes.push(int32(member.size(), "file size")?);
            // Only the low 16 bits of st_mode are meaningful
            modes.push(member.st_mode() as u16);
            mtimes.push(int32(member.mtime, "file mtime")?);
            digests.push(if member.is_dir() {
                String::new()
            } else {
                FILE_DIGEST.hex_digest(&member.content)
            });
            file_flags.push(if conffiles.contains(path.as_str()) {
                RPMFILE_CONFIG | RPMFILE_NOREPLACE
            } else {
                0
            });
            inodes.push(int32(i as u64 + 1, "inode")?);
            basenames.push(base.to_string());
            dir_indexes.push(int32(dir_index as u64, "directory index")?);
        }

        let count = members.len();
        header.insert(Tag::FileSizes, TagValue::Int32(sizes))?;
        header.insert(Tag::FileModes, TagValue::Int16(modes))?;
        header.insert(Tag::FileRdevs, TagValue::Int16(vec![0; count]))?;
        header.insert(Tag::FileMtimes, TagValue::Int32(mtimes))?;
        header.insert(Tag::FileDigests, TagValue::StringArray(digests))?;
        header.insert(Tag::FileLinkTos, TagValue::StringArray(vec![String::new(); count]))?;
        header.insert(Tag::FileFlags, TagValue::Int32(file_flags))?;
        header.insert(Tag::FileUserName, TagValue::StringArray(vec![FILE_OWNER.to_string(); count]))?;
        header.insert(Tag::FileGroupName, TagValue::StringArray(vec![FILE_OWNER.to_string(); count]))?;
        header.insert(Tag::FileDevices, TagValue::Int32(vec![1; count]))?;
        header.insert(Tag::FileInodes, TagValue::Int32(inodes))?;
        header.insert(Tag::FileLangs, TagValue::StringArray(vec![String::new(); count]))?;
        header.insert(Tag::DirIndexes, TagValue::Int32(dir_indexes))?;
        header.insert(Tag::BaseNames, TagValue::StringArray(basenames))?;
        header.insert(Tag::DirNames, TagValue::StringArray(dirnames))?;
        header.insert(Tag::FileDigestAlgo, TagValue::Int32(vec![FILE_DIGEST.rpm_algo_id()]))?;
        Ok(())
    }

    fn add_payload_tags(&self, header: &mut Header, payload: &Payload) -> Result<()> {
        header.insert(Tag::PayloadFormat, TagValue::String("cpio".to_string()))?;
        header.insert(Tag::PayloadCompressor, TagValue::String(payload.codec.name().to_string()))?;
        header.insert(Tag::PayloadFlags, TagValue::String(payload.codec.level().to_string()))?;
        header.insert(Tag::PayloadDigest, TagValue::StringArray(vec![FILE_DIGEST.hex_digest(&payload.data)]))?;
        header.insert(Tag::PayloadDigestAlgo, TagValue::Int32(vec![FILE_DIGEST.rpm_algo_id()]))?;
        Ok(())
    }

    /// Build the main header for `input` around an already finished payload
    fn main_header(&self, input: &AssemblyInput<'_>, payload: &Payload) -> Result<Header> {
        let formatter = ControlMetadataFormatter::new(input.manifest)?;
        let mut header = formatter.rpm_header()?;
        let m = input.manifest;

        header.insert(Tag::BuildTime, TagValue::Int32(vec![int32(input.timestamp, "build time")?]))?;
        header.insert(Tag::BuildHost, TagValue::String(BUILD_HOST.to_string()))?;
        header.insert(Tag::Size, TagValue::Int32(vec![int32(input.data.installed_size(), "installed size")?]))?;
        // A source rpm name marks this as a binary package
        header.insert(
            Tag::SourceRpm,
            TagValue::String(format!("{}-{}-{}.src.rpm", m.name, m.version, formatter.rpm_release())),
        )?;

        self.add_requirements(&mut header, input, &formatter)?;
        self.add_scripts(&mut header, input)?;

        let conffiles: HashSet<&str> = input.scripts.conffile_paths().collect();
        self.add_files(&mut header, &input.data.sorted_members(), &conffiles)?;
        self.add_payload_tags(&mut header, payload)?;

        let required: Vec<u32> = REQUIRED_TAGS.iter().map(|t| u32::from(*t)).collect();
        header.require(&required)?;
        Ok(header)
    }

    /// Signature header over the serialized main header and payload
    fn signature(&self, main: &[u8], payload: &Payload) -> Result<Vec<u8>> {
        let mut signed = Vec::with_capacity(main.len() + payload.data.len());
        signed.extend_from_slice(main);
        signed.extend_from_slice(&payload.data);

        let mut sig = Header::new(SignatureTag::HeaderSignatures);
        sig.insert(SignatureTag::Sha256, TagValue::String(sha256_hex(main)))?;
        sig.insert(SignatureTag::Size, TagValue::Int32(vec![int32(signed.len() as u64, "package size")?]))?;
        sig.insert(SignatureTag::Md5, TagValue::Bin(HashAlgorithm::Md5.digest(&signed)))?;
        sig.insert(
            SignatureTag::PayloadSize,
            TagValue::Int32(vec![int32(payload.uncompressed_size, "payload size")?]),
        )?;

        let mut bytes = sig.to_bytes()?;
        bytes.resize(bytes.len().next_multiple_of(8), 0);
        Ok(bytes)
    }
}

impl Assembler for RpmAssembler {
    fn format(&self) -> PackageFormat {
        PackageFormat::Rpm
    }

    fn assemble(&self, input: &AssemblyInput<'_>, output_dir: &Path) -> Result<PathBuf> {
        // Validate before doing any work
        let formatter = ControlMetadataFormatter::new(input.manifest)?;
        let m = input.manifest;

        let payload = input.data.finish_cpio()?;
        let main = self.main_header(input, &payload)?.to_bytes()?;
        let signature = self.signature(&main, &payload)?;
        debug!(
            "rpm header {} bytes, signature {} bytes, payload {} bytes",
            main.len(),
            signature.len(),
            payload.data.len()
        );

        let nvr = format!("{}-{}-{}", m.name, m.version, formatter.rpm_release());
        let lead = Lead::new(nvr, m.arch.rpm_lead_number()).to_bytes();

        let mut bytes = Vec::with_capacity(lead.len() + signature.len() + main.len() + payload.data.len());
        bytes.extend_from_slice(&lead);
        bytes.extend_from_slice(&signature);
        bytes.extend_from_slice(&main);
        bytes.extend_from_slice(&payload.data);

        let path = write_package(output_dir, &m.file_name(self.format().extension()), &bytes)?;
        info!("Created {}", path.display());
        Ok(path)
    }
}
