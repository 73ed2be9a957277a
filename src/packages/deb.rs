// src/packages/deb.rs

//! Debian binary package assembly
//!
//! A `.deb` is an ar archive with exactly three members, in order:
//! 1. `debian-binary` containing `2.0\n`
//! 2. `control.tar.{gz,xz,zst}` with control, md5sums and maintainer scripts
//! 3. `data.tar.{gz,xz,zst}` with the installed tree
//!
//! dpkg rejects any other order.

use super::{write_package, Assembler, AssemblyInput, ControlMetadataFormatter, PackageFormat};
use crate::archive::{ArchiveMember, MemberNaming, PayloadArchiver};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Contents of the `debian-binary` member
const DEBIAN_BINARY: &[u8] = b"2.0\n";
/// Mode of files in the control archive
const CONTROL_FILE_MODE: u32 = 0o644;
/// Mode of maintainer scripts
const SCRIPT_MODE: u32 = 0o755;

/// Assembles `.deb` packages
#[derive(Debug, Clone, Copy, Default)]
pub struct DebianAssembler;

impl DebianAssembler {
    /// Build the control sub-archive
    ///
    /// Holds the `./` root, `./control` and `./md5sums`, then whichever
    /// maintainer scripts and `conffiles` are non-empty.
    fn control_archive(
        &self,
        input: &AssemblyInput<'_>,
        formatter: &ControlMetadataFormatter<'_>,
    ) -> Result<PayloadArchiver> {
        let mut control = PayloadArchiver::new(input.data.codec(), input.timestamp)
            .with_naming(MemberNaming::DotRelative);
        let installed_kib = input.data.installed_size().div_ceil(1024);

        control.add_empty_folder("./")?;
        control.add_bytes(
            formatter.debian_control(Some(installed_kib)).as_bytes(),
            "./control",
            CONTROL_FILE_MODE,
        )?;
        control.add_bytes(&input.data.ledger().render(), "./md5sums", CONTROL_FILE_MODE)?;

        let scripts = input.scripts;
        for (name, body) in [
            ("postinst", &scripts.post_install),
            ("preinst", &scripts.pre_install),
            ("postrm", &scripts.post_remove),
            ("prerm", &scripts.pre_remove),
        ] {
            if !body.is_empty() {
                debug!("Adding maintainer script {}", name);
                control.add_bytes(body.as_bytes(), name, SCRIPT_MODE)?;
            }
        }
        if !scripts.conffiles.is_empty() {
            control.add_bytes(scripts.conffiles.as_bytes(), "conffiles", CONTROL_FILE_MODE)?;
        }

        Ok(control)
    }
}

impl Assembler for DebianAssembler {
    fn format(&self) -> PackageFormat {
        PackageFormat::Deb
    }

    fn assemble(&self, input: &AssemblyInput<'_>, output_dir: &Path) -> Result<PathBuf> {
        let formatter = ControlMetadataFormatter::new(input.manifest)?;

        let control = self.control_archive(input, &formatter)?.finish()?;
        let data = input.data.finish()?;
        debug!(
            "control {} bytes, data {} bytes ({} uncompressed)",
            control.data.len(),
            data.data.len(),
            data.uncompressed_size
        );

        let ts = input.timestamp;
        let members = [
            ArchiveMember::file("debian-binary", DEBIAN_BINARY.to_vec(), CONTROL_FILE_MODE, ts),
            ArchiveMember::file(control.member_name("control"), control.data, CONTROL_FILE_MODE, ts),
            ArchiveMember::file(data.member_name("data"), data.data, CONTROL_FILE_MODE, ts),
        ];
        let bytes = write_ar(&members)?;

        let path = write_package(output_dir, &input.manifest.file_name(self.format().extension()), &bytes)?;
        info!("Created {}", path.display());
        Ok(path)
    }
}

/// Serialize members into a common-format ar archive
fn write_ar(members: &[ArchiveMember]) -> Result<Vec<u8>> {
    let mut builder = ar::Builder::new(Vec::new());
    for member in members {
        let mut header = ar::Header::new(member.name.as_bytes().to_vec(), member.size());
        header.set_mode(member.st_mode());
        header.set_mtime(member.mtime);
        header.set_uid(member.uid);
        header.set_gid(member.gid);
        builder.append(&header, member.content.as_slice())?;
    }
    Ok(builder.into_inner()?)
}
