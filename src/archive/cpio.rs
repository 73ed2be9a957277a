// src/archive/cpio.rs
//! CPIO New ASCII (newc) archives
//!
//! RPM payloads are newc cpio streams. [`CpioWriter`] produces them;
//! [`CpioReader`] reads them back for verification.

use std::io::{self, Read, Write};

/// CPIO New ASCII Format (newc) header size
const HEADER_SIZE: usize = 110;
/// Magic string for newc format
const MAGIC_NEWC: &[u8] = b"070701";
/// Magic string for CRC format
const MAGIC_CRC: &[u8] = b"070702";
/// Name of the end-of-archive marker entry
const TRAILER: &str = "TRAILER!!!";

/// CPIO entry metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpioEntry {
    pub name: String,
    pub size: u64,
    pub mode: u32,
    pub mtime: u64,
    pub uid: u32,
    pub gid: u32,
    pub ino: u32,
    pub nlink: u32,
}

/// Padding needed to reach the next 4-byte boundary
fn pad4(len: usize) -> usize {
    (4 - (len % 4)) % 4
}

/// A writer for CPIO (New ASCII) archives
pub struct CpioWriter<W: Write> {
    writer: W,
}

impl<W: Write> CpioWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Append one entry; `content` must be exactly `entry.size` bytes
    pub fn append(&mut self, entry: &CpioEntry, content: &[u8]) -> io::Result<()> {
        if content.len() as u64 != entry.size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "cpio entry '{}' declares {} bytes but has {}",
                    entry.name,
                    entry.size,
                    content.len()
                ),
            ));
        }
        let filesize = u32::try_from(entry.size).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cpio entry '{}' exceeds 4 GiB", entry.name),
            )
        })?;

        // Name includes the trailing NUL
        let namesize = entry.name.len() + 1;
        let fields = [
            entry.ino,
            entry.mode,
            entry.uid,
            entry.gid,
            entry.nlink,
            entry.mtime as u32,
            filesize,
            0, // devmajor
            0, // devminor
            0, // rdevmajor
            0, // rdevminor
            namesize as u32,
            0, // check
        ];

        let mut header = Vec::with_capacity(HEADER_SIZE + namesize + 3);
        header.extend_from_slice(MAGIC_NEWC);
        for field in fields {
            header.extend_from_slice(format!("{:08X}", field).as_bytes());
        }
        header.extend_from_slice(entry.name.as_bytes());
        header.push(0);
        header.resize(header.len() + pad4(HEADER_SIZE + namesize), 0);

        self.writer.write_all(&header)?;
        self.writer.write_all(content)?;
        self.writer.write_all(&[0u8; 3][..pad4(content.len())])?;
        Ok(())
    }

    /// Write the trailer entry and return the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        let trailer = CpioEntry {
            name: TRAILER.to_string(),
            size: 0,
            mode: 0,
            mtime: 0,
            uid: 0,
            gid: 0,
            ino: 0,
            nlink: 1,
        };
        self.append(&trailer, &[])?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// A reader for CPIO (New ASCII) archives
pub struct CpioReader<R: Read> {
    reader: R,
}

impl<R: Read> CpioReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read the next entry from the CPIO archive
    /// Returns Ok(None) if end of archive (TRAILER!!!)
    pub fn next_entry(&mut self) -> io::Result<Option<(CpioEntry, Vec<u8>)>> {
        let mut header_buf = [0u8; HEADER_SIZE];
        if let Err(e) = self.reader.read_exact(&mut header_buf) {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                return Ok(None);
            }
            return Err(e);
        }

        let magic = &header_buf[0..6];
        if magic != MAGIC_NEWC && magic != MAGIC_CRC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid CPIO magic: {:?}", String::from_utf8_lossy(magic)),
            ));
        }

        let parse_hex = |start: usize, len: usize| -> io::Result<u32> {
            let s = std::str::from_utf8(&header_buf[start..start + len])
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            u32::from_str_radix(s, 16).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        };

        let ino = parse_hex(6, 8)?;
        let mode = parse_hex(14, 8)?;
        let uid = parse_hex(22, 8)?;
        let gid = parse_hex(30, 8)?;
        let nlink = parse_hex(38, 8)?;
        let mtime = parse_hex(46, 8)? as u64;
        let filesize = parse_hex(54, 8)? as u64;
        let namesize = parse_hex(94, 8)? as usize;

        let mut name_buf = vec![0u8; namesize];
        self.reader.read_exact(&mut name_buf)?;
        if name_buf.last() == Some(&0) {
            name_buf.pop();
        }
        let name = String::from_utf8_lossy(&name_buf).to_string();

        let mut skip = [0u8; 3];
        self.reader
            .read_exact(&mut skip[..pad4(HEADER_SIZE + namesize)])?;

        if name == TRAILER {
            return Ok(None);
        }

        let mut content = vec![0u8; filesize as usize];
        self.reader.read_exact(&mut content)?;
        self.reader.read_exact(&mut skip[..pad4(filesize as usize)])?;

        Ok(Some((
            CpioEntry {
                name,
                size: filesize,
                mode,
                mtime,
                uid,
                gid,
                ino,
                nlink,
            },
            content,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, size: u64, ino: u32) -> CpioEntry {
        CpioEntry {
            name: name.to_string(),
            size,
            mode: 0o100644,
            mtime: 1704067200,
            uid: 0,
            gid: 0,
            ino,
            nlink: 1,
        }
    }

    #[test]
    fn test_header_layout() {
        let mut writer = CpioWriter::new(Vec::new());
        writer.append(&entry("./a", 1, 1), b"x").unwrap();
        let bytes = writer.finish().unwrap();

        assert_eq!(&bytes[0..6], b"070701");
        // ino field
        assert_eq!(&bytes[6..14], b"00000001");
        // namesize field: "./a" plus NUL
        assert_eq!(&bytes[94..102], b"00000004");
        // 110 header + 4 name + 2 pad = 116, then data padded to 4
        assert_eq!(bytes[116], b'x');
        assert_eq!(&bytes[120..126], b"070701");
        assert_eq!(bytes.len() % 4, 0);
    }

    #[test]
    fn test_reader_sees_written_entries() {
        let mut writer = CpioWriter::new(Vec::new());
        writer
            .append(&entry("./usr/share/demo/README", 5, 1), b"hello")
            .unwrap();
        writer.append(&entry("./etc/demo.conf", 0, 2), b"").unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = CpioReader::new(bytes.as_slice());
        let (first, content) = reader.next_entry().unwrap().unwrap();
        assert_eq!(first.name, "./usr/share/demo/README");
        assert_eq!(first.ino, 1);
        assert_eq!(content, b"hello");

        let (second, content) = reader.next_entry().unwrap().unwrap();
        assert_eq!(second.name, "./etc/demo.conf");
        assert!(content.is_empty());

        assert!(reader.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let mut writer = CpioWriter::new(Vec::new());
        assert!(writer.append(&entry("./a", 3, 1), b"x").is_err());
    }
}
