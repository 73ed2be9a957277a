// src/packages/rpm/lead.rs
//! The 96-byte RPM lead
//!
//! Obsolete but still required at the start of every package file.
//! Modern tools read only the magic and version; the rest is filled in
//! the way rpmbuild does.

pub const LEAD_SIZE: usize = 96;

const LEAD_MAGIC: [u8; 4] = [0xed, 0xab, 0xee, 0xdb];
const NAME_FIELD_LEN: usize = 66;
/// Binary package
const PACKAGE_TYPE_BINARY: u16 = 0;
const OS_LINUX: u16 = 1;
/// Header-style signature follows the lead
const SIGNATURE_TYPE_HEADER: u16 = 5;

#[derive(Debug, Clone)]
pub struct Lead {
    /// `name-version-release`, truncated to fit the fixed field
    name: String,
    arch: u16,
}

impl Lead {
    pub fn new(name: impl Into<String>, arch: u16) -> Self {
        Self {
            name: name.into(),
            arch,
        }
    }

    pub fn to_bytes(&self) -> [u8; LEAD_SIZE] {
        let mut lead = [0u8; LEAD_SIZE];
        lead[0..4].copy_from_slice(&LEAD_MAGIC);
        lead[4] = 3;
        lead[5] = 0;
        lead[6..8].copy_from_slice(&PACKAGE_TYPE_BINARY.to_be_bytes());
        lead[8..10].copy_from_slice(&self.arch.to_be_bytes());

        // Keep one byte for the terminating NUL
        let name = self.name.as_bytes();
        let len = name.len().min(NAME_FIELD_LEN - 1);
        lead[10..10 + len].copy_from_slice(&name[..len]);

        let tail = 10 + NAME_FIELD_LEN;
        lead[tail..tail + 2].copy_from_slice(&OS_LINUX.to_be_bytes());
        lead[tail + 2..tail + 4].copy_from_slice(&SIGNATURE_TYPE_HEADER.to_be_bytes());
        // Remaining 16 bytes are reserved
        lead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_layout() {
        let lead = Lead::new("demo-1.0-2", 1).to_bytes();
        assert_eq!(&lead[0..4], &[0xed, 0xab, 0xee, 0xdb]);
        assert_eq!(lead[4], 3);
        assert_eq!(&lead[8..10], &[0, 1]);
        assert_eq!(&lead[10..20], b"demo-1.0-2");
        assert_eq!(lead[20], 0);
        assert_eq!(&lead[76..78], &[0, 1]);
        assert_eq!(&lead[78..80], &[0, 5]);
        assert!(lead[80..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_long_name_truncated_with_nul() {
        let lead = Lead::new("x".repeat(100), 1).to_bytes();
        assert_eq!(lead[10 + 64], b'x');
        assert_eq!(lead[10 + 65], 0);
    }
}
