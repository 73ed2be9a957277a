// src/archive/ledger.rs
//! Checksum ledger
//!
//! Records a content digest for every file added to a payload, in the order
//! the files were added, and renders the `md5sums` listing embedded in a DEB
//! control archive. Entries are append-only: adding the same path twice
//! yields two lines, matching the archive's last-add-wins member semantics
//! without reordering anything.

use crate::hash::HashAlgorithm;

/// One recorded digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub path: String,
    pub digest: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChecksumLedger {
    algorithm: HashAlgorithm,
    entries: Vec<LedgerEntry>,
}

impl ChecksumLedger {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            entries: Vec::new(),
        }
    }

    /// Digest `content` and append `path -> digest`
    pub fn record(&mut self, path: &str, content: &[u8]) {
        self.entries.push(LedgerEntry {
            path: path.to_string(),
            digest: self.algorithm.hex_digest(content),
        });
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as `<digest>  <path>` lines in recorded order
    pub fn render(&self) -> Vec<u8> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.digest);
            out.push_str("  ");
            out.push_str(&entry.path);
            out.push('\n');
        }
        out.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_keeps_add_order() {
        let mut ledger = ChecksumLedger::new(HashAlgorithm::Md5);
        ledger.record("usr/share/demo/b", b"hello world\n");
        ledger.record("usr/share/demo/a", b"");

        let rendered = String::from_utf8(ledger.render()).unwrap();
        assert_eq!(
            rendered,
            "6f5902ac237024bdd0c176cb93063dc4  usr/share/demo/b\n\
             d41d8cd98f00b204e9800998ecf8427e  usr/share/demo/a\n"
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut ledger = ChecksumLedger::default();
        ledger.record("etc/demo.conf", b"one");
        ledger.record("etc/demo.conf", b"two");

        assert_eq!(ledger.len(), 2);
        assert_ne!(ledger.entries()[0].digest, ledger.entries()[1].digest);
    }

    #[test]
    fn test_empty_ledger_renders_nothing() {
        let ledger = ChecksumLedger::new(HashAlgorithm::Sha256);
        assert!(ledger.is_empty());
        assert!(ledger.render().is_empty());
    }
}
