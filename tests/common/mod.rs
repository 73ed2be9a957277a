// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use packwright::compression;
use std::fs;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

/// Fixed build time used by every reproducible build in the tests
pub const TS: u64 = 1_704_067_200;

/// One entry read back from a tar sub-archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarFile {
    pub path: String,
    pub is_dir: bool,
    pub mode: u32,
    pub content: Vec<u8>,
}

/// Create a source tree:
///
/// ```text
/// README                 "hello world\n"
/// assets/logo.svg        "<svg/>"
/// assets/empty/
/// assets/docs/guide.txt  "read me first\n"
/// ```
///
/// Returns the TempDir - keep it alive to prevent cleanup.
pub fn source_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("README"), "hello world\n").unwrap();
    fs::create_dir_all(root.join("assets/empty")).unwrap();
    fs::create_dir_all(root.join("assets/docs")).unwrap();
    fs::write(root.join("assets/logo.svg"), "<svg/>").unwrap();
    fs::write(root.join("assets/docs/guide.txt"), "read me first\n").unwrap();
    dir
}

/// Read the members of an ar archive as (name, content)
pub fn ar_members(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = fs::File::open(path).unwrap();
    let mut archive = ar::Archive::new(file);
    let mut members = Vec::new();
    while let Some(entry) = archive.next_entry() {
        let mut entry = entry.unwrap();
        let name = String::from_utf8(entry.header().identifier().to_vec()).unwrap();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        members.push((name, content));
    }
    members
}

/// Decompress and list a tar sub-archive
pub fn tar_files(compressed: &[u8]) -> Vec<TarFile> {
    let raw = compression::decompress_auto(compressed).unwrap();
    let mut archive = tar::Archive::new(raw.as_slice());
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().to_string();
            let is_dir = entry.header().entry_type() == tar::EntryType::Directory;
            let mode = entry.header().mode().unwrap();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            TarFile {
                path,
                is_dir,
                mode,
                content,
            }
        })
        .collect()
}

/// Find a member by name, panicking with the available names otherwise
pub fn member<'a>(members: &'a [(String, Vec<u8>)], name: &str) -> &'a [u8] {
    members
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, c)| c.as_slice())
        .unwrap_or_else(|| {
            let names: Vec<&str> = members.iter().map(|(n, _)| n.as_str()).collect();
            panic!("member '{}' not found in {:?}", name, names)
        })
}

/// Find a tar entry by path
pub fn tar_file<'a>(files: &'a [TarFile], path: &str) -> &'a TarFile {
    files
        .iter()
        .find(|f| f.path == path)
        .unwrap_or_else(|| panic!("'{}' not found in tar", path))
}
