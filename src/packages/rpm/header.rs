// src/packages/rpm/header.rs
//! RPM header structure writer
//!
//! A header is an 8-byte magic, entry count, data-store size, then the index
//! (16-byte big-endian entries) and the data store. The first index entry is
//! always the region tag; its trailer sits at the end of the store and holds
//! the negated size of the whole index. All other entries are written in
//! ascending tag order, each value aligned to its type's natural boundary.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Header magic, version 1, plus four reserved bytes
pub const HEADER_MAGIC: [u8; 8] = [0x8e, 0xad, 0xe8, 0x01, 0, 0, 0, 0];
/// Size of one index entry
pub const INDEX_ENTRY_SIZE: usize = 16;

const TYPE_INT16: u32 = 3;
const TYPE_INT32: u32 = 4;
const TYPE_STRING: u32 = 6;
const TYPE_BIN: u32 = 7;
const TYPE_STRING_ARRAY: u32 = 8;
const TYPE_I18NSTRING: u32 = 9;

/// A typed tag value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Int16(Vec<u16>),
    Int32(Vec<u32>),
    String(String),
    Bin(Vec<u8>),
    StringArray(Vec<String>),
    I18nString(Vec<String>),
}

impl TagValue {
    pub fn type_id(&self) -> u32 {
        match self {
            Self::Int16(_) => TYPE_INT16,
            Self::Int32(_) => TYPE_INT32,
            Self::String(_) => TYPE_STRING,
            Self::Bin(_) => TYPE_BIN,
            Self::StringArray(_) => TYPE_STRING_ARRAY,
            Self::I18nString(_) => TYPE_I18NSTRING,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Self::Int16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::String(_) => 1,
            Self::Bin(v) => v.len(),
            Self::StringArray(v) | Self::I18nString(v) => v.len(),
        }
    }

    fn alignment(&self) -> usize {
        match self {
            Self::Int16(_) => 2,
            Self::Int32(_) => 4,
            _ => 1,
        }
    }

    fn strings(&self) -> Vec<&str> {
        match self {
            Self::String(s) => vec![s.as_str()],
            Self::StringArray(v) | Self::I18nString(v) => v.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    fn encode(&self, store: &mut Vec<u8>) {
        match self {
            Self::Int16(values) => {
                for v in values {
                    store.extend_from_slice(&v.to_be_bytes());
                }
            }
            Self::Int32(values) => {
                for v in values {
                    store.extend_from_slice(&v.to_be_bytes());
                }
            }
            Self::Bin(bytes) => store.extend_from_slice(bytes),
            Self::String(_) | Self::StringArray(_) | Self::I18nString(_) => {
                for s in self.strings() {
                    store.extend_from_slice(s.as_bytes());
                    store.push(0);
                }
            }
        }
    }
}

/// An RPM header under construction
#[derive(Debug, Clone)]
pub struct Header {
    region: u32,
    entries: BTreeMap<u32, TagValue>,
}

impl Header {
    /// Create an empty header sealed by `region` (62 or 63)
    pub fn new(region: impl Into<u32>) -> Self {
        Self {
            region: region.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Set a tag, replacing any earlier value
    pub fn insert(&mut self, tag: impl Into<u32>, value: TagValue) -> Result<()> {
        let tag = tag.into();
        if tag <= self.region {
            return Err(Error::format(format!(
                "tag {} must sort after region tag {}",
                tag, self.region
            )));
        }
        if value.count() == 0 {
            return Err(Error::format(format!("tag {} has no values", tag)));
        }
        if value.strings().iter().any(|s| s.contains('\0')) {
            return Err(Error::format(format!("tag {} contains a NUL byte", tag)));
        }
        self.entries.insert(tag, value);
        Ok(())
    }

    pub fn get(&self, tag: impl Into<u32>) -> Option<&TagValue> {
        self.entries.get(&tag.into())
    }

    /// Fail if any of `tags` is unset
    pub fn require(&self, tags: &[u32]) -> Result<()> {
        match tags.iter().find(|t| !self.entries.contains_key(t)) {
            Some(missing) => Err(Error::format(format!(
                "required header tag {} is missing",
                missing
            ))),
            None => Ok(()),
        }
    }

    /// Serialize the header, region entry first
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut store = Vec::new();
        let mut index = Vec::with_capacity(self.entries.len());

        for (&tag, value) in &self.entries {
            let align = value.alignment();
            store.resize(store.len().next_multiple_of(align), 0);
            index.push((tag, value.type_id(), to_u32(store.len())?, to_u32(value.count())?));
            value.encode(&mut store);
        }

        let entry_count = index.len() + 1;
        let region_offset = to_u32(store.len())?;
        let index_size = to_u32(entry_count * INDEX_ENTRY_SIZE)?;
        // Trailer: same shape as an index entry, offset is -(index size)
        store.extend_from_slice(&self.region.to_be_bytes());
        store.extend_from_slice(&TYPE_BIN.to_be_bytes());
        store.extend_from_slice(&index_size.wrapping_neg().to_be_bytes());
        store.extend_from_slice(&(INDEX_ENTRY_SIZE as u32).to_be_bytes());

        let mut out =
            Vec::with_capacity(HEADER_MAGIC.len() + 8 + entry_count * INDEX_ENTRY_SIZE + store.len());
        out.extend_from_slice(&HEADER_MAGIC);
        out.extend_from_slice(&to_u32(entry_count)?.to_be_bytes());
        out.extend_from_slice(&to_u32(store.len())?.to_be_bytes());

        let region = (self.region, TYPE_BIN, region_offset, INDEX_ENTRY_SIZE as u32);
        for (tag, kind, offset, count) in std::iter::once(region).chain(index) {
            out.extend_from_slice(&tag.to_be_bytes());
            out.extend_from_slice(&kind.to_be_bytes());
            out.extend_from_slice(&offset.to_be_bytes());
            out.extend_from_slice(&count.to_be_bytes());
        }
        out.extend_from_slice(&store);
        Ok(out)
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::format(format!("header value {} overflows u32", value)))
}
