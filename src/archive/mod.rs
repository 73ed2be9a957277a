// src/archive/mod.rs
//! Format-neutral archive building blocks
//!
//! Both package formats are assembled from the same parts:
//! - [`ArchiveMember`]: one file or directory with its metadata and bytes
//! - [`ChecksumLedger`]: per-file content digests in add order
//! - [`PayloadArchiver`]: an ordered member tree serialized as tar or cpio
//!   and compressed with the package's codec

pub mod cpio;
pub mod ledger;
pub mod member;
pub mod payload;

pub use ledger::{ChecksumLedger, LedgerEntry};
pub use member::{member_name, normalize_target, ArchiveMember, MemberKind, MemberNaming};
pub use payload::{Payload, PayloadArchiver};
