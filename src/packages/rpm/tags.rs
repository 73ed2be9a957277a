// src/packages/rpm/tags.rs
//! RPM header tag numbers and flag values
//!
//! Numbers follow `rpmtag.h` from rpm 4.x.

/// Main header tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum Tag {
    HeaderSignatures = 62,
    HeaderImmutable = 63,
    HeaderI18nTable = 100,

    Name = 1000,
    Version = 1001,
    Release = 1002,
    Summary = 1004,
    Description = 1005,
    BuildTime = 1006,
    BuildHost = 1007,
    Size = 1009,
    License = 1014,
    Packager = 1015,
    Group = 1016,
    Url = 1020,
    Os = 1021,
    Arch = 1022,

    PreIn = 1023,
    PostIn = 1024,
    PreUn = 1025,
    PostUn = 1026,

    FileSizes = 1028,
    FileModes = 1030,
    FileRdevs = 1033,
    FileMtimes = 1034,
    FileDigests = 1035,
    FileLinkTos = 1036,
    FileFlags = 1037,
    FileUserName = 1039,
    FileGroupName = 1040,
    SourceRpm = 1044,

    ProvideName = 1047,
    RequireFlags = 1048,
    RequireName = 1049,
    RequireVersion = 1050,

    PreInProg = 1085,
    PostInProg = 1086,
    PreUnProg = 1087,
    PostUnProg = 1088,

    FileDevices = 1095,
    FileInodes = 1096,
    FileLangs = 1097,
    ProvideFlags = 1112,
    ProvideVersion = 1113,
    DirIndexes = 1116,
    BaseNames = 1117,
    DirNames = 1118,

    PayloadFormat = 1124,
    PayloadCompressor = 1125,
    PayloadFlags = 1126,

    FileDigestAlgo = 5011,
    PayloadDigest = 5092,
    PayloadDigestAlgo = 5093,
}

impl From<Tag> for u32 {
    fn from(tag: Tag) -> u32 {
        tag as u32
    }
}

/// Signature header tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum SignatureTag {
    HeaderSignatures = 62,
    Sha256 = 273,
    Size = 1000,
    Md5 = 1004,
    PayloadSize = 1007,
}

impl From<SignatureTag> for u32 {
    fn from(tag: SignatureTag) -> u32 {
        tag as u32
    }
}

pub const RPMSENSE_LESS: u32 = 1 << 1;
pub const RPMSENSE_GREATER: u32 = 1 << 2;
pub const RPMSENSE_EQUAL: u32 = 1 << 3;
/// Marks an `rpmlib(...)` feature requirement
pub const RPMSENSE_RPMLIB: u32 = 1 << 24;

/// RPMFILE_CONFIG
pub const RPMFILE_CONFIG: u32 = 1 << 0;
/// RPMFILE_NOREPLACE
pub const RPMFILE_NOREPLACE: u32 = 1 << 4;

/// Interpreter recorded for maintainer scripts
pub const SCRIPT_INTERPRETER: &str = "/bin/sh";
