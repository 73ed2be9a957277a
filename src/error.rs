// src/error.rs

//! Crate-wide error type
//!
//! Every component reports failures through [`Error`] without local recovery.
//! The [`crate::builder::PackageBuilder`] facade is the only place that wraps
//! an error with the build stage it came from.

use crate::builder::BuildStage;
use crate::compression::CompressionError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A required manifest field is missing or malformed
    #[error("invalid manifest: {0}")]
    Validation(String),

    /// I/O failure not tied to a particular path (in-memory writers)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// I/O failure reading a source file or writing the output package
    #[error("failed to access '{path}': {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An internal invariant was violated while laying out binary structures
    #[error("malformed package data: {0}")]
    Format(String),

    #[error(transparent)]
    Compression(#[from] CompressionError),

    /// Context added by the build facade
    #[error("{stage} failed: {source}")]
    Stage {
        stage: BuildStage,
        #[source]
        source: Box<Error>,
    },
}

/// Coarse classification of an [`Error`], looking through stage wrappers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Io,
    Format,
}

impl Error {
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Io(_) | Self::File { .. } | Self::Compression(_) => ErrorKind::Io,
            Self::Format(_) => ErrorKind::Format,
            Self::Stage { source, .. } => source.kind(),
        }
    }

    /// The stage recorded by the facade, if any
    pub fn stage(&self) -> Option<BuildStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_looks_through_stage() {
        let err = Error::Stage {
            stage: BuildStage::Validate,
            source: Box::new(Error::validation("package name cannot be empty")),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.stage(), Some(BuildStage::Validate));
        assert!(err.to_string().contains("validating manifest"));
    }

    #[test]
    fn test_file_error_names_path() {
        let err = Error::file(
            "/nonexistent/README",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("/nonexistent/README"));
    }
}
