//! Runtime error types.
//!
//! Every failure here is terminal for the run: it is raised before matching
//! starts and names the file or directory involved.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use deobfs_engine::invariants::InvariantViolation;

use crate::parser::ParseError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "source directory {0} does not exist; generate the decompiled .proto files into it first"
    )]
    MissingSourceDir(PathBuf),

    #[error("source directory {0} is empty; generate the decompiled .proto files into it first")]
    EmptySourceDir(PathBuf),

    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("decoding descriptor set {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: prost::DecodeError,
    },

    #[error("reading descriptor JSON {path}: {source}")]
    DescriptorJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid descriptor loaded from {dir}: {source}")]
    InvalidDescriptor {
        dir: PathBuf,
        #[source]
        source: InvariantViolation,
    },

    #[error("config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("serializing report: {0}")]
    Report(#[from] serde_json::Error),
}

impl RuntimeError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RuntimeError::Io { path: path.into(), source }
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
