//! Structured error types for pcprof
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Malformed or unsupported profile stream
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("unsupported bit width: only 64-bit profiles are supported")]
    UnsupportedBitWidth,

    #[error("big-endian 64-bit profiles unsupported")]
    BigEndianUnsupported,

    #[error("invalid endianness marker ({first}, {second})")]
    InvalidEndianness { first: i32, second: i32 },

    #[error("unsupported version {0}")]
    UnsupportedVersion(u64),

    #[error("truncated profile")]
    Truncated,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An external symbolization step could not produce output
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed { tool: String, status: ExitStatus, stderr: String },

    #[error("Tool command is empty")]
    EmptyCommand,

    #[error("Failed to write address batch: {0}")]
    TempFile(std::io::Error),

    #[error("Failed to read source file {}: {source}", path.display())]
    SourceFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("DWARF resolution failed: {0}")]
    Dwarf(String),
}

/// Any fatal failure while building a profile
#[derive(Error, Debug)]
pub enum ProfilerError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Failed to open profile {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
