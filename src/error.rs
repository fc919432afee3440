//! Crate-wide error type.
//!
//! Follows the teacher crate's small-`Copy`-enum-per-module style
//! (`block::compress::Lz4Error`) but centralized into one enum, since the
//! engine has many more failure sites feeding into a single dispatcher than
//! a standalone block codec does. `anyhow` is still used at the CLI boundary
//! to attach file/context to a `SeqzipError` for display.

use std::fmt;
use std::io;

/// The four error kinds from the error-handling design (user/environment,
/// source data, invariant violation, resource). Each maps to a distinct
/// process exit code.
#[derive(Debug)]
pub enum SeqzipError {
    /// Bad flag combination, missing file, permission denied, output exists
    /// without `--force`. Exit code 1.
    User(String),
    /// Truncated input, unparseable record, required column missing.
    /// Carries enough context to report file/VB/line. Exit code 2.
    SourceData {
        message: String,
        vblock_i: Option<u32>,
    },
    /// Internal invariant broken (merge saw inconsistent state, section size
    /// mismatch on a `--test` roundtrip). Not recoverable; exit code 70
    /// (EX_SOFTWARE) since it indicates a bug, not a bad run.
    Invariant(String),
    /// Out of memory, thread spawn failure, I/O error talking to an
    /// external decompressor. Exit code 3.
    Resource(String),
}

impl SeqzipError {
    /// Process exit code for this error kind, per spec §6/§7.
    pub fn exit_code(&self) -> i32 {
        match self {
            SeqzipError::User(_) => 1,
            SeqzipError::SourceData { .. } => 2,
            SeqzipError::Resource(_) => 3,
            SeqzipError::Invariant(_) => 70,
        }
    }

    pub fn source_data(message: impl Into<String>, vblock_i: Option<u32>) -> Self {
        SeqzipError::SourceData {
            message: message.into(),
            vblock_i,
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        SeqzipError::Invariant(message.into())
    }

    pub fn resource(message: impl Into<String>) -> Self {
        SeqzipError::Resource(message.into())
    }
}

impl fmt::Display for SeqzipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeqzipError::User(m) => write!(f, "{m}"),
            SeqzipError::SourceData { message, vblock_i } => match vblock_i {
                Some(vb) => write!(f, "vb={vb}: {message}"),
                None => write!(f, "{message}"),
            },
            SeqzipError::Invariant(m) => write!(f, "internal error: {m}"),
            SeqzipError::Resource(m) => write!(f, "resource error: {m}"),
        }
    }
}

impl std::error::Error for SeqzipError {}

impl From<io::Error> for SeqzipError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                SeqzipError::User(e.to_string())
            }
            io::ErrorKind::UnexpectedEof => SeqzipError::source_data(e.to_string(), None),
            _ => SeqzipError::resource(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SeqzipError>;
