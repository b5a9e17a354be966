//! Error types for Folio.
//!
//! Every asynchronous step of the build and query phases returns
//! [`Result<T>`]. Errors are grouped by the stage that produced them so a
//! caller can tell an unusable index location apart from a malformed
//! document or a failed payload fetch.

use std::io;

use thiserror::Error;

/// The error type used throughout Folio.
#[derive(Error, Debug)]
pub enum FolioError {
    /// Opening, creating, reading or writing an index location failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The on-disk index content is missing or inconsistent.
    #[error("storage error: {0}")]
    Storage(String),

    /// Begin, commit or cancel of a transaction failed.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A document could not be tokenized, assembled or stored.
    #[error("document error: {0}")]
    Document(String),

    /// A source file could not be converted to text.
    #[error("conversion error ({status}): {message}")]
    Conversion {
        status: ConversionStatus,
        message: String,
    },

    /// A query was rejected or its execution failed.
    #[error("query error: {0}")]
    Query(String),

    /// A stored payload could not be retrieved for a match.
    #[error("payload error: {0}")]
    Payload(String),

    /// An argument was out of range or otherwise unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON or TOML (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A background task failed to complete.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Why a format conversion did not produce text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStatus {
    /// The MIME type could not be determined or is not supported.
    Type,
    /// The file extension is on the ignore list.
    Ignore,
    /// The source file could not be read.
    Filename,
    /// The file was read but its content could not be parsed.
    Filter,
}

impl std::fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConversionStatus::Type => "type",
            ConversionStatus::Ignore => "ignore",
            ConversionStatus::Filename => "filename",
            ConversionStatus::Filter => "filter",
        };
        f.write_str(name)
    }
}

impl FolioError {
    pub fn storage(msg: impl Into<String>) -> Self {
        FolioError::Storage(msg.into())
    }

    pub fn transaction(msg: impl Into<String>) -> Self {
        FolioError::Transaction(msg.into())
    }

    pub fn document(msg: impl Into<String>) -> Self {
        FolioError::Document(msg.into())
    }

    pub fn conversion(status: ConversionStatus, msg: impl Into<String>) -> Self {
        FolioError::Conversion {
            status,
            message: msg.into(),
        }
    }

    pub fn query(msg: impl Into<String>) -> Self {
        FolioError::Query(msg.into())
    }

    pub fn payload(msg: impl Into<String>) -> Self {
        FolioError::Payload(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        FolioError::InvalidArgument(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        FolioError::Internal(msg.into())
    }

    /// Returns true for transient I/O failures that a caller may retry.
    ///
    /// Everything else (corrupt index, bad document, malformed query) is
    /// structural: retrying the same step yields the same error.
    pub fn is_retryable(&self) -> bool {
        match self {
            FolioError::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::Interrupted
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::ResourceBusy
            ),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        FolioError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for FolioError {
    fn from(err: toml::de::Error) -> Self {
        FolioError::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for FolioError {
    fn from(err: tokio::task::JoinError) -> Self {
        FolioError::Internal(format!("background task failed: {err}"))
    }
}

/// Result type alias for Folio operations.
pub type Result<T> = std::result::Result<T, FolioError>;
