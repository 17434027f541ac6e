// src/error.rs

//! Error types for repository loading
//!
//! Every failure that can happen while loading a repository surfaces here
//! unmodified. Name lookups on a loaded repository never fail for absence;
//! only a broken backing store produces [`Error::Database`].

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Transport failures, split so that callers can tell "not there" apart
/// from everything else
#[derive(Error, Debug)]
pub enum TransportError {
    /// The server (or filesystem) has nothing at this URL
    #[error("Not found: {url}")]
    NotFound { url: String },

    /// Any non-success HTTP status other than not-found
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Connection, TLS, timeout or body read failure
    #[error("Failed to fetch {url}: {message}")]
    Request { url: String, message: String },
}

/// Errors returned by repository loading and querying
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Neither the direct index nor any mirror produced a repomd.xml
    #[error("{url} is not a repository (no repomd.xml and no usable mirror list)")]
    NotARepository { url: String },

    /// repomd.xml parsed, but lists neither `primary` nor `primary_db`
    #[error("Missing primary and primary_db in repomd.xml from {url}")]
    MissingPrimaryMetadata { url: String },

    /// A payload could not be decompressed or parsed
    #[error("Failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    /// An epoch that is not a non-negative integer
    #[error("Invalid epoch '{epoch}': not an unsigned integer")]
    Format { epoch: String },

    #[error("Checksum mismatch for {what}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        what: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid repository location: {0}")]
    InvalidLocation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Query-time failure of a relational backing store
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl Error {
    /// Shorthand for building a [`Error::Decode`]
    pub(crate) fn decode(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// True for the not-found class of transport errors, the only class
    /// that triggers mirror-list fallback
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Transport(TransportError::NotFound { .. }))
    }
}
