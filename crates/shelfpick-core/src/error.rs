//! Error handling for ShelfPick
//!
//! Provides error types for all layers of the client:
//! - Resolve errors (article lookup against the catalog)
//! - Connection errors (link lifecycle and command dispatch)
//! - Link faults (fatal read errors raised on the reader thread)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Article resolution error type
///
/// Raised by the location resolver. None of these ever reach the link.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Nothing left to look up after trimming
    #[error("No article name given")]
    EmptyInput,

    /// Neither an alias nor a canonical article matched
    #[error("Article '{article}' not found in catalog")]
    NotFound {
        /// The input as the operator typed it (trimmed).
        article: String,
    },

    /// The shelf exists but no X position is configured for it
    #[error("No X position configured for shelf {shelf} (article '{article}')")]
    ConfigMissingPosition {
        /// The canonical article name.
        article: String,
        /// The shelf the article maps to.
        shelf: u32,
    },
}

/// Connection error type
///
/// Represents errors related to the serial link lifecycle and to writing
/// commands over it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// A command was attempted with no open link
    #[error("Not connected")]
    NotConnected,

    /// Connect was called while a link is already open
    #[error("Already connected to {port}")]
    AlreadyConnected {
        /// The port of the open link.
        port: String,
    },

    /// The transport refused to open the port
    #[error("Failed to open port {port}: {reason}")]
    LinkOpenFailed {
        /// The name of the port that failed to open.
        port: String,
        /// The transport's message.
        reason: String,
    },

    /// A write failed on an otherwise established link
    #[error("Send failed: {reason}")]
    TransportWriteFailed {
        /// The transport's message.
        reason: String,
    },

    /// The previous reader thread has not exited yet
    #[error("Previous link reader is still running")]
    ReaderStillRunning,
}

/// Fatal read error reported by the link reader
///
/// The reader sends exactly one of these down its channel and then exits.
/// The display form is the sentinel line shown in the session log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[LINK ERROR] {detail}")]
pub struct LinkFault {
    /// The transport's message.
    pub detail: String,
}

impl LinkFault {
    /// Create a new link fault
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Main error type for ShelfPick
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Resolve error
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a resolve error
    pub fn is_resolve_error(&self) -> bool {
        matches!(self, Error::Resolve(_))
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if the error means "connect first"
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Error::Connection(ConnectionError::NotConnected))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
