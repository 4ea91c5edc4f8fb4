//! Error types for the nexus client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, protocol, input validation, download, upload, cache and
//! path planning failures.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The unified error type for nexus operations.
///
/// Callers match on the variant to decide whether a failure is fatal to a
/// whole command or only to a single item of a batch.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered a request with a non-success status.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (pattern, host URL, asset path, property).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// A single asset download failed; the partial file was removed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The server rejected an upload.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Search cache errors.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Two assets would be written to the same local path.
    #[error(transparent)]
    PathCollision(#[from] PathCollisionError),

    /// Local filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// TLS/SSL error.
    #[error("TLS error: {message}")]
    Tls { message: String },

    /// Request timed out.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Generic HTTP error, including broken response bodies.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Protocol-level errors from REST responses.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Error message from the server, if the body carried one.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self { status, message }
    }

    /// Check if the server refused our credentials.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid wildcard search pattern.
    #[error("invalid pattern '{value}': {reason}")]
    Pattern { value: String, reason: String },

    /// Invalid repository host URL.
    #[error("invalid host URL '{value}': {reason}")]
    HostUrl { value: String, reason: String },

    /// An asset path that cannot be mapped under the output directory.
    #[error("invalid asset path '{value}': {reason}")]
    AssetPath { value: String, reason: String },

    /// Invalid upload property.
    #[error("invalid property '{value}': {reason}")]
    Property { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

/// A failed asset download.
#[derive(Debug, Error)]
#[error("download to {} failed: {cause}", .path.display())]
pub struct DownloadError {
    /// Destination the asset was being written to.
    pub path: PathBuf,
    /// What went wrong.
    #[source]
    pub cause: Box<Error>,
}

impl DownloadError {
    pub fn new(path: impl Into<PathBuf>, cause: impl Into<Error>) -> Self {
        Self {
            path: path.into(),
            cause: Box::new(cause.into()),
        }
    }
}

/// A rejected component upload.
#[derive(Debug)]
pub struct UploadError {
    /// HTTP status code.
    pub status: u16,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upload rejected with HTTP {}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for UploadError {}

/// Search cache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No search has been cached yet.
    #[error("no cached search results; run a search first")]
    Empty,

    /// The requested record does not exist.
    #[error("cache record '{id}' not found")]
    NotFound { id: String },

    /// Reading or writing a cache file failed.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache file exists but cannot be parsed.
    #[error("corrupt cache file {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}

/// Two different remote assets flatten to the same local path.
#[derive(Debug, Error)]
#[error(
    "'{first}' and '{second}' would both be written to {}",
    .local_path.display()
)]
pub struct PathCollisionError {
    /// The contested destination.
    pub local_path: PathBuf,
    /// Remote path planned first.
    pub first: String,
    /// Remote path that collided with it.
    pub second: String,
}
