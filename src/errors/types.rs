//! Error type definitions for the logo cache
//!
//! Storage problems are fatal to the cache and surface to the caller.
//! Fetch problems are recoverable: the cache converts them into an
//! absent logo, so `FetchError` rarely escapes the library.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// The cache directory or a cache file could not be created or written
    #[error("Storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Errors raised while obtaining logo bytes from a fetch source
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level HTTP failures (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status other than 404
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The response was not an image
    #[error("Not an image: content type '{content_type}'")]
    NotAnImage { content_type: String },

    /// Response body over the configured limit
    #[error("Image too large: {size} bytes (max: {max_size})")]
    TooLarge { size: usize, max_size: usize },

    /// Bytes that do not decode as a supported image format
    #[error("Invalid image data: {message}")]
    InvalidImage { message: String },

    /// URL template could not produce a valid URL
    #[error("Invalid URL template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    /// Local read failures in file-backed sources
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Create a storage error for a path
    pub fn storage<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

impl FetchError {
    /// Create an invalid image error
    pub fn invalid_image<S: Into<String>>(message: S) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }

    /// Create an invalid template error
    pub fn invalid_template<T: Into<String>, M: Into<String>>(template: T, message: M) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            message: message.into(),
        }
    }
}
