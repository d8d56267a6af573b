//! Error types for the glyph pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to the user for any surfaced failure. The tool stays
/// interactive afterwards, so the wording invites a retry.
pub const RETRY_MESSAGE: &str = "Failed to generate image. Please try again.";

/// Errors that can occur while composing, capturing or saving an image
#[derive(Error, Debug)]
pub enum Error {
    /// Input contained a character outside the allowed set
    #[error("Rejected input: {0}")]
    Validation(String),

    /// A glyph asset could not be fetched or decoded
    #[error("Failed to load glyph asset {path}: {reason}")]
    AssetLoad { path: String, reason: String },

    /// The rasterizer failed to produce an image
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Neither share nor download could deliver the image
    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error should be surfaced to the user as the single
    /// transient retry message.
    pub fn is_surfaced(&self) -> bool {
        !matches!(self, Error::Validation(_))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
