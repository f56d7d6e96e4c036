//! Error types for screenshot reconstruction and verification

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for droidshot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while pulling, reconstructing or verifying screenshots
#[derive(Error, Debug)]
pub enum Error {
    /// The metadata manifest is not well-formed
    #[error(
        "Unable to parse metadata file {path}: {reason}. This commonly happens if the \
         on-device screenshot run did not finish cleanly (did you call \
         ScreenshotRunner.onDestroy() from your instrumentation?)"
    )]
    ManifestParseError { path: PathBuf, reason: String },

    /// The (0,0) tile of a screenshot is absent
    #[error("Missing root tile for screenshot '{name}': {path}")]
    MissingTileError { name: String, path: PathBuf },

    /// A raster file could not be read or decoded
    #[error("Failed to decode image {path}: {reason}")]
    ImageDecodeError { path: PathBuf, reason: String },

    /// A reconstructed image could not be encoded
    #[error("Failed to encode image: {0}")]
    ImageEncodeError(String),

    /// The baseline image a screenshot is compared against does not exist
    #[error("Expected file not found: {0}")]
    ExpectedFileMissingError(PathBuf),

    /// The device bridge failed
    #[error("Device transport error: {0}")]
    TransportError(String),

    /// Invalid run configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Filesystem error
    #[error("I/O error on {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an `io::Error` with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoError {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is scoped to a single screenshot, so a run can
    /// record it and carry on with the remaining entries.
    pub fn is_per_entry(&self) -> bool {
        matches!(
            self,
            Error::MissingTileError { .. }
                | Error::ImageDecodeError { .. }
                | Error::ExpectedFileMissingError(_)
        )
    }
}
