//! Error types for raster access.

use thiserror::Error;

/// Errors raised by a raster source or dataset.
///
/// All of these are treated as recoverable I/O failures by the drilling
/// engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    /// The location could not be opened.
    #[error("failed to open raster: {0}")]
    OpenFailed(String),

    /// Pixel data could not be read.
    #[error("failed to read raster data: {0}")]
    ReadFailed(String),

    /// The requested sub-resource (band, channel, format) is not supported.
    #[error("unsupported raster resource: {0}")]
    Unsupported(String),

    /// The window does not lie within the grid.
    #[error("window {window} is outside the {ncols}x{nrows} grid")]
    WindowOutOfRange {
        window: String,
        ncols: usize,
        nrows: usize,
    },

    /// Supplied metadata or band data is inconsistent.
    #[error("invalid raster metadata: {0}")]
    InvalidMetadata(String),
}

impl RasterError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create an Unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }
}

/// Result type for raster access operations.
pub type Result<T> = std::result::Result<T, RasterError>;
