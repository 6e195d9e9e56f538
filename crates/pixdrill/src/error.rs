//! Error types for pixel drilling.

use projection::ProjectionError;
use raster_access::RasterError;
use thiserror::Error;

/// Errors that can occur while drilling.
///
/// Geometry and validation failures are returned to the caller. Raster I/O
/// failures are carried in [`DrillError::Raster`]; the item driller converts
/// those into a rolled-back read instead of returning them.
#[derive(Error, Debug, Clone)]
pub enum DrillError {
    /// A CRS is neither projected nor geographic.
    #[error("unknown CRS class for {role} CRS {crs}")]
    UnknownCrsClass { role: &'static str, crs: String },

    /// A circular footprint was requested on too small an array.
    #[error("circular footprint needs more than 4 pixels, array has {size}")]
    InsufficientPixels { size: usize },

    /// Standard statistics were requested on multi-band arrays.
    #[error("cannot calculate standard statistics for item {item_id}: {}", describe_bands(.offending))]
    MultibandAsset {
        item_id: String,
        /// (array index, band count) of every offending array.
        offending: Vec<(usize, usize)>,
    },

    /// Projection failure.
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// Raster I/O failure.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// Invalid argument supplied by the caller.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Catalog search failure.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    Task(String),
}

fn describe_bands(offending: &[(usize, usize)]) -> String {
    offending
        .iter()
        .map(|(idx, bands)| format!("array at index {} contains {} layers", idx, bands))
        .collect::<Vec<_>>()
        .join("; ")
}

impl DrillError {
    /// Create an InvalidArgument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a Catalog error.
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Whether this is a recoverable raster I/O failure.
    pub fn is_recoverable_io(&self) -> bool {
        matches!(self, Self::Raster(_))
    }
}

/// Result type for drilling operations.
pub type Result<T> = std::result::Result<T, DrillError>;
