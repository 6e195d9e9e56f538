//! Error types for CRS construction and transformation.

use thiserror::Error;

/// Errors raised while building a CRS or transforming coordinates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// The authority code is not in the definition database.
    #[error("EPSG:{0} is not in the CRS definition database")]
    UnknownCode(u32),

    /// The PROJ definition could not be parsed.
    #[error("invalid projection definition '{definition}': {message}")]
    InvalidDefinition { definition: String, message: String },

    /// A coordinate could not be transformed.
    #[error("transform from {from} to {to} failed: {message}")]
    TransformFailed {
        from: String,
        to: String,
        message: String,
    },
}

impl ProjectionError {
    pub fn invalid_definition(definition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            definition: definition.into(),
            message: message.into(),
        }
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
