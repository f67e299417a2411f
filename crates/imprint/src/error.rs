//! Error taxonomy for stamping.
//!
//! Every variant is recoverable: the interaction loop logs it and carries on
//! with the next frame.

use thiserror::Error;

use crate::shape::ShapeId;

/// A resource a stamp needs that is not available yet (or anymore)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingResource {
    /// The binding was released and owns no buffers
    Buffer,
    /// No shape is registered under this id
    Shape(ShapeId),
    /// The compositor has no shape bound
    BoundShape,
    /// A non-anchor stamp arrived before the anchor positioned the window
    AnchorPosition,
}

impl std::fmt::Display for MissingResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingResource::Buffer => write!(f, "accumulation buffer"),
            MissingResource::Shape(id) => write!(f, "shape {}", id.0),
            MissingResource::BoundShape => write!(f, "bound shape"),
            MissingResource::AnchorPosition => write!(f, "anchor window position"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImprintError {
    #[error("Missing resource: {0}")]
    MissingResource(MissingResource),
    #[error("Degenerate surface: {0}")]
    DegenerateSurface(&'static str),
    #[error("No surface hit")]
    NoHit,
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl From<imprint_config::ConfigError> for ImprintError {
    fn from(err: imprint_config::ConfigError) -> Self {
        ImprintError::InvalidConfig(err.to_string())
    }
}

impl ImprintError {
    /// Whether this error only means "nothing to do this frame"
    pub fn is_no_hit(&self) -> bool {
        matches!(self, ImprintError::NoHit)
    }
}
