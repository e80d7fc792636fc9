//! Error taxonomy for the rendering pipeline.
//!
//! Errors never cross the public entry points of [`IconComposer`]: they are
//! logged and folded into `None` so callers always fall back to a default
//! icon. Internal helpers use [`IconError`] with `?` to keep the paths short.
//!
//! [`IconComposer`]: crate::IconComposer

/// Everything that can go wrong while producing or restoring an icon.
#[derive(Debug, thiserror::Error)]
pub enum IconError {
    /// A resource lookup or decode failed; treated as "no icon".
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// A persisted byte stream is truncated or carries an unknown tag.
    #[error("malformed persisted data: {0}")]
    MalformedPersistedData(String),

    /// The source has no visible extent.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("svg error: {0}")]
    Svg(#[from] resvg::usvg::Error),
}

impl IconError {
    /// Returns true for failures that callers recover from by regenerating
    /// or substituting a default icon.
    ///
    /// Only codec failures while *writing* are not recoverable this way.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Image(image::ImageError::Encoding(_)))
    }
}

pub type Result<T> = std::result::Result<T, IconError>;
