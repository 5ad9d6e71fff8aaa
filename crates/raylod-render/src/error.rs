//! Render error types.

use thiserror::Error;

/// Errors raised while building scenes, tracing frames or writing images.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Geometry access failed.
    #[error("Geometry error: {0}")]
    Geometry(#[from] raylod_core::Error),

    /// Configuration rejected before tracing.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Referenced mesh does not exist in the scene.
    #[error("Unknown mesh id {0}")]
    UnknownMesh(usize),

    /// Pixel data was the wrong size for the image.
    #[error("Invalid image data")]
    InvalidImageData,

    /// Failed to encode or write an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, RenderError>;
