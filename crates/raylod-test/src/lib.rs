//! Test harness for raylod.
//!
//! Provides canonical scenes and headless comparison of LOD strategies.

pub mod harness;
pub mod scenes;

pub use harness::{ComparisonReport, StrategyComparison};
pub use scenes::{mirror_corridor, sphere_on_plane, textured_plane, SceneKind, TestScene};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestError {
    #[error("Render error: {0}")]
    Render(#[from] raylod_render::RenderError),
    #[error("Geometry error: {0}")]
    Geometry(#[from] raylod_core::Error),
    #[error("Frame comparison failed: {0}")]
    Comparison(String),
    #[error("Unknown scene: {0}")]
    UnknownScene(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, TestError>;

/// Strategy comparison configuration.
#[derive(Debug, Clone)]
pub struct ComparisonConfig {
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Maximum allowed per-pixel lambda difference, in mip levels.
    pub threshold: f32,
    /// Directory for rendered and difference images.
    pub output_dir: String,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            width: 129,
            height: 129,
            threshold: 0.5,
            output_dir: "target/test_output".to_string(),
        }
    }
}
