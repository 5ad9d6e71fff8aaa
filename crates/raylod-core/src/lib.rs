//! Core types, math, and errors for raylod.
//!
//! This crate provides the foundational types shared by the estimator crates:
//! - Rays, bounding boxes, and per-instance transforms
//! - Barycentric hit coordinates and texture dimensions
//! - Common error types

pub mod error;
pub mod math;
pub mod types;

pub use error::{Error, Result};
pub use math::{Aabb, InstanceTransform, Ray};
pub use types::{Barycentrics, TextureDims};

/// Workspace-wide constants
pub mod constants {
    /// Smallest triangle area (world or texture space) used when forming the
    /// per-triangle LOD constant. Smaller areas are clamped to this value.
    pub const DEGENERATE_AREA_EPSILON: f32 = 1.0e-12;
    /// Offset applied along the surface normal when spawning secondary rays
    pub const SECONDARY_RAY_OFFSET: f32 = 1.0e-4;
    /// Number of entries in the debug rainbow palette
    pub const RAINBOW_COLOR_COUNT: usize = 7;
}
