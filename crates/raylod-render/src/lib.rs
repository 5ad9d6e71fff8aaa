//! CPU reference tracer for ray-traced texture LOD.
//!
//! This crate provides:
//! - Instanced triangle scenes and a pinhole camera
//! - Ray cone and ray differential estimators behind one interface
//! - A G-buffer for screen-space surface spread angles
//! - Per-pixel LOD frames with debug visualizations and image output

pub mod camera;
pub mod config;
pub mod debug;
pub mod error;
pub mod estimator;
pub mod gbuffer;
pub mod scene;
pub mod screenshot;
pub mod tracer;

pub use camera::{Camera, CameraBasis, PrimaryRay};
pub use config::{ConeEncoding, LodConfig, LodStrategy, RenderConfig, SurfaceSpread};
pub use debug::{lambda_to_rainbow_color, DebugView, RAINBOW_COLORS};
pub use error::{RenderError, Result};
pub use estimator::{
    FootprintEstimator, HitFootprint, RayConeEstimator, RayDifferentialEstimator, SurfaceHit,
};
pub use gbuffer::{GBuffer, GBufferSample};
pub use scene::{intersect_triangle, Instance, Material, MeshId, Scene, SceneHit};
pub use screenshot::{save_debug_view, save_rgba};
pub use tracer::{LodFrame, LodStats, LodTracer, PixelLod};
