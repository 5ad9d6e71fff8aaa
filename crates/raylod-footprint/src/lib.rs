//! Texture footprint estimators for ray-traced texture LOD selection.
//!
//! Two independent models of how much texture a ray covers at a hit:
//! - Ray cones: a width and a spread angle, propagated by scalar arithmetic
//! - Ray differentials (Igehy 1999): screen-space derivatives of the ray
//!   origin and direction
//!
//! Both are immutable value types. Each propagation step returns a new value
//! for the next hit along the same path.

pub mod cone;
pub mod differential;
pub mod lod;
pub mod packed;
pub mod screen_space;

pub use cone::{pixel_spread_angle, ConeStorage, RayCone};
pub use differential::{initial_ray_differential, RayDifferential, UvFootprint};
pub use lod::LodRange;
pub use packed::PackedRayCone;
pub use screen_space::{
    estimate_surface_spread_angle, ScreenDerivatives, SpreadAngleCalibration, SurfaceDerivatives,
};
