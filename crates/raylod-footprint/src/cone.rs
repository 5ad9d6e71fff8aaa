//! Ray cone footprint model.
//!
//! A ray cone describes the footprint of a pixel as a cone around the ray:
//! `width` is the cone's diameter at the current hit and `spread_angle` is how
//! fast that diameter grows per unit of distance. Surfaces add their own
//! curvature term to the spread angle at each bounce.

use glam::Vec3;
use raylod_core::TextureDims;
use serde::{Deserialize, Serialize};

/// Cone footprint state at a point along a ray path.
///
/// `spread_angle` may be negative for converging cones (e.g. after a concave
/// reflector).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RayCone {
    width: f32,
    spread_angle: f32,
}

impl RayCone {
    /// Create a cone from its width and spread angle.
    #[inline]
    pub const fn new(width: f32, spread_angle: f32) -> Self {
        Self {
            width,
            spread_angle,
        }
    }

    /// Cone for a primary ray leaving a pinhole camera: zero width at the eye.
    #[inline]
    pub const fn primary(pixel_spread_angle: f32) -> Self {
        Self::new(0.0, pixel_spread_angle)
    }

    /// Footprint width at the current hit.
    #[inline]
    pub const fn width(self) -> f32 {
        self.width
    }

    /// Growth of the width per unit of distance.
    #[inline]
    pub const fn spread_angle(self) -> f32 {
        self.spread_angle
    }

    /// Advance the cone by `hit_distance` and add the surface curvature term
    /// (β) of the surface that was hit.
    ///
    /// Must be applied once per hit, in traversal order.
    #[inline]
    #[must_use]
    pub fn propagate(self, surface_spread_angle: f32, hit_distance: f32) -> Self {
        Self {
            width: self.spread_angle * hit_distance + self.width,
            spread_angle: self.spread_angle + surface_spread_angle,
        }
    }

    /// Texture LOD at the current hit.
    ///
    /// Uses the already-propagated width, so call [`Self::propagate`] for the
    /// hit first. `tri_lod_constant` comes from the hit triangle. The result is
    /// `+inf` for rays tangent to the surface; callers clamp to the mip range.
    #[inline]
    pub fn compute_lod(
        self,
        tri_lod_constant: f32,
        ray_direction: Vec3,
        surface_normal: Vec3,
        texture: TextureDims,
    ) -> f32 {
        let dist_term = self.width * self.width;
        let normal_term = ray_direction.dot(surface_normal);
        let texels = texture.width as f32 * texture.height as f32;
        tri_lod_constant + 0.5 * (texels * dist_term / (normal_term * normal_term)).log2()
    }
}

/// Spread angle of one pixel for a pinhole camera.
///
/// `vertical_fov` is in radians.
#[inline]
pub fn pixel_spread_angle(vertical_fov: f32, viewport_height: u32) -> f32 {
    (2.0 * (vertical_fov * 0.5).tan() / viewport_height as f32).atan()
}

/// Storage encoding for a [`RayCone`] carried in a ray payload.
///
/// The full-precision cone and the half-packed cone behave identically apart
/// from rounding; the encoding is chosen once per pipeline.
pub trait ConeStorage: Copy + Send + Sync + 'static {
    /// Store a cone.
    fn encode(cone: RayCone) -> Self;

    /// Load the stored cone.
    fn decode(self) -> RayCone;

    /// Footprint width at the current hit.
    #[inline]
    fn width(self) -> f32 {
        self.decode().width()
    }

    /// Growth of the width per unit of distance.
    #[inline]
    fn spread_angle(self) -> f32 {
        self.decode().spread_angle()
    }
}

impl ConeStorage for RayCone {
    #[inline]
    fn encode(cone: RayCone) -> Self {
        cone
    }

    #[inline]
    fn decode(self) -> RayCone {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TEX_1K: TextureDims = TextureDims::square(1024);

    #[test]
    fn propagate_is_linear_in_distance() {
        let (w, a, beta, t) = (0.25_f32, 0.01_f32, 0.002_f32, 10.0_f32);
        let cone = RayCone::new(w, a).propagate(beta, t);
        assert_eq!(cone.width(), a * t + w);
        assert_eq!(cone.spread_angle(), a + beta);
    }

    #[test]
    fn zero_distance_keeps_width() {
        let cone = RayCone::new(0.5, 0.1);
        for beta in [-1.0, 0.0, 0.3] {
            let next = cone.propagate(beta, 0.0);
            assert_eq!(next.width(), 0.5);
            assert_eq!(next.spread_angle(), 0.1 + beta);
        }
    }

    #[test]
    fn negative_spread_narrows_the_cone() {
        let cone = RayCone::new(1.0, -0.1).propagate(0.0, 5.0);
        assert_relative_eq!(cone.width(), 0.5);
    }

    #[test]
    fn lod_of_one_texel_footprint_is_zero() {
        let cone = RayCone::new(1.0 / 1024.0, 0.0);
        let lambda = cone.compute_lod(0.0, Vec3::NEG_Z, Vec3::Z, TEX_1K);
        assert_relative_eq!(lambda, 0.0, epsilon = 1e-5);

        let cone = RayCone::new(2.0 / 1024.0, 0.0);
        let lambda = cone.compute_lod(0.0, Vec3::NEG_Z, Vec3::Z, TEX_1K);
        assert_relative_eq!(lambda, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn lod_adds_triangle_constant() {
        let cone = RayCone::new(1.0 / 1024.0, 0.0);
        let lambda = cone.compute_lod(-2.5, Vec3::NEG_Z, Vec3::Z, TEX_1K);
        assert_relative_eq!(lambda, -2.5, epsilon = 1e-5);
    }

    #[test]
    fn lod_is_monotonic_in_width() {
        let dir = Vec3::new(0.3, -0.2, -1.0).normalize();
        let normal = Vec3::Z;
        let mut previous = f32::NEG_INFINITY;
        for i in 1..64 {
            let cone = RayCone::new(i as f32 * 0.001, 0.01);
            let lambda = cone.compute_lod(0.7, dir, normal, TEX_1K);
            assert!(lambda >= previous, "lambda decreased at width step {i}");
            previous = lambda;
        }
    }

    #[test]
    fn oblique_hits_select_coarser_mips() {
        let cone = RayCone::new(0.01, 0.0);
        let head_on = cone.compute_lod(0.0, Vec3::NEG_Z, Vec3::Z, TEX_1K);
        let oblique = cone.compute_lod(0.0, Vec3::new(1.0, 0.0, -1.0).normalize(), Vec3::Z, TEX_1K);
        // cos(45°) halves the squared normal term: +0.5 mip.
        assert_relative_eq!(oblique - head_on, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn grazing_ray_is_unbounded() {
        let cone = RayCone::new(0.01, 0.0);
        let lambda = cone.compute_lod(0.0, Vec3::X, Vec3::Z, TEX_1K);
        assert!(lambda.is_infinite() && lambda > 0.0);
    }

    #[test]
    fn pixel_spread_angle_for_square_frustum() {
        let angle = pixel_spread_angle(std::f32::consts::FRAC_PI_2, 2);
        assert_relative_eq!(angle, std::f32::consts::FRAC_PI_4, epsilon = 1e-6);
        assert_eq!(RayCone::primary(angle).width(), 0.0);
    }
}
