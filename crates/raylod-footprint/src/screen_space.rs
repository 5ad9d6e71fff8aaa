//! Surface spread angle from screen-space derivatives.
//!
//! Hybrid pipelines that rasterize primary visibility can estimate the ray
//! cone's surface curvature term (β) from the screen-space derivatives of the
//! G-buffer position and normal, instead of a ray-traced curvature estimate.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Source of screen-space partial derivatives of world position and normal.
///
/// This stands in for a rasterizer's `ddx`/`ddy`: any implementation that can
/// difference neighbouring pixels of a G-buffer qualifies.
pub trait ScreenDerivatives {
    /// dP/dx
    fn position_ddx(&self) -> Vec3;
    /// dP/dy
    fn position_ddy(&self) -> Vec3;
    /// dN/dx
    fn normal_ddx(&self) -> Vec3;
    /// dN/dy
    fn normal_ddy(&self) -> Vec3;
}

/// Precomputed screen-space derivatives of one pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceDerivatives {
    pub dp_dx: Vec3,
    pub dp_dy: Vec3,
    pub dn_dx: Vec3,
    pub dn_dy: Vec3,
}

impl ScreenDerivatives for SurfaceDerivatives {
    #[inline]
    fn position_ddx(&self) -> Vec3 {
        self.dp_dx
    }

    #[inline]
    fn position_ddy(&self) -> Vec3 {
        self.dp_dy
    }

    #[inline]
    fn normal_ddx(&self) -> Vec3 {
        self.dn_dx
    }

    #[inline]
    fn normal_ddy(&self) -> Vec3 {
        self.dn_dy
    }
}

/// Linear calibration `2 * beta * k1 + k2` applied to the raw curvature.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpreadAngleCalibration {
    pub k1: f32,
    pub k2: f32,
}

impl Default for SpreadAngleCalibration {
    fn default() -> Self {
        Self { k1: 1.0, k2: 0.0 }
    }
}

/// Surface spread angle β for [`crate::RayCone::propagate`].
///
/// The magnitude is the screen-space rate of change of the normal; the sign
/// is positive where the normal diverges along the surface (convex) and
/// negative where it converges (concave).
pub fn estimate_surface_spread_angle(derivatives: &impl ScreenDerivatives, k1: f32, k2: f32) -> f32 {
    let dn_dx = derivatives.normal_ddx();
    let dn_dy = derivatives.normal_ddy();
    let dp_dx = derivatives.position_ddx();
    let dp_dy = derivatives.position_ddy();

    let curvature = (dn_dx.length_squared() + dn_dy.length_squared()).sqrt();
    let beta = curvature * sign(dn_dx.dot(dp_dx) + dn_dy.dot(dp_dy));
    2.0 * beta * k1 + k2
}

/// `sign` with `sign(0) == 0`, unlike `f32::signum`.
#[inline]
fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn flat_surface_has_only_the_bias_term() {
        let flat = SurfaceDerivatives {
            dp_dx: Vec3::X * 0.01,
            dp_dy: Vec3::NEG_Y * 0.01,
            ..Default::default()
        };
        assert_eq!(estimate_surface_spread_angle(&flat, 1.0, 0.0), 0.0);
        assert_eq!(estimate_surface_spread_angle(&flat, 1.0, 0.25), 0.25);
    }

    #[test]
    fn convex_surface_spreads() {
        // Sphere seen head-on: the normal turns in the direction of travel.
        let convex = SurfaceDerivatives {
            dp_dx: Vec3::X * 0.01,
            dp_dy: Vec3::NEG_Y * 0.01,
            dn_dx: Vec3::X * 0.03,
            dn_dy: Vec3::NEG_Y * 0.04,
        };
        assert_relative_eq!(estimate_surface_spread_angle(&convex, 1.0, 0.0), 0.1, epsilon = 1e-6);
        assert_relative_eq!(estimate_surface_spread_angle(&convex, 0.5, 0.01), 0.06, epsilon = 1e-6);
    }

    #[test]
    fn concave_surface_converges() {
        let concave = SurfaceDerivatives {
            dp_dx: Vec3::X * 0.01,
            dp_dy: Vec3::NEG_Y * 0.01,
            dn_dx: Vec3::NEG_X * 0.03,
            dn_dy: Vec3::Y * 0.04,
        };
        assert_relative_eq!(estimate_surface_spread_angle(&concave, 1.0, 0.0), -0.1, epsilon = 1e-6);
    }

    #[test]
    fn perpendicular_normal_change_has_no_sign() {
        let twist = SurfaceDerivatives {
            dp_dx: Vec3::X * 0.01,
            dn_dx: Vec3::Z * 0.05,
            ..Default::default()
        };
        assert_eq!(estimate_surface_spread_angle(&twist, 1.0, 0.0), 0.0);
    }
}
