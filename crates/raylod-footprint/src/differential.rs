//! Ray differentials (Igehy, "Tracing Ray Differentials", SIGGRAPH 1999).
//!
//! A ray differential holds the partial derivatives of a ray's origin and
//! direction with respect to the screen-space pixel coordinates. Transferring
//! it to a hit gives the derivatives of the hit position, which the triangle
//! helper turns into UV derivatives and, for mirror bounces, into the
//! direction derivatives of the reflected ray.

use glam::{UVec2, Vec2, Vec3};
use raylod_core::TextureDims;
use serde::{Deserialize, Serialize};

/// Screen-space derivatives of a ray's origin and direction, in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RayDifferential {
    /// dO/dx
    pub do_dx: Vec3,
    /// dO/dy
    pub do_dy: Vec3,
    /// dD/dx
    pub dd_dx: Vec3,
    /// dD/dy
    pub dd_dy: Vec3,
}

impl RayDifferential {
    /// Create a differential from its four derivative vectors.
    #[inline]
    pub const fn new(do_dx: Vec3, do_dy: Vec3, dd_dx: Vec3, dd_dy: Vec3) -> Self {
        Self {
            do_dx,
            do_dy,
            dd_dx,
            dd_dy,
        }
    }

    /// Differential of a primary ray from a pinhole camera.
    ///
    /// See [`initial_ray_differential`] for the meaning of the arguments. The
    /// origin derivatives are zero since all primary rays share the eye point.
    pub fn primary(camera_ray_direction: Vec3, right: Vec3, up: Vec3, viewport: UVec2) -> Self {
        let (dd_dx, dd_dy) = initial_ray_differential(camera_ray_direction, right, up, viewport);
        Self::new(Vec3::ZERO, Vec3::ZERO, dd_dx, dd_dy)
    }

    /// Transfer the differential to a hit `hit_distance` along `ray_direction`
    /// on a surface with normal `surface_normal` (Igehy Eq. 10 and 12).
    ///
    /// The origin derivatives become the derivatives of the hit point, which
    /// lie in the surface's tangent plane. Direction derivatives are unchanged.
    /// `dot(ray_direction, surface_normal)` near zero yields unbounded values.
    #[must_use]
    pub fn propagate(self, ray_direction: Vec3, hit_distance: f32, surface_normal: Vec3) -> Self {
        let do_dx = self.do_dx + hit_distance * self.dd_dx;
        let do_dy = self.do_dy + hit_distance * self.dd_dy;

        let rcp_dn = 1.0 / ray_direction.dot(surface_normal);
        let dt_dx = -do_dx.dot(surface_normal) * rcp_dn;
        let dt_dy = -do_dy.dot(surface_normal) * rcp_dn;

        Self {
            do_dx: do_dx + ray_direction * dt_dx,
            do_dy: do_dy + ray_direction * dt_dy,
            dd_dx: self.dd_dx,
            dd_dy: self.dd_dy,
        }
    }

    /// Same origin derivatives with new direction derivatives.
    #[inline]
    #[must_use]
    pub const fn with_direction_differentials(self, dd_dx: Vec3, dd_dy: Vec3) -> Self {
        Self {
            do_dx: self.do_dx,
            do_dy: self.do_dy,
            dd_dx,
            dd_dy,
        }
    }

    /// Texture LOD from UV derivatives using the default footprint formula.
    #[inline]
    pub fn compute_lod(duv_dx: Vec2, duv_dy: Vec2, texture: TextureDims) -> f32 {
        UvFootprint::default().compute_lod(duv_dx, duv_dy, texture)
    }
}

/// Formula turning UV derivatives into a mip level.
///
/// Both agree to first order and differ by a constant bias: the PBRT variant
/// measures the full filter width along the dominant axis. Pick one per
/// pipeline; mixing them along one path shifts lambda by up to a mip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UvFootprint {
    /// `0.5 * log2(max(|dUV/dx|^2, |dUV/dy|^2))`, in texels.
    #[default]
    MaxSquaredLength,
    /// `log2(2 * max(|du/dx|, |dv/dx|, |du/dy|, |dv/dy|))`, in texels.
    PbrtMaxAxis,
}

impl UvFootprint {
    /// Mip level for the given UV derivatives on a texture of size `texture`.
    pub fn compute_lod(self, duv_dx: Vec2, duv_dy: Vec2, texture: TextureDims) -> f32 {
        let dims = texture.as_vec2();
        let dx = duv_dx * dims;
        let dy = duv_dy * dims;
        match self {
            Self::MaxSquaredLength => 0.5 * dx.length_squared().max(dy.length_squared()).log2(),
            Self::PbrtMaxAxis => {
                let filter_width = 2.0 * dx.abs().max_element().max(dy.abs().max_element());
                filter_width.log2()
            }
        }
    }
}

/// Direction derivatives of a primary pinhole-camera ray (Igehy Eq. 8).
///
/// `camera_ray_direction` is the unnormalized `ndc.x * right + ndc.y * up +
/// forward`, where `right` and `up` are scaled so that `ndc` spans `[-1, 1]`
/// across the viewport. Pixel `y` grows downward, so `dD/dy` points along
/// `-up`.
pub fn initial_ray_differential(
    camera_ray_direction: Vec3,
    right: Vec3,
    up: Vec3,
    viewport: UVec2,
) -> (Vec3, Vec3) {
    let d = camera_ray_direction;
    let dd = d.dot(d);
    let divd = 2.0 / (dd * dd.sqrt());
    let dr = d.dot(right);
    let du = d.dot(up);
    let dd_dx = ((dd * right) - (dr * d)) * divd / viewport.x as f32;
    let dd_dy = -((dd * up) - (du * d)) * divd / viewport.y as f32;
    (dd_dx, dd_dy)
}
