//! Pinhole camera and primary ray generation.

use glam::{UVec2, Vec2, Vec3};
use raylod_core::Ray;
use raylod_footprint::{pixel_spread_angle, RayCone, RayDifferential};

/// Pinhole camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub direction: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
            fov: std::f32::consts::FRAC_PI_4,
        }
    }
}

/// Camera axes scaled so that `ndc.x * right + ndc.y * up + forward` spans
/// the view frustum for `ndc` in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

/// A primary ray together with what the footprint initializers need.
#[derive(Debug, Clone, Copy)]
pub struct PrimaryRay {
    pub ray: Ray,
    /// Ray direction before normalization.
    pub unnormalized_direction: Vec3,
    pub basis: CameraBasis,
    pub viewport: UVec2,
}

impl PrimaryRay {
    /// Ray differential at the eye.
    pub fn differential(&self) -> RayDifferential {
        RayDifferential::primary(
            self.unnormalized_direction,
            self.basis.right,
            self.basis.up,
            self.viewport,
        )
    }
}

impl Camera {
    /// Create a new camera looking at `target`.
    pub fn new(position: Vec3, target: Vec3, up: Vec3, fov: f32) -> Self {
        Self {
            position,
            direction: (target - position).normalize(),
            up,
            fov,
        }
    }

    /// Scaled basis for a viewport of the given size.
    pub fn basis(&self, viewport: UVec2) -> CameraBasis {
        let forward = self.direction.normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward);
        let tan_half_fov = (self.fov * 0.5).tan();
        let aspect = viewport.x as f32 / viewport.y.max(1) as f32;
        CameraBasis {
            right: right * tan_half_fov * aspect,
            up: up * tan_half_fov,
            forward,
        }
    }

    /// Ray through the centre of `pixel`, with the origin at the top-left.
    pub fn primary_ray(&self, pixel: UVec2, viewport: UVec2) -> PrimaryRay {
        let basis = self.basis(viewport);
        let uv = (pixel.as_vec2() + 0.5) / viewport.as_vec2();
        let ndc = Vec2::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0);
        let direction = ndc.x * basis.right + ndc.y * basis.up + basis.forward;
        PrimaryRay {
            ray: Ray::new(self.position, direction),
            unnormalized_direction: direction,
            basis,
            viewport,
        }
    }

    /// Angle subtended by one pixel row at the eye.
    #[inline]
    pub fn pixel_spread_angle(&self, viewport_height: u32) -> f32 {
        pixel_spread_angle(self.fov, viewport_height)
    }

    /// Ray cone of every primary ray.
    #[inline]
    pub fn primary_cone(&self, viewport_height: u32) -> RayCone {
        RayCone::primary(self.pixel_spread_angle(viewport_height))
    }
}
