//! Footprint estimators behind one per-hit interface.
//!
//! The tracer is generic over [`FootprintEstimator`] and is instantiated once
//! per strategy, so the choice between ray cones and ray differentials is made
//! when a frame is configured rather than per ray.

use std::marker::PhantomData;

use glam::Vec3;
use raylod_core::{Barycentrics, InstanceTransform, TextureDims};
use raylod_footprint::{ConeStorage, RayCone, RayDifferential, UvFootprint};
use raylod_geometry::{
    interpolate_and_compute_barycentric_differentials,
    interpolate_and_compute_triangle_lod_constant, BarycentricMethod, GeometryProvider,
    InterpolatedAttributes,
};

use crate::camera::PrimaryRay;

/// Everything known about one hit along a path.
#[derive(Clone, Copy)]
pub struct SurfaceHit<'a> {
    pub geometry: &'a dyn GeometryProvider,
    pub transform: &'a InstanceTransform,
    pub triangle_index: u32,
    pub barycentrics: Barycentrics,
    /// Unit direction of the ray that produced the hit.
    pub ray_direction: Vec3,
    pub hit_distance: f32,
    /// Unit world-space face normal.
    pub face_normal: Vec3,
    pub texture: TextureDims,
    /// Curvature term β of this surface for ray cones.
    pub surface_spread_angle: f32,
}

/// Result of shading one hit.
#[derive(Clone, Copy, Debug)]
pub struct HitFootprint<S> {
    /// Unclamped mip level.
    pub lambda: f32,
    pub attributes: InterpolatedAttributes,
    /// State for a mirror-reflected continuation of the path.
    pub reflected: S,
}

/// A texture footprint model: per-path state, its initial value and the
/// per-hit update.
pub trait FootprintEstimator: Sync {
    /// Footprint carried along one path, by value.
    type State: Copy + Send;

    /// State of a primary ray at the eye.
    fn primary(&self, primary: &PrimaryRay) -> Self::State;

    /// Advance `state` to `hit`, compute lambda there and the state of the
    /// mirror-reflected ray. Hits must be fed in path order.
    fn shade_hit(
        &self,
        state: Self::State,
        hit: &SurfaceHit<'_>,
    ) -> raylod_core::Result<HitFootprint<Self::State>>;
}

/// Ray cone estimator stored as `S` between hits.
#[derive(Debug, Clone, Copy)]
pub struct RayConeEstimator<S> {
    pixel_spread_angle: f32,
    _storage: PhantomData<S>,
}

impl<S: ConeStorage> RayConeEstimator<S> {
    /// Estimator whose primary cones spread by `pixel_spread_angle`.
    pub const fn new(pixel_spread_angle: f32) -> Self {
        Self {
            pixel_spread_angle,
            _storage: PhantomData,
        }
    }
}

impl<S: ConeStorage> FootprintEstimator for RayConeEstimator<S> {
    type State = S;

    fn primary(&self, _primary: &PrimaryRay) -> S {
        S::encode(RayCone::primary(self.pixel_spread_angle))
    }

    fn shade_hit(&self, state: S, hit: &SurfaceHit<'_>) -> raylod_core::Result<HitFootprint<S>> {
        let stored = S::encode(
            state
                .decode()
                .propagate(hit.surface_spread_angle, hit.hit_distance),
        );
        let (attributes, tri_lod_constant) = interpolate_and_compute_triangle_lod_constant(
            hit.geometry,
            hit.transform,
            hit.triangle_index,
            hit.barycentrics,
        )?;
        let lambda = stored.decode().compute_lod(
            tri_lod_constant,
            hit.ray_direction,
            hit.face_normal,
            hit.texture,
        );
        Ok(HitFootprint {
            lambda,
            attributes,
            reflected: stored,
        })
    }
}

/// Ray differential estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RayDifferentialEstimator {
    pub barycentric_method: BarycentricMethod,
    pub uv_footprint: UvFootprint,
}

impl RayDifferentialEstimator {
    pub const fn new(barycentric_method: BarycentricMethod, uv_footprint: UvFootprint) -> Self {
        Self {
            barycentric_method,
            uv_footprint,
        }
    }
}

impl FootprintEstimator for RayDifferentialEstimator {
    type State = RayDifferential;

    fn primary(&self, primary: &PrimaryRay) -> RayDifferential {
        primary.differential()
    }

    fn shade_hit(
        &self,
        state: RayDifferential,
        hit: &SurfaceHit<'_>,
    ) -> raylod_core::Result<HitFootprint<RayDifferential>> {
        // Transfer onto the triangle plane so the hit derivatives are in-plane.
        let transferred = state.propagate(hit.ray_direction, hit.hit_distance, hit.face_normal);
        let differentials = interpolate_and_compute_barycentric_differentials(
            hit.geometry,
            hit.transform,
            hit.triangle_index,
            hit.barycentrics,
            hit.ray_direction,
            hit.face_normal,
            transferred,
            self.barycentric_method,
        )?;
        let lambda = self.uv_footprint.compute_lod(
            differentials.duv_dx,
            differentials.duv_dy,
            hit.texture,
        );
        Ok(HitFootprint {
            lambda,
            attributes: differentials.attributes,
            reflected: differentials.reflected,
        })
    }
}
