//! Primary-visibility G-buffer and its screen-space derivatives.
//!
//! Stands in for the rasterization pass of a hybrid renderer: positions and
//! shading normals of primary hits, differenced between neighbouring pixels
//! the way `ddx`/`ddy` would.

use glam::{UVec2, Vec3};
use raylod_core::Ray;
use raylod_footprint::{estimate_surface_spread_angle, SpreadAngleCalibration, SurfaceDerivatives};
use raylod_geometry::TriangleVertices;
use rayon::prelude::*;

use crate::camera::Camera;
use crate::error::{RenderError, Result};
use crate::scene::Scene;

/// World-space surface at one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GBufferSample {
    pub position: Vec3,
    /// Unit shading normal.
    pub normal: Vec3,
}

/// Per-pixel primary hits, row-major with the origin at the top-left.
#[derive(Debug, Clone)]
pub struct GBuffer {
    width: u32,
    height: u32,
    samples: Vec<Option<GBufferSample>>,
}

impl GBuffer {
    /// Wrap precomputed samples.
    pub fn from_samples(
        width: u32,
        height: u32,
        samples: Vec<Option<GBufferSample>>,
    ) -> Result<Self> {
        if samples.len() != width as usize * height as usize {
            return Err(RenderError::InvalidConfig(format!(
                "{} samples for a {width}x{height} G-buffer",
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Trace primary rays for every pixel and record the first hit.
    pub fn rasterize(scene: &Scene, camera: &Camera, width: u32, height: u32) -> Result<Self> {
        let _span = tracing::trace_span!("gbuffer", width, height).entered();
        let viewport = UVec2::new(width, height);
        let rows: Vec<Vec<Option<GBufferSample>>> = (0..height)
            .into_par_iter()
            .map(|y| {
                (0..width)
                    .map(|x| {
                        let primary = camera.primary_ray(UVec2::new(x, y), viewport);
                        primary_sample(scene, &primary.ray)
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<_>>()?;
        Self::from_samples(width, height, rows.into_iter().flatten().collect())
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Sample at a pixel; `None` outside the buffer or where the ray missed.
    pub fn sample(&self, x: u32, y: u32) -> Option<GBufferSample> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.samples[(y * self.width + x) as usize]
    }

    /// Screen-space derivatives of position and normal at a pixel.
    ///
    /// Forward differences, backward at the right and bottom edges. An axis
    /// whose neighbour missed has zero derivatives.
    pub fn derivatives(&self, x: u32, y: u32) -> Option<SurfaceDerivatives> {
        let center = self.sample(x, y)?;
        let (dp_dx, dn_dx) = self.difference(center, x, y, UVec2::X);
        let (dp_dy, dn_dy) = self.difference(center, x, y, UVec2::Y);
        Some(SurfaceDerivatives {
            dp_dx,
            dp_dy,
            dn_dx,
            dn_dy,
        })
    }

    /// Surface spread angle β at a pixel, zero where nothing was hit.
    pub fn surface_spread_angle(&self, x: u32, y: u32, calibration: SpreadAngleCalibration) -> f32 {
        self.derivatives(x, y).map_or(0.0, |derivatives| {
            estimate_surface_spread_angle(&derivatives, calibration.k1, calibration.k2)
        })
    }

    fn difference(&self, center: GBufferSample, x: u32, y: u32, axis: UVec2) -> (Vec3, Vec3) {
        let forward = UVec2::new(x, y) + axis;
        let neighbour = if forward.x < self.width && forward.y < self.height {
            self.sample(forward.x, forward.y).map(|s| (s, 1.0))
        } else if (axis.x == 1 && x > 0) || (axis.y == 1 && y > 0) {
            let backward = UVec2::new(x, y) - axis;
            self.sample(backward.x, backward.y).map(|s| (s, -1.0))
        } else {
            None
        };
        neighbour.map_or((Vec3::ZERO, Vec3::ZERO), |(sample, sign)| {
            (
                (sample.position - center.position) * sign,
                (sample.normal - center.normal) * sign,
            )
        })
    }
}

fn primary_sample(scene: &Scene, ray: &Ray) -> Result<Option<GBufferSample>> {
    let Some(hit) = scene.intersect(ray) else {
        return Ok(None);
    };
    let instance = &scene.instances()[hit.instance];
    let triangle =
        TriangleVertices::fetch(scene.geometry(instance), &instance.transform, hit.triangle)?;
    Ok(Some(GBufferSample {
        position: ray.at(hit.distance),
        normal: triangle.interpolate(hit.barycentrics).normal,
    }))
}
