//! CPU reference tracer producing a per-pixel texture LOD frame.
//!
//! Paths start at the camera, follow perfect mirror reflections up to the
//! configured bounce count and report lambda at the last shaded hit. Rows are
//! traced in parallel; each path keeps its footprint state on the stack.

use std::time::Instant;

use glam::{UVec2, Vec3};
use raylod_core::constants::SECONDARY_RAY_OFFSET;
use raylod_core::{Ray, TextureDims};
use raylod_footprint::{PackedRayCone, RayCone};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::camera::Camera;
use crate::config::{ConeEncoding, LodStrategy, RenderConfig, SurfaceSpread};
use crate::error::Result;
use crate::estimator::{FootprintEstimator, RayConeEstimator, RayDifferentialEstimator, SurfaceHit};
use crate::gbuffer::GBuffer;
use crate::scene::{Scene, SceneHit};

/// Footprint result of one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelLod {
    /// Unclamped mip level at the last shaded hit.
    pub lambda: f32,
    /// Shading normal at the last shaded hit.
    pub normal: Vec3,
    /// Texture of the last shaded hit.
    pub texture: TextureDims,
    /// Mirror reflections followed before that hit.
    pub bounces: u32,
}

/// Summary of the lambda values of a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LodStats {
    /// Pixels whose primary ray hit something.
    pub covered: usize,
    /// Covered pixels with an infinite or NaN lambda.
    pub non_finite: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

/// Per-pixel LOD of a traced frame, row-major from the top-left.
#[derive(Debug, Clone)]
pub struct LodFrame {
    width: u32,
    height: u32,
    strategy: LodStrategy,
    pixels: Vec<Option<PixelLod>>,
}

impl LodFrame {
    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Strategy the frame was traced with.
    #[inline]
    pub const fn strategy(&self) -> LodStrategy {
        self.strategy
    }

    /// All pixels; `None` where the primary ray missed.
    #[inline]
    pub fn pixels(&self) -> &[Option<PixelLod>] {
        &self.pixels
    }

    /// One pixel, `None` outside the frame or on a miss.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&PixelLod> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels[(y * self.width + x) as usize].as_ref()
    }

    /// Lambda statistics over covered pixels with a finite lambda.
    pub fn stats(&self) -> LodStats {
        let mut stats = LodStats {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            ..LodStats::default()
        };
        let mut finite = 0_usize;
        let mut sum = 0.0_f64;
        for pixel in self.pixels.iter().flatten() {
            stats.covered += 1;
            if pixel.lambda.is_finite() {
                finite += 1;
                sum += f64::from(pixel.lambda);
                stats.min = stats.min.min(pixel.lambda);
                stats.max = stats.max.max(pixel.lambda);
            } else {
                stats.non_finite += 1;
            }
        }
        if finite == 0 {
            stats.min = 0.0;
            stats.max = 0.0;
        } else {
            stats.mean = (sum / finite as f64) as f32;
        }
        stats
    }
}

/// Traces [`LodFrame`]s of a scene from a camera.
pub struct LodTracer<'a> {
    scene: &'a Scene,
    camera: &'a Camera,
}

impl<'a> LodTracer<'a> {
    pub const fn new(scene: &'a Scene, camera: &'a Camera) -> Self {
        Self { scene, camera }
    }

    /// Trace a frame with the estimator selected by `config`.
    pub fn render(&self, config: &RenderConfig) -> Result<LodFrame> {
        config.validate()?;
        let lod = &config.lod;
        let angle = self.camera.pixel_spread_angle(config.height);

        let gbuffer = match (lod.strategy, lod.surface_spread) {
            (LodStrategy::RayCones, SurfaceSpread::ScreenSpace(_)) => Some(GBuffer::rasterize(
                self.scene,
                self.camera,
                config.width,
                config.height,
            )?),
            _ => None,
        };

        match (lod.strategy, lod.cone_encoding) {
            (LodStrategy::RayCones, ConeEncoding::Full) => self.trace_with(
                &RayConeEstimator::<RayCone>::new(angle),
                config,
                gbuffer.as_ref(),
            ),
            (LodStrategy::RayCones, ConeEncoding::PackedHalf) => self.trace_with(
                &RayConeEstimator::<PackedRayCone>::new(angle),
                config,
                gbuffer.as_ref(),
            ),
            (LodStrategy::RayDifferentials, _) => self.trace_with(
                &RayDifferentialEstimator::new(lod.barycentric_method, lod.uv_footprint),
                config,
                None,
            ),
        }
    }

    /// Trace a frame with a specific estimator.
    ///
    /// With a G-buffer and a screen-space surface spread in `config`, primary
    /// hits receive the G-buffer's surface spread angle; all other hits are
    /// treated as locally flat.
    pub fn trace_with<E: FootprintEstimator>(
        &self,
        estimator: &E,
        config: &RenderConfig,
        gbuffer: Option<&GBuffer>,
    ) -> Result<LodFrame> {
        let _span = tracing::trace_span!("lod_frame", strategy = ?config.lod.strategy).entered();
        let start = Instant::now();
        let (width, height) = (config.width, config.height);

        let rows: Vec<Vec<Option<PixelLod>>> = (0..height)
            .into_par_iter()
            .map(|y| {
                (0..width)
                    .map(|x| self.trace_pixel(estimator, config, gbuffer, UVec2::new(x, y)))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<_>>()?;

        let frame = LodFrame {
            width,
            height,
            strategy: config.lod.strategy,
            pixels: rows.into_iter().flatten().collect(),
        };

        let stats = frame.stats();
        if stats.non_finite > 0 {
            warn!(
                non_finite = stats.non_finite,
                covered = stats.covered,
                "Frame has unbounded lambda values"
            );
        }
        info!(
            strategy = ?config.lod.strategy,
            width,
            height,
            covered = stats.covered,
            min = stats.min,
            max = stats.max,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "LOD frame traced"
        );
        Ok(frame)
    }

    fn trace_pixel<E: FootprintEstimator>(
        &self,
        estimator: &E,
        config: &RenderConfig,
        gbuffer: Option<&GBuffer>,
        pixel: UVec2,
    ) -> Result<Option<PixelLod>> {
        let primary = self
            .camera
            .primary_ray(pixel, UVec2::new(config.width, config.height));
        let primary_spread = match (gbuffer, config.lod.surface_spread) {
            (Some(gbuffer), SurfaceSpread::ScreenSpace(calibration)) => {
                gbuffer.surface_spread_angle(pixel.x, pixel.y, calibration)
            }
            _ => 0.0,
        };

        let mut ray = primary.ray;
        let mut state = estimator.primary(&primary);
        let mut result = None;

        for bounce in 0..=config.lod.max_bounces {
            let Some(hit) = self.scene.intersect(&ray) else {
                break;
            };
            let instance = &self.scene.instances()[hit.instance];
            let surface = SurfaceHit {
                geometry: self.scene.geometry(instance),
                transform: &instance.transform,
                triangle_index: hit.triangle,
                barycentrics: hit.barycentrics,
                ray_direction: ray.direction,
                hit_distance: hit.distance,
                face_normal: hit.face_normal,
                texture: instance.material.texture,
                surface_spread_angle: if bounce == 0 { primary_spread } else { 0.0 },
            };
            let footprint = estimator.shade_hit(state, &surface)?;
            result = Some(PixelLod {
                lambda: footprint.lambda,
                normal: footprint.attributes.normal,
                texture: instance.material.texture,
                bounces: bounce,
            });

            if !instance.material.reflective {
                break;
            }
            ray = reflected_ray(&ray, &hit, footprint.attributes.normal);
            state = footprint.reflected;
        }

        Ok(result)
    }
}

/// Continue a path off a mirror hit.
///
/// The direction is mirrored about the interpolated shading normal, the same
/// normal the reflected ray differential is taken about; the face normal only
/// decides which side the new origin is pushed to.
fn reflected_ray(ray: &Ray, hit: &SceneHit, shading_normal: Vec3) -> Ray {
    ray.reflect(hit.distance, shading_normal, hit.face_normal, SECONDARY_RAY_OFFSET)
}
