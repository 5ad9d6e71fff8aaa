//! Texture LOD pipeline configuration.

use raylod_footprint::{SpreadAngleCalibration, UvFootprint};
use raylod_geometry::BarycentricMethod;
use serde::{Deserialize, Serialize};

use crate::debug::DebugView;
use crate::error::{RenderError, Result};

/// Footprint model used for every ray of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LodStrategy {
    #[default]
    RayCones,
    RayDifferentials,
}

/// Storage of the ray cone carried along a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConeEncoding {
    /// Two `f32`s.
    #[default]
    Full,
    /// Two binary16 values packed into one `u32`.
    PackedHalf,
}

/// Source of the surface spread angle β added to ray cones at primary hits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SurfaceSpread {
    /// Treat every surface as flat.
    #[default]
    None,
    /// Estimate β from G-buffer screen-space derivatives.
    ScreenSpace(SpreadAngleCalibration),
}

/// Texture LOD configuration, fixed for a whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodConfig {
    pub strategy: LodStrategy,
    pub cone_encoding: ConeEncoding,
    pub barycentric_method: BarycentricMethod,
    pub uv_footprint: UvFootprint,
    pub surface_spread: SurfaceSpread,
    /// Mirror reflections followed after the primary hit.
    pub max_bounces: u32,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            strategy: LodStrategy::default(),
            cone_encoding: ConeEncoding::default(),
            barycentric_method: BarycentricMethod::default(),
            uv_footprint: UvFootprint::default(),
            surface_spread: SurfaceSpread::default(),
            max_bounces: 2,
        }
    }
}

impl LodConfig {
    /// Create a config for the given strategy.
    pub fn new(strategy: LodStrategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Set the cone storage encoding.
    #[must_use]
    pub fn with_cone_encoding(mut self, encoding: ConeEncoding) -> Self {
        self.cone_encoding = encoding;
        self
    }

    /// Set the barycentric differential formulation.
    #[must_use]
    pub fn with_barycentric_method(mut self, method: BarycentricMethod) -> Self {
        self.barycentric_method = method;
        self
    }

    /// Set the UV footprint formula.
    #[must_use]
    pub fn with_uv_footprint(mut self, footprint: UvFootprint) -> Self {
        self.uv_footprint = footprint;
        self
    }

    /// Set the surface spread source.
    #[must_use]
    pub fn with_surface_spread(mut self, spread: SurfaceSpread) -> Self {
        self.surface_spread = spread;
        self
    }

    /// Set the number of mirror bounces.
    #[must_use]
    pub fn with_max_bounces(mut self, bounces: u32) -> Self {
        self.max_bounces = bounces;
        self
    }
}

/// Frame configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub lod: LodConfig,
    pub view: DebugView,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            lod: LodConfig::default(),
            view: DebugView::default(),
        }
    }
}

impl RenderConfig {
    /// Create a config with default LOD settings.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Set the LOD configuration.
    #[must_use]
    pub fn with_lod(mut self, lod: LodConfig) -> Self {
        self.lod = lod;
        self
    }

    /// Set the debug view.
    #[must_use]
    pub fn with_view(mut self, view: DebugView) -> Self {
        self.view = view;
        self
    }

    /// Reject configurations that cannot be traced.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "viewport must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if let SurfaceSpread::ScreenSpace(calibration) = self.lod.surface_spread {
            if !(calibration.k1.is_finite() && calibration.k2.is_finite()) {
                return Err(RenderError::InvalidConfig(format!(
                    "spread angle calibration must be finite, got {calibration:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let lod = LodConfig::new(LodStrategy::RayDifferentials)
            .with_barycentric_method(BarycentricMethod::RayDirection)
            .with_uv_footprint(UvFootprint::PbrtMaxAxis)
            .with_max_bounces(0);
        assert_eq!(lod.strategy, LodStrategy::RayDifferentials);
        assert_eq!(lod.barycentric_method, BarycentricMethod::RayDirection);
        assert_eq!(lod.uv_footprint, UvFootprint::PbrtMaxAxis);
        assert_eq!(lod.max_bounces, 0);
        assert_eq!(lod.cone_encoding, ConeEncoding::Full);
    }

    #[test]
    fn validation() {
        assert!(RenderConfig::default().validate().is_ok());
        assert!(RenderConfig::new(0, 10).validate().is_err());
        let bad = RenderConfig::default().with_lod(LodConfig::default().with_surface_spread(
            SurfaceSpread::ScreenSpace(SpreadAngleCalibration { k1: f32::NAN, k2: 0.0 }),
        ));
        assert!(matches!(bad.validate(), Err(RenderError::InvalidConfig(_))));
    }
}
