//! Mip range clamping.
//!
//! The estimators return unclamped lambda values, including `±inf` and NaN at
//! degenerate hits. Samplers need a level inside the texture's mip chain.

use raylod_core::TextureDims;

/// Valid mip levels of one texture: `[0, mip_count - 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LodRange {
    mip_count: u32,
}

impl LodRange {
    /// Range with `mip_count` levels (at least one).
    #[inline]
    pub const fn new(mip_count: u32) -> Self {
        Self {
            mip_count: if mip_count == 0 { 1 } else { mip_count },
        }
    }

    /// Range covering the full mip chain of `texture`.
    #[inline]
    pub const fn for_texture(texture: TextureDims) -> Self {
        Self::new(texture.mip_count())
    }

    /// Coarsest level.
    #[inline]
    pub fn max_level(self) -> f32 {
        (self.mip_count - 1) as f32
    }

    /// Clamp `lambda` into the range. NaN maps to the finest level.
    #[inline]
    pub fn clamp(self, lambda: f32) -> f32 {
        if lambda.is_nan() {
            0.0
        } else {
            lambda.clamp(0.0, self.max_level())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_into_mip_chain() {
        let range = LodRange::for_texture(TextureDims::square(256));
        assert_eq!(range.max_level(), 8.0);
        assert_eq!(range.clamp(-3.0), 0.0);
        assert_eq!(range.clamp(3.5), 3.5);
        assert_eq!(range.clamp(42.0), 8.0);
        assert_eq!(range.clamp(f32::INFINITY), 8.0);
        assert_eq!(range.clamp(f32::NEG_INFINITY), 0.0);
        assert_eq!(range.clamp(f32::NAN), 0.0);
    }

    #[test]
    fn empty_range_is_single_level() {
        assert_eq!(LodRange::new(0).max_level(), 0.0);
    }
}
