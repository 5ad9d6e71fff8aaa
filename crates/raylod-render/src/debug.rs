//! Debug visualizations of a traced LOD frame.
//!
//! Each view turns the per-pixel lambda or shading normal into an RGBA8
//! image for inspection.

use glam::Vec4;
use raylod_core::constants::RAINBOW_COLOR_COUNT;
use raylod_footprint::LodRange;
use serde::{Deserialize, Serialize};

use crate::tracer::{LodFrame, PixelLod};

/// Palette indexed by mip level: red, yellow, green, cyan, blue, magenta,
/// white.
pub const RAINBOW_COLORS: [Vec4; RAINBOW_COLOR_COUNT] = [
    Vec4::new(1.0, 0.0, 0.0, 1.0),
    Vec4::new(1.0, 1.0, 0.0, 1.0),
    Vec4::new(0.0, 1.0, 0.0, 1.0),
    Vec4::new(0.0, 1.0, 1.0, 1.0),
    Vec4::new(0.0, 0.0, 1.0, 1.0),
    Vec4::new(1.0, 0.0, 1.0, 1.0),
    Vec4::new(1.0, 1.0, 1.0, 1.0),
];

/// Color for pixels whose primary ray hit nothing.
const MISS_COLOR: [u8; 4] = [24, 24, 24, 255];

/// Map a mip level onto the rainbow palette.
///
/// `lambda` is clamped to `[0, 6]` and adjacent palette entries are blended
/// by its fractional part. NaN maps to the first entry.
pub fn lambda_to_rainbow_color(lambda: f32) -> Vec4 {
    let last = (RAINBOW_COLOR_COUNT - 1) as f32;
    // max() discards NaN.
    let lambda = lambda.max(0.0).min(last);
    let index = lambda.floor();
    let next = (index as usize + 1).min(RAINBOW_COLOR_COUNT - 1);
    RAINBOW_COLORS[index as usize].lerp(RAINBOW_COLORS[next], lambda - index)
}

/// Debug visualization mode.
///
/// Selected with `--view` in the snapshot tool.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DebugView {
    /// Mip level on the rainbow palette (default).
    #[default]
    Rainbow = 0,
    /// Mip level clamped to the texture's chain, black (finest) to white.
    Grayscale = 1,
    /// Shading normal of the last shaded hit as RGB.
    Normals = 2,
}

impl DebugView {
    /// Color of one pixel.
    pub fn color(self, pixel: Option<&PixelLod>) -> [u8; 4] {
        let Some(pixel) = pixel else {
            return MISS_COLOR;
        };
        let color = match self {
            Self::Rainbow => lambda_to_rainbow_color(pixel.lambda),
            Self::Grayscale => {
                let range = LodRange::for_texture(pixel.texture);
                let level = range.clamp(pixel.lambda) / range.max_level().max(1.0);
                Vec4::new(level, level, level, 1.0)
            }
            Self::Normals => (pixel.normal * 0.5 + 0.5).extend(1.0),
        };
        to_rgba8(color)
    }

    /// RGBA8 pixels of a whole frame, row-major from the top-left.
    pub fn render(self, frame: &LodFrame) -> Vec<u8> {
        frame
            .pixels()
            .iter()
            .flat_map(|pixel| self.color(pixel.as_ref()))
            .collect()
    }
}

fn to_rgba8(color: Vec4) -> [u8; 4] {
    let scaled = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    [scaled.x as u8, scaled.y as u8, scaled.z as u8, scaled.w as u8]
}
