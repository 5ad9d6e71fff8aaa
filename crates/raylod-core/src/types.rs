//! Hit and texture types shared by the estimators.

use std::ops::{Add, Mul};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Barycentric coordinates of a ray/triangle hit.
///
/// `u` and `v` are the weights of vertices 1 and 2, as reported by the
/// intersection; vertex 0 receives `1 - u - v`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Barycentrics {
    pub u: f32,
    pub v: f32,
}

impl Barycentrics {
    /// Create from the two reported weights
    #[inline]
    pub const fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }

    /// All three weights `(w0, w1, w2)`, summing to one.
    #[inline]
    pub fn weights(self) -> Vec3 {
        Vec3::new(1.0 - self.u - self.v, self.u, self.v)
    }

    /// Weighted combination of three per-vertex values.
    #[inline]
    pub fn interpolate<T>(self, values: [T; 3]) -> T
    where
        T: Copy + Add<Output = T> + Mul<f32, Output = T>,
    {
        let w = self.weights();
        values[0] * w.x + values[1] * w.y + values[2] * w.z
    }
}

/// Dimensions of the texture bound to a surface, in texels.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct TextureDims {
    pub width: u32,
    pub height: u32,
}

impl TextureDims {
    /// Create new texture dimensions
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square texture
    #[inline]
    pub const fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Dimensions as floats
    #[inline]
    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Length of the full mip chain: `floor(log2(max(width, height))) + 1`.
    #[inline]
    pub const fn mip_count(self) -> u32 {
        let largest = if self.width > self.height {
            self.width
        } else {
            self.height
        };
        let largest = if largest == 0 { 1 } else { largest };
        u32::BITS - largest.leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn barycentric_weights_sum_to_one() {
        let bary = Barycentrics::new(0.2, 0.3);
        let w = bary.weights();
        assert_relative_eq!(w.x + w.y + w.z, 1.0);
        assert_relative_eq!(w.x, 0.5);
    }

    #[test]
    fn barycentric_interpolation_hits_vertices() {
        let values = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        assert_eq!(Barycentrics::new(0.0, 0.0).interpolate(values), values[0]);
        assert_eq!(Barycentrics::new(1.0, 0.0).interpolate(values), values[1]);
        assert_eq!(Barycentrics::new(0.0, 1.0).interpolate(values), values[2]);
    }

    #[test]
    fn mip_count() {
        assert_eq!(TextureDims::square(1).mip_count(), 1);
        assert_eq!(TextureDims::square(1024).mip_count(), 11);
        assert_eq!(TextureDims::new(512, 64).mip_count(), 10);
        assert_eq!(TextureDims::new(0, 0).mip_count(), 1);
    }
}
