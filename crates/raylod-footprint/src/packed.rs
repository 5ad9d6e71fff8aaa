//! Half-precision packed ray cone.
//!
//! Stores width and spread angle as two binary16 values in one `u32`, which
//! halves the payload cost of carrying a cone through recursive rays.

use bytemuck::{Pod, Zeroable};
use half::f16;
use serde::{Deserialize, Serialize};

use crate::cone::{ConeStorage, RayCone};

/// Ray cone packed as `width` (high 16 bits) and `spread_angle` (low 16 bits).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct PackedRayCone(pub u32);

impl PackedRayCone {
    /// Pack a width and spread angle.
    #[inline]
    pub fn new(width: f32, spread_angle: f32) -> Self {
        let width = f16::from_f32(width).to_bits();
        let spread_angle = f16::from_f32(spread_angle).to_bits();
        Self((u32::from(width) << 16) | u32::from(spread_angle))
    }

    /// Raw packed bits
    #[inline]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Advance the cone; see [`RayCone::propagate`].
    ///
    /// Arithmetic runs in full precision and the result is packed again.
    #[inline]
    #[must_use]
    pub fn propagate(self, surface_spread_angle: f32, hit_distance: f32) -> Self {
        Self::encode(self.decode().propagate(surface_spread_angle, hit_distance))
    }
}

impl ConeStorage for PackedRayCone {
    #[inline]
    fn encode(cone: RayCone) -> Self {
        Self::new(cone.width(), cone.spread_angle())
    }

    #[inline]
    fn decode(self) -> RayCone {
        let width = f16::from_bits((self.0 >> 16) as u16);
        let spread_angle = f16::from_bits(self.0 as u16);
        RayCone::new(width.to_f32(), spread_angle.to_f32())
    }
}
