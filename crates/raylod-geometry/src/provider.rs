//! Typed access to triangle geometry.

use glam::{Vec2, Vec3, Vec4};
use raylod_core::Result;

/// Read-only, bounds-checked view of one mesh's index and vertex attributes.
///
/// All attributes are in object space. Implementations are shared across
/// render threads and must not mutate through `&self`.
pub trait GeometryProvider: Sync {
    /// Number of triangles addressable by [`Self::triangle_indices`].
    fn triangle_count(&self) -> u32;

    /// Vertex indices of a triangle.
    fn triangle_indices(&self, triangle_index: u32) -> Result<[u32; 3]>;

    fn position(&self, vertex_index: u32) -> Result<Vec3>;

    fn normal(&self, vertex_index: u32) -> Result<Vec3>;

    /// Tangent with the bitangent sign in `w`.
    fn tangent(&self, vertex_index: u32) -> Result<Vec4>;

    fn tex_coord(&self, vertex_index: u32) -> Result<Vec2>;
}
