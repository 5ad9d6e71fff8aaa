//! Geometry access and triangle differential geometry.
//!
//! - [`GeometryProvider`]: typed, bounds-checked access to index and vertex
//!   attribute buffers
//! - [`MeshBuffers`]: byte-addressable buffers implementing the provider
//! - [`triangle`]: attribute interpolation, the per-triangle LOD constant for
//!   ray cones, and barycentric/normal differentials for ray differentials

pub mod buffers;
pub mod mesh;
pub mod provider;
pub mod triangle;

pub use buffers::{AttributeBuffer, IndexBuffer, IndexFormat, Vertex};
pub use mesh::MeshBuffers;
pub use provider::GeometryProvider;
pub use triangle::{
    interpolate_and_compute_barycentric_differentials,
    interpolate_and_compute_triangle_lod_constant, reflect_ray_differential, BarycentricMethod,
    HitDifferentials, InterpolatedAttributes, TriangleVertices,
};
