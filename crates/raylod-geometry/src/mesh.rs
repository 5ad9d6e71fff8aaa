//! Byte-addressable triangle meshes and simple mesh builders.

use std::f32::consts::{PI, TAU};
use std::sync::Arc;

use glam::{Vec2, Vec3, Vec4};
use raylod_core::{Aabb, Error, Result};

use crate::buffers::{vertex_layout, AttributeBuffer, IndexBuffer, Vertex};
use crate::provider::GeometryProvider;

/// Index buffer plus one attribute view per vertex attribute.
///
/// Views may alias a single interleaved allocation or point at separate
/// tightly packed buffers.
#[derive(Clone, Debug)]
pub struct MeshBuffers {
    indices: IndexBuffer,
    positions: AttributeBuffer,
    normals: AttributeBuffer,
    tangents: AttributeBuffer,
    tex_coords: AttributeBuffer,
    vertex_count: u32,
    bounds: Aabb,
}

impl MeshBuffers {
    /// Assemble a mesh from separate buffers.
    ///
    /// Fails with [`Error::InvalidData`] if any index refers past the shortest
    /// attribute buffer.
    pub fn new(
        indices: IndexBuffer,
        positions: AttributeBuffer,
        normals: AttributeBuffer,
        tangents: AttributeBuffer,
        tex_coords: AttributeBuffer,
    ) -> Result<Self> {
        let vertex_count = [
            positions.record_count::<[f32; 3]>()?,
            normals.record_count::<[f32; 3]>()?,
            tangents.record_count::<[f32; 4]>()?,
            tex_coords.record_count::<[f32; 2]>()?,
        ]
        .into_iter()
        .min()
        .unwrap_or(0);
        let vertex_count = u32::try_from(vertex_count)
            .map_err(|_| Error::InvalidData(format!("{vertex_count} vertices exceed u32")))?;

        for triangle in 0..indices.triangle_count() {
            let tri = indices.triangle(triangle)?;
            if let Some(&bad) = tri.iter().find(|&&index| index >= vertex_count) {
                return Err(Error::InvalidData(format!(
                    "triangle {triangle} references vertex {bad} of {vertex_count}"
                )));
            }
        }

        let mut bounds = Aabb::EMPTY;
        for vertex in 0..vertex_count {
            bounds.expand_to_include(Vec3::from_array(positions.read::<[f32; 3]>(vertex)?));
        }

        tracing::debug!(
            triangles = indices.triangle_count(),
            vertices = vertex_count,
            index_format = ?indices.format(),
            "Mesh buffers created"
        );

        Ok(Self {
            indices,
            positions,
            normals,
            tangents,
            tex_coords,
            vertex_count,
            bounds,
        })
    }

    /// Mesh over a single interleaved [`Vertex`] allocation.
    pub fn from_vertices(vertices: &[Vertex], indices: IndexBuffer) -> Result<Self> {
        let bytes: Arc<[u8]> = Arc::from(bytemuck::cast_slice::<Vertex, u8>(vertices));
        let view = |offset| AttributeBuffer::new(bytes.clone(), offset, Vertex::STRIDE);
        Self::new(
            indices,
            view(vertex_layout::POSITION)?,
            view(vertex_layout::NORMAL)?,
            view(vertex_layout::TANGENT)?,
            view(vertex_layout::TEX_COORD)?,
        )
    }

    /// Number of vertices readable through every attribute view.
    #[inline]
    pub const fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Object-space bounds of all vertices.
    #[inline]
    pub const fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Single triangle with the given positions and UVs, facing its winding
    /// normal.
    pub fn triangle(positions: [Vec3; 3], tex_coords: [Vec2; 3]) -> Result<Self> {
        let normal = (positions[1] - positions[0])
            .cross(positions[2] - positions[0])
            .normalize_or_zero();
        let tangent = (positions[1] - positions[0]).normalize_or_zero().extend(1.0);
        let vertices: Vec<Vertex> = positions
            .iter()
            .zip(tex_coords)
            .map(|(&position, tex_coord)| Vertex {
                position: position.to_array(),
                normal: normal.to_array(),
                tangent: tangent.to_array(),
                tex_coord: tex_coord.to_array(),
            })
            .collect();
        Self::from_vertices(&vertices, IndexBuffer::from_triangles(&[[0, 1, 2]]))
    }

    /// Quad of `width` x `height` centred on the origin in the XY plane,
    /// facing +Z.
    ///
    /// UVs run from `(0, 0)` at the top-left corner to
    /// `(uv_scale, uv_scale)` at the bottom-right; values above one tile.
    pub fn quad(width: f32, height: f32, uv_scale: f32) -> Result<Self> {
        let (hw, hh) = (width * 0.5, height * 0.5);
        // v grows along -Y, so the bitangent sign is negative.
        let corner = |x: f32, y: f32, u: f32, v: f32| Vertex {
            position: [x, y, 0.0],
            normal: [0.0, 0.0, 1.0],
            tangent: [1.0, 0.0, 0.0, -1.0],
            tex_coord: [u * uv_scale, v * uv_scale],
        };
        let vertices = [
            corner(-hw, hh, 0.0, 0.0),
            corner(hw, hh, 1.0, 0.0),
            corner(hw, -hh, 1.0, 1.0),
            corner(-hw, -hh, 0.0, 1.0),
        ];
        Self::from_vertices(
            &vertices,
            IndexBuffer::from_triangles(&[[0, 3, 2], [0, 2, 1]]),
        )
    }

    /// Latitude/longitude sphere centred on the origin with outward normals.
    ///
    /// `u` wraps once around the equator and `v` runs from the north pole
    /// (+Y) to the south pole. Degenerate triangles at the poles are skipped.
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Result<Self> {
        if segments < 3 || rings < 2 {
            return Err(Error::InvalidData(format!(
                "sphere needs at least 3 segments and 2 rings, got {segments}x{rings}"
            )));
        }

        let mut vertices = Vec::with_capacity(((segments + 1) * (rings + 1)) as usize);
        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let (sin_theta, cos_theta) = (v * PI).sin_cos();
            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let (sin_phi, cos_phi) = (u * TAU).sin_cos();
                let normal = Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
                let tangent = Vec4::new(-sin_phi, 0.0, cos_phi, 1.0);
                vertices.push(Vertex {
                    position: (normal * radius).to_array(),
                    normal: normal.to_array(),
                    tangent: tangent.to_array(),
                    tex_coord: [u, v],
                });
            }
        }

        let row = segments + 1;
        let mut triangles = Vec::with_capacity((2 * segments * rings) as usize);
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * row + segment;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                if ring != 0 {
                    triangles.push([a, b, c]);
                }
                if ring != rings - 1 {
                    triangles.push([b, d, c]);
                }
            }
        }

        Self::from_vertices(&vertices, IndexBuffer::from_triangles(&triangles))
    }
}

impl GeometryProvider for MeshBuffers {
    #[inline]
    fn triangle_count(&self) -> u32 {
        self.indices.triangle_count()
    }

    #[inline]
    fn triangle_indices(&self, triangle_index: u32) -> Result<[u32; 3]> {
        self.indices.triangle(triangle_index)
    }

    fn position(&self, vertex_index: u32) -> Result<Vec3> {
        self.positions.read::<[f32; 3]>(vertex_index).map(Vec3::from_array)
    }

    fn normal(&self, vertex_index: u32) -> Result<Vec3> {
        self.normals.read::<[f32; 3]>(vertex_index).map(Vec3::from_array)
    }

    fn tangent(&self, vertex_index: u32) -> Result<Vec4> {
        self.tangents.read::<[f32; 4]>(vertex_index).map(Vec4::from_array)
    }

    fn tex_coord(&self, vertex_index: u32) -> Result<Vec2> {
        self.tex_coords.read::<[f32; 2]>(vertex_index).map(Vec2::from_array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn face_normal(mesh: &MeshBuffers, triangle: u32) -> Vec3 {
        let [a, b, c] = mesh.triangle_indices(triangle).unwrap();
        let p = |i| mesh.position(i).unwrap();
        (p(b) - p(a)).cross(p(c) - p(a)).normalize()
    }

    #[test]
    fn quad_faces_positive_z() {
        let quad = MeshBuffers::quad(2.0, 4.0, 1.0).unwrap();
        assert_eq!(quad.triangle_count(), 2);
        assert_eq!(quad.vertex_count(), 4);
        for triangle in 0..2 {
            assert!(face_normal(&quad, triangle).abs_diff_eq(Vec3::Z, 1e-6));
        }
        assert_eq!(quad.bounds().min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(quad.bounds().max, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(quad.tex_coord(2).unwrap(), Vec2::ONE);
        assert_eq!(quad.tangent(0).unwrap(), Vec4::new(1.0, 0.0, 0.0, -1.0));
    }

    #[test]
    fn separate_buffers_match_interleaved() {
        let interleaved = MeshBuffers::quad(1.0, 1.0, 3.0).unwrap();
        let positions: Vec<[f32; 3]> =
            (0..4).map(|i| interleaved.position(i).unwrap().to_array()).collect();
        let normals = vec![[0.0_f32, 0.0, 1.0]; 4];
        let tangents = vec![[1.0_f32, 0.0, 0.0, -1.0]; 4];
        let uvs: Vec<[f32; 2]> =
            (0..4).map(|i| interleaved.tex_coord(i).unwrap().to_array()).collect();
        let separate = MeshBuffers::new(
            IndexBuffer::from_u16(&[0, 3, 2, 0, 2, 1]).unwrap(),
            AttributeBuffer::from_records(&positions),
            AttributeBuffer::from_records(&normals),
            AttributeBuffer::from_records(&tangents),
            AttributeBuffer::from_records(&uvs),
        )
        .unwrap();
        for triangle in 0..2 {
            assert_eq!(
                separate.triangle_indices(triangle).unwrap(),
                interleaved.triangle_indices(triangle).unwrap()
            );
        }
        for vertex in 0..4 {
            assert_eq!(separate.tex_coord(vertex).unwrap(), interleaved.tex_coord(vertex).unwrap());
        }
    }

    #[test]
    fn index_past_vertices_is_rejected() {
        let result = MeshBuffers::from_vertices(
            &[Vertex::default(); 3],
            IndexBuffer::from_triangles(&[[0, 1, 3]]),
        );
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn truncated_last_vertex_is_not_a_vertex() {
        // The third vertex is cut off after its position and normal.
        let vertices = [Vertex::default(); 3];
        let bytes = &bytemuck::cast_slice::<Vertex, u8>(&vertices)[..2 * Vertex::STRIDE + 24];
        let bytes: Arc<[u8]> = Arc::from(bytes);
        let view = |offset| AttributeBuffer::new(bytes.clone(), offset, Vertex::STRIDE).unwrap();
        let build = |triangle| {
            MeshBuffers::new(
                IndexBuffer::from_triangles(&[triangle]),
                view(vertex_layout::POSITION),
                view(vertex_layout::NORMAL),
                view(vertex_layout::TANGENT),
                view(vertex_layout::TEX_COORD),
            )
        };
        assert!(matches!(build([0, 1, 2]), Err(Error::InvalidData(_))));
        assert_eq!(build([0, 1, 1]).unwrap().vertex_count(), 2);
    }

    #[test]
    fn out_of_range_triangle() {
        let quad = MeshBuffers::quad(1.0, 1.0, 1.0).unwrap();
        assert!(matches!(quad.triangle_indices(2), Err(Error::OutOfBounds(_))));
        assert!(matches!(quad.position(4), Err(Error::OutOfBounds(_))));
    }

    #[test]
    fn sphere_is_closed_and_outward() {
        let sphere = MeshBuffers::uv_sphere(2.0, 16, 8).unwrap();
        assert_eq!(sphere.triangle_count(), 2 * 16 * 8 - 2 * 16);
        for triangle in 0..sphere.triangle_count() {
            let [a, b, c] = sphere.triangle_indices(triangle).unwrap();
            let centroid = (sphere.position(a).unwrap()
                + sphere.position(b).unwrap()
                + sphere.position(c).unwrap())
                / 3.0;
            assert!(
                face_normal(&sphere, triangle).dot(centroid) > 0.0,
                "triangle {triangle} faces inward"
            );
        }
        for vertex in 0..sphere.vertex_count() {
            assert_relative_eq!(sphere.position(vertex).unwrap().length(), 2.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn sphere_rejects_too_few_segments() {
        assert!(MeshBuffers::uv_sphere(1.0, 2, 4).is_err());
        assert!(MeshBuffers::uv_sphere(1.0, 8, 1).is_err());
    }

    #[test]
    fn single_triangle_normal() {
        let mesh = MeshBuffers::triangle(
            [Vec3::ZERO, Vec3::X, Vec3::Y],
            [Vec2::ZERO, Vec2::X, Vec2::Y],
        )
        .unwrap();
        assert_eq!(mesh.normal(1).unwrap(), Vec3::Z);
    }
}
