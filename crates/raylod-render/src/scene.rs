//! Instanced triangle scene with brute-force intersection.

use glam::{Mat4, Vec3};
use raylod_core::{Aabb, Barycentrics, InstanceTransform, Ray, TextureDims};
use raylod_geometry::GeometryProvider;
use tracing::debug;

use crate::error::{RenderError, Result};

/// Determinants below this are treated as rays parallel to the triangle.
const PARALLEL_EPSILON: f32 = 1.0e-9;

/// Surface description consumed by the tracer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Material {
    /// Texture bound to the surface; only its size matters for LOD.
    pub texture: TextureDims,
    /// Perfect mirror: the path continues along the reflected ray.
    pub reflective: bool,
}

impl Material {
    /// Diffuse surface textured with `texture`.
    pub const fn textured(texture: TextureDims) -> Self {
        Self {
            texture,
            reflective: false,
        }
    }

    /// Mirror whose LOD is still reported against `texture`.
    pub const fn mirror(texture: TextureDims) -> Self {
        Self {
            texture,
            reflective: true,
        }
    }
}

/// Handle to a mesh registered with [`Scene::add_mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(usize);

/// A placed mesh.
pub struct Instance {
    pub mesh: MeshId,
    pub transform: InstanceTransform,
    pub material: Material,
    /// World-space triangle corners, cached for intersection.
    triangles: Vec<[Vec3; 3]>,
    bounds: Aabb,
}

impl Instance {
    /// World-space bounds.
    pub const fn bounds(&self) -> Aabb {
        self.bounds
    }
}

/// Closest intersection along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    pub instance: usize,
    pub triangle: u32,
    pub distance: f32,
    pub barycentrics: Barycentrics,
    /// Unit world-space face normal following the winding order.
    pub face_normal: Vec3,
}

/// Meshes and their instances.
#[derive(Default)]
pub struct Scene {
    meshes: Vec<Box<dyn GeometryProvider + Send>>,
    instances: Vec<Instance>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh for instancing.
    pub fn add_mesh(&mut self, mesh: impl GeometryProvider + Send + 'static) -> MeshId {
        self.meshes.push(Box::new(mesh));
        MeshId(self.meshes.len() - 1)
    }

    /// Place `mesh` in the world with `world` as its object-to-world matrix.
    pub fn add_instance(&mut self, mesh: MeshId, world: Mat4, material: Material) -> Result<usize> {
        let geometry = self
            .meshes
            .get(mesh.0)
            .ok_or(RenderError::UnknownMesh(mesh.0))?;
        let transform = InstanceTransform::from_world(world);

        let mut triangles = Vec::with_capacity(geometry.triangle_count() as usize);
        let mut bounds = Aabb::EMPTY;
        for triangle in 0..geometry.triangle_count() {
            let indices = geometry.triangle_indices(triangle)?;
            let mut corners = [Vec3::ZERO; 3];
            for (corner, index) in corners.iter_mut().zip(indices) {
                *corner = transform.transform_point(geometry.position(index)?);
                bounds.expand_to_include(*corner);
            }
            triangles.push(corners);
        }

        debug!(
            instance = self.instances.len(),
            triangles = triangles.len(),
            ?material,
            "Instance added"
        );

        self.instances.push(Instance {
            mesh,
            transform,
            material,
            triangles,
            bounds,
        });
        Ok(self.instances.len() - 1)
    }

    /// All instances in insertion order.
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Geometry of an instance.
    pub fn geometry(&self, instance: &Instance) -> &dyn GeometryProvider {
        // Instances are only created for registered meshes.
        self.meshes[instance.mesh.0].as_ref()
    }

    /// Total triangle count over all instances.
    pub fn triangle_count(&self) -> usize {
        self.instances.iter().map(|i| i.triangles.len()).sum()
    }

    /// Closest hit in front of the ray origin, if any.
    pub fn intersect(&self, ray: &Ray) -> Option<SceneHit> {
        let mut closest: Option<SceneHit> = None;
        for (instance_index, instance) in self.instances.iter().enumerate() {
            let limit = closest.map_or(f32::INFINITY, |hit| hit.distance);
            match instance.bounds.padded(1.0e-4).intersect_ray(ray) {
                Some((t_near, _)) if t_near <= limit => {}
                _ => continue,
            }
            for (triangle_index, corners) in instance.triangles.iter().enumerate() {
                let limit = closest.map_or(f32::INFINITY, |hit| hit.distance);
                if let Some((distance, barycentrics)) = intersect_triangle(ray, corners) {
                    if distance < limit {
                        let face_normal = (corners[1] - corners[0])
                            .cross(corners[2] - corners[0])
                            .normalize();
                        closest = Some(SceneHit {
                            instance: instance_index,
                            triangle: triangle_index as u32,
                            distance,
                            barycentrics,
                            face_normal,
                        });
                    }
                }
            }
        }
        closest
    }
}

/// Möller–Trumbore ray/triangle test, double sided.
///
/// Returns the hit distance and the barycentric weights of corners 1 and 2.
pub fn intersect_triangle(ray: &Ray, corners: &[Vec3; 3]) -> Option<(f32, Barycentrics)> {
    let e1 = corners[1] - corners[0];
    let e2 = corners[2] - corners[0];
    let p = ray.direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = ray.origin - corners[0];
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(q) * inv_det;
    (t > 0.0).then_some((t, Barycentrics::new(u, v)))
}
