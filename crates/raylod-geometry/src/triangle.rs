//! Triangle-local differential geometry.
//!
//! Bridges a hit (triangle index plus barycentrics) to the quantities the
//! footprint estimators consume:
//! - interpolated world-space vertex attributes for shading
//! - the per-triangle LOD constant used by ray cones
//! - barycentric, UV and normal derivatives plus the reflected direction
//!   derivatives used by ray differentials (Igehy, "normal-interpolated
//!   triangles")

use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};
use raylod_core::constants::DEGENERATE_AREA_EPSILON;
use raylod_core::{Barycentrics, InstanceTransform, Result};
use raylod_footprint::RayDifferential;
use serde::{Deserialize, Serialize};

use crate::provider::GeometryProvider;

/// How barycentric derivatives are obtained from a position derivative.
///
/// Both give the same result for position derivatives lying in the triangle
/// plane, which is what [`RayDifferential::propagate`] produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarycentricMethod {
    /// Dot products with two edge planes oriented by the face normal.
    /// Independent of the ray direction.
    #[default]
    EdgePlanes,
    /// Cramer's rule on the ray/triangle system, using edge cross products
    /// with the ray direction.
    RayDirection,
}

/// Shading frame at a hit, in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InterpolatedAttributes {
    pub position: Vec3,
    /// Unit shading normal.
    pub normal: Vec3,
    /// Unit tangent with the bitangent sign in `w`.
    pub tangent: Vec4,
    pub tex_coord: Vec2,
}

/// The three vertices of a triangle with positions, normals and tangents
/// already in world space.
///
/// Normals are transformed but not normalized, so that their interpolation
/// can be differentiated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleVertices {
    pub positions: [Vec3; 3],
    pub normals: [Vec3; 3],
    pub tangents: [Vec4; 3],
    pub tex_coords: [Vec2; 3],
}

impl TriangleVertices {
    /// Fetch a triangle through `geometry` and move it to world space.
    pub fn fetch<G>(geometry: &G, transform: &InstanceTransform, triangle_index: u32) -> Result<Self>
    where
        G: GeometryProvider + ?Sized,
    {
        let indices = geometry.triangle_indices(triangle_index)?;
        let mut positions = [Vec3::ZERO; 3];
        let mut normals = [Vec3::ZERO; 3];
        let mut tangents = [Vec4::ZERO; 3];
        let mut tex_coords = [Vec2::ZERO; 3];
        for (slot, &vertex) in indices.iter().enumerate() {
            positions[slot] = transform.transform_point(geometry.position(vertex)?);
            normals[slot] = transform.transform_normal(geometry.normal(vertex)?);
            let tangent = geometry.tangent(vertex)?;
            tangents[slot] = transform.transform_tangent(tangent.xyz()).extend(tangent.w);
            tex_coords[slot] = geometry.tex_coord(vertex)?;
        }
        Ok(Self {
            positions,
            normals,
            tangents,
            tex_coords,
        })
    }

    #[inline]
    fn edges(&self) -> (Vec3, Vec3) {
        let [p0, p1, p2] = self.positions;
        (p1 - p0, p2 - p0)
    }

    /// Unit normal of the triangle plane following the winding order.
    /// Zero for degenerate triangles.
    #[inline]
    pub fn face_normal(&self) -> Vec3 {
        let (e01, e02) = self.edges();
        e01.cross(e02).normalize_or_zero()
    }

    /// World-space area.
    #[inline]
    pub fn world_area(&self) -> f32 {
        let (e01, e02) = self.edges();
        0.5 * e01.cross(e02).length()
    }

    /// Area in UV space.
    #[inline]
    pub fn texture_area(&self) -> f32 {
        let [t0, t1, t2] = self.tex_coords;
        0.5 * (t1 - t0).perp_dot(t2 - t0).abs()
    }

    /// Per-triangle LOD constant `0.5 * log2(texture_area / world_area)`.
    ///
    /// Both areas are clamped to [`DEGENERATE_AREA_EPSILON`], so the result
    /// is always finite.
    pub fn lod_constant(&self) -> f32 {
        let world_area = self.world_area();
        let texture_area = self.texture_area();
        if world_area < DEGENERATE_AREA_EPSILON || texture_area < DEGENERATE_AREA_EPSILON {
            tracing::trace!(world_area, texture_area, "Clamping degenerate triangle area");
        }
        let world_area = world_area.max(DEGENERATE_AREA_EPSILON);
        let texture_area = texture_area.max(DEGENERATE_AREA_EPSILON);
        0.5 * (texture_area / world_area).log2()
    }

    /// Interpolated normal before normalization.
    #[inline]
    pub fn interpolated_normal(&self, barycentrics: Barycentrics) -> Vec3 {
        barycentrics.interpolate(self.normals)
    }

    /// Shading frame at `barycentrics`.
    pub fn interpolate(&self, barycentrics: Barycentrics) -> InterpolatedAttributes {
        let tangent = barycentrics.interpolate(self.tangents.map(|t| t.xyz()));
        InterpolatedAttributes {
            position: barycentrics.interpolate(self.positions),
            normal: self.interpolated_normal(barycentrics).normalize_or_zero(),
            tangent: tangent.normalize_or_zero().extend(self.tangents[0].w),
            tex_coord: barycentrics.interpolate(self.tex_coords),
        }
    }

    /// Derivatives `(du, dv, dw)` of the barycentric weights of vertices 1, 2
    /// and 0 for a hit-point derivative `dp`.
    ///
    /// `geometric_normal` orients the edge planes and need not be unit length.
    /// The components always sum to zero.
    pub fn barycentric_derivatives(
        &self,
        method: BarycentricMethod,
        dp: Vec3,
        ray_direction: Vec3,
        geometric_normal: Vec3,
    ) -> Vec3 {
        let (e01, e02) = self.edges();
        let (du, dv) = match method {
            BarycentricMethod::EdgePlanes => {
                let cu = e02.cross(geometric_normal);
                let cv = e01.cross(geometric_normal);
                let lu = cu / cu.dot(e01);
                let lv = cv / cv.dot(e02);
                (lu.dot(dp), lv.dot(dp))
            }
            BarycentricMethod::RayDirection => {
                let q = ray_direction.cross(e02);
                let r = e01.cross(ray_direction);
                let k = 1.0 / e01.dot(q);
                (dp.dot(q) * k, dp.dot(r) * k)
            }
        };
        Vec3::new(du, dv, -du - dv)
    }

    /// Weighted sum of per-vertex values with barycentric derivatives laid out
    /// as returned by [`Self::barycentric_derivatives`].
    #[inline]
    fn differentiate<T>(dbary: Vec3, values: [T; 3]) -> T
    where
        T: Copy + std::ops::Add<Output = T> + std::ops::Mul<f32, Output = T>,
    {
        values[1] * dbary.x + values[2] * dbary.y + values[0] * dbary.z
    }
}

/// Derivative of `n / |n|` given the derivative `dn` of the unnormalized `n`.
#[inline]
fn normalized_derivative(n: Vec3, dn: Vec3) -> Vec3 {
    let nn = n.dot(n);
    (nn * dn - n.dot(dn) * n) / (nn * nn.sqrt())
}

/// Everything a ray-differential hit produces.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HitDifferentials {
    pub attributes: InterpolatedAttributes,
    /// `(du, dv, dw)` per screen x
    pub dbary_dx: Vec3,
    /// `(du, dv, dw)` per screen y
    pub dbary_dy: Vec3,
    pub duv_dx: Vec2,
    pub duv_dy: Vec2,
    /// Derivatives of the unit shading normal.
    pub dn_dx: Vec3,
    pub dn_dy: Vec3,
    /// Differential of the mirror-reflected ray leaving the hit. Origin
    /// derivatives are those of the hit point.
    pub reflected: RayDifferential,
}

/// Interpolated attributes and the per-triangle LOD constant of a hit.
pub fn interpolate_and_compute_triangle_lod_constant<G>(
    geometry: &G,
    transform: &InstanceTransform,
    triangle_index: u32,
    barycentrics: Barycentrics,
) -> Result<(InterpolatedAttributes, f32)>
where
    G: GeometryProvider + ?Sized,
{
    let triangle = TriangleVertices::fetch(geometry, transform, triangle_index)?;
    Ok((triangle.interpolate(barycentrics), triangle.lod_constant()))
}

/// Attributes, UV derivatives and the reflected ray differential of a hit.
///
/// `ray_differential` must already be propagated to the hit with
/// [`RayDifferential::propagate`]; its origin derivatives are the hit-point
/// derivatives. Call once per hit.
#[allow(clippy::too_many_arguments)]
pub fn interpolate_and_compute_barycentric_differentials<G>(
    geometry: &G,
    transform: &InstanceTransform,
    triangle_index: u32,
    barycentrics: Barycentrics,
    ray_direction: Vec3,
    geometric_normal: Vec3,
    ray_differential: RayDifferential,
    method: BarycentricMethod,
) -> Result<HitDifferentials>
where
    G: GeometryProvider + ?Sized,
{
    let triangle = TriangleVertices::fetch(geometry, transform, triangle_index)?;
    let attributes = triangle.interpolate(barycentrics);

    let dbary_dx = triangle.barycentric_derivatives(
        method,
        ray_differential.do_dx,
        ray_direction,
        geometric_normal,
    );
    let dbary_dy = triangle.barycentric_derivatives(
        method,
        ray_differential.do_dy,
        ray_direction,
        geometric_normal,
    );

    let duv_dx = TriangleVertices::differentiate(dbary_dx, triangle.tex_coords);
    let duv_dy = TriangleVertices::differentiate(dbary_dy, triangle.tex_coords);

    // The normalization derivative needs the unnormalized interpolated normal.
    let n = triangle.interpolated_normal(barycentrics);
    let dn_dx = normalized_derivative(n, TriangleVertices::differentiate(dbary_dx, triangle.normals));
    let dn_dy = normalized_derivative(n, TriangleVertices::differentiate(dbary_dy, triangle.normals));

    let reflected =
        reflect_ray_differential(ray_differential, ray_direction, attributes.normal, dn_dx, dn_dy);

    Ok(HitDifferentials {
        attributes,
        dbary_dx,
        dbary_dy,
        duv_dx,
        duv_dy,
        dn_dx,
        dn_dy,
        reflected,
    })
}

/// Differential of the ray reflected about `normal`.
///
/// `dR = dD - 2 (dN (D.N) + N (dD.N + D.dN))`. Origin derivatives are kept.
/// The result does not depend on which side `normal` faces.
pub fn reflect_ray_differential(
    differential: RayDifferential,
    ray_direction: Vec3,
    normal: Vec3,
    dn_dx: Vec3,
    dn_dy: Vec3,
) -> RayDifferential {
    let d_dot_n = ray_direction.dot(normal);
    let reflect = |dd: Vec3, dn: Vec3| {
        let d_ddn = dd.dot(normal) + ray_direction.dot(dn);
        dd - 2.0 * (dn * d_dot_n + normal * d_ddn)
    };
    differential.with_direction_differentials(
        reflect(differential.dd_dx, dn_dx),
        reflect(differential.dd_dy, dn_dy),
    )
}
