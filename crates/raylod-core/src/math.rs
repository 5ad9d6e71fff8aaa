//! Math utilities and helpers.

use glam::{Mat3, Mat4, Vec3};

/// Ray for tracing operations.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    /// Ray origin
    pub origin: Vec3,
    /// Ray direction (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Mirror the ray about `shading_normal` at the point `hit_distance`
    /// along it.
    ///
    /// The new origin is pushed off the surface by `offset` along
    /// `face_normal`, on the side the reflected ray leaves from. Either normal
    /// may face either way.
    #[inline]
    #[must_use]
    pub fn reflect(
        &self,
        hit_distance: f32,
        shading_normal: Vec3,
        face_normal: Vec3,
        offset: f32,
    ) -> Self {
        let normal = if shading_normal.dot(self.direction) > 0.0 {
            -shading_normal
        } else {
            shading_normal
        };
        let direction = self.direction - 2.0 * self.direction.dot(normal) * normal;
        let side = if direction.dot(face_normal) >= 0.0 {
            face_normal
        } else {
            -face_normal
        };
        Self {
            origin: self.at(hit_distance) + side * offset,
            direction: direction.normalize(),
        }
    }
}

/// Axis-Aligned Bounding Box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Box that contains nothing; expanding it by a point yields that point.
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Create a new AABB from min and max corners
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest AABB containing all `points`.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::EMPTY;
        for point in points {
            aabb.expand_to_include(point);
        }
        aabb
    }

    /// True if no point has been added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Ray-AABB intersection test, returns (t_near, t_far) or None if no intersection
    pub fn intersect_ray(&self, ray: &Ray) -> Option<(f32, f32)> {
        if self.is_empty() {
            return None;
        }

        let inv_dir = Vec3::ONE / ray.direction;

        let t1 = (self.min - ray.origin) * inv_dir;
        let t2 = (self.max - ray.origin) * inv_dir;

        let t_min = t1.min(t2);
        let t_max = t1.max(t2);

        let t_near = t_min.x.max(t_min.y).max(t_min.z);
        let t_far = t_max.x.min(t_max.y).min(t_max.z);

        if t_near <= t_far && t_far >= 0.0 {
            Some((t_near.max(0.0), t_far))
        } else {
            None
        }
    }

    /// Expand AABB to include a point
    #[inline]
    pub fn expand_to_include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Grow the box by `margin` on every side.
    ///
    /// Flat geometry produces zero-thickness boxes; a margin keeps the slab
    /// test robust for rays that travel inside the flat axis.
    #[inline]
    #[must_use]
    pub fn padded(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }
}

/// Per-instance world transform and the inverse transpose used for normals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceTransform {
    /// Object-to-world matrix
    pub world: Mat4,
    /// Inverse transpose of the upper 3x3 of `world`
    pub inverse_transpose: Mat3,
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl InstanceTransform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        world: Mat4::IDENTITY,
        inverse_transpose: Mat3::IDENTITY,
    };

    /// Build from a world matrix, deriving the normal matrix.
    pub fn from_world(world: Mat4) -> Self {
        Self {
            world,
            inverse_transpose: Mat3::from_mat4(world).inverse().transpose(),
        }
    }

    /// Object-space position to world space.
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.world.transform_point3(point)
    }

    /// Object-space normal to world space (not renormalized).
    #[inline]
    pub fn transform_normal(&self, normal: Vec3) -> Vec3 {
        self.inverse_transpose * normal
    }

    /// Object-space tangent to world space (not renormalized).
    #[inline]
    pub fn transform_tangent(&self, tangent: Vec3) -> Vec3 {
        self.world.transform_vector3(tangent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(1.0), Vec3::X);
        assert_eq!(ray.at(5.0), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn ray_reflect_off_plane() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let reflected = ray.reflect(5.0, Vec3::Z, Vec3::Z, 0.01);
        assert!(reflected.direction.abs_diff_eq(Vec3::Z, 1e-6));
        assert!(reflected.origin.abs_diff_eq(Vec3::new(0.0, 0.0, 0.01), 1e-6));

        let flipped = ray.reflect(5.0, Vec3::NEG_Z, Vec3::NEG_Z, 0.01);
        assert!(flipped.direction.abs_diff_eq(Vec3::Z, 1e-6));
        assert!(flipped.origin.abs_diff_eq(reflected.origin, 1e-6));
    }

    #[test]
    fn ray_reflect_about_shading_normal() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let shading = Vec3::new(1.0, 0.0, 1.0).normalize();
        let reflected = ray.reflect(5.0, shading, Vec3::Z, 0.01);
        // Direction follows the shading normal, the offset the face.
        assert!(reflected.direction.abs_diff_eq(Vec3::X, 1e-6));
        assert!(reflected.origin.abs_diff_eq(Vec3::new(0.0, 0.0, 0.01), 1e-6));
    }

    #[test]
    fn aabb_from_points() {
        let aabb = Aabb::from_points([Vec3::new(1.0, -2.0, 0.0), Vec3::new(-1.0, 3.0, 0.5)]);
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 0.5));
        assert!(Aabb::from_points(std::iter::empty()).is_empty());
    }

    #[test]
    fn aabb_ray_intersection() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);

        // Ray hitting the box
        let ray = Ray::new(Vec3::new(-1.0, 0.5, 0.5), Vec3::X);
        let (t_near, t_far) = aabb.intersect_ray(&ray).expect("ray should hit");
        assert_relative_eq!(t_near, 1.0, epsilon = 0.001);
        assert_relative_eq!(t_far, 2.0, epsilon = 0.001);

        // Ray missing the box
        let ray = Ray::new(Vec3::new(-1.0, 2.0, 0.5), Vec3::X);
        assert!(aabb.intersect_ray(&ray).is_none());

        assert!(Aabb::EMPTY.intersect_ray(&ray).is_none());
    }

    #[test]
    fn instance_transform_normal_under_nonuniform_scale() {
        let xf = InstanceTransform::from_world(Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0)));
        // A 45 degree normal must tilt toward the axis that was not stretched.
        let n = xf.transform_normal(Vec3::new(1.0, 1.0, 0.0).normalize()).normalize();
        let t = xf.transform_tangent(Vec3::new(1.0, -1.0, 0.0));
        assert_relative_eq!(n.dot(t), 0.0, epsilon = 1e-6);
        assert!(n.y > n.x);
    }
}
