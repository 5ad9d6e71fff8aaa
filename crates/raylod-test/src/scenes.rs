//! Canonical scenes shared by tests, benchmarks and the snapshot tool.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
use std::fmt;
use std::str::FromStr;

use glam::{Mat4, Quat, Vec3};
use raylod_core::TextureDims;
use raylod_geometry::MeshBuffers;
use raylod_render::{Camera, Material, Scene};

use crate::{Result, TestError};

/// A scene with the camera it is meant to be viewed from.
pub struct TestScene {
    pub name: &'static str,
    pub scene: Scene,
    pub camera: Camera,
}

/// Selector for the canonical scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SceneKind {
    #[default]
    TexturedPlane,
    MirrorCorridor,
    SphereOnPlane,
}

impl SceneKind {
    pub const ALL: [Self; 3] = [Self::TexturedPlane, Self::MirrorCorridor, Self::SphereOnPlane];

    /// Build the scene.
    pub fn build(self) -> Result<TestScene> {
        match self {
            Self::TexturedPlane => textured_plane(),
            Self::MirrorCorridor => mirror_corridor(),
            Self::SphereOnPlane => sphere_on_plane(),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::TexturedPlane => "plane",
            Self::MirrorCorridor => "mirror",
            Self::SphereOnPlane => "sphere",
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SceneKind {
    type Err = TestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| TestError::UnknownScene(s.to_string()))
    }
}

/// Square textured quad facing the default camera.
///
/// The quad is shifted off the optical axis so the central pixels do not
/// land on its diagonal.
pub fn textured_plane() -> Result<TestScene> {
    let mut scene = Scene::new();
    let quad = scene.add_mesh(MeshBuffers::quad(8.0, 8.0, 4.0)?);
    scene.add_instance(
        quad,
        Mat4::from_translation(Vec3::new(0.35, 0.15, 0.0)),
        Material::textured(TextureDims::square(1024)),
    )?;
    Ok(TestScene {
        name: "textured_plane",
        scene,
        camera: Camera::default(),
    })
}

/// A 45 degree mirror at the origin folding the view onto a wall at `x = 5`,
/// above a textured floor.
///
/// The central primary ray travels five units to the mirror and five more to
/// the wall.
pub fn mirror_corridor() -> Result<TestScene> {
    let mut scene = Scene::new();
    let mirror = scene.add_mesh(MeshBuffers::quad(3.0, 3.0, 1.0)?);
    let wall = scene.add_mesh(MeshBuffers::quad(10.0, 10.0, 4.0)?);
    let floor = scene.add_mesh(MeshBuffers::quad(16.0, 16.0, 8.0)?);

    scene.add_instance(
        mirror,
        Mat4::from_rotation_translation(
            Quat::from_rotation_y(FRAC_PI_4),
            Vec3::new(0.0, 0.25, 0.0),
        ),
        Material::mirror(TextureDims::square(256)),
    )?;
    scene.add_instance(
        wall,
        Mat4::from_rotation_translation(
            Quat::from_rotation_y(-FRAC_PI_2),
            Vec3::new(5.0, 0.5, 2.0),
        ),
        Material::textured(TextureDims::square(1024)),
    )?;
    scene.add_instance(
        floor,
        Mat4::from_rotation_translation(
            Quat::from_rotation_x(-FRAC_PI_2),
            Vec3::new(2.0, -1.5, 0.0),
        ),
        Material::textured(TextureDims::square(2048)),
    )?;

    Ok(TestScene {
        name: "mirror_corridor",
        scene,
        camera: Camera::default(),
    })
}

/// A mirrored sphere resting on a textured floor, seen from above.
pub fn sphere_on_plane() -> Result<TestScene> {
    let mut scene = Scene::new();
    let floor = scene.add_mesh(MeshBuffers::quad(24.0, 24.0, 12.0)?);
    let sphere = scene.add_mesh(MeshBuffers::uv_sphere(1.0, 32, 16)?);

    scene.add_instance(
        floor,
        Mat4::from_rotation_translation(
            Quat::from_rotation_x(-FRAC_PI_2),
            Vec3::new(0.1, -1.0, 0.2),
        ),
        Material::textured(TextureDims::square(1024)),
    )?;
    scene.add_instance(sphere, Mat4::IDENTITY, Material::mirror(TextureDims::square(512)))?;

    Ok(TestScene {
        name: "sphere_on_plane",
        scene,
        camera: Camera::new(Vec3::new(0.0, 1.5, 6.0), Vec3::ZERO, Vec3::Y, FRAC_PI_4),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scene_names() {
        for kind in SceneKind::ALL {
            assert_eq!(kind.name().parse::<SceneKind>().unwrap(), kind);
        }
        assert!(matches!(
            "cornell".parse::<SceneKind>(),
            Err(TestError::UnknownScene(_))
        ));
    }

    #[test]
    fn scenes_build() {
        for kind in SceneKind::ALL {
            let test_scene = kind.build().unwrap();
            assert!(test_scene.scene.triangle_count() > 0, "{kind} is empty");
        }
    }

    #[test]
    fn corridor_folds_onto_the_wall() {
        let corridor = mirror_corridor().unwrap();
        let ray = raylod_core::Ray::new(corridor.camera.position, Vec3::NEG_Z);
        let mirror = corridor.scene.intersect(&ray).unwrap();
        assert_eq!(mirror.instance, 0);
        assert!((mirror.distance - 5.0).abs() < 1e-5);

        let bounced = ray.reflect(mirror.distance, mirror.face_normal, mirror.face_normal, 1.0e-4);
        assert!(bounced.direction.abs_diff_eq(Vec3::X, 1e-5));
        let wall = corridor.scene.intersect(&bounced).unwrap();
        assert_eq!(wall.instance, 1);
        assert!(wall.face_normal.abs_diff_eq(Vec3::NEG_X, 1e-5));
    }
}
