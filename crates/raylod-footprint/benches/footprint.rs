//! Per-hit cost of the footprint estimators.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{UVec2, Vec2, Vec3};
use raylod_core::TextureDims;
use raylod_footprint::{
    pixel_spread_angle, ConeStorage, PackedRayCone, RayCone, RayDifferential, UvFootprint,
};

const BOUNCES: usize = 4;

fn cone_path(c: &mut Criterion) {
    let texture = TextureDims::square(2048);
    let dir = Vec3::new(0.1, -0.2, -1.0).normalize();
    let normal = Vec3::new(0.0, 0.3, 1.0).normalize();
    let spread = pixel_spread_angle(std::f32::consts::FRAC_PI_3, 1080);

    c.bench_function("ray_cone_path", |b| {
        b.iter(|| {
            let mut cone = RayCone::primary(black_box(spread));
            let mut lambda = 0.0;
            for bounce in 0..BOUNCES {
                cone = cone.propagate(0.001, 2.0 + bounce as f32);
                lambda += cone.compute_lod(-3.0, dir, normal, texture);
            }
            black_box(lambda)
        });
    });

    c.bench_function("packed_ray_cone_path", |b| {
        b.iter(|| {
            let mut cone = PackedRayCone::encode(RayCone::primary(black_box(spread)));
            let mut lambda = 0.0;
            for bounce in 0..BOUNCES {
                cone = cone.propagate(0.001, 2.0 + bounce as f32);
                lambda += cone.decode().compute_lod(-3.0, dir, normal, texture);
            }
            black_box(lambda)
        });
    });
}

fn differential_path(c: &mut Criterion) {
    let texture = TextureDims::square(2048);
    let dir = Vec3::new(0.1, -0.2, -1.0).normalize();
    let normal = Vec3::new(0.0, 0.3, 1.0).normalize();
    let viewport = UVec2::new(1920, 1080);

    c.bench_function("ray_differential_transfer", |b| {
        b.iter(|| {
            let mut diff = RayDifferential::primary(black_box(dir), Vec3::X, Vec3::Y, viewport);
            for bounce in 0..BOUNCES {
                diff = diff.propagate(dir, 2.0 + bounce as f32, normal);
            }
            black_box(diff)
        });
    });

    c.bench_function("uv_footprint_lod", |b| {
        let duv_dx = Vec2::new(0.0012, -0.0003);
        let duv_dy = Vec2::new(0.0001, 0.0009);
        b.iter(|| {
            black_box(UvFootprint::MaxSquaredLength.compute_lod(
                black_box(duv_dx),
                black_box(duv_dy),
                texture,
            )) + black_box(UvFootprint::PbrtMaxAxis.compute_lod(duv_dx, duv_dy, texture))
        });
    });
}

criterion_group!(benches, cone_path, differential_path);
criterion_main!(benches);
