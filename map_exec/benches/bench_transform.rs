//! # Transform Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use map_lib::{
    map::curve::arc_from_three_points,
    transform::{compose_points, PointCloud, Pose2},
};
use nalgebra::Point2;

fn transform_benchmark(c: &mut Criterion) {
    // ---- Build a dummy scan ----

    // 1 degree resolution scan at varying range, similar to a 2D laser
    let scan: PointCloud = (0..360)
        .map(|i| {
            let angle_rad = (i as f64).to_radians();
            let range_m = 2.0 + (i % 7) as f64 * 0.5;
            Point2::new(range_m * angle_rad.cos(), range_m * angle_rad.sin())
        })
        .collect();

    let sensor_offset = Pose2::new(0.2, 0.05, 0.01);
    let robot_pose = Pose2::new(12.5, -3.0, 1.2);

    c.bench_function("compose scan sensor->world", |b| {
        b.iter(|| {
            let in_body = compose_points(black_box(&scan), &sensor_offset);
            compose_points(&in_body, &robot_pose)
        })
    });

    c.bench_function("compose scan combined transform", |b| {
        b.iter(|| compose_points(black_box(&scan), &sensor_offset.then(&robot_pose)))
    });

    c.bench_function("arc from three points", |b| {
        b.iter(|| {
            arc_from_three_points(
                black_box(Point2::new(1.0, 0.0)),
                black_box(Point2::new(0.0, 1.0)),
                black_box(Point2::new(-1.0, 0.0)),
            )
        })
    });
}

criterion_group!(benches, transform_benchmark);
criterion_main!(benches);
