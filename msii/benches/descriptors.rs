use criterion::{
    BenchmarkId, Criterion, black_box, criterion_group, criterion_main,
};
use msii::descriptor::{Settings, ThreadCount};
use std::num::NonZeroUsize;

pub fn sphere_thread_sweep(c: &mut Criterion) {
    let mesh = &msii::shapes::uv_sphere(10.0, 48, 96);

    let mut group = c.benchmark_group("speed vs threads (uv sphere, 4 radii)");
    for threads in [1, 2, 4, 8] {
        let settings = &Settings {
            threads: match NonZeroUsize::new(threads) {
                Some(n) if threads > 1 => ThreadCount::Many(n),
                _ => ThreadCount::One,
            },
            grid_resolution: 32,
            ..Settings::linear(2.0, 4)
        };
        group.bench_function(
            BenchmarkId::new("compute", threads),
            move |b| {
                b.iter(|| {
                    black_box(msii::descriptor::compute(mesh, settings))
                })
            },
        );
    }
}

pub fn single_query(c: &mut Criterion) {
    let mesh = &msii::shapes::uv_sphere(10.0, 48, 96);
    let filter = &msii::filter::SpatialFilter::build(mesh, 32).unwrap();
    let vertex = mesh.vertices().len() / 2;

    let mut group = c.benchmark_group("single query (uv sphere)");
    for radius in [0.5, 2.0, 8.0] {
        group.bench_function(BenchmarkId::new("build", radius), move |b| {
            let mut builder = msii::graph::GraphBuilder::new();
            b.iter(|| {
                let mut g =
                    builder.build(mesh, filter, vertex, radius).unwrap();
                black_box(msii::graph::algorithm::sphere_volume_area(&mut g))
            })
        });
    }
}

criterion_group!(benches, sphere_thread_sweep, single_query);
criterion_main!(benches);
