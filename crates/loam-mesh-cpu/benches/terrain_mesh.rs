use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

use loam_mesh_cpu::build_terrain_mesh;
use loam_world::{ChunkCoord, TerrainConfig, generate_map_data};

fn bench_build_terrain_mesh(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_terrain_mesh");
    let cfg = TerrainConfig::default();
    let map = generate_map_data(&cfg, ChunkCoord::new(0, 0)).unwrap();
    for lod in [0u8, 1, 3] {
        group.bench_function(format!("129x129_lod{lod}"), |b| {
            b.iter(|| {
                let mesh = build_terrain_mesh(&map.field, &cfg.shape, lod).unwrap();
                black_box(mesh);
            })
        });
    }
    group.finish();
}

fn bench_generate_map_data(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_map_data");
    let cfg = TerrainConfig::default();
    group.bench_function("129x129_4oct", |b| {
        b.iter(|| {
            let map = generate_map_data(&cfg, black_box(ChunkCoord::new(2, -1))).unwrap();
            black_box(map);
        })
    });
    group.finish();
}

fn config() -> Criterion {
    Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = config();
    targets = bench_build_terrain_mesh, bench_generate_map_data
}
criterion_main!(benches);
