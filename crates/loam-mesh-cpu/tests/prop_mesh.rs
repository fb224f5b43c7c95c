use loam_geom::Vec3;
use loam_mesh_cpu::build_terrain_mesh;
use loam_world::{
    ChunkCoord, LodThreshold, ScalarField, TerrainConfig, TerrainShape, generate_map_data,
};
use proptest::prelude::*;

fn field(size: usize) -> impl Strategy<Value = ScalarField> {
    prop::collection::vec(0.0f32..=1.0, size * size)
        .prop_map(move |v| ScalarField::from_values(size, v).unwrap())
}

fn size_and_lod() -> impl Strategy<Value = (usize, u8)> {
    (1u32..=5).prop_flat_map(|k| (Just((1usize << k) + 1), 0u8..=k as u8))
}

#[test]
fn size_five_counts() {
    let f = ScalarField::filled(5, 0.3).unwrap();
    let shape = TerrainShape::default();

    let m0 = build_terrain_mesh(&f, &shape, 0).unwrap();
    assert_eq!(m0.vertex_count(), 25);
    assert_eq!(m0.triangle_count(), 32);
    assert_eq!(m0.idx.len(), 96);

    let m1 = build_terrain_mesh(&f, &shape, 1).unwrap();
    assert_eq!(m1.vertex_count(), 9);
    assert_eq!(m1.triangle_count(), 8);
    assert_eq!(m1.verts_per_line, 3);
}

#[test]
fn flat_field_normals_point_straight_up() {
    let f = ScalarField::filled(9, 0.7).unwrap();
    let m = build_terrain_mesh(&f, &TerrainShape::default(), 1).unwrap();
    for i in 0..m.vertex_count() {
        assert_eq!(m.normal(i), Vec3::UP);
    }
}

#[test]
fn neighbouring_chunks_meet_across_lods() {
    let mut cfg = TerrainConfig::default();
    cfg.chunks.size = 17;
    cfg.noise.scale = 9.0;
    cfg.lod = vec![LodThreshold::new(0, 40.0), LodThreshold::new(2, 80.0)];
    let span = (cfg.chunks.size - 1) as f32;

    let west = ChunkCoord::new(3, -2);
    let east = west.offset(1, 0);
    let a = generate_map_data(&cfg, west).unwrap();
    let b = generate_map_data(&cfg, east).unwrap();
    let fine = build_terrain_mesh(&a.field, &cfg.shape, 0).unwrap();
    let coarse = build_terrain_mesh(&b.field, &cfg.shape, 2).unwrap();

    let to_world = |p: Vec3, c: ChunkCoord| {
        let center = c.world_center(span);
        Vec3::new(p.x + center.x, p.y, p.z + center.y)
    };

    // Every coarse vertex on the shared edge has a fine twin.
    let n_fine = fine.verts_per_line;
    let n_coarse = coarse.verts_per_line;
    let step = (n_fine - 1) / (n_coarse - 1);
    for row in 0..n_coarse {
        let c = to_world(coarse.position(row * n_coarse), east);
        let f = to_world(fine.position(row * step * n_fine + n_fine - 1), west);
        assert_eq!(c, f, "row {row}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn vertex_and_triangle_counts((size, lod) in size_and_lod()) {
        let f = ScalarField::filled(size, 0.5).unwrap();
        let m = build_terrain_mesh(&f, &TerrainShape::default(), lod).unwrap();
        let n = (size - 1) / (1usize << lod) + 1;
        prop_assert_eq!(m.vertex_count(), n * n);
        prop_assert_eq!(m.triangle_count(), 2 * (n - 1) * (n - 1));
        prop_assert_eq!(m.uv.len(), n * n * 2);
        prop_assert_eq!(m.norm.len(), n * n * 3);
    }

    #[test]
    fn indices_in_range_and_normals_upward(f in field(9), lod in 0u8..=3) {
        let m = build_terrain_mesh(&f, &TerrainShape::default(), lod).unwrap();
        let nv = m.vertex_count() as u32;
        prop_assert!(m.idx.iter().all(|&i| i < nv));
        for i in 0..m.vertex_count() {
            let n = m.normal(i);
            prop_assert!(n.y > 0.0);
            prop_assert!((n.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn coarse_vertices_sit_on_fine_grid(f in field(17), lod in 1u8..=4) {
        let shape = TerrainShape::default();
        let fine = build_terrain_mesh(&f, &shape, 0).unwrap();
        let coarse = build_terrain_mesh(&f, &shape, lod).unwrap();
        let stride = 1usize << lod;
        let nc = coarse.verts_per_line;
        for row in 0..nc {
            for col in 0..nc {
                let fi = row * stride * 17 + col * stride;
                prop_assert_eq!(coarse.position(row * nc + col), fine.position(fi));
            }
        }
    }
}
