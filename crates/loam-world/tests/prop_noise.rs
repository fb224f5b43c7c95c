use loam_geom::Vec2;
use loam_world::{ChunkCoord, NoiseSettings, NormalizeMode, ScalarField, chunk_offset};
use proptest::prelude::*;

fn settings() -> impl Strategy<Value = NoiseSettings> {
    (
        any::<i32>(),
        1.0f32..80.0,
        1u32..=6,
        0.2f32..0.9,
        1.5f32..3.0,
        // Integral offsets keep chunk edge coordinates exactly representable.
        (-2_000i32..2_000, -2_000i32..2_000),
    )
        .prop_map(|(seed, scale, octaves, persistance, lacunarity, (ox, oy))| NoiseSettings {
            scale,
            octaves,
            persistance,
            lacunarity,
            seed,
            offset: Vec2::new(ox as f32, oy as f32),
            normalize: NormalizeMode::Global,
        })
}

fn size() -> impl Strategy<Value = usize> {
    prop_oneof![Just(5usize), Just(9), Just(17)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn values_stay_in_unit_range(s in settings(), n in size(), local in any::<bool>()) {
        let s = NoiseSettings {
            normalize: if local { NormalizeMode::Local } else { NormalizeMode::Global },
            ..s
        };
        let f = ScalarField::generate(n, &s).unwrap();
        prop_assert_eq!(f.values().len(), n * n);
        for &v in f.values() {
            prop_assert!((0.0..=1.0).contains(&v), "value {} out of range", v);
        }
    }

    #[test]
    fn generation_is_deterministic(s in settings(), n in size()) {
        let a = ScalarField::generate(n, &s).unwrap();
        let b = ScalarField::generate(n, &s).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn horizontal_neighbours_share_edge(s in settings(), n in size(), cx in -50i32..50, cy in -50i32..50) {
        let here = ChunkCoord::new(cx, cy);
        let east = here.offset(1, 0);
        let a = ScalarField::generate(n, &s.for_chunk(here, n)).unwrap();
        let b = ScalarField::generate(n, &s.for_chunk(east, n)).unwrap();
        for y in 0..n {
            prop_assert_eq!(a.get(n - 1, y), b.get(0, y));
        }
    }

    #[test]
    fn vertical_neighbours_share_edge(s in settings(), n in size(), cx in -50i32..50, cy in -50i32..50) {
        let here = ChunkCoord::new(cx, cy);
        let north = here.offset(0, 1);
        let a = ScalarField::generate(n, &s.for_chunk(here, n)).unwrap();
        let b = ScalarField::generate(n, &s.for_chunk(north, n)).unwrap();
        // Rows run towards -z, so the northern chunk's last row meets our first.
        for x in 0..n {
            prop_assert_eq!(a.get(x, 0), b.get(x, n - 1));
        }
    }

    #[test]
    fn single_octave_skips_jitter(seed in any::<i32>(), n in size()) {
        let s = NoiseSettings { seed, octaves: 1, scale: 7.5, ..NoiseSettings::default() };
        let f = ScalarField::generate(n, &s).unwrap();
        let shifted = ScalarField::generate(
            n,
            &NoiseSettings { offset: chunk_offset(Vec2::ZERO, ChunkCoord::new(1, 0), n), ..s.clone() },
        )
        .unwrap();
        prop_assert_eq!(f.get(n - 1, 0), shifted.get(0, 0));
    }
}

#[test]
fn reference_settings_are_reproducible() {
    let s = NoiseSettings {
        scale: 20.0,
        octaves: 4,
        persistance: 0.5,
        lacunarity: 2.0,
        seed: 42,
        offset: Vec2::ZERO,
        normalize: NormalizeMode::Global,
    };
    let a = ScalarField::generate(129, &s).unwrap();
    let b = ScalarField::generate(129, &s).unwrap();
    let center = a.get(64, 64);
    assert!((0.0..=1.0).contains(&center));
    assert_eq!(center.to_bits(), b.get(64, 64).to_bits());

    let (lo, hi) = a.min_max();
    assert!(hi > lo, "fractal field should not be flat");
}

#[test]
fn different_seeds_diverge() {
    let a = ScalarField::generate(33, &NoiseSettings { seed: 1, ..NoiseSettings::default() }).unwrap();
    let b = ScalarField::generate(33, &NoiseSettings { seed: 2, ..NoiseSettings::default() }).unwrap();
    assert_ne!(a, b);
}

#[test]
fn local_mode_spans_full_range() {
    let s = NoiseSettings {
        normalize: NormalizeMode::Local,
        scale: 6.0,
        ..NoiseSettings::default()
    };
    let f = ScalarField::generate(33, &s).unwrap();
    let (lo, hi) = f.min_max();
    assert_eq!(lo, 0.0);
    assert_eq!(hi, 1.0);
}
