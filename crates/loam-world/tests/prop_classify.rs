use loam_world::{Rgba, ScalarField, TerrainBand, TerrainConfig, classify, validate_bands};
use proptest::prelude::*;

fn band_table() -> impl Strategy<Value = Vec<TerrainBand>> {
    prop::collection::vec((0.0f32..1.0, any::<[u8; 4]>()), 1..8).prop_map(|mut raw| {
        raw.sort_by(|a, b| a.0.total_cmp(&b.0));
        raw.into_iter()
            .enumerate()
            .map(|(i, (h, c))| TerrainBand::new(format!("b{i}"), h, Rgba::from(c)))
            .collect()
    })
}

fn field() -> impl Strategy<Value = ScalarField> {
    (1usize..6).prop_flat_map(|n| {
        prop::collection::vec(0.0f32..=1.0, n * n)
            .prop_map(move |v| ScalarField::from_values(n, v).unwrap())
    })
}

proptest! {
    // Every cell gets a color from the table, even above the last threshold.
    #[test]
    fn every_cell_is_colored_from_table(bands in band_table(), f in field()) {
        prop_assert!(validate_bands(&bands).is_ok());
        let colors = classify(&f, &bands).unwrap();
        prop_assert_eq!(colors.colors().len(), f.values().len());
        for (i, &v) in f.values().iter().enumerate() {
            let expect = bands
                .iter()
                .find(|b| v <= b.height)
                .unwrap_or_else(|| bands.last().unwrap())
                .color;
            prop_assert_eq!(colors.colors()[i], expect);
        }
    }

    #[test]
    fn classification_is_pure(bands in band_table(), f in field()) {
        prop_assert_eq!(classify(&f, &bands).unwrap(), classify(&f, &bands).unwrap());
    }
}

#[test]
fn empty_table_is_an_error() {
    let f = ScalarField::filled(3, 0.5).unwrap();
    assert!(classify(&f, &[]).is_err());
}

#[test]
fn default_table_covers_water_and_snow() {
    let cfg = TerrainConfig::default();
    let f = ScalarField::from_values(2, vec![0.0, 0.3, 0.95, 1.0]).unwrap();
    let c = classify(&f, &cfg.bands).unwrap();
    assert_eq!(c.get(0, 0), cfg.bands[0].color);
    assert_eq!(c.get(1, 0), cfg.bands[0].color);
    assert_eq!(c.get(0, 1), cfg.bands[7].color);
    assert_eq!(c.get(1, 1), cfg.bands[7].color);
}
