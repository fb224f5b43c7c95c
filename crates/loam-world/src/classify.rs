use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::noise_field::ScalarField;

/// 8-bit RGBA color, written as `[r, g, b, a]` in config files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Linear blend; `t` is clamped to [0,1].
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(v: [u8; 4]) -> Self {
        Rgba::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rgba> for [u8; 4] {
    fn from(c: Rgba) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

/// One entry of the band table: cells with value <= `height` take `color`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainBand {
    pub name: String,
    pub height: f32,
    pub color: Rgba,
}

impl TerrainBand {
    pub fn new(name: impl Into<String>, height: f32, color: Rgba) -> Self {
        Self {
            name: name.into(),
            height,
            color,
        }
    }
}

/// Per-cell colors parallel to a [`ScalarField`].
#[derive(Clone, Debug, PartialEq)]
pub struct ColorField {
    size: usize,
    colors: Vec<Rgba>,
}

impl ColorField {
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Rgba {
        self.colors[y * self.size + x]
    }

    #[inline]
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// Tightly packed RGBA8 bytes, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.colors.len() * 4);
        for c in &self.colors {
            out.extend_from_slice(&[c.r, c.g, c.b, c.a]);
        }
        out
    }
}

/// Band table check done once at startup: non-empty, finite, ascending.
pub fn validate_bands(bands: &[TerrainBand]) -> Result<()> {
    if bands.is_empty() {
        return Err(TerrainError::invalid_parameter("band table is empty"));
    }
    let mut prev = f32::NEG_INFINITY;
    for band in bands {
        if !band.height.is_finite() {
            return Err(TerrainError::invalid_parameter(format!(
                "band '{}' has non-finite height",
                band.name
            )));
        }
        if band.height < prev {
            return Err(TerrainError::invalid_parameter(format!(
                "band '{}' height {} is below the previous band ({prev}); bands must ascend",
                band.name, band.height
            )));
        }
        prev = band.height;
    }
    Ok(())
}

#[inline]
fn band_color(bands: &[TerrainBand], value: f32) -> Rgba {
    bands
        .iter()
        .find(|b| value <= b.height)
        .or_else(|| bands.last())
        .map(|b| b.color)
        .unwrap_or_default()
}

/// Maps every cell to the first band whose threshold covers it.
///
/// Values above every threshold take the last band's color. Ordering of the
/// table is the caller's responsibility; see [`validate_bands`].
pub fn classify(field: &ScalarField, bands: &[TerrainBand]) -> Result<ColorField> {
    if bands.is_empty() {
        return Err(TerrainError::invalid_parameter("band table is empty"));
    }
    let colors = field
        .values()
        .iter()
        .map(|&v| band_color(bands, v))
        .collect();
    Ok(ColorField {
        size: field.size(),
        colors,
    })
}

/// Black-to-white rendering of the raw field.
pub fn grayscale(field: &ScalarField) -> ColorField {
    let colors = field
        .values()
        .iter()
        .map(|&v| Rgba::BLACK.lerp(Rgba::WHITE, v))
        .collect();
    ColorField {
        size: field.size(),
        colors,
    }
}
