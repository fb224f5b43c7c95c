//! Fractal coherent-noise height fields.
//!
//! Two normalization policies exist. `Global` maps the theoretical octave-sum
//! range onto [0,1] and is the only one that tiles: neighbouring chunks agree
//! on their shared edges. `Local` stretches each field to its own min/max and
//! is meant for single previews.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use loam_geom::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::chunk_coord::ChunkCoord;
use crate::error::{Result, TerrainError};

/// Scales below this are clamped up to it.
pub const MIN_NOISE_SCALE: f32 = 0.3;
pub const MAX_OCTAVES: u32 = 16;
// Kept small so f32 sample coordinates retain sub-cell precision.
const OCTAVE_JITTER: f32 = 10_000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    Local,
    #[default]
    Global,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseSettings {
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_octaves")]
    pub octaves: u32,
    #[serde(default = "default_persistance")]
    pub persistance: f32,
    #[serde(default = "default_lacunarity")]
    pub lacunarity: f32,
    #[serde(default)]
    pub seed: i32,
    #[serde(default)]
    pub offset: Vec2,
    #[serde(default)]
    pub normalize: NormalizeMode,
}

fn default_scale() -> f32 {
    50.0
}
fn default_octaves() -> u32 {
    4
}
fn default_persistance() -> f32 {
    0.5
}
fn default_lacunarity() -> f32 {
    2.0
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            octaves: default_octaves(),
            persistance: default_persistance(),
            lacunarity: default_lacunarity(),
            seed: 0,
            offset: Vec2::ZERO,
            normalize: NormalizeMode::Global,
        }
    }
}

impl NoiseSettings {
    /// Rejects values with no safe default. A small scale is not an error; see
    /// [`NoiseSettings::effective_scale`].
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() {
            return Err(TerrainError::invalid_parameter(format!(
                "noise scale must be finite, got {}",
                self.scale
            )));
        }
        if self.octaves == 0 || self.octaves > MAX_OCTAVES {
            return Err(TerrainError::invalid_parameter(format!(
                "octaves must be in 1..={MAX_OCTAVES}, got {}",
                self.octaves
            )));
        }
        if !self.persistance.is_finite() {
            return Err(TerrainError::invalid_parameter(format!(
                "persistance must be finite, got {}",
                self.persistance
            )));
        }
        if !(self.lacunarity.is_finite() && self.lacunarity > 0.0) {
            return Err(TerrainError::invalid_parameter(format!(
                "lacunarity must be positive, got {}",
                self.lacunarity
            )));
        }
        if !self.offset.is_finite() {
            return Err(TerrainError::invalid_parameter("noise offset must be finite"));
        }
        let (amplitude, frequency) = self.octave_growth();
        if !(amplitude.is_finite() && frequency.is_finite()) {
            return Err(TerrainError::invalid_parameter(format!(
                "persistance {} / lacunarity {} overflow over {} octaves",
                self.persistance, self.lacunarity, self.octaves
            )));
        }
        Ok(())
    }

    /// `(max_amplitude, last octave frequency)`; either is infinite when the
    /// per-octave factors overflow `f32`.
    fn octave_growth(&self) -> (f32, f32) {
        let p = self.persistance.abs();
        let mut amplitude = 1.0f32;
        let mut frequency = 1.0f32;
        let mut total = 0.0f32;
        for i in 0..self.octaves {
            total += amplitude;
            if i + 1 < self.octaves {
                amplitude *= p;
                frequency *= self.lacunarity;
            }
        }
        (total, frequency)
    }

    #[inline]
    pub fn effective_scale(&self) -> f32 {
        if self.scale < MIN_NOISE_SCALE {
            MIN_NOISE_SCALE
        } else {
            self.scale
        }
    }

    /// Upper bound of |octave sum|, used by global normalization.
    pub fn max_amplitude(&self) -> f32 {
        self.octave_growth().0
    }

    /// Per-octave sampling jitter drawn from the seed.
    pub fn octave_offsets(&self) -> Vec<Vec2> {
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(self.seed as u32));
        (0..self.octaves)
            .map(|_| {
                let x = rng.random_range(-OCTAVE_JITTER..OCTAVE_JITTER);
                let y = rng.random_range(-OCTAVE_JITTER..OCTAVE_JITTER);
                Vec2::new(x, y)
            })
            .collect()
    }

    /// Copy of these settings sampling the tile at `coord`.
    pub fn for_chunk(&self, coord: ChunkCoord, size: usize) -> NoiseSettings {
        NoiseSettings {
            offset: chunk_offset(self.offset, coord, size),
            ..self.clone()
        }
    }
}

/// Sampling offset of chunk `coord` for fields of `size` cells per side.
///
/// Field rows grow towards world `-z`, so the y component is subtracted.
#[inline]
pub fn chunk_offset(base: Vec2, coord: ChunkCoord, size: usize) -> Vec2 {
    let stride = size.saturating_sub(1) as f32;
    Vec2::new(
        base.x + coord.cx as f32 * stride,
        base.y - coord.cy as f32 * stride,
    )
}

/// Square grid of normalized samples, row-major (`y * size + x`).
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    size: usize,
    values: Vec<f32>,
}

impl ScalarField {
    pub fn from_values(size: usize, values: Vec<f32>) -> Result<Self> {
        if size == 0 || values.len() != size * size {
            return Err(TerrainError::invalid_dimension(format!(
                "field of size {size} needs {} values, got {}",
                size * size,
                values.len()
            )));
        }
        Ok(Self { size, values })
    }

    /// Uniform field; handy for tests and flat placeholder chunks.
    pub fn filled(size: usize, value: f32) -> Result<Self> {
        Self::from_values(size, vec![value; size * size])
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[self.idx(x, y)]
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn min_max(&self) -> (f32, f32) {
        self.values
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    /// Generates a `size`×`size` field from `settings`.
    pub fn generate(size: usize, settings: &NoiseSettings) -> Result<Self> {
        if size == 0 {
            return Err(TerrainError::invalid_dimension("noise field size must be > 0"));
        }
        settings.validate()?;
        if settings.scale < MIN_NOISE_SCALE {
            log::debug!(
                "noise scale {} below floor; using {}",
                settings.scale,
                MIN_NOISE_SCALE
            );
        }
        let scale = settings.effective_scale();

        let mut noise = FastNoiseLite::with_seed(settings.seed);
        noise.set_noise_type(Some(NoiseType::Perlin));
        noise.set_frequency(Some(1.0));

        let mut values = vec![0.0f32; size * size];
        if settings.octaves == 1 {
            for y in 0..size {
                for x in 0..size {
                    let sx = (x as f32 + settings.offset.x) / scale;
                    let sy = (y as f32 + settings.offset.y) / scale;
                    values[y * size + x] = (noise.get_noise_2d(sx, sy) + 1.0) * 0.5;
                }
            }
            match settings.normalize {
                NormalizeMode::Local => normalize_local(&mut values),
                NormalizeMode::Global => values.iter_mut().for_each(|v| *v = v.clamp(0.0, 1.0)),
            }
            return Ok(Self { size, values });
        }

        let jitter = settings.octave_offsets();
        let half = size as f32 * 0.5;
        for y in 0..size {
            // Offset first: neighbours then share bit-identical edge coordinates.
            let wy = y as f32 + settings.offset.y - half;
            for x in 0..size {
                let wx = x as f32 + settings.offset.x - half;
                let mut amplitude = 1.0f32;
                let mut frequency = 1.0f32;
                let mut height = 0.0f32;
                for j in &jitter {
                    let sx = (wx + j.x) / scale * frequency;
                    let sy = (wy + j.y) / scale * frequency;
                    // fastnoise already yields the signed [-1,1] sample.
                    height += noise.get_noise_2d(sx, sy) * amplitude;
                    amplitude *= settings.persistance;
                    frequency *= settings.lacunarity;
                }
                values[y * size + x] = height;
            }
        }

        match settings.normalize {
            NormalizeMode::Local => normalize_local(&mut values),
            NormalizeMode::Global => {
                let max_amp = settings.max_amplitude();
                for v in &mut values {
                    *v = ((*v / max_amp + 1.0) * 0.5).clamp(0.0, 1.0);
                }
            }
        }
        Ok(Self { size, values })
    }
}

/// Rescales to [0,1] by the field's own range; a flat field becomes all zeros.
fn normalize_local(values: &mut [f32]) {
    let (lo, hi) = values
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if hi > lo {
        let range = hi - lo;
        for v in values.iter_mut() {
            *v = (*v - lo) / range;
        }
    } else {
        values.iter_mut().for_each(|v| *v = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_normalization_spans_unit_range() {
        let mut v = vec![-3.0, 1.0, 5.0];
        normalize_local(&mut v);
        assert_eq!(v, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn flat_field_normalizes_to_zero() {
        let mut v = vec![0.25; 9];
        normalize_local(&mut v);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn max_amplitude_is_geometric_sum() {
        let s = NoiseSettings {
            octaves: 3,
            persistance: 0.5,
            ..NoiseSettings::default()
        };
        assert!((s.max_amplitude() - 1.75).abs() < 1e-6);
    }

    #[test]
    fn octave_offsets_follow_seed() {
        let a = NoiseSettings { seed: 7, ..NoiseSettings::default() };
        let b = NoiseSettings { seed: 8, ..NoiseSettings::default() };
        assert_eq!(a.octave_offsets(), a.octave_offsets());
        assert_ne!(a.octave_offsets(), b.octave_offsets());
    }

    #[test]
    fn zero_octaves_rejected() {
        let s = NoiseSettings { octaves: 0, ..NoiseSettings::default() };
        assert!(matches!(
            ScalarField::generate(9, &s),
            Err(TerrainError::InvalidParameter(_))
        ));
    }

    #[test]
    fn zero_size_rejected() {
        assert!(matches!(
            ScalarField::generate(0, &NoiseSettings::default()),
            Err(TerrainError::InvalidDimension(_))
        ));
    }

    #[test]
    fn tiny_scale_is_clamped_not_rejected() {
        let clamped = NoiseSettings { scale: -4.0, ..NoiseSettings::default() };
        let floor = NoiseSettings { scale: MIN_NOISE_SCALE, ..NoiseSettings::default() };
        assert_eq!(
            ScalarField::generate(9, &clamped).unwrap(),
            ScalarField::generate(9, &floor).unwrap()
        );
    }

    #[test]
    fn overflowing_octave_growth_rejected() {
        let loud = NoiseSettings {
            persistance: 1e20,
            octaves: 4,
            ..NoiseSettings::default()
        };
        assert!(matches!(loud.validate(), Err(TerrainError::InvalidParameter(_))));
        assert!(matches!(
            ScalarField::generate(17, &loud),
            Err(TerrainError::InvalidParameter(_))
        ));

        let fast = NoiseSettings {
            lacunarity: 1e20,
            octaves: 4,
            ..NoiseSettings::default()
        };
        assert!(matches!(fast.validate(), Err(TerrainError::InvalidParameter(_))));

        // Large but representable factors stay valid and in range.
        let steep = NoiseSettings {
            persistance: 1e6,
            octaves: 4,
            ..NoiseSettings::default()
        };
        let field = ScalarField::generate(17, &steep).unwrap();
        assert!(field.values().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn chunk_offset_steps_by_stride() {
        let o = chunk_offset(Vec2::new(1.0, 2.0), ChunkCoord::new(2, 3), 129);
        assert_eq!(o, Vec2::new(1.0 + 256.0, 2.0 - 384.0));
    }
}
