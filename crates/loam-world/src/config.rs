use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::classify::{Rgba, TerrainBand, validate_bands};
use crate::error::{Result, TerrainError};
use crate::height_curve::TerrainShape;
use crate::lod::{LodThreshold, MAX_LOD, lod_stride};
use crate::noise_field::{MIN_NOISE_SCALE, NoiseSettings};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainConfig {
    #[serde(default)]
    pub noise: NoiseSettings,
    #[serde(default)]
    pub shape: TerrainShape,
    #[serde(default)]
    pub chunks: ChunkSettings,
    #[serde(default = "default_lod_levels")]
    pub lod: Vec<LodThreshold>,
    #[serde(default = "default_bands")]
    pub bands: Vec<TerrainBand>,
    #[serde(default)]
    pub workers: WorkerSettings,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            noise: NoiseSettings::default(),
            shape: TerrainShape::default(),
            chunks: ChunkSettings::default(),
            lod: default_lod_levels(),
            bands: default_bands(),
            workers: WorkerSettings::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkSettings {
    /// Cells per side; must be `2^k + 1`.
    #[serde(default = "default_chunk_size")]
    pub size: usize,
    /// Viewer travel before the visible set is recomputed, in terrain units
    /// (world distance divided by `shape.uniform_scale`).
    #[serde(default = "default_move_threshold")]
    pub move_threshold: f32,
    /// Records farther than this (terrain units) are dropped. `None` keeps
    /// every chunk.
    #[serde(default)]
    pub evict_distance: Option<f32>,
}
fn default_chunk_size() -> usize {
    129
}
fn default_move_threshold() -> f32 {
    25.0
}
impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            move_threshold: default_move_threshold(),
            evict_distance: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// Worker thread count; `None` uses available parallelism.
    #[serde(default)]
    pub threads: Option<usize>,
}

fn default_lod_levels() -> Vec<LodThreshold> {
    vec![
        LodThreshold::new(0, 150.0),
        LodThreshold::new(1, 250.0),
        LodThreshold::new(3, 400.0),
    ]
}

fn default_bands() -> Vec<TerrainBand> {
    vec![
        TerrainBand::new("water_deep", 0.30, Rgba::new(50, 99, 195, 255)),
        TerrainBand::new("water_shallow", 0.40, Rgba::new(54, 103, 199, 255)),
        TerrainBand::new("sand", 0.45, Rgba::new(210, 208, 125, 255)),
        TerrainBand::new("grass", 0.55, Rgba::new(86, 152, 23, 255)),
        TerrainBand::new("grass_dark", 0.60, Rgba::new(62, 107, 18, 255)),
        TerrainBand::new("rock", 0.70, Rgba::new(90, 69, 60, 255)),
        TerrainBand::new("rock_dark", 0.90, Rgba::new(75, 60, 53, 255)),
        TerrainBand::new("snow", 1.00, Rgba::new(255, 255, 255, 255)),
    ]
}

impl TerrainConfig {
    /// Width of one chunk in unscaled terrain units (cells).
    #[inline]
    pub fn chunk_span(&self) -> f32 {
        self.chunks.size.saturating_sub(1) as f32
    }

    /// World-space width of one chunk.
    #[inline]
    pub fn chunk_world_size(&self) -> f32 {
        self.chunk_span() * self.shape.uniform_scale
    }

    /// Distance of the last LOD threshold; chunks beyond it are hidden.
    #[inline]
    pub fn max_view_distance(&self) -> f32 {
        self.lod.last().map(|l| l.distance).unwrap_or(0.0)
    }

    /// Startup validation. Every error here is fatal configuration.
    pub fn validate(&self) -> Result<()> {
        self.noise.validate()?;
        if self.noise.scale < MIN_NOISE_SCALE {
            log::warn!(
                "noise.scale {} is below {}; it will be clamped",
                self.noise.scale,
                MIN_NOISE_SCALE
            );
        }
        self.shape.validate()?;
        validate_bands(&self.bands)?;

        let size = self.chunks.size;
        if size < 2 || !(size - 1).is_power_of_two() {
            return Err(TerrainError::invalid_dimension(format!(
                "chunk size must be 2^k + 1, got {size}"
            )));
        }

        if self.lod.is_empty() {
            return Err(TerrainError::invalid_parameter("at least one LOD level is required"));
        }
        let mut prev = 0.0f32;
        for level in &self.lod {
            if level.lod > MAX_LOD {
                return Err(TerrainError::invalid_parameter(format!(
                    "lod {} exceeds maximum {MAX_LOD}",
                    level.lod
                )));
            }
            if (size - 1) % lod_stride(level.lod) != 0 {
                return Err(TerrainError::invalid_dimension(format!(
                    "chunk size {size} does not support lod {} (stride {})",
                    level.lod,
                    lod_stride(level.lod)
                )));
            }
            if !(level.distance.is_finite() && level.distance > prev) {
                return Err(TerrainError::invalid_parameter(format!(
                    "lod distances must be positive and ascending ({} after {prev})",
                    level.distance
                )));
            }
            prev = level.distance;
        }

        if !(self.chunks.move_threshold.is_finite() && self.chunks.move_threshold >= 0.0) {
            return Err(TerrainError::invalid_parameter("move_threshold must be >= 0"));
        }
        if let Some(evict) = self.chunks.evict_distance {
            if !(evict.is_finite() && evict >= self.max_view_distance()) {
                return Err(TerrainError::invalid_parameter(format!(
                    "evict_distance {evict} must be at least the view distance {}",
                    self.max_view_distance()
                )));
            }
        }
        if self.workers.threads == Some(0) {
            return Err(TerrainError::invalid_parameter("workers.threads must be > 0"));
        }
        Ok(())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<TerrainConfig> {
    let s = fs::read_to_string(path)?;
    let cfg: TerrainConfig = toml::from_str(&s)?;
    cfg.validate()?;
    Ok(cfg)
}
