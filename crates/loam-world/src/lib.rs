//! Terrain sampling: noise fields, band classification, height shaping and config.
#![forbid(unsafe_code)]

pub mod chunk_coord;
pub mod classify;
pub mod config;
pub mod error;
pub mod height_curve;
pub mod lod;
pub mod noise_field;
pub mod terrain;

pub use chunk_coord::ChunkCoord;
pub use classify::{ColorField, Rgba, TerrainBand, classify, grayscale, validate_bands};
pub use config::{ChunkSettings, TerrainConfig, WorkerSettings, load_config_from_path};
pub use error::{Result, TerrainError};
pub use height_curve::{CurveInterp, CurveKey, HeightCurve, TerrainShape};
pub use lod::{LodThreshold, MAX_LOD, lod_bucket_for, lod_stride};
pub use noise_field::{MIN_NOISE_SCALE, NoiseSettings, NormalizeMode, ScalarField, chunk_offset};
pub use terrain::{MapData, Terrain, generate_map_data};
