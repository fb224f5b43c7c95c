use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use crate::chunk_coord::ChunkCoord;
use crate::classify::{ColorField, classify};
use crate::config::TerrainConfig;
use crate::error::Result;
use crate::noise_field::ScalarField;

/// Shared, swappable terrain parameters.
///
/// Readers take an `Arc` snapshot and never hold the lock while generating.
/// Every swap bumps `rev`, which jobs carry so late results can be told apart.
pub struct Terrain {
    params: RwLock<Arc<TerrainConfig>>,
    rev: AtomicU32,
}

impl Terrain {
    pub fn new(config: TerrainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            params: RwLock::new(Arc::new(config)),
            rev: AtomicU32::new(0),
        })
    }

    pub fn params(&self) -> Arc<TerrainConfig> {
        let guard = self.params.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    #[inline]
    pub fn rev(&self) -> u32 {
        self.rev.load(Ordering::Acquire)
    }

    /// Validates and installs `config`, returning the new revision.
    /// On error the current parameters stay in place.
    pub fn update_params(&self, config: TerrainConfig) -> Result<u32> {
        config.validate()?;
        {
            let mut guard = self.params.write().unwrap_or_else(|e| e.into_inner());
            *guard = Arc::new(config);
        }
        let rev = self.rev.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
        log::info!(target: "events", "terrain params updated rev={}", rev);
        Ok(rev)
    }
}

/// Height field and band colors for one chunk.
#[derive(Clone, Debug)]
pub struct MapData {
    pub coord: ChunkCoord,
    pub field: Arc<ScalarField>,
    pub colors: Arc<ColorField>,
}

/// Samples and classifies the chunk at `coord`.
pub fn generate_map_data(cfg: &TerrainConfig, coord: ChunkCoord) -> Result<MapData> {
    let size = cfg.chunks.size;
    let settings = cfg.noise.for_chunk(coord, size);
    let field = ScalarField::generate(size, &settings)?;
    let colors = classify(&field, &cfg.bands)?;
    Ok(MapData {
        coord,
        field: Arc::new(field),
        colors: Arc::new(colors),
    })
}
