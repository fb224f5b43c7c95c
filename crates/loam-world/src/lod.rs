use serde::{Deserialize, Serialize};

/// Coarsest supported level; stride 64.
pub const MAX_LOD: u8 = 6;

/// Vertex skipping stride for `lod`.
#[inline]
pub const fn lod_stride(lod: u8) -> usize {
    1usize << lod
}

/// Chunks nearer than `distance` (and past the previous threshold) use `lod`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodThreshold {
    pub lod: u8,
    pub distance: f32,
}

impl LodThreshold {
    pub const fn new(lod: u8, distance: f32) -> Self {
        Self { lod, distance }
    }
}

/// Index of the bucket for a chunk `distance` away from the viewer.
///
/// Walks thresholds in ascending order and stops at the first one not
/// exceeded; anything past the last-but-one threshold lands in the last bucket.
pub fn lod_bucket_for(levels: &[LodThreshold], distance: f32) -> usize {
    let mut bucket = 0;
    for (i, level) in levels.iter().enumerate().take(levels.len().saturating_sub(1)) {
        if distance > level.distance {
            bucket = i + 1;
        } else {
            break;
        }
    }
    bucket
}
