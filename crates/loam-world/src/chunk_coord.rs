use loam_geom::Vec2;
use serde::{Deserialize, Serialize};

/// Integer tile coordinate on the terrain grid. `cy` runs along world `z`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
        }
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.cx - other.cx);
        let dy = i64::from(self.cy - other.cy);
        dx * dx + dy * dy
    }

    /// Chunk whose center is nearest to `pos`, for chunks `chunk_world` units wide.
    /// Halfway cases round to even.
    #[inline]
    pub fn containing(pos: Vec2, chunk_world: f32) -> Self {
        Self {
            cx: (pos.x / chunk_world).round_ties_even() as i32,
            cy: (pos.y / chunk_world).round_ties_even() as i32,
        }
    }

    /// World-space center of this chunk.
    #[inline]
    pub fn world_center(self, chunk_world: f32) -> Vec2 {
        Vec2::new(self.cx as f32 * chunk_world, self.cy as f32 * chunk_world)
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<ChunkCoord> for (i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.cx, self.cy)
    }
}
