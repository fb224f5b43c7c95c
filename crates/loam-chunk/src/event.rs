use std::sync::Arc;

use loam_mesh_cpu::MeshPayload;
use loam_world::{ChunkCoord, MapData};

/// Notifications for the display shell, drained in emission order.
#[derive(Clone, Debug)]
pub enum ChunkEvent {
    ViewerEnteredChunk { coord: ChunkCoord },
    MapReady { coord: ChunkCoord, map: MapData },
    MeshReady { coord: ChunkCoord, lod: u8, mesh: Arc<MeshPayload> },
    VisibilityChanged { coord: ChunkCoord, visible: bool },
    Evicted { coord: ChunkCoord },
}

impl ChunkEvent {
    pub fn coord(&self) -> ChunkCoord {
        match self {
            ChunkEvent::ViewerEnteredChunk { coord }
            | ChunkEvent::MapReady { coord, .. }
            | ChunkEvent::MeshReady { coord, .. }
            | ChunkEvent::VisibilityChanged { coord, .. }
            | ChunkEvent::Evicted { coord } => *coord,
        }
    }
}

/// What happened to one completed job when it reached the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Valid result for a LOD that is no longer wanted; cached, not shown.
    Stale,
    /// Made under old params or for a chunk that no longer exists.
    Discarded,
    /// Generation failed; the chunk will request again on its next update.
    Failed,
}
