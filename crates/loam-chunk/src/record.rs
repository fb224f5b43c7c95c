use std::sync::Arc;

use loam_geom::Rect;
use loam_mesh_cpu::MeshPayload;
use loam_world::{ChunkCoord, LodThreshold, MapData};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Map data, or the mesh for a visible chunk's desired LOD, is on its way.
    Requested,
    Ready,
}

/// Cached mesh for one LOD bucket.
#[derive(Clone, Debug)]
pub struct LodMeshSlot {
    pub lod: u8,
    pub mesh: Option<Arc<MeshPayload>>,
    pub requested: bool,
}

pub struct ChunkRecord {
    pub coord: ChunkCoord,
    /// Footprint in unscaled terrain units.
    pub bounds: Rect,
    pub map: Option<MapData>,
    pub(crate) map_requested: bool,
    pub lod_meshes: Vec<LodMeshSlot>,
    /// Bucket chosen by the last distance check.
    pub desired_bucket: Option<usize>,
    /// Bucket whose mesh was last handed out.
    pub active_bucket: Option<usize>,
    pub visible: bool,
}

impl ChunkRecord {
    pub(crate) fn new(coord: ChunkCoord, span: f32, levels: &[LodThreshold]) -> Self {
        Self {
            coord,
            bounds: Rect::from_center_size(coord.world_center(span), span),
            map: None,
            map_requested: false,
            lod_meshes: levels
                .iter()
                .map(|l| LodMeshSlot {
                    lod: l.lod,
                    mesh: None,
                    requested: false,
                })
                .collect(),
            desired_bucket: None,
            active_bucket: None,
            visible: false,
        }
    }

    /// `Ready` chunks drop back to `Requested` when they become visible at a
    /// LOD with no cached mesh.
    pub fn state(&self) -> ChunkState {
        if self.map.is_none() {
            return ChunkState::Requested;
        }
        let awaiting_mesh = self.visible
            && self
                .desired_bucket
                .and_then(|b| self.lod_meshes.get(b))
                .is_some_and(|slot| slot.mesh.is_none());
        if awaiting_mesh {
            ChunkState::Requested
        } else {
            ChunkState::Ready
        }
    }

    /// LOD and mesh currently on display, if any.
    pub fn displayed_mesh(&self) -> Option<(u8, &Arc<MeshPayload>)> {
        let slot = self.lod_meshes.get(self.active_bucket?)?;
        slot.mesh.as_ref().map(|m| (slot.lod, m))
    }

    #[inline]
    pub fn displayed_lod(&self) -> Option<u8> {
        self.displayed_mesh().map(|(lod, _)| lod)
    }

    #[inline]
    pub fn desired_lod(&self) -> Option<u8> {
        self.desired_bucket
            .and_then(|b| self.lod_meshes.get(b))
            .map(|s| s.lod)
    }
}
