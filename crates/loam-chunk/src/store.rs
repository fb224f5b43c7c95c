use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use loam_geom::Vec2;
use loam_runtime::{GenerationBackend, JobOut, JobResult};
use loam_world::{ChunkCoord, Result, Terrain, TerrainConfig, lod_bucket_for};

use crate::event::{ApplyOutcome, ChunkEvent};
use crate::record::ChunkRecord;

/// Resident chunk records around a moving viewer.
///
/// Single-threaded: the owner calls [`ChunkStore::on_viewpoint_moved`] and
/// [`ChunkStore::pump`] from its update loop and drains events afterwards.
/// Generation runs on the backend; nothing here blocks on it.
pub struct ChunkStore<B: GenerationBackend> {
    terrain: Arc<Terrain>,
    backend: B,
    params: Arc<TerrainConfig>,
    epoch: u32,
    chunks: HashMap<ChunkCoord, ChunkRecord>,
    last_visible: Vec<ChunkCoord>,
    // Raw world position; terrain space is this divided by uniform_scale.
    viewer: Option<Vec2>,
    viewer_at_update: Option<Vec2>,
    viewer_chunk: Option<ChunkCoord>,
    events: VecDeque<ChunkEvent>,
}

impl<B: GenerationBackend> ChunkStore<B> {
    pub fn new(terrain: Arc<Terrain>, backend: B) -> Self {
        let params = terrain.params();
        let epoch = terrain.rev();
        Self {
            terrain,
            backend,
            params,
            epoch,
            chunks: HashMap::new(),
            last_visible: Vec::new(),
            viewer: None,
            viewer_at_update: None,
            viewer_chunk: None,
            events: VecDeque::new(),
        }
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn params(&self) -> &Arc<TerrainConfig> {
        &self.params
    }

    #[inline]
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    #[inline]
    pub fn get(&self, coord: ChunkCoord) -> Option<&ChunkRecord> {
        self.chunks.get(&coord)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ChunkRecord> {
        self.chunks.values()
    }

    pub fn visible_chunks(&self) -> impl Iterator<Item = &ChunkRecord> {
        self.chunks.values().filter(|r| r.visible)
    }

    #[inline]
    pub fn viewer_chunk(&self) -> Option<ChunkCoord> {
        self.viewer_chunk
    }

    /// Takes every pending event in emission order.
    pub fn drain_events(&mut self) -> Vec<ChunkEvent> {
        self.events.drain(..).collect()
    }

    fn terrain_space(&self, world: Vec2) -> Vec2 {
        world / self.params.shape.uniform_scale
    }

    fn track_viewer_chunk(&mut self, pos: Vec2) {
        let coord = ChunkCoord::containing(pos, self.params.chunk_span());
        if self.viewer_chunk != Some(coord) {
            self.viewer_chunk = Some(coord);
            log::info!(target: "stream", "viewer entered chunk {}", coord);
            self.events.push_back(ChunkEvent::ViewerEnteredChunk { coord });
        }
    }

    /// Feeds a new viewer position (world x/z).
    ///
    /// The chunk-entered check runs on every call; the visible set is only
    /// recomputed on the first call and after moving past `move_threshold`.
    pub fn on_viewpoint_moved(&mut self, position: Vec2) {
        self.viewer = Some(position);
        let pos = self.terrain_space(position);
        self.track_viewer_chunk(pos);

        let threshold = self.params.chunks.move_threshold;
        let due = match self.viewer_at_update {
            None => true,
            Some(prev) => (pos - prev).length_sq() > threshold * threshold,
        };
        if due {
            self.refresh();
        }
    }

    /// Recomputes the visible set at the last known viewer position,
    /// ignoring the movement threshold. Also retries failed requests.
    pub fn refresh(&mut self) {
        let Some(world) = self.viewer else {
            return;
        };
        let pos = self.terrain_space(world);
        self.viewer_at_update = Some(pos);
        self.update_visible_chunks(pos);
    }

    fn update_visible_chunks(&mut self, pos: Vec2) {
        let span = self.params.chunk_span();
        let radius = (self.params.max_view_distance() / span).round() as i32;
        let center = ChunkCoord::containing(pos, span);

        if let Some(evict) = self.params.chunks.evict_distance {
            self.evict_beyond(pos, evict, center, radius);
        }

        let previously_visible = std::mem::take(&mut self.last_visible);
        let mut window: HashSet<ChunkCoord> = HashSet::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let coord = center.offset(dx, dy);
                window.insert(coord);
                if self.chunks.contains_key(&coord) {
                    self.update_chunk(coord);
                } else {
                    self.create_chunk(coord);
                }
            }
        }
        for coord in previously_visible {
            if !window.contains(&coord) {
                self.set_visible(coord, false);
            }
        }
        log::debug!(
            target: "stream",
            "visible set at {} r={} visible={} resident={}",
            center,
            radius,
            self.last_visible.len(),
            self.chunks.len()
        );
    }

    fn create_chunk(&mut self, coord: ChunkCoord) {
        let mut rec = ChunkRecord::new(coord, self.params.chunk_span(), &self.params.lod);
        rec.map_requested = true;
        self.chunks.insert(coord, rec);
        let job = self
            .backend
            .request_map_data(coord, self.epoch, Arc::clone(&self.params));
        log::debug!(target: "stream", "requested map {} job={}", coord, job);
    }

    /// Re-evaluates LOD and visibility of one chunk against the viewer.
    fn update_chunk(&mut self, coord: ChunkCoord) {
        let Some(world) = self.viewer else {
            return;
        };
        let pos = self.terrain_space(world);
        let max_view = self.params.max_view_distance();
        let Self {
            chunks,
            backend,
            params,
            events,
            last_visible,
            epoch,
            ..
        } = self;
        let Some(rec) = chunks.get_mut(&coord) else {
            return;
        };
        let field = match &rec.map {
            Some(map) => Arc::clone(&map.field),
            None => {
                if !rec.map_requested {
                    rec.map_requested = true;
                    let job = backend.request_map_data(coord, *epoch, Arc::clone(params));
                    log::debug!(target: "stream", "re-requested map {} job={}", coord, job);
                }
                return;
            }
        };

        let dist = rec.bounds.distance(pos);
        let visible = dist <= max_view;
        if visible {
            let bucket = lod_bucket_for(&params.lod, dist);
            rec.desired_bucket = Some(bucket);
            if rec.active_bucket != Some(bucket) {
                if let Some(slot) = rec.lod_meshes.get_mut(bucket) {
                    if let Some(mesh) = slot.mesh.clone() {
                        rec.active_bucket = Some(bucket);
                        events.push_back(ChunkEvent::MeshReady {
                            coord,
                            lod: slot.lod,
                            mesh,
                        });
                    } else if !slot.requested {
                        slot.requested = true;
                        let job = backend.request_mesh_data(
                            coord,
                            field,
                            slot.lod,
                            *epoch,
                            Arc::clone(params),
                        );
                        log::debug!(
                            target: "stream",
                            "requested mesh {} lod={} job={}",
                            coord,
                            slot.lod,
                            job
                        );
                    }
                }
            }
            last_visible.push(coord);
        }
        if rec.visible != visible {
            rec.visible = visible;
            events.push_back(ChunkEvent::VisibilityChanged { coord, visible });
        }
    }

    fn set_visible(&mut self, coord: ChunkCoord, visible: bool) {
        if let Some(rec) = self.chunks.get_mut(&coord) {
            if rec.visible != visible {
                rec.visible = visible;
                self.events
                    .push_back(ChunkEvent::VisibilityChanged { coord, visible });
            }
        }
    }

    /// Drops records farther than `evict`. Coordinates inside the current
    /// window are kept whatever their distance, or they would be re-requested
    /// straight away.
    fn evict_beyond(&mut self, pos: Vec2, evict: f32, center: ChunkCoord, radius: i32) {
        let in_window = |c: ChunkCoord| {
            (c.cx - center.cx).abs() <= radius && (c.cy - center.cy).abs() <= radius
        };
        let far: Vec<ChunkCoord> = self
            .chunks
            .values()
            .filter(|r| !in_window(r.coord) && r.bounds.distance(pos) > evict)
            .map(|r| r.coord)
            .collect();
        if far.is_empty() {
            return;
        }
        for &coord in &far {
            self.chunks.remove(&coord);
            self.events.push_back(ChunkEvent::Evicted { coord });
        }
        log::debug!(
            target: "stream",
            "evicted {} chunks beyond {}; resident={}",
            far.len(),
            evict,
            self.chunks.len()
        );
    }

    /// Applies every finished job. Never blocks.
    pub fn pump(&mut self) -> Vec<ApplyOutcome> {
        let results = self.backend.drain_worker_results();
        results.into_iter().map(|out| self.apply(out)).collect()
    }

    /// Applies one finished job against the current desired state.
    ///
    /// Results from an older epoch or for unknown chunks are discarded. A mesh
    /// for a LOD other than the desired one is cached but not displayed.
    pub fn apply(&mut self, out: JobOut) -> ApplyOutcome {
        let JobOut {
            coord,
            epoch,
            job_id,
            result,
            ..
        } = out;
        if epoch != self.epoch {
            log::debug!(
                target: "stream",
                "discarding job {} for {}: epoch {} != {}",
                job_id,
                coord,
                epoch,
                self.epoch
            );
            return ApplyOutcome::Discarded;
        }
        let Some(rec) = self.chunks.get_mut(&coord) else {
            return ApplyOutcome::Discarded;
        };

        match result {
            JobResult::Map(Ok(map)) => {
                if rec.map.is_some() {
                    return ApplyOutcome::Discarded;
                }
                rec.map = Some(map.clone());
                rec.map_requested = false;
                self.events.push_back(ChunkEvent::MapReady { coord, map });
                self.update_chunk(coord);
                ApplyOutcome::Applied
            }
            JobResult::Map(Err(e)) => {
                rec.map_requested = false;
                log::warn!("map generation for {} failed: {}", coord, e);
                ApplyOutcome::Failed
            }
            JobResult::Mesh { lod, mesh: Ok(mesh) } => {
                let mut stored = false;
                for slot in rec.lod_meshes.iter_mut().filter(|s| s.lod == lod) {
                    slot.mesh = Some(Arc::clone(&mesh));
                    slot.requested = false;
                    stored = true;
                }
                if !stored {
                    return ApplyOutcome::Discarded;
                }
                match rec.desired_bucket {
                    Some(bucket) if rec.lod_meshes[bucket].lod == lod => {
                        if rec.active_bucket != Some(bucket) {
                            rec.active_bucket = Some(bucket);
                            self.events
                                .push_back(ChunkEvent::MeshReady { coord, lod, mesh });
                        }
                        ApplyOutcome::Applied
                    }
                    _ => {
                        log::debug!(
                            target: "stream",
                            "mesh {} lod={} no longer desired; cached",
                            coord,
                            lod
                        );
                        ApplyOutcome::Stale
                    }
                }
            }
            JobResult::Mesh { lod, mesh: Err(e) } => {
                for slot in rec.lod_meshes.iter_mut().filter(|s| s.lod == lod) {
                    slot.requested = false;
                }
                log::warn!("mesh generation for {} lod={} failed: {}", coord, lod, e);
                ApplyOutcome::Failed
            }
        }
    }

    /// Installs new terrain params and starts over with them.
    ///
    /// Every record is dropped (each emits `Evicted`) and jobs still in flight
    /// will be discarded by epoch. On error nothing changes.
    pub fn reconfigure(&mut self, config: TerrainConfig) -> Result<()> {
        let rev = self.terrain.update_params(config)?;
        self.params = self.terrain.params();
        self.epoch = rev;

        let mut dropped: Vec<ChunkCoord> = self.chunks.drain().map(|(c, _)| c).collect();
        dropped.sort_by_key(|c| (c.cy, c.cx));
        for coord in dropped {
            self.events.push_back(ChunkEvent::Evicted { coord });
        }
        self.last_visible.clear();
        self.viewer_at_update = None;
        log::info!(target: "stream", "reconfigured; epoch={}", self.epoch);

        if let Some(world) = self.viewer {
            let pos = self.terrain_space(world);
            self.track_viewer_chunk(pos);
            self.refresh();
        }
        Ok(())
    }
}
