use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use loam_chunk::{ApplyOutcome, ChunkEvent, ChunkStore};
use loam_geom::Vec2;
use loam_runtime::{GenerationBackend, Scheduler};
use loam_world::{Terrain, TerrainConfig};

use crate::watch::{process_config_events, spawn_config_watcher};

pub struct StreamOptions {
    pub ticks: u32,
    /// World units per tick.
    pub speed: f32,
    /// Degrees from +x towards +z.
    pub heading_deg: f32,
    pub tick_ms: u64,
    pub watch: bool,
}

#[derive(Default, Debug)]
pub struct StreamStats {
    pub entered: u32,
    pub maps: u32,
    pub meshes: u32,
    pub shown: u32,
    pub hidden: u32,
    pub evicted: u32,
    pub stale: u32,
    pub discarded: u32,
    pub failed: u32,
}

impl StreamStats {
    fn record_outcomes(&mut self, outcomes: &[ApplyOutcome]) {
        for o in outcomes {
            match o {
                ApplyOutcome::Applied => {}
                ApplyOutcome::Stale => self.stale += 1,
                ApplyOutcome::Discarded => self.discarded += 1,
                ApplyOutcome::Failed => self.failed += 1,
            }
        }
    }

    fn record_events(&mut self, tick: u32, events: Vec<ChunkEvent>) {
        for e in events {
            match e {
                ChunkEvent::ViewerEnteredChunk { coord } => {
                    self.entered += 1;
                    log::info!(target: "stream", "[tick {}] entered chunk {}", tick, coord);
                }
                ChunkEvent::MapReady { .. } => self.maps += 1,
                ChunkEvent::MeshReady { coord, lod, mesh } => {
                    self.meshes += 1;
                    log::debug!(
                        target: "stream",
                        "[tick {}] mesh {} lod={} tris={}",
                        tick,
                        coord,
                        lod,
                        mesh.triangle_count()
                    );
                }
                ChunkEvent::VisibilityChanged { visible: true, .. } => self.shown += 1,
                ChunkEvent::VisibilityChanged { visible: false, .. } => self.hidden += 1,
                ChunkEvent::Evicted { .. } => self.evicted += 1,
            }
        }
    }
}

/// Drives one control-loop step: feed the viewer, apply results, collect events.
pub fn step<B: GenerationBackend>(
    store: &mut ChunkStore<B>,
    stats: &mut StreamStats,
    tick: u32,
    viewer: Vec2,
) {
    store.on_viewpoint_moved(viewer);
    let outcomes = store.pump();
    stats.record_outcomes(&outcomes);
    stats.record_events(tick, store.drain_events());
}

/// Flies a viewer in a straight line over streamed terrain.
pub fn run_stream(cfg: TerrainConfig, config_path: &Path, opts: &StreamOptions) -> Result<StreamStats> {
    let threads = cfg.workers.threads;
    let terrain = Arc::new(Terrain::new(cfg).context("invalid terrain config")?);
    let scheduler = Scheduler::new(threads).context("starting generation pool")?;
    let mut store = ChunkStore::new(terrain, scheduler);

    let reload_rx = opts.watch.then(|| {
        log::info!("watching {} for changes", config_path.display());
        spawn_config_watcher(config_path.to_path_buf())
    });

    let heading = opts.heading_deg.to_radians();
    let dir = Vec2::new(heading.cos(), heading.sin());
    let mut stats = StreamStats::default();
    let started = Instant::now();
    for tick in 0..opts.ticks {
        if let Some(rx) = &reload_rx {
            process_config_events(rx, config_path, &mut store);
        }
        let viewer = dir * (opts.speed * tick as f32);
        step(&mut store, &mut stats, tick, viewer);

        if tick % 60 == 0 {
            let (qm, im, qs, is) = store.backend().queue_debug_counts();
            log::info!(
                target: "perf",
                "[tick {}] resident={} visible={} map q/if={}/{} mesh q/if={}/{}",
                tick,
                store.len(),
                store.visible_chunks().count(),
                qm,
                im,
                qs,
                is
            );
        }
        if opts.tick_ms > 0 {
            std::thread::sleep(Duration::from_millis(opts.tick_ms));
        }
    }
    log::info!(
        "streamed {} ticks in {:.2}s: {:?}",
        opts.ticks,
        started.elapsed().as_secs_f32(),
        stats
    );
    Ok(stats)
}
