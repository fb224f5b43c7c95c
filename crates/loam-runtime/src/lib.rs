//! Background generation: job lanes, worker pool and result draining.
#![forbid(unsafe_code)]

mod inline;
mod job;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TryRecvError, select, unbounded};
use loam_mesh_cpu::{MeshPayload, build_terrain_mesh};
use loam_world::{ChunkCoord, Result, ScalarField, TerrainConfig, TerrainError};
use rayon::{ThreadPool, ThreadPoolBuilder};

pub use inline::InlineBackend;
pub use job::{BuildJob, JobKind, JobOut, JobResult, execute};
pub use loam_world::generate_map_data;

/// Synchronous mesh generation with the shape from `cfg`.
pub fn generate_mesh_data(cfg: &TerrainConfig, field: &ScalarField, lod: u8) -> Result<MeshPayload> {
    build_terrain_mesh(field, &cfg.shape, lod)
}

/// Where chunk generation runs. Requests return immediately with the job id;
/// results come back through [`GenerationBackend::drain_worker_results`].
pub trait GenerationBackend {
    fn request_map_data(&self, coord: ChunkCoord, epoch: u32, params: Arc<TerrainConfig>) -> u64;

    fn request_mesh_data(
        &self,
        coord: ChunkCoord,
        field: Arc<ScalarField>,
        lod: u8,
        epoch: u32,
        params: Arc<TerrainConfig>,
    ) -> u64;

    /// Every result available right now, in arrival order. Never blocks.
    fn drain_worker_results(&self) -> Vec<JobOut>;
}

fn process_job(job: BuildJob, queued: &AtomicUsize, inflight: &AtomicUsize, tx: &Sender<JobOut>) {
    queued.fetch_sub(1, Ordering::Relaxed);
    inflight.fetch_add(1, Ordering::Relaxed);
    let out = execute(job);
    inflight.fetch_sub(1, Ordering::Relaxed);
    let _ = tx.send(out);
}

/// Threaded backend: a bounded rayon pool fed by a mesh lane and a map lane.
/// Idle workers take mesh jobs before map jobs.
pub struct Scheduler {
    job_tx_mesh: Sender<BuildJob>,
    job_tx_map: Sender<BuildJob>,
    res_rx: Receiver<JobOut>,
    _pool: Arc<ThreadPool>,
    next_job_id: AtomicU64,
    q_mesh: Arc<AtomicUsize>,
    q_map: Arc<AtomicUsize>,
    inflight_mesh: Arc<AtomicUsize>,
    inflight_map: Arc<AtomicUsize>,
    pub workers: usize,
}

impl Scheduler {
    /// `threads = None` uses the machine's available parallelism.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let workers = match threads {
            Some(0) => {
                return Err(TerrainError::invalid_parameter("worker count must be > 0"));
            }
            Some(n) => n,
            None => thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
        };
        let (job_tx_mesh, job_rx_mesh) = unbounded::<BuildJob>();
        let (job_tx_map, job_rx_map) = unbounded::<BuildJob>();
        let (res_tx, res_rx) = unbounded::<JobOut>();

        let q_mesh_ctr = Arc::new(AtomicUsize::new(0));
        let q_map_ctr = Arc::new(AtomicUsize::new(0));
        let inflight_mesh_ctr = Arc::new(AtomicUsize::new(0));
        let inflight_map_ctr = Arc::new(AtomicUsize::new(0));

        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("loam-gen-{i}"))
                .build()
                .map_err(|e| TerrainError::Worker(e.to_string()))?,
        );
        for _ in 0..workers {
            let mesh_rx = job_rx_mesh.clone();
            let map_rx = job_rx_map.clone();
            let tx = res_tx.clone();
            let q_mesh = q_mesh_ctr.clone();
            let q_map = q_map_ctr.clone();
            let inflight_mesh = inflight_mesh_ctr.clone();
            let inflight_map = inflight_map_ctr.clone();
            pool.spawn(move || {
                loop {
                    match mesh_rx.try_recv() {
                        Ok(job) => {
                            process_job(job, &q_mesh, &inflight_mesh, &tx);
                            continue;
                        }
                        Err(TryRecvError::Disconnected) => break,
                        Err(TryRecvError::Empty) => {}
                    }
                    match map_rx.try_recv() {
                        Ok(job) => {
                            process_job(job, &q_map, &inflight_map, &tx);
                            continue;
                        }
                        Err(TryRecvError::Disconnected) => break,
                        Err(TryRecvError::Empty) => {}
                    }
                    select! {
                        recv(mesh_rx) -> res => match res {
                            Ok(job) => process_job(job, &q_mesh, &inflight_mesh, &tx),
                            Err(_) => break,
                        },
                        recv(map_rx) -> res => match res {
                            Ok(job) => process_job(job, &q_map, &inflight_map, &tx),
                            Err(_) => break,
                        },
                    }
                }
            });
        }
        log::info!(target: "perf", "generation pool started with {} workers", workers);

        Ok(Self {
            job_tx_mesh,
            job_tx_map,
            res_rx,
            _pool: pool,
            next_job_id: AtomicU64::new(1),
            q_mesh: q_mesh_ctr,
            q_map: q_map_ctr,
            inflight_mesh: inflight_mesh_ctr,
            inflight_map: inflight_map_ctr,
            workers,
        })
    }

    fn submit(&self, job: BuildJob) {
        let (tx, q) = match job.kind {
            JobKind::Map => (&self.job_tx_map, &self.q_map),
            JobKind::Mesh { .. } => (&self.job_tx_mesh, &self.q_mesh),
        };
        q.fetch_add(1, Ordering::Relaxed);
        if tx.send(job).is_err() {
            q.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// `(queued_map, inflight_map, queued_mesh, inflight_mesh)`
    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        (
            self.q_map.load(Ordering::Relaxed),
            self.inflight_map.load(Ordering::Relaxed),
            self.q_mesh.load(Ordering::Relaxed),
            self.inflight_mesh.load(Ordering::Relaxed),
        )
    }
}

impl GenerationBackend for Scheduler {
    fn request_map_data(&self, coord: ChunkCoord, epoch: u32, params: Arc<TerrainConfig>) -> u64 {
        let job_id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        self.submit(BuildJob {
            coord,
            epoch,
            job_id,
            params,
            kind: JobKind::Map,
        });
        job_id
    }

    fn request_mesh_data(
        &self,
        coord: ChunkCoord,
        field: Arc<ScalarField>,
        lod: u8,
        epoch: u32,
        params: Arc<TerrainConfig>,
    ) -> u64 {
        let job_id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        self.submit(BuildJob {
            coord,
            epoch,
            job_id,
            params,
            kind: JobKind::Mesh { lod, field },
        });
        job_id
    }

    fn drain_worker_results(&self) -> Vec<JobOut> {
        self.res_rx.try_iter().collect()
    }
}
