use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use loam_world::{ChunkCoord, ScalarField, TerrainConfig};

use crate::GenerationBackend;
use crate::job::{BuildJob, JobKind, JobOut, execute};

/// Runs each job on the caller's thread at request time and holds the
/// result until the next drain. Deterministic; used by tests and previews.
#[derive(Default)]
pub struct InlineBackend {
    next_job_id: AtomicU64,
    done: Mutex<Vec<JobOut>>,
}

impl InlineBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(&self, job: BuildJob) {
        let out = execute(job);
        self.done
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(out);
    }

    fn next_id(&self) -> u64 {
        self.next_job_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl GenerationBackend for InlineBackend {
    fn request_map_data(&self, coord: ChunkCoord, epoch: u32, params: Arc<TerrainConfig>) -> u64 {
        let job_id = self.next_id();
        self.run(BuildJob {
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
        let job_id = self.next_id();
        self.run(BuildJob {
            coord,
            epoch,
            job_id,
            params,
            kind: JobKind::Mesh { lod, field },
        });
        job_id
    }

    fn drain_worker_results(&self) -> Vec<JobOut> {
        std::mem::take(&mut *self.done.lock().unwrap_or_else(|e| e.into_inner()))
    }
}
