use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use loam_mesh_cpu::MeshPayload;
use loam_world::{ChunkCoord, MapData, Result, ScalarField, TerrainConfig, TerrainError};

use crate::generate_mesh_data;

#[derive(Clone, Debug)]
pub enum JobKind {
    Map,
    Mesh { lod: u8, field: Arc<ScalarField> },
}

/// One unit of background work. `params` is the snapshot the requester saw;
/// `epoch` lets the consumer drop results made under older params.
#[derive(Clone, Debug)]
pub struct BuildJob {
    pub coord: ChunkCoord,
    pub epoch: u32,
    pub job_id: u64,
    pub params: Arc<TerrainConfig>,
    pub kind: JobKind,
}

pub enum JobResult {
    Map(Result<MapData>),
    Mesh { lod: u8, mesh: Result<Arc<MeshPayload>> },
}

impl JobResult {
    pub fn is_err(&self) -> bool {
        match self {
            JobResult::Map(r) => r.is_err(),
            JobResult::Mesh { mesh, .. } => mesh.is_err(),
        }
    }
}

pub struct JobOut {
    pub coord: ChunkCoord,
    pub epoch: u32,
    pub job_id: u64,
    pub result: JobResult,
    pub t_total_ms: u32,
}

#[inline]
fn elapsed_ms(t0: Instant) -> u32 {
    t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs `job` to completion on the calling thread.
///
/// A panic inside generation is caught and reported as [`TerrainError::Worker`]
/// so the chunk stays retryable and the worker keeps running.
pub fn execute(job: BuildJob) -> JobOut {
    let BuildJob {
        coord,
        epoch,
        job_id,
        params,
        kind,
    } = job;
    let t0 = Instant::now();
    let result = match kind {
        JobKind::Map => {
            let out = panic::catch_unwind(AssertUnwindSafe(|| {
                loam_world::generate_map_data(&params, coord)
            }));
            JobResult::Map(out.unwrap_or_else(|p| Err(TerrainError::Worker(panic_message(p)))))
        }
        JobKind::Mesh { lod, field } => {
            let out = panic::catch_unwind(AssertUnwindSafe(|| {
                generate_mesh_data(&params, &field, lod).map(Arc::new)
            }));
            JobResult::Mesh {
                lod,
                mesh: out.unwrap_or_else(|p| Err(TerrainError::Worker(panic_message(p)))),
            }
        }
    };
    let t_total_ms = elapsed_ms(t0);
    match &result {
        JobResult::Map(Ok(_)) => {
            log::debug!(target: "perf", "map {} job={} took {}ms", coord, job_id, t_total_ms)
        }
        JobResult::Mesh { lod, mesh: Ok(m) } => log::debug!(
            target: "perf",
            "mesh {} lod={} verts={} job={} took {}ms",
            coord,
            lod,
            m.vertex_count(),
            job_id,
            t_total_ms
        ),
        JobResult::Map(Err(e)) | JobResult::Mesh { mesh: Err(e), .. } => {
            log::warn!("job {} for chunk {} failed: {}", job_id, coord, e)
        }
    }
    JobOut {
        coord,
        epoch,
        job_id,
        result,
        t_total_ms,
    }
}
