//! Chunk residency, LOD selection and stale-result filtering around a viewer.
#![forbid(unsafe_code)]

mod event;
mod record;
mod store;

pub use event::{ApplyOutcome, ChunkEvent};
pub use record::{ChunkRecord, ChunkState, LodMeshSlot};
pub use store::ChunkStore;
