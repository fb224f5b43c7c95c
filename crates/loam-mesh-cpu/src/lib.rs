//! CPU meshing of terrain height fields into LOD grid meshes.
#![forbid(unsafe_code)]

mod build;
mod mesh_build;

pub use build::build_terrain_mesh;
pub use mesh_build::MeshPayload;
