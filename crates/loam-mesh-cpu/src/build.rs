use std::time::Instant;

use loam_geom::Vec3;
use loam_world::{MAX_LOD, Result, ScalarField, TerrainError, TerrainShape, lod_stride};

use crate::mesh_build::MeshPayload;

/// Builds the chunk grid mesh for `field` at `lod`.
///
/// The grid is centered on the origin in x/z with field row 0 at `+z`.
/// Every LOD samples the same field cells on the chunk border, so edges of
/// neighbouring chunks meet wherever their strides line up.
pub fn build_terrain_mesh(field: &ScalarField, shape: &TerrainShape, lod: u8) -> Result<MeshPayload> {
    if lod > MAX_LOD {
        return Err(TerrainError::invalid_parameter(format!(
            "lod {lod} exceeds maximum {MAX_LOD}"
        )));
    }
    let size = field.size();
    if size == 0 {
        return Err(TerrainError::invalid_dimension("cannot mesh an empty field"));
    }
    let span = size - 1;
    let stride = lod_stride(lod);
    if span % stride != 0 {
        return Err(TerrainError::invalid_dimension(format!(
            "field size {size} is not divisible into lod {lod} stride {stride}"
        )));
    }

    let t0 = Instant::now();
    let n = span / stride + 1;
    let line = n as u32;
    let top_left_x = -(span as f32) / 2.0;
    let top_left_z = span as f32 / 2.0;
    let uv_div = span.max(1) as f32;

    let mut mesh = MeshPayload::with_grid(lod, n);
    let mut v = 0u32;
    for y in (0..size).step_by(stride) {
        for x in (0..size).step_by(stride) {
            let h = shape.height_of(field.get(x, y));
            mesh.push_vertex(
                Vec3::new(top_left_x + x as f32, h, top_left_z - y as f32),
                (x as f32 / uv_div, y as f32 / uv_div),
            );
            if x < span && y < span {
                mesh.add_triangle(v, v + line + 1, v + line);
                mesh.add_triangle(v + line + 1, v, v + 1);
            }
            v += 1;
        }
    }
    mesh.recalculate_normals();
    log::debug!(
        target: "perf",
        "us={} terrain_mesh size={} lod={} verts={} tris={}",
        t0.elapsed().as_micros(),
        size,
        lod,
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}
