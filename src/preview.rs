use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use image::RgbaImage;
use loam_mesh_cpu::build_terrain_mesh;
use loam_world::{ChunkCoord, ColorField, TerrainConfig, generate_map_data, grayscale};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PreviewMode {
    /// Grayscale height field (PNG).
    Noise,
    /// Band colors (PNG).
    Color,
    /// Grid mesh (Wavefront OBJ).
    Mesh,
}

fn to_image(colors: &ColorField) -> Result<RgbaImage> {
    let size = colors.size() as u32;
    match RgbaImage::from_raw(size, size, colors.to_rgba8()) {
        Some(img) => Ok(img),
        None => bail!("color buffer does not match {size}x{size}"),
    }
}

pub fn run_preview(
    cfg: &TerrainConfig,
    mode: PreviewMode,
    coord: ChunkCoord,
    lod: u8,
    out: &Path,
) -> Result<()> {
    let map = generate_map_data(cfg, coord)
        .with_context(|| format!("generating chunk {coord}"))?;
    match mode {
        PreviewMode::Noise => {
            to_image(&grayscale(&map.field))?
                .save(out)
                .with_context(|| format!("writing {}", out.display()))?;
        }
        PreviewMode::Color => {
            to_image(&map.colors)?
                .save(out)
                .with_context(|| format!("writing {}", out.display()))?;
        }
        PreviewMode::Mesh => {
            let mesh = build_terrain_mesh(&map.field, &cfg.shape, lod)
                .with_context(|| format!("meshing chunk {coord} at lod {lod}"))?;
            let file = File::create(out).with_context(|| format!("creating {}", out.display()))?;
            let mut w = BufWriter::new(file);
            mesh.write_obj(&mut w)?;
            w.flush()?;
            log::info!(
                "mesh {} lod={} vertices={} triangles={}",
                coord,
                lod,
                mesh.vertex_count(),
                mesh.triangle_count()
            );
        }
    }
    let (lo, hi) = map.field.min_max();
    log::info!(
        "wrote {:?} preview of {} to {} (range {:.3}..{:.3})",
        mode,
        coord,
        out.display(),
        lo,
        hi
    );
    Ok(())
}

/// Parses `X,Y` into a chunk coordinate.
pub fn parse_coord(s: &str) -> Result<ChunkCoord, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{s}'"))?;
    let x = x.trim().parse::<i32>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<i32>().map_err(|e| e.to_string())?;
    Ok(ChunkCoord::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_parsing() {
        assert_eq!(parse_coord("3,-2"), Ok(ChunkCoord::new(3, -2)));
        assert_eq!(parse_coord(" 0 , 7"), Ok(ChunkCoord::new(0, 7)));
        assert!(parse_coord("3").is_err());
        assert!(parse_coord("a,b").is_err());
    }

    #[test]
    fn writes_mesh_and_image_previews() {
        let mut cfg = TerrainConfig::default();
        cfg.chunks.size = 17;
        let dir = std::env::temp_dir().join(format!("loam-preview-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let obj = dir.join("chunk.obj");
        run_preview(&cfg, PreviewMode::Mesh, ChunkCoord::new(1, 1), 1, &obj).unwrap();
        let text = std::fs::read_to_string(&obj).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 81);

        let png = dir.join("chunk.png");
        run_preview(&cfg, PreviewMode::Color, ChunkCoord::new(0, 0), 0, &png).unwrap();
        assert!(std::fs::metadata(&png).unwrap().len() > 0);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
