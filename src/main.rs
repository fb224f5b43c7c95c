#![forbid(unsafe_code)]

mod preview;
mod sim;
mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loam_world::{ChunkCoord, TerrainConfig, load_config_from_path};

use crate::preview::{PreviewMode, parse_coord, run_preview};
use crate::sim::{StreamOptions, run_stream};

#[derive(Parser, Debug)]
#[command(name = "loam", version, about = "Procedural streaming terrain")]
struct Cli {
    /// Terrain config (TOML). Built-in defaults are used if the file is missing.
    #[arg(long, global = true, default_value = "assets/terrain.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one chunk to an image or mesh file.
    Preview {
        #[arg(long, value_enum, default_value_t = PreviewMode::Color)]
        mode: PreviewMode,
        #[arg(long, value_parser = parse_coord, default_value = "0,0", allow_hyphen_values = true)]
        coord: ChunkCoord,
        #[arg(long, default_value_t = 0)]
        lod: u8,
        #[arg(long)]
        out: PathBuf,
    },
    /// Move a viewer across streamed terrain and report chunk activity.
    Stream {
        #[arg(long, default_value_t = 600)]
        ticks: u32,
        /// World units travelled per tick.
        #[arg(long, default_value_t = 2.0)]
        speed: f32,
        /// Heading in degrees, 0 = +x.
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        heading: f32,
        /// Milliseconds to sleep between ticks.
        #[arg(long, default_value_t = 16)]
        tick_ms: u64,
        /// Reload the config file when it changes.
        #[arg(long)]
        watch: bool,
    },
    /// Print the effective config as TOML.
    Config,
}

fn load_config(path: &Path) -> Result<TerrainConfig> {
    if !path.exists() {
        log::info!("{} not found; using built-in terrain defaults", path.display());
        let cfg = TerrainConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let cfg = load_config_from_path(path)
        .with_context(|| format!("loading terrain config {}", path.display()))?;
    log::info!("loaded terrain config {}", path.display());
    Ok(cfg)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.command {
        Command::Preview {
            mode,
            coord,
            lod,
            out,
        } => run_preview(&cfg, mode, coord, lod, &out),
        Command::Stream {
            ticks,
            speed,
            heading,
            tick_ms,
            watch,
        } => {
            let opts = StreamOptions {
                ticks,
                speed,
                heading_deg: heading,
                tick_ms,
                watch,
            };
            run_stream(cfg, &cli.config, &opts).map(|_| ())
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&cfg)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_preview() {
        let cli = Cli::try_parse_from([
            "loam", "preview", "--mode", "mesh", "--coord", "-1,2", "--lod", "2", "--out", "x.obj",
        ])
        .unwrap();
        match cli.command {
            Command::Preview { mode, coord, lod, .. } => {
                assert_eq!(mode, PreviewMode::Mesh);
                assert_eq!(coord, ChunkCoord::new(-1, 2));
                assert_eq!(lod, 2);
            }
            _ => panic!("expected preview"),
        }
        assert_eq!(cli.config, PathBuf::from("assets/terrain.toml"));
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let cfg = load_config(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(cfg, TerrainConfig::default());
    }

    #[test]
    fn shipped_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/terrain.toml");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.chunks.size, 129);
    }

    #[test]
    fn effective_config_round_trips_through_toml() {
        let cfg = TerrainConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: TerrainConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
