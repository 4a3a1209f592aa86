//! lumen - render a JSON scene file to an image.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use lumen_core::{RenderConfig, SceneDesc};
use lumen_renderer::{render, Camera, Pathtracer, Scene};

#[derive(Parser, Debug)]
#[command(name = "lumen", version, about = "Monte Carlo path tracer")]
struct Cli {
    /// Scene description (JSON)
    scene: PathBuf,

    /// Output image; .hdr and .exr keep linear radiance
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    /// Samples per pixel
    #[arg(long)]
    spp: Option<u32>,

    /// Maximum bounce depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Image width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (0 = all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG refines it
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

impl Cli {
    /// Command line values take precedence over the scene's render block.
    fn apply_overrides(&self, config: &mut RenderConfig) {
        if let Some(spp) = self.spp {
            config.samples_per_pixel = spp;
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
    }
}

fn init_logger(level: LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    let mut desc = SceneDesc::load(&cli.scene)
        .with_context(|| format!("Failed to load scene {}", cli.scene.display()))?;
    cli.apply_overrides(&mut desc.render);
    desc.render
        .validate()
        .context("Invalid render settings after command line overrides")?;

    let scene = Scene::from_desc(&desc)
        .with_context(|| format!("Failed to build scene {}", cli.scene.display()))?;
    let camera = Camera::from_desc(&desc.camera, desc.render.aspect_ratio());
    let tracer = Pathtracer::new(scene, camera, desc.render.clone());

    let image = render(&tracer);

    image
        .save(&cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    log::info!("Wrote {}", cli.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from(["lumen", "scene.json", "--spp", "64", "--width", "32"]);
        let mut config = RenderConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.samples_per_pixel, 64);
        assert_eq!(config.width, 32);
        assert_eq!(config.height, RenderConfig::default().height);
        assert_eq!(cli.output, PathBuf::from("render.png"));
        assert_eq!(cli.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_log_level_parses() {
        let cli = Cli::parse_from(["lumen", "s.json", "-o", "out.hdr", "--log-level", "debug"]);
        assert_eq!(cli.log_level, LevelFilter::Debug);
        assert_eq!(cli.output, PathBuf::from("out.hdr"));
    }
}
