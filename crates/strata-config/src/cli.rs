//! Command-line argument parsing for Strata.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Strata command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Marching-cubes terrain generator")]
pub struct CliArgs {
    /// Seed for octave offsets and noise permutation.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Chunks per side of the square layout.
    #[arg(long)]
    pub grid_size: Option<u32>,

    /// Cubes per chunk along X.
    #[arg(long)]
    pub width: Option<u32>,

    /// Cubes per chunk along Z.
    #[arg(long)]
    pub length: Option<u32>,

    /// Cubes per chunk along Y.
    #[arg(long)]
    pub height: Option<u32>,

    /// Number of noise octaves.
    #[arg(long)]
    pub octaves: Option<u32>,

    /// Density threshold of the surface.
    #[arg(long)]
    pub iso_level: Option<f32>,

    /// Horizontal noise frequency.
    #[arg(long)]
    pub scale: Option<f32>,

    /// Per-octave amplitude multiplier.
    #[arg(long)]
    pub persistence: Option<f32>,

    /// Per-octave frequency multiplier.
    #[arg(long)]
    pub lacunarity: Option<f32>,

    /// Worker threads (0 = auto).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Number of generation passes to run.
    #[arg(long)]
    pub passes: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        let generation = &mut self.generation;
        if let Some(seed) = args.seed {
            generation.seed = seed;
        }
        if let Some(n) = args.grid_size {
            generation.grid_size = n;
        }
        if let Some(w) = args.width {
            generation.width = w;
        }
        if let Some(l) = args.length {
            generation.length = l;
        }
        if let Some(h) = args.height {
            generation.height = h;
        }
        if let Some(octaves) = args.octaves {
            generation.octaves = octaves;
        }
        if let Some(iso) = args.iso_level {
            generation.iso_level = iso;
        }
        if let Some(scale) = args.scale {
            generation.scale = scale;
        }
        if let Some(p) = args.persistence {
            generation.persistence = p;
        }
        if let Some(l) = args.lacunarity {
            generation.lacunarity = l;
        }
        if let Some(threads) = args.threads {
            self.runtime.worker_threads = threads;
        }
        if let Some(passes) = args.passes {
            self.runtime.passes = passes;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
