//! Configuration structs with sensible defaults, validation, and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Terrain generation parameters consumed by each generation pass.
    pub generation: GenerationConfig,
    /// Worker pool and pass scheduling settings.
    pub runtime: RuntimeConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Vertical density falloff curve applied to the normalized height fraction.
///
/// Every variant is monotonic non-decreasing on `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Falloff {
    /// Density grows linearly with height.
    Linear,
    /// Density follows `sin(f * π/2)`: steep near the floor, flat near the top.
    #[default]
    QuarterSine,
}

/// Three-stop height gradient used for vertex colors (RGBA, linear `0.0..=1.0`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GradientConfig {
    /// Color at the bottom of the column.
    pub low: [f32; 4],
    /// Color at half height.
    pub mid: [f32; 4],
    /// Color at the top of the column.
    pub high: [f32; 4],
}

/// Parameters for one terrain generation pass.
///
/// A pass is fully determined by this value: two passes with equal
/// configurations produce identical meshes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Cubes per chunk along X.
    pub width: u32,
    /// Cubes per chunk along Z.
    pub length: u32,
    /// Cubes per chunk along Y (also the column height used by the falloff).
    pub height: u32,
    /// Density threshold separating solid (below) from air (above).
    pub iso_level: f32,
    /// Global horizontal noise phase along X.
    pub x_noise_offset: f32,
    /// Global horizontal noise phase along Z.
    pub z_noise_offset: f32,
    /// Horizontal noise frequency multiplier.
    pub scale: f32,
    /// Number of noise octaves.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f32,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f32,
    /// Seed for the per-pass octave offset generator and the noise permutation.
    pub seed: u64,
    /// Side length of the square chunk layout (`grid_size × grid_size` chunks).
    pub grid_size: u32,
    /// Vertical falloff curve.
    pub falloff: Falloff,
    /// Weight of the vertical falloff against horizontal noise, in `(0, 1]`.
    pub vertical_weight: f32,
    /// Vertex color gradient.
    pub colors: GradientConfig,
    /// Drop unreferenced vertex slots from each chunk mesh before it is applied.
    pub compact_meshes: bool,
}

/// Worker pool and scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads for chunk builds (0 = derive from CPU count).
    pub worker_threads: usize,
    /// Number of generation passes the demo runs.
    pub passes: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Also write JSON logs to the log directory.
    pub log_to_file: bool,
}

// --- Default implementations ---

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            low: [0.36, 0.25, 0.18, 1.0],
            mid: [0.30, 0.55, 0.24, 1.0],
            high: [0.95, 0.95, 0.97, 1.0],
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: 16,
            length: 16,
            height: 16,
            iso_level: 0.5,
            x_noise_offset: 0.0,
            z_noise_offset: 0.0,
            scale: 0.05,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            seed: 0,
            grid_size: 2,
            falloff: Falloff::default(),
            vertical_weight: 0.5,
            colors: GradientConfig::default(),
            compact_meshes: false,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            passes: 1,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

// --- Validation ---

impl GenerationConfig {
    /// Check every precondition a generation pass relies on.
    ///
    /// UI-side clamping is the host's business; this only rejects values the
    /// pipeline cannot give a meaningful result for.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("width", self.width),
            ("length", self.length),
            ("height", self.height),
            ("octaves", self.octaves),
            ("grid_size", self.grid_size),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be greater than zero"));
            }
        }

        for (field, value) in [
            ("iso_level", self.iso_level),
            ("x_noise_offset", self.x_noise_offset),
            ("z_noise_offset", self.z_noise_offset),
            ("scale", self.scale),
            ("lacunarity", self.lacunarity),
            ("persistence", self.persistence),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, format!("{value} is not finite")));
            }
        }

        if !(self.vertical_weight > 0.0 && self.vertical_weight <= 1.0) {
            return Err(ConfigError::invalid(
                "vertical_weight",
                format!("{} is outside (0, 1]", self.vertical_weight),
            ));
        }

        let colors = [self.colors.low, self.colors.mid, self.colors.high];
        if colors.iter().flatten().any(|c| !c.is_finite()) {
            return Err(ConfigError::invalid("colors", "color components must be finite"));
        }

        Ok(())
    }

    /// Total number of chunks in the layout.
    pub fn chunk_count(&self) -> usize {
        (self.grid_size as usize) * (self.grid_size as usize)
    }
}

impl Config {
    /// Validate the generation section and the runtime settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generation.validate()?;
        if self.runtime.passes == 0 {
            return Err(ConfigError::invalid("passes", "must be greater than zero"));
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Platform config directory for Strata (e.g. `~/.config/strata`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("strata"))
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
