//! Configuration system for Strata.
//!
//! Provides the generation parameters consumed by each terrain pass plus
//! runtime and debug settings. Settings persist to disk as RON files, support
//! CLI overrides via clap, hot-reload detection, and forward/backward
//! compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, Falloff, GenerationConfig, GradientConfig, RuntimeConfig,
};
pub use error::ConfigError;
