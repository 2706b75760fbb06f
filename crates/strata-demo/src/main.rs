//! Headless terrain generation demo.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p strata-demo -- --seed 7 --grid-size 4` to build a
//! 4 × 4 chunk layout and print per-pass statistics.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use strata_config::{CliArgs, Config};
use strata_terrain::{HeadlessHost, ParallelDispatcher, TerrainGenerator, WorkerPool};
use tracing::{error, info};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(Config::default_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config.debug.log_to_file.then(|| config_dir.join("logs"));
    strata_log::init_logging(log_dir.as_deref(), cfg!(debug_assertions), Some(&config));

    if let Err(e) = config.validate() {
        error!("invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    let pool = WorkerPool::from_thread_setting(config.runtime.worker_threads);
    info!(
        threads = pool.threads(),
        grid = config.generation.grid_size,
        seed = config.generation.seed,
        "starting terrain generation"
    );

    let mut generator = TerrainGenerator::new(HeadlessHost::new(), ParallelDispatcher::new(pool));

    for _ in 0..config.runtime.passes {
        match generator.generate(&config.generation) {
            Ok(report) => info!(
                pass = report.pass,
                chunks = report.chunks,
                triangles = report.triangles,
                elapsed_ms = report.elapsed.as_millis() as u64,
                fingerprint = generator.fingerprint(),
                "pass complete"
            ),
            Err(e) => {
                error!("generation failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let host = generator.host();
    info!(
        objects = host.live_count(),
        active = host.active_count(),
        upload_bytes = host.buffer_bytes(),
        "host scene ready"
    );

    ExitCode::SUCCESS
}
