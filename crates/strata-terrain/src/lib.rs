//! Procedural terrain generation: fractal density sampling, the chunk
//! registry, and parallel marching-cubes passes applied to a host scene.

mod density;
mod dispatch;
mod error;
mod generator;
mod host;
mod registry;

pub mod seed;

pub use density::{DensityField, DensityParams, falloff_curve};
pub use dispatch::{CancelToken, ParallelDispatcher, WorkerPool};
pub use error::GenerationError;
pub use generator::{PassReport, TerrainGenerator};
pub use host::{HeadlessHost, ObjectId};
pub use registry::{Chunk, ChunkCoord, ChunkHost, ChunkRegistry, RegistryStats, square_layout};
