//! Generation pass error types.

use strata_config::ConfigError;
use strata_mesh::MeshError;

/// Errors that abort a generation pass. A failed pass applies nothing.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The generation config failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Chunk build inputs were rejected.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// The pass was cancelled before every chunk finished building.
    #[error("generation pass cancelled")]
    Cancelled,

    /// The OS refused to start a worker thread.
    #[error("failed to spawn chunk build worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// A worker panicked while building a chunk.
    #[error("chunk build worker panicked")]
    WorkerPanicked,
}
