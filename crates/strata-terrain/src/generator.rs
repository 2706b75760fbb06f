//! Host-invoked terrain generation passes.
//!
//! [`TerrainGenerator::generate`] is the only entry point: it builds every
//! chunk of the `N × N` layout in parallel, waits at the join barrier, and
//! then applies the results to the registry and host on the calling thread.
//! A pass that fails or is cancelled leaves the scene exactly as it was.

use std::time::{Duration, Instant};

use strata_config::GenerationConfig;

use crate::dispatch::{CancelToken, ParallelDispatcher};
use crate::error::GenerationError;
use crate::registry::{ChunkHost, ChunkRegistry, square_layout};
use crate::seed::hash_meshes;

/// Summary of one applied generation pass.
#[derive(Clone, Debug, PartialEq)]
pub struct PassReport {
    /// 1-based pass number.
    pub pass: u64,
    /// Chunks written this pass.
    pub chunks: usize,
    /// Chunks with no geometry.
    pub empty_chunks: usize,
    /// Host objects created for the first time.
    pub created: usize,
    /// Host objects re-acquired after the host destroyed them.
    pub reacquired: usize,
    /// Vertex slots across all chunk meshes.
    pub vertices: usize,
    /// Triangles across all chunk meshes.
    pub triangles: usize,
    /// Wall time from dispatch to the last host update.
    pub elapsed: Duration,
}

/// Owns the chunk registry and drives passes against a host.
pub struct TerrainGenerator<H: ChunkHost> {
    host: H,
    registry: ChunkRegistry<H::Handle>,
    dispatcher: ParallelDispatcher,
    passes: u64,
}

impl<H: ChunkHost> TerrainGenerator<H> {
    /// Create a generator over `host`.
    pub fn new(host: H, dispatcher: ParallelDispatcher) -> Self {
        Self {
            host,
            registry: ChunkRegistry::new(),
            dispatcher,
            passes: 0,
        }
    }

    /// Run one full pass with no cancellation.
    pub fn generate(&mut self, config: &GenerationConfig) -> Result<PassReport, GenerationError> {
        self.generate_with_cancel(config, &CancelToken::new())
    }

    /// Run one full pass, stopping early if `cancel` is set.
    ///
    /// Registry and host are touched only after every chunk build has joined
    /// successfully, so an error return means nothing was applied.
    pub fn generate_with_cancel(
        &mut self,
        config: &GenerationConfig,
        cancel: &CancelToken,
    ) -> Result<PassReport, GenerationError> {
        let start = Instant::now();
        config.validate()?;
        let layout = square_layout(config.grid_size);

        let mut meshes = match self.dispatcher.generate(&layout, config, cancel) {
            Ok(meshes) => meshes,
            Err(GenerationError::Cancelled) => {
                tracing::warn!(
                    chunks = layout.len(),
                    "generation pass cancelled, previous terrain kept"
                );
                return Err(GenerationError::Cancelled);
            }
            Err(err) => return Err(err),
        };

        self.passes += 1;
        let pass = self.passes;
        let before = self.registry.stats();
        self.registry.invalidate_all(&mut self.host);

        let mut report = PassReport {
            pass,
            chunks: 0,
            empty_chunks: 0,
            created: 0,
            reacquired: 0,
            vertices: 0,
            triangles: 0,
            elapsed: Duration::ZERO,
        };

        for coord in layout {
            let Some(mesh) = meshes.remove(&coord) else {
                continue;
            };
            report.chunks += 1;
            report.vertices += mesh.vertex_count();
            report.triangles += mesh.triangle_count();
            if mesh.is_empty() {
                report.empty_chunks += 1;
            }
            self.registry.apply(coord, mesh, pass, &mut self.host);
        }

        let after = self.registry.stats();
        report.created = after.created - before.created;
        report.reacquired = after.reacquired - before.reacquired;
        report.elapsed = start.elapsed();

        tracing::info!(
            pass,
            chunks = report.chunks,
            empty = report.empty_chunks,
            created = report.created,
            reacquired = report.reacquired,
            vertices = report.vertices,
            triangles = report.triangles,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "terrain pass applied"
        );

        Ok(report)
    }

    /// Content hash of every active chunk's mesh.
    pub fn fingerprint(&self) -> u64 {
        hash_meshes(
            self.registry
                .iter()
                .filter(|(_, chunk)| chunk.is_active())
                .map(|(coord, chunk)| (*coord, chunk.mesh().as_ref())),
        )
    }

    /// Number of passes applied so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// The chunk registry.
    pub fn registry(&self) -> &ChunkRegistry<H::Handle> {
        &self.registry
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host, e.g. to destroy objects between passes.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consume the generator and return the host.
    pub fn into_host(self) -> H {
        self.host
    }
}

#[cfg(test)]
#[path = "generator_tests.rs"]
mod tests;
