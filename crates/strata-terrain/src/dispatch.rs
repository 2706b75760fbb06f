//! Parallel chunk building with a join barrier.
//!
//! A pass fans one task per chunk out to a pool of named worker threads fed
//! by a crossbeam channel, waits for every worker, and only then hands the
//! complete set of meshes back. Workers borrow the frozen density field and
//! never touch the registry or the host.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crossbeam_channel::unbounded;
use rustc_hash::FxHashMap;
use strata_config::GenerationConfig;
use strata_mesh::{ChunkDims, ColorGradient, MeshData, build_chunk_mesh};

use crate::density::DensityField;
use crate::error::GenerationError;
use crate::registry::ChunkCoord;

/// Shared flag that stops a pass before its remaining tasks start.
///
/// A chunk build already running is allowed to finish; its result is
/// discarded with the rest of the pass.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Visible to every clone.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Fixed-size pool of scoped worker threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerPool {
    threads: usize,
}

impl WorkerPool {
    /// Create a pool with `threads` workers (at least one).
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }

    /// Create a pool sized from the CPU count, leaving headroom for the
    /// calling thread and the host.
    pub fn with_defaults() -> Self {
        let cpus = num_cpus::get().max(2);
        Self::new((cpus - 2).max(1))
    }

    /// `0` means "pick from the CPU count".
    pub fn from_thread_setting(worker_threads: usize) -> Self {
        if worker_threads == 0 {
            Self::with_defaults()
        } else {
            Self::new(worker_threads)
        }
    }

    /// Number of workers a batch may use.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `f` over every input on the pool and return the outputs in input
    /// order.
    ///
    /// Blocks until every worker has exited. Fails as a whole if `cancel`
    /// was set, a worker could not be spawned, or a worker panicked.
    pub fn parallel_map<T, R, F>(
        &self,
        inputs: Vec<T>,
        f: F,
        cancel: &CancelToken,
    ) -> Result<Vec<R>, GenerationError>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let count = inputs.len();
        if count == 0 {
            return Ok(Vec::new());
        }

        let (task_sender, task_receiver) = unbounded::<(usize, T)>();
        for task in inputs.into_iter().enumerate() {
            if task_sender.send(task).is_err() {
                break;
            }
        }
        drop(task_sender);

        let (result_sender, result_receiver) = unbounded::<(usize, R)>();
        let f = &f;

        std::thread::scope(|scope| {
            let mut workers = Vec::with_capacity(self.threads.min(count));
            let mut spawn_error = None;

            for id in 0..self.threads.min(count) {
                let receiver = task_receiver.clone();
                let sender = result_sender.clone();

                let spawned = std::thread::Builder::new()
                    .name(format!("chunk-build-worker-{id}"))
                    .spawn_scoped(scope, move || {
                        while let Ok((index, input)) = receiver.recv() {
                            // Drain without building once cancelled.
                            if cancel.is_cancelled() {
                                continue;
                            }
                            if sender.send((index, f(input))).is_err() {
                                break;
                            }
                        }
                    });

                match spawned {
                    Ok(handle) => workers.push(handle),
                    Err(err) => {
                        spawn_error = Some(err);
                        break;
                    }
                }
            }

            let mut panicked = false;
            for worker in workers {
                panicked |= worker.join().is_err();
            }

            match spawn_error {
                Some(err) => Err(GenerationError::WorkerSpawn(err)),
                None if panicked => Err(GenerationError::WorkerPanicked),
                None => Ok(()),
            }
        })?;
        drop(result_sender);

        if cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }

        let mut slots: Vec<Option<R>> = (0..count).map(|_| None).collect();
        for (index, output) in result_receiver.try_iter() {
            slots[index] = Some(output);
        }
        slots
            .into_iter()
            .collect::<Option<Vec<R>>>()
            .ok_or(GenerationError::WorkerPanicked)
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Builds every chunk of a pass in parallel against one frozen field.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParallelDispatcher {
    pool: WorkerPool,
}

impl ParallelDispatcher {
    /// Create a dispatcher over `pool`.
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }

    /// Create a dispatcher with a CPU-sized pool.
    pub fn with_defaults() -> Self {
        Self::new(WorkerPool::with_defaults())
    }

    /// The pool used for chunk builds.
    pub fn pool(&self) -> WorkerPool {
        self.pool
    }

    /// Build the mesh of every coordinate in `layout`.
    ///
    /// The density field and its octave offsets are frozen once before any
    /// task starts. Either every requested chunk is returned or none is.
    /// Repeated coordinates are built once per occurrence and collapse to
    /// one entry.
    pub fn generate(
        &self,
        layout: &[ChunkCoord],
        config: &GenerationConfig,
        cancel: &CancelToken,
    ) -> Result<FxHashMap<ChunkCoord, MeshData>, GenerationError> {
        config.validate()?;
        let dims = ChunkDims::new(config.width, config.length, config.height)?;
        let field = DensityField::from_config(config);
        let gradient = ColorGradient::new(config.colors.low, config.colors.mid, config.colors.high);
        let iso_level = config.iso_level;
        let compact = config.compact_meshes;

        let built = self.pool.parallel_map(
            layout.to_vec(),
            |coord| {
                let start = Instant::now();
                let mesh = build_chunk_mesh(
                    &field,
                    coord.world_origin(dims),
                    dims,
                    iso_level,
                    &gradient,
                );
                let mesh = if compact { mesh.compacted() } else { mesh };

                tracing::debug!(
                    x = coord.x,
                    z = coord.z,
                    vertices = mesh.vertex_count(),
                    triangles = mesh.triangle_count(),
                    elapsed_us = start.elapsed().as_micros() as u64,
                    "built chunk mesh"
                );
                (coord, mesh)
            },
            cancel,
        )?;

        Ok(built.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::square_layout;
    use std::sync::atomic::AtomicUsize;

    fn small_config() -> GenerationConfig {
        GenerationConfig {
            width: 4,
            length: 4,
            height: 8,
            grid_size: 2,
            seed: 7,
            ..Default::default()
        }
    }

    #[test]
    fn test_parallel_map_preserves_input_order() {
        let pool = WorkerPool::new(4);
        let out = pool
            .parallel_map((0..100).collect(), |i: u32| i * 2, &CancelToken::new())
            .expect("map should succeed");
        assert_eq!(out, (0..100).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_parallel_map_empty_input() {
        let pool = WorkerPool::new(2);
        let out: Vec<u8> = pool
            .parallel_map(Vec::<u8>::new(), |x| x, &CancelToken::new())
            .expect("empty map should succeed");
        assert!(out.is_empty());
    }

    #[test]
    fn test_parallel_map_runs_every_task_once() {
        let calls = AtomicUsize::new(0);
        let pool = WorkerPool::new(3);
        pool.parallel_map(
            vec![(); 57],
            |_| {
                calls.fetch_add(1, Ordering::Relaxed);
            },
            &CancelToken::new(),
        )
        .expect("map should succeed");
        assert_eq!(calls.load(Ordering::Relaxed), 57);
    }

    #[test]
    fn test_parallel_map_uses_named_workers() {
        let pool = WorkerPool::new(2);
        let names = pool
            .parallel_map(
                vec![(); 4],
                |_| std::thread::current().name().map(str::to_owned),
                &CancelToken::new(),
            )
            .expect("map should succeed");
        for name in names {
            let name = name.expect("workers are named");
            assert!(name.starts_with("chunk-build-worker-"), "unexpected name {name}");
        }
    }

    #[test]
    fn test_parallel_map_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let calls = AtomicUsize::new(0);
        let result = WorkerPool::new(2).parallel_map(
            vec![(); 10],
            |_| {
                calls.fetch_add(1, Ordering::Relaxed);
            },
            &cancel,
        );
        assert!(matches!(result, Err(GenerationError::Cancelled)));
        assert_eq!(calls.load(Ordering::Relaxed), 0, "no task may start");
    }

    #[test]
    fn test_parallel_map_cancelled_mid_batch() {
        let cancel = CancelToken::new();
        let result = WorkerPool::new(1).parallel_map(
            (0..10).collect(),
            |i: u32| {
                if i == 2 {
                    cancel.cancel();
                }
                i
            },
            &cancel,
        );
        assert!(matches!(result, Err(GenerationError::Cancelled)));
    }

    #[test]
    fn test_parallel_map_reports_panicking_worker() {
        let result = WorkerPool::new(2).parallel_map(
            (0..8).collect(),
            |i: u32| {
                if i == 5 {
                    panic!("boom");
                }
                i
            },
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(GenerationError::WorkerPanicked)));
    }

    #[test]
    fn test_pool_thread_count_floor() {
        assert_eq!(WorkerPool::new(0).threads(), 1);
        assert!(WorkerPool::with_defaults().threads() >= 1);
        assert_eq!(WorkerPool::from_thread_setting(3).threads(), 3);
    }

    #[test]
    fn test_generate_returns_every_requested_chunk() {
        let config = small_config();
        let layout = square_layout(config.grid_size);
        let meshes = ParallelDispatcher::new(WorkerPool::new(2))
            .generate(&layout, &config, &CancelToken::new())
            .expect("pass should succeed");
        assert_eq!(meshes.len(), 4);
        for coord in &layout {
            assert!(meshes.contains_key(coord), "missing chunk {coord}");
        }
    }

    #[test]
    fn test_generate_rejects_invalid_config() {
        let config = GenerationConfig {
            octaves: 0,
            ..small_config()
        };
        let result = ParallelDispatcher::new(WorkerPool::new(1)).generate(
            &square_layout(1),
            &config,
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(GenerationError::Config(_))));
    }

    #[test]
    fn test_generate_compacts_when_requested() {
        let config = GenerationConfig {
            compact_meshes: true,
            ..small_config()
        };
        let meshes = ParallelDispatcher::new(WorkerPool::new(2))
            .generate(&square_layout(2), &config, &CancelToken::new())
            .expect("pass should succeed");
        for mesh in meshes.values() {
            assert_eq!(mesh.vertex_count(), mesh.referenced_vertex_count());
        }
    }
}
