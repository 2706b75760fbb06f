//! Central owner for all generated chunks, keyed by [`ChunkCoord`].
//!
//! The [`ChunkRegistry`] maps grid coordinates to [`Chunk`] records using an
//! [`FxHashMap`](rustc_hash::FxHashMap) for fast hashing of small fixed-size
//! keys. Scene objects belong to the host; the registry only holds their
//! handles and asks the host whether they are still alive.

use std::collections::hash_map::Entry;
use std::fmt::Debug;
use std::sync::Arc;

use glam::Vec3;
use rustc_hash::FxHashMap;
use strata_mesh::{ChunkDims, MeshData};

/// The scene side of chunk generation.
///
/// A host owns one drawable object per chunk and hands out opaque handles to
/// it. The registry calls these methods only from the thread that invoked
/// the generation pass.
pub trait ChunkHost {
    /// Opaque reference to a host-side chunk object.
    type Handle: Clone + Debug;

    /// Create (or look up) the scene object with the given name.
    fn acquire_chunk_handle(&mut self, name: &str) -> Self::Handle;

    /// `false` once the host has destroyed the object behind `handle`.
    fn is_alive(&self, handle: &Self::Handle) -> bool;

    /// Replace the geometry shown by `handle`.
    fn apply_mesh(&mut self, handle: &Self::Handle, mesh: &MeshData);

    /// Show or hide the object.
    fn set_active(&mut self, handle: &Self::Handle, active: bool);
}

/// Identifies a chunk's position on the horizontal chunk grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// Grid X coordinate.
    pub x: i32,
    /// Grid Z coordinate.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// World position of the chunk's minimum corner.
    pub fn world_origin(self, dims: ChunkDims) -> Vec3 {
        Vec3::new(
            self.x as f32 * dims.width() as f32,
            0.0,
            self.z as f32 * dims.length() as f32,
        )
    }

    /// Name of the host object for this chunk.
    pub fn object_name(self) -> String {
        format!("chunk_{}_{}", self.x, self.z)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// `N × N` grid of coordinates starting at the origin, row by row along X.
pub fn square_layout(grid_size: u32) -> Vec<ChunkCoord> {
    let n = grid_size as i32;
    (0..n)
        .flat_map(|z| (0..n).map(move |x| ChunkCoord::new(x, z)))
        .collect()
}

/// Registry record for one chunk.
#[derive(Debug)]
pub struct Chunk<H> {
    coord: ChunkCoord,
    handle: H,
    mesh: Arc<MeshData>,
    active: bool,
    built_in_pass: u64,
}

impl<H> Chunk<H> {
    fn new(coord: ChunkCoord, handle: H) -> Self {
        Self {
            coord,
            handle,
            mesh: Arc::new(MeshData::empty()),
            active: false,
            built_in_pass: 0,
        }
    }

    /// Grid coordinate.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Host handle for the chunk's scene object.
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Mesh from the last pass that built this chunk.
    pub fn mesh(&self) -> &Arc<MeshData> {
        &self.mesh
    }

    /// Whether the chunk is shown on the host.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Pass number that last wrote a mesh here (0 = never).
    pub fn built_in_pass(&self) -> u64 {
        self.built_in_pass
    }
}

/// Handle acquisition counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Chunks created on first reference.
    pub created: usize,
    /// Handles re-acquired because the host destroyed the previous one.
    pub reacquired: usize,
}

/// Owns every chunk record and provides fast access by [`ChunkCoord`].
///
/// Mutated only by the thread that joins a generation pass, never by chunk
/// build workers.
pub struct ChunkRegistry<H> {
    chunks: FxHashMap<ChunkCoord, Chunk<H>>,
    stats: RegistryStats,
}

impl<H: Clone + Debug> ChunkRegistry<H> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            chunks: FxHashMap::default(),
            stats: RegistryStats::default(),
        }
    }

    /// Returns the chunk at `coord`, creating or re-acquiring its host object
    /// when needed.
    pub fn ensure<C>(&mut self, coord: ChunkCoord, host: &mut C) -> &mut Chunk<H>
    where
        C: ChunkHost<Handle = H>,
    {
        match self.chunks.entry(coord) {
            Entry::Occupied(entry) => {
                let chunk = entry.into_mut();
                if !host.is_alive(&chunk.handle) {
                    tracing::warn!(
                        x = coord.x,
                        z = coord.z,
                        "chunk object was destroyed by the host, re-acquiring"
                    );
                    chunk.handle = host.acquire_chunk_handle(&coord.object_name());
                    chunk.active = false;
                    self.stats.reacquired += 1;
                }
                chunk
            }
            Entry::Vacant(entry) => {
                let handle = host.acquire_chunk_handle(&coord.object_name());
                self.stats.created += 1;
                entry.insert(Chunk::new(coord, handle))
            }
        }
    }

    /// Store `mesh` as the chunk's geometry, push it to the host and activate
    /// the chunk.
    pub fn apply<C>(&mut self, coord: ChunkCoord, mesh: MeshData, pass: u64, host: &mut C)
    where
        C: ChunkHost<Handle = H>,
    {
        let chunk = self.ensure(coord, host);
        chunk.mesh = Arc::new(mesh);
        chunk.built_in_pass = pass;
        host.apply_mesh(&chunk.handle, &chunk.mesh);
        host.set_active(&chunk.handle, true);
        chunk.active = true;
    }

    /// Deactivate every active chunk. Records and host objects are kept.
    pub fn invalidate_all<C>(&mut self, host: &mut C)
    where
        C: ChunkHost<Handle = H>,
    {
        for chunk in self.chunks.values_mut().filter(|c| c.active) {
            if host.is_alive(&chunk.handle) {
                host.set_active(&chunk.handle, false);
            }
            chunk.active = false;
        }
    }

    /// Immutable access to a chunk.
    pub fn get(&self, coord: &ChunkCoord) -> Option<&Chunk<H>> {
        self.chunks.get(coord)
    }

    /// Removes and returns the chunk record at `coord`.
    ///
    /// The host object is left alone; destroying it is the host's business.
    pub fn remove(&mut self, coord: &ChunkCoord) -> Option<Chunk<H>> {
        self.chunks.remove(coord)
    }

    /// Number of chunk records.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// `true` when no chunk has been created yet.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of chunks currently shown on the host.
    pub fn active_count(&self) -> usize {
        self.chunks.values().filter(|c| c.active).count()
    }

    /// Iterates over all chunk coordinates.
    pub fn coords(&self) -> impl Iterator<Item = &ChunkCoord> {
        self.chunks.keys()
    }

    /// Iterates over all `(coord, chunk)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&ChunkCoord, &Chunk<H>)> {
        self.chunks.iter()
    }

    /// Creation and reacquisition counters since the registry was built.
    pub fn stats(&self) -> RegistryStats {
        self.stats
    }
}

impl<H: Clone + Debug> Default for ChunkRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HeadlessHost;
    use glam::Vec3;

    fn mesh() -> MeshData {
        MeshData {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            colors: vec![[1.0; 4]; 3],
            triangles: vec![0, 2, 1],
        }
    }

    #[test]
    fn test_ensure_creates_named_object_once() {
        let mut host = HeadlessHost::new();
        let mut registry = ChunkRegistry::new();
        let c = ChunkCoord::new(2, -1);

        let first = registry.ensure(c, &mut host).handle().clone();
        let second = registry.ensure(c, &mut host).handle().clone();

        assert_eq!(first, second, "live handle must be reused");
        assert_eq!(host.name(&first), Some("chunk_2_-1"));
        assert_eq!(host.acquisitions(), 1);
        assert_eq!(
            registry.stats(),
            RegistryStats {
                created: 1,
                reacquired: 0
            }
        );
    }

    #[test]
    fn test_ensure_reacquires_destroyed_handle() {
        let mut host = HeadlessHost::new();
        let mut registry = ChunkRegistry::new();
        let c = ChunkCoord::new(0, 0);

        let old = registry.ensure(c, &mut host).handle().clone();
        host.destroy(&old);
        let new = registry.ensure(c, &mut host).handle().clone();

        assert_ne!(old, new);
        assert!(host.is_alive(&new));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.stats().reacquired, 1);
    }

    #[test]
    fn test_apply_stores_mesh_and_activates() {
        let mut host = HeadlessHost::new();
        let mut registry = ChunkRegistry::new();
        let c = ChunkCoord::new(1, 1);

        registry.apply(c, mesh(), 3, &mut host);

        let chunk = registry.get(&c).expect("chunk was just applied");
        assert!(chunk.is_active());
        assert_eq!(chunk.built_in_pass(), 3);
        assert_eq!(chunk.mesh().triangle_count(), 1);
        assert!(host.is_active(chunk.handle()));
        assert_eq!(host.triangle_count(chunk.handle()), Some(1));
    }

    #[test]
    fn test_invalidate_all_deactivates_without_deleting() {
        let mut host = HeadlessHost::new();
        let mut registry = ChunkRegistry::new();
        for coord in square_layout(2) {
            registry.apply(coord, mesh(), 1, &mut host);
        }
        assert_eq!(registry.active_count(), 4);

        registry.invalidate_all(&mut host);

        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.len(), 4);
        assert_eq!(host.active_count(), 0);
        assert_eq!(host.live_count(), 4);
    }

    #[test]
    fn test_remove_drops_record() {
        let mut host = HeadlessHost::new();
        let mut registry = ChunkRegistry::new();
        let c = ChunkCoord::new(5, 5);
        registry.ensure(c, &mut host);

        assert!(registry.remove(&c).is_some());
        assert!(registry.get(&c).is_none());
        assert!(registry.is_empty());
        assert!(registry.remove(&c).is_none());
    }

    #[test]
    fn test_square_layout_order() {
        let layout = square_layout(2);
        assert_eq!(
            layout,
            vec![
                ChunkCoord::new(0, 0),
                ChunkCoord::new(1, 0),
                ChunkCoord::new(0, 1),
                ChunkCoord::new(1, 1),
            ]
        );
        assert!(square_layout(0).is_empty());
    }

    #[test]
    fn test_world_origin_scales_by_dims() {
        let dims = ChunkDims::new(16, 8, 32).expect("non-zero dims");
        assert_eq!(
            ChunkCoord::new(2, -3).world_origin(dims),
            Vec3::new(32.0, 0.0, -24.0)
        );
    }
}
