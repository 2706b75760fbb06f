//! In-memory [`ChunkHost`] with no scene behind it.
//!
//! Keeps one record per acquired handle, packs every applied mesh into the
//! interleaved upload layout, and lets callers destroy objects to exercise
//! handle reacquisition. Used by the demo binary and by tests.

use rustc_hash::FxHashMap;
use strata_mesh::{MeshData, PackedMesh};

use crate::registry::ChunkHost;

/// Handle to an object owned by a [`HeadlessHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(u64);

#[derive(Debug)]
struct HostObject {
    name: String,
    active: bool,
    mesh: PackedMesh,
    uploads: usize,
}

/// Scene-less host that records what a real one would display.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    objects: FxHashMap<ObjectId, HostObject>,
    next_id: u64,
    acquisitions: usize,
}

impl HeadlessHost {
    /// Creates a host with no objects.
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroy the object behind `handle`, as an editor or scene reload would.
    pub fn destroy(&mut self, handle: &ObjectId) -> bool {
        self.objects.remove(handle).is_some()
    }

    /// Total handles ever handed out.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions
    }

    /// Number of objects not destroyed.
    pub fn live_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of live objects currently shown.
    pub fn active_count(&self) -> usize {
        self.objects.values().filter(|o| o.active).count()
    }

    /// Object name, if still alive.
    pub fn name(&self, handle: &ObjectId) -> Option<&str> {
        self.objects.get(handle).map(|o| o.name.as_str())
    }

    /// Whether the object exists and is shown.
    pub fn is_active(&self, handle: &ObjectId) -> bool {
        self.objects.get(handle).is_some_and(|o| o.active)
    }

    /// Triangles in the last mesh applied to the object.
    pub fn triangle_count(&self, handle: &ObjectId) -> Option<usize> {
        self.objects.get(handle).map(|o| o.mesh.triangle_count())
    }

    /// Packed buffers of the last mesh applied to the object.
    pub fn packed_mesh(&self, handle: &ObjectId) -> Option<&PackedMesh> {
        self.objects.get(handle).map(|o| &o.mesh)
    }

    /// How many meshes were applied to the object.
    pub fn uploads(&self, handle: &ObjectId) -> usize {
        self.objects.get(handle).map_or(0, |o| o.uploads)
    }

    /// Bytes a GPU upload of every live object would transfer.
    pub fn buffer_bytes(&self) -> usize {
        self.objects
            .values()
            .map(|o| o.mesh.vertex_buffer_bytes() + o.mesh.index_buffer_bytes())
            .sum()
    }
}

impl ChunkHost for HeadlessHost {
    type Handle = ObjectId;

    fn acquire_chunk_handle(&mut self, name: &str) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.acquisitions += 1;
        self.objects.insert(
            id,
            HostObject {
                name: name.to_owned(),
                active: false,
                mesh: PackedMesh::default(),
                uploads: 0,
            },
        );
        id
    }

    fn is_alive(&self, handle: &ObjectId) -> bool {
        self.objects.contains_key(handle)
    }

    fn apply_mesh(&mut self, handle: &ObjectId, mesh: &MeshData) {
        if let Some(object) = self.objects.get_mut(handle) {
            object.mesh = PackedMesh::from_mesh(mesh);
            object.uploads += 1;
        }
    }

    fn set_active(&mut self, handle: &ObjectId, active: bool) {
        if let Some(object) = self.objects.get_mut(handle) {
            object.active = active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_handles_are_unique() {
        let mut host = HeadlessHost::new();
        let a = host.acquire_chunk_handle("a");
        let b = host.acquire_chunk_handle("a");
        assert_ne!(a, b);
        assert_eq!(host.live_count(), 2);
    }

    #[test]
    fn test_destroyed_handle_is_dead() {
        let mut host = HeadlessHost::new();
        let a = host.acquire_chunk_handle("a");
        assert!(host.destroy(&a));
        assert!(!host.is_alive(&a));
        assert!(!host.destroy(&a));
        host.set_active(&a, true);
        assert_eq!(host.active_count(), 0);
    }

    #[test]
    fn test_apply_mesh_packs_buffers() {
        let mut host = HeadlessHost::new();
        let a = host.acquire_chunk_handle("a");
        let mesh = MeshData {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            colors: vec![[0.5; 4]; 3],
            triangles: vec![0, 2, 1],
        };
        host.apply_mesh(&a, &mesh);

        assert_eq!(host.uploads(&a), 1);
        assert_eq!(host.triangle_count(&a), Some(1));
        assert_eq!(host.buffer_bytes(), 3 * 28 + 3 * 4);
    }
}
