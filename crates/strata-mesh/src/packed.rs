//! Interleaved vertex layout for handing chunk meshes to a GPU host.
//!
//! [`TerrainVertex`] is a 28-byte `Pod` vertex, so a [`PackedMesh`] can be
//! uploaded as raw bytes without a copy.

use crate::mesh_data::MeshData;

/// A single interleaved vertex.
///
/// Layout (28 bytes total):
///   - `[0..12]`  position `[f32; 3]`
///   - `[12..28]` color `[f32; 4]` (linear RGBA)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TerrainVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Vertex color.
    pub color: [f32; 4],
}

static_assertions::assert_eq_size!(TerrainVertex, [u8; 28]);

/// A chunk mesh with interleaved vertices and a `u32` index buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackedMesh {
    /// Interleaved vertex buffer.
    pub vertices: Vec<TerrainVertex>,
    /// Index buffer (triangles, 3 indices per triangle).
    pub indices: Vec<u32>,
}

impl PackedMesh {
    /// Interleave a [`MeshData`], keeping its indices unchanged.
    pub fn from_mesh(mesh: &MeshData) -> Self {
        let vertices = mesh
            .vertices
            .iter()
            .zip(&mesh.colors)
            .map(|(position, &color)| TerrainVertex {
                position: position.to_array(),
                color,
            })
            .collect();
        Self {
            vertices,
            indices: mesh.triangles.clone(),
        }
    }

    /// Returns `true` if the mesh contains no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns the size of the vertex buffer in bytes.
    pub fn vertex_buffer_bytes(&self) -> usize {
        self.vertices.len() * std::mem::size_of::<TerrainVertex>()
    }

    /// Returns the size of the index buffer in bytes.
    pub fn index_buffer_bytes(&self) -> usize {
        self.indices.len() * std::mem::size_of::<u32>()
    }

    /// Returns the vertex data as a byte slice for GPU upload (zero-copy).
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Returns the index data as a byte slice for GPU upload (zero-copy).
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

impl From<&MeshData> for PackedMesh {
    fn from(mesh: &MeshData) -> Self {
        Self::from_mesh(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn triangle() -> MeshData {
        MeshData {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            colors: vec![[1.0, 0.0, 0.0, 1.0]; 3],
            triangles: vec![0, 2, 1],
        }
    }

    #[test]
    fn test_vertex_size_is_28_bytes() {
        assert_eq!(std::mem::size_of::<TerrainVertex>(), 28);
    }

    #[test]
    fn test_from_mesh_interleaves() {
        let packed = PackedMesh::from_mesh(&triangle());
        assert_eq!(packed.vertices.len(), 3);
        assert_eq!(packed.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(packed.vertices[2].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(packed.indices, vec![0, 2, 1]);
        assert_eq!(packed.triangle_count(), 1);
    }

    #[test]
    fn test_empty_mesh_stats() {
        let packed = PackedMesh::from(&MeshData::empty());
        assert!(packed.is_empty());
        assert_eq!(packed.triangle_count(), 0);
        assert_eq!(packed.vertex_buffer_bytes(), 0);
        assert_eq!(packed.index_buffer_bytes(), 0);
    }

    #[test]
    fn test_vertex_bytes_zero_copy() {
        let packed = PackedMesh::from_mesh(&triangle());
        assert_eq!(packed.vertex_bytes().len(), 3 * 28);
        assert_eq!(packed.index_bytes().len(), 3 * 4);
        assert_eq!(packed.vertex_bytes().len(), packed.vertex_buffer_bytes());
    }

    #[test]
    fn test_vertex_is_pod() {
        let v = TerrainVertex {
            position: [1.0, 2.0, 3.0],
            color: [0.1, 0.2, 0.3, 1.0],
        };
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 28);
        let back: &TerrainVertex = bytemuck::from_bytes(bytes);
        assert_eq!(*back, v);
    }
}
