//! Marching-cubes meshing: lookup tables, cube evaluation, chunk mesh assembly,
//! and mesh data structures.

pub mod builder;
pub mod cube;
pub mod error;
pub mod mesh_data;
pub mod packed;
pub mod tables;

pub use builder::{ChunkDims, MAX_CHUNK_CUBES, build_chunk_mesh};
pub use cube::{
    CubeCorner, CubeEvaluation, DensitySource, INTERPOLATION_EPSILON, evaluate, interpolate_edge,
};
pub use error::MeshError;
pub use mesh_data::{ColorGradient, MeshData, Rgba};
pub use packed::{PackedMesh, TerrainVertex};
pub use tables::{CORNER_OFFSETS, EDGE_CORNERS, edge_mask, is_trivial, triangles};
