//! Chunk mesh assembly: runs the cube evaluator over a chunk's cube grid.
//!
//! Every cube owns a fixed 12-slot region of the vertex buffer, one slot per
//! edge, so a triangle corner on local slot `s` of cube `c` is always vertex
//! `c * 12 + s`. Slots no triangle references are left zeroed.

use glam::{UVec3, Vec3};

use crate::cube::{DensitySource, evaluate};
use crate::error::MeshError;
use crate::mesh_data::{ColorGradient, MeshData};
use crate::tables::EDGE_COUNT;

/// Largest cube count whose 12-slot vertex regions fit a `u32` index.
pub const MAX_CHUNK_CUBES: u64 = (u32::MAX as u64 + 1) / EDGE_COUNT as u64;

/// Number of cubes along each axis of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkDims {
    width: u32,
    length: u32,
    height: u32,
}

impl ChunkDims {
    /// Creates chunk dimensions, rejecting zero-sized axes and chunks too
    /// large to index with `u32`.
    pub fn new(width: u32, length: u32, height: u32) -> Result<Self, MeshError> {
        for (axis, value) in [("width", width), ("length", length), ("height", height)] {
            if value == 0 {
                return Err(MeshError::ZeroDimension { axis });
            }
        }
        let cubes = width as u64 * length as u64 * height as u64;
        if cubes > MAX_CHUNK_CUBES {
            return Err(MeshError::TooManyCubes {
                cubes,
                max: MAX_CHUNK_CUBES,
            });
        }
        Ok(Self {
            width,
            length,
            height,
        })
    }

    /// Cubes along X.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Cubes along Z.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Cubes along Y.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total cubes in the chunk.
    pub fn cube_count(&self) -> usize {
        self.width as usize * self.length as usize * self.height as usize
    }

    /// Linear cube index with X innermost, then Z, then Y.
    #[inline]
    pub fn linear_index(&self, x: u32, y: u32, z: u32) -> usize {
        x as usize
            + z as usize * self.width as usize
            + y as usize * self.width as usize * self.length as usize
    }

    /// Local cube coordinates in build order.
    pub fn iter(&self) -> impl Iterator<Item = UVec3> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.length).flat_map(move |z| (0..self.width).map(move |x| UVec3::new(x, y, z)))
        })
    }
}

/// Build the marching-cubes mesh for one chunk.
///
/// `origin` is the world position of the chunk's minimum corner. The function
/// reads `source` and nothing else, so builds of different chunks may run
/// concurrently against one shared source.
pub fn build_chunk_mesh(
    source: &impl DensitySource,
    origin: Vec3,
    dims: ChunkDims,
    iso_level: f32,
    gradient: &ColorGradient,
) -> MeshData {
    let mut mesh = MeshData::empty();
    let column_height = dims.height() as f32;

    for local in dims.iter() {
        let eval = evaluate(source, origin + local.as_vec3(), iso_level);
        if eval.is_empty() {
            continue;
        }

        let base = dims.linear_index(local.x, local.y, local.z) * EDGE_COUNT;
        if mesh.vertices.len() < base + EDGE_COUNT {
            mesh.vertices.resize(base + EDGE_COUNT, Vec3::ZERO);
            mesh.colors.resize(base + EDGE_COUNT, [0.0; 4]);
        }

        let mask = eval.edge_mask();
        for (slot, &vertex) in eval.edge_vertices.iter().enumerate() {
            if mask & (1 << slot) != 0 {
                mesh.vertices[base + slot] = vertex;
                mesh.colors[base + slot] = gradient.color_at_height(vertex.y, column_height);
            }
        }

        // ChunkDims caps the cube count, so every slot index fits in u32.
        mesh.triangles
            .extend(eval.triangle_slots().flatten().map(|slot| (base + slot) as u32));
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables;

    fn dims(w: u32, l: u32, h: u32) -> ChunkDims {
        ChunkDims::new(w, l, h).unwrap()
    }

    /// Flat floor: everything below `y = level` is solid.
    fn floor(level: f32) -> impl Fn(Vec3) -> f32 {
        move |p: Vec3| p.y - level
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert_eq!(
            ChunkDims::new(0, 4, 4),
            Err(MeshError::ZeroDimension { axis: "width" })
        );
        assert_eq!(
            ChunkDims::new(4, 0, 4),
            Err(MeshError::ZeroDimension { axis: "length" })
        );
        assert_eq!(
            ChunkDims::new(4, 4, 0),
            Err(MeshError::ZeroDimension { axis: "height" })
        );
    }

    #[test]
    fn test_oversized_chunk_rejected() {
        assert!(ChunkDims::new(710, 710, 710).is_ok());
        assert_eq!(
            ChunkDims::new(711, 711, 711),
            Err(MeshError::TooManyCubes {
                cubes: 711 * 711 * 711,
                max: MAX_CHUNK_CUBES,
            })
        );
        assert!(ChunkDims::new(u32::MAX, u32::MAX, u32::MAX).is_err());
        // The last slot of the largest chunk is still a valid u32 index.
        assert!(MAX_CHUNK_CUBES * EDGE_COUNT as u64 - 1 <= u32::MAX as u64);
    }

    #[test]
    fn test_iteration_order_is_x_then_z_then_y() {
        let d = dims(2, 2, 2);
        let order: Vec<usize> = d.iter().map(|c| d.linear_index(c.x, c.y, c.z)).collect();
        assert_eq!(order, (0..8).collect::<Vec<_>>());
        let coords: Vec<UVec3> = d.iter().take(3).collect();
        assert_eq!(
            coords,
            vec![UVec3::new(0, 0, 0), UVec3::new(1, 0, 0), UVec3::new(0, 0, 1)]
        );
    }

    #[test]
    fn test_single_cube_all_air_is_empty() {
        let mesh = build_chunk_mesh(
            &|_: Vec3| 1.0,
            Vec3::ZERO,
            dims(1, 1, 1),
            0.5,
            &ColorGradient::default(),
        );
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertices.len(), 0);
        assert_eq!(mesh.triangles.len(), 0);
    }

    #[test]
    fn test_single_cube_all_solid_is_empty() {
        let mesh = build_chunk_mesh(
            &|_: Vec3| 0.0,
            Vec3::ZERO,
            dims(1, 1, 1),
            0.5,
            &ColorGradient::default(),
        );
        assert!(mesh.is_empty());
        assert!(mesh.vertices.is_empty());
    }

    #[test]
    fn test_single_cube_bottom_face_solid() {
        let mesh = build_chunk_mesh(
            &floor(0.5),
            Vec3::ZERO,
            dims(1, 1, 1),
            0.0,
            &ColorGradient::default(),
        );
        assert_eq!(mesh.triangle_count(), tables::triangle_count(0x0F));
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices.len(), 12);
        assert_eq!(mesh.colors.len(), 12);
        for &i in &mesh.triangles {
            assert!((8..12).contains(&i), "bottom-face case only uses vertical edges");
            assert!((mesh.vertices[i as usize].y - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_floor_layer_indices_stay_in_cube_regions() {
        let d = dims(4, 3, 2);
        let mesh = build_chunk_mesh(
            &floor(0.5),
            Vec3::ZERO,
            d,
            0.0,
            &ColorGradient::default(),
        );

        // Only the bottom layer of 12 cubes crosses the surface.
        assert_eq!(mesh.triangle_count(), 12 * 2);
        assert_eq!(mesh.vertices.len(), 12 * EDGE_COUNT);
        assert_eq!(mesh.triangles.len() % 3, 0);

        for (cube, tri) in mesh.triangles.chunks_exact(6).enumerate() {
            for &i in tri {
                let i = i as usize;
                assert!(
                    (cube * EDGE_COUNT..(cube + 1) * EDGE_COUNT).contains(&i),
                    "index {i} escapes region of cube {cube}"
                );
            }
        }
    }

    #[test]
    fn test_vertices_are_in_world_space() {
        let origin = Vec3::new(32.0, 0.0, -16.0);
        let mesh = build_chunk_mesh(
            &floor(0.5),
            origin,
            dims(2, 2, 1),
            0.0,
            &ColorGradient::default(),
        );
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::new(32.0, 0.5, -16.0));
        assert_eq!(max, Vec3::new(34.0, 0.5, -14.0));
    }

    #[test]
    fn test_colors_follow_normalized_height() {
        let gradient = ColorGradient::new(
            [0.0, 0.0, 0.0, 1.0],
            [0.5, 0.5, 0.5, 1.0],
            [1.0, 1.0, 1.0, 1.0],
        );
        let mesh = build_chunk_mesh(&floor(0.5), Vec3::ZERO, dims(1, 1, 2), 0.0, &gradient);
        for &i in &mesh.triangles {
            // y = 0.5 in a column 2 high is t = 0.25, halfway from low to mid.
            let c = mesh.colors[i as usize];
            assert!((c[0] - 0.25).abs() < 1e-6, "unexpected color {c:?}");
        }
    }

    /// Right-hand normal of each triangle, paired with its centroid.
    fn facets(mesh: &MeshData) -> Vec<(Vec3, Vec3)> {
        mesh.triangles
            .chunks_exact(3)
            .map(|t| {
                let [a, b, c] = [t[0], t[1], t[2]].map(|i| mesh.vertices[i as usize]);
                ((b - a).cross(c - a), (a + b + c) / 3.0)
            })
            .collect()
    }

    #[test]
    fn test_triangles_face_toward_air() {
        let center = Vec3::splat(5.0);
        let sphere = move |p: Vec3| p.distance(center) - 3.5;
        let mesh = build_chunk_mesh(
            &sphere,
            Vec3::ZERO,
            dims(10, 10, 10),
            0.0,
            &ColorGradient::default(),
        );

        let facets = facets(&mesh);
        assert!(!facets.is_empty());
        for (normal, centroid) in facets {
            assert!(
                normal.dot(centroid - center) > 0.0,
                "triangle at {centroid} faces into the solid"
            );
        }
    }

    #[test]
    fn test_floor_faces_up() {
        let mesh = build_chunk_mesh(
            &floor(0.5),
            Vec3::ZERO,
            dims(3, 3, 3),
            0.0,
            &ColorGradient::default(),
        );
        for (normal, _) in facets(&mesh) {
            assert!(normal.y > 0.0 && normal.x.abs() < 1e-6 && normal.z.abs() < 1e-6);
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let field = |p: Vec3| (p.x * 0.37).sin() + (p.z * 0.21).cos() + p.y * 0.3 - 1.0;
        let d = dims(6, 5, 4);
        let a = build_chunk_mesh(&field, Vec3::ZERO, d, 0.0, &ColorGradient::default());
        let b = build_chunk_mesh(&field, Vec3::ZERO, d, 0.0, &ColorGradient::default());
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }
}
