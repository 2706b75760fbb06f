//! Single-cube evaluation: corner sampling, cube index, and edge interpolation.

use glam::Vec3;

use crate::tables::{self, CORNER_OFFSETS, EDGE_CORNERS, EDGE_COUNT};

/// Snapping tolerance used by [`interpolate_edge`].
pub const INTERPOLATION_EPSILON: f32 = 1e-5;

/// A scalar density field that can be sampled at any point.
///
/// Implementations must be pure: equal inputs give equal outputs, with no
/// interior mutation, so one source can be shared by concurrent chunk builds.
pub trait DensitySource {
    /// Density at `position`. Values below the iso level are solid.
    fn density(&self, position: Vec3) -> f32;
}

impl<F> DensitySource for F
where
    F: Fn(Vec3) -> f32,
{
    #[inline]
    fn density(&self, position: Vec3) -> f32 {
        self(position)
    }
}

/// One sampled cube corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeCorner {
    /// World-space corner position.
    pub position: Vec3,
    /// Density sampled at `position`.
    pub value: f32,
}

/// Result of evaluating one unit cube.
#[derive(Clone, Debug)]
pub struct CubeEvaluation {
    /// Bit `i` set when corner `i` sampled below the iso level.
    pub cube_index: u8,
    /// Interpolated crossing point per edge slot. Only slots whose bit is set in
    /// [`tables::edge_mask`] hold meaningful positions; the rest are zero.
    pub edge_vertices: [Vec3; EDGE_COUNT],
    /// Triangle slot triples from the table row for `cube_index`.
    pub triangles: &'static [i8],
}

impl CubeEvaluation {
    fn empty(cube_index: u8) -> Self {
        Self {
            cube_index,
            edge_vertices: [Vec3::ZERO; EDGE_COUNT],
            triangles: &[],
        }
    }

    /// `true` when the cube produced no geometry.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Crossed-edge mask for this cube.
    pub fn edge_mask(&self) -> u16 {
        tables::edge_mask(self.cube_index)
    }

    /// Number of emitted triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Iterates triangles as triples of local edge slots (0–11).
    pub fn triangle_slots(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.triangles
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }

    /// Iterates triangles as resolved vertex positions.
    pub fn triangle_positions(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.triangle_slots().map(|[a, b, c]| {
            [
                self.edge_vertices[a],
                self.edge_vertices[b],
                self.edge_vertices[c],
            ]
        })
    }
}

/// Sample the 8 corners of the unit cube whose minimum corner is `origin`.
pub fn sample_corners(source: &impl DensitySource, origin: Vec3) -> [CubeCorner; 8] {
    CORNER_OFFSETS.map(|[dx, dy, dz]| {
        let position = origin + Vec3::new(dx as f32, dy as f32, dz as f32);
        CubeCorner {
            position,
            value: source.density(position),
        }
    })
}

/// Classify corners against `iso_level` into an 8-bit cube index.
pub fn cube_index(corners: &[CubeCorner; 8], iso_level: f32) -> u8 {
    corners
        .iter()
        .enumerate()
        .filter(|(_, corner)| corner.value < iso_level)
        .fold(0u8, |index, (i, _)| index | (1 << i))
}

/// Evaluate the unit cube at `origin` against `iso_level`.
///
/// Trivial configurations return immediately with no triangles and no
/// interpolation work.
pub fn evaluate(source: &impl DensitySource, origin: Vec3, iso_level: f32) -> CubeEvaluation {
    let corners = sample_corners(source, origin);
    evaluate_corners(&corners, iso_level)
}

/// Evaluate a cube from already sampled corners.
pub fn evaluate_corners(corners: &[CubeCorner; 8], iso_level: f32) -> CubeEvaluation {
    let index = cube_index(corners, iso_level);
    let mask = tables::edge_mask(index);
    if mask == 0 {
        return CubeEvaluation::empty(index);
    }

    let mut edge_vertices = [Vec3::ZERO; EDGE_COUNT];
    for (edge, [a, b]) in EDGE_CORNERS.iter().enumerate() {
        if mask & (1 << edge) != 0 {
            edge_vertices[edge] = interpolate_edge(iso_level, corners[*a], corners[*b]);
        }
    }

    CubeEvaluation {
        cube_index: index,
        edge_vertices,
        triangles: tables::triangles(index),
    }
}

/// Point on the edge `c1 → c2` where the density crosses `iso_level`.
///
/// Values within [`INTERPOLATION_EPSILON`] of the iso level snap to their
/// corner, and a near-flat edge returns `c1` instead of dividing by ~0.
pub fn interpolate_edge(iso_level: f32, c1: CubeCorner, c2: CubeCorner) -> Vec3 {
    if (iso_level - c1.value).abs() < INTERPOLATION_EPSILON {
        return c1.position;
    }
    if (iso_level - c2.value).abs() < INTERPOLATION_EPSILON {
        return c2.position;
    }
    if (c1.value - c2.value).abs() < 2.0 * INTERPOLATION_EPSILON {
        return c1.position;
    }
    let t = (iso_level - c1.value) / (c2.value - c1.value);
    c1.position + t * (c2.position - c1.position)
}
