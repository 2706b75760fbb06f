//! Chunk mesh data: positions, parallel vertex colors, and triangle indices.

use glam::{Vec3, Vec4};

/// Linear RGBA color.
pub type Rgba = [f32; 4];

/// The mesh output of one chunk build.
///
/// `colors` is parallel to `vertices`, and `triangles` holds 3 indices per
/// triangle. A builder may leave vertex slots that no triangle references;
/// their contents are unspecified. See [`MeshData::compacted`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions in world space.
    pub vertices: Vec<Vec3>,
    /// One color per vertex.
    pub colors: Vec<Rgba>,
    /// Index buffer (triangles, 3 indices per triangle).
    pub triangles: Vec<u32>,
}

impl MeshData {
    /// Creates an empty mesh ("no geometry").
    pub fn empty() -> Self {
        Self::default()
    }

    /// `true` when the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Number of vertex slots, referenced or not.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of distinct vertices referenced by at least one triangle.
    pub fn referenced_vertex_count(&self) -> usize {
        let mut seen = vec![false; self.vertices.len()];
        for &i in &self.triangles {
            seen[i as usize] = true;
        }
        seen.into_iter().filter(|&s| s).count()
    }

    /// Axis-aligned bounds of the referenced vertices, or `None` when empty.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.triangles.iter().map(|&i| self.vertices[i as usize]);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), v| (min.min(v), max.max(v))))
    }

    /// Returns a copy without unreferenced vertex slots.
    ///
    /// Vertices keep their first-reference order, and triangle order is
    /// unchanged, so equal inputs give equal outputs.
    pub fn compacted(&self) -> Self {
        const UNMAPPED: u32 = u32::MAX;
        let mut remap = vec![UNMAPPED; self.vertices.len()];
        let mut out = Self {
            vertices: Vec::new(),
            colors: Vec::new(),
            triangles: Vec::with_capacity(self.triangles.len()),
        };

        for &old in &self.triangles {
            let slot = &mut remap[old as usize];
            if *slot == UNMAPPED {
                *slot = out.vertices.len() as u32;
                out.vertices.push(self.vertices[old as usize]);
                out.colors.push(self.colors[old as usize]);
            }
            out.triangles.push(*slot);
        }

        out
    }
}

/// Three-stop vertical color gradient.
///
/// The lower half of the range blends `low → mid`, the upper half `mid → high`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorGradient {
    /// Color at normalized height 0.
    pub low: Rgba,
    /// Color at normalized height 0.5.
    pub mid: Rgba,
    /// Color at normalized height 1.
    pub high: Rgba,
}

impl ColorGradient {
    /// Creates a gradient from its three stops.
    pub fn new(low: Rgba, mid: Rgba, high: Rgba) -> Self {
        Self { low, mid, high }
    }

    /// Color at normalized height `t` (clamped to `[0, 1]`).
    pub fn sample(&self, t: f32) -> Rgba {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let (from, to, local) = if t < 0.5 {
            (self.low, self.mid, t * 2.0)
        } else {
            (self.mid, self.high, t * 2.0 - 1.0)
        };
        Vec4::from_array(from)
            .lerp(Vec4::from_array(to), local)
            .to_array()
    }

    /// Color for a vertex at height `y` in a column `height` cubes tall.
    pub fn color_at_height(&self, y: f32, height: f32) -> Rgba {
        self.sample(y / height)
    }
}

impl Default for ColorGradient {
    fn default() -> Self {
        Self {
            low: [0.36, 0.25, 0.18, 1.0],
            mid: [0.30, 0.55, 0.24, 1.0],
            high: [0.95, 0.95, 0.97, 1.0],
        }
    }
}
