//! Deterministic seeded generation utilities.
//!
//! Provides the per-pass octave offset draw, deterministic math via `libm`,
//! and content hashes of built meshes for determinism verification.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strata_mesh::MeshData;

use crate::registry::ChunkCoord;

/// Octave offsets are drawn uniformly from `[-RANGE, RANGE)` on both axes.
pub const OCTAVE_OFFSET_RANGE: f64 = 100_000.0;

// ---------------------------------------------------------------------------
// Seed derivation
// ---------------------------------------------------------------------------

/// Fresh generator for one pass.
///
/// Re-seeded on every call: a pass never continues the sequence of the one
/// before it.
pub fn pass_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Draw one `[x, z]` offset per octave, in octave order.
pub fn draw_octave_offsets(rng: &mut impl Rng, octaves: u32) -> Vec<[f64; 2]> {
    (0..octaves)
        .map(|_| {
            [
                rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE),
                rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE),
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Deterministic math (libm)
// ---------------------------------------------------------------------------

/// Deterministic sine using libm (not platform libc).
#[inline]
pub fn det_sin(x: f64) -> f64 {
    libm::sin(x)
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Hash the contents of a `MeshData` for determinism comparison.
///
/// Floats are hashed by bit pattern, so `-0.0` and `0.0` differ.
pub fn hash_mesh(mesh: &MeshData) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_mesh_into(mesh, &mut hasher);
    hasher.finish()
}

/// Hash a set of chunk meshes independent of iteration order.
pub fn hash_meshes<'a>(meshes: impl IntoIterator<Item = (ChunkCoord, &'a MeshData)>) -> u64 {
    let mut sorted: Vec<_> = meshes.into_iter().collect();
    sorted.sort_by_key(|(coord, _)| *coord);

    let mut hasher = DefaultHasher::new();
    for (coord, mesh) in sorted {
        coord.hash(&mut hasher);
        hash_mesh_into(mesh, &mut hasher);
    }
    hasher.finish()
}

fn hash_mesh_into(mesh: &MeshData, hasher: &mut impl Hasher) {
    mesh.vertices.len().hash(hasher);
    for v in &mesh.vertices {
        v.to_array().map(f32::to_bits).hash(hasher);
    }
    for c in &mesh.colors {
        c.map(f32::to_bits).hash(hasher);
    }
    mesh.triangles.hash(hasher);
}
