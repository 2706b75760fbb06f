//! Fractal-noise density field.
//!
//! Composites octaves of 2-D Perlin noise into a normalized horizontal term
//! and blends it with a vertical falloff, so density rises with height: solid
//! at the bottom of a column, air at the top.

use glam::Vec3;
use noise::{NoiseFn, Perlin};
use strata_config::{Falloff, GenerationConfig};
use strata_mesh::DensitySource;

use crate::seed::{det_sin, draw_octave_offsets, pass_rng};

/// Lattice period of `noise::Perlin`: its permutation hash masks cell
/// coordinates to 8 bits.
pub const PERLIN_PERIOD: f64 = 256.0;

/// Fold a noise coordinate into `[0, PERLIN_PERIOD)`.
///
/// Perlin casts the lattice cell to `isize` and panics when that cast fails,
/// so coordinates must stay small. Non-finite inputs map to the origin.
#[inline]
fn wrap_lattice(v: f64) -> f64 {
    if v.is_finite() {
        v.rem_euclid(PERLIN_PERIOD)
    } else {
        0.0
    }
}

/// Parameters of the density field, frozen for one generation pass.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityParams {
    /// Seed for octave offsets and the noise permutation table.
    pub seed: u64,
    /// Number of noise octaves. Must be at least 1.
    pub octaves: u32,
    /// Amplitude of octave `i` is `persistence^i`.
    pub persistence: f64,
    /// Frequency of octave `i` is `lacunarity^i`.
    pub lacunarity: f64,
    /// Horizontal frequency applied before the octave frequency.
    pub scale: f64,
    /// Global phase added to world X before scaling.
    pub x_noise_offset: f64,
    /// Global phase added to world Z before scaling.
    pub z_noise_offset: f64,
    /// Vertical falloff curve.
    pub falloff: Falloff,
    /// Weight of the falloff against the horizontal term, in `(0, 1]`.
    pub vertical_weight: f32,
}

impl Default for DensityParams {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for DensityParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            seed: config.seed,
            octaves: config.octaves,
            persistence: config.persistence as f64,
            lacunarity: config.lacunarity as f64,
            scale: config.scale as f64,
            x_noise_offset: config.x_noise_offset as f64,
            z_noise_offset: config.z_noise_offset as f64,
            falloff: config.falloff,
            vertical_weight: config.vertical_weight,
        }
    }
}

/// Map a height fraction in `[0, 1]` through the falloff curve.
///
/// Every curve is non-decreasing, which keeps density monotonic in height.
pub fn falloff_curve(falloff: Falloff, fraction: f32) -> f32 {
    let f = fraction.clamp(0.0, 1.0);
    match falloff {
        Falloff::Linear => f,
        Falloff::QuarterSine => det_sin(f as f64 * std::f64::consts::FRAC_PI_2) as f32,
    }
}

/// A density field with its octave offsets drawn and frozen.
///
/// Construct one per generation pass; it is immutable afterwards and safe to
/// share between worker threads by reference.
pub struct DensityField {
    noise: Perlin,
    params: DensityParams,
    octave_offsets: Vec<[f64; 2]>,
    amplitude_sum: f64,
    column_height: f32,
}

impl DensityField {
    /// Freeze a field for a column `column_height` cubes tall.
    ///
    /// Offsets come from a generator seeded with `params.seed` on every call,
    /// so two fields built from equal parameters sample identically.
    pub fn new(params: DensityParams, column_height: u32) -> Self {
        let mut rng = pass_rng(params.seed);
        let octave_offsets = draw_octave_offsets(&mut rng, params.octaves);

        let mut amplitude_sum = 0.0;
        let mut amplitude = 1.0;
        for _ in 0..params.octaves {
            amplitude_sum += amplitude;
            amplitude *= params.persistence;
        }

        Self {
            noise: Perlin::new(params.seed as u32),
            params,
            octave_offsets,
            amplitude_sum,
            column_height: column_height.max(1) as f32,
        }
    }

    /// Build the field for a generation config.
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(DensityParams::from(config), config.height)
    }

    /// Coherent noise remapped to `[0, 1]`. Defined for any input, periodic
    /// in [`PERLIN_PERIOD`] on both axes.
    pub fn noise2d(&self, x: f64, z: f64) -> f64 {
        let point = [wrap_lattice(x), wrap_lattice(z)];
        (self.noise.get(point) * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    /// Normalized fractal noise at a world XZ position, in `[0, 1]`.
    pub fn horizontal(&self, x: f32, z: f32) -> f32 {
        let px = (x as f64 + self.params.x_noise_offset) * self.params.scale;
        let pz = (z as f64 + self.params.z_noise_offset) * self.params.scale;

        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;

        for &[ox, oz] in &self.octave_offsets {
            total += amplitude * self.noise2d(px * frequency + ox, pz * frequency + oz);

            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }

        if self.amplitude_sum.abs() < f64::EPSILON || !self.amplitude_sum.is_finite() {
            return 0.5;
        }
        (total / self.amplitude_sum).clamp(0.0, 1.0) as f32
    }

    /// Density at `position`, in `[0, 1]`.
    pub fn sample(&self, position: Vec3) -> f32 {
        let w = self.params.vertical_weight;
        let vertical = falloff_curve(self.params.falloff, position.y / self.column_height);
        let horizontal = self.horizontal(position.x, position.z);
        w * vertical + (1.0 - w) * (1.0 - horizontal)
    }

    /// Per-octave `(x, z)` offsets drawn for this pass.
    pub fn octave_offsets(&self) -> &[[f64; 2]] {
        &self.octave_offsets
    }

    /// Sum of all octave amplitudes (the normalization divisor).
    pub fn max_amplitude(&self) -> f64 {
        self.amplitude_sum
    }

    /// Column height used to normalize Y.
    pub fn column_height(&self) -> f32 {
        self.column_height
    }

    /// Return a reference to the frozen parameters.
    pub fn params(&self) -> &DensityParams {
        &self.params
    }
}

impl DensitySource for DensityField {
    #[inline]
    fn density(&self, position: Vec3) -> f32 {
        self.sample(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DensityParams {
        DensityParams {
            seed: 42,
            ..Default::default()
        }
    }

    #[test]
    fn test_determinism_same_seed_same_position() {
        let a = DensityField::new(params(), 16);
        let b = DensityField::new(params(), 16);
        let p = Vec3::new(13.0, 4.0, -7.0);
        assert_eq!(a.sample(p).to_bits(), b.sample(p).to_bits());
        assert_eq!(a.octave_offsets(), b.octave_offsets());
    }

    #[test]
    fn test_offsets_drawn_per_octave() {
        let field = DensityField::new(
            DensityParams {
                octaves: 6,
                ..params()
            },
            16,
        );
        assert_eq!(field.octave_offsets().len(), 6);
    }

    #[test]
    fn test_different_seeds_produce_different_offsets() {
        let a = DensityField::new(params(), 16);
        let b = DensityField::new(
            DensityParams {
                seed: 999,
                ..params()
            },
            16,
        );
        assert_ne!(a.octave_offsets(), b.octave_offsets());
    }

    #[test]
    fn test_sample_within_unit_range() {
        let field = DensityField::new(params(), 16);
        for x in 0..20 {
            for z in 0..20 {
                for y in [0.0, 3.0, 8.0, 16.0] {
                    let d = field.sample(Vec3::new(x as f32 * 1.7, y, z as f32 * 2.3));
                    assert!((0.0..=1.0).contains(&d), "density {d} out of range");
                }
            }
        }
    }

    #[test]
    fn test_density_increases_with_height() {
        for falloff in [Falloff::Linear, Falloff::QuarterSine] {
            let field = DensityField::new(
                DensityParams {
                    falloff,
                    ..params()
                },
                16,
            );
            for (x, z) in [(0.0, 0.0), (5.5, 9.25), (-31.0, 12.0)] {
                let mut previous = f32::NEG_INFINITY;
                for y in 0..=16 {
                    let d = field.sample(Vec3::new(x, y as f32, z));
                    assert!(
                        d > previous,
                        "{falloff:?}: density not increasing at ({x}, {y}, {z})"
                    );
                    previous = d;
                }
            }
        }
    }

    #[test]
    fn test_single_octave_ignores_persistence_and_lacunarity() {
        let base = DensityParams {
            octaves: 1,
            ..params()
        };
        let a = DensityField::new(base.clone(), 16);
        let b = DensityField::new(
            DensityParams {
                persistence: 0.1,
                lacunarity: 7.5,
                ..base
            },
            16,
        );
        for i in 0..50 {
            let p = Vec3::new(i as f32 * 0.9, (i % 16) as f32, i as f32 * -1.3);
            assert_eq!(a.sample(p).to_bits(), b.sample(p).to_bits());
        }
    }

    #[test]
    fn test_single_octave_is_one_noise_sample() {
        let field = DensityField::new(
            DensityParams {
                octaves: 1,
                scale: 0.1,
                x_noise_offset: 3.0,
                z_noise_offset: -2.0,
                ..params()
            },
            16,
        );
        let [ox, oz] = field.octave_offsets()[0];
        let (x, z) = (12.5_f32, 4.0_f32);
        let expected = field.noise2d((x as f64 + 3.0) * 0.1 + ox, (z as f64 - 2.0) * 0.1 + oz);
        assert!((field.horizontal(x, z) as f64 - expected).abs() < 1e-6);
    }

    #[test]
    fn test_max_amplitude_is_geometric_sum() {
        let field = DensityField::new(
            DensityParams {
                octaves: 4,
                persistence: 0.5,
                ..params()
            },
            16,
        );
        assert!((field.max_amplitude() - 1.875).abs() < 1e-12);
    }

    #[test]
    fn test_zero_amplitude_sum_is_neutral() {
        let field = DensityField::new(
            DensityParams {
                octaves: 2,
                persistence: -1.0,
                ..params()
            },
            16,
        );
        assert_eq!(field.horizontal(3.0, 4.0), 0.5);
    }

    #[test]
    fn test_falloff_curves_are_monotonic() {
        for falloff in [Falloff::Linear, Falloff::QuarterSine] {
            assert_eq!(falloff_curve(falloff, 0.0), 0.0);
            assert!((falloff_curve(falloff, 1.0) - 1.0).abs() < 1e-6);
            let mut previous = -1.0;
            for i in 0..=100 {
                let v = falloff_curve(falloff, i as f32 / 100.0);
                assert!(v >= previous);
                previous = v;
            }
        }
    }

    #[test]
    fn test_noise_repeats_every_lattice_period() {
        let field = DensityField::new(params(), 16);
        for (x, z) in [(3.5, 7.25), (-12.75, 100.5)] {
            let base = field.noise2d(x, z);
            assert_eq!(base, field.noise2d(x + PERLIN_PERIOD, z));
            assert_eq!(base, field.noise2d(x, z - 4.0 * PERLIN_PERIOD));
        }
    }

    #[test]
    fn test_huge_noise_coordinates_stay_in_range() {
        let field = DensityField::new(params(), 16);
        for v in [9.3e18, -4.0e30, f64::MAX, f64::INFINITY, f64::NAN] {
            let n = field.noise2d(v, 1.5);
            assert!((0.0..=1.0).contains(&n), "noise {n} out of range at {v}");
        }
    }

    #[test]
    fn test_many_octaves_and_large_scale_sample_in_range() {
        for p in [
            DensityParams {
                octaves: 200,
                ..params()
            },
            DensityParams {
                scale: 1e20,
                ..params()
            },
            DensityParams {
                octaves: 1100,
                lacunarity: 2.0,
                ..params()
            },
            DensityParams {
                octaves: 1100,
                persistence: 2.0,
                ..params()
            },
        ] {
            let field = DensityField::new(p, 16);
            for i in 0..16 {
                let d = field.sample(Vec3::new(i as f32 * 3.1, i as f32, -(i as f32) * 7.7));
                assert!((0.0..=1.0).contains(&d), "density {d} out of range");
            }
        }
    }

    #[test]
    fn test_density_source_matches_sample() {
        let field = DensityField::new(params(), 8);
        let p = Vec3::new(1.5, 2.0, 3.5);
        assert_eq!(field.density(p), field.sample(p));
    }
}
