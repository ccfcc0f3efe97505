//! Deterministic hash-based value noise
//!
//! Every sample is a pure function of its coordinates and seed: no generator
//! state is carried between calls. All integer arithmetic is done on `u32` with
//! wrapping multiplication so the fields are bit-identical across platforms.

use noise::NoiseFn;

/// Seed offset between consecutive fractal octaves.
pub const OCTAVE_SEED_STRIDE: u32 = 999;

const HASH_X: u32 = 374_761_393;
const HASH_Y: u32 = 668_265_263;
const HASH_SEED: u32 = 2_654_435_761;
const HASH_MIX: u32 = 1_274_126_177;

/// Integer hash of a lattice point, normalized to `[0, 1)`.
pub fn seeded_hash(x: i32, y: i32, seed: u32) -> f64 {
    let mut n = (x as u32)
        .wrapping_mul(HASH_X)
        .wrapping_add((y as u32).wrapping_mul(HASH_Y))
        .wrapping_add(seed.wrapping_mul(HASH_SEED));
    n = (n ^ (n >> 13)).wrapping_mul(HASH_MIX);
    n ^= n >> 16;
    n as f64 / 4_294_967_296.0
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Bilinearly interpolated value noise on an integer lattice of spacing `scale`.
#[derive(Clone, Copy, Debug)]
pub struct ValueNoise {
    pub seed: u32,
    pub scale: f64,
}

impl ValueNoise {
    pub fn new(seed: u32, scale: f64) -> Self {
        Self { seed, scale }
    }
}

impl NoiseFn<f64, 2> for ValueNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        let fx = point[0] / self.scale;
        let fy = point[1] / self.scale;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let sx = fx - x0;
        let sy = fy - y0;
        let (x0, y0) = (x0 as i32, y0 as i32);
        let (x1, y1) = (x0.wrapping_add(1), y0.wrapping_add(1));

        let n00 = seeded_hash(x0, y0, self.seed);
        let n10 = seeded_hash(x1, y0, self.seed);
        let n01 = seeded_hash(x0, y1, self.seed);
        let n11 = seeded_hash(x1, y1, self.seed);

        lerp(lerp(n00, n10, sx), lerp(n01, n11, sx), sy)
    }
}

/// Multi-octave sum of [`ValueNoise`]: each octave doubles the frequency, halves
/// the amplitude and shifts the seed by [`OCTAVE_SEED_STRIDE`].
#[derive(Clone, Copy, Debug)]
pub struct FractalValueNoise {
    pub octaves: u32,
    pub base_scale: f64,
    pub seed: u32,
}

impl FractalValueNoise {
    pub fn new(octaves: u32, base_scale: f64, seed: u32) -> Self {
        Self { octaves, base_scale, seed }
    }

    fn octave(&self, index: u32) -> ValueNoise {
        ValueNoise::new(
            self.seed.wrapping_add(index.wrapping_mul(OCTAVE_SEED_STRIDE)),
            self.base_scale,
        )
    }
}

impl NoiseFn<f64, 2> for FractalValueNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_value = 0.0;

        for i in 0..self.octaves {
            total += self.octave(i).get([point[0] * frequency, point[1] * frequency]) * amplitude;
            max_value += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        if max_value > 0.0 {
            total / max_value
        } else {
            0.0
        }
    }
}

/// Fractal value noise at `(x, y)` in `[0, 1)`.
pub fn fractal_noise(x: f64, y: f64, octaves: u32, base_scale: f64, seed: u32) -> f64 {
    FractalValueNoise::new(octaves, base_scale, seed).get([x, y])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic_and_in_range() {
        for seed in [0u32, 1, 42, 999_999, u32::MAX] {
            for x in -5..20 {
                for y in -5..20 {
                    let a = seeded_hash(x, y, seed);
                    assert_eq!(a.to_bits(), seeded_hash(x, y, seed).to_bits());
                    assert!((0.0..1.0).contains(&a), "hash {a} out of range");
                }
            }
        }
    }

    #[test]
    fn test_hash_known_value() {
        // n = 0 at the origin with seed 0, so every mixing step keeps it at zero.
        assert_eq!(seeded_hash(0, 0, 0), 0.0);
        assert_ne!(seeded_hash(1, 0, 0), seeded_hash(0, 1, 0));
        assert_ne!(seeded_hash(3, 7, 1), seeded_hash(3, 7, 2));
    }

    #[test]
    fn test_value_noise_matches_hash_on_lattice() {
        let noise = ValueNoise::new(77, 12.0);
        // Lattice points interpolate to the corner hash exactly.
        assert_eq!(noise.get([24.0, 36.0]), seeded_hash(2, 3, 77));
        assert_eq!(noise.get([0.0, 0.0]), seeded_hash(0, 0, 77));
    }

    #[test]
    fn test_value_noise_is_continuous_between_lattice_points() {
        let noise = ValueNoise::new(5, 10.0);
        let a = noise.get([14.999, 3.0]);
        let b = noise.get([15.001, 3.0]);
        assert!((a - b).abs() < 1e-3);
    }

    #[test]
    fn test_fractal_noise_range() {
        for seed in [1u32, 52, 12_345] {
            for x in 0..40 {
                for y in 0..40 {
                    let v = fractal_noise(x as f64, y as f64, 5, 12.0, seed);
                    assert!((0.0..1.0).contains(&v));
                }
            }
        }
    }

    #[test]
    fn test_single_octave_equals_value_noise() {
        let single = fractal_noise(17.0, 9.0, 1, 12.0, 31);
        assert_eq!(single, ValueNoise::new(31, 12.0).get([17.0, 9.0]));
    }

    #[test]
    fn test_octaves_use_distinct_seeds() {
        let fractal = FractalValueNoise::new(3, 12.0, 100);
        assert_eq!(fractal.octave(0).seed, 100);
        assert_eq!(fractal.octave(1).seed, 1099);
        assert_eq!(fractal.octave(2).seed, 2098);
    }
}
