//! Noise generators (graph leaves).
//!
//! - [`CellNoise`]: Worley cellular noise over a toroidal [`cell_grid::CellGrid`] with
//!   animated points.
//! - [`GridNoise`]: one pseudo-random value per grid box, re-seeded every frame.
//! - [`PerlinNoise`]: tileable gradient noise whose gradients drift every frame.
//! - [`WhiteNoise`]: a new random value per point on every evaluation.
use std::f32::consts::TAU;

use rand::RngCore;

use crate::geom::{vec2_from_polar, vec3_from_spherical};

pub mod cell_grid;
pub mod cell_noise;
pub mod grid_noise;
pub mod perlin;
pub mod white;

pub use cell_grid::{CellGrid, CellPoint, NeighborSearch};
pub use cell_noise::{CellNoise, CellNoise2D, CellNoise3D, CellNoiseConfig};
pub use grid_noise::{GridNoise, GridNoise2D, GridNoise3D, GridNoiseConfig};
pub use perlin::{PerlinNoise, PerlinNoise2D, PerlinNoise3D, PerlinNoiseConfig};
pub use white::WhiteNoise;

/// Generate a random float in the range [0, 1].
#[inline]
pub(crate) fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// Uniform integer in `[min, max]`.
#[inline]
pub(crate) fn rand_inclusive(rng: &mut dyn RngCore, min: usize, max: usize) -> usize {
    if max <= min {
        return min;
    }
    let Some(span) = ((max - min) as u64).checked_add(1) else {
        return min.wrapping_add(rng.next_u64() as usize);
    };
    // Reject draws from the incomplete top block so every value is equally likely.
    let zone = u64::MAX - (u64::MAX - span + 1) % span;
    loop {
        let x = rng.next_u64();
        if x <= zone {
            return min + (x % span) as usize;
        }
    }
}

/// Random vector with the given magnitude and a direction uniform over the circle (2D)
/// or sphere (3D).
pub(crate) fn random_vector<const D: usize>(rng: &mut dyn RngCore, magnitude: f32) -> [f32; D] {
    let mut out = [0.0; D];
    match D {
        2 => {
            let v = vec2_from_polar(magnitude, rand01(rng) * TAU);
            out.copy_from_slice(&v.to_array()[..D]);
        }
        3 => {
            let azimuth = rand01(rng) * TAU;
            let cos_polar = rand01(rng) * 2.0 - 1.0;
            let v = vec3_from_spherical(magnitude, azimuth, cos_polar);
            out.copy_from_slice(&v.to_array()[..D]);
        }
        _ => {
            for c in out.iter_mut() {
                *c = rand01(rng) * 2.0 - 1.0;
            }
            let len = out.iter().map(|c| c * c).sum::<f32>().sqrt();
            if len > 0.0 {
                for c in out.iter_mut() {
                    *c *= magnitude / len;
                }
            }
        }
    }
    out
}

/// Stateless hash of `(seed, index)` to a float in `[0, 1)`.
#[inline]
pub(crate) fn hash01(seed: u64, index: u64) -> f32 {
    // splitmix64 finalizer
    let mut z = seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 40) as f32 / (1u64 << 24) as f32
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    struct FixedRng {
        value: u32,
    }

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.value
        }

        fn next_u64(&mut self) -> u64 {
            self.value as u64
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            let bytes = self.value.to_le_bytes();
            for (i, b) in dest.iter_mut().enumerate() {
                *b = bytes[i % 4];
            }
        }
    }

    #[test]
    fn rand01_values_in_range() {
        for value in [0, 1, 1000, u32::MAX / 2, u32::MAX] {
            let mut rng = FixedRng { value };
            let result = rand01(&mut rng);
            assert!(
                (0.0..=1.0).contains(&result),
                "rand01({}) = {} is out of range [0,1]",
                value,
                result
            );
        }
    }

    #[test]
    fn rand_inclusive_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let n = rand_inclusive(&mut rng, 2, 5);
            assert!((2..=5).contains(&n));
        }
        assert_eq!(rand_inclusive(&mut rng, 3, 3), 3);
    }

    struct SequenceRng {
        values: Vec<u64>,
    }

    impl RngCore for SequenceRng {
        fn next_u32(&mut self) -> u32 {
            self.next_u64() as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.values.remove(0)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for b in dest.iter_mut() {
                *b = self.next_u64() as u8;
            }
        }
    }

    #[test]
    fn rand_inclusive_rejects_the_biased_tail() {
        // 2^64 leaves remainder 1 modulo 3, so u64::MAX is the one rejected draw.
        let mut rng = SequenceRng {
            values: vec![u64::MAX, 4],
        };
        assert_eq!(rand_inclusive(&mut rng, 10, 12), 11);
        assert!(rng.values.is_empty());
    }

    #[test]
    fn rand_inclusive_hits_every_value() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [0usize; 4];
        for _ in 0..4000 {
            seen[rand_inclusive(&mut rng, 1, 4) - 1] += 1;
        }
        assert!(seen.iter().all(|&n| n > 800), "{seen:?}");
    }

    #[test]
    fn random_vectors_have_requested_magnitude() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let v2: [f32; 2] = random_vector(&mut rng, 0.3);
            let v3: [f32; 3] = random_vector(&mut rng, 0.3);
            let l2 = (v2[0] * v2[0] + v2[1] * v2[1]).sqrt();
            let l3 = (v3[0] * v3[0] + v3[1] * v3[1] + v3[2] * v3[2]).sqrt();
            assert!((l2 - 0.3).abs() < 1e-5);
            assert!((l3 - 0.3).abs() < 1e-5);
        }
    }

    #[test]
    fn hash01_is_deterministic_and_in_range() {
        assert_eq!(hash01(1, 2), hash01(1, 2));
        assert_ne!(hash01(1, 2), hash01(1, 3));
        for i in 0..1000 {
            let v = hash01(42, i);
            assert!((0.0..1.0).contains(&v));
        }
    }
}
