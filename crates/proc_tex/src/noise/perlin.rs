//! Tileable gradient (Perlin) noise over a toroidal lattice.
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::geom::wrap_unit;
use crate::noise::random_vector;
use crate::texture::Texture;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct PerlinNoiseConfig {
    /// Lattice boxes along every axis.
    pub boxes: usize,
    /// Length of the random nudge added to every gradient per frame.
    pub gradient_drift: f32,
    pub allow_animation: bool,
}

impl Default for PerlinNoiseConfig {
    fn default() -> Self {
        Self {
            boxes: 10,
            gradient_drift: 0.1,
            allow_animation: true,
        }
    }
}

impl PerlinNoiseConfig {
    pub fn new(boxes: usize) -> Self {
        Self {
            boxes,
            ..Default::default()
        }
    }

    pub fn with_gradient_drift(mut self, drift: f32) -> Self {
        self.gradient_drift = drift;
        self
    }

    pub fn with_animation(mut self, allow: bool) -> Self {
        self.allow_animation = allow;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.boxes < 1 {
            return Err(Error::config("perlin noise needs at least one box per axis"));
        }
        if !(self.gradient_drift.is_finite() && self.gradient_drift >= 0.0) {
            return Err(Error::config("gradient_drift must be finite and >= 0"));
        }
        Ok(())
    }
}

/// Gradient noise with one unit gradient per lattice vertex, one channel.
///
/// The lattice wraps, so the texture tiles the unit square or cube. Values are zero on
/// lattice vertices and stay within `[-sqrt(D)/2, sqrt(D)/2]`; use
/// [`crate::transform::scale_to_region`] to bring them into a known range.
pub struct PerlinNoise<const D: usize> {
    boxes: usize,
    gradients: Vec<[f32; D]>,
    gradient_drift: f32,
    allow_animation: bool,
    rng: StdRng,
}

pub type PerlinNoise2D = PerlinNoise<2>;
pub type PerlinNoise3D = PerlinNoise<3>;

impl<const D: usize> PerlinNoise<D> {
    pub fn new(config: &PerlinNoiseConfig, rng: &mut dyn RngCore) -> Result<Self> {
        config.validate()?;
        if !(2..=3).contains(&D) {
            return Err(Error::config(format!(
                "perlin noise supports 2 or 3 dimensions, not {D}"
            )));
        }
        let vertices = config
            .boxes
            .checked_pow(D as u32)
            .ok_or_else(|| Error::config(format!("{} boxes per axis is too many", config.boxes)))?;
        let gradients = (0..vertices).map(|_| random_vector::<D>(&mut *rng, 1.0)).collect();
        Ok(Self {
            boxes: config.boxes,
            gradients,
            gradient_drift: config.gradient_drift,
            allow_animation: config.allow_animation,
            rng: StdRng::seed_from_u64(rng.next_u64()),
        })
    }

    pub fn gradients(&self) -> &[[f32; D]] {
        &self.gradients
    }

    fn sample(&self, p: &[f32]) -> f32 {
        let n = self.boxes;
        let mut base = [0usize; D];
        let mut frac = [0.0f32; D];
        for axis in 0..D {
            let x = wrap_unit(p[axis]) * n as f32;
            let cell = x.floor();
            // x can round up to n right below 1.0
            if (cell as usize) < n {
                base[axis] = cell as usize;
                frac[axis] = x - cell;
            }
        }

        let mut sum = 0.0;
        for corner in 0..(1usize << D) {
            let mut index = 0;
            let mut weight = 1.0;
            let mut offsets = [0.0f32; D];
            for axis in (0..D).rev() {
                let bit = (corner >> axis) & 1;
                index = index * n + (base[axis] + bit) % n;
                let w = fade(frac[axis]);
                weight *= if bit == 1 { w } else { 1.0 - w };
                offsets[axis] = frac[axis] - bit as f32;
            }
            let g = &self.gradients[index];
            let dot: f32 = g.iter().zip(&offsets).map(|(g, d)| g * d).sum();
            sum += weight * dot;
        }
        sum
    }
}

/// Quintic fade `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

impl<const D: usize> Texture for PerlinNoise<D> {
    fn channels(&self) -> usize {
        1
    }

    fn space_dims(&self) -> usize {
        D
    }

    fn evaluate(&self, points: &Batch) -> Result<Batch> {
        if points.width() != D {
            return Err(Error::shape(format!(
                "perlin noise expects {D}D points, got width {}",
                points.width()
            )));
        }
        let mut out = Batch::filled(points.shape(), 1, 0.0);
        for (p, o) in points.rows().zip(out.rows_mut()) {
            o[0] = self.sample(p);
        }
        Ok(out)
    }

    /// Nudges every gradient by a random vector and renormalizes it.
    fn step_frame(&mut self) {
        if !self.allow_animation || self.gradient_drift == 0.0 {
            return;
        }
        for g in &mut self.gradients {
            let nudge = random_vector::<D>(&mut self.rng, self.gradient_drift);
            for (c, d) in g.iter_mut().zip(nudge) {
                *c += d;
            }
            let len = g.iter().map(|c| c * c).sum::<f32>().sqrt();
            if len > f32::EPSILON {
                for c in g.iter_mut() {
                    *c /= len;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise3(config: &PerlinNoiseConfig, seed: u64) -> PerlinNoise3D {
        let mut rng = StdRng::seed_from_u64(seed);
        PerlinNoise::new(config, &mut rng).unwrap()
    }

    #[test]
    fn bad_configs_are_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        for cfg in [
            PerlinNoiseConfig::new(0),
            PerlinNoiseConfig::new(4).with_gradient_drift(f32::NAN),
        ] {
            assert!(matches!(
                PerlinNoise2D::new(&cfg, &mut rng),
                Err(Error::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn zero_on_lattice_vertices() {
        let n = noise3(&PerlinNoiseConfig::new(4), 2);
        let pts = Batch::from_rows(&[[0.0, 0.0, 0.0], [0.25, 0.5, 0.75], [0.5, 0.25, 0.0]]);
        let out = n.evaluate(&pts).unwrap();
        assert!(out.data().iter().all(|v| v.abs() < 1e-6), "{:?}", out.data());
    }

    #[test]
    fn tiles_and_stays_bounded() {
        let n = noise3(&PerlinNoiseConfig::new(5), 9);
        let a = n.sample(&[0.31, 0.62, 0.13]);
        let b = n.sample(&[1.31, -0.38, 2.13]);
        assert!((a - b).abs() < 1e-3, "{a} vs {b}");

        let bound = 3f32.sqrt() / 2.0 + 1e-5;
        for i in 0..200 {
            let t = i as f32 / 200.0;
            let v = n.sample(&[t, (t * 7.0).fract(), (t * 13.0).fract()]);
            assert!(v.abs() <= bound, "{v} at {t}");
        }
    }

    #[test]
    fn continuous_across_box_edges() {
        let mut rng = StdRng::seed_from_u64(4);
        let n = PerlinNoise2D::new(&PerlinNoiseConfig::new(4), &mut rng).unwrap();
        for y in [0.1, 0.37, 0.8] {
            let left = n.sample(&[0.25 - 1e-4, y]);
            let right = n.sample(&[0.25 + 1e-4, y]);
            assert!((left - right).abs() < 1e-2, "{left} vs {right}");
        }
        // across the wrap seam
        let below = n.sample(&[0.4, 1.0 - 1e-4]);
        let above = n.sample(&[0.4, 1e-4]);
        assert!((below - above).abs() < 1e-2, "{below} vs {above}");
    }

    #[test]
    fn animation_keeps_unit_gradients() {
        let mut n = noise3(&PerlinNoiseConfig::new(3).with_gradient_drift(0.3), 6);
        let before = n.gradients().to_vec();
        n.step_frame();
        assert_ne!(n.gradients(), &before[..]);
        for g in n.gradients() {
            let len = g.iter().map(|c| c * c).sum::<f32>().sqrt();
            assert!((len - 1.0).abs() < 1e-4);
        }

        let mut frozen = noise3(&PerlinNoiseConfig::new(3).with_animation(false), 6);
        let before = frozen.gradients().to_vec();
        frozen.step_frame();
        assert_eq!(frozen.gradients(), &before[..]);
    }
}
