//! Simple grid noise: one pseudo-random value per grid box.
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::geom::wrap_unit;
use crate::noise::hash01;
use crate::texture::Texture;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GridNoiseConfig {
    /// Boxes along every axis.
    pub boxes: usize,
    /// When `true`, every frame draws a new seed.
    pub allow_animation: bool,
}

impl Default for GridNoiseConfig {
    fn default() -> Self {
        Self {
            boxes: 8,
            allow_animation: true,
        }
    }
}

impl GridNoiseConfig {
    pub fn new(boxes: usize) -> Self {
        Self {
            boxes,
            ..Default::default()
        }
    }

    pub fn with_animation(mut self, allow: bool) -> Self {
        self.allow_animation = allow;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.boxes < 1 {
            return Err(Error::config("grid noise needs at least one box per axis"));
        }
        Ok(())
    }
}

/// Piecewise-constant noise over a toroidal `boxes^D` grid, values in `[0, 1)`.
pub struct GridNoise<const D: usize> {
    boxes: usize,
    seed: u64,
    allow_animation: bool,
    rng: StdRng,
}

pub type GridNoise2D = GridNoise<2>;
pub type GridNoise3D = GridNoise<3>;

impl<const D: usize> GridNoise<D> {
    pub fn new(config: &GridNoiseConfig, rng: &mut dyn RngCore) -> Result<Self> {
        config.validate()?;
        if !(2..=3).contains(&D) {
            return Err(Error::config(format!(
                "grid noise supports 2 or 3 dimensions, not {D}"
            )));
        }
        let seed = rng.next_u64();
        Ok(Self {
            boxes: config.boxes,
            seed,
            allow_animation: config.allow_animation,
            rng: StdRng::seed_from_u64(rng.next_u64()),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn box_index(&self, p: &[f32]) -> u64 {
        let mut index = 0u64;
        for &c in p.iter().rev() {
            let b = ((wrap_unit(c) * self.boxes as f32) as usize).min(self.boxes - 1);
            index = index * self.boxes as u64 + b as u64;
        }
        index
    }
}

impl<const D: usize> Texture for GridNoise<D> {
    fn channels(&self) -> usize {
        1
    }

    fn space_dims(&self) -> usize {
        D
    }

    fn evaluate(&self, points: &Batch) -> Result<Batch> {
        if points.width() != D {
            return Err(Error::shape(format!(
                "grid noise expects {D}D points, got width {}",
                points.width()
            )));
        }
        let mut out = Batch::filled(points.shape(), 1, 0.0);
        for (p, o) in points.rows().zip(out.rows_mut()) {
            o[0] = hash01(self.seed, self.box_index(p));
        }
        Ok(out)
    }

    fn step_frame(&mut self) {
        if self.allow_animation {
            self.seed = self.rng.next_u64();
        }
    }
}
