//! Animated Worley cellular noise.
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::metric::{DistanceMetric, Metric};
use crate::noise::cell_grid::{CellGrid, NeighborSearch};
use crate::texture::Texture;

/// Configuration for [`CellNoise`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub struct CellNoiseConfig {
    /// Cells along x.
    pub columns: usize,
    /// Cells along y.
    pub rows: usize,
    /// Cells along z. Only used by 3D noise.
    pub layers: usize,
    pub min_points_per_cell: usize,
    pub max_points_per_cell: usize,
    pub metric: Metric,
    /// Maximum point speed in space units per frame.
    pub point_max_speed: f32,
    /// Maximum point acceleration in space units per frame squared.
    pub point_max_accel: f32,
    /// When `false`, stepping frames leaves the points where they are.
    pub allow_animation: bool,
    pub search: NeighborSearch,
}

impl Default for CellNoiseConfig {
    fn default() -> Self {
        Self {
            columns: 4,
            rows: 4,
            layers: 1,
            min_points_per_cell: 1,
            max_points_per_cell: 1,
            metric: Metric::SquaredEuclidean,
            point_max_speed: 0.01,
            point_max_accel: 0.005,
            allow_animation: true,
            search: NeighborSearch::Exact,
        }
    }
}

impl CellNoiseConfig {
    /// A `columns x rows` grid for 2D noise.
    pub fn grid(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            ..Default::default()
        }
    }

    /// An `n x n` grid with a fixed number of points per cell.
    pub fn square(n: usize, points_per_cell: usize) -> Self {
        Self::grid(n, n).with_points_per_cell(points_per_cell, points_per_cell)
    }

    /// An `n x n x n` grid with a fixed number of points per cell.
    pub fn cube(n: usize, points_per_cell: usize) -> Self {
        Self::square(n, points_per_cell).with_layers(n)
    }

    pub fn with_layers(mut self, layers: usize) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_points_per_cell(mut self, min: usize, max: usize) -> Self {
        self.min_points_per_cell = min;
        self.max_points_per_cell = max;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_point_max_speed(mut self, speed: f32) -> Self {
        self.point_max_speed = speed;
        self
    }

    pub fn with_point_max_accel(mut self, accel: f32) -> Self {
        self.point_max_accel = accel;
        self
    }

    pub fn with_animation(mut self, allow: bool) -> Self {
        self.allow_animation = allow;
        self
    }

    pub fn with_search(mut self, search: NeighborSearch) -> Self {
        self.search = search;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    ///
    /// `layers` only matters for 3D noise and is checked when a 3D generator is built.
    pub fn validate(&self) -> Result<()> {
        if self.columns < 1 || self.rows < 1 {
            return Err(Error::config(format!(
                "grid dimensions must be >= 1, got {} x {}",
                self.columns, self.rows
            )));
        }
        if self.min_points_per_cell < 1 {
            return Err(Error::config("min_points_per_cell must be >= 1"));
        }
        if self.max_points_per_cell < self.min_points_per_cell {
            return Err(Error::config(
                "max_points_per_cell must be >= min_points_per_cell",
            ));
        }
        if !(self.point_max_speed.is_finite() && self.point_max_speed >= 0.0) {
            return Err(Error::config("point_max_speed must be finite and >= 0"));
        }
        if !(self.point_max_accel.is_finite() && self.point_max_accel >= 0.0) {
            return Err(Error::config("point_max_accel must be finite and >= 0"));
        }
        Ok(())
    }

    fn dims<const D: usize>(&self) -> Result<[usize; D]> {
        let all = [self.columns, self.rows, self.layers];
        match D {
            2 => {
                if self.layers != 1 {
                    warn!("layers = {} is ignored by 2D cell noise.", self.layers);
                }
            }
            3 => {
                if self.layers < 1 {
                    return Err(Error::config("3D cell noise needs layers >= 1"));
                }
            }
            _ => {
                return Err(Error::config(format!(
                    "cell noise supports 2 or 3 dimensions, not {D}"
                )))
            }
        }
        let mut out = [0; D];
        out.copy_from_slice(&all[..D]);
        Ok(out)
    }
}

/// Worley cellular noise: the metric to the nearest cell point, one channel.
///
/// Values are consistent within a frame since point positions are stored. Each instance
/// owns an RNG derived from the one passed at construction, so a seed reproduces both the
/// initial grid and every later frame.
pub struct CellNoise<const D: usize> {
    grid: CellGrid<D>,
    metric: Box<dyn DistanceMetric>,
    point_max_speed: f32,
    point_max_accel: f32,
    allow_animation: bool,
    rng: StdRng,
}

pub type CellNoise2D = CellNoise<2>;
pub type CellNoise3D = CellNoise<3>;

impl<const D: usize> CellNoise<D> {
    /// Builds the noise with the configured built-in metric.
    pub fn new(config: &CellNoiseConfig, rng: &mut dyn RngCore) -> Result<Self> {
        Self::with_metric(config, config.metric, rng)
    }

    /// Builds the noise with a custom metric; `config.metric` is ignored.
    pub fn with_metric<M>(config: &CellNoiseConfig, metric: M, rng: &mut dyn RngCore) -> Result<Self>
    where
        M: DistanceMetric + 'static,
    {
        config.validate()?;
        let dims = config.dims::<D>()?;
        let grid = CellGrid::generate(
            dims,
            config.min_points_per_cell..=config.max_points_per_cell,
            config.point_max_speed,
            config.search,
            rng,
        )?;
        Ok(Self {
            grid,
            metric: Box::new(metric),
            point_max_speed: config.point_max_speed,
            point_max_accel: config.point_max_accel,
            allow_animation: config.allow_animation,
            rng: StdRng::seed_from_u64(rng.next_u64()),
        })
    }

    pub fn grid(&self) -> &CellGrid<D> {
        &self.grid
    }

    /// Metric to the nearest cell point from a single position.
    pub fn nearest(&self, p: &[f32; D]) -> f32 {
        self.grid.nearest(p, self.metric.as_ref())
    }
}

impl<const D: usize> Texture for CellNoise<D> {
    fn channels(&self) -> usize {
        1
    }

    fn space_dims(&self) -> usize {
        D
    }

    fn evaluate(&self, points: &Batch) -> Result<Batch> {
        let mut out = Batch::filled(points.shape(), 1, 0.0);
        for (p, o) in points.rows().zip(out.rows_mut()) {
            let p: [f32; D] = p.try_into().map_err(|_| {
                Error::shape(format!("cell noise expects {D}D points, got width {}", p.len()))
            })?;
            o[0] = self.nearest(&p);
        }
        Ok(out)
    }

    fn step_frame(&mut self) {
        if self.allow_animation {
            self.grid
                .step(&mut self.rng, self.point_max_speed, self.point_max_accel);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn noise2(config: &CellNoiseConfig, seed: u64) -> CellNoise2D {
        let mut rng = StdRng::seed_from_u64(seed);
        CellNoise::new(config, &mut rng).unwrap()
    }

    #[test]
    fn config_validation_rejects_bad_values() {
        let mut rng = StdRng::seed_from_u64(0);
        for cfg in [
            CellNoiseConfig::grid(0, 3),
            CellNoiseConfig::grid(3, 3).with_points_per_cell(0, 2),
            CellNoiseConfig::grid(3, 3).with_points_per_cell(3, 2),
            CellNoiseConfig::grid(3, 3).with_point_max_speed(-1.0),
        ] {
            assert!(matches!(
                CellNoise2D::new(&cfg, &mut rng),
                Err(Error::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn layers_only_constrain_3d_noise() {
        let flat = CellNoiseConfig::grid(3, 3).with_layers(0);
        assert!(flat.validate().is_ok());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(CellNoise2D::new(&flat, &mut rng).is_ok());
        assert!(matches!(
            CellNoise3D::new(&flat, &mut rng),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn evaluation_is_periodic() {
        let noise = noise2(&CellNoiseConfig::grid(5, 4).with_points_per_cell(1, 3), 21);
        let pts = Batch::from_rows(&[
            [0.3, 0.7],
            [1.3, 0.7],
            [0.3, 1.7],
            [-0.7, -0.3],
        ]);
        let out = noise.evaluate(&pts).unwrap();
        let v = out.data();
        for w in &v[1..] {
            assert!((w - v[0]).abs() < 1e-5, "{v:?}");
        }
    }

    #[test]
    fn same_seed_reproduces_grid_and_animation() {
        let cfg = CellNoiseConfig::square(4, 2);
        let mut a = noise2(&cfg, 99);
        let mut b = noise2(&cfg, 99);
        assert_eq!(a.grid().points(), b.grid().points());
        for _ in 0..5 {
            a.step_frame();
            b.step_frame();
        }
        assert_eq!(a.grid().points(), b.grid().points());
    }

    #[test]
    fn disabled_animation_freezes_points() {
        let mut noise = noise2(&CellNoiseConfig::square(3, 1).with_animation(false), 5);
        let before = noise.grid().points().to_vec();
        noise.step_frame();
        assert_eq!(noise.grid().points(), &before[..]);
    }

    #[test]
    fn custom_metric_is_used() {
        let cfg = CellNoiseConfig::square(1, 1);
        let mut rng = StdRng::seed_from_u64(3);
        let noise = CellNoise2D::with_metric(&cfg, |_: &[f32]| 42.0, &mut rng).unwrap();
        assert_eq!(noise.nearest(&[0.1, 0.2]), 42.0);
    }

    #[test]
    fn three_dimensional_noise_uses_layers() {
        let mut rng = StdRng::seed_from_u64(8);
        let noise = CellNoise3D::new(&CellNoiseConfig::cube(3, 1), &mut rng).unwrap();
        assert_eq!(noise.grid().dims(), [3, 3, 3]);
        assert_eq!(noise.space_dims(), 3);
        let out = noise
            .evaluate(&Batch::from_rows(&[[0.5, 0.5, 0.5]]))
            .unwrap();
        assert!(out.data()[0] >= 0.0);
    }
}
