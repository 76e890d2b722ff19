//! Spatial grid index for Worley noise.
//!
//! The base unit square (or cube) is partitioned into equal cells, each holding a small
//! random set of moving points. All coordinates live on a torus: queries are wrapped into
//! `[0, 1)` and distances are measured the short way around.
//!
//! Points never leave the cell they were generated in. Animation clamps them against the
//! cell's static bounds instead of migrating them to a neighbor, so cell membership is
//! fixed for the lifetime of the grid. This trades physical realism for a grid that never
//! needs rebalancing.
//!
//! # Neighbor search
//!
//! A query always scans the cell containing it and its `3^D - 1` toroidal neighbors. That
//! window alone is not guaranteed to contain the nearest point: a point in the query's own
//! cell can be up to a cell diagonal away while a point two cells over can be just over a
//! cell side away. [`NeighborSearch::Exact`] closes the gap by widening the scan ring by
//! ring until no unscanned cell can beat the best distance found; in practice the first
//! ring almost always suffices. [`NeighborSearch::Fixed`] stops at the first window.
use std::ops::{Range, RangeInclusive};

use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geom::{looping_delta, wrap_unit, Bounds};
use crate::metric::DistanceMetric;
use crate::noise::{rand01, rand_inclusive, random_vector};

/// How far the nearest-point query scans beyond the `3^D` neighborhood.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NeighborSearch {
    /// Scan the neighborhood, then widen while unscanned cells could still hold a closer point.
    #[default]
    Exact,
    /// Scan only the `3^D` neighborhood.
    Fixed,
}

/// A moving point owned by one grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellPoint<const D: usize> {
    pub position: [f32; D],
    pub velocity: [f32; D],
}

#[derive(Clone, Debug)]
struct GridCell<const D: usize> {
    bounds: Bounds<D>,
    points: Range<usize>,
}

/// Toroidal grid of cells with a fixed set of points per cell.
#[derive(Clone, Debug)]
pub struct CellGrid<const D: usize> {
    dims: [usize; D],
    cell_size: [f32; D],
    cells: Vec<GridCell<D>>,
    points: Vec<CellPoint<D>>,
    search: NeighborSearch,
}

impl<const D: usize> CellGrid<D> {
    /// Generates a grid of `dims` cells (x axis first) with a uniform random number of
    /// points in `points_per_cell` per cell.
    ///
    /// Point positions are uniform within their cell; initial velocities have a uniform
    /// random direction and a magnitude uniform in `[0, max_speed]`.
    pub fn generate(
        dims: [usize; D],
        points_per_cell: RangeInclusive<usize>,
        max_speed: f32,
        search: NeighborSearch,
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        if D == 0 {
            return Err(Error::config("cell grid needs at least one dimension"));
        }
        if let Some(axis) = dims.iter().position(|&n| n < 1) {
            return Err(Error::config(format!(
                "grid must have at least one cell along axis {axis}"
            )));
        }
        let (min_pts, max_pts) = (*points_per_cell.start(), *points_per_cell.end());
        if min_pts < 1 {
            return Err(Error::config("cells need at least one point"));
        }
        if max_pts < min_pts {
            return Err(Error::config(format!(
                "max points per cell ({max_pts}) is below min points per cell ({min_pts})"
            )));
        }

        let mut cell_size = [0.0; D];
        for a in 0..D {
            cell_size[a] = 1.0 / dims[a] as f32;
        }

        let cell_count: usize = dims.iter().product();
        let mut cells = Vec::with_capacity(cell_count);
        let mut points = Vec::with_capacity(cell_count * min_pts);

        for index in 0..cell_count {
            let coords = decode_index(index, &dims);
            let mut bounds = Bounds {
                min: [0.0; D],
                max: [0.0; D],
            };
            for a in 0..D {
                bounds.min[a] = coords[a] as f32 / dims[a] as f32;
                bounds.max[a] = (coords[a] + 1) as f32 / dims[a] as f32;
            }

            let start = points.len();
            let count = rand_inclusive(rng, min_pts, max_pts);
            for _ in 0..count {
                let mut position = [0.0; D];
                for a in 0..D {
                    let t = rand01(rng);
                    position[a] = bounds.min[a] + t * (bounds.max[a] - bounds.min[a]);
                }
                let speed = rand01(rng) * max_speed;
                let velocity = random_vector::<D>(rng, speed);
                points.push(CellPoint { position, velocity });
            }
            cells.push(GridCell {
                bounds,
                points: start..points.len(),
            });
        }

        debug!(
            cells = cells.len(),
            points = points.len(),
            dims = ?dims,
            "generated cell grid"
        );

        Ok(Self {
            dims,
            cell_size,
            cells,
            points,
            search,
        })
    }

    /// Number of cells along each axis.
    pub fn dims(&self) -> [usize; D] {
        self.dims
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn search(&self) -> NeighborSearch {
        self.search
    }

    /// All points, grouped by cell.
    pub fn points(&self) -> &[CellPoint<D>] {
        &self.points
    }

    /// Static bounds and current points of every cell.
    pub fn cells(&self) -> impl Iterator<Item = (&Bounds<D>, &[CellPoint<D>])> + '_ {
        self.cells
            .iter()
            .map(|c| (&c.bounds, &self.points[c.points.clone()]))
    }

    /// Cell coordinates containing a position already wrapped into `[0, 1)`.
    fn cell_coords(&self, p: &[f32; D]) -> [usize; D] {
        let mut out = [0; D];
        for a in 0..D {
            let c = (p[a] * self.dims[a] as f32).floor() as usize;
            out[a] = c.min(self.dims[a] - 1);
        }
        out
    }

    fn wrapped_index(&self, center: &[usize; D], offset: &[isize; D]) -> usize {
        let mut index = 0;
        let mut stride = 1;
        for a in 0..D {
            let n = self.dims[a] as isize;
            let c = (center[a] as isize + offset[a]).rem_euclid(n) as usize;
            index += c * stride;
            stride *= self.dims[a];
        }
        index
    }

    fn scan_cell(
        &self,
        index: usize,
        q: &[f32; D],
        metric: &dyn DistanceMetric,
        deltas: &mut [f32; D],
        best: &mut f32,
    ) {
        for point in &self.points[self.cells[index].points.clone()] {
            for a in 0..D {
                deltas[a] = looping_delta(q[a], point.position[a]);
            }
            let d = metric.distance(&deltas[..]);
            if d < *best {
                *best = d;
            }
        }
    }

    fn scan_ring(
        &self,
        radius: usize,
        center: &[usize; D],
        q: &[f32; D],
        metric: &dyn DistanceMetric,
        deltas: &mut [f32; D],
        best: &mut f32,
    ) {
        for_each_shell_offset::<D>(radius, |offset| {
            let index = self.wrapped_index(center, offset);
            self.scan_cell(index, q, metric, deltas, best);
        });
    }

    /// `true` once rings up to `radius` have visited every cell.
    fn covered(&self, radius: usize) -> bool {
        self.dims.iter().all(|&n| 2 * radius + 1 >= n)
    }

    /// Smallest metric value any point outside rings `0..=radius` can produce.
    fn lower_bound(
        &self,
        radius: usize,
        center: &[usize; D],
        q: &[f32; D],
        metric: &dyn DistanceMetric,
    ) -> f32 {
        let bounds = &self.cells[self.wrapped_index(center, &[0; D])].bounds;
        let mut bound = f32::INFINITY;
        let mut deltas = [0.0; D];
        for a in 0..D {
            if 2 * radius + 1 >= self.dims[a] {
                continue;
            }
            let face = (q[a] - bounds.min[a]).min(bounds.max[a] - q[a]).max(0.0);
            deltas[a] = radius as f32 * self.cell_size[a] + face;
            bound = bound.min(metric.distance(&deltas));
            deltas[a] = 0.0;
        }
        bound
    }

    /// Metric value to the nearest point from `query`, which may lie anywhere in space.
    pub fn nearest(&self, query: &[f32; D], metric: &dyn DistanceMetric) -> f32 {
        let q = query.map(wrap_unit);
        let center = self.cell_coords(&q);
        let mut best = f32::INFINITY;
        let mut deltas = [0.0; D];

        self.scan_ring(0, &center, &q, metric, &mut deltas, &mut best);
        self.scan_ring(1, &center, &q, metric, &mut deltas, &mut best);

        if self.search == NeighborSearch::Exact {
            let mut radius = 1;
            while !self.covered(radius) && best > self.lower_bound(radius, &center, &q, metric) {
                radius += 1;
                self.scan_ring(radius, &center, &q, metric, &mut deltas, &mut best);
            }
        }
        best
    }

    /// Reference nearest-point query that scans every point in the grid.
    pub fn nearest_brute_force(&self, query: &[f32; D], metric: &dyn DistanceMetric) -> f32 {
        let q = query.map(wrap_unit);
        let mut deltas = [0.0; D];
        let mut best = f32::INFINITY;
        for index in 0..self.cells.len() {
            self.scan_cell(index, &q, metric, &mut deltas, &mut best);
        }
        best
    }

    /// Advances every point by one frame.
    ///
    /// Each point draws a random acceleration (uniform direction, magnitude uniform in
    /// `[0, max_accel]`), its speed is capped at `max_speed`, it moves by its velocity, and
    /// is then clamped into its own cell with the outward velocity component zeroed.
    pub fn step(&mut self, rng: &mut dyn RngCore, max_speed: f32, max_accel: f32) {
        for cell in &self.cells {
            for point in &mut self.points[cell.points.clone()] {
                let magnitude = rand01(rng) * max_accel;
                let accel = random_vector::<D>(rng, magnitude);
                for a in 0..D {
                    point.velocity[a] += accel[a];
                }

                let speed = point.velocity.iter().map(|v| v * v).sum::<f32>().sqrt();
                if speed > max_speed && speed > 0.0 {
                    let k = max_speed / speed;
                    for v in point.velocity.iter_mut() {
                        *v *= k;
                    }
                }

                for a in 0..D {
                    point.position[a] += point.velocity[a];
                }
                cell.bounds
                    .clamp_point_velocity(&mut point.position, &mut point.velocity);
            }
        }
    }
}

fn decode_index<const D: usize>(mut index: usize, dims: &[usize; D]) -> [usize; D] {
    let mut out = [0; D];
    for a in 0..D {
        out[a] = index % dims[a];
        index /= dims[a];
    }
    out
}

/// Calls `f` for every offset in `[-r, r]^D` whose largest component magnitude is exactly `r`.
fn for_each_shell_offset<const D: usize>(radius: usize, mut f: impl FnMut(&[isize; D])) {
    let side = 2 * radius + 1;
    let total = side.pow(D as u32);
    let r = radius as isize;
    let mut offset = [0isize; D];
    for k in 0..total {
        let mut rest = k;
        let mut on_shell = false;
        for o in offset.iter_mut() {
            *o = (rest % side) as isize - r;
            rest /= side;
            on_shell |= o.abs() == r;
        }
        if on_shell {
            f(&offset);
        }
    }
}
