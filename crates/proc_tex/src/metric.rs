//! Distance metrics for cellular noise.
//!
//! A metric receives the absolute per-axis deltas between an evaluation point and a cell
//! point and returns a scalar. Metrics are expected to be monotonically non-decreasing in
//! every delta and isotropic (permuting the deltas does not change the result); the
//! nearest-point search in [`crate::noise::cell_grid`] relies on both properties.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A pluggable distance function over absolute axis deltas.
pub trait DistanceMetric {
    fn distance(&self, deltas: &[f32]) -> f32;
}

impl<F> DistanceMetric for F
where
    F: Fn(&[f32]) -> f32,
{
    #[inline]
    fn distance(&self, deltas: &[f32]) -> f32 {
        self(deltas)
    }
}

/// Built-in metrics.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Sum of squared deltas.
    #[default]
    SquaredEuclidean,
    Euclidean,
    Manhattan,
    Chebyshev,
}

impl DistanceMetric for Metric {
    #[inline]
    fn distance(&self, deltas: &[f32]) -> f32 {
        match self {
            Metric::SquaredEuclidean => deltas.iter().map(|d| d * d).sum(),
            Metric::Euclidean => deltas.iter().map(|d| d * d).sum::<f32>().sqrt(),
            Metric::Manhattan => deltas.iter().map(|d| d.abs()).sum(),
            Metric::Chebyshev => deltas.iter().fold(0.0, |acc, d| acc.max(d.abs())),
        }
    }
}
