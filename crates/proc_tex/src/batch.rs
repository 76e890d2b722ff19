//! Dense N-dimensional batches of points and values.
//!
//! A [`Batch`] is a row-major array of shape `[...prefix..., width]`. For evaluation points
//! the width is the number of space dimensions; for evaluated values it is the channel
//! count. Textures map a point batch to a value batch with the same prefix.
use std::slice::{ChunksExact, ChunksExactMut};

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    shape: Vec<usize>,
    width: usize,
    data: Vec<f32>,
}

impl Batch {
    /// Creates a batch, validating that `data` holds exactly `prod(shape) * width` values.
    pub fn new(shape: Vec<usize>, width: usize, data: Vec<f32>) -> Result<Self> {
        if width == 0 {
            return Err(Error::shape("batch width must be at least 1"));
        }
        let expected = shape.iter().product::<usize>() * width;
        if data.len() != expected {
            return Err(Error::shape(format!(
                "batch of shape {shape:?} x {width} needs {expected} values, got {}",
                data.len()
            )));
        }
        Ok(Self { shape, width, data })
    }

    /// Creates a batch with every value set to `value`.
    pub fn filled(shape: &[usize], width: usize, value: f32) -> Self {
        let width = width.max(1);
        let len = shape.iter().product::<usize>() * width;
        Self {
            shape: shape.to_vec(),
            width,
            data: vec![value; len],
        }
    }

    /// Creates a one-dimensional batch from fixed-size rows.
    pub fn from_rows<const N: usize>(rows: &[[f32; N]]) -> Self {
        Self {
            shape: vec![rows.len()],
            width: N.max(1),
            data: rows.iter().flatten().copied().collect(),
        }
    }

    /// Leading dimensions, excluding the last one.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Size of the last dimension.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows, i.e. the product of the leading dimensions.
    pub fn len(&self) -> usize {
        self.data.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    pub fn rows(&self) -> ChunksExact<'_, f32> {
        self.data.chunks_exact(self.width)
    }

    pub fn rows_mut(&mut self) -> ChunksExactMut<'_, f32> {
        self.data.chunks_exact_mut(self.width)
    }

    /// `true` when both batches share the same leading dimensions.
    pub fn same_prefix(&self, other: &Batch) -> bool {
        self.shape == other.shape
    }

    /// Minimum and maximum over all values, or `None` for an empty batch.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut it = self.data.iter().copied();
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_length() {
        assert!(Batch::new(vec![2, 3], 2, vec![0.0; 12]).is_ok());
        let err = Batch::new(vec![2, 3], 2, vec![0.0; 11]).expect_err("short data");
        assert!(matches!(err, Error::ShapeMismatch(_)));
        assert!(Batch::new(vec![1], 0, Vec::new()).is_err());
    }

    #[test]
    fn rows_follow_row_major_layout() {
        let b = Batch::from_rows(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        assert_eq!(b.shape(), &[3]);
        assert_eq!(b.len(), 3);
        assert_eq!(b.row(1), &[3.0, 4.0]);
        let sums: Vec<f32> = b.rows().map(|r| r.iter().sum()).collect();
        assert_eq!(sums, vec![3.0, 7.0, 11.0]);
    }

    #[test]
    fn min_max_covers_all_channels() {
        let b = Batch::from_rows(&[[1.0, -2.0], [3.0, 0.5]]);
        assert_eq!(b.min_max(), Some((-2.0, 3.0)));
        let empty = Batch::filled(&[0], 1, 0.0);
        assert!(empty.is_empty());
        assert_eq!(empty.min_max(), None);
    }
}
