use tracing::debug;

use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::render::grid::EvalGrid;
use crate::render::SampleFormat;
use crate::texture::Tex;

/// Evaluated pixels, row-major from the top-left corner, `channels` values per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub format: SampleFormat,
    pub data: Vec<f32>,
}

impl Image {
    pub(crate) fn from_values(
        width: usize,
        height: usize,
        format: SampleFormat,
        values: Batch,
    ) -> Result<Self> {
        if values.len() != width * height {
            return Err(Error::shape(format!(
                "{} values cannot fill a {width} x {height} image",
                values.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels: values.width(),
            format,
            data: values.into_data(),
        })
    }

    /// Channel values of the pixel at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[f32]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * self.channels;
        Some(&self.data[start..start + self.channels])
    }

    /// Serialized size of one frame.
    pub fn byte_len(&self) -> usize {
        self.data.len() * self.format.bytes_per_sample()
    }

    /// Raw little-endian samples in [`Image::format`], ready for an encoder pipe.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for &v in &self.data {
            self.format.write_le(v, &mut out);
        }
        out
    }
}

/// Evaluates `tex` over a planar grid at the current frame.
pub fn render_image(tex: &Tex, grid: &EvalGrid) -> Result<Image> {
    if grid.depth() != 1 {
        return Err(Error::config(format!(
            "images need a planar grid, got {} slices",
            grid.depth()
        )));
    }
    let values = tex.evaluate(grid.points())?;
    debug!(
        width = grid.width(),
        height = grid.height(),
        channels = tex.channels(),
        "rendered image"
    );
    Image::from_values(grid.width(), grid.height(), tex.sample_format(), values)
}
