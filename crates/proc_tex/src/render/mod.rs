//! Rendering driver: pixel grids in, images and video frames out.
//!
//! - [`EvalGrid`] precomputes one evaluation point per pixel center.
//! - [`render_image`] evaluates a texture once into an [`Image`].
//! - [`render_video`] streams successive frames to a [`crate::encode::FrameSink`].
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod grid;
pub mod image;
pub mod video;

pub use grid::EvalGrid;
pub use image::{render_image, Image};
pub use video::{render_video, VideoConfig};

/// Storage type of texture values once they leave the graph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    #[default]
    F32,
    U8,
    U16,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::F32 => 4,
            SampleFormat::U8 => 1,
            SampleFormat::U16 => 2,
        }
    }

    /// Truncates and saturates `v` into the format's range. `F32` passes values through.
    #[inline]
    pub fn quantize(self, v: f32) -> f32 {
        let max = match self {
            SampleFormat::F32 => return v,
            SampleFormat::U8 => u8::MAX as f32,
            SampleFormat::U16 => u16::MAX as f32,
        };
        if v.is_nan() {
            return 0.0;
        }
        v.trunc().clamp(0.0, max)
    }

    /// Appends `v` in little-endian encoding.
    #[inline]
    pub fn write_le(self, v: f32, out: &mut Vec<u8>) {
        match self {
            SampleFormat::F32 => out.extend_from_slice(&v.to_le_bytes()),
            SampleFormat::U8 => out.push(self.quantize(v) as u8),
            SampleFormat::U16 => out.extend_from_slice(&(self.quantize(v) as u16).to_le_bytes()),
        }
    }
}

/// ffmpeg `pix_fmt` name for raw frames with `channels` samples of `format` per pixel.
pub fn pixel_format(channels: usize, format: SampleFormat) -> Result<&'static str> {
    let name = match (channels, format) {
        (1, SampleFormat::U8) => "gray",
        (1, SampleFormat::U16) => "gray16le",
        (1, SampleFormat::F32) => "grayf32le",
        (3, SampleFormat::U8) => "rgb24",
        (3, SampleFormat::U16) => "rgb48le",
        (4, SampleFormat::U8) => "rgba",
        (4, SampleFormat::U16) => "rgba64le",
        _ => {
            return Err(Error::config(format!(
                "no raw pixel format for {channels} channel {format:?} frames"
            )))
        }
    };
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_truncates_and_saturates() {
        assert_eq!(SampleFormat::U8.quantize(12.9), 12.0);
        assert_eq!(SampleFormat::U8.quantize(300.0), 255.0);
        assert_eq!(SampleFormat::U16.quantize(-4.0), 0.0);
        assert_eq!(SampleFormat::U16.quantize(f32::NAN), 0.0);
        assert_eq!(SampleFormat::F32.quantize(-4.5), -4.5);
    }

    #[test]
    fn little_endian_encoding() {
        let mut out = Vec::new();
        SampleFormat::U16.write_le(258.0, &mut out);
        SampleFormat::U8.write_le(7.0, &mut out);
        SampleFormat::F32.write_le(1.0, &mut out);
        assert_eq!(out, vec![2, 1, 7, 0, 0, 0x80, 0x3f]);
    }

    #[test]
    fn pixel_formats() {
        assert_eq!(pixel_format(1, SampleFormat::U16).unwrap(), "gray16le");
        assert_eq!(pixel_format(3, SampleFormat::U8).unwrap(), "rgb24");
        assert_eq!(pixel_format(4, SampleFormat::U16).unwrap(), "rgba64le");
        assert!(matches!(
            pixel_format(2, SampleFormat::U8),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(pixel_format(3, SampleFormat::F32).is_err());
    }
}
