use std::path::Path;

use anyhow::{bail, Context};
use image::{ImageBuffer, Luma, Rgb, Rgba};
use proc_tex::render::{Image, SampleFormat};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Writes a 1, 3 or 4 channel `U8` or `U16` image as PNG.
pub fn save_png(img: &Image, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let (w, h) = (img.width as u32, img.height as u32);

    macro_rules! save {
        ($pixel:ident, $ty:ty) => {{
            let samples: Vec<$ty> = img.data.iter().map(|v| *v as $ty).collect();
            let buf: ImageBuffer<$pixel<$ty>, Vec<$ty>> = ImageBuffer::from_raw(w, h, samples)
                .context("sample count does not match image size")?;
            buf.save(path)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
        }};
    }

    match (img.channels, img.format) {
        (1, SampleFormat::U8) => save!(Luma, u8),
        (1, SampleFormat::U16) => save!(Luma, u16),
        (3, SampleFormat::U8) => save!(Rgb, u8),
        (3, SampleFormat::U16) => save!(Rgb, u16),
        (4, SampleFormat::U8) => save!(Rgba, u8),
        (4, SampleFormat::U16) => save!(Rgba, u16),
        (c, f) => bail!("cannot save a {c} channel {f:?} image as PNG; convert with to_sample_format first"),
    }

    info!("Saved {}", path.display());
    Ok(())
}
