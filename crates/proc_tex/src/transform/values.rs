//! Value-domain remaps of a single source.
use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::render::SampleFormat;
use crate::texture::Tex;
use crate::transform::{single, Transform};

/// Applies `f` to every value of `src`.
pub fn map_values<F>(src: &Tex, f: F) -> Tex
where
    F: Fn(f32) -> f32 + 'static,
{
    Transform::new(src.channels(), src.space_dims())
        .with_source(src.clone())
        .build_unchecked(Box::new(move |values| {
            let mut out = single(values)?;
            out.data_mut().iter_mut().for_each(|v| *v = f(*v));
            Ok(out)
        }))
}

/// Affinely maps each evaluated batch so its minimum becomes `min` and its maximum `max`.
///
/// The range is recomputed on every call over all channels together, so successive
/// video frames are normalized independently. A constant batch maps to the midpoint.
pub fn scale_to_region(src: &Tex, min: f32, max: f32) -> Result<Tex> {
    if !(min.is_finite() && max.is_finite()) {
        return Err(Error::config(format!(
            "region bounds must be finite, got [{min}, {max}]"
        )));
    }
    Transform::new(src.channels(), src.space_dims())
        .with_source(src.clone())
        .build(move |values| {
            let mut out = single(values)?;
            rescale(&mut out, min, max);
            Ok(out)
        })
}

fn rescale(batch: &mut Batch, min: f32, max: f32) {
    let Some((lo, hi)) = batch.min_max() else {
        return;
    };
    let span = hi - lo;
    if span == 0.0 {
        let mid = min + (max - min) / 2.0;
        batch.data_mut().iter_mut().for_each(|v| *v = mid);
        return;
    }
    let scale = (max - min) / span;
    let offset = min - lo * scale;
    batch
        .data_mut()
        .iter_mut()
        .for_each(|v| *v = *v * scale + offset);
}

/// Multiplies by `scale` and converts to `format`'s value range, tagging the output.
///
/// Integer formats truncate toward zero and saturate at the type's bounds; NaN becomes 0.
pub fn to_sample_format(src: &Tex, format: SampleFormat, scale: f32) -> Tex {
    Transform::new(src.channels(), src.space_dims())
        .with_source(src.clone())
        .with_sample_format(format)
        .build_unchecked(Box::new(move |values| {
            let mut out = single(values)?;
            out.data_mut()
                .iter_mut()
                .for_each(|v| *v = format.quantize(*v * scale));
            Ok(out)
        }))
}
