//! Channel restriction, replication and concatenation.
use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::texture::Tex;
use crate::transform::{single, Transform};

/// Builds a texture whose channel `i` is `src` channel `indices[i]`.
///
/// Indices may repeat or reorder, so this covers restriction as well as replication.
pub fn select_channels(src: &Tex, indices: &[usize]) -> Result<Tex> {
    if indices.is_empty() {
        return Err(Error::config("select at least one channel"));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i >= src.channels()) {
        return Err(Error::shape(format!(
            "channel {bad} is out of range for a {} channel texture",
            src.channels()
        )));
    }

    let indices = indices.to_vec();
    let width = indices.len();
    Transform::new(width, src.space_dims())
        .with_source(src.clone())
        .build(move |values| {
            let input = single(values)?;
            let mut out = Batch::filled(input.shape(), width, 0.0);
            for (row, o) in input.rows().zip(out.rows_mut()) {
                for (dst, &i) in o.iter_mut().zip(&indices) {
                    *dst = row[i];
                }
            }
            Ok(out)
        })
}

/// Replicates a one-channel texture into `channels` identical channels.
pub fn broadcast_channels(src: &Tex, channels: usize) -> Result<Tex> {
    if src.channels() != 1 {
        return Err(Error::shape(format!(
            "only single-channel textures can be broadcast, got {} channels",
            src.channels()
        )));
    }
    select_channels(src, &vec![0; channels])
}

/// Stacks the channels of `sources`, in order.
pub fn concat_channels(sources: &[Tex]) -> Result<Tex> {
    let Some(first) = sources.first() else {
        return Err(Error::config("concatenation needs at least one source"));
    };
    let space_dims = first.space_dims();
    if let Some(s) = sources.iter().find(|s| s.space_dims() != space_dims) {
        return Err(Error::shape(format!(
            "cannot concatenate {}D and {}D textures",
            space_dims,
            s.space_dims()
        )));
    }

    let width: usize = sources.iter().map(Tex::channels).sum();
    Transform::new(width, space_dims)
        .with_sources(sources.iter().cloned())
        .build(move |values| {
            let Some(shape) = values.first().map(|b| b.shape().to_vec()) else {
                return Err(Error::shape("concatenation has no source values"));
            };
            let mut out = Batch::filled(&shape, width, 0.0);
            let mut start = 0;
            for v in &values {
                let w = v.width();
                for (row, o) in v.rows().zip(out.rows_mut()) {
                    o[start..start + w].copy_from_slice(row);
                }
                start += w;
            }
            Ok(out)
        })
}
