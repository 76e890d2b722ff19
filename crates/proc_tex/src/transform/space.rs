//! Space-domain remaps: each helper rewrites the points a source is evaluated at.
use std::f32::consts::{PI, TAU};

use glam::Vec3;
use mint::Vector3;

use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::texture::Tex;
use crate::transform::{single, Transform};

/// Evaluates `src` at `p * scale + offset`.
pub fn affine_space(src: &Tex, scale: &[f32], offset: &[f32]) -> Result<Tex> {
    let dims = src.space_dims();
    if scale.len() != dims || offset.len() != dims {
        return Err(Error::shape(format!(
            "affine map for a {dims}D texture needs {dims} scale and offset values, got {} and {}",
            scale.len(),
            offset.len()
        )));
    }
    let scale = scale.to_vec();
    let offset = offset.to_vec();
    Transform::new(src.channels(), dims)
        .with_source(src.clone())
        .with_space_map(move |points| {
            let mut mapped = points.clone();
            for row in mapped.rows_mut() {
                for ((c, s), o) in row.iter_mut().zip(&scale).zip(&offset) {
                    *c = *c * s + o;
                }
            }
            Ok(vec![mapped])
        })
        .build(single)
}

/// Domain warp: evaluates `src` at `p + offset(p)`.
///
/// `offset` must produce one channel per space dimension of `src`. It is evaluated inside
/// the space map rather than as a source, so it is registered as synced to keep it
/// stepping with the graph.
pub fn offset_by_texture(src: &Tex, offset: &Tex) -> Result<Tex> {
    let dims = src.space_dims();
    if offset.space_dims() != dims || offset.channels() != dims {
        return Err(Error::shape(format!(
            "offset for a {dims}D texture must be a {dims} channel {dims}D texture, got {} channel {}D",
            offset.channels(),
            offset.space_dims()
        )));
    }
    let warp = offset.clone();
    Transform::new(src.channels(), dims)
        .with_source(src.clone())
        .with_synced(offset.clone())
        .with_space_map(move |points| {
            let deltas = warp.evaluate(points)?;
            let mut mapped = points.clone();
            for (p, d) in mapped.rows_mut().zip(deltas.rows()) {
                for (c, dc) in p.iter_mut().zip(d) {
                    *c += dc;
                }
            }
            Ok(vec![mapped])
        })
        .build(single)
}

/// Equirectangular sphere map: a 2D texture whose `(u, v)` in the unit square reads
/// the 3D `src` on a sphere of `radius` around `center`.
///
/// `u` spans longitude `[0, 2pi)`, `v` spans latitude from the south pole (`v = 0`) to the
/// north pole (`v = 1`); +y is the polar axis.
pub fn sphere_map(src: &Tex, radius: f32, center: impl Into<Vector3<f32>>) -> Result<Tex> {
    if src.space_dims() != 3 {
        return Err(Error::shape(format!(
            "sphere map needs a 3D source, got {}D",
            src.space_dims()
        )));
    }
    if !(radius.is_finite() && radius > 0.0) {
        return Err(Error::config(format!(
            "sphere radius must be finite and positive, got {radius}"
        )));
    }
    let center: Vector3<f32> = center.into();
    let center = Vec3::from(center);
    Transform::new(src.channels(), 2)
        .with_source(src.clone())
        .with_space_map(move |points| {
            let mut data = Vec::with_capacity(points.len() * 3);
            for p in points.rows() {
                let lon = TAU * p[0];
                let lat = PI * (p[1] - 0.5);
                let dir = Vec3::new(lat.cos() * lon.cos(), lat.sin(), lat.cos() * lon.sin());
                data.extend_from_slice(&(center + dir * radius).to_array());
            }
            Ok(vec![Batch::new(points.shape().to_vec(), 3, data)?])
        })
        .build(single)
}
