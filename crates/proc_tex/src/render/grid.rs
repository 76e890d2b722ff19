use glam::{Vec2, Vec3};

use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::geom::{Cuboid, Rect};

/// Precomputed evaluation points, one per pixel center.
///
/// Row 0 is the top of the image, so increasing row index walks toward the region's
/// minimum y. The batch shape is `[height, width]` for planar grids and
/// `[depth, height, width]` for volumes.
#[derive(Clone, Debug)]
pub struct EvalGrid {
    width: usize,
    height: usize,
    depth: usize,
    points: Batch,
}

fn check_size(width: usize, height: usize, depth: usize) -> Result<()> {
    if width == 0 || height == 0 || depth == 0 {
        return Err(Error::config(format!(
            "pixel grid must be non-empty, got {width} x {height} x {depth}"
        )));
    }
    Ok(())
}

#[inline]
fn pixel_center(i: usize, n: usize) -> f32 {
    (i as f32 + 0.5) / n as f32
}

impl EvalGrid {
    /// 2D points covering `region`.
    pub fn planar(width: usize, height: usize, region: Rect) -> Result<Self> {
        check_size(width, height, 1)?;
        region.validate()?;
        let mut data = Vec::with_capacity(width * height * 2);
        for row in 0..height {
            let y = region.max.y - pixel_center(row, height) * region.height();
            for col in 0..width {
                let x = region.min.x + pixel_center(col, width) * region.width();
                data.extend_from_slice(&Vec2::new(x, y).to_array());
            }
        }
        Ok(Self {
            width,
            height,
            depth: 1,
            points: Batch::new(vec![height, width], 2, data)?,
        })
    }

    /// 3D points covering `region` at constant depth `z`, for rendering 3D textures.
    pub fn planar_slice(width: usize, height: usize, region: Rect, z: f32) -> Result<Self> {
        let flat = Self::planar(width, height, region)?;
        let mut data = Vec::with_capacity(width * height * 3);
        for p in flat.points.rows() {
            data.extend_from_slice(&[p[0], p[1], z]);
        }
        Ok(Self {
            points: Batch::new(vec![height, width], 3, data)?,
            ..flat
        })
    }

    /// 3D points covering `region`, `depth` slices from its minimum z upward.
    pub fn volume(width: usize, height: usize, depth: usize, region: Cuboid) -> Result<Self> {
        check_size(width, height, depth)?;
        region.validate()?;
        let extent = region.extent();
        let mut data = Vec::with_capacity(width * height * depth * 3);
        for layer in 0..depth {
            let z = region.min.z + pixel_center(layer, depth) * extent.z;
            for row in 0..height {
                let y = region.max.y - pixel_center(row, height) * extent.y;
                for col in 0..width {
                    let x = region.min.x + pixel_center(col, width) * extent.x;
                    data.extend_from_slice(&Vec3::new(x, y, z).to_array());
                }
            }
        }
        Ok(Self {
            width,
            height,
            depth,
            points: Batch::new(vec![depth, height, width], 3, data)?,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn space_dims(&self) -> usize {
        self.points.width()
    }

    pub fn points(&self) -> &Batch {
        &self.points
    }
}
