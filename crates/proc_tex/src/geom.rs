//! Small geometry helpers: spatial regions, static cell bounds, and toroidal arithmetic.
//!
//! Regions use the math convention (positive y is up). The pixel-space flip happens in
//! [`crate::render`], not here.
use glam::{Vec2, Vec3};
use mint::{Vector2, Vector3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Axis-aligned rectangle in texture space.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Lower-left corner.
    pub min: Vec2,
    /// Upper-right corner.
    pub max: Vec2,
}

impl Rect {
    /// Creates a rectangle from its lower-left and upper-right corners.
    pub fn new(min: impl Into<Vector2<f32>>, max: impl Into<Vector2<f32>>) -> Self {
        let (min, max): (Vector2<f32>, Vector2<f32>) = (min.into(), max.into());
        Self {
            min: Vec2::from(min),
            max: Vec2::from(max),
        }
    }

    /// The base unit square `[0,1] x [0,1]`.
    pub fn unit() -> Self {
        Self::new(Vec2::ZERO, Vec2::ONE)
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Validates that the rectangle has a positive, finite extent on both axes.
    pub fn validate(&self) -> Result<()> {
        let (w, h) = (self.width(), self.height());
        if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            return Err(Error::config(format!(
                "region must have positive width and height, got {w} x {h}"
            )));
        }
        Ok(())
    }
}

/// Axis-aligned cuboid in texture space.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cuboid {
    pub min: Vec3,
    pub max: Vec3,
}

impl Cuboid {
    pub fn new(min: impl Into<Vector3<f32>>, max: impl Into<Vector3<f32>>) -> Self {
        let (min, max): (Vector3<f32>, Vector3<f32>) = (min.into(), max.into());
        Self {
            min: Vec3::from(min),
            max: Vec3::from(max),
        }
    }

    /// The base unit cube.
    pub fn unit() -> Self {
        Self::new(Vec3::ZERO, Vec3::ONE)
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn validate(&self) -> Result<()> {
        let e = self.extent();
        if !e.is_finite() || e.min_element() <= 0.0 {
            return Err(Error::config(format!(
                "region must have positive extent on every axis, got {e}"
            )));
        }
        Ok(())
    }
}

/// Static bounds of a grid cell in `D` dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds<const D: usize> {
    pub min: [f32; D],
    pub max: [f32; D],
}

impl<const D: usize> Bounds<D> {
    pub fn contains(&self, p: &[f32; D]) -> bool {
        (0..D).all(|a| p[a] >= self.min[a] && p[a] <= self.max[a])
    }

    /// Clamps `pos` into the bounds, zeroing any velocity component that still points outward.
    pub fn clamp_point_velocity(&self, pos: &mut [f32; D], vel: &mut [f32; D]) {
        for a in 0..D {
            if pos[a] < self.min[a] {
                pos[a] = self.min[a];
                vel[a] = vel[a].max(0.0);
            }
            if pos[a] > self.max[a] {
                pos[a] = self.max[a];
                vel[a] = vel[a].min(0.0);
            }
        }
    }
}

/// Maps a coordinate into the base interval `[0, 1)` with toroidal wraparound.
#[inline]
pub fn wrap_unit(x: f32) -> f32 {
    let r = x.rem_euclid(1.0);
    // rem_euclid rounds tiny negative inputs up to exactly 1.0
    if r >= 1.0 {
        0.0
    } else {
        r
    }
}

/// Shortest absolute difference between two coordinates in the 1-periodic topology.
/// Both inputs are expected inside the base interval.
#[inline]
pub fn looping_delta(a: f32, b: f32) -> f32 {
    let delta = (a - b).abs();
    if delta > 0.5 {
        1.0 - delta
    } else {
        delta
    }
}

/// Cartesian vector from a magnitude and a direction angle in radians.
#[inline]
pub fn vec2_from_polar(magnitude: f32, direction: f32) -> Vec2 {
    Vec2::new(magnitude * direction.cos(), magnitude * direction.sin())
}

/// Cartesian vector from a magnitude, an azimuth angle, and the cosine of the polar angle.
///
/// Drawing `azimuth` uniformly from `[0, 2pi)` and `cos_polar` uniformly from `[-1, 1]`
/// yields directions uniformly distributed on the sphere.
#[inline]
pub fn vec3_from_spherical(magnitude: f32, azimuth: f32, cos_polar: f32) -> Vec3 {
    let cos_polar = cos_polar.clamp(-1.0, 1.0);
    let sin_polar = (1.0 - cos_polar * cos_polar).sqrt();
    Vec3::new(
        magnitude * sin_polar * azimuth.cos(),
        magnitude * sin_polar * azimuth.sin(),
        magnitude * cos_polar,
    )
}
