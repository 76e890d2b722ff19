//! Constant-valued texture.
use crate::batch::Batch;
use crate::error::Result;
use crate::texture::{validate_shape, Texture};

/// Broadcasts one value across every channel and point.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarConstant {
    channels: usize,
    space_dims: usize,
    value: f32,
}

impl ScalarConstant {
    pub fn new(channels: usize, space_dims: usize, value: f32) -> Result<Self> {
        validate_shape(channels, space_dims)?;
        Ok(Self {
            channels,
            space_dims,
            value,
        })
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

impl Texture for ScalarConstant {
    fn channels(&self) -> usize {
        self.channels
    }

    fn space_dims(&self) -> usize {
        self.space_dims
    }

    fn evaluate(&self, points: &Batch) -> Result<Batch> {
        Ok(Batch::filled(points.shape(), self.channels, self.value))
    }
}
