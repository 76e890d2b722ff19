use std::cell::Cell;

use rand::RngCore;

use crate::batch::Batch;
use crate::error::Result;
use crate::noise::hash01;
use crate::texture::{validate_shape, Texture};

/// Uniform `[0, 1)` values that change on every call, even at the same frame and points.
///
/// Values are a hash of the seed, a call counter and the row index, so a given seed
/// replays the same sequence of evaluations.
pub struct WhiteNoise {
    channels: usize,
    space_dims: usize,
    seed: u64,
    calls: Cell<u64>,
}

impl WhiteNoise {
    pub fn new(channels: usize, space_dims: usize, rng: &mut dyn RngCore) -> Result<Self> {
        validate_shape(channels, space_dims)?;
        Ok(Self {
            channels,
            space_dims,
            seed: rng.next_u64(),
            calls: Cell::new(0),
        })
    }
}

impl Texture for WhiteNoise {
    fn channels(&self) -> usize {
        self.channels
    }

    fn space_dims(&self) -> usize {
        self.space_dims
    }

    fn evaluate(&self, points: &Batch) -> Result<Batch> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        let seed = self.seed ^ call.wrapping_mul(0xD1B5_4A32_D192_ED03);

        let mut out = Batch::filled(points.shape(), self.channels, 0.0);
        for (i, v) in out.data_mut().iter_mut().enumerate() {
            *v = hash01(seed, i as u64);
        }
        Ok(out)
    }
}
