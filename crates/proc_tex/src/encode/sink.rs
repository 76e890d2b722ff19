use crate::error::{Error, Result};

/// Frame layout announced to a [`FrameSink`] before the first frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SinkConfig {
    pub width: usize,
    pub height: usize,
    pub fps: u32,
    /// ffmpeg `pix_fmt` name of the raw frames.
    pub pixel_format: &'static str,
    /// Exact size of every pushed frame.
    pub frame_bytes: usize,
}

/// Consumer of raw video frames.
///
/// Ordering contract: `begin` once, then `push_frame` with strictly increasing indices,
/// then either `end` (flush and finish) or `abort` (discard, tear down).
pub trait FrameSink {
    fn begin(&mut self, cfg: SinkConfig) -> Result<()>;

    fn push_frame(&mut self, index: u64, bytes: &[u8]) -> Result<()>;

    fn end(&mut self) -> Result<()>;

    /// Tears down after a failure. The output is not expected to be usable.
    fn abort(&mut self) -> Result<()> {
        self.end()
    }
}

/// Keeps every frame in memory.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u64, Vec<u8>)>,
    ended: bool,
    aborted: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(u64, Vec<u8>)] {
        &self.frames
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> Result<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, index: u64, bytes: &[u8]) -> Result<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| Error::encoder("sink not started"))?;
        if bytes.len() != cfg.frame_bytes {
            return Err(Error::encoder(format!(
                "frame {index} has {} bytes, expected {}",
                bytes.len(),
                cfg.frame_bytes
            )));
        }
        self.frames.push((index, bytes.to_vec()));
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ended = true;
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        self.aborted = true;
        Ok(())
    }
}
