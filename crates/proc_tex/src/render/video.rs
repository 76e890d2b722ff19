use std::time::Instant;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::encode::{FrameSink, SinkConfig};
use crate::error::{Error, Result};
use crate::render::grid::EvalGrid;
use crate::render::image::Image;
use crate::render::pixel_format;
use crate::texture::Tex;

/// Frame count and rate of an exported video.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct VideoConfig {
    pub frames: u64,
    pub fps: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            fps: 30,
        }
    }
}

impl VideoConfig {
    pub fn new(frames: u64, fps: u32) -> Self {
        Self { frames, fps }
    }

    pub fn validate(&self) -> Result<()> {
        if self.frames == 0 {
            return Err(Error::config("video needs at least one frame"));
        }
        if self.fps == 0 {
            return Err(Error::config("video fps must be non-zero"));
        }
        Ok(())
    }
}

/// Streams `config.frames` frames of `tex` into `sink`.
///
/// Each frame is evaluated over the precomputed `grid`, pushed, and only then is the graph
/// stepped, so frame 0 shows the graph's state at call time. The sink is always closed:
/// `end` on success, `abort` on failure. A teardown error after an earlier failure is
/// logged and the earlier error returned.
pub fn render_video(
    tex: &Tex,
    grid: &EvalGrid,
    config: &VideoConfig,
    sink: &mut dyn FrameSink,
) -> Result<()> {
    config.validate()?;
    if grid.depth() != 1 {
        return Err(Error::config(format!(
            "video frames need a planar grid, got {} slices",
            grid.depth()
        )));
    }
    if grid.space_dims() != tex.space_dims() {
        return Err(Error::shape(format!(
            "{}D grid cannot drive a {}D texture",
            grid.space_dims(),
            tex.space_dims()
        )));
    }

    let format = tex.sample_format();
    let pix_fmt = pixel_format(tex.channels(), format)?;
    let frame_bytes = grid.width() * grid.height() * tex.channels() * format.bytes_per_sample();
    sink.begin(SinkConfig {
        width: grid.width(),
        height: grid.height(),
        fps: config.fps,
        pixel_format: pix_fmt,
        frame_bytes,
    })?;

    info!(
        frames = config.frames,
        fps = config.fps,
        width = grid.width(),
        height = grid.height(),
        pixel_format = pix_fmt,
        "video export started"
    );
    let start = Instant::now();

    let streamed = stream_frames(tex, grid, config.frames, sink);
    match streamed {
        Ok(()) => {
            sink.end()?;
            info!(
                frames = config.frames,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "video export finished"
            );
            Ok(())
        }
        Err(e) => {
            if let Err(teardown) = sink.abort() {
                warn!("Encoder teardown after failed export also failed: {}", teardown);
            }
            Err(e)
        }
    }
}

fn stream_frames(tex: &Tex, grid: &EvalGrid, frames: u64, sink: &mut dyn FrameSink) -> Result<()> {
    let format = tex.sample_format();
    for index in 0..frames {
        let values = tex.evaluate(grid.points())?;
        let image = Image::from_values(grid.width(), grid.height(), format, values)?;
        sink.push_frame(index, &image.to_bytes())?;
        tex.step_frame();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Batch;
    use crate::encode::InMemorySink;
    use crate::geom::Rect;
    use crate::render::SampleFormat;
    use crate::texture::Texture;
    use crate::transform::to_sample_format;

    struct Counter(u8);

    impl Texture for Counter {
        fn channels(&self) -> usize {
            1
        }

        fn space_dims(&self) -> usize {
            2
        }

        fn evaluate(&self, points: &Batch) -> Result<Batch> {
            Ok(Batch::filled(points.shape(), 1, self.0 as f32))
        }

        fn step_frame(&mut self) {
            self.0 += 1;
        }
    }

    struct FailingSink {
        accepted: usize,
        aborted: bool,
    }

    impl FrameSink for FailingSink {
        fn begin(&mut self, _: SinkConfig) -> Result<()> {
            Ok(())
        }

        fn push_frame(&mut self, _: u64, _: &[u8]) -> Result<()> {
            if self.accepted == 2 {
                return Err(Error::encoder("pipe closed"));
            }
            self.accepted += 1;
            Ok(())
        }

        fn end(&mut self) -> Result<()> {
            Ok(())
        }

        fn abort(&mut self) -> Result<()> {
            self.aborted = true;
            Err(Error::encoder("kill failed"))
        }
    }

    fn gray8() -> Tex {
        to_sample_format(&Tex::leaf(Counter(0)).unwrap(), SampleFormat::U8, 1.0)
    }

    #[test]
    fn frames_are_emitted_before_stepping() {
        let tex = gray8();
        let grid = EvalGrid::planar(3, 2, Rect::unit()).unwrap();
        let mut sink = InMemorySink::new();
        render_video(&tex, &grid, &VideoConfig::new(3, 24), &mut sink).unwrap();

        let cfg = sink.config().unwrap();
        assert_eq!(cfg.pixel_format, "gray");
        assert_eq!(cfg.frame_bytes, 6);
        assert!(sink.ended());
        let frames = sink.frames();
        assert_eq!(frames.len(), 3);
        for (i, (index, bytes)) in frames.iter().enumerate() {
            assert_eq!(*index, i as u64);
            assert!(bytes.iter().all(|b| *b == i as u8));
        }
        assert_eq!(tex.frame(), 3);
    }

    #[test]
    fn failures_abort_the_sink_and_keep_the_first_error() {
        let tex = gray8();
        let grid = EvalGrid::planar(2, 2, Rect::unit()).unwrap();
        let mut sink = FailingSink {
            accepted: 0,
            aborted: false,
        };
        let err = render_video(&tex, &grid, &VideoConfig::new(5, 24), &mut sink)
            .expect_err("third frame fails");
        assert!(matches!(err, Error::EncoderFailure(ref m) if m == "pipe closed"));
        assert!(sink.aborted);
    }

    #[test]
    fn unencodable_textures_fail_before_begin() {
        let tex = Tex::constant(2, 2, 0.0).unwrap();
        let grid = EvalGrid::planar(2, 2, Rect::unit()).unwrap();
        let mut sink = InMemorySink::new();
        assert!(render_video(&tex, &grid, &VideoConfig::default(), &mut sink).is_err());
        assert!(sink.config().is_none());
    }
}
