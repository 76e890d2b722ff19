//! Video encoder plumbing.
//!
//! [`render_video`](crate::render::render_video) writes raw frames to a [`FrameSink`].
//! [`FfmpegSink`] pipes them into an external `ffmpeg` process; [`InMemorySink`] keeps
//! them for tests.
pub mod ffmpeg;
pub mod sink;

pub use ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use sink::{FrameSink, InMemorySink, SinkConfig};
