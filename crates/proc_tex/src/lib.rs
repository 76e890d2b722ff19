#![forbid(unsafe_code)]
//! proc_tex: procedural noise textures with a lazy composition graph.
//!
//! Modules:
//! - noise: animated Worley cell noise over a toroidal grid index, gradient, grid and white noise
//! - texture: the Texture trait, the shared Tex graph handle, constants and compute backends
//! - transform: composition nodes (arithmetic, value remaps, channels, space remaps)
//! - render: pixel grids, images, and video export through a frame sink
//! - encode: frame sinks, including an ffmpeg subprocess sink
//!
//! For examples, see the proc_tex_examples crate.
pub mod batch;
pub mod encode;
pub mod error;
pub mod geom;
pub mod metric;
pub mod noise;
pub mod render;
pub mod texture;
pub mod transform;

/// Convenient re-exports for common types. Import with `use proc_tex::prelude::*;`.
pub mod prelude {
    pub use crate::batch::Batch;
    pub use crate::encode::{FfmpegSink, FfmpegSinkOpts, FrameSink, InMemorySink, SinkConfig};
    pub use crate::error::{Error, Result};
    pub use crate::geom::{Cuboid, Rect};
    pub use crate::metric::{DistanceMetric, Metric};
    pub use crate::noise::{
        CellNoise, CellNoise2D, CellNoise3D, CellNoiseConfig, GridNoise, GridNoise2D,
        GridNoise3D, GridNoiseConfig, NeighborSearch, PerlinNoise, PerlinNoise2D, PerlinNoise3D,
        PerlinNoiseConfig, WhiteNoise,
    };
    pub use crate::render::{
        pixel_format, render_image, render_video, EvalGrid, Image, SampleFormat, VideoConfig,
    };
    pub use crate::texture::{
        ComputeBackend, CpuBackend, FnKernel, Kernel, KernelTexture, ScalarConstant, Tex,
        Texture,
    };
    pub use crate::transform::{
        affine_space, broadcast_channels, concat_channels, map_values, offset_by_texture,
        scale_to_region, select_channels, sphere_map, to_sample_format, Transform,
    };
}
