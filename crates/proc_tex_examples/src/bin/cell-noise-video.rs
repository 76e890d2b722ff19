use anyhow::Context;
use proc_tex::prelude::*;
use proc_tex_examples::init_tracing;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(7);

    let config = CellNoiseConfig::square(5, 2)
        .with_point_max_speed(0.004)
        .with_point_max_accel(0.001);
    let noise = Tex::leaf(CellNoise2D::new(&config, &mut rng)?)?;
    let unit = scale_to_region(&noise, 0.0, 1.0)?;
    let texture = to_sample_format(&unit, SampleFormat::U8, u8::MAX as f32);

    let grid = EvalGrid::planar(512, 512, Rect::unit())?;
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("cell-noise-video.mp4"));
    render_video(&texture, &grid, &VideoConfig::new(240, 30), &mut sink)
        .context("video export failed (is ffmpeg on PATH?)")?;
    Ok(())
}
