use glam::Vec3;
use proc_tex::prelude::*;
use proc_tex_examples::{init_tracing, save_png};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// (cells per side, weight) of each 3D layer
const LAYERS: [(usize, f32); 8] = [
    (5, 1.0),
    (4, -1.0),
    (7, 0.5),
    (6, -0.5),
    (9, 0.25),
    (8, -0.25),
    (11, 0.125),
    (10, -0.125),
];

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(345);

    // Domain warp: three independent channels of small gradient-noise offsets.
    let mut offsets = Vec::with_capacity(3);
    for _ in 0..3 {
        let wobble = Tex::leaf(PerlinNoise3D::new(&PerlinNoiseConfig::new(10), &mut rng)?)?;
        offsets.push(scale_to_region(&wobble, -0.05, 0.05)?);
    }
    let offset = concat_channels(&offsets)?;

    let mut rock = Tex::constant(1, 3, 0.0)?;
    for (cells, weight) in LAYERS {
        let noise = Tex::leaf(CellNoise3D::new(&CellNoiseConfig::cube(cells, 1), &mut rng)?)?;
        rock = (rock + (weight * scale_to_region(&noise, -0.5, 0.5)?)?)?;
    }

    let warped = offset_by_texture(&rock, &offset)?;
    let sphere = sphere_map(&warped, 0.25, Vec3::ZERO)?;
    let unit = scale_to_region(&sphere, 0.0, 1.0)?;
    let texture = to_sample_format(&unit, SampleFormat::U16, u16::MAX as f32);

    let grid = EvalGrid::planar(1024, 512, Rect::unit())?;
    save_png(&render_image(&texture, &grid)?, "rock-sphere.png")?;
    Ok(())
}
