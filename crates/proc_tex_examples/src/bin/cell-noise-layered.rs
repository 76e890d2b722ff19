use proc_tex::prelude::*;
use proc_tex_examples::{init_tracing, save_png};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// (cells per side, weight) of each layer
const LAYERS: [(usize, f32); 6] = [
    (3, 1.0),
    (4, -1.0),
    (6, 0.5),
    (8, -0.5),
    (12, 0.25),
    (16, -0.25),
];

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(345);

    let mut sum = Tex::constant(1, 2, 0.0)?;
    for (cells, weight) in LAYERS {
        let config = CellNoiseConfig::square(cells, 1).with_metric(Metric::Euclidean);
        let noise = Tex::leaf(CellNoise2D::new(&config, &mut rng)?)?;
        let centered = scale_to_region(&noise, -0.5, 0.5)?;
        sum = (sum + (weight * centered)?)?;
    }

    // Tint: red follows the sum, green its inverse, blue is flat.
    let unit = scale_to_region(&sum, 0.0, 1.0)?;
    let inverse = (1.0 - &unit)?;
    let blue = Tex::constant(1, 2, 0.6)?;
    let rgb = concat_channels(&[unit, inverse, blue])?;
    let texture = to_sample_format(&rgb, SampleFormat::U8, u8::MAX as f32);

    let grid = EvalGrid::planar(768, 768, Rect::unit())?;
    save_png(&render_image(&texture, &grid)?, "cell-noise-layered.png")?;
    Ok(())
}
