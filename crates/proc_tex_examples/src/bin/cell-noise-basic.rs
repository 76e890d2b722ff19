use proc_tex::prelude::*;
use proc_tex_examples::{init_tracing, save_png};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(42);

    // 4 x 4 cells, one point each, squared distance to the nearest point
    let config = CellNoiseConfig::square(4, 1);
    let noise = Tex::leaf(CellNoise2D::new(&config, &mut rng)?)?;

    // Stretch to the full 16-bit range for a visible PNG.
    let unit = scale_to_region(&noise, 0.0, 1.0)?;
    let texture = to_sample_format(&unit, SampleFormat::U16, u16::MAX as f32);

    let grid = EvalGrid::planar(1024, 1024, Rect::unit())?;
    let image = render_image(&texture, &grid)?;
    save_png(&image, "cell-noise-basic.png")?;
    Ok(())
}
