use proc_tex::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn cell_noise(seed: u64) -> Tex {
    let mut rng = StdRng::seed_from_u64(seed);
    let config = CellNoiseConfig::square(4, 2);
    Tex::leaf(CellNoise2D::new(&config, &mut rng).unwrap()).unwrap()
}

fn sample_points() -> Batch {
    Batch::from_rows(&[[0.1, 0.9], [0.5, 0.5], [0.73, 0.21]])
}

#[test]
fn shared_noise_in_two_branches_advances_once() {
    let a = cell_noise(1);
    let reference = cell_noise(1);

    let graph = (&a + &a).unwrap();
    let graph = (graph * scale_to_region(&a, 0.0, 1.0).unwrap()).unwrap();
    assert_eq!(graph.leaves().len(), 1);

    for _ in 0..4 {
        graph.step_frame();
        reference.step_frame();
    }
    assert_eq!(a.frame(), 4);
    assert_eq!(
        a.evaluate(&sample_points()).unwrap(),
        reference.evaluate(&sample_points()).unwrap()
    );
}

#[test]
fn set_frame_matches_repeated_steps() {
    let stepped = cell_noise(9);
    let jumped = cell_noise(9);
    for _ in 0..6 {
        stepped.step_frame();
    }
    let warped = offset_by_texture(&jumped, &concat_channels(&[
        Tex::constant(1, 2, 0.0).unwrap(),
        Tex::constant(1, 2, 0.0).unwrap(),
    ])
    .unwrap())
    .unwrap();
    warped.set_frame(6).unwrap();
    assert_eq!(jumped.frame(), 6);
    assert_eq!(
        stepped.evaluate(&sample_points()).unwrap(),
        warped.evaluate(&sample_points()).unwrap()
    );

    let err = warped.set_frame(2).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidFrameTransition {
            current: 6,
            requested: 2
        }
    ));
}

#[test]
fn set_frame_checks_every_leaf_before_moving_any() {
    let ahead = cell_noise(3);
    let behind = cell_noise(4);
    ahead.set_frame(5).unwrap();
    let graph = (&behind + &ahead).unwrap();

    assert!(graph.set_frame(3).is_err());
    assert_eq!(behind.frame(), 0);

    graph.set_frame(5).unwrap();
    assert_eq!(behind.frame(), 5);
    assert_eq!(graph.frame(), 5);
}

#[test]
fn composed_sum_is_element_wise() {
    let a = cell_noise(11);
    let b = cell_noise(12);
    let sum = (&a + &b).unwrap();
    let pts = sample_points();
    let (va, vb, vs) = (
        a.evaluate(&pts).unwrap(),
        b.evaluate(&pts).unwrap(),
        sum.evaluate(&pts).unwrap(),
    );
    for ((x, y), s) in va.data().iter().zip(vb.data()).zip(vs.data()) {
        assert!((x + y - s).abs() < 1e-6);
    }
}

#[test]
fn kernel_textures_compose_with_noise() {
    let mut backend = CpuBackend::new();
    backend.register(
        "x_ramp",
        FnKernel::new(1, |params: &[f32], p: &[f32], out: &mut [f32]| out[0] = params[0] * p[0]),
    );
    let ramp = Tex::leaf(
        KernelTexture::new(std::rc::Rc::new(backend), "x_ramp", vec![2.0], 1, 2).unwrap(),
    )
    .unwrap();
    let graph = (&ramp - &cell_noise(5)).unwrap();
    let out = graph.evaluate(&sample_points()).unwrap();
    assert_eq!(out.shape(), &[3]);
    assert_eq!(out.width(), 1);
}
