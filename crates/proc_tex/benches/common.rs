#![allow(dead_code)]

use std::time::Duration;

use criterion::{Criterion, Throughput};
use proc_tex::geom::Rect;
use proc_tex::render::EvalGrid;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Square planar grid over the unit square.
pub fn unit_grid(side: usize) -> EvalGrid {
    EvalGrid::planar(side, side, Rect::unit()).expect("grid")
}

pub fn unit_slice(side: usize, z: f32) -> EvalGrid {
    EvalGrid::planar_slice(side, side, Rect::unit(), z).expect("grid")
}
