//! kafka-perf math utilities.

pub mod math;

pub use math::moments::RunningTotal;
pub use math::sketch::{QuantileSketch, SketchError};
