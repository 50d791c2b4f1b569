//! Convolutional networks for end-to-end steering-angle prediction.
//!
//! Three alternative topologies map a camera frame directly to a steering
//! angle: a deep multi-layer regressor, a compact VGG-style network and a
//! shallow commaai-style network. All of them are trained with Adam against a
//! root-mean-square error loss.

pub mod cli;
pub mod data;
pub mod inference;
pub mod loss;
pub mod model;
pub mod training;

#[cfg(test)]
pub type TestBackend = burn::backend::NdArray<f32>;
