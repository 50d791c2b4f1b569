//! The three steering topologies.
//!
//! Every network consumes NCHW image batches and regresses a single steering
//! angle per frame. The fully-connected input widths are derived from the
//! configured input shape, so each topology can be instantiated for any frame
//! dimensions its downsampling chain supports.

pub mod commaai;
pub mod elu;
pub mod nvidia;
pub mod vgg;

pub use commaai::{CommaAiNet, CommaAiNetConfig};
pub use elu::{Elu, EluConfig};
pub use nvidia::{NvidiaNet, NvidiaNetConfig};
pub use vgg::{SmallVggNet, SmallVggNetConfig};

use burn::config::Config;

/// Selects one of the steering topologies.
#[derive(Config, Debug, PartialEq)]
pub enum Network {
    /// Deep multi-layer convolutional regressor.
    Nvidia,
    /// Compact VGG-style network.
    SmallVgg,
    /// Shallow commaai-style regressor.
    CommaAi,
}
