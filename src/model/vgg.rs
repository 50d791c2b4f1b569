use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::loss::Reduction;
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::ops::conv::calculate_conv_output_size;
use burn::tensor::Tensor;
use burn::train::{RegressionOutput, TrainOutput, TrainStep, ValidStep};

use crate::data::SteeringBatch;
use crate::loss::RmseLoss;

/// Compact VGG-style network: three conv/pool/dropout stages followed by the
/// same fully-connected head as the deep regressor.
///
/// Should be created with [SmallVggNetConfig].
#[derive(Module, Debug)]
pub struct SmallVggNet<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    pool: MaxPool2d,
    dropout: Dropout,
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
    fc4: Linear<B>,
    activation: Relu,
}

/// Configuration to create a [SmallVggNet] using the [init function](SmallVggNetConfig::init).
#[derive(Config, Debug)]
pub struct SmallVggNetConfig {
    /// Input shape as `[height, width, channels]`.
    pub input_shape: [usize; 3],
    /// Dropout rate applied after each pooling stage.
    #[config(default = 0.25)]
    pub dropout: f64,
}

impl SmallVggNetConfig {
    /// Initialize a new [SmallVggNet].
    pub fn init<B: Backend>(&self, device: &B::Device) -> SmallVggNet<B> {
        let [_, _, channels] = self.input_shape;

        SmallVggNet {
            conv1: Conv2dConfig::new([channels, 32], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            conv2: Conv2dConfig::new([32, 64], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            conv3: Conv2dConfig::new([64, 64], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            dropout: DropoutConfig::new(self.dropout).init(),
            fc1: LinearConfig::new(self.flattened_size(), 512).init(device),
            fc2: LinearConfig::new(512, 256).init(device),
            fc3: LinearConfig::new(256, 128).init(device),
            fc4: LinearConfig::new(128, 1).init(device),
            activation: Relu::new(),
        }
    }

    /// Width of the flattened feature map feeding the first dense layer.
    fn flattened_size(&self) -> usize {
        let [height, width, _] = self.input_shape;
        let dim = |mut size: usize| {
            // The same-padded convolutions preserve the spatial dimensions;
            // only the three pooling stages shrink them.
            for _ in 0..3 {
                size = calculate_conv_output_size(2, 2, 0, 1, size);
            }
            size
        };
        64 * dim(height) * dim(width)
    }
}

impl<B: Backend> SmallVggNet<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - images: `[batch_size, channels, height, width]`
    /// - output: `[batch_size, 1]`
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.conv1.forward(images));
        let x = self.dropout.forward(self.pool.forward(x));
        let x = self.activation.forward(self.conv2.forward(x));
        let x = self.dropout.forward(self.pool.forward(x));
        let x = self.activation.forward(self.conv3.forward(x));
        let x = self.dropout.forward(self.pool.forward(x));

        let x = x.flatten::<2>(1, 3);
        let x = self.activation.forward(self.fc1.forward(x));
        let x = self.activation.forward(self.fc2.forward(x));
        let x = self.activation.forward(self.fc3.forward(x));
        self.fc4.forward(x)
    }

    /// Runs one batch through the network and scores it with the RMSE loss.
    pub fn forward_step(&self, batch: SteeringBatch<B>) -> RegressionOutput<B> {
        let targets = batch.targets;
        let output = self.forward(batch.images);
        let loss = RmseLoss::new().forward(output.clone(), targets.clone(), Reduction::Auto);

        RegressionOutput::new(loss, output, targets)
    }
}

impl<B: AutodiffBackend> TrainStep<SteeringBatch<B>, RegressionOutput<B>> for SmallVggNet<B> {
    fn step(&self, batch: SteeringBatch<B>) -> TrainOutput<RegressionOutput<B>> {
        let item = self.forward_step(batch);

        TrainOutput::new(self, item.loss.backward(), item)
    }
}

impl<B: Backend> ValidStep<SteeringBatch<B>, RegressionOutput<B>> for SmallVggNet<B> {
    fn step(&self, batch: SteeringBatch<B>) -> RegressionOutput<B> {
        self.forward_step(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestBackend;

    #[test]
    fn halves_the_spatial_dimensions_three_times() {
        let config = SmallVggNetConfig::new([32, 32, 3]);

        // 32x32 -> 16x16 -> 8x8 -> 4x4
        assert_eq!(config.flattened_size(), 64 * 4 * 4);
    }

    #[test]
    fn parameter_count_matches_the_baseline() {
        let device = Default::default();
        let model = SmallVggNetConfig::new([32, 32, 3]).init::<TestBackend>(&device);

        assert_eq!(model.num_params(), 745_473);
    }

    #[test]
    fn regresses_one_angle_per_frame() {
        let device = Default::default();
        let model = SmallVggNetConfig::new([32, 32, 3]).init::<TestBackend>(&device);
        let images = Tensor::<TestBackend, 4>::zeros([2, 3, 32, 32], &device);

        let output = model.forward(images);

        assert_eq!(output.dims(), [2, 1]);
    }
}
