use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::loss::Reduction;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::ops::conv::calculate_conv_output_size;
use burn::tensor::Tensor;
use burn::train::{RegressionOutput, TrainOutput, TrainStep, ValidStep};

use crate::data::SteeringBatch;
use crate::loss::RmseLoss;
use crate::model::elu::{Elu, EluConfig};

/// Shallow commaai-style regressor, after the comma.ai research steering
/// model: three strided convolutions with ELU activations and a single wide
/// hidden layer.
///
/// Should be created with [CommaAiNetConfig].
#[derive(Module, Debug)]
pub struct CommaAiNet<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    dropout1: Dropout,
    dropout2: Dropout,
    activation: Elu,
}

/// Configuration to create a [CommaAiNet] using the [init function](CommaAiNetConfig::init).
#[derive(Config, Debug)]
pub struct CommaAiNetConfig {
    /// Input shape as `[height, width, channels]`.
    pub input_shape: [usize; 3],
    /// Dropout rate applied to the flattened feature map.
    #[config(default = 0.2)]
    pub conv_dropout: f64,
    /// Dropout rate applied before the output layer.
    #[config(default = 0.5)]
    pub dense_dropout: f64,
}

impl CommaAiNetConfig {
    /// Initialize a new [CommaAiNet].
    pub fn init<B: Backend>(&self, device: &B::Device) -> CommaAiNet<B> {
        let [_, _, channels] = self.input_shape;

        CommaAiNet {
            conv1: Conv2dConfig::new([channels, 16], [8, 8])
                .with_stride([4, 4])
                .with_padding(PaddingConfig2d::Explicit(2, 2))
                .init(device),
            conv2: Conv2dConfig::new([16, 32], [5, 5])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(2, 2))
                .init(device),
            conv3: Conv2dConfig::new([32, 64], [5, 5])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(2, 2))
                .init(device),
            fc1: LinearConfig::new(self.flattened_size(), 512).init(device),
            fc2: LinearConfig::new(512, 1).init(device),
            dropout1: DropoutConfig::new(self.conv_dropout).init(),
            dropout2: DropoutConfig::new(self.dense_dropout).init(),
            activation: EluConfig::new().init(),
        }
    }

    /// Width of the flattened feature map feeding the first dense layer.
    fn flattened_size(&self) -> usize {
        let [height, width, _] = self.input_shape;
        let dim = |mut size: usize| {
            size = calculate_conv_output_size(8, 4, 2, 1, size);
            size = calculate_conv_output_size(5, 2, 2, 1, size);
            calculate_conv_output_size(5, 2, 2, 1, size)
        };
        64 * dim(height) * dim(width)
    }
}

impl<B: Backend> CommaAiNet<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// Pixels are expected in `[0, 255]`; the first step rescales them to
    /// `[-1, 1]`.
    ///
    /// # Shapes
    ///
    /// - images: `[batch_size, channels, height, width]`
    /// - output: `[batch_size, 1]`
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = images.div_scalar(127.5).sub_scalar(1.0);
        let x = self.activation.forward(self.conv1.forward(x));
        let x = self.activation.forward(self.conv2.forward(x));
        let x = self.conv3.forward(x);

        let x = self.activation.forward(self.dropout1.forward(x.flatten::<2>(1, 3)));
        let x = self.fc1.forward(x);
        let x = self.activation.forward(self.dropout2.forward(x));
        self.fc2.forward(x)
    }

    /// Runs one batch through the network and scores it with the RMSE loss.
    pub fn forward_step(&self, batch: SteeringBatch<B>) -> RegressionOutput<B> {
        let targets = batch.targets;
        let output = self.forward(batch.images);
        let loss = RmseLoss::new().forward(output.clone(), targets.clone(), Reduction::Auto);

        RegressionOutput::new(loss, output, targets)
    }
}

impl<B: AutodiffBackend> TrainStep<SteeringBatch<B>, RegressionOutput<B>> for CommaAiNet<B> {
    fn step(&self, batch: SteeringBatch<B>) -> TrainOutput<RegressionOutput<B>> {
        let item = self.forward_step(batch);

        TrainOutput::new(self, item.loss.backward(), item)
    }
}

impl<B: Backend> ValidStep<SteeringBatch<B>, RegressionOutput<B>> for CommaAiNet<B> {
    fn step(&self, batch: SteeringBatch<B>) -> RegressionOutput<B> {
        self.forward_step(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestBackend;

    #[test]
    fn downsamples_by_sixteen_overall() {
        let config = CommaAiNetConfig::new([66, 200, 3]);

        // 66x200 -> 16x50 -> 8x25 -> 4x13
        assert_eq!(config.flattened_size(), 64 * 4 * 13);
    }

    #[test]
    fn parameter_count_matches_the_baseline() {
        let device = Default::default();
        let model = CommaAiNetConfig::new([66, 200, 3]).init::<TestBackend>(&device);

        assert_eq!(model.num_params(), 1_772_145);
    }

    #[test]
    fn regresses_one_angle_per_frame() {
        let device = Default::default();
        let model = CommaAiNetConfig::new([66, 200, 3]).init::<TestBackend>(&device);
        let images = Tensor::<TestBackend, 4>::zeros([2, 3, 66, 200], &device);

        let output = model.forward(images);

        assert_eq!(output.dims(), [2, 1]);
    }
}
