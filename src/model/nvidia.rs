use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::loss::Reduction;
use burn::nn::{Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::ops::conv::calculate_conv_output_size;
use burn::tensor::Tensor;
use burn::train::{RegressionOutput, TrainOutput, TrainStep, ValidStep};

use crate::data::SteeringBatch;
use crate::loss::RmseLoss;

/// Deep multi-layer convolutional regressor after Bojarski et al., 2016,
/// <https://arxiv.org/abs/1604.07316>: five strided convolutions followed by
/// four fully-connected layers shrinking to a single steering angle.
///
/// Should be created with [NvidiaNetConfig].
#[derive(Module, Debug)]
pub struct NvidiaNet<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    conv4: Conv2d<B>,
    conv5: Conv2d<B>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
    fc4: Linear<B>,
    activation: Relu,
}

/// Configuration to create a [NvidiaNet] using the [init function](NvidiaNetConfig::init).
#[derive(Config, Debug)]
pub struct NvidiaNetConfig {
    /// Input shape as `[height, width, channels]`.
    pub input_shape: [usize; 3],
}

impl NvidiaNetConfig {
    /// Initialize a new [NvidiaNet].
    pub fn init<B: Backend>(&self, device: &B::Device) -> NvidiaNet<B> {
        let [_, _, channels] = self.input_shape;

        // Dynamic same-padding is asymmetric at stride 2 for these kernel
        // sizes, so the equivalent symmetric padding is given explicitly.
        let model = NvidiaNet {
            conv1: Conv2dConfig::new([channels, 24], [5, 5])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(2, 2))
                .init(device),
            conv2: Conv2dConfig::new([24, 36], [5, 5])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(2, 2))
                .init(device),
            conv3: Conv2dConfig::new([36, 48], [5, 5])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(2, 2))
                .init(device),
            conv4: Conv2dConfig::new([48, 64], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            conv5: Conv2dConfig::new([64, 64], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            fc1: LinearConfig::new(self.flattened_size(), 512).init(device),
            fc2: LinearConfig::new(512, 256).init(device),
            fc3: LinearConfig::new(256, 128).init(device),
            fc4: LinearConfig::new(128, 1).init(device),
            activation: Relu::new(),
        };

        println!("Model is created and compiled..");
        model
    }

    /// Width of the flattened feature map feeding the first dense layer.
    fn flattened_size(&self) -> usize {
        let [height, width, _] = self.input_shape;
        let dim = |mut size: usize| {
            for (kernel, padding) in [(5, 2), (5, 2), (5, 2), (3, 1), (3, 1)] {
                size = calculate_conv_output_size(kernel, 2, padding, 1, size);
            }
            size
        };
        64 * dim(height) * dim(width)
    }
}

impl<B: Backend> NvidiaNet<B> {
    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - images: `[batch_size, channels, height, width]`
    /// - output: `[batch_size, 1]`
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.conv1.forward(images));
        let x = self.activation.forward(self.conv2.forward(x));
        let x = self.activation.forward(self.conv3.forward(x));
        let x = self.activation.forward(self.conv4.forward(x));
        let x = self.conv5.forward(x);

        let x = self.activation.forward(x.flatten::<2>(1, 3));
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

impl<B: AutodiffBackend> TrainStep<SteeringBatch<B>, RegressionOutput<B>> for NvidiaNet<B> {
    fn step(&self, batch: SteeringBatch<B>) -> TrainOutput<RegressionOutput<B>> {
        let item = self.forward_step(batch);

        TrainOutput::new(self, item.loss.backward(), item)
    }
}

impl<B: Backend> ValidStep<SteeringBatch<B>, RegressionOutput<B>> for NvidiaNet<B> {
    fn step(&self, batch: SteeringBatch<B>) -> RegressionOutput<B> {
        self.forward_step(batch)
    }
}
