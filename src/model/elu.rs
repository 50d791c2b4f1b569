use burn::config::Config;
use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Exponential Linear Unit layer.
///
/// Should be created with [EluConfig](EluConfig).
#[derive(Module, Clone, Debug)]
pub struct Elu {
    /// The scale of the exponential branch.
    pub alpha: f64,
}

/// Configuration to create an [Elu](Elu) layer using the [init function](EluConfig::init).
#[derive(Config, Debug)]
pub struct EluConfig {
    /// The alpha coefficient. Default is 1.0
    #[config(default = "1.0")]
    pub alpha: f64,
}

impl EluConfig {
    /// Initialize a new [Elu](Elu) layer.
    pub fn init(&self) -> Elu {
        Elu { alpha: self.alpha }
    }
}

impl Elu {
    /// Forward pass, `x` for positive inputs and `alpha * (exp(x) - 1)` otherwise.
    ///
    /// # Shapes
    ///
    /// - input: `[..., any]`
    /// - output: `[..., any]`
    pub fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        let negative = input.clone().lower_elem(0.0);
        let scaled = input.clone().exp().sub_scalar(1.0).mul_scalar(self.alpha);
        input.mask_where(negative, scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestBackend;
    use burn::tensor::TensorData;

    #[test]
    fn identity_for_positive_inputs() {
        let device = Default::default();
        let layer = EluConfig::new().init();
        let input = Tensor::<TestBackend, 1>::from_data(TensorData::from([0.5, 2.0]), &device);

        let output = layer.forward(input);

        assert_eq!(output.into_data().to_vec::<f32>().unwrap(), vec![0.5, 2.0]);
    }

    #[test]
    fn saturates_negative_inputs_exponentially() {
        let device = Default::default();
        let layer = EluConfig::new().init();
        let input =
            Tensor::<TestBackend, 1>::from_data(TensorData::from([-1.0, 0.0, 1.0]), &device);

        let output = layer.forward(input);

        let values = output.into_data().to_vec::<f32>().unwrap();
        assert!((values[0] - ((-1.0_f32).exp() - 1.0)).abs() < 1e-6);
        assert_eq!(values[1], 0.0);
        assert_eq!(values[2], 1.0);
    }

    #[test]
    fn alpha_scales_the_negative_branch() {
        let device = Default::default();
        let layer = EluConfig::new().with_alpha(2.0).init();
        let input = Tensor::<TestBackend, 1>::from_data(TensorData::from([-1.0]), &device);

        let output = layer.forward(input);

        let values = output.into_data().to_vec::<f32>().unwrap();
        assert!((values[0] - 2.0 * ((-1.0_f32).exp() - 1.0)).abs() < 1e-6);
    }
}
