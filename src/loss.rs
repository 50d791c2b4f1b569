use burn::nn::loss::Reduction;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Calculate the root-mean-square error between predictions and targets.
///
/// The squared differences are averaged over the last axis before the square
/// root, so every sample of a batch contributes its own error:
///
/// ```text
/// L = sqrt(mean((predictions - targets)^2, last axis))
/// ```
///
/// No epsilon is added under the square root.
#[derive(Clone, Debug, Default)]
pub struct RmseLoss;

impl RmseLoss {
    /// Create the loss.
    pub fn new() -> Self {
        Self
    }

    /// Compute the loss for each sample, then reduce to a single value.
    ///
    /// `Reduction::Auto` behaves as `Reduction::Mean`.
    ///
    /// # Shapes
    ///
    /// - predictions: \[...dims, d\]
    /// - targets: \[...dims, d\]
    /// - output: \[1\]
    pub fn forward<const D: usize, B: Backend>(
        &self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
        reduction: Reduction,
    ) -> Tensor<B, 1> {
        let loss = self.forward_no_reduction(predictions, targets);
        match reduction {
            Reduction::Mean | Reduction::Auto => loss.mean(),
            Reduction::Sum => loss.sum(),
        }
    }

    /// Compute the loss for each sample, keeping the reduced axis with size 1.
    ///
    /// # Shapes
    ///
    /// - predictions: \[...dims, d\]
    /// - targets: \[...dims, d\]
    /// - output: \[...dims, 1\]
    pub fn forward_no_reduction<const D: usize, B: Backend>(
        &self,
        predictions: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> Tensor<B, D> {
        predictions.sub(targets).powf_scalar(2.).mean_dim(D - 1).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestBackend;
    use burn::tensor::TensorData;

    type TestTensor<const D: usize> = Tensor<TestBackend, D>;

    #[test]
    fn zero_for_identical_inputs() {
        let device = Default::default();
        let predictions = TestTensor::<1>::from_data(TensorData::from([1.0, 2.0, 3.0]), &device);
        let targets = TestTensor::<1>::from_data(TensorData::from([1.0, 2.0, 3.0]), &device);

        let loss = RmseLoss::new().forward(predictions, targets, Reduction::Auto);

        assert_eq!(loss.into_scalar(), 0.0);
    }

    #[test]
    fn averages_squares_over_last_axis_before_the_root() {
        let device = Default::default();
        let predictions = TestTensor::<1>::from_data(TensorData::from([0.0, 0.0]), &device);
        let targets = TestTensor::<1>::from_data(TensorData::from([3.0, 4.0]), &device);

        let loss = RmseLoss::new().forward(predictions, targets, Reduction::Auto);

        // sqrt(mean([9, 16])) = sqrt(12.5)
        let value = loss.into_scalar();
        assert!((value - 12.5_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn keeps_the_batch_axis_without_reduction() {
        let device = Default::default();
        let predictions =
            TestTensor::<2>::from_data(TensorData::from([[0.0, 0.0], [1.0, 2.0]]), &device);
        let targets =
            TestTensor::<2>::from_data(TensorData::from([[3.0, 4.0], [1.0, 2.0]]), &device);

        let loss = RmseLoss::new().forward_no_reduction(predictions, targets);

        assert_eq!(loss.dims(), [2, 1]);
        let values = loss.into_data().to_vec::<f32>().unwrap();
        assert!((values[0] - 12.5_f32.sqrt()).abs() < 1e-6);
        assert_eq!(values[1], 0.0);
    }

    #[test]
    fn sum_reduction_adds_per_sample_errors() {
        let device = Default::default();
        let predictions =
            TestTensor::<2>::from_data(TensorData::from([[0.0, 0.0], [1.0, 2.0]]), &device);
        let targets =
            TestTensor::<2>::from_data(TensorData::from([[3.0, 4.0], [1.0, 2.0]]), &device);

        let loss = RmseLoss::new().forward(predictions, targets, Reduction::Sum);

        let value = loss.into_scalar();
        assert!((value - 12.5_f32.sqrt()).abs() < 1e-6);
    }
}
