use burn::config::Config;
use burn::data::dataloader::DataLoaderBuilder;
use burn::module::{AutodiffModule, Module};
use burn::optim::{AdamConfig, Optimizer};
use burn::record::CompactRecorder;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use burn::train::{RegressionOutput, TrainStep, ValidStep};

use crate::data::{SteeringBatch, SteeringBatcher, SteeringDataset, CHANNELS};
use crate::model::{CommaAiNetConfig, Network, NvidiaNetConfig, SmallVggNetConfig};

/// Training-run configuration.
///
/// The numeric defaults are the settings the networks were tuned with.
#[derive(Config)]
pub struct TrainingConfig {
    /// Topology to train.
    #[config(default = "Network::Nvidia")]
    pub network: Network,
    pub optimizer: AdamConfig,
    #[config(default = 8)]
    pub batch_size: usize,
    #[config(default = 360)]
    pub img_height: usize,
    #[config(default = 640)]
    pub img_width: usize,
    #[config(default = 1e-4)]
    pub learning_rate: f64,
    #[config(default = 10)]
    pub num_epochs: usize,
    #[config(default = 4)]
    pub num_workers: usize,
    #[config(default = 42)]
    pub seed: u64,
    /// Dataset root holding the training driving log.
    #[config(default = "String::from(\"data/train\")")]
    pub data_path: String,
    /// Dataset root holding the validation driving log.
    #[config(default = "String::from(\"data/test\")")]
    pub test_data_path: String,
}

impl TrainingConfig {
    /// Input shape handed to the network factories, `[height, width, channels]`.
    pub fn input_shape(&self) -> [usize; 3] {
        [self.img_height, self.img_width, CHANNELS]
    }
}

// Create the directory to save the model and model config
fn create_artifact_dir(artifact_dir: &str) {
    // Remove existing artifacts
    std::fs::remove_dir_all(artifact_dir).ok();
    std::fs::create_dir_all(artifact_dir).ok();
}

/// Train the configured topology and save the model under `artifact_dir`.
pub fn train<B: AutodiffBackend>(artifact_dir: &str, config: TrainingConfig, device: B::Device) {
    create_artifact_dir(artifact_dir);
    config
        .save(format!("{artifact_dir}/config.json"))
        .expect("Config should be saved successfully");
    B::seed(config.seed);

    match config.network {
        Network::Nvidia => {
            let model = NvidiaNetConfig::new(config.input_shape()).init::<B>(&device);
            fit(model, artifact_dir, &config, &device);
        }
        Network::SmallVgg => {
            let model = SmallVggNetConfig::new(config.input_shape()).init::<B>(&device);
            fit(model, artifact_dir, &config, &device);
        }
        Network::CommaAi => {
            let model = CommaAiNetConfig::new(config.input_shape()).init::<B>(&device);
            fit(model, artifact_dir, &config, &device);
        }
    }
}

fn fit<B: AutodiffBackend, M>(
    mut model: M,
    artifact_dir: &str,
    config: &TrainingConfig,
    device: &B::Device,
) where
    M: AutodiffModule<B> + TrainStep<SteeringBatch<B>, RegressionOutput<B>>,
    M::InnerModule: ValidStep<SteeringBatch<B::InnerBackend>, RegressionOutput<B::InnerBackend>>,
{
    let batcher = SteeringBatcher::new(config.img_height, config.img_width);

    let dataset_train = SteeringDataset::new(&config.data_path, config.img_height, config.img_width)
        .expect("Training driving log should be readable");
    let dataset_valid =
        SteeringDataset::new(&config.test_data_path, config.img_height, config.img_width)
            .expect("Validation driving log should be readable");

    let dataloader_train = DataLoaderBuilder::new(batcher.clone())
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers)
        .build(dataset_train);

    let dataloader_valid = DataLoaderBuilder::new(batcher)
        .batch_size(config.batch_size)
        .num_workers(config.num_workers)
        .build(dataset_valid);

    let mut optim = config.optimizer.init::<B, M>();

    for epoch in 1..=config.num_epochs {
        let mut train_loss = 0.0;
        let mut train_batches = 0;
        for batch in dataloader_train.iter() {
            let output = model.step(batch);
            train_loss += output.item.loss.into_scalar().elem::<f32>();
            train_batches += 1;

            model = optim.step(config.learning_rate, model, output.grads);
        }

        let valid_model = model.valid();
        let mut valid_loss = 0.0;
        let mut valid_batches = 0;
        for batch in dataloader_valid.iter() {
            let output = valid_model.step(batch);
            valid_loss += output.loss.into_scalar().elem::<f32>();
            valid_batches += 1;
        }

        println!(
            "Epoch {epoch}/{}, RMSE {:.4}, Valid RMSE {:.4}",
            config.num_epochs,
            train_loss / train_batches.max(1) as f32,
            valid_loss / valid_batches.max(1) as f32,
        );
    }

    model
        .save_file(format!("{artifact_dir}/model"), &CompactRecorder::new())
        .expect("Trained model should be saved successfully");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_tuned_constants() {
        let config = TrainingConfig::new(AdamConfig::new());

        assert_eq!(config.network, Network::Nvidia);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.img_height, 360);
        assert_eq!(config.img_width, 640);
        assert_eq!(config.learning_rate, 1e-4);
        assert_eq!(config.num_epochs, 10);
    }

    #[test]
    fn input_shape_is_channels_last() {
        let config = TrainingConfig::new(AdamConfig::new());

        assert_eq!(config.input_shape(), [360, 640, 3]);
    }
}
