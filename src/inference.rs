use std::path::Path;

use burn::config::Config;
use burn::data::dataloader::batcher::Batcher;
use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::backend::Backend;
use burn::tensor::ElementConversion;
use image::imageops::FilterType;

use crate::data::{SteeringBatcher, SteeringItem};
use crate::model::{CommaAiNetConfig, Network, NvidiaNetConfig, SmallVggNetConfig};
use crate::training::TrainingConfig;

/// Predict the steering angle for a single camera frame with a trained model.
///
/// Rebuilds the topology recorded in `artifact_dir/config.json` and loads the
/// trained weights from `artifact_dir/model`.
pub fn infer<B: Backend>(artifact_dir: &str, device: B::Device, image_path: &Path) -> f32 {
    let config = TrainingConfig::load(format!("{artifact_dir}/config.json"))
        .expect("Config should exist for the model; run train first");

    let frame = image::open(image_path).expect("Inference image should be readable");
    let image = frame
        .resize_exact(
            config.img_width as u32,
            config.img_height as u32,
            FilterType::Triangle,
        )
        .into_rgb8()
        .into_raw();

    let batcher = SteeringBatcher::new(config.img_height, config.img_width);
    let batch = batcher.batch(vec![SteeringItem { image, angle: 0.0 }], &device);

    let recorder = CompactRecorder::new();
    let model_file = format!("{artifact_dir}/model");

    let output = match config.network {
        Network::Nvidia => NvidiaNetConfig::new(config.input_shape())
            .init::<B>(&device)
            .load_file(model_file.as_str(), &recorder, &device)
            .expect("Trained model should exist; run train first")
            .forward(batch.images),
        Network::SmallVgg => SmallVggNetConfig::new(config.input_shape())
            .init::<B>(&device)
            .load_file(model_file.as_str(), &recorder, &device)
            .expect("Trained model should exist; run train first")
            .forward(batch.images),
        Network::CommaAi => CommaAiNetConfig::new(config.input_shape())
            .init::<B>(&device)
            .load_file(model_file.as_str(), &recorder, &device)
            .expect("Trained model should exist; run train first")
            .forward(batch.images),
    };

    output.into_scalar().elem::<f32>()
}
