use std::fs;

use burn::backend::ndarray::{NdArray, NdArrayDevice};
use burn::backend::Autodiff;
use burn::optim::AdamConfig;

use cruise_control::inference::infer;
use cruise_control::model::Network;
use cruise_control::training::{train, TrainingConfig};

#[test]
fn trains_and_predicts_from_a_synthetic_driving_log() {
    let device = NdArrayDevice::Cpu;
    let data_dir = tempfile::tempdir().unwrap();
    let artifact_dir = tempfile::tempdir().unwrap();

    for (name, shade) in [("left.png", 40u8), ("right.png", 220u8)] {
        image::RgbImage::from_pixel(48, 48, image::Rgb([shade, shade, shade]))
            .save(data_dir.path().join(name))
            .unwrap();
    }
    fs::write(
        data_dir.path().join("driving_log.csv"),
        "left.png,-0.5\nright.png,0.5\n",
    )
    .unwrap();

    let config = TrainingConfig::new(AdamConfig::new())
        .with_network(Network::CommaAi)
        .with_batch_size(2)
        .with_num_epochs(1)
        .with_num_workers(1)
        .with_img_height(32)
        .with_img_width(32)
        .with_data_path(data_dir.path().to_str().unwrap().to_string())
        .with_test_data_path(data_dir.path().to_str().unwrap().to_string());

    let artifacts = artifact_dir.path().to_str().unwrap();
    train::<Autodiff<NdArray<f32>>>(artifacts, config, device);

    assert!(artifact_dir.path().join("config.json").exists());
    assert!(artifact_dir.path().join("model.mpk").exists());

    let angle = infer::<NdArray<f32>>(artifacts, device, &data_dir.path().join("left.png"));
    assert!(angle.is_finite());
}
