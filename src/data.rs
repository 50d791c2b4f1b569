use std::path::{Path, PathBuf};

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::{Dataset, InMemDataset};
use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// Number of color channels every topology consumes.
pub const CHANNELS: usize = 3;

/// One row of the driving log: a camera frame and the recorded steering angle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrivingRecord {
    /// Frame path, relative to the dataset root.
    pub image: String,
    /// Steering angle in radians.
    pub angle: f32,
}

/// A decoded camera frame with its steering target.
#[derive(Clone, Debug)]
pub struct SteeringItem {
    /// Raw RGB bytes, row-major `[height, width, channel]`.
    pub image: Vec<u8>,
    /// Steering angle in radians.
    pub angle: f32,
}

/// Camera frames annotated with steering angles.
///
/// The dataset root holds a headerless `driving_log.csv` with
/// `<frame path>,<angle>` rows next to the recorded frames. Frames are
/// decoded and resized to the requested dimensions when fetched.
pub struct SteeringDataset {
    records: InMemDataset<DrivingRecord>,
    root: PathBuf,
    img_height: usize,
    img_width: usize,
}

impl SteeringDataset {
    /// Load the driving log under `root`.
    pub fn new<P: AsRef<Path>>(
        root: P,
        img_height: usize,
        img_width: usize,
    ) -> Result<Self, std::io::Error> {
        let root = root.as_ref().to_path_buf();
        let mut rdr = csv::ReaderBuilder::new();
        let rdr = rdr.has_headers(false);
        let records = InMemDataset::from_csv(root.join("driving_log.csv"), rdr)?;

        Ok(Self {
            records,
            root,
            img_height,
            img_width,
        })
    }
}

impl Dataset<SteeringItem> for SteeringDataset {
    fn get(&self, index: usize) -> Option<SteeringItem> {
        let record = self.records.get(index)?;
        let path = self.root.join(&record.image);
        let frame = match image::open(&path) {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("skipping unreadable frame {}: {err}", path.display());
                return None;
            }
        };

        let image = frame
            .resize_exact(
                self.img_width as u32,
                self.img_height as u32,
                FilterType::Triangle,
            )
            .into_rgb8()
            .into_raw();

        Some(SteeringItem {
            image,
            angle: record.angle,
        })
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Stacks steering items into NCHW float batches.
///
/// Pixels are kept in `[0, 255]`; the commaai topology rescales inside its
/// own forward pass.
#[derive(Clone, Debug)]
pub struct SteeringBatcher {
    img_height: usize,
    img_width: usize,
}

/// A batch of camera frames with their steering targets.
#[derive(Clone, Debug)]
pub struct SteeringBatch<B: Backend> {
    /// Frames as `[batch_size, channels, height, width]`.
    pub images: Tensor<B, 4>,
    /// Steering angles as `[batch_size, 1]`.
    pub targets: Tensor<B, 2>,
}

impl SteeringBatcher {
    /// Create a batcher producing tensors of the given frame dimensions.
    pub fn new(img_height: usize, img_width: usize) -> Self {
        Self {
            img_height,
            img_width,
        }
    }
}

impl<B: Backend> Batcher<B, SteeringItem, SteeringBatch<B>> for SteeringBatcher {
    fn batch(&self, items: Vec<SteeringItem>, device: &B::Device) -> SteeringBatch<B> {
        let images = items
            .iter()
            .map(|item| {
                TensorData::new(
                    item.image.clone(),
                    Shape::new([self.img_height, self.img_width, CHANNELS]),
                )
            })
            .map(|data| {
                Tensor::<B, 3>::from_data(data.convert::<B::FloatElem>(), device)
                    // permute(2, 0, 1)
                    .swap_dims(2, 1) // [H, C, W]
                    .swap_dims(1, 0) // [C, H, W]
            })
            .collect();

        let targets = items
            .iter()
            .map(|item| Tensor::<B, 2>::from_data(TensorData::from([[item.angle]]), device))
            .collect();

        SteeringBatch {
            images: Tensor::stack(images, 0),
            targets: Tensor::cat(targets, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestBackend;

    fn item(height: usize, width: usize, fill: u8, angle: f32) -> SteeringItem {
        SteeringItem {
            image: vec![fill; height * width * CHANNELS],
            angle,
        }
    }

    #[test]
    fn batches_frames_as_nchw() {
        let device = Default::default();
        let batcher = SteeringBatcher::new(4, 6);

        let batch: SteeringBatch<TestBackend> =
            batcher.batch(vec![item(4, 6, 0, 0.1), item(4, 6, 255, -0.2)], &device);

        assert_eq!(batch.images.dims(), [2, 3, 4, 6]);
        assert_eq!(batch.targets.dims(), [2, 1]);
    }

    #[test]
    fn keeps_raw_pixel_values() {
        let device = Default::default();
        let batcher = SteeringBatcher::new(2, 2);

        let batch: SteeringBatch<TestBackend> = batcher.batch(vec![item(2, 2, 255, 0.0)], &device);

        let values = batch.images.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|&v| v == 255.0));
    }

    #[test]
    fn targets_follow_item_order() {
        let device = Default::default();
        let batcher = SteeringBatcher::new(2, 2);

        let batch: SteeringBatch<TestBackend> =
            batcher.batch(vec![item(2, 2, 0, 0.5), item(2, 2, 0, -0.5)], &device);

        let values = batch.targets.into_data().to_vec::<f32>().unwrap();
        assert_eq!(values, vec![0.5, -0.5]);
    }
}
