use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::model::Network;

/// End-to-end steering-angle prediction.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Topology selection on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum NetworkOpt {
    /// Deep multi-layer convolutional regressor.
    Nvidia,
    /// Compact VGG-style network.
    SmallVgg,
    /// Shallow commaai-style regressor.
    CommaAi,
}

impl From<NetworkOpt> for Network {
    fn from(opt: NetworkOpt) -> Self {
        match opt {
            NetworkOpt::Nvidia => Network::Nvidia,
            NetworkOpt::SmallVgg => Network::SmallVgg,
            NetworkOpt::CommaAi => Network::CommaAi,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a steering network.
    Train {
        /// Directory for the model record and config.
        #[arg(long, default_value = "/tmp/cruise-control")]
        artifact_dir: String,
        /// Topology to train.
        #[arg(long, value_enum, default_value_t = NetworkOpt::Nvidia)]
        network: NetworkOpt,
        #[arg(long, default_value_t = 8)]
        batch_size: usize,
        #[arg(long, default_value_t = 10)]
        num_epochs: usize,
        #[arg(long, default_value_t = 1e-4)]
        lr: f64,
        #[arg(long, default_value_t = 360)]
        img_height: usize,
        #[arg(long, default_value_t = 640)]
        img_width: usize,
        /// Dataset root holding the training driving log.
        #[arg(long, default_value = "data/train")]
        data_path: String,
        /// Dataset root holding the validation driving log.
        #[arg(long, default_value = "data/test")]
        test_data_path: String,
    },
    /// Predict the steering angle for one camera frame.
    Infer {
        /// Directory the trained model was saved under.
        #[arg(long, default_value = "/tmp/cruise-control")]
        artifact_dir: String,
        /// Frame to run through the network.
        image: PathBuf,
    },
}
