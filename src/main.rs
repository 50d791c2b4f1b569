use burn::optim::AdamConfig;
use burn::tensor::backend::AutodiffBackend;
use clap::Parser;

use cruise_control::cli::{Cli, Commands};
use cruise_control::training::TrainingConfig;
use cruise_control::{inference, training};

fn launch<B: AutodiffBackend>(cli: Cli, device: B::Device) {
    match cli.command {
        Commands::Train {
            artifact_dir,
            network,
            batch_size,
            num_epochs,
            lr,
            img_height,
            img_width,
            data_path,
            test_data_path,
        } => {
            let config = TrainingConfig::new(AdamConfig::new())
                .with_network(network.into())
                .with_batch_size(batch_size)
                .with_num_epochs(num_epochs)
                .with_learning_rate(lr)
                .with_img_height(img_height)
                .with_img_width(img_width)
                .with_data_path(data_path)
                .with_test_data_path(test_data_path);

            training::train::<B>(&artifact_dir, config, device);
        }
        Commands::Infer {
            artifact_dir,
            image,
        } => {
            let angle = inference::infer::<B::InnerBackend>(&artifact_dir, device, &image);
            println!("Predicted steering angle: {angle:.4} rad");
        }
    }
}

fn main() {
    let cli = Cli::parse();

    #[cfg(all(
        feature = "ndarray",
        not(any(feature = "tch-cpu", feature = "tch-gpu", feature = "wgpu"))
    ))]
    {
        use burn::backend::ndarray::{NdArray, NdArrayDevice};
        use burn::backend::Autodiff;

        launch::<Autodiff<NdArray>>(cli, NdArrayDevice::Cpu);
    }
    #[cfg(feature = "tch-cpu")]
    {
        use burn::backend::libtorch::{LibTorch, LibTorchDevice};
        use burn::backend::Autodiff;

        launch::<Autodiff<LibTorch>>(cli, LibTorchDevice::Cpu);
    }
    #[cfg(feature = "tch-gpu")]
    {
        use burn::backend::libtorch::{LibTorch, LibTorchDevice};
        use burn::backend::Autodiff;

        #[cfg(not(target_os = "macos"))]
        let device = LibTorchDevice::Cuda(0);
        #[cfg(target_os = "macos")]
        let device = LibTorchDevice::Mps;

        launch::<Autodiff<LibTorch>>(cli, device);
    }
    #[cfg(feature = "wgpu")]
    {
        use burn::backend::wgpu::{Wgpu, WgpuDevice};
        use burn::backend::Autodiff;

        launch::<Autodiff<Wgpu>>(cli, WgpuDevice::default());
    }
}
