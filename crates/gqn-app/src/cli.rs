use std::path::PathBuf;

use clap::{Parser, ValueHint};

/// Render novel views of dataset scenes with a trained GQN
#[derive(Parser, Clone, Debug)]
#[command(name = "gqn-viewer", version)]
pub struct Args {
    /// Directory with `images/` and `viewpoints/` subsets
    #[arg(long = "dataset-path", visible_alias = "dataset", value_hint = ValueHint::DirPath)]
    pub dataset_path: PathBuf,

    /// Snapshot directory with `hyperparams.json` and `model.mpk`
    #[arg(long = "snapshot-path", visible_alias = "snapshot", value_hint = ValueHint::DirPath)]
    pub snapshot_path: PathBuf,

    #[arg(long = "batch-size", short = 'b', default_value_t = 16)]
    pub batch_size: usize,

    /// GPU index; negative runs on the host
    #[arg(
        long = "gpu-device",
        visible_alias = "gpu",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub gpu_device: i32,

    /// Seed for view sampling and batch order
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    pub fn use_gpu(&self) -> bool {
        self.gpu_device >= 0
    }
}
