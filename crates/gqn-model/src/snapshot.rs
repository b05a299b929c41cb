use std::path::Path;

use burn::prelude::{Backend, Config, Device, Module};
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};

use gqn_core::error::{Error, Result};

use crate::config::HyperParameters;
use crate::model::Gqn;

pub const HYPERPARAMS_FILE: &str = "hyperparams.json";
pub const MODEL_FILE: &str = "model.mpk";

type SnapshotRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Read the architecture of a snapshot without touching the weights
pub fn load_hyperparams(snapshot_dir: &Path) -> Result<HyperParameters> {
    let path = snapshot_dir.join(HYPERPARAMS_FILE);
    let hyperparams = HyperParameters::load(&path).map_err(|e| {
        Error::ModelNotLoaded(format!("Failed to read {}: {}", path.display(), e))
    })?;
    hyperparams.validate()?;
    Ok(hyperparams)
}

/// Restore a trained model from a snapshot directory
pub fn load_snapshot<B: Backend>(snapshot_dir: &Path, device: &Device<B>) -> Result<Gqn<B>> {
    let hyperparams = load_hyperparams(snapshot_dir)?;

    let weights = snapshot_dir.join(MODEL_FILE);
    if !weights.is_file() {
        return Err(Error::ModelNotLoaded(format!(
            "Weights not found at {}",
            weights.display()
        )));
    }

    log::info!(
        "Loading snapshot {} ({} generation steps, r: {}x{}x{})",
        snapshot_dir.display(),
        hyperparams.generation_steps,
        hyperparams.channels_r,
        hyperparams.chrz_size,
        hyperparams.chrz_size,
    );

    Gqn::new(&hyperparams, device)
        .load_file(weights, &SnapshotRecorder::new(), device)
        .map_err(|e| Error::ModelNotLoaded(format!("Incompatible snapshot: {}", e)))
}

/// Write a model in the layout [`load_snapshot`] reads
pub fn save_snapshot<B: Backend>(model: &Gqn<B>, snapshot_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(snapshot_dir)?;
    model.hyperparams().save(snapshot_dir.join(HYPERPARAMS_FILE))?;

    model
        .clone()
        .save_file(snapshot_dir.join(MODEL_FILE), &SnapshotRecorder::new())
        .map_err(|e| Error::ModelNotLoaded(format!("Failed to write snapshot: {}", e)))
}
