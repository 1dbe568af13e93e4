// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Restores (and, for tooling and tests, writes) model weights
// using Burn's CompactRecorder.
//
// A model directory holds two files:
//   model_dir/
//     model_config.json   ← SpanModelConfig, the architecture
//     model.mpk           ← all learned parameters
//
// The config is stored separately because the model has to be
// rebuilt with the exact same shape before the weights can be
// loaded into it; CompactRecorder refuses a mismatching record.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::ml::model::{SpanModel, SpanModelConfig};

const CONFIG_FILE:  &str = "model_config.json";
// CompactRecorder appends ".mpk"
const WEIGHTS_STEM: &str = "model";
const WEIGHTS_FILE: &str = "model.mpk";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// Write weights to {dir}/model.mpk, creating the directory
    pub fn save_model<B: Backend>(&self, model: &SpanModel<B>) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create model directory '{}'", self.dir.display()))?;
        let path = self.dir.join(WEIGHTS_STEM);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save weights to '{}'", path.display()))?;

        tracing::debug!("Saved weights to '{}'", path.display());
        Ok(())
    }

    /// Load the stored weights into a freshly initialised model.
    /// The model must have the architecture the weights were saved from.
    pub fn load_model<B: Backend>(
        &self,
        model:  SpanModel<B>,
        device: &B::Device,
    ) -> Result<SpanModel<B>> {
        let path = self.dir.join(WEIGHTS_STEM);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load weights '{}'", self.dir.join(WEIGHTS_FILE).display()))?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &SpanModelConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create model directory '{}'", self.dir.display()))?;
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<SpanModelConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read model config from '{}'", path.display()))?;

        serde_json::from_str(&json)
            .with_context(|| format!("Invalid model config '{}'", path.display()))
    }
}
