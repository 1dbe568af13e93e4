// ============================================================
// Layer 6 — Prediction Writer
// ============================================================
// Writes the ranked answers of a run to disk.
//
// Output files:
//   output_dir/
//     predictions.json        ← { "<qas_id>": "<answer>", ... }
//     nbest_predictions.json  ← { "<qas_id>": [ { text, probability,
//                                                 start_logit, end_logit }, ... ] }
//
// Keys appear in input order: serde's collect_map streams the
// pairs in iteration order instead of sorting them.
//
// Reference: Rust Book §12 (I/O and File Handling)
//            serde documentation (Serializer::collect_map)

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};

use crate::domain::prediction::ExamplePrediction;

pub const PREDICTIONS_FILE: &str = "predictions.json";
pub const NBEST_FILE:       &str = "nbest_predictions.json";

struct Answers<'a>(&'a [ExamplePrediction]);

impl Serialize for Answers<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|p| (&p.qas_id, &p.answer)))
    }
}

struct Nbest<'a>(&'a [ExamplePrediction]);

impl Serialize for Nbest<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|p| (&p.qas_id, &p.nbest)))
    }
}

pub struct PredictionWriter {
    dir: PathBuf,
}

impl PredictionWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write both files, creating the directory if needed
    pub fn write(&self, predictions: &[ExamplePrediction]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create output directory '{}'", self.dir.display()))?;

        let answers = self.dir.join(PREDICTIONS_FILE);
        write_json(&answers, &Answers(predictions))?;

        let nbest = self.dir.join(NBEST_FILE);
        write_json(&nbest, &Nbest(predictions))?;

        tracing::info!(
            "Wrote {} predictions to '{}'",
            predictions.len(),
            self.dir.display()
        );
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Cannot write '{}'", path.display()))
}
