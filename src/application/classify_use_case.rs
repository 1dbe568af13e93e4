// ============================================================
// Layer 2 — ClassifyUseCase
// ============================================================
// Labels a text, or a text paired with a second one, with the
// [CLS] head of the same encoder:
//
//   Step 1: Encode [CLS] a [SEP] (b [SEP])  (Layer 4 - data)
//   Step 2: One scorer call for the batch   (Layer 5 - ml)
//   Step 3: Argmax per row → label

use std::time::Instant;

use anyhow::Result;

use crate::application::config::ClassifyConfig;
use crate::data::{
    batcher::{pair_request, probability_rows},
    encoder::FeatureEncoder,
};
use crate::domain::prediction::Classification;
use crate::domain::traits::{Predictor, SubwordTokenizer};

/// Index of the largest value; the first one wins a tie
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if best.map_or(true, |b| v > values[b]) {
            best = Some(i);
        }
    }
    best
}

pub struct ClassifyUseCase<T: SubwordTokenizer, P: Predictor> {
    config:    ClassifyConfig,
    tokenizer: T,
    predictor: P,
}

impl<T: SubwordTokenizer, P: Predictor> ClassifyUseCase<T, P> {
    pub fn new(config: ClassifyConfig, tokenizer: T, predictor: P) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, tokenizer, predictor })
    }

    /// Classify every text, each paired with `pair` when given.
    pub fn classify(&self, texts: &[String], pair: Option<&str>) -> Result<Vec<Classification>> {
        let cfg = &self.config;
        // Pair encoding only uses the sequence length
        let encoder = FeatureEncoder::new(cfg.max_seq_length, 1, 0);

        let features = texts
            .iter()
            .enumerate()
            .map(|(i, text)| encoder.encode_pair(format!("text-{i}"), text, pair, &self.tokenizer))
            .collect::<Result<Vec<_>>>()?;

        let started  = Instant::now();
        let response = self.predictor.predict(&pair_request(&features, &cfg.tensor_names))?;
        tracing::info!(
            "Classified {} inputs in {:.3}s",
            features.len(),
            started.elapsed().as_secs_f64()
        );

        let rows = probability_rows(&response, &cfg.tensor_names, features.len(), cfg.labels.len())?;

        let mut out = Vec::with_capacity(rows.len());
        for (feature, probabilities) in features.into_iter().zip(rows) {
            let best  = argmax(&probabilities).unwrap_or(0);
            let label = cfg.labels[best].clone();
            tracing::debug!("{} → {} ({:.4})", feature.guid, label, probabilities[best]);
            out.push(Classification { guid: feature.guid, label, probabilities });
        }
        Ok(out)
    }
}
