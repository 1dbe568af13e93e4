// ============================================================
// Layer 2 — AnswerUseCase
// ============================================================
// Runs the span-prediction pipeline end to end:
//
//   Step 1: Load paragraphs and questions   (Layer 4 - data)
//   Step 2: Normalize + basic-tokenize      (Layer 4 - data)
//   Step 3: Window + encode into Features   (Layer 4 - data)
//   Step 4: Score every Feature, one call   (Layer 5 - ml)
//   Step 5: Rank candidates + re-align      (Layer 5 - decode)
//
// The scorer is called exactly once per run with the whole
// batch; there is no retry and no partial-batch handling.
//
// Reference: Rust Book §10 (Generic Types and Traits)

use std::time::Instant;

use anyhow::Result;

use crate::application::config::QaConfig;
use crate::data::{
    batcher::{span_request, span_results},
    encoder::FeatureEncoder,
    loader::read_examples,
};
use crate::decode::ranker::CandidateRanker;
use crate::domain::prediction::ExamplePrediction;
use crate::domain::traits::{Predictor, QuestionSource, SubwordTokenizer};

pub struct AnswerUseCase<T: SubwordTokenizer, P: Predictor> {
    config:    QaConfig,
    tokenizer: T,
    predictor: P,
}

impl<T: SubwordTokenizer, P: Predictor> AnswerUseCase<T, P> {
    pub fn new(config: QaConfig, tokenizer: T, predictor: P) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, tokenizer, predictor })
    }

    /// Answer every question the source yields, in input order.
    pub fn run(&self, source: &dyn QuestionSource) -> Result<Vec<ExamplePrediction>> {
        let cfg = &self.config;

        let entries  = source.load_all()?;
        let examples = read_examples(&entries, &self.tokenizer)?;

        let encoder  = FeatureEncoder::new(cfg.max_seq_length, cfg.doc_stride, cfg.max_query_length);
        let features = encoder.convert_examples(&examples, &self.tokenizer)?;

        let request  = span_request(&features, &cfg.tensor_names);
        let started  = Instant::now();
        let response = self.predictor.predict(&request)?;
        tracing::info!(
            "Scored {} features in {:.3}s",
            features.len(),
            started.elapsed().as_secs_f64()
        );

        let results = span_results(&response, &cfg.tensor_names, cfg.max_seq_length)?;
        let ranker  = CandidateRanker::new(&self.tokenizer, cfg.n_best_size, cfg.max_answer_length);
        let predictions = ranker.rank_all(&examples, &features, &results)?;

        for p in &predictions {
            tracing::debug!("{} → '{}'", p.qas_id, p.answer);
        }
        Ok(predictions)
    }
}
