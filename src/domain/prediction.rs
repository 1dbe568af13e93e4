// ============================================================
// Layer 3 — Prediction Domain Types
// ============================================================
// What the Candidate Ranker produces.
//
//   PrelimPrediction  — a raw (start, end) pair inside one Feature,
//                       alive only during one ranking pass
//   NbestPrediction   — a deduplicated answer text with its logits
//                       and softmax probability
//   ExamplePrediction — the final answer and full n-best list for
//                       one question

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrelimPrediction {
    /// Index into the example's own feature list
    pub feature_index: usize,
    pub start_index:   usize,
    pub end_index:     usize,
    pub start_logit:   f32,
    pub end_logit:     f32,
}

impl PrelimPrediction {
    pub fn score(&self) -> f32 {
        self.start_logit + self.end_logit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NbestPrediction {
    pub text:        String,
    pub probability: f64,
    pub start_logit: f32,
    pub end_logit:   f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamplePrediction {
    pub qas_id: String,
    /// Text of the first n-best entry
    pub answer: String,
    /// Never empty, never longer than n_best_size
    pub nbest:  Vec<NbestPrediction>,
}

/// Label decision for one classifier input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub guid:          String,
    pub label:         String,
    pub probabilities: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelim_score_is_logit_sum() {
        let p = PrelimPrediction {
            feature_index: 0,
            start_index:   5,
            end_index:     7,
            start_logit:   1.5,
            end_logit:     -0.5,
        };
        assert!((p.score() - 1.0).abs() < 1e-6);
    }
}
