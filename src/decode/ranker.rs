// ============================================================
// Layer 5 — Candidate Ranker
// ============================================================
// Picks the answer span for every Example from the start/end
// logits of all its Features.
//
// Per Example:
//   1. top-n start and top-n end positions in every Feature
//   2. cross product, minus impossible pairs:
//        - past the real token sequence
//        - on a question or marker position
//        - start outside its max-context window
//        - end before start, or longer than max_answer_length
//   3. sort the survivors by start_logit + end_logit
//   4. rebuild and re-align the text, keeping the first n
//      distinct texts
//   5. nothing left → a single "empty" entry with zero logits
//   6. softmax over the kept scores
//
// Reference: Devlin et al. (2019) BERT, §4.2 SQuAD v1.1

use std::collections::{HashMap, HashSet};

use crate::decode::realigner::{detokenize, Realigner};
use crate::decode::softmax;
use crate::domain::example::Example;
use crate::domain::feature::{Feature, RawResult};
use crate::domain::prediction::{ExamplePrediction, NbestPrediction, PrelimPrediction};
use crate::domain::traits::SubwordTokenizer;
use crate::error::PipelineError;

/// Text of the placeholder answer when no candidate survives
pub const EMPTY_ANSWER: &str = "empty";

/// Indices of the `n` largest logits, best first. Ties keep
/// ascending index order.
pub fn best_indexes(logits: &[f32], n: usize) -> Vec<usize> {
    let mut indexed: Vec<usize> = (0..logits.len()).collect();
    indexed.sort_by(|&a, &b| logits[b].total_cmp(&logits[a]));
    indexed.truncate(n);
    indexed
}

pub struct CandidateRanker<'t, T: SubwordTokenizer + ?Sized> {
    realigner:         Realigner<'t, T>,
    n_best_size:       usize,
    max_answer_length: usize,
}

impl<'t, T: SubwordTokenizer + ?Sized> CandidateRanker<'t, T> {
    pub fn new(tokenizer: &'t T, n_best_size: usize, max_answer_length: usize) -> Self {
        Self {
            realigner: Realigner::new(tokenizer),
            n_best_size,
            max_answer_length,
        }
    }

    /// Rank every example. Features are grouped by their
    /// example_index and results are matched by unique_id; every
    /// feature must have a result.
    pub fn rank_all(
        &self,
        examples: &[Example],
        features: &[Feature],
        results:  &[RawResult],
    ) -> Result<Vec<ExamplePrediction>, PipelineError> {
        let results_by_id: HashMap<u64, &RawResult> =
            results.iter().map(|r| (r.unique_id, r)).collect();

        let mut by_example: Vec<Vec<&Feature>> = vec![Vec::new(); examples.len()];
        for feature in features {
            match by_example.get_mut(feature.example_index) {
                Some(group) => group.push(feature),
                None => {
                    return Err(PipelineError::InvalidConfig(format!(
                        "feature {} points at example {} of {}",
                        feature.unique_id,
                        feature.example_index,
                        examples.len()
                    )))
                }
            }
        }

        examples
            .iter()
            .zip(&by_example)
            .map(|(example, group)| self.rank(example, group, &results_by_id))
            .collect()
    }

    /// Rank one example over its own features.
    pub fn rank(
        &self,
        example:       &Example,
        features:      &[&Feature],
        results_by_id: &HashMap<u64, &RawResult>,
    ) -> Result<ExamplePrediction, PipelineError> {
        let mut prelim = Vec::new();
        for (feature_index, feature) in features.iter().enumerate() {
            let result = results_by_id
                .get(&feature.unique_id)
                .ok_or(PipelineError::MissingResult(feature.unique_id))?;
            self.collect_candidates(feature_index, feature, result, &mut prelim);
        }

        // stable: equal scores keep feature / start / end order
        prelim.sort_by(|a, b| b.score().total_cmp(&a.score()));

        let mut seen  = HashSet::new();
        let mut nbest = Vec::new();
        for pred in &prelim {
            if nbest.len() >= self.n_best_size {
                break;
            }
            let Some(text) = self.final_text(example, features[pred.feature_index], pred) else {
                continue;
            };
            if !seen.insert(text.clone()) {
                continue;
            }
            nbest.push((text, pred.start_logit, pred.end_logit));
        }

        if nbest.is_empty() {
            tracing::debug!("No candidate survived for '{}'", example.qas_id);
            nbest.push((EMPTY_ANSWER.to_string(), 0.0, 0.0));
        }

        let scores: Vec<f64> = nbest.iter().map(|(_, s, e)| f64::from(s + e)).collect();
        let probs            = softmax(&scores);

        let nbest: Vec<NbestPrediction> = nbest
            .into_iter()
            .zip(probs)
            .map(|((text, start_logit, end_logit), probability)| NbestPrediction {
                text,
                probability,
                start_logit,
                end_logit,
            })
            .collect();

        Ok(ExamplePrediction {
            qas_id: example.qas_id.clone(),
            answer: nbest[0].text.clone(),
            nbest,
        })
    }

    fn collect_candidates(
        &self,
        feature_index: usize,
        feature:       &Feature,
        result:        &RawResult,
        out:           &mut Vec<PrelimPrediction>,
    ) {
        let start_indexes = best_indexes(&result.start_logits, self.n_best_size);
        let end_indexes   = best_indexes(&result.end_logits, self.n_best_size);
        let num_tokens    = feature.tokens.len();

        for &start_index in &start_indexes {
            for &end_index in &end_indexes {
                // Padding, question and marker positions can't hold an answer
                if start_index >= num_tokens || end_index >= num_tokens {
                    continue;
                }
                if !feature.token_to_orig_map.contains(start_index)
                    || !feature.token_to_orig_map.contains(end_index)
                {
                    continue;
                }
                if !feature.is_max_context(start_index) {
                    continue;
                }
                if end_index < start_index {
                    continue;
                }
                if end_index - start_index + 1 > self.max_answer_length {
                    continue;
                }
                out.push(PrelimPrediction {
                    feature_index,
                    start_index,
                    end_index,
                    start_logit: result.start_logits[start_index],
                    end_logit:   result.end_logits[end_index],
                });
            }
        }
    }

    fn final_text(&self, example: &Example, feature: &Feature, pred: &PrelimPrediction) -> Option<String> {
        let tok_text  = detokenize(&feature.tokens[pred.start_index..=pred.end_index]);
        let orig_start = *feature.token_to_orig_map.get(pred.start_index)?;
        let orig_end   = *feature.token_to_orig_map.get(pred.end_index)?;
        let Some(orig_text) = example.original_text(orig_start, orig_end) else {
            tracing::debug!(
                "Doc tokens {}..={} of '{}' are outside its context",
                orig_start,
                orig_end,
                example.qas_id
            );
            return None;
        };

        Some(self.realigner.realign(&tok_text, orig_text))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::FeatureEncoder;
    use crate::infra::tokenizer_store::test_tokenizer;

    const SEQ: usize = 16;

    fn setup(context: &str, question: &str) -> (Vec<Example>, Vec<Feature>) {
        let tok      = test_tokenizer();
        let example  = Example::new("q", question, context, tok.basic_tokenize(context).unwrap());
        let examples = vec![example];
        let features = FeatureEncoder::new(SEQ, 8, 8).convert_examples(&examples, &tok).unwrap();
        (examples, features)
    }

    fn peaked(unique_id: u64, start: usize, end: usize) -> RawResult {
        let mut start_logits = vec![0.0; SEQ];
        let mut end_logits   = vec![0.0; SEQ];
        start_logits[start] = 5.0;
        end_logits[end]     = 5.0;
        RawResult { unique_id, start_logits, end_logits }
    }

    #[test]
    fn test_best_indexes_stable_on_ties() {
        assert_eq!(best_indexes(&[0.1, 0.9, 0.5, 0.9], 3), vec![1, 3, 2]);
        assert_eq!(best_indexes(&[1.0, 2.0], 5), vec![1, 0]);
    }

    #[test]
    fn test_peaked_logits_pick_quick_brown() {
        let tok = test_tokenizer();
        let (examples, features) = setup("The quick brown fox", "what is it");
        // [CLS] what is it [SEP] the quick brown fox [SEP]
        let results = vec![peaked(features[0].unique_id, 6, 7)];

        let ranker = CandidateRanker::new(&tok, 20, 30);
        let preds  = ranker.rank_all(&examples, &features, &results).unwrap();

        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].qas_id, "q");
        assert_eq!(preds[0].answer, "quick brown");
        assert_eq!(preds[0].nbest[0].start_logit, 5.0);
        assert_eq!(preds[0].nbest[0].end_logit, 5.0);
        let total: f64 = preds[0].nbest.iter().map(|n| n.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_survivors_gives_empty_placeholder() {
        let tok = test_tokenizer();
        let (examples, features) = setup("The quick brown fox", "what is it");
        // Only question positions make the top-1 cut
        let results = vec![peaked(features[0].unique_id, 1, 2)];

        let ranker = CandidateRanker::new(&tok, 1, 30);
        let preds  = ranker.rank_all(&examples, &features, &results).unwrap();

        assert_eq!(preds[0].answer, EMPTY_ANSWER);
        assert_eq!(preds[0].nbest.len(), 1);
        assert_eq!(preds[0].nbest[0].probability, 1.0);
        assert_eq!(preds[0].nbest[0].start_logit, 0.0);
    }

    #[test]
    fn test_example_without_features_is_empty() {
        let tok      = test_tokenizer();
        let examples = vec![Example::new("q", "who", "", Vec::new())];
        let ranker   = CandidateRanker::new(&tok, 20, 30);
        let preds    = ranker.rank_all(&examples, &[], &[]).unwrap();
        assert_eq!(preds[0].answer, EMPTY_ANSWER);
    }

    #[test]
    fn test_duplicate_texts_are_dropped() {
        let tok = test_tokenizer();
        let (examples, features) = setup("the fox the fox", "who");
        // [CLS] who [SEP] the fox the fox [SEP]
        let mut result = peaked(features[0].unique_id, 3, 3);
        result.start_logits[5] = 5.0;
        result.end_logits[5]   = 5.0;

        let ranker = CandidateRanker::new(&tok, 20, 30);
        let preds  = ranker.rank_all(&examples, &features, &[result]).unwrap();

        let texts: Vec<&str> = preds[0].nbest.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts[0], "the");
        assert_eq!(texts.iter().filter(|&&t| t == "the").count(), 1);
        let unique: HashSet<&str> = texts.iter().copied().collect();
        assert_eq!(unique.len(), texts.len());
    }

    #[test]
    fn test_nbest_is_capped() {
        let tok = test_tokenizer();
        let (examples, features) = setup("The quick brown fox", "what is it");
        // Doc positions 5..=8; four distinct valid spans make the top-2 cut
        let mut start_logits = vec![0.0; SEQ];
        let mut end_logits   = vec![0.0; SEQ];
        for (pos, logit) in [(5, 4.0), (6, 3.0), (7, 2.0), (8, 1.0)] {
            start_logits[pos] = logit;
        }
        for (pos, logit) in [(8, 4.0), (7, 3.0), (6, 2.0), (5, 1.0)] {
            end_logits[pos] = logit;
        }
        let results = vec![RawResult { unique_id: features[0].unique_id, start_logits, end_logits }];

        let ranker = CandidateRanker::new(&tok, 2, 30);
        let preds  = ranker.rank_all(&examples, &features, &results).unwrap();
        let texts: Vec<&str> = preds[0].nbest.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["The quick brown fox", "The quick brown"]);
    }

    #[test]
    fn test_span_outside_context_is_skipped() {
        let tok = test_tokenizer();
        let (mut examples, features) = setup("The quick brown fox", "what is it");
        // Doc token spans no longer point into the context
        examples[0].context = String::new();
        let results = vec![peaked(features[0].unique_id, 6, 7)];

        let ranker = CandidateRanker::new(&tok, 20, 30);
        let preds  = ranker.rank_all(&examples, &features, &results).unwrap();
        assert_eq!(preds[0].answer, EMPTY_ANSWER);
        assert_eq!(preds[0].nbest.len(), 1);
    }

    #[test]
    fn test_max_answer_length_filters_long_spans() {
        let tok = test_tokenizer();
        let (examples, features) = setup("The quick brown fox", "what is it");
        let results = vec![peaked(features[0].unique_id, 5, 8)];

        let ranker = CandidateRanker::new(&tok, 20, 2);
        let preds  = ranker.rank_all(&examples, &features, &results).unwrap();
        assert!(preds[0].nbest.iter().all(|n| n.text.split(' ').count() <= 2));
    }

    #[test]
    fn test_missing_result_is_an_error() {
        let tok = test_tokenizer();
        let (examples, features) = setup("The quick brown fox", "what is it");
        let ranker = CandidateRanker::new(&tok, 20, 30);
        let err    = ranker.rank_all(&examples, &features, &[]).unwrap_err();
        assert_eq!(err, PipelineError::MissingResult(features[0].unique_id));
    }

    #[test]
    fn test_surface_text_is_restored() {
        let tok = test_tokenizer();
        let (examples, features) = setup("Steve Smith's car", "who owns it");
        // [CLS] who owns it [SEP] steve smith ' s car [SEP]
        let results = vec![peaked(features[0].unique_id, 5, 6)];

        let ranker = CandidateRanker::new(&tok, 20, 30);
        let preds  = ranker.rank_all(&examples, &features, &results).unwrap();
        assert_eq!(preds[0].answer, "Steve Smith");
    }
}
