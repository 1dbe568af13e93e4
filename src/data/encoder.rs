// ============================================================
// Layer 4 — Feature Encoder
// ============================================================
// Turns Examples into fixed-length model inputs.
//
// For every Example:
//   1. Sub-tokenize the question, truncate to max_query_length
//   2. Sub-tokenize every doc token, remembering which doc token
//      each sub-token came from (tok_to_orig_index)
//   3. Window the sub-tokens with the Chunker
//   4. Encode each window as
//        [CLS] question [SEP] window [SEP] [PAD]...
//      with segment 0 up to the first [SEP] and 1 after it,
//      recording provenance for every document position
//
// Unique ids start at UNIQUE_ID_BASE and increase by one per
// (example, window) pair for the whole run.
//
// The sequence-pair classifier input is built here too: the
// same [CLS]/[SEP] layout, truncating the longer text first.
//
// Reference: Devlin et al. (2019) BERT, §4.2 SQuAD v1.1
//            Rust Book §8 (Vectors)

use anyhow::Result;

use crate::data::chunker::{is_max_context, Chunker};
use crate::domain::example::Example;
use crate::domain::feature::{DocSpan, Feature, PairFeature, PositionMap};
use crate::domain::traits::SubwordTokenizer;
use crate::infra::tokenizer_store::{CLS_TOKEN, SEP_TOKEN};

/// First feature id of a run, far away from any example numbering
pub const UNIQUE_ID_BASE: u64 = 1_000_000_000;

/// Hands out feature ids, never reusing one within a run
#[derive(Debug)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: UNIQUE_ID_BASE }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// The document of one Example after sub-word tokenization
#[derive(Debug, Clone)]
pub struct SubtokenizedDoc {
    pub tokens: Vec<String>,
    /// Sub-token index → index into `Example::doc_tokens`
    pub tok_to_orig_index: Vec<usize>,
}

impl SubtokenizedDoc {
    pub fn build<T: SubwordTokenizer + ?Sized>(example: &Example, tokenizer: &T) -> Result<Self> {
        let mut tokens            = Vec::new();
        let mut tok_to_orig_index = Vec::new();

        for (i, doc_token) in example.doc_tokens.iter().enumerate() {
            for sub_token in tokenizer.tokenize(&doc_token.text)? {
                tok_to_orig_index.push(i);
                tokens.push(sub_token);
            }
        }
        Ok(Self { tokens, tok_to_orig_index })
    }
}

pub struct FeatureEncoder {
    max_seq_length:   usize,
    doc_stride:       usize,
    max_query_length: usize,
}

impl FeatureEncoder {
    pub fn new(max_seq_length: usize, doc_stride: usize, max_query_length: usize) -> Self {
        Self { max_seq_length, doc_stride, max_query_length }
    }

    /// Encode every example into one feature per document window.
    pub fn convert_examples<T: SubwordTokenizer + ?Sized>(
        &self,
        examples:  &[Example],
        tokenizer: &T,
    ) -> Result<Vec<Feature>> {
        let mut ids      = IdAllocator::new();
        let mut features = Vec::new();

        for (example_index, example) in examples.iter().enumerate() {
            let mut query_tokens = tokenizer.tokenize(&example.question_text)?;
            query_tokens.truncate(self.max_query_length);

            let doc     = SubtokenizedDoc::build(example, tokenizer)?;
            let chunker = Chunker::for_query(self.max_seq_length, query_tokens.len(), self.doc_stride)?;
            let spans   = chunker.spans(doc.tokens.len());

            tracing::debug!(
                "Example '{}': {} sub-tokens in {} window(s)",
                example.qas_id,
                doc.tokens.len(),
                spans.len()
            );

            for doc_span_index in 0..spans.len() {
                features.push(self.encode(
                    ids.next_id(),
                    example_index,
                    &query_tokens,
                    &doc,
                    &spans,
                    doc_span_index,
                    tokenizer,
                ));
            }
        }

        tracing::info!("Encoded {} examples into {} features", examples.len(), features.len());
        Ok(features)
    }

    /// Encode window `spans[doc_span_index]` of one example.
    ///
    /// # Panics
    /// Panics if the padded arrays are not exactly max_seq_length
    /// long, which means the window budget was computed wrongly.
    pub fn encode<T: SubwordTokenizer + ?Sized>(
        &self,
        unique_id:      u64,
        example_index:  usize,
        query_tokens:   &[String],
        doc:            &SubtokenizedDoc,
        spans:          &[DocSpan],
        doc_span_index: usize,
        tokenizer:      &T,
    ) -> Feature {
        let span = spans[doc_span_index];

        let mut tokens               = Vec::with_capacity(self.max_seq_length);
        let mut segment_ids          = Vec::with_capacity(self.max_seq_length);
        let mut token_to_orig_map    = PositionMap::new();
        let mut token_is_max_context = PositionMap::new();

        // ── Question segment ─────────────────────────────────────────────────
        tokens.push(CLS_TOKEN.to_string());
        segment_ids.push(0);
        for token in query_tokens {
            tokens.push(token.clone());
            segment_ids.push(0);
        }
        tokens.push(SEP_TOKEN.to_string());
        segment_ids.push(0);

        // ── Document segment ─────────────────────────────────────────────────
        for split_token_index in span.start..span.end() {
            let position = tokens.len();
            token_to_orig_map.insert(position, doc.tok_to_orig_index[split_token_index]);
            token_is_max_context.insert(
                position,
                is_max_context(spans, doc_span_index, split_token_index),
            );
            tokens.push(doc.tokens[split_token_index].clone());
            segment_ids.push(1);
        }
        tokens.push(SEP_TOKEN.to_string());
        segment_ids.push(1);

        let (input_ids, input_mask, segment_ids) =
            self.pad(tokenizer.convert_tokens_to_ids(&tokens), segment_ids);

        Feature {
            unique_id,
            example_index,
            doc_span_index,
            tokens,
            token_to_orig_map,
            token_is_max_context,
            input_ids,
            input_mask,
            segment_ids,
        }
    }

    /// Encode a single text or text pair for the classifier.
    pub fn encode_pair<T: SubwordTokenizer + ?Sized>(
        &self,
        guid:      impl Into<String>,
        text_a:    &str,
        text_b:    Option<&str>,
        tokenizer: &T,
    ) -> Result<PairFeature> {
        let mut tokens_a = tokenizer.tokenize(text_a)?;
        let mut tokens_b = match text_b {
            Some(b) if !b.is_empty() => Some(tokenizer.tokenize(b)?),
            _ => None,
        };

        match tokens_b.as_mut() {
            // [CLS] a [SEP] b [SEP]
            Some(b) => truncate_seq_pair(&mut tokens_a, b, self.max_seq_length.saturating_sub(3)),
            // [CLS] a [SEP]
            None => tokens_a.truncate(self.max_seq_length.saturating_sub(2)),
        }

        let mut tokens      = vec![CLS_TOKEN.to_string()];
        let mut segment_ids = vec![0];
        for token in tokens_a {
            tokens.push(token);
            segment_ids.push(0);
        }
        tokens.push(SEP_TOKEN.to_string());
        segment_ids.push(0);

        if let Some(b) = tokens_b {
            for token in b {
                tokens.push(token);
                segment_ids.push(1);
            }
            tokens.push(SEP_TOKEN.to_string());
            segment_ids.push(1);
        }

        let (input_ids, input_mask, segment_ids) =
            self.pad(tokenizer.convert_tokens_to_ids(&tokens), segment_ids);

        Ok(PairFeature { guid: guid.into(), tokens, input_ids, input_mask, segment_ids })
    }

    /// Right-pad ids/mask/segments with zeros to max_seq_length.
    fn pad(&self, mut input_ids: Vec<u32>, mut segment_ids: Vec<u32>) -> (Vec<u32>, Vec<u32>, Vec<u32>) {
        // 1 for real tokens, 0 for padding
        let mut input_mask = vec![1u32; input_ids.len()];

        while input_ids.len() < self.max_seq_length {
            input_ids.push(0);
            input_mask.push(0);
            segment_ids.push(0);
        }

        assert_eq!(input_ids.len(), self.max_seq_length, "input_ids length");
        assert_eq!(input_mask.len(), self.max_seq_length, "input_mask length");
        assert_eq!(segment_ids.len(), self.max_seq_length, "segment_ids length");

        (input_ids, input_mask, segment_ids)
    }
}

/// Trim the longer sequence one token at a time until the pair fits.
pub fn truncate_seq_pair(tokens_a: &mut Vec<String>, tokens_b: &mut Vec<String>, max_length: usize) {
    while tokens_a.len() + tokens_b.len() > max_length {
        if tokens_a.len() > tokens_b.len() {
            tokens_a.pop();
        } else {
            tokens_b.pop();
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::SubwordTokenizer;
    use crate::error::PipelineError;
    use crate::infra::tokenizer_store::test_tokenizer;

    fn example(context: &str, question: &str) -> Example {
        let tok = test_tokenizer();
        Example::new("q", question, context, tok.basic_tokenize(context).unwrap())
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_layout_and_segments() {
        let tok      = test_tokenizer();
        let encoder  = FeatureEncoder::new(16, 8, 8);
        let features = encoder
            .convert_examples(&[example("The quick brown fox", "what is it")], &tok)
            .unwrap();

        assert_eq!(features.len(), 1);
        let f = &features[0];
        assert_eq!(
            f.tokens,
            strings(&["[CLS]", "what", "is", "it", "[SEP]", "the", "quick", "brown", "fox", "[SEP]"])
        );
        assert_eq!(&f.segment_ids[..10], &[0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);
        assert_eq!(&f.input_ids[..3], &[2, 13, 14]);
    }

    #[test]
    fn test_arrays_are_padded_to_max_seq_length() {
        let tok      = test_tokenizer();
        let encoder  = FeatureEncoder::new(16, 8, 8);
        let features = encoder
            .convert_examples(&[example("The quick brown fox", "what is it")], &tok)
            .unwrap();
        let f = &features[0];

        assert_eq!(f.input_ids.len(), 16);
        assert_eq!(f.input_mask.len(), 16);
        assert_eq!(f.segment_ids.len(), 16);
        assert_eq!(f.real_len(), f.tokens.len());
        assert_eq!(f.input_mask.iter().sum::<u32>() as usize, f.tokens.len());
        assert!(f.input_ids[10..].iter().all(|&x| x == 0));
        assert!(f.segment_ids[10..].iter().all(|&x| x == 0));
    }

    #[test]
    fn test_provenance_only_on_document_positions() {
        let tok      = test_tokenizer();
        let encoder  = FeatureEncoder::new(16, 8, 8);
        let features = encoder
            .convert_examples(&[example("The quick brown fox", "what is it")], &tok)
            .unwrap();
        let f = &features[0];

        for pos in 0..5 {
            assert!(!f.token_to_orig_map.contains(pos), "question position {pos}");
        }
        assert_eq!(f.token_to_orig_map.get(5), Some(&0));
        assert_eq!(f.token_to_orig_map.get(8), Some(&3));
        assert!(!f.token_to_orig_map.contains(9), "trailing [SEP]");
        assert_eq!(f.token_is_max_context.len(), 4);
    }

    #[test]
    fn test_subtokens_map_back_to_their_word() {
        let tok      = test_tokenizer();
        let encoder  = FeatureEncoder::new(16, 8, 8);
        let features = encoder
            .convert_examples(&[example("unbelievable fox", "what")], &tok)
            .unwrap();
        let f = &features[0];

        // [CLS] what [SEP] un ##believ ##able fox [SEP]
        assert_eq!(f.token_to_orig_map.get(3), Some(&0));
        assert_eq!(f.token_to_orig_map.get(5), Some(&0));
        assert_eq!(f.token_to_orig_map.get(6), Some(&1));
    }

    #[test]
    fn test_long_document_fans_out_with_unique_ids() {
        let tok     = test_tokenizer();
        // budget = 10 - 1 - 3 = 6 tokens per window
        let encoder = FeatureEncoder::new(10, 3, 8);
        let context = "the man went to the store and bought a gallon of milk";
        let features = encoder
            .convert_examples(&[example(context, "what"), example("the dog", "who")], &tok)
            .unwrap();

        let first: Vec<_> = features.iter().filter(|f| f.example_index == 0).collect();
        assert_eq!(first.len(), 3);
        assert_eq!(features.last().map(|f| f.example_index), Some(1));

        let ids: Vec<u64> = features.iter().map(|f| f.unique_id).collect();
        let expected: Vec<u64> = (0..features.len() as u64).map(|i| UNIQUE_ID_BASE + i).collect();
        assert_eq!(ids, expected);

        for f in &features {
            assert_eq!(f.input_ids.len(), 10);
        }
    }

    #[test]
    fn test_each_doc_position_has_one_max_context_feature() {
        let tok      = test_tokenizer();
        let encoder  = FeatureEncoder::new(10, 2, 8);
        let context  = "the man went to the store and bought a gallon of milk";
        let features = encoder.convert_examples(&[example(context, "what")], &tok).unwrap();

        let mut counts = vec![0usize; 12];
        for f in &features {
            for (pos, &is_max) in f.token_is_max_context.iter() {
                if is_max {
                    counts[*f.token_to_orig_map.get(pos).unwrap()] += 1;
                }
            }
        }
        assert!(counts.iter().all(|&c| c == 1), "{counts:?}");
    }

    #[test]
    fn test_question_is_truncated() {
        let tok      = test_tokenizer();
        let encoder  = FeatureEncoder::new(16, 8, 2);
        let features = encoder
            .convert_examples(&[example("the fox", "what is it the fox")], &tok)
            .unwrap();
        assert_eq!(&features[0].tokens[..4], &strings(&["[CLS]", "what", "is", "[SEP]"])[..]);
    }

    #[test]
    fn test_question_without_doc_budget_fails() {
        let tok     = test_tokenizer();
        let encoder = FeatureEncoder::new(6, 2, 8);
        let err = encoder
            .convert_examples(&[example("the fox", "what is it")], &tok)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::WindowBudget { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "input_ids length")]
    fn test_oversized_window_is_fatal() {
        let tok     = test_tokenizer();
        let encoder = FeatureEncoder::new(6, 8, 8);
        let ex      = example("the man went to the store", "what");
        let doc     = SubtokenizedDoc::build(&ex, &tok).unwrap();
        // A window the budget never allows: 3 + 1 + 6 > 6
        let spans   = vec![DocSpan::new(0, 6)];
        let query   = strings(&["what"]);
        encoder.encode(UNIQUE_ID_BASE, 0, &query, &doc, &spans, 0, &tok);
    }

    #[test]
    fn test_pair_truncates_longer_side_first() {
        let mut a = strings(&["a", "b", "c", "d", "e"]);
        let mut b = strings(&["x", "y"]);
        truncate_seq_pair(&mut a, &mut b, 5);
        assert_eq!(a, strings(&["a", "b", "c"]));
        assert_eq!(b, strings(&["x", "y"]));
    }

    #[test]
    fn test_encode_pair_segments() {
        let tok     = test_tokenizer();
        let encoder = FeatureEncoder::new(12, 8, 8);
        let f = encoder.encode_pair("id0", "the fox", Some("a dog"), &tok).unwrap();
        assert_eq!(
            f.tokens,
            strings(&["[CLS]", "the", "fox", "[SEP]", "a", "dog", "[SEP]"])
        );
        assert_eq!(&f.segment_ids[..7], &[0, 0, 0, 0, 1, 1, 1]);
        assert_eq!(f.input_ids.len(), 12);
    }

    #[test]
    fn test_encode_single_sequence_truncates_to_fit() {
        let tok     = test_tokenizer();
        let encoder = FeatureEncoder::new(4, 8, 8);
        let f = encoder.encode_pair("id0", "the quick brown fox", None, &tok).unwrap();
        assert_eq!(f.tokens, strings(&["[CLS]", "the", "quick", "[SEP]"]));
        assert_eq!(f.input_mask, vec![1, 1, 1, 1]);
    }
}
